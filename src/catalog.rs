// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Well-known DI library type identities, resolved lazily once per
//! compilation.

use std::sync::OnceLock;

use crate::symbols::{Compilation, TypeSymbol};
use crate::syntax::Ref;

/// Metadata name of the container builder type.
pub const CONTAINER_BUILDER: &str = "Autofac.ContainerBuilder";

/// Metadata name of the unbound generic registration-builder interface.
pub const REGISTRATION_BUILDER_INTERFACE: &str = "Autofac.Builder.IRegistrationBuilder`3";

/// Memoized lookups of the well-known types. One catalog serves one
/// analysis pass; the first access from any worker thread resolves, and
/// every later access observes the cached identity. Absence means the
/// program never references the DI library, so the analysis is simply
/// inapplicable.
#[derive(Debug, Default)]
pub struct TypeCatalog {
    container_builder: OnceLock<Option<Ref<TypeSymbol>>>,
    registration_builder: OnceLock<Option<Ref<TypeSymbol>>>,
}

impl TypeCatalog {
    pub fn new() -> TypeCatalog {
        TypeCatalog::default()
    }

    pub fn container_builder(&self, compilation: &Compilation) -> Option<&Ref<TypeSymbol>> {
        self.container_builder
            .get_or_init(|| compilation.type_by_metadata_name(CONTAINER_BUILDER))
            .as_ref()
    }

    pub fn registration_builder(&self, compilation: &Compilation) -> Option<&Ref<TypeSymbol>> {
        self.registration_builder
            .get_or_init(|| compilation.type_by_metadata_name(REGISTRATION_BUILDER_INTERFACE))
            .as_ref()
    }
}

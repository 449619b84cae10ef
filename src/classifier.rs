// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Root registration call detection.
//!
//! Runs for every call expression in the program, so the check is one
//! symbol lookup plus one identity comparison and never walks the tree.

use log::debug;

use crate::catalog::TypeCatalog;
use crate::symbols::{Compilation, MethodSymbol};
use crate::syntax::{Expr, Ref};

/// The callable surface form of an extension method, normalized to the
/// underlying static form when the host exposes one.
pub fn normalize_method(method: &Ref<MethodSymbol>) -> &Ref<MethodSymbol> {
    method.reduced_from().unwrap_or(method)
}

/// Classify one call expression. Returns the normalized method symbol when
/// the call is a root registration call: a method whose first parameter's
/// declared type is the container builder. Unresolved symbols, non-method
/// symbols, and parameterless methods classify as "not a root", never as
/// errors.
pub fn root_registration(
    compilation: &Compilation,
    catalog: &TypeCatalog,
    call: &Ref<Expr>,
) -> Option<Ref<MethodSymbol>> {
    if !matches!(call.as_ref(), Expr::Call { .. }) {
        return None;
    }
    let method = compilation.model().method_of(call)?;
    let method = normalize_method(method);
    let first = method.parameters().first()?;
    let builder = catalog.container_builder(compilation)?;
    if first != builder {
        return None;
    }
    debug!(
        "root registration call {} at {}",
        method.name(),
        call.span().location()
    );
    Some(method.clone())
}

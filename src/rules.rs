// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Rule evaluators over registration chains.

use log::debug;

use crate::diagnostics::{Descriptor, Diagnostic, DELEGATE_REGISTRATION_NEEDS_AS};
use crate::walker::RegistrationContext;

/// Method name that registers a factory delegate.
const DELEGATE_REGISTRATION_METHOD: &str = "Register";

/// Method name that binds a registration to an explicit service type.
const SERVICE_BINDING_METHOD: &str = "As";

/// One detection rule applied to a root registration and its chain. The
/// chain is a single forward pass; rules must not index backward into it.
pub trait RegistrationRule: Send + Sync {
    fn descriptor(&self) -> &'static Descriptor;

    fn evaluate(&self, registration: &RegistrationContext<'_>) -> Option<Diagnostic>;
}

/// Flags delegate registrations whose chain never declares a service type.
pub struct DelegateRegistrationMissingAs;

impl RegistrationRule for DelegateRegistrationMissingAs {
    fn descriptor(&self) -> &'static Descriptor {
        &DELEGATE_REGISTRATION_NEEDS_AS
    }

    fn evaluate(&self, registration: &RegistrationContext<'_>) -> Option<Diagnostic> {
        if registration.root_method().name() != DELEGATE_REGISTRATION_METHOD {
            return None;
        }
        let mut chain = registration.chain();
        if chain.any(|link| link.method.name() == SERVICE_BINDING_METHOD) {
            return None;
        }
        // An interrupted walk proves nothing about the chain.
        if registration.cancelled() {
            return None;
        }
        debug!(
            "delegate registration at {} has no {} call",
            registration.registration_span().location(),
            SERVICE_BINDING_METHOD
        );
        Some(Diagnostic::new(
            self.descriptor(),
            registration.registration_span(),
        ))
    }
}

/// The rule set an analyzer runs when none is configured explicitly.
pub fn default_rules() -> Vec<Box<dyn RegistrationRule>> {
    vec![Box::new(DelegateRegistrationMissingAs)]
}

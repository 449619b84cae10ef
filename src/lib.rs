// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// Use README.md as crate documentation.
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

mod analyzer;
mod catalog;
mod classifier;
mod diagnostics;
mod rules;
mod source;
mod symbols;
mod syntax;
mod walker;

pub use analyzer::{Analyzer, AnalyzerOptions, CancellationToken};
pub use catalog::{TypeCatalog, CONTAINER_BUILDER, REGISTRATION_BUILDER_INTERFACE};
pub use classifier::{normalize_method, root_registration};
pub use diagnostics::{
    Category, Descriptor, Diagnostic, Reporter, Severity, DELEGATE_REGISTRATION_NEEDS_AS,
};
pub use rules::{default_rules, DelegateRegistrationMissingAs, RegistrationRule};
pub use source::{Source, Span};
pub use symbols::{
    unbound_form, BindError, Compilation, FieldSymbol, LocalSymbol, MethodSymbol, SemanticModel,
    Symbol, TypeSymbol,
};
pub use syntax::{Block, Expr, NodeRef, ParentIndex, Ref, Routine, Stmt, SyntaxNode};
pub use walker::{ChainLink, RegistrationChain, RegistrationContext};

// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Symbols and the semantic model: the analyzer's view of the host
//! compiler's name and type binding answers.
//!
//! Symbol identity is the `Ref` pointer. The host interns one canonical
//! symbol per declaration, so two lookups that answer "the same method"
//! hand back the same pointer and compare equal.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::syntax::{Expr, Ref, Routine, Stmt, SyntaxNode};

/// A named type.
#[derive(Debug)]
pub struct TypeSymbol {
    metadata_name: String,
    constructed_from: Option<Ref<TypeSymbol>>,
}

impl TypeSymbol {
    /// The canonical symbol for a declared type.
    pub fn declare(metadata_name: impl Into<String>) -> Ref<TypeSymbol> {
        Ref::new(TypeSymbol {
            metadata_name: metadata_name.into(),
            constructed_from: None,
        })
    }

    /// A generic instantiation of `unbound`, e.g. the closed
    /// registration-builder form handed back for each registration call.
    pub fn construct(unbound: &Ref<TypeSymbol>) -> Ref<TypeSymbol> {
        Ref::new(TypeSymbol {
            metadata_name: unbound.metadata_name.clone(),
            constructed_from: Some(unbound.clone()),
        })
    }

    pub fn metadata_name(&self) -> &str {
        &self.metadata_name
    }

    pub fn constructed_from(&self) -> Option<&Ref<TypeSymbol>> {
        self.constructed_from.as_ref()
    }
}

/// The unbound generic form of a constructed type, or the type itself.
pub fn unbound_form(ty: &Ref<TypeSymbol>) -> &Ref<TypeSymbol> {
    ty.constructed_from().unwrap_or(ty)
}

/// A resolved method signature. `parameters` holds the declared parameter
/// types; for an extension method invoked in instance form, `reduced_from`
/// is the underlying static form whose first parameter is the receiver.
#[derive(Debug)]
pub struct MethodSymbol {
    name: String,
    containing_type: Ref<TypeSymbol>,
    parameters: Vec<Ref<TypeSymbol>>,
    reduced_from: Option<Ref<MethodSymbol>>,
}

impl MethodSymbol {
    pub fn new(
        name: impl Into<String>,
        containing_type: Ref<TypeSymbol>,
        parameters: Vec<Ref<TypeSymbol>>,
    ) -> Ref<MethodSymbol> {
        Ref::new(MethodSymbol {
            name: name.into(),
            containing_type,
            parameters,
            reduced_from: None,
        })
    }

    /// The instance-form surface of an extension method, with `underlying`
    /// as its static form.
    pub fn reduced(
        name: impl Into<String>,
        containing_type: Ref<TypeSymbol>,
        parameters: Vec<Ref<TypeSymbol>>,
        underlying: Ref<MethodSymbol>,
    ) -> Ref<MethodSymbol> {
        Ref::new(MethodSymbol {
            name: name.into(),
            containing_type,
            parameters,
            reduced_from: Some(underlying),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn containing_type(&self) -> &Ref<TypeSymbol> {
        &self.containing_type
    }

    pub fn parameters(&self) -> &[Ref<TypeSymbol>] {
        &self.parameters
    }

    pub fn reduced_from(&self) -> Option<&Ref<MethodSymbol>> {
        self.reduced_from.as_ref()
    }
}

#[derive(Debug)]
pub struct LocalSymbol {
    name: String,
}

impl LocalSymbol {
    pub fn new(name: impl Into<String>) -> Ref<LocalSymbol> {
        Ref::new(LocalSymbol { name: name.into() })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A field or other non-local storage member. Assigning the registration
/// value to one of these ends tracking.
#[derive(Debug)]
pub struct FieldSymbol {
    name: String,
}

impl FieldSymbol {
    pub fn new(name: impl Into<String>) -> Ref<FieldSymbol> {
        Ref::new(FieldSymbol { name: name.into() })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Symbol {
    Method(Ref<MethodSymbol>),
    Local(Ref<LocalSymbol>),
    Field(Ref<FieldSymbol>),
}

impl Symbol {
    pub fn as_method(&self) -> Option<&Ref<MethodSymbol>> {
        match self {
            Symbol::Method(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_local(&self) -> Option<&Ref<LocalSymbol>> {
        match self {
            Symbol::Local(l) => Some(l),
            _ => None,
        }
    }
}

/// Errors from the semantic-model construction API. These surface host
/// bugs early; they are never analysis failures.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("expression at {location} already has a bound symbol")]
    SymbolAlreadyBound { location: String },
    #[error("declaration at {location} already has a declared symbol")]
    DeclarationAlreadyBound { location: String },
}

/// Node-to-symbol binding answers, keyed by node identity.
#[derive(Debug, Default)]
pub struct SemanticModel {
    symbols: BTreeMap<SyntaxNode, Symbol>,
    declared: BTreeMap<SyntaxNode, Ref<LocalSymbol>>,
}

impl SemanticModel {
    pub fn new() -> SemanticModel {
        SemanticModel::default()
    }

    /// Record the symbol an expression resolves to.
    pub fn bind(&mut self, expr: &Ref<Expr>, symbol: Symbol) -> Result<(), BindError> {
        let node = SyntaxNode::Expr(expr.clone());
        if self.symbols.contains_key(&node) {
            return Err(BindError::SymbolAlreadyBound {
                location: expr.span().location(),
            });
        }
        self.symbols.insert(node, symbol);
        Ok(())
    }

    /// Record the local a declaration statement introduces.
    pub fn bind_declared(
        &mut self,
        stmt: &Ref<Stmt>,
        local: Ref<LocalSymbol>,
    ) -> Result<(), BindError> {
        let node = SyntaxNode::Stmt(stmt.clone());
        if self.declared.contains_key(&node) {
            return Err(BindError::DeclarationAlreadyBound {
                location: stmt.span().location(),
            });
        }
        self.declared.insert(node, local);
        Ok(())
    }

    pub fn symbol_of(&self, expr: &Ref<Expr>) -> Option<&Symbol> {
        self.symbols.get(&SyntaxNode::Expr(expr.clone()))
    }

    pub fn method_of(&self, expr: &Ref<Expr>) -> Option<&Ref<MethodSymbol>> {
        self.symbol_of(expr)?.as_method()
    }

    pub fn local_of(&self, expr: &Ref<Expr>) -> Option<&Ref<LocalSymbol>> {
        self.symbol_of(expr)?.as_local()
    }

    pub fn declared_symbol(&self, stmt: &Ref<Stmt>) -> Option<&Ref<LocalSymbol>> {
        self.declared.get(&SyntaxNode::Stmt(stmt.clone()))
    }
}

/// Read-only view of the program under analysis: routines, declared types,
/// and the semantic model. Owned by the host, borrowed for one pass.
#[derive(Debug, Default)]
pub struct Compilation {
    routines: Vec<Ref<Routine>>,
    types: BTreeMap<String, Ref<TypeSymbol>>,
    model: SemanticModel,
}

impl Compilation {
    pub fn new() -> Compilation {
        Compilation::default()
    }

    /// Intern the canonical symbol for a declared type.
    pub fn declare_type(&mut self, metadata_name: &str) -> Ref<TypeSymbol> {
        self.types
            .entry(metadata_name.to_string())
            .or_insert_with(|| TypeSymbol::declare(metadata_name))
            .clone()
    }

    /// Resolve a type by its metadata name. Absence means the program never
    /// references the type.
    pub fn type_by_metadata_name(&self, metadata_name: &str) -> Option<Ref<TypeSymbol>> {
        self.types.get(metadata_name).cloned()
    }

    pub fn add_routine(&mut self, routine: Routine) -> Ref<Routine> {
        let routine = Ref::new(routine);
        self.routines.push(routine.clone());
        routine
    }

    pub fn routines(&self) -> &[Ref<Routine>] {
        &self.routines
    }

    pub fn model(&self) -> &SemanticModel {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut SemanticModel {
        &mut self.model
    }
}

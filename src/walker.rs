// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The registration chain walker.
//!
//! Starting from a root registration call, the walker discovers every
//! subsequent call in the enclosing routine that operates on the value the
//! registration produced, including across assignment to a local and later
//! reassignments of that local. It is a restricted, intraprocedural,
//! forward-only analysis: one tracked storage location at a time, one
//! straight-line pass over the enclosing block, no merging of histories.

use log::debug;

use crate::analyzer::CancellationToken;
use crate::catalog::TypeCatalog;
use crate::source::Span;
use crate::symbols::{unbound_form, Compilation, LocalSymbol, MethodSymbol, SemanticModel, Symbol};
use crate::syntax::{program_order, Block, Expr, ParentIndex, Ref, Stmt, SyntaxNode};

/// One discovered call in a registration chain: the resolved method plus
/// the syntactic call node. Links arrive in program order.
#[derive(Clone, Debug)]
pub struct ChainLink {
    pub method: Ref<MethodSymbol>,
    pub call: Ref<Expr>,
}

/// Anchor of one analysis session: a root registration call plus the
/// context needed to walk its chain.
pub struct RegistrationContext<'a> {
    compilation: &'a Compilation,
    catalog: &'a TypeCatalog,
    parents: &'a ParentIndex,
    root_method: Ref<MethodSymbol>,
    root_call: Ref<Expr>,
    cancel: CancellationToken,
}

impl<'a> RegistrationContext<'a> {
    pub fn new(
        compilation: &'a Compilation,
        catalog: &'a TypeCatalog,
        parents: &'a ParentIndex,
        root_method: Ref<MethodSymbol>,
        root_call: Ref<Expr>,
        cancel: CancellationToken,
    ) -> RegistrationContext<'a> {
        RegistrationContext {
            compilation,
            catalog,
            parents,
            root_method,
            root_call,
            cancel,
        }
    }

    /// The (normalized) method the root call resolves to.
    pub fn root_method(&self) -> &Ref<MethodSymbol> {
        &self.root_method
    }

    pub fn root_call(&self) -> &Ref<Expr> {
        &self.root_call
    }

    /// The span diagnostics anchor at: the root call's own extent, not the
    /// whole statement.
    pub fn registration_span(&self) -> &Span {
        self.root_call.span()
    }

    pub fn cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// A fresh single-pass walk over the chain.
    pub fn chain(&self) -> RegistrationChain<'_> {
        RegistrationChain::new(self)
    }

    /// Whether a method operates on the registration-builder interface,
    /// i.e. its containing generic type's unbound form is that interface.
    fn is_builder_method(&self, method: &Ref<MethodSymbol>) -> bool {
        match self.catalog.registration_builder(self.compilation) {
            Some(interface) => unbound_form(method.containing_type()) == interface,
            None => false,
        }
    }
}

/// Forward cursor over the enclosing block's nodes in program order.
/// Created lazily the first time the registration value is bound to a
/// local; shared and monotone across the rest of the walk.
struct BlockCursor {
    nodes: Vec<SyntaxNode>,
    next: usize,
}

impl BlockCursor {
    fn over(block: &Ref<Block>) -> BlockCursor {
        BlockCursor {
            // The cursor stays in the block the walk originated from.
            nodes: program_order(block, false),
            next: 0,
        }
    }

    /// Drop everything that starts before `end`, so scanning resumes just
    /// after the shape that moved the tracking target.
    fn skip_past(&mut self, end: u32) {
        while self.next < self.nodes.len() && self.nodes[self.next].span().start < end {
            self.next += 1;
        }
    }

    fn advance(&mut self) -> Option<SyntaxNode> {
        let node = self.nodes.get(self.next).cloned()?;
        self.next += 1;
        Some(node)
    }
}

/// The walk itself: an explicit state machine producing chain links
/// lazily. State is the current position (last visited call), the tracking
/// target (the local currently holding the value, if any), and the block
/// cursor. Exactly one tracking target is live at a time; it is
/// overwritten, never merged.
pub struct RegistrationChain<'a> {
    ctx: &'a RegistrationContext<'a>,
    current: Ref<Expr>,
    tracking: Option<Ref<LocalSymbol>>,
    cursor: Option<BlockCursor>,
    done: bool,
}

impl<'a> RegistrationChain<'a> {
    fn new(ctx: &'a RegistrationContext<'a>) -> RegistrationChain<'a> {
        RegistrationChain {
            ctx,
            current: ctx.root_call.clone(),
            tracking: None,
            cursor: None,
            done: false,
        }
    }

    /// Produce the next chain link, or `None` once the traversal is over.
    /// Climbs the enclosing syntax from the current position until one of
    /// the closed set of shapes decides the outcome.
    pub fn try_advance(&mut self) -> Option<ChainLink> {
        if self.done {
            return None;
        }
        if self.ctx.cancelled() {
            debug!("chain walk cancelled");
            self.done = true;
            return None;
        }

        let model = self.ctx.compilation.model();
        let mut node = self
            .ctx
            .parents
            .parent(&SyntaxNode::Expr(self.current.clone()))
            .cloned();

        while let Some(n) = node {
            match &n {
                SyntaxNode::Expr(expr) => match expr.as_ref() {
                    Expr::Call { .. } => {
                        if let Some(method) = model.method_of(expr) {
                            if self.ctx.is_builder_method(method) {
                                self.current = expr.clone();
                                return Some(ChainLink {
                                    method: method.clone(),
                                    call: expr.clone(),
                                });
                            }
                        }
                        // A call that does not operate on the registration
                        // builder; keep climbing.
                    }
                    Expr::Assign { lhs, .. } => match model.symbol_of(lhs) {
                        Some(Symbol::Local(local)) => {
                            let local = local.clone();
                            debug!("tracking {} via reassignment", local.name());
                            self.retarget(&n, local);
                            node = self.next_access();
                            continue;
                        }
                        _ => {
                            // The value is stored into a field or some
                            // other non-local destination; it escapes and
                            // tracking ends.
                            debug!(
                                "chain ends: non-local assignment at {}",
                                expr.span().location()
                            );
                            break;
                        }
                    },
                    _ => {}
                },
                SyntaxNode::Stmt(stmt) => match stmt.as_ref() {
                    Stmt::Decl { .. } => match model.declared_symbol(stmt) {
                        Some(local) => {
                            let local = local.clone();
                            debug!("tracking {} via declaration", local.name());
                            self.retarget(&n, local);
                            node = self.next_access();
                            continue;
                        }
                        None => break,
                    },
                    Stmt::Expr { .. } => {
                        if self.tracking.is_some() {
                            node = self.next_access();
                            continue;
                        }
                        // A standalone statement and nothing tracked: the
                        // chain ends here.
                        break;
                    }
                    // The value escapes through `return`.
                    Stmt::Return { .. } => break,
                    Stmt::Nested { .. } => {}
                },
                SyntaxNode::Block(_) => break,
            }
            node = self.ctx.parents.parent(&n).cloned();
        }

        self.done = true;
        None
    }

    /// Bind the tracking target and position the cursor just after the
    /// shape that bound it.
    fn retarget(&mut self, at: &SyntaxNode, local: Ref<LocalSymbol>) {
        self.tracking = Some(local);
        if self.cursor.is_none() {
            if let Some(block) = self.ctx.parents.enclosing_block(at) {
                self.cursor = Some(BlockCursor::over(&block));
            }
        }
        if let Some(cursor) = self.cursor.as_mut() {
            cursor.skip_past(at.span().end);
        }
    }

    /// Scan forward for the next expression that reads the tracking target
    /// as a receiver. Ends the walk instead when the target is overwritten
    /// with an unrelated value first.
    fn next_access(&mut self) -> Option<SyntaxNode> {
        let tracking = self.tracking.clone()?;
        let model = self.ctx.compilation.model();
        let cursor = self.cursor.as_mut()?;

        while let Some(node) = cursor.advance() {
            let SyntaxNode::Expr(expr) = &node else {
                continue;
            };
            match expr.as_ref() {
                Expr::Assign { lhs, rhs, .. } => {
                    if model.local_of(lhs) == Some(&tracking)
                        && !reads_target(model, rhs, &tracking)
                    {
                        // Overwritten with an unrelated value before any
                        // further use; the chain through this target is
                        // finished.
                        debug!(
                            "chain ends: {} overwritten at {}",
                            tracking.name(),
                            expr.span().location()
                        );
                        return None;
                    }
                }
                Expr::Member { receiver, .. } => {
                    if model.local_of(receiver) == Some(&tracking) {
                        return Some(node.clone());
                    }
                }
                _ => {}
            }
        }
        None
    }
}

impl Iterator for RegistrationChain<'_> {
    type Item = ChainLink;

    fn next(&mut self) -> Option<ChainLink> {
        self.try_advance()
    }
}

/// Does `expr` read `target` as the receiver of some access? Tells a
/// self-continuation (`r = r.SingleInstance()`) apart from an overwrite
/// (`r = builder.Register(...)`).
fn reads_target(model: &SemanticModel, expr: &Ref<Expr>, target: &Ref<LocalSymbol>) -> bool {
    match expr.as_ref() {
        Expr::Member { receiver, .. } => {
            model.local_of(receiver) == Some(target) || reads_target(model, receiver, target)
        }
        Expr::Call { callee, .. } => reads_target(model, callee, target),
        Expr::Assign { rhs, .. } => reads_target(model, rhs, target),
        _ => false,
    }
}

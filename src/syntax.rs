// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The syntax-node model at the analyzer's input boundary.
//!
//! The host front end lowers each routine body into this closed set of
//! shapes. Nodes are shared (`Arc`) and compare by pointer identity, so the
//! same node can be recognized again while the chain walker climbs the tree
//! and so nodes can key ordered containers.

use std::cmp;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::source::Span;

pub struct NodeRef<T> {
    r: Arc<T>,
}

impl<T> Clone for NodeRef<T> {
    fn clone(&self) -> Self {
        Self { r: self.r.clone() }
    }
}

impl<T: fmt::Debug> fmt::Debug for NodeRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.r.as_ref().fmt(f)
    }
}

impl<T> cmp::PartialEq for NodeRef<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::as_ptr(&self.r).eq(&Arc::as_ptr(&other.r))
    }
}

impl<T> cmp::Eq for NodeRef<T> {}

impl<T> cmp::Ord for NodeRef<T> {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        Arc::as_ptr(&self.r).cmp(&Arc::as_ptr(&other.r))
    }
}

impl<T> cmp::PartialOrd for NodeRef<T> {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> std::hash::Hash for NodeRef<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.r).hash(state)
    }
}

impl<T> Deref for NodeRef<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.r
    }
}

impl<T> AsRef<T> for NodeRef<T> {
    fn as_ref(&self) -> &T {
        self.deref()
    }
}

impl<T> NodeRef<T> {
    pub fn new(t: T) -> Self {
        Self { r: Arc::new(t) }
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.r) as usize
    }
}

pub type Ref<T> = NodeRef<T>;

/// Expression shapes the analyzer distinguishes. Anything else the host
/// lowers to `Opaque`.
#[derive(Debug)]
pub enum Expr {
    /// A name referring to a value (local variable, field, parameter).
    Ident { span: Span },

    /// Member access `receiver.name`; `name` spans just the member name.
    Member {
        span: Span,
        receiver: Ref<Expr>,
        name: Span,
    },

    /// An invocation. For chained calls the callee is a `Member` whose
    /// receiver is the preceding call.
    Call {
        span: Span,
        callee: Ref<Expr>,
        args: Vec<Ref<Expr>>,
    },

    /// Assignment in expression position.
    Assign {
        span: Span,
        lhs: Ref<Expr>,
        rhs: Ref<Expr>,
    },

    /// A callback argument. The analyzer never descends into it.
    Lambda { span: Span },

    /// An uninterpreted expression.
    Opaque { span: Span },
}

impl Expr {
    pub fn span(&self) -> &Span {
        match self {
            Expr::Ident { span }
            | Expr::Member { span, .. }
            | Expr::Call { span, .. }
            | Expr::Assign { span, .. }
            | Expr::Lambda { span }
            | Expr::Opaque { span } => span,
        }
    }
}

#[derive(Debug)]
pub enum Stmt {
    /// Local declaration with an initializer: `var name = init;`.
    Decl {
        span: Span,
        name: Span,
        init: Ref<Expr>,
    },

    /// Bare expression statement.
    Expr { span: Span, expr: Ref<Expr> },

    /// Return with an optional value.
    Return { span: Span, value: Option<Ref<Expr>> },

    /// A nested block.
    Nested { span: Span, block: Ref<Block> },
}

impl Stmt {
    pub fn span(&self) -> &Span {
        match self {
            Stmt::Decl { span, .. }
            | Stmt::Expr { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::Nested { span, .. } => span,
        }
    }
}

#[derive(Debug)]
pub struct Block {
    pub span: Span,
    pub stmts: Vec<Ref<Stmt>>,
}

/// A routine (function or method body) presented for analysis.
#[derive(Debug)]
pub struct Routine {
    pub name: String,
    pub body: Ref<Block>,
    /// Whether the host marked the routine as generated code. Generated
    /// routines are analyzed and reported by default.
    pub generated: bool,
}

/// A uniform handle over any syntax node, ordered by pointer identity so it
/// can key the parent index and semantic-model tables.
#[derive(Clone, Debug)]
pub enum SyntaxNode {
    Expr(Ref<Expr>),
    Stmt(Ref<Stmt>),
    Block(Ref<Block>),
}

impl SyntaxNode {
    fn key(&self) -> (u8, usize) {
        match self {
            SyntaxNode::Expr(e) => (0, e.addr()),
            SyntaxNode::Stmt(s) => (1, s.addr()),
            SyntaxNode::Block(b) => (2, b.addr()),
        }
    }

    pub fn span(&self) -> &Span {
        match self {
            SyntaxNode::Expr(e) => e.span(),
            SyntaxNode::Stmt(s) => s.span(),
            SyntaxNode::Block(b) => &b.span,
        }
    }
}

impl cmp::PartialEq for SyntaxNode {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl cmp::Eq for SyntaxNode {}

impl cmp::Ord for SyntaxNode {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.key().cmp(&other.key())
    }
}

impl cmp::PartialOrd for SyntaxNode {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Child-to-parent edges for one routine body, built once per routine and
/// shared by every analysis session inside it.
#[derive(Debug)]
pub struct ParentIndex {
    parents: BTreeMap<SyntaxNode, SyntaxNode>,
}

impl ParentIndex {
    pub fn build(body: &Ref<Block>) -> ParentIndex {
        let mut parents = BTreeMap::new();
        index_block(body, &mut parents);
        ParentIndex { parents }
    }

    pub fn parent(&self, node: &SyntaxNode) -> Option<&SyntaxNode> {
        self.parents.get(node)
    }

    /// Nearest enclosing block, the node itself included.
    pub fn enclosing_block(&self, node: &SyntaxNode) -> Option<Ref<Block>> {
        let mut n = node.clone();
        loop {
            if let SyntaxNode::Block(block) = &n {
                return Some(block.clone());
            }
            n = self.parent(&n)?.clone();
        }
    }
}

fn index_block(block: &Ref<Block>, parents: &mut BTreeMap<SyntaxNode, SyntaxNode>) {
    for stmt in &block.stmts {
        parents.insert(
            SyntaxNode::Stmt(stmt.clone()),
            SyntaxNode::Block(block.clone()),
        );
        let parent = SyntaxNode::Stmt(stmt.clone());
        match stmt.as_ref() {
            Stmt::Decl { init, .. } => index_expr(init, &parent, parents),
            Stmt::Expr { expr, .. } => index_expr(expr, &parent, parents),
            Stmt::Return { value, .. } => {
                if let Some(value) = value {
                    index_expr(value, &parent, parents);
                }
            }
            Stmt::Nested { block: nested, .. } => {
                parents.insert(SyntaxNode::Block(nested.clone()), parent);
                index_block(nested, parents);
            }
        }
    }
}

fn index_expr(expr: &Ref<Expr>, parent: &SyntaxNode, parents: &mut BTreeMap<SyntaxNode, SyntaxNode>) {
    parents.insert(SyntaxNode::Expr(expr.clone()), parent.clone());
    let this = SyntaxNode::Expr(expr.clone());
    match expr.as_ref() {
        Expr::Member { receiver, .. } => index_expr(receiver, &this, parents),
        Expr::Call { callee, args, .. } => {
            index_expr(callee, &this, parents);
            for arg in args {
                index_expr(arg, &this, parents);
            }
        }
        Expr::Assign { lhs, rhs, .. } => {
            index_expr(lhs, &this, parents);
            index_expr(rhs, &this, parents);
        }
        Expr::Ident { .. } | Expr::Lambda { .. } | Expr::Opaque { .. } => {}
    }
}

/// Collect a block's statements and sub-expressions in program order
/// (pre-order, parents before children). `enter_nested` controls whether
/// nested blocks are descended into: the chain cursor stays in the block it
/// originated from, while the analyzer sweep visits everything.
pub fn program_order(block: &Ref<Block>, enter_nested: bool) -> Vec<SyntaxNode> {
    let mut nodes = vec![];
    collect_block(block, enter_nested, &mut nodes);
    nodes
}

fn collect_block(block: &Ref<Block>, enter_nested: bool, out: &mut Vec<SyntaxNode>) {
    for stmt in &block.stmts {
        out.push(SyntaxNode::Stmt(stmt.clone()));
        match stmt.as_ref() {
            Stmt::Decl { init, .. } => collect_expr(init, out),
            Stmt::Expr { expr, .. } => collect_expr(expr, out),
            Stmt::Return { value, .. } => {
                if let Some(value) = value {
                    collect_expr(value, out);
                }
            }
            Stmt::Nested { block: nested, .. } => {
                out.push(SyntaxNode::Block(nested.clone()));
                if enter_nested {
                    collect_block(nested, enter_nested, out);
                }
            }
        }
    }
}

fn collect_expr(expr: &Ref<Expr>, out: &mut Vec<SyntaxNode>) {
    out.push(SyntaxNode::Expr(expr.clone()));
    match expr.as_ref() {
        Expr::Member { receiver, .. } => collect_expr(receiver, out),
        Expr::Call { callee, args, .. } => {
            collect_expr(callee, out);
            for arg in args {
                collect_expr(arg, out);
            }
        }
        Expr::Assign { lhs, rhs, .. } => {
            collect_expr(lhs, out);
            collect_expr(rhs, out);
        }
        Expr::Ident { .. } | Expr::Lambda { .. } | Expr::Opaque { .. } => {}
    }
}

// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The analysis driver: call-site classification entry points, options,
//! and cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::debug;

use crate::catalog::TypeCatalog;
use crate::classifier;
use crate::diagnostics::{Diagnostic, Reporter};
use crate::rules::{default_rules, RegistrationRule};
use crate::symbols::Compilation;
use crate::syntax::{program_order, Expr, ParentIndex, Ref, SyntaxNode};
use crate::walker::RegistrationContext;

/// Cooperative cancellation signal shared between the host and every
/// in-flight walk. On signal, traversals are abandoned promptly and no
/// diagnostic is emitted for them.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> CancellationToken {
        CancellationToken::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Driver configuration. Severity overrides and suppression belong to the
/// host's own configuration surface, not here.
#[derive(Clone, Debug)]
pub struct AnalyzerOptions {
    /// Analyze routines the host marked as generated code. On by default.
    pub analyze_generated_code: bool,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        AnalyzerOptions {
            analyze_generated_code: true,
        }
    }
}

/// One analysis pass over a compilation.
pub struct Analyzer<'a> {
    compilation: &'a Compilation,
    catalog: TypeCatalog,
    rules: Vec<Box<dyn RegistrationRule>>,
    options: AnalyzerOptions,
    cancel: CancellationToken,
}

impl<'a> Analyzer<'a> {
    pub fn new(compilation: &'a Compilation) -> Analyzer<'a> {
        Analyzer {
            compilation,
            catalog: TypeCatalog::new(),
            rules: default_rules(),
            options: AnalyzerOptions::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_rules(mut self, rules: Vec<Box<dyn RegistrationRule>>) -> Analyzer<'a> {
        self.rules = rules;
        self
    }

    pub fn with_options(mut self, options: AnalyzerOptions) -> Analyzer<'a> {
        self.options = options;
        self
    }

    /// Token the host can use to abandon the pass from another thread.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Sweep every call expression of every routine and collect the
    /// resulting diagnostics in a deterministic order.
    pub fn analyze(&self) -> Vec<Diagnostic> {
        let reporter = Reporter::new();
        for routine in self.compilation.routines() {
            if routine.generated && !self.options.analyze_generated_code {
                continue;
            }
            if self.cancel.is_cancelled() {
                break;
            }
            let parents = ParentIndex::build(&routine.body);
            for node in program_order(&routine.body, true) {
                let SyntaxNode::Expr(expr) = &node else {
                    continue;
                };
                if !matches!(expr.as_ref(), Expr::Call { .. }) {
                    continue;
                }
                self.check_call(&parents, expr, &reporter);
            }
        }
        reporter.into_diagnostics()
    }

    /// Check one call expression. This is the per-node entry point and is
    /// safe to invoke concurrently from the host's workers with a shared
    /// reporter; all walk state is local to the call site.
    pub fn check_call(&self, parents: &ParentIndex, call: &Ref<Expr>, reporter: &Reporter) {
        if self.cancel.is_cancelled() {
            return;
        }
        let Some(root_method) =
            classifier::root_registration(self.compilation, &self.catalog, call)
        else {
            return;
        };
        let registration = RegistrationContext::new(
            self.compilation,
            &self.catalog,
            parents,
            root_method,
            call.clone(),
            self.cancel.clone(),
        );
        for rule in &self.rules {
            if let Some(diagnostic) = rule.evaluate(&registration) {
                if self.cancel.is_cancelled() {
                    return;
                }
                debug!("reporting {diagnostic}");
                reporter.report(diagnostic);
            }
        }
    }
}

// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Diagnostic descriptors, records, and the deduplicating reporter.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::Mutex;
use serde::Serialize;

use crate::source::Span;

/// Default severity a rule reports at, before any host-side override.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
            Severity::Info => f.write_str("info"),
        }
    }
}

/// Grouping tag surfaced alongside each rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Category {
    Registration,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Registration => f.write_str("Registration"),
        }
    }
}

/// Immutable metadata for one rule: stable id, default severity, category,
/// message text, and the documentation link.
#[derive(Debug)]
pub struct Descriptor {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub category: Category,
    pub severity: Severity,
    pub enabled_by_default: bool,
    pub help_uri: String,
}

impl Descriptor {
    fn rule(
        id: &'static str,
        title: &'static str,
        description: &'static str,
        category: Category,
        severity: Severity,
    ) -> Descriptor {
        Descriptor {
            id,
            title,
            description,
            category,
            severity,
            enabled_by_default: true,
            help_uri: format!("https://autofac.readthedocs.io/en/latest/rules/{id}"),
        }
    }
}

lazy_static! {
    /// Autofac1000: a delegate registration never declares the service
    /// type it satisfies.
    pub static ref DELEGATE_REGISTRATION_NEEDS_AS: Descriptor = Descriptor::rule(
        "Autofac1000",
        "Delegate registrations should specify a service",
        "A registration made from a factory delegate exposes only its concrete type. \
         Add an As call so the registration can be resolved as a service.",
        Category::Registration,
        Severity::Warning,
    );
}

/// One reported violation. Field layout mirrors what editor and build
/// consumers need; offsets are kept alongside line/column so reporting can
/// deduplicate by exact span.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Diagnostic {
    pub id: &'static str,
    pub severity: Severity,
    pub category: Category,
    pub message: String,
    pub help_uri: String,
    pub file: Arc<str>,
    pub line: u32,
    pub col: u32,
    pub end_line: u32,
    pub end_col: u32,
    pub start: u32,
    pub end: u32,
}

impl Diagnostic {
    pub fn new(descriptor: &Descriptor, span: &Span) -> Diagnostic {
        let (end_line, end_col) = span.end_line_col();
        Diagnostic {
            id: descriptor.id,
            severity: descriptor.severity,
            category: descriptor.category,
            message: descriptor.title.to_string(),
            help_uri: descriptor.help_uri.clone(),
            file: span.source.file().as_str().into(),
            line: span.line,
            col: span.col,
            end_line,
            end_col,
            start: span.start,
            end: span.end,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {} {}: {}",
            self.file, self.line, self.col, self.severity, self.id, self.message
        )
    }
}

/// Collects diagnostics for one analysis pass. Re-reporting the same
/// (rule, span) pair is a no-op, so call sites re-checked by the host
/// scheduler cannot duplicate output. Shareable across worker threads.
#[derive(Debug, Default)]
pub struct Reporter {
    seen: Mutex<BTreeSet<(&'static str, Arc<str>, u32, u32)>>,
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl Reporter {
    pub fn new() -> Reporter {
        Reporter::default()
    }

    pub fn report(&self, diagnostic: Diagnostic) {
        let key = (
            diagnostic.id,
            diagnostic.file.clone(),
            diagnostic.start,
            diagnostic.end,
        );
        if self.seen.lock().insert(key) {
            self.diagnostics.lock().push(diagnostic);
        }
    }

    /// Drain into a deterministic order: by file, then span, then rule id.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        let mut diagnostics = self.diagnostics.into_inner();
        diagnostics.sort_by(|a, b| {
            (a.file.clone(), a.start, a.end, a.id).cmp(&(b.file.clone(), b.start, b.end, b.id))
        });
        diagnostics
    }
}

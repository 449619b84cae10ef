// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::Result;

use crate::analyzer::{Analyzer, AnalyzerOptions};
use crate::diagnostics::{Category, Diagnostic, Reporter, Severity, DELEGATE_REGISTRATION_NEEDS_AS};
use crate::source::Span;
use crate::symbols::{LocalSymbol, Symbol};

use super::common::Fixture;

#[test]
fn empty_compilation_has_no_diagnostics() -> Result<()> {
    let f = Fixture::new("")?;
    assert!(Analyzer::new(&f.compilation).analyze().is_empty());
    Ok(())
}

#[test]
fn programs_without_builder_calls_have_no_diagnostics() -> Result<()> {
    let src = "Configure();";
    let mut f = Fixture::new(src)?;
    f.begin_stmt(src)?;
    let call = f.opaque_call("Configure", vec![], "Configure()");
    f.expr_stmt(call);
    f.routine("Main");

    assert!(Analyzer::new(&f.compilation).analyze().is_empty());
    Ok(())
}

#[test]
fn bare_delegate_registration_is_reported_at_the_call() -> Result<()> {
    let src = "builder.Register(c => new Component());";
    let mut f = Fixture::new(src)?;
    let builder = LocalSymbol::new("builder");

    f.begin_stmt(src)?;
    let b = f.ident("builder", 1, Symbol::Local(builder))?;
    let reg = f.register(b, "c => new Component()", "builder.Register(c => new Component())")?;
    f.expr_stmt(reg.clone());
    f.routine("Configure");

    let diagnostics = Analyzer::new(&f.compilation).analyze();
    assert_eq!(diagnostics.len(), 1);
    let d = &diagnostics[0];
    assert_eq!(d.id, "Autofac1000");
    assert_eq!(d.severity, Severity::Warning);
    assert_eq!(d.category, Category::Registration);
    // Anchored at the call's own extent, not the whole statement.
    assert_eq!((d.start, d.end), (reg.span().start, reg.span().end));
    assert_eq!((d.line, d.col), (reg.span().line, reg.span().col));
    assert!(d.help_uri.ends_with("/Autofac1000"));
    assert_eq!(
        d.to_string(),
        format!("fixture.cs:1:1: warning Autofac1000: {}", d.message)
    );
    Ok(())
}

#[test]
fn diagnostic_location_tracks_lines_and_columns() -> Result<()> {
    let src = "void Configure()\n{\n    builder.Register(c => new Widget());\n}\n";
    let mut f = Fixture::new(src)?;
    let builder = LocalSymbol::new("builder");

    f.begin_stmt("builder.Register(c => new Widget());")?;
    let b = f.ident("builder", 1, Symbol::Local(builder))?;
    let reg = f.register(b, "c => new Widget()", "builder.Register(c => new Widget())")?;
    f.expr_stmt(reg);
    f.routine("Configure");

    let diagnostics = Analyzer::new(&f.compilation).analyze();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!((diagnostics[0].line, diagnostics[0].col), (3, 5));
    Ok(())
}

#[test]
fn chained_binding_call_suppresses_the_diagnostic() -> Result<()> {
    let src = "builder.Register(c => new Component()).As<IService>();";
    let mut f = Fixture::new(src)?;
    let builder = LocalSymbol::new("builder");

    f.begin_stmt(src)?;
    let b = f.ident("builder", 1, Symbol::Local(builder))?;
    let reg = f.register(b, "c => new Component()", "builder.Register(c => new Component())")?;
    let bound = f.chain(
        reg,
        "As",
        "builder.Register(c => new Component()).As<IService>()",
    )?;
    f.expr_stmt(bound);
    f.routine("Configure");

    assert!(Analyzer::new(&f.compilation).analyze().is_empty());
    Ok(())
}

#[test]
fn repeated_binding_calls_suppress_the_diagnostic() -> Result<()> {
    let src = "builder.Register(c => new Component()).As<IService>().As<IOther>();";
    let mut f = Fixture::new(src)?;
    let builder = LocalSymbol::new("builder");

    f.begin_stmt(src)?;
    let b = f.ident("builder", 1, Symbol::Local(builder))?;
    let reg = f.register(b, "c => new Component()", "builder.Register(c => new Component())")?;
    let first = f.chain(
        reg,
        "As",
        "builder.Register(c => new Component()).As<IService>()",
    )?;
    let second = f.chain(
        first,
        "As",
        "builder.Register(c => new Component()).As<IService>().As<IOther>()",
    )?;
    f.expr_stmt(second);
    f.routine("Configure");

    assert!(Analyzer::new(&f.compilation).analyze().is_empty());
    Ok(())
}

#[test]
fn tracked_registration_bound_later_is_not_reported() -> Result<()> {
    let src = "var tracked = builder.Register(c => new Component()); tracked.As<IService>();";
    let mut f = Fixture::new(src)?;
    let builder = LocalSymbol::new("builder");
    let tracked = LocalSymbol::new("tracked");

    f.begin_stmt("var tracked = builder.Register(c => new Component());")?;
    let b = f.ident("builder", 1, Symbol::Local(builder))?;
    let reg = f.register(b, "c => new Component()", "builder.Register(c => new Component())")?;
    f.decl("tracked", &tracked, reg)?;

    f.begin_stmt("tracked.As<IService>();")?;
    let recv = f.ident("tracked", 1, Symbol::Local(tracked))?;
    let bound = f.chain(recv, "As", "tracked.As<IService>()")?;
    f.expr_stmt(bound);
    f.routine("Configure");

    assert!(Analyzer::new(&f.compilation).analyze().is_empty());
    Ok(())
}

#[test]
fn reassigned_value_bound_at_the_end_is_not_reported() -> Result<()> {
    let src = "var r = builder.Register(c => new Component()); r = r.SingleInstance(); r.As<IService>();";
    let mut f = Fixture::new(src)?;
    let builder = LocalSymbol::new("builder");
    let r = LocalSymbol::new("r");

    f.begin_stmt("var r = builder.Register(c => new Component());")?;
    let b = f.ident("builder", 1, Symbol::Local(builder))?;
    let reg = f.register(b, "c => new Component()", "builder.Register(c => new Component())")?;
    f.decl("r", &r, reg)?;

    f.begin_stmt("r = r.SingleInstance();")?;
    let lhs = f.ident("r", 1, Symbol::Local(r.clone()))?;
    let recv = f.ident("r", 2, Symbol::Local(r.clone()))?;
    let single = f.chain(recv, "SingleInstance", "r.SingleInstance()")?;
    let assign = f.assign(lhs, single);
    f.expr_stmt(assign);

    f.begin_stmt("r.As<IService>();")?;
    let recv = f.ident("r", 1, Symbol::Local(r))?;
    let bound = f.chain(recv, "As", "r.As<IService>()")?;
    f.expr_stmt(bound);
    f.routine("Configure");

    assert!(Analyzer::new(&f.compilation).analyze().is_empty());
    Ok(())
}

#[test]
fn repointed_variable_reports_only_the_unbound_value() -> Result<()> {
    let src = "var r = builder.Register(c => new Widget()).As<IService>(); \
               r = builder.Register(c => new Gadget()); r.SingleInstance();";
    let mut f = Fixture::new(src)?;
    let builder = LocalSymbol::new("builder");
    let r = LocalSymbol::new("r");

    f.begin_stmt("var r = builder.Register(c => new Widget()).As<IService>();")?;
    let b = f.ident("builder", 1, Symbol::Local(builder.clone()))?;
    let reg1 = f.register(b, "c => new Widget()", "builder.Register(c => new Widget())")?;
    let bound = f.chain(
        reg1,
        "As",
        "builder.Register(c => new Widget()).As<IService>()",
    )?;
    f.decl("r", &r, bound)?;

    f.begin_stmt("r = builder.Register(c => new Gadget());")?;
    let lhs = f.ident("r", 1, Symbol::Local(r.clone()))?;
    let b2 = f.ident("builder", 1, Symbol::Local(builder))?;
    let reg2 = f.register(b2, "c => new Gadget()", "builder.Register(c => new Gadget())")?;
    let assign = f.assign(lhs, reg2.clone());
    f.expr_stmt(assign);

    f.begin_stmt("r.SingleInstance();")?;
    let recv = f.ident("r", 1, Symbol::Local(r))?;
    let single = f.chain(recv, "SingleInstance", "r.SingleInstance()")?;
    f.expr_stmt(single);
    f.routine("Configure");

    let diagnostics = Analyzer::new(&f.compilation).analyze();
    assert_eq!(diagnostics.len(), 1);
    // Anchored at the second, unbound registration.
    assert_eq!(diagnostics[0].start, reg2.span().start);
    assert_eq!(diagnostics[0].end, reg2.span().end);
    Ok(())
}

#[test]
fn non_delegate_registrations_are_not_flagged() -> Result<()> {
    let src = "builder.RegisterType(typeof(Component));";
    let mut f = Fixture::new(src)?;
    let builder = LocalSymbol::new("builder");

    f.begin_stmt(src)?;
    let b = f.ident("builder", 1, Symbol::Local(builder))?;
    let method = f.root_method("RegisterType");
    let arg = crate::syntax::Ref::new(crate::syntax::Expr::Opaque {
        span: f.piece("typeof(Component)", 1),
    });
    let call = f.call(
        b,
        "RegisterType",
        vec![arg],
        method,
        "builder.RegisterType(typeof(Component))",
    )?;
    f.expr_stmt(call);
    f.routine("Configure");

    assert!(Analyzer::new(&f.compilation).analyze().is_empty());
    Ok(())
}

#[test]
fn analysis_is_idempotent() -> Result<()> {
    let src = "builder.Register(c => new Component());";
    let mut f = Fixture::new(src)?;
    let builder = LocalSymbol::new("builder");

    f.begin_stmt(src)?;
    let b = f.ident("builder", 1, Symbol::Local(builder))?;
    let reg = f.register(b, "c => new Component()", "builder.Register(c => new Component())")?;
    f.expr_stmt(reg);
    f.routine("Configure");

    let first = Analyzer::new(&f.compilation).analyze();
    let second = Analyzer::new(&f.compilation).analyze();
    assert_eq!(first.len(), 1);
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn reporter_deduplicates_by_rule_and_span() -> Result<()> {
    let source = crate::source::Source::from_contents(
        "dup.cs".to_string(),
        "builder.Register(c => new Component());".to_string(),
    )?;
    let span = Span::new(source, 0, 38);
    let reporter = Reporter::new();
    reporter.report(Diagnostic::new(&DELEGATE_REGISTRATION_NEEDS_AS, &span));
    reporter.report(Diagnostic::new(&DELEGATE_REGISTRATION_NEEDS_AS, &span));
    assert_eq!(reporter.into_diagnostics().len(), 1);
    Ok(())
}

#[test]
fn cancelled_pass_emits_nothing() -> Result<()> {
    let src = "builder.Register(c => new Component());";
    let mut f = Fixture::new(src)?;
    let builder = LocalSymbol::new("builder");

    f.begin_stmt(src)?;
    let b = f.ident("builder", 1, Symbol::Local(builder))?;
    let reg = f.register(b, "c => new Component()", "builder.Register(c => new Component())")?;
    f.expr_stmt(reg);
    f.routine("Configure");

    let analyzer = Analyzer::new(&f.compilation);
    analyzer.cancellation_token().cancel();
    assert!(analyzer.analyze().is_empty());
    Ok(())
}

#[test]
fn generated_routines_are_analyzed_by_default() -> Result<()> {
    let src = "builder.Register(c => new Component());";
    let mut f = Fixture::new(src)?;
    let builder = LocalSymbol::new("builder");

    f.begin_stmt(src)?;
    let b = f.ident("builder", 1, Symbol::Local(builder))?;
    let reg = f.register(b, "c => new Component()", "builder.Register(c => new Component())")?;
    f.expr_stmt(reg);
    f.routine_with("Configure", true);

    assert_eq!(Analyzer::new(&f.compilation).analyze().len(), 1);

    let skipping = Analyzer::new(&f.compilation).with_options(AnalyzerOptions {
        analyze_generated_code: false,
    });
    assert!(skipping.analyze().is_empty());
    Ok(())
}

#[test]
fn registration_inside_nested_block_is_still_checked() -> Result<()> {
    let src = "{ builder.Register(c => new Component()); }";
    let mut f = Fixture::new(src)?;
    let builder = LocalSymbol::new("builder");

    f.nested(src, |f| {
        f.begin_stmt("builder.Register(c => new Component());")?;
        let b = f.ident("builder", 1, Symbol::Local(builder.clone()))?;
        let reg =
            f.register(b, "c => new Component()", "builder.Register(c => new Component())")?;
        f.expr_stmt(reg);
        Ok(())
    })?;
    f.routine("Configure");

    assert_eq!(Analyzer::new(&f.compilation).analyze().len(), 1);
    Ok(())
}

#[test]
fn diagnostics_serialize_for_host_consumers() -> Result<()> {
    let src = "builder.Register(c => new Component());";
    let mut f = Fixture::new(src)?;
    let builder = LocalSymbol::new("builder");

    f.begin_stmt(src)?;
    let b = f.ident("builder", 1, Symbol::Local(builder))?;
    let reg = f.register(b, "c => new Component()", "builder.Register(c => new Component())")?;
    f.expr_stmt(reg);
    f.routine("Configure");

    let diagnostics = Analyzer::new(&f.compilation).analyze();
    let value = serde_json::to_value(&diagnostics[0])?;
    assert_eq!(value["id"], "Autofac1000");
    assert_eq!(value["severity"], "warning");
    assert_eq!(value["category"], "Registration");
    assert_eq!(value["file"], "fixture.cs");
    assert_eq!(value["line"], 1);
    Ok(())
}

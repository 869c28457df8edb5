//! Unit pipeline: phases, on-demand acceptance and abort isolation.

use jsbind_common::CompilerOptions;
use jsbind_common::diagnostics::diagnostic_codes;
use jsbind_lookup::{
    AbortCompilation, BindingMask, CollectingReporter, CompilationUnitDecl, InMemoryNameEnvironment,
    InferredTypeDecl, LookupEnvironment, MethodDecl, NameEnvironment, Phase, TypeId, UnitId,
};

fn environment(names: Option<InMemoryNameEnvironment>) -> (LookupEnvironment, CollectingReporter) {
    let reporter = CollectingReporter::new();
    let env = LookupEnvironment::with_collaborators(
        CompilerOptions::default(),
        names.map(|names| Box::new(names) as Box<dyn NameEnvironment>),
        Box::new(reporter.clone()),
    );
    (env, reporter)
}

fn unit(env: &mut LookupEnvironment, file: &str, types: Vec<InferredTypeDecl>) -> UnitId {
    env.accept_unit(CompilationUnitDecl {
        types,
        ..CompilationUnitDecl::new(file)
    })
}

fn only_type(env: &LookupEnvironment, unit: UnitId) -> TypeId {
    let types = &env.unit(unit).types;
    assert_eq!(types.len(), 1, "{types:?}");
    types[0]
}

#[test]
fn test_accepted_unit_waits_for_completion() {
    let (mut env, _) = environment(Some(InMemoryNameEnvironment::new()));
    let u = unit(&mut env, "a.js", vec![InferredTypeDecl::new("A")]);
    assert_eq!(env.unit(u).phase, Phase::BuildTypeHierarchy);
    assert_eq!(env.pending_units(), &[u]);
    assert_eq!(env.unit_for_file("a.js"), Some(u));

    // Accepting the same file again is a no-op.
    assert_eq!(unit(&mut env, "a.js", Vec::new()), u);

    env.complete_type_bindings();
    assert_eq!(env.unit(u).phase, Phase::BuildFieldsAndMethods);
    assert!(env.pending_units().is_empty());
    assert_eq!(env.phase(), Phase::BuildFieldsAndMethods);
}

#[test]
fn test_abort_is_isolated_to_its_unit() {
    let names = InMemoryNameEnvironment::new().with_failing_name("Broken");
    let (mut env, reporter) = environment(Some(names));
    let broken = unit(&mut env, "broken.js", vec![InferredTypeDecl::new("X").extends("Broken")]);
    let healthy = unit(&mut env, "healthy.js", vec![InferredTypeDecl::new("Y")]);
    env.complete_type_bindings();

    assert!(matches!(env.unit(broken).aborted, Some(AbortCompilation::NameEnvironment(_))));
    assert_eq!(env.unit(broken).phase, Phase::CheckAndSetImports);
    assert!(env.unit(healthy).aborted.is_none());
    assert_eq!(env.unit(healthy).phase, Phase::BuildFieldsAndMethods);

    let aborted: Vec<_> = reporter
        .problems()
        .into_iter()
        .filter(|problem| problem.code() == diagnostic_codes::UNIT_ABORTED)
        .collect();
    assert_eq!(aborted.len(), 1);
    assert_eq!(aborted[0].diagnostic.file, "broken.js");
    assert!(aborted[0].diagnostic.message_text.contains("Broken"));

    // The healthy unit's type is fully usable.
    let y = only_type(&env, healthy);
    let methods = env.available_methods(y);
    assert!(methods.is_empty());
}

#[test]
fn test_units_are_accepted_on_demand() {
    let library = CompilationUnitDecl {
        types: vec![InferredTypeDecl::new("Widget").with_method(MethodDecl::new("paint"))],
        ..CompilationUnitDecl::new("widget.js")
    };
    let names = InMemoryNameEnvironment::new().with_unit(library);
    let (mut env, reporter) = environment(Some(names));
    let app = unit(&mut env, "app.js", vec![InferredTypeDecl::new("App").extends("Widget")]);
    env.complete_type_bindings();

    assert!(reporter.is_empty(), "{:?}", reporter.codes());
    let widget_unit = env.unit_for_file("widget.js").expect("widget.js accepted on demand");
    assert_eq!(env.unit(widget_unit).phase, Phase::BuildFieldsAndMethods);
    assert!(env.pending_units().is_empty());

    let app_type = only_type(&env, app);
    let widget = only_type(&env, widget_unit);
    assert_eq!(env.superclass(app_type).expect("superclass"), Some(widget));
    let paint = env.intern("paint");
    assert_eq!(env.get_methods(widget, paint).expect("methods").len(), 1);
}

#[test]
fn test_restricted_unit_builds_only_named_types() {
    let (mut env, _) = environment(Some(InMemoryNameEnvironment::new()));
    let decl = CompilationUnitDecl {
        types: vec![InferredTypeDecl::new("Kept"), InferredTypeDecl::new("Skipped")],
        functions: vec![MethodDecl::new("main")],
        ..CompilationUnitDecl::new("partial.js")
    };
    let u = env.build_type_bindings(decl, &["Kept"]);
    env.complete_type_bindings();

    let kept = only_type(&env, u);
    assert_eq!(env.type_name(kept), "Kept");
    assert!(env.unit(u).restricted_to.is_some());

    let package = env.default_package();
    let skipped = env.intern("Skipped");
    let main = env.intern("main");
    assert!(env.package(package).known_types().all(|(name, _)| name != skipped));
    assert!(env.package(package).get_binding0(main, BindingMask::METHOD).is_none());
}

#[test]
fn test_cancellation_aborts_the_unit_being_completed() {
    let reporter = CollectingReporter::new().cancel_on(diagnostic_codes::SUPERCLASS_NOT_FOUND);
    let mut env = LookupEnvironment::with_collaborators(
        CompilerOptions::default(),
        Some(Box::new(InMemoryNameEnvironment::new())),
        Box::new(reporter.clone()),
    );
    let u = unit(&mut env, "lost.js", vec![InferredTypeDecl::new("Lost").extends("Nowhere")]);
    env.complete_type_bindings();

    assert!(matches!(env.unit(u).aborted, Some(AbortCompilation::Cancelled)));
    assert_eq!(reporter.count(diagnostic_codes::SUPERCLASS_NOT_FOUND), 1);
    assert_eq!(reporter.count(diagnostic_codes::UNIT_ABORTED), 1);
}

#[test]
fn test_missing_name_environment_aborts_only_units_that_need_it() {
    let (mut env, reporter) = environment(None);
    let needy = unit(&mut env, "needy.js", vec![InferredTypeDecl::new("Needy").extends("Elsewhere")]);
    let local = unit(
        &mut env,
        "local.js",
        vec![InferredTypeDecl::new("Base"), InferredTypeDecl::new("Local").extends("Base")],
    );
    env.complete_type_bindings();

    assert!(matches!(env.unit(needy).aborted, Some(AbortCompilation::NoNameEnvironment(ref name)) if name == "Elsewhere"));
    assert!(env.unit(local).aborted.is_none());
    assert_eq!(reporter.count(diagnostic_codes::UNIT_ABORTED), 1);
}

#[test]
fn test_reset_allows_accepting_the_same_file_again() {
    let (mut env, _) = environment(Some(InMemoryNameEnvironment::new()));
    unit(&mut env, "a.js", vec![InferredTypeDecl::new("A")]);
    env.complete_type_bindings();
    env.reset();

    assert_eq!(env.units().count(), 0);
    assert!(env.unit_for_file("a.js").is_none());
    let again = unit(&mut env, "a.js", vec![InferredTypeDecl::new("A")]);
    assert_eq!(again, UnitId(0));
    env.complete_type_bindings();
    assert_eq!(env.unit(again).phase, Phase::BuildFieldsAndMethods);
}

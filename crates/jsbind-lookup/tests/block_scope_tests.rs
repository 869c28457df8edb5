use super::*;
use crate::decl::{CompilationUnitDecl, InferredTypeDecl, LocalDecl};
use crate::ids::UnitId;
use crate::name_env::InMemoryNameEnvironment;
use crate::problem::CollectingReporter;
use jsbind_common::{CompilerOptions, LanguageLevel};

struct Fixture {
    env: LookupEnvironment,
    reporter: CollectingReporter,
    ty: TypeId,
    run: ScopeId,
    other: ScopeId,
}

fn fixture(options: CompilerOptions) -> Fixture {
    let reporter = CollectingReporter::new();
    let mut env = LookupEnvironment::with_collaborators(
        options,
        Some(Box::new(InMemoryNameEnvironment::new())),
        Box::new(reporter.clone()),
    );
    let mut run = MethodDecl::new("run").param("x", Some("int"));
    run.locals.push(LocalDecl::new("callback", None));
    run.locals.push(LocalDecl::new("count", Some("int")));
    let unit = env.accept_unit(CompilationUnitDecl {
        types: vec![InferredTypeDecl::new("A").with_method(run).with_method(MethodDecl::new("other"))],
        ..CompilationUnitDecl::new("a.js")
    });
    env.complete_type_bindings();
    let ty = first_type(&env, unit);
    let run = env.declared_method_scope(ty, 0).expect("run scope");
    let other = env.declared_method_scope(ty, 1).expect("other scope");
    Fixture {
        env,
        reporter,
        ty,
        run,
        other,
    }
}

fn first_type(env: &LookupEnvironment, unit: UnitId) -> TypeId {
    env.unit(unit).types[0]
}

#[test]
fn test_duplicate_local_in_nested_block() {
    let Fixture {
        mut env,
        reporter,
        run,
        other,
        ..
    } = fixture(CompilerOptions::default());
    let x = env.intern("x");
    let parameter = env.find_variable(run, x).expect("parameter");
    assert!(env.local(parameter).is_argument);

    let block = env.new_block_scope(run);
    let again = env.add_local_variable(block, "x", Some("long"), None);
    assert_eq!(again, parameter);
    assert_eq!(reporter.codes(), vec![diagnostic_codes::DUPLICATE_LOCAL_VARIABLE]);

    let fresh = env.add_local_variable(other, "x", None, None);
    assert_ne!(fresh, parameter);
    assert_eq!(reporter.len(), 1);
}

#[test]
fn test_arguments_is_implicit_in_functions() {
    let Fixture { mut env, run, .. } = fixture(CompilerOptions::default());
    let arguments = env.intern(ARGUMENTS);
    let first = env.find_variable(run, arguments).expect("arguments");
    assert_eq!(env.find_variable(run, arguments), Some(first));
    assert!(env.local(first).modifiers.contains(Modifiers::SYNTHETIC));

    let block = env.new_block_scope(run);
    assert_eq!(env.find_variable(block, arguments), None);
}

#[test]
fn test_local_function_declared_once() {
    let Fixture { mut env, run, ty, .. } = fixture(CompilerOptions::default());
    let first = env.add_local_function(run, &MethodDecl::new("helper")).expect("function");
    let second = env
        .add_local_function(run, &MethodDecl::new("helper").param("y", None))
        .expect("function");
    assert_eq!(first, second);
    assert_eq!(env.method(first).declaring_class, ty);
    assert!(env.method_scope_of(first).is_some());

    let selector = env.intern("helper");
    let found = env.find_local_method(run, selector, false).expect("lookup");
    assert_eq!(found, Some(Binding::Method(first)));
    assert_eq!(env.add_local_function(run, &MethodDecl::default()), None);
}

#[test]
fn test_variables_called_as_functions() {
    let Fixture { mut env, run, .. } = fixture(CompilerOptions::default());
    let callback = env.intern("callback");
    assert_eq!(env.find_local_method(run, callback, false).expect("lookup"), None);

    let Some(Binding::Method(method)) = env.find_local_method(run, callback, true).expect("lookup") else {
        panic!("untyped variable should be callable");
    };
    assert!(env.method(method).modifiers.contains(Modifiers::VARARGS));
    assert_eq!(env.method_return_type(method).expect("return type"), TypeId::ANY);
    assert_eq!(
        env.find_local_method(run, callback, true).expect("lookup"),
        Some(Binding::Method(method))
    );

    let count = env.intern("count");
    let Some(Binding::Problem(problem)) = env.find_local_method(run, count, true).expect("lookup") else {
        panic!("int variable is not callable");
    };
    assert_eq!(problem.reason, ProblemReason::NotAFunction);
    let local = env.find_variable(run, count).expect("count");
    assert_eq!(problem.closest_match, Some(Binding::Variable(local)));
}

#[test]
fn test_case_local_types_follow_compliance() {
    for (compliance, visible) in [(LanguageLevel::Jdk1_3, true), (LanguageLevel::Jdk1_4, false)] {
        let options = CompilerOptions {
            compliance_level: compliance,
            ..CompilerOptions::default()
        };
        let Fixture { mut env, run, .. } = fixture(options);
        let first_case = env.new_case_block_scope(run, 1);
        let second_case = env.new_case_block_scope(run, 2);
        let local = env
            .add_local_type(first_case, &InferredTypeDecl::new("Tmp"))
            .expect("local type")
            .expect("built");
        let name = env.intern("Tmp");

        let nested = env.new_block_scope(first_case);
        assert_eq!(env.find_local_type(first_case, name, nested), Some(local));
        assert_eq!(
            env.find_local_type(first_case, name, second_case).is_some(),
            visible,
            "{compliance:?}"
        );
    }
}

#[test]
fn test_emulation_path_through_local_types() {
    let Fixture { mut env, run, other, .. } = fixture(CompilerOptions::default());
    let x = env.intern("x");
    let local = env.find_variable(run, x).expect("parameter");
    let helper = env
        .add_local_type(run, &InferredTypeDecl::new("Helper").with_method(MethodDecl::new("go")))
        .expect("local type")
        .expect("built");
    let go = env.declared_method_scope(helper, 0).expect("go scope");

    let block = env.new_block_scope(run);
    assert_eq!(env.emulation_path(block, local).expect("path").as_slice(), &[EmulationStep::Variable(local)]);
    assert_eq!(
        env.emulation_path(go, local).expect("path").as_slice(),
        &[EmulationStep::OuterInstance(helper), EmulationStep::Variable(local)]
    );

    env.add_captured_local(helper, local);
    env.add_captured_local(helper, local);
    assert_eq!(
        env.emulation_path(go, local).expect("path").as_slice(),
        &[EmulationStep::SyntheticCopy(helper)]
    );
    assert_eq!(env.emulation_path(other, local), None);
}

use super::*;
use crate::decl::{CompilationUnitDecl, InferredTypeDecl, LocalDecl, MethodDecl};
use crate::ids::UnitId;
use crate::modifiers::ModifierKeyword;
use crate::name_env::InMemoryNameEnvironment;
use crate::problem::CollectingReporter;
use jsbind_common::{CompilerOptions, LanguageLevel};

fn environment_with(options: CompilerOptions) -> LookupEnvironment {
    LookupEnvironment::with_collaborators(
        options,
        Some(Box::new(InMemoryNameEnvironment::new())),
        Box::new(CollectingReporter::new()),
    )
}

fn accept(env: &mut LookupEnvironment, types: Vec<InferredTypeDecl>) -> UnitId {
    let unit = env.accept_unit(CompilationUnitDecl {
        types,
        ..CompilationUnitDecl::new("calls.js")
    });
    env.complete_type_bindings();
    unit
}

fn type_named(env: &LookupEnvironment, unit: UnitId, name: &str) -> TypeId {
    env.unit(unit)
        .types
        .iter()
        .copied()
        .find(|ty| env.reference(*ty).is_some_and(|binding| env.resolve_atom(binding.source_name) == name))
        .expect("declared type")
}

fn resolve(env: &mut LookupEnvironment, unit: UnitId, receiver: &str, selector: &str, arguments: &[TypeId]) -> Binding {
    let receiver = type_named(env, unit, receiver);
    let scope = env.unit_scope(unit);
    let selector = env.intern(selector);
    env.find_method(scope, receiver, selector, arguments, &InvocationSite::new())
        .expect("lookup")
}

fn overloads() -> Vec<InferredTypeDecl> {
    vec![
        InferredTypeDecl::new("Integer"),
        InferredTypeDecl::new("Calc")
            .with_method(MethodDecl::new("f").param("value", Some("int")))
            .with_method(MethodDecl::new("f").param("value", Some("Integer")))
            .with_method(MethodDecl::new("f").varargs_param("values", "int")),
    ]
}

fn parameter_names(env: &mut LookupEnvironment, binding: &Binding) -> Vec<String> {
    let method = binding.as_method().expect("method");
    env.method_parameter_types(method)
        .expect("parameters")
        .iter()
        .map(|ty| env.type_name(*ty))
        .collect()
}

#[test]
fn test_plain_match_beats_boxing_and_varargs() {
    let mut env = environment_with(CompilerOptions::default());
    let unit = accept(&mut env, overloads());
    let binding = resolve(&mut env, unit, "Calc", "f", &[TypeId::INT]);
    assert_eq!(parameter_names(&mut env, &binding), vec!["int"]);
}

#[test]
fn test_boxed_argument_picks_wrapper_overload() {
    let mut env = environment_with(CompilerOptions::default());
    let unit = accept(&mut env, overloads());
    let integer = type_named(&env, unit, "Integer");
    let binding = resolve(&mut env, unit, "Calc", "f", &[integer]);
    assert_eq!(parameter_names(&mut env, &binding), vec!["Integer"]);
}

#[test]
fn test_extra_arguments_need_varargs() {
    let mut env = environment_with(CompilerOptions::default());
    let unit = accept(&mut env, overloads());
    let binding = resolve(&mut env, unit, "Calc", "f", &[TypeId::INT, TypeId::INT]);
    let method = binding.as_method().expect("method");
    assert!(env.method(method).is_varargs());
    assert_eq!(parameter_names(&mut env, &binding), vec!["int[]"]);
}

#[test]
fn test_varargs_ignored_before_1_5() {
    let options = CompilerOptions {
        source_level: LanguageLevel::Jdk1_4,
        ..CompilerOptions::default()
    };
    let mut env = environment_with(options);
    let unit = accept(&mut env, overloads());
    let binding = resolve(&mut env, unit, "Calc", "f", &[TypeId::INT, TypeId::INT]);
    assert_eq!(binding.problem_reason(), Some(ProblemReason::NotFound));
}

#[test]
fn test_most_specific_and_ambiguous() {
    let mut env = environment_with(CompilerOptions::default());
    let unit = accept(
        &mut env,
        vec![
            InferredTypeDecl::new("P"),
            InferredTypeDecl::new("Host")
                .with_method(MethodDecl::new("k").param("value", Some("Object")))
                .with_method(MethodDecl::new("k").param("value", Some("P")))
                .with_method(MethodDecl::new("h").param("a", Some("P")).param("b", Some("Object")))
                .with_method(MethodDecl::new("h").param("a", Some("Object")).param("b", Some("P"))),
        ],
    );
    let p = type_named(&env, unit, "P");

    let binding = resolve(&mut env, unit, "Host", "k", &[p]);
    assert_eq!(parameter_names(&mut env, &binding), vec!["P"]);

    let binding = resolve(&mut env, unit, "Host", "h", &[p, p]);
    let problem = binding.as_problem().expect("problem");
    assert_eq!(problem.reason, ProblemReason::Ambiguous);
    assert_eq!(problem.argument_types.as_slice(), &[p, p]);
}

fn overriding() -> Vec<InferredTypeDecl> {
    vec![
        InferredTypeDecl::new("A")
            .with_method(MethodDecl::new("m"))
            .with_method(MethodDecl::new("hidden").with_modifier(ModifierKeyword::Private)),
        InferredTypeDecl::new("B")
            .extends("A")
            .with_method(MethodDecl::new("m"))
            .with_method(MethodDecl::new("s").with_modifier(ModifierKeyword::Static)),
    ]
}

#[test]
fn test_override_is_chosen_at_every_compliance() {
    for compliance in [LanguageLevel::Jdk1_3, LanguageLevel::Jdk1_4] {
        let options = CompilerOptions {
            compliance_level: compliance,
            ..CompilerOptions::default()
        };
        let mut env = environment_with(options);
        let unit = accept(&mut env, overriding());
        let b = type_named(&env, unit, "B");
        let binding = resolve(&mut env, unit, "B", "m", &[]);
        let method = binding.as_method().expect("method");
        assert_eq!(env.method(method).declaring_class, b, "{compliance:?}");
    }
}

#[test]
fn test_private_method_not_visible_from_subclass() {
    let mut env = environment_with(CompilerOptions::default());
    let unit = accept(&mut env, overriding());
    let b = type_named(&env, unit, "B");
    let scope = env.class_scope_of(b).expect("class scope");
    let hidden = env.intern("hidden");

    let binding = env
        .find_method(scope, b, hidden, &[], &InvocationSite::new())
        .expect("lookup");
    let problem = binding.as_problem().expect("problem");
    assert_eq!(problem.reason, ProblemReason::NotVisible);
    assert!(problem.closest_match.as_ref().and_then(Binding::as_method).is_some());
    assert_eq!(problem.searched_type, Some(b));
}

#[test]
fn test_best_effort_answers_closest_candidate() {
    let mut env = environment_with(CompilerOptions::default());
    let unit = accept(&mut env, overloads());
    let calc = type_named(&env, unit, "Calc");
    let scope = env.unit_scope(unit);
    let f = env.intern("f");

    let best = env
        .find_method_best_effort(scope, calc, f, &[TypeId::BOOLEAN], &InvocationSite::new())
        .expect("lookup");
    assert!(best.is_some());
    let missing = env.intern("nothing");
    let none = env
        .find_method_best_effort(scope, calc, missing, &[], &InvocationSite::new())
        .expect("lookup");
    assert_eq!(none, None);
}

#[test]
fn test_implicit_call_finds_inherited_method() {
    let mut env = environment_with(CompilerOptions::default());
    let unit = accept(&mut env, overriding());
    let (a, b) = (type_named(&env, unit, "A"), type_named(&env, unit, "B"));
    let scope = env.declared_method_scope(b, 0).expect("method scope");
    let m = env.intern("m");

    let mut site = InvocationSite::new();
    let binding = env.get_implicit_method(scope, m, &[], &mut site).expect("lookup");
    let method = binding.as_method().expect("method");
    assert_eq!(env.method(method).declaring_class, b);
    assert_eq!(site.actual_receiver, Some(b));
    assert_ne!(env.method(method).declaring_class, a);
}

#[test]
fn test_instance_call_from_static_method() {
    let mut env = environment_with(CompilerOptions::default());
    let unit = accept(&mut env, overriding());
    let b = type_named(&env, unit, "B");
    let scope = env.declared_method_scope(b, 1).expect("static method scope");
    let m = env.intern("m");

    let mut site = InvocationSite::new();
    let binding = env.get_implicit_method(scope, m, &[], &mut site).expect("lookup");
    assert_eq!(binding.problem_reason(), Some(ProblemReason::NonStaticReferenceInStaticContext));
}

#[test]
fn test_implicit_call_to_unit_functions_and_variables() {
    let mut env = environment_with(CompilerOptions::default());
    let unit = env.accept_unit(CompilationUnitDecl {
        functions: vec![MethodDecl::new("helper")],
        variables: vec![
            LocalDecl::new("callback", Some("Function")),
            LocalDecl::new("count", Some("int")),
        ],
        ..CompilationUnitDecl::new("script.js")
    });
    env.complete_type_bindings();
    let scope = env.unit_scope(unit);
    let mut site = InvocationSite::new();

    let helper = env.intern("helper");
    let binding = env.get_implicit_method(scope, helper, &[], &mut site).expect("lookup");
    let method = binding.as_method().expect("function");
    assert_eq!(env.method(method).declaring_class, env.unit(unit).unit_type);

    let callback = env.intern("callback");
    let binding = env
        .get_implicit_method(scope, callback, &[TypeId::INT], &mut site)
        .expect("lookup");
    let method = binding.as_method().expect("variable function");
    assert!(env.method(method).is_varargs());
    let again = env
        .get_implicit_method(scope, callback, &[], &mut site)
        .expect("lookup");
    assert_eq!(again.as_method(), Some(method));

    let count = env.intern("count");
    let binding = env.get_implicit_method(scope, count, &[], &mut site).expect("lookup");
    assert_eq!(binding.problem_reason(), Some(ProblemReason::NotAFunction));
}

#[test]
fn test_default_constructor_is_shared() {
    let mut env = environment_with(CompilerOptions::default());
    let unit = accept(&mut env, overriding());
    let a = type_named(&env, unit, "A");
    let scope = env.unit_scope(unit);

    let first = env
        .get_constructor(scope, a, &[], &InvocationSite::new())
        .expect("constructor");
    let method = first.as_method().expect("method");
    assert!(env.method(method).modifiers.contains(Modifiers::DEFAULT_CONSTRUCTOR));
    assert_eq!(env.method(method).allocation_type, Some(a));
    let second = env
        .get_constructor(scope, a, &[], &InvocationSite::new())
        .expect("constructor");
    assert_eq!(second.as_method(), Some(method));
}

#[test]
fn test_declared_constructor_is_ranked() {
    let mut env = environment_with(CompilerOptions::default());
    let unit = accept(
        &mut env,
        vec![
            InferredTypeDecl::new("Point")
                .with_method(MethodDecl::constructor().param("x", Some("int")).param("y", Some("int"))),
        ],
    );
    let point = type_named(&env, unit, "Point");
    let scope = env.unit_scope(unit);

    let exact = env
        .get_constructor(scope, point, &[TypeId::INT, TypeId::INT], &InvocationSite::new())
        .expect("constructor");
    assert!(exact.as_method().is_some_and(|method| env.method(method).is_constructor()));

    let missing = env
        .get_constructor(scope, point, &[], &InvocationSite::new())
        .expect("constructor");
    assert_eq!(missing.problem_reason(), Some(ProblemReason::NotFound));
}

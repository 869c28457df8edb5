use super::*;
use crate::decl::{CompilationUnitDecl, InferredTypeDecl, MethodDecl};
use crate::modifiers::ModifierKeyword;
use crate::name_env::InMemoryNameEnvironment;
use crate::problem::CollectingReporter;
use jsbind_common::CompilerOptions;

fn verify(base: MethodDecl, derived: MethodDecl) -> (LookupEnvironment, CollectingReporter, TypeId) {
    let reporter = CollectingReporter::new();
    let mut env = LookupEnvironment::with_collaborators(
        CompilerOptions::default(),
        Some(Box::new(InMemoryNameEnvironment::new())),
        Box::new(reporter.clone()),
    );
    let unit = env.accept_unit(CompilationUnitDecl {
        types: vec![
            InferredTypeDecl::new("A").with_method(base),
            InferredTypeDecl::new("B").extends("A").with_method(derived),
        ],
        ..CompilationUnitDecl::new("override.js")
    });
    env.complete_type_bindings();
    let b = env.unit(unit).types[1];
    (env, reporter, b)
}

fn declared_method(env: &mut LookupEnvironment, ty: TypeId, selector: &str) -> MethodId {
    let selector = env.intern(selector);
    env.get_methods(ty, selector).expect("methods")[0]
}

#[test]
fn test_static_cannot_hide_instance_method() {
    let (_, reporter, _) = verify(
        MethodDecl::new("m"),
        MethodDecl::new("m").with_modifier(ModifierKeyword::Static),
    );
    assert_eq!(reporter.count(diagnostic_codes::STATIC_AND_INSTANCE_CONFLICT), 1);
    assert_eq!(reporter.count(diagnostic_codes::VISIBILITY_CONFLICT), 0);
}

#[test]
fn test_override_cannot_reduce_visibility() {
    let (mut env, reporter, b) = verify(
        MethodDecl::new("m"),
        MethodDecl::new("m").with_modifier(ModifierKeyword::Protected),
    );
    assert_eq!(reporter.count(diagnostic_codes::VISIBILITY_CONFLICT), 1);
    let method = declared_method(&mut env, b, "m");
    assert!(env.method(method).modifiers.contains(Modifiers::OVERRIDING));
}

#[test]
fn test_return_type_must_be_compatible() {
    let (_, reporter, _) = verify(MethodDecl::new("m").returns("int"), MethodDecl::new("m").returns("boolean"));
    assert_eq!(reporter.count(diagnostic_codes::INCOMPATIBLE_RETURN_TYPE), 1);

    let (_, reporter, _) = verify(MethodDecl::new("m").returns("long"), MethodDecl::new("m").returns("int"));
    assert!(reporter.is_empty(), "{:?}", reporter.codes());
}

#[test]
fn test_covariant_return_is_accepted() {
    let (mut env, reporter, b) = verify(MethodDecl::new("make").returns("Object"), MethodDecl::new("make").returns("B"));
    assert!(reporter.is_empty(), "{:?}", reporter.codes());
    let method = declared_method(&mut env, b, "make");
    assert!(env.method(method).modifiers.contains(Modifiers::OVERRIDING));
}

#[test]
fn test_different_parameters_do_not_override() {
    let (mut env, reporter, b) = verify(
        MethodDecl::new("m").param("value", Some("int")),
        MethodDecl::new("m").with_modifier(ModifierKeyword::Static),
    );
    assert!(reporter.is_empty(), "{:?}", reporter.codes());
    let method = declared_method(&mut env, b, "m");
    assert!(!env.method(method).modifiers.contains(Modifiers::OVERRIDING));
}

use super::*;
use crate::decl::{InferredTypeDecl, MethodDecl};

fn environment() -> (LookupEnvironment, CollectingReporter) {
    let reporter = CollectingReporter::new();
    let env = LookupEnvironment::with_collaborators(
        CompilerOptions::default(),
        Some(Box::new(InMemoryNameEnvironment::new())),
        Box::new(reporter.clone()),
    );
    (env, reporter)
}

#[test]
fn test_base_types_have_fixed_ids() {
    let (env, _) = environment();
    assert_eq!(env.type_name(TypeId::VOID), "void");
    assert_eq!(env.type_name(TypeId::INT), "int");
    assert_eq!(env.type_name(TypeId::NULL), "null");
    assert_eq!(env.type_name(TypeId::ANY), "any");
    assert!(env.object_type().0 >= TypeId::FIRST_REFERENCE);
}

#[test]
fn test_roots_live_in_default_package() {
    let (env, _) = environment();
    let package = env.package(env.default_package());
    assert!(package.is_default());
    let object = env.interner().get("Object");
    assert_eq!(object.and_then(|name| package.get_type0(name)), Some(env.object_type()));
    assert_eq!(env.type_name(env.function_type()), "Function");
    assert_eq!(
        env.reference(env.function_type()).and_then(|binding| binding.superclass),
        Some(env.object_type())
    );
}

#[test]
fn test_roots_have_complete_empty_members() {
    let (mut env, _) = environment();
    let object = env.object_type();
    assert!(env.fields(object).expect("fields").is_empty());
    assert!(env.methods(object).expect("methods").is_empty());
}

#[test]
fn test_reset_discards_units() {
    let (mut env, _) = environment();
    let mut unit = CompilationUnitDecl::new("a.js");
    unit.types.push(InferredTypeDecl::new("A"));
    env.accept_unit(unit);
    env.complete_type_bindings();
    let populated = env.type_count();

    env.reset();
    assert_eq!(env.units().count(), 0);
    assert!(env.type_count() < populated);
    assert_eq!(env.phase(), Phase::NotStarted);
    let name = env.intern("A");
    assert!(matches!(env.get_type(&[name]), Ok(None)));
}

#[test]
fn test_method_name_lists_parameters() {
    let (mut env, _) = environment();
    let mut unit = CompilationUnitDecl::new("a.js");
    unit.types.push(
        InferredTypeDecl::new("A").with_method(
            MethodDecl::new("move")
                .param("x", Some("int"))
                .param("y", Some("double")),
        ),
    );
    env.accept_unit(unit);
    env.complete_type_bindings();
    let name = env.intern("A");
    let ty = env.get_type(&[name]).expect("lookup").and_then(|b| b.as_type()).expect("type");
    let methods = env.methods(ty).expect("methods");
    assert_eq!(env.method_name(methods[0]), "move(int, double)");
}

#[test]
fn test_object_type_is_synthetic() {
    let (env, _) = environment();
    assert!(matches!(
        env.reference(env.object_type()).map(|binding| &binding.provenance),
        Some(Provenance::Synthetic)
    ));
}

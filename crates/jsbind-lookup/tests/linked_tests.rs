use super::*;
use crate::decl::{CompilationUnitDecl, FieldDecl, InferredTypeDecl, MethodDecl};
use crate::ids::UnitId;
use crate::name_env::InMemoryNameEnvironment;
use crate::problem::CollectingReporter;
use jsbind_common::CompilerOptions;
use jsbind_common::diagnostics::diagnostic_codes;

fn split_shape(second_super: &str) -> (LookupEnvironment, CollectingReporter, TypeId, TypeId) {
    let reporter = CollectingReporter::new();
    let mut env = LookupEnvironment::with_collaborators(
        CompilerOptions::default(),
        Some(Box::new(InMemoryNameEnvironment::new())),
        Box::new(reporter.clone()),
    );
    let first = env.accept_unit(CompilationUnitDecl {
        types: vec![
            InferredTypeDecl::new("Base"),
            InferredTypeDecl::new("Shape")
                .with_field(FieldDecl::new("x").typed("int"))
                .with_method(MethodDecl::new("area").returns("double")),
        ],
        ..CompilationUnitDecl::new("shape.js")
    });
    let second = env.accept_unit(CompilationUnitDecl {
        types: vec![
            InferredTypeDecl::new("Shape")
                .extends(second_super)
                .with_field(FieldDecl::new("x").typed("long"))
                .with_field(FieldDecl::new("y").typed("int"))
                .with_method(MethodDecl::new("area").returns("double"))
                .with_method(MethodDecl::new("perimeter")),
        ],
        ..CompilationUnitDecl::new("shape_ext.js")
    });
    env.complete_type_bindings();
    let first = env.unit(first).types[1];
    let second = env.unit(second).types[0];
    (env, reporter, first, second)
}

fn sorted_names(env: &LookupEnvironment, atoms: impl Iterator<Item = jsbind_common::Atom>) -> Vec<String> {
    let mut names: Vec<String> = atoms.map(|atom| env.resolve_atom(atom).to_string()).collect();
    names.sort();
    names
}

#[test]
fn test_second_declaration_joins_the_first() {
    let (env, reporter, first, second) = split_shape("Base");
    assert!(reporter.is_empty(), "{:?}", reporter.codes());
    assert_eq!(env.linked_types(first).as_slice(), &[first, second]);
    assert!(env.is_linked_with(second, first));
    let shape = env.interner().get("Shape").expect("interned");
    assert_eq!(env.package(env.default_package()).get_type0(shape), Some(first));
}

#[test]
fn test_members_are_the_union() {
    let (mut env, _, first, second) = split_shape("Base");
    let fields = env.fields(second).expect("fields");
    assert_eq!(
        sorted_names(&env, fields.iter().map(|field| env.field(*field).name)),
        vec!["prototype", "x", "y"]
    );
    let x = fields
        .iter()
        .copied()
        .find(|field| env.resolve_atom(env.field(*field).name) == "x")
        .expect("x");
    assert_eq!(env.field(x).declaring_class, first);
    assert!(Arc::ptr_eq(&fields, &env.fields(first).expect("fields")));

    let methods = env.methods(first).expect("methods");
    assert_eq!(
        sorted_names(&env, methods.iter().map(|method| env.method(*method).selector)),
        vec!["area", "perimeter"]
    );
}

#[test]
fn test_group_superclass_skips_object() {
    let (mut env, _, first, second) = split_shape("Base");
    let base = env.unit(UnitId(0)).types[0];
    assert_eq!(env.superclass(first).expect("superclass"), Some(base));
    assert_eq!(env.superclass(second).expect("superclass"), Some(base));
    assert_eq!(env.reference(first).and_then(|binding| binding.superclass), Some(env.object_type()));
}

#[test]
fn test_extending_a_linked_declaration_is_a_cycle() {
    let (mut env, reporter, first, second) = split_shape("Shape");
    assert_eq!(reporter.count(diagnostic_codes::HIERARCHY_CIRCULARITY), 1);
    assert_eq!(env.superclass(second).expect("superclass"), Some(env.object_type()));
    assert_eq!(env.superclass(first).expect("superclass"), Some(env.object_type()));
}

#[test]
fn test_linking_drops_cached_unions() {
    let (mut env, _, first, _) = split_shape("Base");
    let base = env.unit(UnitId(0)).types[0];
    let before = env.fields(first).expect("fields");
    env.add_linked_binding(base, first);
    let after = env.fields(first).expect("fields");
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(env.linked_types(first).first(), Some(&base));
    assert_eq!(env.linked_types(first).len(), 3);

    env.add_linked_binding(first, base);
    assert_eq!(env.linked_types(base).len(), 3);
}

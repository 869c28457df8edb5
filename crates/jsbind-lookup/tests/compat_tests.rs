use super::*;
use crate::decl::{CompilationUnitDecl, InferredTypeDecl, MethodDecl};
use crate::ids::UnitId;
use crate::name_env::InMemoryNameEnvironment;
use crate::problem::CollectingReporter;
use jsbind_common::{CompilerOptions, LanguageLevel};

fn hierarchy(options: CompilerOptions) -> (LookupEnvironment, UnitId) {
    let mut env = LookupEnvironment::with_collaborators(
        options,
        Some(Box::new(InMemoryNameEnvironment::new())),
        Box::new(CollectingReporter::new()),
    );
    let unit = env.accept_unit(CompilationUnitDecl {
        types: vec![
            InferredTypeDecl::new("Animal"),
            InferredTypeDecl::new("Dog").extends("Animal"),
            InferredTypeDecl::new("Rock"),
            InferredTypeDecl::new("Integer"),
            InferredTypeDecl::new("Printer")
                .with_method(MethodDecl::new("print").param("value", Some("long")))
                .with_method(MethodDecl::new("print").param("value", Some("Integer")))
                .with_method(
                    MethodDecl::new("print")
                        .param("format", Some("Animal"))
                        .varargs_param("rest", "int"),
                ),
        ],
        ..CompilationUnitDecl::new("zoo.js")
    });
    env.complete_type_bindings();
    (env, unit)
}

fn named(env: &LookupEnvironment, unit: UnitId, index: usize) -> TypeId {
    env.unit(unit).types[index]
}

fn print_overloads(env: &mut LookupEnvironment, unit: UnitId) -> (MethodId, MethodId, MethodId) {
    let printer = named(env, unit, 4);
    let print = env.intern("print");
    let methods = env.get_methods(printer, print).expect("methods");
    let mut by_first_parameter = |name: &str| {
        methods
            .iter()
            .copied()
            .find(|method| {
                let parameters = env.method_parameter_types(*method).expect("parameters");
                env.type_name(parameters[0]) == name
            })
            .expect("overload")
    };
    let long = by_first_parameter("long");
    let boxed = by_first_parameter("Integer");
    let varargs = by_first_parameter("Animal");
    (long, boxed, varargs)
}

#[test]
fn test_reference_compatibility() {
    let (mut env, unit) = hierarchy(CompilerOptions::default());
    let (animal, dog, rock) = (named(&env, unit, 0), named(&env, unit, 1), named(&env, unit, 2));
    let object = env.object_type();

    assert!(env.is_compatible_with(dog, animal).expect("compat"));
    assert!(!env.is_compatible_with(animal, dog).expect("compat"));
    assert!(!env.is_compatible_with(rock, animal).expect("compat"));
    assert!(env.is_compatible_with(rock, object).expect("compat"));
    assert!(env.is_superclass_of(animal, dog).expect("superclass"));
    assert!(env.is_superclass_of(dog, dog).expect("superclass"));
    assert!(!env.is_superclass_of(dog, animal).expect("superclass"));
}

#[test]
fn test_answers_are_memoized_on_the_source_type() {
    let (mut env, unit) = hierarchy(CompilerOptions::default());
    let (animal, dog) = (named(&env, unit, 0), named(&env, unit, 1));
    env.is_compatible_with(dog, animal).expect("compat");
    let cached = env
        .reference(dog)
        .and_then(|binding| binding.compatible_cache.get(&animal).copied());
    assert_eq!(cached, Some(true));
}

#[test]
fn test_base_and_special_types() {
    let (mut env, unit) = hierarchy(CompilerOptions::default());
    let dog = named(&env, unit, 1);

    assert!(env.is_compatible_with(TypeId::INT, TypeId::LONG).expect("compat"));
    assert!(!env.is_compatible_with(TypeId::LONG, TypeId::INT).expect("compat"));
    assert!(env.is_compatible_with(TypeId::ANY, dog).expect("compat"));
    assert!(env.is_compatible_with(dog, TypeId::ANY).expect("compat"));
    assert!(env.is_compatible_with(TypeId::NULL, dog).expect("compat"));
    assert!(!env.is_compatible_with(TypeId::NULL, TypeId::INT).expect("compat"));
    assert!(!env.is_compatible_with(TypeId::INT, dog).expect("compat"));
}

#[test]
fn test_arrays_are_covariant() {
    let (mut env, unit) = hierarchy(CompilerOptions::default());
    let (animal, dog) = (named(&env, unit, 0), named(&env, unit, 1));
    let object = env.object_type();
    let dogs = env.create_array_type(dog, 1);
    let animals = env.create_array_type(animal, 1);
    let ints = env.create_array_type(TypeId::INT, 1);
    let longs = env.create_array_type(TypeId::LONG, 1);
    let grid = env.create_array_type(dog, 2);
    let objects = env.create_array_type(object, 1);

    assert!(env.is_compatible_with(dogs, animals).expect("compat"));
    assert!(!env.is_compatible_with(animals, dogs).expect("compat"));
    assert!(!env.is_compatible_with(ints, longs).expect("compat"));
    assert!(env.is_compatible_with(grid, objects).expect("compat"));
    assert!(env.is_compatible_with(dogs, object).expect("compat"));
    assert!(!env.is_compatible_with(object, dogs).expect("compat"));
}

#[test]
fn test_compatibility_ladder() {
    let (mut env, unit) = hierarchy(CompilerOptions::default());
    let (dog, integer) = (named(&env, unit, 1), named(&env, unit, 3));
    let (long, boxed, varargs) = print_overloads(&mut env, unit);

    let level = |env: &mut LookupEnvironment, method, arguments: &[TypeId]| {
        env.parameter_compatibility_level(method, arguments).expect("level")
    };
    assert_eq!(level(&mut env, long, &[TypeId::INT]), CompatibilityLevel::Compatible);
    assert_eq!(level(&mut env, long, &[integer]), CompatibilityLevel::Autobox);
    assert_eq!(level(&mut env, boxed, &[TypeId::INT]), CompatibilityLevel::Autobox);
    assert_eq!(level(&mut env, boxed, &[integer]), CompatibilityLevel::Compatible);
    assert_eq!(level(&mut env, varargs, &[dog]), CompatibilityLevel::Varargs);
    assert_eq!(level(&mut env, varargs, &[dog, TypeId::INT, TypeId::CHAR]), CompatibilityLevel::Varargs);
    assert_eq!(level(&mut env, varargs, &[dog, TypeId::BOOLEAN]), CompatibilityLevel::NotCompatible);
    let ints = env.create_array_type(TypeId::INT, 1);
    assert_eq!(level(&mut env, varargs, &[dog, ints]), CompatibilityLevel::Compatible);
    assert_eq!(level(&mut env, long, &[]), CompatibilityLevel::NotCompatible);
}

#[test]
fn test_ladder_without_boxing_before_1_5() {
    let options = CompilerOptions {
        source_level: LanguageLevel::Jdk1_4,
        ..CompilerOptions::default()
    };
    let (mut env, unit) = hierarchy(options);
    let (_, boxed, _) = print_overloads(&mut env, unit);
    let level = env
        .parameter_compatibility_level(boxed, &[TypeId::INT])
        .expect("level");
    assert_eq!(level, CompatibilityLevel::NotCompatible);
}

#[test]
fn test_ladder_order() {
    assert!(CompatibilityLevel::Compatible < CompatibilityLevel::Autobox);
    assert!(CompatibilityLevel::Autobox < CompatibilityLevel::Varargs);
    assert!(!CompatibilityLevel::LADDER.contains(&CompatibilityLevel::NotCompatible));
}

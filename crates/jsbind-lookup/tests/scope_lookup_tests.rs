use super::*;
use crate::decl::{CompilationUnitDecl, FieldDecl, ImportDecl, InferredTypeDecl, LocalDecl, MethodDecl};
use crate::metadata::MetadataTypeDescriptor;
use crate::name_env::InMemoryNameEnvironment;
use crate::problem::CollectingReporter;
use jsbind_common::{CompilerOptions, LanguageLevel};

fn environment_with(options: CompilerOptions, names: InMemoryNameEnvironment) -> LookupEnvironment {
    LookupEnvironment::with_collaborators(options, Some(Box::new(names)), Box::new(CollectingReporter::new()))
}

fn environment() -> LookupEnvironment {
    environment_with(CompilerOptions::default(), InMemoryNameEnvironment::new())
}

fn unit(file: &str, package: &str, types: Vec<InferredTypeDecl>) -> CompilationUnitDecl {
    CompilationUnitDecl {
        package: package.to_string(),
        types,
        ..CompilationUnitDecl::new(file)
    }
}

fn type_named(env: &LookupEnvironment, unit: UnitId, name: &str) -> TypeId {
    env.unit(unit)
        .types
        .iter()
        .copied()
        .find(|ty| env.reference(*ty).is_some_and(|binding| env.resolve_atom(binding.source_name) == name))
        .expect("declared type")
}

fn shapes() -> CompilationUnitDecl {
    unit(
        "shapes.js",
        "",
        vec![
            InferredTypeDecl::new("A")
                .with_field(FieldDecl::new("x").typed("int"))
                .with_method(MethodDecl::new("f")),
            InferredTypeDecl::new("B")
                .extends("A")
                .with_method(MethodDecl::new("g").param("x", Some("A"))),
        ],
    )
}

#[test]
fn test_inherited_field_reports_receiver() {
    let mut env = environment();
    let shapes = env.accept_unit(shapes());
    env.complete_type_bindings();
    let (a, b) = (type_named(&env, shapes, "A"), type_named(&env, shapes, "B"));
    let scope = env.class_scope_of(b).expect("class scope");
    let x = env.intern("x");

    let mut site = InvocationSite::new();
    let binding = env.get_binding(scope, x, BindingMask::FIELD, &mut site).expect("lookup");
    let field = binding.as_field().expect("field");
    assert_eq!(env.field(field).declaring_class, a);
    assert_eq!(site.actual_receiver, Some(b));
    assert_eq!(site.depth, 0);
}

#[test]
fn test_parameter_hides_field() {
    let mut env = environment();
    let shapes = env.accept_unit(shapes());
    env.complete_type_bindings();
    let b = type_named(&env, shapes, "B");
    let scope = env.declared_method_scope(b, 0).expect("method scope");
    let x = env.intern("x");

    let mut site = InvocationSite::new();
    let binding = env.get_binding(scope, x, BindingMask::VARIABLE, &mut site).expect("lookup");
    let local = binding.as_local().expect("local");
    assert!(env.local(local).is_argument);
}

#[test]
fn test_inherited_method_found_from_subclass() {
    let mut env = environment();
    let shapes = env.accept_unit(shapes());
    env.complete_type_bindings();
    let (a, b) = (type_named(&env, shapes, "A"), type_named(&env, shapes, "B"));
    let scope = env.class_scope_of(b).expect("class scope");
    let f = env.intern("f");

    let mut site = InvocationSite::new();
    let binding = env.get_binding(scope, f, BindingMask::METHOD, &mut site).expect("lookup");
    let method = binding.as_method().expect("method");
    assert_eq!(env.method(method).declaring_class, a);
    assert_eq!(site.actual_receiver, Some(b));
}

#[test]
fn test_unknown_name_is_not_found() {
    let mut env = environment();
    let shapes = env.accept_unit(shapes());
    env.complete_type_bindings();
    let scope = env.unit_scope(shapes);
    let name = env.intern("Nowhere");

    let mut site = InvocationSite::new();
    let binding = env.get_binding(scope, name, BindingMask::TYPE, &mut site).expect("lookup");
    let problem = binding.as_problem().expect("problem");
    assert_eq!(problem.reason, ProblemReason::NotFound);
    assert_eq!(problem.kind, ProblemKind::Type);

    let binding = env
        .get_binding(scope, name, BindingMask::VARIABLE | BindingMask::TYPE, &mut site)
        .expect("lookup");
    assert_eq!(binding.as_problem().map(|problem| problem.kind), Some(ProblemKind::Name));
}

fn hiding_fixture(options: CompilerOptions) -> (LookupEnvironment, UnitId) {
    let mut env = environment_with(options, InMemoryNameEnvironment::new());
    let decl = unit(
        "outer.js",
        "",
        vec![
            InferredTypeDecl::new("Base").with_field(FieldDecl::new("x").typed("int")),
            InferredTypeDecl::new("Outer")
                .with_field(FieldDecl::new("x").typed("int"))
                .with_member_type(InferredTypeDecl::new("Inner").extends("Base")),
        ],
    );
    let id = env.accept_unit(decl);
    env.complete_type_bindings();
    (env, id)
}

#[test]
fn test_inherited_name_hides_enclosing_name_before_1_4() {
    let options = CompilerOptions {
        compliance_level: LanguageLevel::Jdk1_3,
        ..CompilerOptions::default()
    };
    let (mut env, id) = hiding_fixture(options);
    let base = type_named(&env, id, "Base");
    let inner = type_named(&env, id, "Inner");
    let scope = env.class_scope_of(inner).expect("class scope");
    let x = env.intern("x");

    let mut site = InvocationSite::new();
    let binding = env.get_binding(scope, x, BindingMask::FIELD, &mut site).expect("lookup");
    let problem = binding.as_problem().expect("problem");
    assert_eq!(problem.reason, ProblemReason::InheritedNameHidesEnclosingName);
    let closest = problem.closest_match.as_ref().and_then(Binding::as_field).expect("closest");
    assert_eq!(env.field(closest).declaring_class, base);
}

#[test]
fn test_inherited_field_wins_from_1_4() {
    let (mut env, id) = hiding_fixture(CompilerOptions::default());
    let base = type_named(&env, id, "Base");
    let inner = type_named(&env, id, "Inner");
    let scope = env.class_scope_of(inner).expect("class scope");
    let x = env.intern("x");

    let mut site = InvocationSite::new();
    let binding = env.get_binding(scope, x, BindingMask::FIELD, &mut site).expect("lookup");
    let field = binding.as_field().expect("field");
    assert_eq!(env.field(field).declaring_class, base);
    assert_eq!(site.actual_receiver, Some(inner));
}

#[test]
fn test_compound_type_names() {
    let mut env = environment();
    env.accept_unit(unit("geo/point.js", "geo", vec![InferredTypeDecl::new("Point")]));
    let main = env.accept_unit(unit("main.js", "", Vec::new()));
    env.complete_type_bindings();
    let scope = env.unit_scope(main);

    let point = env.intern_dotted("geo.Point");
    let found = env.get_type_compound(scope, &point).expect("lookup");
    assert_eq!(found.as_type().map(|ty| env.type_name(ty)), Some("geo.Point".to_string()));

    let nope = env.intern_dotted("geo.Nope");
    let problem = env.get_type_compound(scope, &nope).expect("lookup");
    assert_eq!(problem.as_problem().map(|problem| problem.name.clone()), Some(nope.clone()));

    let nowhere = env.intern_dotted("nowhere.Thing");
    let problem = env.get_type_compound(scope, &nowhere).expect("lookup");
    let problem = problem.as_problem().expect("problem");
    assert_eq!(problem.name, nowhere[..1].to_vec());
    assert_eq!(problem.reason, ProblemReason::NotFound);
}

#[test]
fn test_on_demand_imports_can_be_ambiguous() {
    let mut env = environment();
    env.accept_unit(unit("p/t.js", "p", vec![InferredTypeDecl::new("T")]));
    env.accept_unit(unit("q/t.js", "q", vec![InferredTypeDecl::new("T")]));
    let importer = env.accept_unit(CompilationUnitDecl {
        imports: vec![
            ImportDecl {
                name: "p".to_string(),
                on_demand: true,
                ..ImportDecl::default()
            },
            ImportDecl {
                name: "q".to_string(),
                on_demand: true,
                ..ImportDecl::default()
            },
        ],
        ..CompilationUnitDecl::new("main.js")
    });
    env.complete_type_bindings();
    let scope = env.unit_scope(importer);
    let t = env.intern("T");

    let binding = env.get_type_or_package(scope, t, BindingMask::TYPE).expect("lookup");
    assert_eq!(binding.problem_reason(), Some(ProblemReason::Ambiguous));
}

#[test]
fn test_single_type_import_wins() {
    let mut env = environment();
    env.accept_unit(unit("p/t.js", "p", vec![InferredTypeDecl::new("T")]));
    let importer = env.accept_unit(CompilationUnitDecl {
        imports: vec![ImportDecl {
            name: "p.T".to_string(),
            ..ImportDecl::default()
        }],
        ..CompilationUnitDecl::new("main.js")
    });
    env.complete_type_bindings();
    assert_eq!(env.unit_imports(importer).len(), 1);
    let scope = env.unit_scope(importer);
    let t = env.intern("T");

    let binding = env.get_type_or_package(scope, t, BindingMask::TYPE).expect("lookup");
    assert_eq!(binding.as_type().map(|ty| env.type_name(ty)), Some("p.T".to_string()));
}

#[test]
fn test_compound_binding_walks_through_variable_type() {
    let mut env = environment();
    let mut decl = shapes();
    decl.variables.push(LocalDecl::new("shape", Some("A")));
    let shapes = env.accept_unit(decl);
    env.complete_type_bindings();
    let a = type_named(&env, shapes, "A");
    let scope = env.unit_scope(shapes);

    let path = env.intern_dotted("shape.x");
    let mut site = InvocationSite::new();
    let binding = env
        .get_binding_compound(scope, &path, BindingMask::VARIABLE, &mut site)
        .expect("lookup");
    let field = binding.as_field().expect("field");
    assert_eq!(env.field(field).declaring_class, a);

    let missing = env.intern_dotted("shape.nope");
    let binding = env
        .get_binding_compound(scope, &missing, BindingMask::VARIABLE, &mut site)
        .expect("lookup");
    assert_eq!(binding.as_problem().map(|problem| problem.name.clone()), Some(missing));
}

#[test]
fn test_global_super_type_members_visible_at_unit_level() {
    let names = InMemoryNameEnvironment::new()
        .with_metadata(MetadataTypeDescriptor::new("Window").with_property("document", Some("any")));
    let mut env = environment_with(CompilerOptions::default(), names);
    let page = env.accept_unit(CompilationUnitDecl {
        global_super_type: Some("Window".to_string()),
        ..CompilationUnitDecl::new("page.js")
    });
    env.complete_type_bindings();
    let scope = env.unit_scope(page);
    let document = env.intern("document");

    let mut site = InvocationSite::new();
    let binding = env
        .get_binding(scope, document, BindingMask::VARIABLE, &mut site)
        .expect("lookup");
    let field = binding.as_field().expect("field");
    assert_eq!(env.type_name(env.field(field).declaring_class), "Window");
    assert_eq!(site.actual_receiver, Some(env.unit(page).unit_type));
}

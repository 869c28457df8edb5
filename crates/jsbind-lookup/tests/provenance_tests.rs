//! Source, binary and metadata types answering the same queries.

use std::sync::Arc;

use jsbind_common::CompilerOptions;
use jsbind_lookup::{
    BinaryFieldDescriptor, BinaryMethodDescriptor, BinaryTypeDescriptor, CollectingReporter, CompilationUnitDecl,
    FieldDecl, InMemoryNameEnvironment, InferredTypeDecl, LookupEnvironment, MetadataMethod, MetadataTypeDescriptor,
    TypeId, UnitId,
};

fn library() -> InMemoryNameEnvironment {
    let window = MetadataTypeDescriptor::new("Window")
        .with_property("document", Some("Document"))
        .with_property("status", Some("String"))
        .with_property("status", Some("int"))
        .with_property("opener", Some("Ghost"))
        .with_method(MetadataMethod::new("open").param("url", Some("String")).returns("Window"))
        .with_constructor(MetadataMethod::new("Window"));
    let mut panel = BinaryTypeDescriptor::new("ui/Panel")
        .extends("ui/Component")
        .with_field("width", "int")
        .with_method(BinaryMethodDescriptor::new("<clinit>", &[]))
        .with_method(BinaryMethodDescriptor::new("access$000", &["ui.Panel"]).synthetic())
        .with_method(BinaryMethodDescriptor::new("layout", &[]))
        .with_member_type("ui/Panel$Slot");
    panel.fields.push(BinaryFieldDescriptor {
        name: "this$0".to_string(),
        type_name: Some("ui.Panel".to_string()),
        synthetic: true,
        ..BinaryFieldDescriptor::default()
    });

    InMemoryNameEnvironment::new()
        .with_metadata(window)
        .with_metadata(MetadataTypeDescriptor::new("Document").with_property("title", Some("String")))
        .with_binary(BinaryTypeDescriptor::new("ui/Component"))
        .with_binary(panel)
        .with_binary(BinaryTypeDescriptor {
            enclosing_type: Some("ui/Panel".to_string()),
            ..BinaryTypeDescriptor::new("ui/Panel$Slot")
        })
}

fn environment() -> (LookupEnvironment, UnitId, CollectingReporter) {
    let reporter = CollectingReporter::new();
    let mut env = LookupEnvironment::with_collaborators(
        CompilerOptions::default(),
        Some(Box::new(library())),
        Box::new(reporter.clone()),
    );
    let unit = env.accept_unit(CompilationUnitDecl {
        types: vec![
            InferredTypeDecl::new("Page")
                .extends("Window")
                .with_field(FieldDecl::new("heading").typed("String")),
            InferredTypeDecl::new("Frame").extends("ui.Panel"),
        ],
        ..CompilationUnitDecl::new("page.js")
    });
    env.complete_type_bindings();
    (env, unit, reporter)
}

fn named(env: &LookupEnvironment, unit: UnitId, name: &str) -> TypeId {
    env.unit(unit)
        .types
        .iter()
        .copied()
        .find(|ty| env.type_name(*ty) == name)
        .unwrap_or_else(|| panic!("no type {name}"))
}

fn library_type(env: &mut LookupEnvironment, dotted: &str) -> TypeId {
    let compound = env.intern_dotted(dotted);
    env.get_type(&compound)
        .expect("lookup")
        .and_then(|binding| binding.as_type())
        .unwrap_or_else(|| panic!("no type {dotted}"))
}

fn field_names(env: &mut LookupEnvironment, ty: TypeId) -> Vec<String> {
    let mut names: Vec<String> = env
        .fields(ty)
        .expect("fields")
        .iter()
        .map(|field| env.resolve_atom(env.field(*field).name).to_string())
        .collect();
    names.sort();
    names
}

#[test]
fn test_metadata_properties_become_fields() {
    let (mut env, _, _) = environment();
    let window = library_type(&mut env, "Window");
    assert_eq!(field_names(&mut env, window), vec!["document", "opener", "prototype"]);

    let document = env.intern("document");
    let field = env.get_field(window, document).expect("lookup").expect("document field");
    let ty = env.field_type(field).expect("field type");
    assert_eq!(env.type_name(ty), "Document");

    let opener = env.intern("opener");
    let field = env.get_field(window, opener).expect("lookup").expect("opener field");
    let ty = env.field_type(field).expect("field type");
    assert!(env.is_missing_type(ty));
}

#[test]
fn test_metadata_constructors_allocate_the_type() {
    let (mut env, _, _) = environment();
    let window = library_type(&mut env, "Window");
    let constructor = env
        .get_exact_constructor(window, &[])
        .expect("lookup")
        .expect("declared constructor");
    assert!(env.method(constructor).is_constructor());
    assert_eq!(env.method(constructor).allocation_type, Some(window));

    let open = env.intern("open");
    let methods = env.get_methods(window, open).expect("methods");
    assert_eq!(methods.len(), 1);
    assert_eq!(env.method_return_type(methods[0]).expect("return type"), window);
}

#[test]
fn test_source_type_inherits_metadata_members() {
    let (mut env, unit, reporter) = environment();
    let page = named(&env, unit, "Page");
    let window = library_type(&mut env, "Window");
    assert!(reporter.is_empty(), "{:?}", reporter.codes());
    assert_eq!(env.superclass(page).expect("superclass"), Some(window));
    assert_eq!(field_names(&mut env, page), vec!["heading", "prototype"]);

    let document = env.intern("document");
    let inherited = env
        .get_field_in_hierarchy(page, document)
        .expect("lookup")
        .expect("inherited field");
    assert_eq!(env.field(inherited).declaring_class, window);
}

#[test]
fn test_binary_members_skip_initializers_and_synthetics() {
    let (mut env, unit, _) = environment();
    let panel = library_type(&mut env, "ui.Panel");
    let methods: Vec<String> = env
        .methods(panel)
        .expect("methods")
        .iter()
        .map(|method| env.resolve_atom(env.method(*method).selector).to_string())
        .collect();
    assert_eq!(methods, vec!["layout"]);
    assert_eq!(field_names(&mut env, panel), vec!["width"]);

    let frame = named(&env, unit, "Frame");
    let component = library_type(&mut env, "ui.Component");
    let chain = env.superclass_chain(frame).expect("chain");
    assert_eq!(chain, vec![panel, component, env.object_type()]);
    assert!(!env.has_hierarchy_problems(frame));
}

#[test]
fn test_binary_member_types_resolve_on_request() {
    let (mut env, _, _) = environment();
    let panel = library_type(&mut env, "ui.Panel");
    let slot = env.intern("Slot");
    let member = env.member_type(panel, slot).expect("lookup").expect("member type");
    assert_eq!(env.type_name(member), "ui.Panel$Slot");
    assert_eq!(env.reference(member).and_then(|binding| binding.enclosing_type), Some(panel));
}

#[test]
fn test_member_tables_are_shared_between_reads() {
    let (mut env, unit, _) = environment();
    let window = library_type(&mut env, "Window");
    let page = named(&env, unit, "Page");
    for ty in [window, page] {
        let first = env.fields(ty).expect("fields");
        let second = env.fields(ty).expect("fields");
        assert!(Arc::ptr_eq(&first, &second));
        let first = env.methods(ty).expect("methods");
        let second = env.methods(ty).expect("methods");
        assert!(Arc::ptr_eq(&first, &second));
    }
}

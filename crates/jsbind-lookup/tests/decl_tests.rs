use super::*;

#[test]
fn test_unit_decl_from_json() {
    let unit: CompilationUnitDecl = serde_json::from_str(
        r#"{
            "fileName": "lib/shapes.js",
            "package": "geo.shapes",
            "imports": [{ "name": "geo.util", "onDemand": true }],
            "types": [{
                "name": "Circle",
                "superclass": "Shape",
                "fields": [{ "name": "radius", "typeName": "double" }],
                "methods": [{ "name": "area", "returnType": "double" }]
            }]
        }"#,
    )
    .expect("valid unit");
    assert_eq!(unit.package_segments(), vec!["geo", "shapes"]);
    assert_eq!(unit.main_type_name(), "shapes");
    assert!(unit.imports[0].on_demand);
    let circle = &unit.types[0];
    assert!(circle.is_definition);
    assert_eq!(circle.superclass.as_deref(), Some("Shape"));
    assert!(circle.has_field_named("radius"));
    assert_eq!(circle.methods[0].selector(), Some("area"));
}

#[test]
fn test_constructor_selector() {
    assert_eq!(MethodDecl::constructor().selector(), Some("<init>"));
    assert_eq!(MethodDecl::new("f").selector(), Some("f"));
    assert_eq!(MethodDecl::default().selector(), None);
}

#[test]
fn test_default_package_has_no_segments() {
    let unit = CompilationUnitDecl::new("a.js");
    assert!(unit.package_segments().is_empty());
    assert_eq!(unit.main_type_name(), "a");
}

#[test]
fn test_modifier_keywords_deserialize() {
    let field: FieldDecl =
        serde_json::from_str(r#"{ "name": "count", "modifiers": ["static", "private"] }"#)
            .expect("valid field");
    assert_eq!(
        modifiers_from_keywords(&field.modifiers),
        Modifiers::STATIC | Modifiers::PRIVATE
    );
}

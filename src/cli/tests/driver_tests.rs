use clap::Parser;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use jsbind_common::LanguageLevel;
use jsbind_common::diagnostics::diagnostic_codes;

use super::args::CliArgs;
use super::driver::{load_unit, resolve_options, run};

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("failed to write fixture");
    path
}

fn args(extra: &[&str], units: &[&Path]) -> CliArgs {
    let mut argv: Vec<String> = vec!["jsbind".to_string()];
    argv.extend(extra.iter().map(|arg| (*arg).to_string()));
    argv.extend(units.iter().map(|unit| unit.display().to_string()));
    CliArgs::try_parse_from(argv).expect("arguments should parse")
}

const SHAPES: &str = r#"{
    "fileName": "shapes.js",
    "types": [
        { "name": "Shape", "methods": [{ "name": "area", "returnType": "double" }] },
        { "name": "Circle", "superclass": "Shape", "fields": [{ "name": "radius", "typeName": "double" }] }
    ]
}"#;

#[test]
fn completes_units_and_answers_lookups() {
    let dir = tempfile::tempdir().expect("tempdir");
    let shapes = write(&dir, "shapes.json", SHAPES);
    let args = args(&["--members", "-q", "Circle", "-q", "Circle.radius", "-q", "Nope"], &[&shapes]);

    let result = run(&args).expect("run should succeed");
    assert!(!result.has_errors(), "unexpected diagnostics: {:?}", result.diagnostics);
    assert_eq!(result.units.len(), 1);

    let unit = &result.units[0];
    assert_eq!(unit.file, "shapes.js");
    assert_eq!(unit.phase, "BuildFieldsAndMethods");
    assert!(unit.aborted.is_none());

    let circle = unit.types.iter().find(|ty| ty.name == "Circle").expect("Circle reported");
    assert_eq!(circle.superclass.as_deref(), Some("Shape"));
    assert!(!circle.hierarchy_problems);
    assert_eq!(circle.fields, vec!["prototype: any".to_string(), "radius: double".to_string()]);

    assert_eq!(result.lookups.len(), 3);
    assert!(result.lookups[0].valid);
    assert_eq!(result.lookups[0].binding, "type Circle");
    assert!(result.lookups[1].valid);
    assert_eq!(result.lookups[1].binding, "field Circle.radius: double");
    assert!(!result.lookups[2].valid);
    assert!(result.lookups[2].binding.starts_with("problem NotFound"));
}

#[test]
fn missing_superclass_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let unit = write(
        &dir,
        "orphan.json",
        r#"{ "fileName": "orphan.js", "types": [{ "name": "Orphan", "superclass": "Gone" }] }"#,
    );

    let result = run(&args(&[], &[&unit])).expect("run should succeed");
    assert!(result.has_errors());
    assert!(
        result
            .diagnostics
            .iter()
            .any(|diagnostic| diagnostic.code == diagnostic_codes::SUPERCLASS_NOT_FOUND)
    );
}

#[test]
fn invalid_unit_json_names_the_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let unit = write(&dir, "broken.json", "{ not json");

    let err = run(&args(&[], &[&unit])).expect_err("run should fail");
    let message = format!("{err:#}");
    assert!(message.contains("invalid compilation unit"), "message: {message}");
    assert!(message.contains("broken.json"), "message: {message}");
}

#[test]
fn missing_unit_file_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("nowhere.json");

    let err = run(&args(&[], &[&missing])).expect_err("run should fail");
    assert!(format!("{err:#}").contains("failed to read"));
}

#[test]
fn command_line_flags_override_the_options_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let options = write(
        &dir,
        "options.json",
        r#"{ "complianceLevel": "jdk1_3", "sourceLevel": "jdk1_3", "produceReferenceInfo": false }"#,
    );
    let unit = write(&dir, "shapes.json", SHAPES);
    let options_arg = options.display().to_string();

    let from_file = resolve_options(&args(&["-c", &options_arg], &[&unit])).expect("options");
    assert_eq!(from_file.compliance_level, LanguageLevel::Jdk1_3);
    assert_eq!(from_file.source_level, LanguageLevel::Jdk1_3);
    assert!(from_file.report_hierarchy_problems);

    let overridden = resolve_options(&args(
        &["-c", &options_arg, "--source", "1.5", "--referenceInfo", "--noHierarchyProblems"],
        &[&unit],
    ))
    .expect("options");
    assert_eq!(overridden.compliance_level, LanguageLevel::Jdk1_3);
    assert_eq!(overridden.source_level, LanguageLevel::Jdk1_5);
    assert!(overridden.produce_reference_info);
    assert!(!overridden.report_hierarchy_problems);
}

#[test]
fn unit_without_file_name_is_named_after_its_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write(&dir, "anonymous.json", r#"{ "types": [{ "name": "Thing" }] }"#);

    let decl = load_unit(&path).expect("unit should load");
    assert_eq!(decl.file_name, path.display().to_string());
    assert_eq!(decl.types.len(), 1);
}

#[test]
fn library_units_are_accepted_on_demand() {
    let dir = tempfile::tempdir().expect("tempdir");
    let library = write(
        &dir,
        "library.json",
        r#"{ "units": [{ "fileName": "widget.js", "types": [{ "name": "Widget" }] }] }"#,
    );
    let app = write(
        &dir,
        "app.json",
        r#"{ "fileName": "app.js", "types": [{ "name": "App", "superclass": "Widget" }] }"#,
    );
    let library_arg = library.display().to_string();

    let result = run(&args(&["-l", &library_arg], &[&app])).expect("run should succeed");
    assert!(!result.has_errors(), "unexpected diagnostics: {:?}", result.diagnostics);

    let files: Vec<&str> = result.units.iter().map(|unit| unit.file.as_str()).collect();
    assert!(files.contains(&"app.js"));
    assert!(files.contains(&"widget.js"));

    let app_unit = result.units.iter().find(|unit| unit.file == "app.js").expect("app unit");
    assert_eq!(app_unit.types[0].superclass.as_deref(), Some("Widget"));
}

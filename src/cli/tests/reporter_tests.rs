use super::driver::{LookupReport, RunResult, TypeReport, UnitReport};
use super::reporter::Reporter;
use jsbind_common::Diagnostic;
use jsbind_common::diagnostics::diagnostic_codes;

fn sample() -> RunResult {
    RunResult {
        units: vec![UnitReport {
            file: "shapes.js".to_string(),
            phase: "BuildFieldsAndMethods".to_string(),
            aborted: None,
            types: vec![TypeReport {
                name: "Circle".to_string(),
                superclass: Some("Shape".to_string()),
                hierarchy_problems: true,
                fields: vec!["radius: double".to_string()],
                methods: vec!["area()".to_string()],
            }],
        }],
        lookups: vec![LookupReport {
            query: "Circle".to_string(),
            binding: "type Circle".to_string(),
            valid: true,
        }],
        diagnostics: vec![Diagnostic::from_code(
            "shapes.js".to_string(),
            12,
            6,
            diagnostic_codes::SUPERCLASS_NOT_FOUND,
            &["Shape", "Base"],
        )],
    }
}

#[test]
fn renders_plain_text() {
    let text = Reporter::new(false).render(&sample());
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "shapes.js [BuildFieldsAndMethods]");
    assert_eq!(lines[1], "  type Circle extends Shape (inconsistent hierarchy)");
    assert_eq!(lines[2], "    field radius: double");
    assert_eq!(lines[3], "    method area()");
    assert_eq!(lines[4], "Circle -> type Circle");
    assert!(lines[5].starts_with("shapes.js:12 - error JB1503: "), "{}", lines[5]);
}

#[test]
fn diagnostics_without_a_file_name_the_environment() {
    let diagnostic = Diagnostic::from_code(String::new(), 0, 0, diagnostic_codes::UNIT_ABORTED, &["a.js", "x"]);
    let text = Reporter::new(false).format_diagnostic(&diagnostic);
    assert!(text.starts_with("<environment> - error JB1901"), "{text}");
}

#[test]
fn aborted_units_show_the_reason() {
    let mut result = sample();
    result.units[0].aborted = Some("resolution was cancelled by the problem reporter".to_string());
    let text = Reporter::new(false).render(&result);
    assert!(text.lines().next().is_some_and(|line| line.ends_with("aborted: resolution was cancelled by the problem reporter")));
}

use super::args::{CliArgs, Level, OutputFormat};
use clap::Parser;
use jsbind_common::LanguageLevel;
use std::path::PathBuf;

#[test]
fn parses_units_and_defaults() {
    let args = CliArgs::try_parse_from(["jsbind", "app.json", "lib.json"]).expect("args");
    assert_eq!(args.units, vec![PathBuf::from("app.json"), PathBuf::from("lib.json")]);
    assert!(args.library.is_none());
    assert!(args.compliance.is_none());
    assert_eq!(args.format, OutputFormat::Text);
    assert!(!args.members);
    assert!(args.pretty.is_none());
}

#[test]
fn requires_at_least_one_unit() {
    assert!(CliArgs::try_parse_from(["jsbind"]).is_err());
}

#[test]
fn parses_levels_and_queries() {
    let args = CliArgs::try_parse_from([
        "jsbind",
        "app.json",
        "--compliance",
        "1.3",
        "--source",
        "1.5",
        "-q",
        "geo.Point",
        "--lookup",
        "main",
        "--format",
        "json",
        "--reference-info",
    ])
    .expect("args");
    assert_eq!(args.compliance, Some(Level::Jdk1_3));
    assert_eq!(LanguageLevel::from(Level::Jdk1_5), LanguageLevel::Jdk1_5);
    assert_eq!(args.lookups, vec!["geo.Point".to_string(), "main".to_string()]);
    assert_eq!(args.format, OutputFormat::Json);
    assert!(args.reference_info);
}

#[test]
fn rejects_unknown_level() {
    assert!(CliArgs::try_parse_from(["jsbind", "app.json", "--compliance", "1.6"]).is_err());
}

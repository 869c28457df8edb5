use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use jsbind_common::LanguageLevel;

/// CLI arguments for the jsbind binary.
#[derive(Parser, Debug)]
#[command(
    name = "jsbind",
    version,
    about = "Resolve names and type hierarchies of inferred JavaScript compilation units"
)]
pub struct CliArgs {
    /// Compilation unit declaration files (JSON), accepted in order.
    #[arg(required = true)]
    pub units: Vec<PathBuf>,

    /// Library file (JSON) answering on-demand requests for binary types,
    /// metadata types and further compilation units.
    #[arg(short = 'l', long)]
    pub library: Option<PathBuf>,

    /// Compiler options file (JSON). Command-line flags override it.
    #[arg(short = 'c', long = "options")]
    pub options_file: Option<PathBuf>,

    // ==================== Language levels ====================
    /// Compliance level used for method and field lookup rules.
    #[arg(long, value_enum)]
    pub compliance: Option<Level>,

    /// Source level; below 1.5 autoboxing and varargs are ignored.
    #[arg(long = "source", value_enum)]
    pub source: Option<Level>,

    /// Record qualified, simple and type references per unit.
    #[arg(long = "referenceInfo", alias = "reference-info")]
    pub reference_info: bool,

    /// Do not report types whose hierarchy passes through a broken type.
    #[arg(long = "noHierarchyProblems", alias = "no-hierarchy-problems")]
    pub no_hierarchy_problems: bool,

    // ==================== Queries and output ====================
    /// Resolve a (possibly qualified) name from the first unit's scope,
    /// e.g. `geo.Point` or `Shape.area`. May be repeated.
    #[arg(short = 'q', long = "lookup")]
    pub lookups: Vec<String>,

    /// List the fields and methods of every source type.
    #[arg(long)]
    pub members: bool,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Colorize text output. Defaults to on when stdout is a terminal.
    #[arg(long)]
    pub pretty: Option<bool>,
}

/// Language level as written on the command line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Level {
    #[value(name = "1.3")]
    Jdk1_3,
    #[value(name = "1.4")]
    Jdk1_4,
    #[value(name = "1.5")]
    Jdk1_5,
}

impl From<Level> for LanguageLevel {
    fn from(level: Level) -> Self {
        match level {
            Level::Jdk1_3 => LanguageLevel::Jdk1_3,
            Level::Jdk1_4 => LanguageLevel::Jdk1_4,
            Level::Jdk1_5 => LanguageLevel::Jdk1_5,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

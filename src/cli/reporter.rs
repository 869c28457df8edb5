use colored::Colorize;

use jsbind_common::{Diagnostic, DiagnosticCategory};

use super::driver::{LookupReport, RunResult, TypeReport, UnitReport};

/// Renders a run as human-readable text.
pub struct Reporter {
    color: bool,
}

impl Reporter {
    pub fn new(color: bool) -> Self {
        Reporter { color }
    }

    pub fn render(&self, result: &RunResult) -> String {
        let mut out = String::new();
        for unit in &result.units {
            self.push_unit(&mut out, unit);
        }
        for lookup in &result.lookups {
            out.push_str(&self.format_lookup(lookup));
            out.push('\n');
        }
        for diagnostic in &result.diagnostics {
            out.push_str(&self.format_diagnostic(diagnostic));
            out.push('\n');
        }
        out
    }

    fn push_unit(&self, out: &mut String, unit: &UnitReport) {
        let header = format!("{} [{}]", unit.file, unit.phase);
        if self.color {
            out.push_str(&header.bold().to_string());
        } else {
            out.push_str(&header);
        }
        if let Some(reason) = &unit.aborted {
            out.push_str(" aborted: ");
            out.push_str(reason);
        }
        out.push('\n');
        for ty in &unit.types {
            self.push_type(out, ty);
        }
    }

    fn push_type(&self, out: &mut String, ty: &TypeReport) {
        out.push_str("  type ");
        out.push_str(&ty.name);
        if let Some(superclass) = &ty.superclass {
            out.push_str(" extends ");
            out.push_str(superclass);
        }
        if ty.hierarchy_problems {
            let marker = " (inconsistent hierarchy)";
            if self.color {
                out.push_str(&marker.yellow().to_string());
            } else {
                out.push_str(marker);
            }
        }
        out.push('\n');
        for field in &ty.fields {
            out.push_str("    field ");
            out.push_str(field);
            out.push('\n');
        }
        for method in &ty.methods {
            out.push_str("    method ");
            out.push_str(method);
            out.push('\n');
        }
    }

    pub fn format_lookup(&self, lookup: &LookupReport) -> String {
        let arrow = if self.color {
            if lookup.valid { "->".green().to_string() } else { "->".red().to_string() }
        } else {
            "->".to_string()
        };
        format!("{} {} {}", lookup.query, arrow, lookup.binding)
    }

    /// `file:offset - error JB1502: message`.
    pub fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        let location = if diagnostic.file.is_empty() {
            "<environment>".to_string()
        } else if diagnostic.length > 0 || diagnostic.start > 0 {
            format!("{}:{}", diagnostic.file, diagnostic.start)
        } else {
            diagnostic.file.clone()
        };
        format!(
            "{} - {} {}: {}",
            location,
            self.format_category(diagnostic.category),
            self.format_code(diagnostic.code),
            diagnostic.message_text
        )
    }

    fn format_category(&self, category: DiagnosticCategory) -> String {
        let label = match category {
            DiagnosticCategory::Error => "error",
            DiagnosticCategory::Warning => "warning",
            DiagnosticCategory::Suggestion => "suggestion",
            DiagnosticCategory::Message => "message",
        };

        if !self.color {
            return label.to_string();
        }

        match category {
            DiagnosticCategory::Error => label.red().bold().to_string(),
            DiagnosticCategory::Warning => label.yellow().bold().to_string(),
            DiagnosticCategory::Suggestion => label.blue().bold().to_string(),
            DiagnosticCategory::Message => label.cyan().bold().to_string(),
        }
    }

    fn format_code(&self, code: u32) -> String {
        let label = format!("JB{code}");
        if self.color {
            label.bright_blue().to_string()
        } else {
            label
        }
    }
}

//! Compiler options consulted during lookup.
//!
//! Options arrive as JSON (from a driver config file) or are built in code.
//! Missing keys take their defaults, so `{}` is a valid configuration.

use serde::{Deserialize, Serialize};

/// Language level used for compliance and source-level checks.
///
/// Ordered: later levels compare greater.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum LanguageLevel {
    Jdk1_3,
    #[default]
    Jdk1_4,
    Jdk1_5,
}

/// Options that change how names resolve.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompilerOptions {
    /// Compliance level. From 1.4 on, inherited methods with parameters
    /// equal to an already-found method are dropped during method lookup,
    /// fields found on any enclosing receiver win immediately, and local
    /// types are not visible across switch case blocks.
    pub compliance_level: LanguageLevel,
    /// Source level. Below 1.5, autoboxing and varargs are not considered
    /// by the compatibility ladder.
    pub source_level: LanguageLevel,
    /// Record qualified, simple and type references per unit.
    pub produce_reference_info: bool,
    /// Report an inconsistent-hierarchy problem for types whose superclass
    /// chain passes through a broken type.
    pub report_hierarchy_problems: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            compliance_level: LanguageLevel::Jdk1_4,
            source_level: LanguageLevel::Jdk1_5,
            produce_reference_info: false,
            report_hierarchy_problems: true,
        }
    }
}

impl CompilerOptions {
    /// Parse options from a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// True when autoboxing and varargs take part in overload resolution.
    #[inline]
    pub fn allows_boxing_and_varargs(&self) -> bool {
        self.source_level >= LanguageLevel::Jdk1_5
    }

    /// True when compliance is 1.4 or later.
    #[inline]
    pub fn is_compliant_1_4(&self) -> bool {
        self.compliance_level >= LanguageLevel::Jdk1_4
    }
}

#[cfg(test)]
#[path = "../tests/options_tests.rs"]
mod tests;

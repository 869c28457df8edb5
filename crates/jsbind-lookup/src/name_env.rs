//! The name environment: where types the engine has not seen come from.
//!
//! The environment asks by qualified name and gets back whatever the backing
//! store has: a compiled descriptor, the parsed units that declare the name,
//! an external metadata descriptor, a marker saying the name is a package,
//! or nothing. `InMemoryNameEnvironment` serves all of these from plain data
//! and is what tests and the command-line driver use.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use crate::binary::BinaryTypeDescriptor;
use crate::binding::BindingMask;
use crate::decl::CompilationUnitDecl;
use crate::metadata::MetadataTypeDescriptor;

/// Failure of the backing store itself (as opposed to "not found").
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameEnvironmentError {
    #[error("name environment could not supply {name}: {reason}")]
    Unavailable { name: String, reason: String },

    #[error("descriptor for {name} is corrupt: {reason}")]
    CorruptDescriptor { name: String, reason: String },
}

/// What the name environment knows about a name.
#[derive(Clone, Debug)]
pub enum NameAnswer {
    Binary(Arc<BinaryTypeDescriptor>),
    CompilationUnits(Vec<CompilationUnitDecl>),
    Metadata(Arc<MetadataTypeDescriptor>),
    /// The name denotes a package, not a type.
    Package,
}

/// Narrow request/response contract to the store behind the engine.
pub trait NameEnvironment {
    /// Find the type with the given compound name.
    fn find_type(
        &mut self,
        compound_name: &[&str],
    ) -> Result<Option<NameAnswer>, NameEnvironmentError>;

    /// Find units declaring a unit-level function or variable.
    fn find_binding(
        &mut self,
        name: &str,
        package: &[&str],
        mask: BindingMask,
    ) -> Result<Option<NameAnswer>, NameEnvironmentError>;

    fn is_package(&mut self, compound_name: &[&str]) -> bool;

    /// Called by `LookupEnvironment::reset`.
    fn cleanup(&mut self) {}
}

// =============================================================================
// In-memory implementation
// =============================================================================

#[derive(Clone, Copy, Debug)]
enum Entry {
    Unit(usize),
    Binary(usize),
    Metadata(usize),
}

/// A name environment backed by declaration data held in memory.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InMemoryNameEnvironment {
    pub units: Vec<CompilationUnitDecl>,
    pub binaries: Vec<BinaryTypeDescriptor>,
    pub metadata: Vec<MetadataTypeDescriptor>,
    /// Packages that exist even without types in them.
    pub packages: Vec<String>,
    /// Names whose lookup fails as if the store were unavailable.
    pub failing_names: Vec<String>,
    #[serde(skip)]
    index: Option<FxHashMap<String, Entry>>,
    #[serde(skip)]
    requests: Vec<String>,
}

impl InMemoryNameEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a name environment from JSON.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    #[must_use]
    pub fn with_unit(mut self, unit: CompilationUnitDecl) -> Self {
        self.units.push(unit);
        self.index = None;
        self
    }

    #[must_use]
    pub fn with_binary(mut self, descriptor: BinaryTypeDescriptor) -> Self {
        self.binaries.push(descriptor);
        self.index = None;
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, descriptor: MetadataTypeDescriptor) -> Self {
        self.metadata.push(descriptor);
        self.index = None;
        self
    }

    #[must_use]
    pub fn with_failing_name(mut self, name: impl Into<String>) -> Self {
        self.failing_names.push(name.into());
        self
    }

    /// Every type name asked for so far, in order.
    pub fn requests(&self) -> &[String] {
        &self.requests
    }

    fn index(&mut self) -> &FxHashMap<String, Entry> {
        if self.index.is_none() {
            let mut index = FxHashMap::default();
            for (i, unit) in self.units.iter().enumerate() {
                for ty in &unit.types {
                    let name = if unit.package.is_empty() {
                        ty.name.clone()
                    } else {
                        format!("{}.{}", unit.package, ty.name)
                    };
                    index.entry(name).or_insert(Entry::Unit(i));
                }
            }
            for (i, binary) in self.binaries.iter().enumerate() {
                index
                    .entry(binary.dotted_name())
                    .or_insert(Entry::Binary(i));
            }
            for (i, metadata) in self.metadata.iter().enumerate() {
                index
                    .entry(metadata.name.clone())
                    .or_insert(Entry::Metadata(i));
            }
            self.index = Some(index);
        }
        self.index.get_or_insert_with(FxHashMap::default)
    }

    fn declares_package(&self, dotted: &str) -> bool {
        let prefix = format!("{dotted}.");
        self.packages
            .iter()
            .any(|p| p == dotted || p.starts_with(&prefix))
            || self
                .units
                .iter()
                .any(|u| u.package == dotted || u.package.starts_with(&prefix))
            || self
                .binaries
                .iter()
                .any(|b| b.dotted_name().starts_with(&prefix))
            || self.metadata.iter().any(|m| m.name.starts_with(&prefix))
    }
}

impl NameEnvironment for InMemoryNameEnvironment {
    fn find_type(
        &mut self,
        compound_name: &[&str],
    ) -> Result<Option<NameAnswer>, NameEnvironmentError> {
        let dotted = compound_name.join(".");
        trace!(name = %dotted, "in-memory find_type");
        self.requests.push(dotted.clone());
        if self.failing_names.contains(&dotted) {
            return Err(NameEnvironmentError::Unavailable {
                name: dotted,
                reason: "backing store failure".to_string(),
            });
        }
        let entry = self.index().get(&dotted).copied();
        let answer = match entry {
            Some(Entry::Unit(i)) => Some(NameAnswer::CompilationUnits(vec![
                self.units[i].clone(),
            ])),
            Some(Entry::Binary(i)) => Some(NameAnswer::Binary(Arc::new(self.binaries[i].clone()))),
            Some(Entry::Metadata(i)) => {
                Some(NameAnswer::Metadata(Arc::new(self.metadata[i].clone())))
            }
            None if self.declares_package(&dotted) => Some(NameAnswer::Package),
            None => None,
        };
        Ok(answer)
    }

    fn find_binding(
        &mut self,
        name: &str,
        package: &[&str],
        mask: BindingMask,
    ) -> Result<Option<NameAnswer>, NameEnvironmentError> {
        let package = package.join(".");
        let units: Vec<CompilationUnitDecl> = self
            .units
            .iter()
            .filter(|unit| unit.package == package)
            .filter(|unit| {
                (mask.contains(BindingMask::METHOD)
                    && unit.functions.iter().any(|f| f.name.as_deref() == Some(name)))
                    || (mask.intersects(BindingMask::VARIABLE)
                        && unit.variables.iter().any(|v| v.name == name))
            })
            .cloned()
            .collect();
        if units.is_empty() {
            Ok(None)
        } else {
            Ok(Some(NameAnswer::CompilationUnits(units)))
        }
    }

    fn is_package(&mut self, compound_name: &[&str]) -> bool {
        let dotted = compound_name.join(".");
        self.declares_package(&dotted)
    }

    fn cleanup(&mut self) {
        self.requests.clear();
    }
}

#[cfg(test)]
#[path = "../tests/name_env_tests.rs"]
mod tests;

//! jsbind: lazy binding and name lookup for inferred JavaScript types.
//!
//! The engine lives in `jsbind-lookup`; shared types (interner,
//! diagnostics, options) in `jsbind-common`. This crate re-exports both and
//! adds the tracing setup and the `jsbind` command-line driver.

pub use jsbind_common as common;
pub use jsbind_lookup as lookup;

pub use jsbind_common::{CompilerOptions, Diagnostic, DiagnosticCategory, LanguageLevel};
pub use jsbind_lookup::{Binding, CollectingReporter, InMemoryNameEnvironment, LookupEnvironment};

#[cfg(feature = "cli")]
pub mod cli;

pub mod tracing_config;

//! Common types and utilities for the jsbind lookup engine.
//!
//! This crate provides foundational types used across all jsbind crates:
//! - String interning (`Atom`, `Interner`)
//! - Diagnostics (`Diagnostic`, `DiagnosticCategory`, message tables)
//! - Centralized limits and thresholds
//! - Compiler options (`CompilerOptions`, `LanguageLevel`)

// String interning for identifier deduplication
pub mod interner;
pub use interner::{Atom, Interner};

// Diagnostic types and message tables
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticCategory, format_message};

// Centralized limits and thresholds
pub mod limits;

// Compiler options shared by the environment and the driver
pub mod options;
pub use options::{CompilerOptions, LanguageLevel};

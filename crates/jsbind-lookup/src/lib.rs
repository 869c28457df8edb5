//! Lazy Binding and Name Lookup Engine
//!
//! The semantic core of a JavaScript frontend that treats inferred object
//! shapes as class-like types. It builds a lazily populated symbol table
//! from three sources:
//!
//! - **Source units**: compilation units with inferred types, functions and
//!   variables, completed through a phased pipeline
//! - **Binary types**: precompiled descriptors with qualified names
//! - **Metadata types**: library descriptions of host object models
//!
//! Every query answers a `Binding`; failures are `Binding::Problem` values
//! carrying the closest match. Members are built on first read, hierarchy
//! cycles are reported once and broken, and `AbortCompilation` unwinds only
//! the unit being completed.
mod class_scope;
mod linked;
mod pipeline;
mod scope_lookup;
mod scope_methods;
mod source;
mod type_queries;
mod unit_scope;
mod verifier;
mod visibility;

pub mod binary;
pub mod binding;
pub mod block_scope;
pub mod compat;
pub mod decl;
pub mod environment;
pub mod error;
pub mod ids;
pub mod members;
pub mod metadata;
pub mod modifiers;
pub mod name_env;
pub mod package;
pub mod problem;
pub mod scope;
pub mod symbols;
pub mod types;

pub use binary::{BinaryFieldDescriptor, BinaryMethodDescriptor, BinaryTypeDescriptor};
pub use binding::{Binding, BindingMask, ImportBinding, ProblemBinding, ProblemKind, ProblemReason};
pub use compat::CompatibilityLevel;
pub use decl::{
    CompilationUnitDecl, FieldDecl, ImportDecl, InferredTypeDecl, LocalDecl, MethodDecl, ParamDecl, Span,
};
pub use environment::{LookupEnvironment, Phase, UnitRecord};
pub use error::{AbortCompilation, LookupResult};
pub use ids::{FieldId, GroupId, LocalId, MethodId, PackageId, ScopeId, TypeId, UnitId};
pub use metadata::{MetadataMethod, MetadataParameter, MetadataProperty, MetadataTypeDescriptor};
pub use modifiers::{ModifierKeyword, Modifiers, TypeTags};
pub use name_env::{InMemoryNameEnvironment, NameAnswer, NameEnvironment, NameEnvironmentError};
pub use problem::{CollectingReporter, Problem, ProblemReporter, ReferenceContext};
pub use scope::InvocationSite;
pub use types::{BaseKind, Provenance, TypeData};

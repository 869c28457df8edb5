//! Fatal resolution failures.
//!
//! Ordinary lookup failures are `Binding::Problem` values. An
//! `AbortCompilation` means resolution cannot make forward progress for the
//! unit being completed; it unwinds to the batch driver, which isolates the
//! affected unit and carries on with the rest.

use thiserror::Error;

use crate::name_env::NameEnvironmentError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbortCompilation {
    #[error("no name environment is available to supply {0}")]
    NoNameEnvironment(String),

    #[error(transparent)]
    NameEnvironment(#[from] NameEnvironmentError),

    #[error("type request for {name} exceeded the reentrancy limit of {limit}")]
    ReentrantTypeRequest { name: String, limit: usize },

    #[error("resolution was cancelled by the problem reporter")]
    Cancelled,
}

/// Result of an operation that may have to ask the name environment.
pub type LookupResult<T> = Result<T, AbortCompilation>;

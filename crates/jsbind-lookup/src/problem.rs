//! Problem reporting sink.
//!
//! The engine never prints. Every diagnostic is handed to a
//! `ProblemReporter` together with the reference context (unit, type or
//! method) that was being resolved when the problem was found.

use std::sync::{Arc, Mutex, PoisonError};

use jsbind_common::Diagnostic;

use crate::ids::{MethodId, TypeId, UnitId};

/// What was being resolved when a problem was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReferenceContext {
    Unit(UnitId),
    Type(TypeId),
    Method(MethodId),
    /// Outside any unit (e.g. a binary type resolved on demand).
    Environment,
}

/// A reported diagnostic with its context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Problem {
    pub context: ReferenceContext,
    pub diagnostic: Diagnostic,
}

impl Problem {
    #[inline]
    pub fn code(&self) -> u32 {
        self.diagnostic.code
    }
}

/// Receives every diagnostic the engine produces.
pub trait ProblemReporter {
    fn report(&mut self, problem: Problem);

    /// A reporter may ask the engine to abandon the unit being resolved.
    fn is_cancelled(&self) -> bool {
        false
    }
}

#[derive(Debug, Default)]
struct Collected {
    problems: Vec<Problem>,
    cancel_on: Option<u32>,
    cancelled: bool,
}

/// Reporter that keeps every problem in memory.
///
/// Clones share the same storage, so a caller can keep a handle while the
/// environment owns the boxed reporter.
#[derive(Clone, Debug, Default)]
pub struct CollectingReporter {
    inner: Arc<Mutex<Collected>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel resolution once a problem with `code` is reported.
    #[must_use]
    pub fn cancel_on(self, code: u32) -> Self {
        self.with_inner(|inner| inner.cancel_on = Some(code));
        self
    }

    fn with_inner<R>(&self, f: impl FnOnce(&mut Collected) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn problems(&self) -> Vec<Problem> {
        self.with_inner(|inner| inner.problems.clone())
    }

    pub fn codes(&self) -> Vec<u32> {
        self.with_inner(|inner| inner.problems.iter().map(Problem::code).collect())
    }

    pub fn count(&self, code: u32) -> usize {
        self.with_inner(|inner| inner.problems.iter().filter(|p| p.code() == code).count())
    }

    pub fn len(&self) -> usize {
        self.with_inner(|inner| inner.problems.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.with_inner(|inner| {
            inner.problems.clear();
            inner.cancelled = false;
        });
    }
}

impl ProblemReporter for CollectingReporter {
    fn report(&mut self, problem: Problem) {
        self.with_inner(|inner| {
            if inner.cancel_on == Some(problem.code()) {
                inner.cancelled = true;
            }
            inner.problems.push(problem);
        });
    }

    fn is_cancelled(&self) -> bool {
        self.with_inner(|inner| inner.cancelled)
    }
}

#[cfg(test)]
#[path = "../tests/problem_tests.rs"]
mod tests;

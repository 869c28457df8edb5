//! The binding model: the answer to every symbol-table query.
//!
//! A `Binding` names one entry of the environment's arenas or is a
//! `Problem` that explains why a lookup failed. Problems carry the closest
//! match found on the way, so callers that only need "something" (tooling,
//! error recovery) can keep going.

use bitflags::bitflags;
use jsbind_common::Atom;
use smallvec::SmallVec;

use crate::ids::{FieldId, LocalId, MethodId, PackageId, TypeId, UnitId};

bitflags! {
    /// Categories a lookup is willing to accept.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct BindingMask: u32 {
        const FIELD = 1 << 0;
        const LOCAL = 1 << 1;
        const VARIABLE = Self::FIELD.bits() | Self::LOCAL.bits();
        const TYPE = 1 << 2;
        const PACKAGE = 1 << 3;
        const METHOD = 1 << 4;
        const COMPILATION_UNIT = 1 << 5;
    }
}

// =============================================================================
// Problems
// =============================================================================

/// Why a lookup failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProblemReason {
    NotFound,
    NotVisible,
    Ambiguous,
    /// A nested type was named by its binary (`Outer$Inner`) name.
    InternalNameProvided,
    /// A field found in an inherited type shadows the same name in an
    /// enclosing scope.
    InheritedNameHidesEnclosingName,
    NonStaticReferenceInConstructorInvocation,
    NonStaticReferenceInStaticContext,
    ReceiverTypeNotVisible,
    /// A local variable was called as a function.
    NotAFunction,
    HierarchyHasProblems,
}

/// What kind of entity the failed lookup was after.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProblemKind {
    Name,
    Type,
    Field,
    Method,
}

/// A failed lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProblemBinding {
    /// Name as far as resolution got. For compound names this is the prefix
    /// up to and including the segment that failed.
    pub name: Vec<Atom>,
    pub reason: ProblemReason,
    pub kind: ProblemKind,
    pub closest_match: Option<Binding>,
    /// Type that was searched, when the lookup had a receiver.
    pub searched_type: Option<TypeId>,
    /// Argument types of a failed method lookup.
    pub argument_types: SmallVec<[TypeId; 4]>,
}

impl ProblemBinding {
    pub fn new(name: Vec<Atom>, reason: ProblemReason, kind: ProblemKind) -> Self {
        Self {
            name,
            reason,
            kind,
            closest_match: None,
            searched_type: None,
            argument_types: SmallVec::new(),
        }
    }

    #[must_use]
    pub fn with_closest_match(mut self, closest: Binding) -> Self {
        self.closest_match = Some(closest);
        self
    }

    #[must_use]
    pub fn with_searched_type(mut self, searched: TypeId) -> Self {
        self.searched_type = Some(searched);
        self
    }

    #[must_use]
    pub fn with_arguments(mut self, arguments: &[TypeId]) -> Self {
        self.argument_types = SmallVec::from_slice(arguments);
        self
    }
}

// =============================================================================
// Imports
// =============================================================================

/// A resolved import declaration of a compilation unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportBinding {
    pub compound_name: Vec<Atom>,
    pub on_demand: bool,
    /// Imports a whole file rather than a type or package.
    pub is_file_import: bool,
    /// Package (on-demand) or type (single) the import names.
    pub resolved: Option<Binding>,
}

impl ImportBinding {
    /// Last segment of the imported name.
    pub fn simple_name(&self) -> Atom {
        self.compound_name.last().copied().unwrap_or(Atom::NONE)
    }
}

// =============================================================================
// Binding
// =============================================================================

/// Result of a symbol-table query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Binding {
    Package(PackageId),
    Type(TypeId),
    Field(FieldId),
    Method(MethodId),
    Variable(LocalId),
    Import(Box<ImportBinding>),
    CompilationUnit(UnitId),
    Problem(Box<ProblemBinding>),
}

impl Binding {
    pub fn problem(name: Vec<Atom>, reason: ProblemReason, kind: ProblemKind) -> Self {
        Binding::Problem(Box::new(ProblemBinding::new(name, reason, kind)))
    }

    /// Anything but a problem.
    #[inline]
    pub fn is_valid(&self) -> bool {
        !matches!(self, Binding::Problem(_))
    }

    /// Category of the binding. Problems report the category of their
    /// closest match, or the category their kind was searching for.
    pub fn mask(&self) -> BindingMask {
        match self {
            Binding::Package(_) => BindingMask::PACKAGE,
            Binding::Type(_) => BindingMask::TYPE,
            Binding::Field(_) => BindingMask::FIELD,
            Binding::Method(_) => BindingMask::METHOD,
            Binding::Variable(_) => BindingMask::LOCAL,
            Binding::Import(_) => BindingMask::empty(),
            Binding::CompilationUnit(_) => BindingMask::COMPILATION_UNIT,
            Binding::Problem(problem) => match &problem.closest_match {
                Some(closest) => closest.mask(),
                None => match problem.kind {
                    ProblemKind::Type => BindingMask::TYPE,
                    ProblemKind::Field => BindingMask::FIELD,
                    ProblemKind::Method => BindingMask::METHOD,
                    ProblemKind::Name => BindingMask::empty(),
                },
            },
        }
    }

    pub fn problem_reason(&self) -> Option<ProblemReason> {
        match self {
            Binding::Problem(problem) => Some(problem.reason),
            _ => None,
        }
    }

    pub fn as_problem(&self) -> Option<&ProblemBinding> {
        match self {
            Binding::Problem(problem) => Some(problem),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<TypeId> {
        match self {
            Binding::Type(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_field(&self) -> Option<FieldId> {
        match self {
            Binding::Field(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<MethodId> {
        match self {
            Binding::Method(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_local(&self) -> Option<LocalId> {
        match self {
            Binding::Variable(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_package(&self) -> Option<PackageId> {
        match self {
            Binding::Package(id) => Some(*id),
            _ => None,
        }
    }

    /// The closest match of a problem, or the binding itself.
    pub fn closest_match(&self) -> Option<&Binding> {
        match self {
            Binding::Problem(problem) => problem.closest_match.as_ref(),
            other => Some(other),
        }
    }
}


//! Field, method and local variable bindings.
//!
//! Member types start out as raw descriptors and are replaced in place by
//! the resolved `TypeId` the first time they are read through the
//! environment.

use jsbind_common::Atom;
use smallvec::SmallVec;

use crate::decl::Span;
use crate::ids::{ScopeId, TypeId};
use crate::modifiers::Modifiers;

/// A type that may still be an unparsed descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LazyType {
    /// Descriptor text (`int`, `Foo`, `a.b.Foo`, `Foo[]`). Names resolve
    /// through `scope` when present, otherwise through the environment.
    Raw {
        descriptor: Atom,
        scope: Option<ScopeId>,
    },
    Resolved(TypeId),
}

impl LazyType {
    pub const ANY: Self = LazyType::Resolved(TypeId::ANY);

    #[inline]
    pub fn resolved(self) -> Option<TypeId> {
        match self {
            LazyType::Resolved(id) => Some(id),
            LazyType::Raw { .. } => None,
        }
    }

    #[inline]
    pub fn is_resolved(self) -> bool {
        matches!(self, LazyType::Resolved(_))
    }
}

// =============================================================================
// FieldBinding
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldBinding {
    pub name: Atom,
    pub ty: LazyType,
    pub modifiers: Modifiers,
    /// Back-reference to the declaring type (not an owning reference).
    pub declaring_class: TypeId,
    pub span: Option<Span>,
}

impl FieldBinding {
    #[inline]
    pub fn is_static(&self) -> bool {
        self.modifiers.is_static()
    }
}

// =============================================================================
// MethodBinding
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MethodKind {
    Method,
    Constructor,
    /// Function declared in a block or at unit level.
    LocalFunction,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodBinding {
    pub selector: Atom,
    pub modifiers: Modifiers,
    pub parameters: SmallVec<[LazyType; 4]>,
    pub return_type: LazyType,
    pub declaring_class: TypeId,
    pub kind: MethodKind,
    /// Type a constructor call allocates.
    pub allocation_type: Option<TypeId>,
    pub span: Option<Span>,
}

impl MethodBinding {
    #[inline]
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    #[inline]
    pub fn is_constructor(&self) -> bool {
        self.kind == MethodKind::Constructor
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.modifiers.is_static()
    }

    #[inline]
    pub fn is_varargs(&self) -> bool {
        self.modifiers.contains(Modifiers::VARARGS)
    }

    /// Parameters and return type are all resolved.
    #[inline]
    pub fn is_resolved(&self) -> bool {
        !self.modifiers.contains(Modifiers::UNRESOLVED)
    }

    /// Resolved parameter types, `any` for parameters still raw.
    pub fn parameter_types(&self) -> SmallVec<[TypeId; 4]> {
        self.parameters
            .iter()
            .map(|param| param.resolved().unwrap_or(TypeId::ANY))
            .collect()
    }
}

// =============================================================================
// LocalVariableBinding
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalVariableBinding {
    pub name: Atom,
    pub ty: LazyType,
    pub modifiers: Modifiers,
    /// Scope the variable is declared in; `None` for synthetic locals.
    pub declaring_scope: Option<ScopeId>,
    pub is_argument: bool,
    /// Position within the declaring scope.
    pub index: u32,
    pub span: Option<Span>,
}

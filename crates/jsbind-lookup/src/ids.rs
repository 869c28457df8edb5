//! Arena identifiers for the lookup engine.
//!
//! Every binding lives in an arena owned by the `LookupEnvironment` and is
//! addressed by a `u32` index. Indices stay stable for the lifetime of the
//! environment, so a placeholder type can be turned into the resolved type by
//! rewriting its slot: every holder of the old `TypeId` sees the resolution
//! without re-lookup.

use serde::Serialize;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub struct $name(pub u32);

        impl $name {
            /// Index into the owning arena.
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub(crate) fn from_index(index: usize) -> Self {
                Self(u32::try_from(index).unwrap_or(u32::MAX))
            }
        }
    };
}

arena_id!(
    /// Field binding in the environment's field arena.
    FieldId
);
arena_id!(
    /// Method binding in the environment's method arena.
    MethodId
);
arena_id!(
    /// Local variable binding.
    LocalId
);
arena_id!(
    /// Package binding in the package trie.
    PackageId
);
arena_id!(
    /// Scope node in the scope tree.
    ScopeId
);
arena_id!(
    /// Accepted compilation unit.
    UnitId
);
arena_id!(
    /// Group of linked source types that denote one logical type.
    GroupId
);

// =============================================================================
// TypeId - Type Binding Identifier
// =============================================================================

/// Type binding identifier.
///
/// Base types occupy fixed ids below `FIRST_REFERENCE` and are created by
/// every fresh environment in the same order, so `TypeId::INT` means `int`
/// everywhere without a lookup.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(pub u32);

impl TypeId {
    pub const VOID: Self = Self(0);
    pub const BOOLEAN: Self = Self(1);
    pub const CHAR: Self = Self(2);
    pub const BYTE: Self = Self(3);
    pub const SHORT: Self = Self(4);
    pub const INT: Self = Self(5);
    pub const LONG: Self = Self(6);
    pub const FLOAT: Self = Self(7);
    pub const DOUBLE: Self = Self(8);
    pub const NULL: Self = Self(9);
    /// The unknown type. Compatible with everything in both directions.
    pub const ANY: Self = Self(10);

    /// First id handed out to non-base types.
    pub const FIRST_REFERENCE: u32 = 11;

    /// True for the fixed base types (including `null` and `any`).
    #[inline]
    pub const fn is_base(self) -> bool {
        self.0 < Self::FIRST_REFERENCE
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).unwrap_or(u32::MAX))
    }
}

#[cfg(test)]
#[path = "../tests/ids_tests.rs"]
mod tests;

//! Modifier and state bit-sets carried by bindings.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Declared and derived modifiers of types, fields, methods and locals.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u32 {
        const PUBLIC = 1 << 0;
        const PRIVATE = 1 << 1;
        const PROTECTED = 1 << 2;
        const STATIC = 1 << 3;
        const FINAL = 1 << 4;
        const ABSTRACT = 1 << 5;
        /// Last parameter accepts any number of arguments.
        const VARARGS = 1 << 6;
        const DEPRECATED = 1 << 7;
        /// Enclosed in a deprecated type.
        const IMPLICITLY_DEPRECATED = 1 << 8;
        /// Some part of the signature could not be resolved.
        const UNRESOLVED = 1 << 9;
        const DEFAULT_CONSTRUCTOR = 1 << 10;
        const BLANK_FINAL = 1 << 11;
        const OVERRIDING = 1 << 12;
        /// Compiler-generated member (never surfaced to lookups).
        const SYNTHETIC = 1 << 13;

        const ACCESS_MASK = Self::PUBLIC.bits() | Self::PRIVATE.bits() | Self::PROTECTED.bits();
    }
}

impl Modifiers {
    /// Keep a single access modifier: public wins over protected and private,
    /// protected wins over private.
    #[must_use]
    pub fn normalize_access(self) -> Self {
        let access = self & Self::ACCESS_MASK;
        let kept = if access.contains(Self::PUBLIC) {
            Self::PUBLIC
        } else if access.contains(Self::PROTECTED) {
            Self::PROTECTED
        } else {
            access
        };
        (self - Self::ACCESS_MASK) | kept
    }

    /// Functions default to public unless declared private or protected.
    #[must_use]
    pub fn with_default_public(self) -> Self {
        if self.intersects(Self::PRIVATE | Self::PROTECTED) {
            self.normalize_access()
        } else {
            self | Self::PUBLIC
        }
    }

    #[inline]
    pub const fn is_public(self) -> bool {
        self.contains(Self::PUBLIC)
    }

    #[inline]
    pub const fn is_private(self) -> bool {
        self.contains(Self::PRIVATE)
    }

    #[inline]
    pub const fn is_protected(self) -> bool {
        self.contains(Self::PROTECTED)
    }

    #[inline]
    pub const fn is_static(self) -> bool {
        self.contains(Self::STATIC)
    }

    /// Neither public, protected nor private.
    #[inline]
    pub const fn is_default_access(self) -> bool {
        !self.intersects(Self::ACCESS_MASK)
    }

    /// Ordinal used when comparing visibility of an override:
    /// private < default < protected < public.
    pub(crate) const fn visibility_rank(self) -> u8 {
        if self.contains(Self::PUBLIC) {
            3
        } else if self.contains(Self::PROTECTED) {
            2
        } else if self.contains(Self::PRIVATE) {
            0
        } else {
            1
        }
    }
}

bitflags! {
    /// Resolution state of a type binding.
    ///
    /// Bits only ever get set, except the transient hierarchy-check markers
    /// which bracket a single `connect_type_hierarchy` call.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TypeTags: u32 {
        /// The superclass chain passes through a broken or cyclic type.
        const HIERARCHY_HAS_PROBLEMS = 1 << 0;
        const BEGIN_HIERARCHY_CHECK = 1 << 1;
        const END_HIERARCHY_CHECK = 1 << 2;
        /// Superclass is still a raw name (binary/metadata provenance).
        const HAS_UNRESOLVED_SUPERCLASS = 1 << 3;
        /// Member types are still raw names (binary provenance).
        const HAS_UNRESOLVED_MEMBER_TYPES = 1 << 4;
        const HAS_NO_MEMBER_TYPES = 1 << 5;
        const IS_LOCAL_TYPE = 1 << 6;
        const IS_MEMBER_TYPE = 1 << 7;
        const IS_ANONYMOUS_TYPE = 1 << 8;
        const IS_OBJECT_LITERAL = 1 << 9;
        /// Proxy fabricated for a type nobody could supply.
        const IS_MISSING_TYPE = 1 << 10;
        /// Hierarchy is being connected right now.
        const HIERARCHY_BEING_CONNECTED = 1 << 11;
        /// Declaration merges with other declarations of the same name.
        const IS_INDEXED = 1 << 12;
        /// Hierarchy connection found this type on a superclass cycle.
        const HIERARCHY_CYCLE = 1 << 13;
    }
}

/// Modifier keyword as written in declaration input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKeyword {
    Public,
    Private,
    Protected,
    Static,
    Final,
    Abstract,
    Deprecated,
}

impl ModifierKeyword {
    pub const fn to_modifiers(self) -> Modifiers {
        match self {
            ModifierKeyword::Public => Modifiers::PUBLIC,
            ModifierKeyword::Private => Modifiers::PRIVATE,
            ModifierKeyword::Protected => Modifiers::PROTECTED,
            ModifierKeyword::Static => Modifiers::STATIC,
            ModifierKeyword::Final => Modifiers::FINAL,
            ModifierKeyword::Abstract => Modifiers::ABSTRACT,
            ModifierKeyword::Deprecated => Modifiers::DEPRECATED,
        }
    }
}

/// Fold a keyword list into a modifier set.
pub fn modifiers_from_keywords(keywords: &[ModifierKeyword]) -> Modifiers {
    keywords
        .iter()
        .fold(Modifiers::empty(), |acc, keyword| acc | keyword.to_modifiers())
}

#[cfg(test)]
#[path = "../tests/modifiers_tests.rs"]
mod tests;

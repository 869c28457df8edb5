//! Type bindings.
//!
//! Every type lives in the environment's type arena as a `TypeData`. Base
//! types and arrays are plain values; reference types carry a
//! `ReferenceBinding` whose `Provenance` says where its declaration data
//! comes from. The lazy-resolution logic matches on the provenance instead
//! of dispatching through per-provenance subclasses.

use std::sync::Arc;

use jsbind_common::Atom;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::binary::BinaryTypeDescriptor;
use crate::decl::InferredTypeDecl;
use crate::ids::{FieldId, GroupId, LocalId, MethodId, PackageId, ScopeId, TypeId, UnitId};
use crate::members::MemberTable;
use crate::metadata::MetadataTypeDescriptor;
use crate::modifiers::{Modifiers, TypeTags};

// =============================================================================
// Base types
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BaseKind {
    Void,
    Boolean,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Null,
    Any,
}

impl BaseKind {
    /// In `TypeId` order.
    pub const ALL: [BaseKind; 11] = [
        BaseKind::Void,
        BaseKind::Boolean,
        BaseKind::Char,
        BaseKind::Byte,
        BaseKind::Short,
        BaseKind::Int,
        BaseKind::Long,
        BaseKind::Float,
        BaseKind::Double,
        BaseKind::Null,
        BaseKind::Any,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            BaseKind::Void => "void",
            BaseKind::Boolean => "boolean",
            BaseKind::Char => "char",
            BaseKind::Byte => "byte",
            BaseKind::Short => "short",
            BaseKind::Int => "int",
            BaseKind::Long => "long",
            BaseKind::Float => "float",
            BaseKind::Double => "double",
            BaseKind::Null => "null",
            BaseKind::Any => "any",
        }
    }

    pub fn from_name(name: &str) -> Option<TypeId> {
        Self::ALL
            .iter()
            .position(|kind| kind.name() == name)
            .map(TypeId::from_index)
    }

    /// Name of the wrapper type autoboxing converts to.
    pub const fn wrapper_name(self) -> Option<&'static str> {
        match self {
            BaseKind::Boolean => Some("Boolean"),
            BaseKind::Char => Some("Character"),
            BaseKind::Byte => Some("Byte"),
            BaseKind::Short => Some("Short"),
            BaseKind::Int => Some("Integer"),
            BaseKind::Long => Some("Long"),
            BaseKind::Float => Some("Float"),
            BaseKind::Double => Some("Double"),
            BaseKind::Void | BaseKind::Null | BaseKind::Any => None,
        }
    }

    pub fn from_wrapper_name(name: &str) -> Option<BaseKind> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.wrapper_name() == Some(name))
    }

    /// Widening primitive conversion (`int` to `long`, `char` to `int`, ...).
    pub const fn widens_to(self, target: BaseKind) -> bool {
        use BaseKind::*;
        match (self, target) {
            (Byte, Short | Int | Long | Float | Double) => true,
            (Short, Int | Long | Float | Double) => true,
            (Char, Int | Long | Float | Double) => true,
            (Int, Long | Float | Double) => true,
            (Long, Float | Double) => true,
            (Float, Double) => true,
            _ => false,
        }
    }
}

// =============================================================================
// Provenance
// =============================================================================

/// Reentrancy markers for building a source type's members.
#[derive(Clone, Debug, Default)]
pub struct MemberBuildState {
    pub fields_built: bool,
    pub building_all: bool,
    pub built_all: bool,
    /// Selectors being built right now by a restricted build.
    pub building: SmallVec<[Atom; 2]>,
    /// Selectors already built by restricted builds.
    pub built: SmallVec<[Atom; 4]>,
}

impl MemberBuildState {
    pub fn clear_in_progress(&mut self) {
        self.building_all = false;
        self.building.clear();
    }
}

#[derive(Clone, Debug)]
pub struct SourceOrigin {
    pub unit: UnitId,
    pub class_scope: ScopeId,
    pub decl: Arc<InferredTypeDecl>,
    pub build: MemberBuildState,
    /// Method scope of each declared method, in declaration order.
    pub method_scopes: Vec<ScopeId>,
    /// Outer locals this local type captures as synthetic copies.
    pub captured_locals: Vec<LocalId>,
    /// Enclosing switch case for local types.
    pub enclosing_case: Option<u32>,
}

#[derive(Clone, Debug)]
pub struct BinaryOrigin {
    pub descriptor: Arc<BinaryTypeDescriptor>,
    /// Superclass name until first read of the super binding.
    pub raw_superclass: Option<Vec<Atom>>,
    /// Binary member type names (`Outer$Inner`) until first read.
    pub raw_member_types: Vec<Vec<Atom>>,
}

#[derive(Clone, Debug)]
pub struct MetadataOrigin {
    pub descriptor: Arc<MetadataTypeDescriptor>,
    pub raw_superclass: Option<Vec<Atom>>,
    pub fields_built: bool,
    pub methods_built: bool,
}

/// Where a reference type's declaration data comes from.
#[derive(Clone, Debug)]
pub enum Provenance {
    Source(Box<SourceOrigin>),
    /// The binding of a compilation unit: holds unit-level functions and
    /// extends the unit's global super type.
    Unit(UnitId),
    Binary(Box<BinaryOrigin>),
    Metadata(Box<MetadataOrigin>),
    /// Placeholder for a name nobody has been asked about yet.
    Unresolved,
    /// Proxy for a type nobody could supply.
    Missing,
    /// Environment-provided root types (`Object`, `Function`).
    Synthetic,
}

impl Provenance {
    pub fn as_source(&self) -> Option<&SourceOrigin> {
        match self {
            Provenance::Source(origin) => Some(origin),
            _ => None,
        }
    }

    pub fn as_source_mut(&mut self) -> Option<&mut SourceOrigin> {
        match self {
            Provenance::Source(origin) => Some(origin),
            _ => None,
        }
    }

    pub const fn kind_name(&self) -> &'static str {
        match self {
            Provenance::Source(_) => "source",
            Provenance::Unit(_) => "unit",
            Provenance::Binary(_) => "binary",
            Provenance::Metadata(_) => "metadata",
            Provenance::Unresolved => "unresolved",
            Provenance::Missing => "missing",
            Provenance::Synthetic => "synthetic",
        }
    }
}

// =============================================================================
// ReferenceBinding
// =============================================================================

#[derive(Clone, Debug)]
pub struct ReferenceBinding {
    pub compound_name: Vec<Atom>,
    pub source_name: Atom,
    pub file_name: Atom,
    pub package: PackageId,
    pub modifiers: Modifiers,
    pub tags: TypeTags,
    /// Super binding of this declaration only. Linked groups combine the
    /// supers of all members.
    pub superclass: Option<TypeId>,
    pub enclosing_type: Option<TypeId>,
    pub member_types: Vec<TypeId>,
    pub fields: MemberTable<FieldId>,
    pub methods: MemberTable<MethodId>,
    pub group: Option<GroupId>,
    pub provenance: Provenance,
    pub(crate) compatible_cache: FxHashMap<TypeId, bool>,
}

impl ReferenceBinding {
    pub fn new(
        compound_name: Vec<Atom>,
        package: PackageId,
        modifiers: Modifiers,
        provenance: Provenance,
    ) -> Self {
        let source_name = compound_name.last().copied().unwrap_or(Atom::NONE);
        Self {
            compound_name,
            source_name,
            file_name: Atom::NONE,
            package,
            modifiers,
            tags: TypeTags::empty(),
            superclass: None,
            enclosing_type: None,
            member_types: Vec::new(),
            fields: MemberTable::default(),
            methods: MemberTable::default(),
            group: None,
            provenance,
            compatible_cache: FxHashMap::default(),
        }
    }

    #[inline]
    pub fn has_hierarchy_problems(&self) -> bool {
        self.tags.contains(TypeTags::HIERARCHY_HAS_PROBLEMS)
    }

    #[inline]
    pub fn is_nested(&self) -> bool {
        self.enclosing_type.is_some()
    }

    #[inline]
    pub fn is_local(&self) -> bool {
        self.tags.contains(TypeTags::IS_LOCAL_TYPE)
    }

    #[inline]
    pub fn is_placeholder(&self) -> bool {
        matches!(self.provenance, Provenance::Unresolved)
    }

    #[inline]
    pub fn is_missing(&self) -> bool {
        matches!(self.provenance, Provenance::Missing)
    }

    #[inline]
    pub fn is_source(&self) -> bool {
        matches!(self.provenance, Provenance::Source(_) | Provenance::Unit(_))
    }

    #[inline]
    pub fn is_hierarchy_being_connected(&self) -> bool {
        self.tags.contains(TypeTags::HIERARCHY_BEING_CONNECTED)
    }
}

// =============================================================================
// TypeData
// =============================================================================

#[derive(Clone, Debug)]
pub enum TypeData {
    Base(BaseKind),
    Array { leaf: TypeId, dimensions: u8 },
    Reference(Box<ReferenceBinding>),
}

impl TypeData {
    pub fn as_reference(&self) -> Option<&ReferenceBinding> {
        match self {
            TypeData::Reference(binding) => Some(binding),
            _ => None,
        }
    }

    pub fn as_reference_mut(&mut self) -> Option<&mut ReferenceBinding> {
        match self {
            TypeData::Reference(binding) => Some(binding),
            _ => None,
        }
    }
}

/// Several declarations that denote one logical type.
#[derive(Clone, Debug, Default)]
pub struct TypeGroup {
    /// Members in link order.
    pub members: SmallVec<[TypeId; 4]>,
    /// Union of the members' complete field tables. Dropped when the group
    /// changes.
    pub(crate) fields: Option<Arc<[FieldId]>>,
    pub(crate) methods: Option<Arc<[MethodId]>>,
}

impl TypeGroup {
    pub(crate) fn new(members: &[TypeId]) -> Self {
        Self {
            members: SmallVec::from_slice(members),
            fields: None,
            methods: None,
        }
    }
}

#[cfg(test)]
#[path = "../tests/types_tests.rs"]
mod tests;

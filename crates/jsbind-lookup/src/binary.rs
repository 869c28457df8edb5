//! Compiled type descriptors and their bindings.
//!
//! A binary type is created in one step from its descriptor: the name,
//! modifiers and members are known up front, while the superclass, member
//! types and every member signature stay raw names until first read.
//! Static initializers and synthetic members never become bindings.

use std::sync::Arc;

use jsbind_common::Atom;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::debug;

use crate::environment::LookupEnvironment;
use crate::ids::TypeId;
use crate::members::MemberTable;
use crate::modifiers::{ModifierKeyword, Modifiers, TypeTags, modifiers_from_keywords};
use crate::symbols::{FieldBinding, LazyType, MethodBinding, MethodKind};
use crate::types::{BinaryOrigin, Provenance, ReferenceBinding};

/// Selector of static initializers.
pub const CLINIT: &str = "<clinit>";
/// Selector of constructors.
pub const INIT: &str = "<init>";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BinaryFieldDescriptor {
    pub name: String,
    pub type_name: Option<String>,
    pub modifiers: Vec<ModifierKeyword>,
    pub synthetic: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BinaryMethodDescriptor {
    /// `<init>` for constructors, `<clinit>` for static initializers.
    pub selector: String,
    pub parameter_types: Vec<String>,
    pub return_type: Option<String>,
    pub modifiers: Vec<ModifierKeyword>,
    pub varargs: bool,
    pub synthetic: bool,
}

/// A compiled type as the name environment hands it over.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BinaryTypeDescriptor {
    /// Slash separated binary name (`a/b/Outer$Inner`).
    pub name: String,
    pub modifiers: Vec<ModifierKeyword>,
    pub superclass: Option<String>,
    /// Binary names of the member types.
    pub member_types: Vec<String>,
    pub enclosing_type: Option<String>,
    pub fields: Vec<BinaryFieldDescriptor>,
    pub methods: Vec<BinaryMethodDescriptor>,
    pub file_name: Option<String>,
}

impl BinaryTypeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    #[must_use]
    pub fn with_field(mut self, name: &str, type_name: &str) -> Self {
        self.fields.push(BinaryFieldDescriptor {
            name: name.to_string(),
            type_name: Some(type_name.to_string()),
            ..BinaryFieldDescriptor::default()
        });
        self
    }

    #[must_use]
    pub fn with_method(mut self, method: BinaryMethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    #[must_use]
    pub fn with_member_type(mut self, binary_name: impl Into<String>) -> Self {
        self.member_types.push(binary_name.into());
        self
    }

    /// The binary name with `.` separators.
    pub fn dotted_name(&self) -> String {
        self.name.replace('/', ".")
    }
}

impl BinaryMethodDescriptor {
    pub fn new(selector: impl Into<String>, parameter_types: &[&str]) -> Self {
        Self {
            selector: selector.into(),
            parameter_types: parameter_types.iter().map(|ty| (*ty).to_string()).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn returns(mut self, return_type: impl Into<String>) -> Self {
        self.return_type = Some(return_type.into());
        self
    }

    #[must_use]
    pub fn with_modifier(mut self, modifier: ModifierKeyword) -> Self {
        self.modifiers.push(modifier);
        self
    }

    #[must_use]
    pub fn varargs(mut self) -> Self {
        self.varargs = true;
        self
    }

    #[must_use]
    pub fn synthetic(mut self) -> Self {
        self.synthetic = true;
        self
    }
}

/// Split a binary or dotted name into its segments.
pub(crate) fn split_binary_name(name: &str) -> impl Iterator<Item = &str> {
    name.split(['/', '.']).filter(|segment| !segment.is_empty())
}

/// Binary member descriptors name reference types with `/` separators;
/// descriptor resolution expects dotted names.
fn dotted_descriptor(descriptor: &str) -> String {
    descriptor.replace('/', ".")
}

/// Source name of a binary simple name: the part after the last `$`.
pub(crate) fn binary_source_name(simple: &str) -> &str {
    simple.rsplit('$').next().unwrap_or(simple)
}

impl LookupEnvironment {
    /// Create the binding for a compiled type. A type already known under
    /// the same name is returned unchanged; a placeholder for the name is
    /// filled in place.
    pub fn accept_binary(&mut self, descriptor: Arc<BinaryTypeDescriptor>) -> TypeId {
        let compound: Vec<Atom> = split_binary_name(&descriptor.name)
            .map(|segment| self.interner.intern(segment))
            .collect();
        let Some((&simple, package_name)) = compound.split_last() else {
            return TypeId::ANY;
        };
        let package = self.create_package(package_name);
        if let Some(existing) = self.packages[package.index()].get_type0(simple)
            && !self.is_placeholder(existing)
        {
            return existing;
        }

        let mut modifiers = modifiers_from_keywords(&descriptor.modifiers).normalize_access();
        if modifiers.is_default_access() && descriptor.enclosing_type.is_none() {
            modifiers |= Modifiers::PUBLIC;
        }
        let raw_superclass = descriptor.superclass.as_deref().map(|name| self.intern_binary_name(name));
        let raw_member_types: Vec<Vec<Atom>> = descriptor
            .member_types
            .iter()
            .map(|name| self.intern_binary_name(name))
            .collect();

        let mut binding = ReferenceBinding::new(
            compound.clone(),
            package,
            modifiers,
            Provenance::Binary(Box::new(BinaryOrigin {
                descriptor: Arc::clone(&descriptor),
                raw_superclass: raw_superclass.clone(),
                raw_member_types,
            })),
        );
        let simple_text = self.interner.resolve(simple).to_string();
        binding.source_name = self.interner.intern(binary_source_name(&simple_text));
        binding.file_name = self
            .interner
            .intern(descriptor.file_name.as_deref().unwrap_or(&descriptor.name));
        if raw_superclass.is_some() {
            binding.tags |= TypeTags::HAS_UNRESOLVED_SUPERCLASS;
        }
        if descriptor.member_types.is_empty() {
            binding.tags |= TypeTags::HAS_NO_MEMBER_TYPES;
        } else {
            binding.tags |= TypeTags::HAS_UNRESOLVED_MEMBER_TYPES;
        }
        if let Some(enclosing) = descriptor.enclosing_type.as_deref() {
            let enclosing = self.intern_binary_name(enclosing);
            binding.enclosing_type = Some(self.get_type_from_compound_name(&enclosing));
            binding.tags |= TypeTags::IS_MEMBER_TYPE;
        }

        let id = self.install_type(package, simple, binding).id();
        self.create_binary_members(id, &descriptor, modifiers);
        debug!(name = %descriptor.dotted_name(), "accepted binary type");
        id
    }

    fn intern_binary_name(&mut self, name: &str) -> Vec<Atom> {
        split_binary_name(name)
            .map(|segment| self.interner.intern(segment))
            .collect()
    }

    fn create_binary_members(
        &mut self,
        id: TypeId,
        descriptor: &BinaryTypeDescriptor,
        type_modifiers: Modifiers,
    ) {
        let deprecated = type_modifiers.contains(Modifiers::DEPRECATED);
        let allow_varargs = self.options.allows_boxing_and_varargs();

        let mut fields = Vec::with_capacity(descriptor.fields.len());
        for field in descriptor.fields.iter().filter(|field| !field.synthetic) {
            let mut modifiers = modifiers_from_keywords(&field.modifiers).with_default_public();
            if deprecated && !modifiers.contains(Modifiers::DEPRECATED) {
                modifiers |= Modifiers::IMPLICITLY_DEPRECATED;
            }
            let type_name = field.type_name.as_deref().map(dotted_descriptor);
            let binding = FieldBinding {
                name: self.interner.intern(&field.name),
                ty: self.lazy_type(type_name.as_deref(), None),
                modifiers,
                declaring_class: id,
                span: None,
            };
            fields.push(self.alloc_field(binding));
        }

        let mut methods = Vec::with_capacity(descriptor.methods.len());
        for method in descriptor
            .methods
            .iter()
            .filter(|method| !method.synthetic && method.selector != CLINIT)
        {
            let mut modifiers = modifiers_from_keywords(&method.modifiers).with_default_public();
            if method.varargs && allow_varargs {
                modifiers |= Modifiers::VARARGS;
            }
            if deprecated && !modifiers.contains(Modifiers::DEPRECATED) {
                modifiers |= Modifiers::IMPLICITLY_DEPRECATED;
            }
            let parameters: SmallVec<[LazyType; 4]> = method
                .parameter_types
                .iter()
                .map(|ty| self.lazy_type(Some(&dotted_descriptor(ty)), None))
                .collect();
            let return_name = method.return_type.as_deref().map(dotted_descriptor);
            let return_type = self.lazy_type(return_name.as_deref(), None);
            if !return_type.is_resolved() || parameters.iter().any(|param| !param.is_resolved()) {
                modifiers |= Modifiers::UNRESOLVED;
            }
            let is_constructor = method.selector == INIT;
            let binding = MethodBinding {
                selector: self.interner.intern(&method.selector),
                modifiers,
                parameters,
                return_type: if is_constructor {
                    LazyType::Resolved(TypeId::VOID)
                } else {
                    return_type
                },
                declaring_class: id,
                kind: if is_constructor {
                    MethodKind::Constructor
                } else {
                    MethodKind::Method
                },
                allocation_type: is_constructor.then_some(id),
                span: None,
            };
            methods.push(self.alloc_method(binding));
        }

        if let Some(binding) = self.reference_mut(id) {
            binding.fields = MemberTable::new(fields);
            binding.methods = MemberTable::new(methods);
        }
    }
}

#[cfg(test)]
#[path = "../tests/binary_tests.rs"]
mod tests;

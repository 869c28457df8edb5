//! The lazy member contract of type bindings.
//!
//! Superclasses, member types, fields and methods are produced on first
//! read. Whatever a type's provenance, a query first makes sure the
//! declaration data has been turned into bindings, then resolves exactly
//! the member signatures the caller is about to see. `fields` and
//! `methods` resolve everything and freeze the table; `get_field` and
//! `get_methods` only touch the named members.

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::sync::Arc;

use jsbind_common::{Atom, Interner};
use jsbind_common::limits::MAX_HIERARCHY_WALK;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tracing::trace;

use crate::binary::INIT;
use crate::binding::Binding;
use crate::environment::LookupEnvironment;
use crate::error::LookupResult;
use crate::ids::{FieldId, LocalId, MethodId, ScopeId, TypeId};
use crate::members::{binary_search_by_name, find_method_range};
use crate::modifiers::{Modifiers, TypeTags};
use crate::symbols::{LazyType, MethodBinding};
use crate::types::{BaseKind, Provenance, TypeData};

impl LookupEnvironment {
    // =========================================================================
    // Superclass
    // =========================================================================

    /// Superclass of `ty`. Source types connect their hierarchy first;
    /// binary and metadata types resolve their raw superclass name; linked
    /// source types answer the group's superclass.
    pub fn superclass(&mut self, ty: TypeId) -> LookupResult<Option<TypeId>> {
        let Some(TypeData::Reference(binding)) = self.types.get(ty.index()) else {
            return Ok(match self.types.get(ty.index()) {
                Some(TypeData::Array { .. }) => Some(self.object_type),
                _ => None,
            });
        };
        let tags = binding.tags;
        match &binding.provenance {
            Provenance::Source(_) => {
                if !tags.intersects(TypeTags::BEGIN_HIERARCHY_CHECK | TypeTags::END_HIERARCHY_CHECK) {
                    self.connect_type_hierarchy(ty)?;
                }
                Ok(self.group_superclass(ty))
            }
            Provenance::Unit(unit) => {
                let unit = *unit;
                self.build_super_type(unit)
            }
            Provenance::Binary(_) | Provenance::Metadata(_) => {
                if tags.contains(TypeTags::HAS_UNRESOLVED_SUPERCLASS) {
                    self.resolve_raw_superclass(ty)?;
                }
                Ok(self
                    .reference(ty)
                    .and_then(|binding| binding.superclass)
                    .or(Some(self.object_type)))
            }
            Provenance::Unresolved => {
                self.resolve_type(ty)?;
                if self.is_placeholder(ty) {
                    return Ok(Some(self.object_type));
                }
                self.superclass(ty)
            }
            Provenance::Missing | Provenance::Synthetic => Ok(binding.superclass),
        }
    }

    /// Turn the raw superclass name of a binary or metadata type into a
    /// binding. A super that is missing or has hierarchy problems passes
    /// the problem on to `ty`.
    fn resolve_raw_superclass(&mut self, ty: TypeId) -> LookupResult<()> {
        let raw = match self.reference(ty).map(|binding| &binding.provenance) {
            Some(Provenance::Binary(origin)) => origin.raw_superclass.clone(),
            Some(Provenance::Metadata(origin)) => origin.raw_superclass.clone(),
            _ => None,
        };
        if let Some(binding) = self.reference_mut(ty) {
            binding.tags -= TypeTags::HAS_UNRESOLVED_SUPERCLASS;
        }
        let Some(raw) = raw else {
            return Ok(());
        };
        let placeholder = self.get_type_from_compound_name(&raw);
        let resolved = match self.resolve_type(placeholder) {
            Ok(resolved) => resolved,
            Err(abort) => {
                if let Some(binding) = self.reference_mut(ty) {
                    binding.tags |= TypeTags::HAS_UNRESOLVED_SUPERCLASS;
                }
                return Err(abort);
            }
        };
        let superclass = if resolved == ty || self.reference(resolved).is_none() {
            self.object_type
        } else {
            resolved
        };
        if let Some(binding) = self.reference_mut(ty) {
            binding.superclass = Some(superclass);
        }
        trace!(ty = %self.type_name(ty), superclass = %self.type_name(superclass), "resolved raw superclass");

        let mut broken = self.is_missing_type(superclass) || superclass != resolved;
        if !broken {
            self.superclass(superclass)?;
            broken = self
                .reference(superclass)
                .is_some_and(|binding| binding.has_hierarchy_problems());
        }
        if broken && let Some(binding) = self.reference_mut(ty) {
            binding.tags |= TypeTags::HIERARCHY_HAS_PROBLEMS;
        }
        Ok(())
    }

    pub fn has_hierarchy_problems(&self, ty: TypeId) -> bool {
        self.reference(ty)
            .is_some_and(|binding| binding.has_hierarchy_problems())
    }

    // =========================================================================
    // Member building
    // =========================================================================

    /// Make sure the declaration data of `ty` has become bindings. Source
    /// methods may be built for one selector only.
    fn ensure_members_built(&mut self, ty: TypeId, fields: bool, selector: Option<Atom>) {
        let is_source = matches!(
            self.reference(ty).map(|binding| &binding.provenance),
            Some(Provenance::Source(_))
        );
        let is_metadata = matches!(
            self.reference(ty).map(|binding| &binding.provenance),
            Some(Provenance::Metadata(_))
        );
        match (is_source, is_metadata, fields) {
            (true, _, true) => self.build_source_fields(ty),
            (true, _, false) => self.build_source_methods(ty, selector),
            (_, true, true) => self.build_metadata_fields(ty),
            (_, true, false) => self.build_metadata_methods(ty),
            _ => {}
        }
    }

    fn sorted_own_fields(&mut self, ty: TypeId) -> LookupResult<Arc<[FieldId]>> {
        let ty = self.resolve_type(ty)?;
        self.ensure_members_built(ty, true, None);
        let fields = &self.fields;
        let interner = &self.interner;
        match self.types.get_mut(ty.index()) {
            Some(TypeData::Reference(binding)) => {
                binding.fields.sort_by(|a, b| {
                    interner
                        .resolve(fields[a.index()].name)
                        .cmp(interner.resolve(fields[b.index()].name))
                });
                Ok(Arc::clone(binding.fields.items()))
            }
            _ => Ok(Arc::from(Vec::new())),
        }
    }

    fn sorted_own_methods(&mut self, ty: TypeId, selector: Option<Atom>) -> LookupResult<Arc<[MethodId]>> {
        let ty = self.resolve_type(ty)?;
        self.ensure_members_built(ty, false, selector);
        let methods = &self.methods;
        let interner = &self.interner;
        match self.types.get_mut(ty.index()) {
            Some(TypeData::Reference(binding)) => {
                binding
                    .methods
                    .sort_by(|a, b| method_order(interner, &methods[a.index()], &methods[b.index()]));
                Ok(Arc::clone(binding.methods.items()))
            }
            _ => Ok(Arc::from(Vec::new())),
        }
    }

    /// Complete field table of this one declaration.
    pub(crate) fn own_fields(&mut self, ty: TypeId) -> LookupResult<Arc<[FieldId]>> {
        if let Some(binding) = self.reference(ty)
            && binding.fields.is_complete()
        {
            return Ok(Arc::clone(binding.fields.items()));
        }
        let items = self.sorted_own_fields(ty)?;
        for field in items.iter() {
            self.field_type(*field)?;
        }
        let ty = self.resolve_type(ty)?;
        Ok(match self.reference_mut(ty) {
            Some(binding) => binding.fields.complete(|_| true),
            None => items,
        })
    }

    /// Complete method table of this one declaration.
    pub(crate) fn own_methods(&mut self, ty: TypeId) -> LookupResult<Arc<[MethodId]>> {
        if let Some(binding) = self.reference(ty)
            && binding.methods.is_complete()
        {
            return Ok(Arc::clone(binding.methods.items()));
        }
        let items = self.sorted_own_methods(ty, None)?;
        for method in items.iter() {
            self.resolve_method_types(*method)?;
        }
        let ty = self.resolve_type(ty)?;
        Ok(match self.reference_mut(ty) {
            Some(binding) => binding.methods.complete(|_| true),
            None => items,
        })
    }

    // =========================================================================
    // Member queries
    // =========================================================================

    /// Every field of `ty` with resolved types, sorted by name. Repeated
    /// calls answer the same shared slice.
    pub fn fields(&mut self, ty: TypeId) -> LookupResult<Arc<[FieldId]>> {
        if self.reference(ty).is_none() {
            return Ok(Arc::from(Vec::new()));
        }
        self.group_fields(ty)
    }

    /// Every method of `ty` with resolved signatures, sorted by selector.
    pub fn methods(&mut self, ty: TypeId) -> LookupResult<Arc<[MethodId]>> {
        if self.reference(ty).is_none() {
            return Ok(Arc::from(Vec::new()));
        }
        self.group_methods(ty)
    }

    /// Fields of `ty` whose types resolve. Fields whose resolution aborts
    /// are left out instead of failing the whole query.
    pub fn available_fields(&mut self, ty: TypeId) -> Vec<FieldId> {
        let mut seen = FxHashSet::default();
        let mut available = Vec::new();
        for member in self.linked_types(ty) {
            let Ok(items) = self.sorted_own_fields(member) else {
                continue;
            };
            for field in items.iter() {
                if self.field_type(*field).is_ok() && seen.insert(self.fields[field.index()].name) {
                    available.push(*field);
                }
            }
        }
        available
    }

    /// Methods of `ty` whose signatures resolve.
    pub fn available_methods(&mut self, ty: TypeId) -> Vec<MethodId> {
        let mut available = Vec::new();
        for member in self.linked_types(ty) {
            let Ok(items) = self.sorted_own_methods(member, None) else {
                continue;
            };
            for method in items.iter() {
                if self.resolve_method_types(*method).is_ok() {
                    available.push(*method);
                }
            }
        }
        available
    }

    /// Field named `name` declared by `ty` (or a type linked with it). Only
    /// that field's type is resolved.
    pub fn get_field(&mut self, ty: TypeId, name: Atom) -> LookupResult<Option<FieldId>> {
        if self.reference(ty).is_none() {
            return Ok(None);
        }
        for member in self.linked_types(ty) {
            let items = self.sorted_own_fields(member)?;
            let found = binary_search_by_name(&items, self.interner.resolve(name), |field| {
                self.interner.resolve(self.fields[field.index()].name)
            })
            .map(|index| items[index]);
            if let Some(field) = found {
                self.field_type(field)?;
                return Ok(Some(field));
            }
        }
        Ok(None)
    }

    /// Methods named `selector` declared by `ty` (or a type linked with it).
    /// Only their signatures are resolved; source types build nothing but
    /// these methods.
    pub fn get_methods(&mut self, ty: TypeId, selector: Atom) -> LookupResult<SmallVec<[MethodId; 4]>> {
        let mut found: SmallVec<[MethodId; 4]> = SmallVec::new();
        if self.reference(ty).is_none() {
            return Ok(found);
        }
        for member in self.linked_types(ty) {
            let items = self.sorted_own_methods(member, Some(selector))?;
            let Some((low, high)) = find_method_range(&items, self.interner.resolve(selector), |method| {
                self.interner.resolve(self.methods[method.index()].selector)
            }) else {
                continue;
            };
            for method in &items[low..=high] {
                self.resolve_method_types(*method)?;
                let candidate = &self.methods[method.index()];
                let repeated = found
                    .iter()
                    .any(|known| self.methods[known.index()].parameters == candidate.parameters);
                if !repeated {
                    found.push(*method);
                }
            }
        }
        Ok(found)
    }

    /// Method with exactly these parameter types, searching `ty` and then
    /// its superclasses breadth first.
    pub fn get_exact_method(
        &mut self,
        ty: TypeId,
        selector: Atom,
        arguments: &[TypeId],
    ) -> LookupResult<Option<MethodId>> {
        let mut visited = FxHashSet::default();
        let mut queue = VecDeque::from([ty]);
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) || visited.len() > MAX_HIERARCHY_WALK {
                continue;
            }
            visited.extend(self.linked_types(current));
            for method in self.get_methods(current, selector)? {
                if self.methods[method.index()].parameter_types().as_slice() == arguments {
                    return Ok(Some(method));
                }
            }
            if let Some(superclass) = self.superclass(current)? {
                queue.push_back(superclass);
            }
        }
        Ok(None)
    }

    /// Constructor of `ty` itself with exactly these parameter types.
    pub fn get_exact_constructor(&mut self, ty: TypeId, arguments: &[TypeId]) -> LookupResult<Option<MethodId>> {
        let init = self.interner.intern(INIT);
        for method in self.get_methods(ty, init)? {
            if self.methods[method.index()].parameter_types().as_slice() == arguments {
                return Ok(Some(method));
            }
        }
        Ok(None)
    }

    /// Member types of `ty` and its linked types. Binary member type names
    /// resolve on first read.
    pub fn member_types(&mut self, ty: TypeId) -> LookupResult<SmallVec<[TypeId; 4]>> {
        let mut found = SmallVec::new();
        for member in self.linked_types(ty) {
            let unresolved = self
                .reference(member)
                .is_some_and(|binding| binding.tags.contains(TypeTags::HAS_UNRESOLVED_MEMBER_TYPES));
            if unresolved {
                self.resolve_raw_member_types(member)?;
            }
            if let Some(binding) = self.reference(member) {
                found.extend(binding.member_types.iter().copied());
            }
        }
        Ok(found)
    }

    fn resolve_raw_member_types(&mut self, ty: TypeId) -> LookupResult<()> {
        let raw = match self.reference(ty).map(|binding| &binding.provenance) {
            Some(Provenance::Binary(origin)) => origin.raw_member_types.clone(),
            _ => Vec::new(),
        };
        let mut resolved = Vec::with_capacity(raw.len());
        for name in &raw {
            let placeholder = self.get_type_from_compound_name(name);
            resolved.push(self.resolve_type(placeholder)?);
        }
        if let Some(binding) = self.reference_mut(ty) {
            binding.member_types = resolved;
            binding.tags -= TypeTags::HAS_UNRESOLVED_MEMBER_TYPES;
        }
        Ok(())
    }

    /// Member type of `ty` with source name `name`.
    pub fn member_type(&mut self, ty: TypeId, name: Atom) -> LookupResult<Option<TypeId>> {
        Ok(self
            .member_types(ty)?
            .into_iter()
            .find(|member| self.reference(*member).is_some_and(|binding| binding.source_name == name)))
    }

    /// First field named `name` on `ty` or one of its superclasses.
    pub fn get_field_in_hierarchy(&mut self, ty: TypeId, name: Atom) -> LookupResult<Option<FieldId>> {
        let mut visited = FxHashSet::default();
        let mut current = Some(ty);
        while let Some(candidate) = current {
            if !visited.insert(candidate) || visited.len() > MAX_HIERARCHY_WALK {
                break;
            }
            if let Some(field) = self.get_field(candidate, name)? {
                return Ok(Some(field));
            }
            current = self.superclass(candidate)?;
        }
        Ok(None)
    }

    // =========================================================================
    // Signature resolution
    // =========================================================================

    /// Resolve a lazy type descriptor: base names directly, reference names
    /// through the descriptor's scope (falling back to the environment), and
    /// one array dimension per trailing `[]`.
    pub fn resolve_lazy_type(&mut self, lazy: LazyType) -> LookupResult<TypeId> {
        match lazy {
            LazyType::Resolved(ty) => Ok(ty),
            LazyType::Raw { descriptor, scope } => self.resolve_descriptor(descriptor, scope),
        }
    }

    fn resolve_descriptor(&mut self, descriptor: Atom, scope: Option<ScopeId>) -> LookupResult<TypeId> {
        let text = self.resolve_atom(descriptor).to_string();
        let mut leaf_name = text.trim();
        let mut dimensions = 0u8;
        while let Some(stripped) = leaf_name.strip_suffix("[]") {
            leaf_name = stripped.trim_end();
            dimensions = dimensions.saturating_add(1);
        }
        let leaf = match BaseKind::from_name(leaf_name) {
            Some(base) => base,
            None => {
                let compound = self.interner.intern_dotted(leaf_name);
                let in_scope = match scope {
                    Some(scope) => {
                        let binding = self.get_type_compound(scope, &compound)?;
                        binding
                            .as_type()
                            .or_else(|| binding.closest_match().and_then(Binding::as_type))
                    }
                    None => None,
                };
                match in_scope {
                    Some(ty) => ty,
                    None => {
                        let placeholder = self.get_type_from_compound_name(&compound);
                        self.resolve_type(placeholder)?
                    }
                }
            }
        };
        Ok(self.create_array_type(leaf, dimensions))
    }

    /// Type of a field, resolved on first read.
    pub fn field_type(&mut self, field: FieldId) -> LookupResult<TypeId> {
        let lazy = self.fields[field.index()].ty;
        let ty = self.resolve_lazy_type(lazy)?;
        self.fields[field.index()].ty = LazyType::Resolved(ty);
        Ok(ty)
    }

    /// Type of a local, resolved on first read.
    pub fn local_type(&mut self, local: LocalId) -> LookupResult<TypeId> {
        let lazy = self.locals[local.index()].ty;
        let ty = self.resolve_lazy_type(lazy)?;
        self.locals[local.index()].ty = LazyType::Resolved(ty);
        Ok(ty)
    }

    /// Resolve every parameter and the return type of `method`.
    pub fn resolve_method_types(&mut self, method: MethodId) -> LookupResult<()> {
        if self.methods[method.index()].is_resolved() {
            return Ok(());
        }
        for index in 0..self.methods[method.index()].parameters.len() {
            let lazy = self.methods[method.index()].parameters[index];
            let ty = self.resolve_lazy_type(lazy)?;
            self.methods[method.index()].parameters[index] = LazyType::Resolved(ty);
        }
        let lazy = self.methods[method.index()].return_type;
        let ty = self.resolve_lazy_type(lazy)?;
        let binding = &mut self.methods[method.index()];
        binding.return_type = LazyType::Resolved(ty);
        binding.modifiers -= Modifiers::UNRESOLVED;
        Ok(())
    }

    pub fn method_parameter_types(&mut self, method: MethodId) -> LookupResult<SmallVec<[TypeId; 4]>> {
        self.resolve_method_types(method)?;
        Ok(self.methods[method.index()].parameter_types())
    }

    pub fn method_return_type(&mut self, method: MethodId) -> LookupResult<TypeId> {
        self.resolve_method_types(method)?;
        Ok(self.methods[method.index()]
            .return_type
            .resolved()
            .unwrap_or(TypeId::ANY))
    }
}

/// Methods sort by selector text, then by arity.
pub(crate) fn method_order(interner: &Interner, a: &MethodBinding, b: &MethodBinding) -> Ordering {
    interner
        .resolve(a.selector)
        .cmp(interner.resolve(b.selector))
        .then_with(|| a.parameters.len().cmp(&b.parameters.len()))
}

#[cfg(test)]
#[path = "../tests/type_queries_tests.rs"]
mod tests;

//! Linked type groups.
//!
//! Several source declarations may denote one logical type: a constructor
//! function split across files, or a prototype extended after the fact.
//! Each such declaration keeps its own binding, and all of them share a
//! group. Member queries against any one of them answer the union of the
//! group, and the group's superclass is the first member super that is not
//! the root object type.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use smallvec::{SmallVec, smallvec};
use tracing::debug;

use crate::environment::LookupEnvironment;
use crate::error::LookupResult;
use crate::ids::{FieldId, GroupId, MethodId, TypeId};
use crate::type_queries::method_order;
use crate::types::TypeGroup;

impl LookupEnvironment {
    /// Put `ty` and `other` (with everything already linked to either) in
    /// one group. Cached member unions of the group are dropped.
    pub fn add_linked_binding(&mut self, ty: TypeId, other: TypeId) {
        if ty == other || self.is_linked_with(ty, other) {
            return;
        }
        let first = self.reference(ty).and_then(|binding| binding.group);
        let second = self.reference(other).and_then(|binding| binding.group);
        let group = match (first, second) {
            (None, None) => self.alloc_group(TypeGroup::new(&[ty, other])),
            (Some(group), None) => {
                self.groups[group.index()].members.push(other);
                group
            }
            (None, Some(group)) => {
                self.groups[group.index()].members.insert(0, ty);
                group
            }
            (Some(group), Some(absorbed)) => {
                let moved = std::mem::take(&mut self.groups[absorbed.index()].members);
                self.groups[group.index()].members.extend(moved);
                group
            }
        };
        self.invalidate_group(group);
        let members = self.groups[group.index()].members.clone();
        for member in members {
            if let Some(binding) = self.reference_mut(member) {
                binding.group = Some(group);
                binding.compatible_cache.clear();
            }
        }
        debug!(ty = %self.type_name(ty), group = group.0, "linked type bindings");
    }

    fn invalidate_group(&mut self, group: GroupId) {
        let group = &mut self.groups[group.index()];
        group.fields = None;
        group.methods = None;
    }

    /// Every binding linked with `ty`, in link order; just `ty` when it is
    /// not linked.
    pub fn linked_types(&self, ty: TypeId) -> SmallVec<[TypeId; 4]> {
        match self.reference(ty).and_then(|binding| binding.group) {
            Some(group) => self.groups[group.index()].members.clone(),
            None => smallvec![ty],
        }
    }

    pub fn is_linked_with(&self, ty: TypeId, other: TypeId) -> bool {
        let group = self.reference(ty).and_then(|binding| binding.group);
        group.is_some() && group == self.reference(other).and_then(|binding| binding.group)
    }

    /// Run `action` on every linked binding of `ty` until it answers
    /// `false`. Returns whether every member was visited.
    pub fn perform_action_on_linked_bindings(
        &mut self,
        ty: TypeId,
        mut action: impl FnMut(&mut Self, TypeId) -> bool,
    ) -> bool {
        for member in self.linked_types(ty) {
            if !action(self, member) {
                return false;
            }
        }
        true
    }

    /// Superclass of the group: the first member super other than the
    /// root, else the first super at all.
    pub(crate) fn group_superclass(&self, ty: TypeId) -> Option<TypeId> {
        let supers: SmallVec<[TypeId; 4]> = self
            .linked_types(ty)
            .iter()
            .filter_map(|member| self.reference(*member).and_then(|binding| binding.superclass))
            .collect();
        supers
            .iter()
            .copied()
            .find(|sup| *sup != self.object_type && !self.is_linked_with(ty, *sup))
            .or_else(|| supers.first().copied())
    }

    /// Union of the members' field tables. The first declaration of a name
    /// wins.
    pub(crate) fn group_fields(&mut self, ty: TypeId) -> LookupResult<Arc<[FieldId]>> {
        let Some(group) = self.reference(ty).and_then(|binding| binding.group) else {
            return self.own_fields(ty);
        };
        if let Some(cached) = &self.groups[group.index()].fields {
            return Ok(Arc::clone(cached));
        }
        let mut seen = FxHashSet::default();
        let mut union = Vec::new();
        for member in self.groups[group.index()].members.clone() {
            for field in self.own_fields(member)?.iter() {
                if seen.insert(self.fields[field.index()].name) {
                    union.push(*field);
                }
            }
        }
        union.sort_by(|a, b| {
            self.interner
                .resolve(self.fields[a.index()].name)
                .cmp(self.interner.resolve(self.fields[b.index()].name))
        });
        let union: Arc<[FieldId]> = union.into();
        self.groups[group.index()].fields = Some(Arc::clone(&union));
        Ok(union)
    }

    /// Union of the members' method tables. A method whose selector and
    /// parameters repeat an earlier member's is left out.
    pub(crate) fn group_methods(&mut self, ty: TypeId) -> LookupResult<Arc<[MethodId]>> {
        let Some(group) = self.reference(ty).and_then(|binding| binding.group) else {
            return self.own_methods(ty);
        };
        if let Some(cached) = &self.groups[group.index()].methods {
            return Ok(Arc::clone(cached));
        }
        let mut union: Vec<MethodId> = Vec::new();
        for member in self.groups[group.index()].members.clone() {
            for method in self.own_methods(member)?.iter() {
                let candidate = &self.methods[method.index()];
                let repeated = union.iter().any(|known| {
                    let known = &self.methods[known.index()];
                    known.selector == candidate.selector && known.parameters == candidate.parameters
                });
                if !repeated {
                    union.push(*method);
                }
            }
        }
        union.sort_by(|a, b| method_order(&self.interner, &self.methods[a.index()], &self.methods[b.index()]));
        let union: Arc<[MethodId]> = union.into();
        self.groups[group.index()].methods = Some(Arc::clone(&union));
        Ok(union)
    }
}

#[cfg(test)]
#[path = "../tests/linked_tests.rs"]
mod tests;

//! Member building for source types.
//!
//! Fields are built in one go the first time any field is read. Methods can
//! be built for a single selector, so a lookup of `foo` on a large source
//! type only creates the `foo` overloads; the rest follow when someone asks
//! for all methods. Duplicates are reported at every declaration site and
//! dropped, so a lookup never sees either copy.

use std::sync::Arc;

use jsbind_common::Atom;
use jsbind_common::diagnostics::diagnostic_codes;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use tracing::{debug_span, trace};

use crate::decl::MethodDecl;
use crate::environment::LookupEnvironment;
use crate::error::LookupResult;
use crate::ids::{FieldId, MethodId, ScopeId, TypeId, UnitId};
use crate::metadata::PROTOTYPE;
use crate::modifiers::{Modifiers, modifiers_from_keywords};
use crate::problem::ReferenceContext;
use crate::symbols::{FieldBinding, LazyType, MethodBinding, MethodKind};

/// Comparable form of a parameter, resolved or not.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ParameterKey {
    Resolved(TypeId),
    Raw(Atom),
}

impl From<LazyType> for ParameterKey {
    fn from(lazy: LazyType) -> Self {
        match lazy {
            LazyType::Resolved(ty) => ParameterKey::Resolved(ty),
            LazyType::Raw { descriptor, .. } => ParameterKey::Raw(descriptor),
        }
    }
}

impl LookupEnvironment {
    // =========================================================================
    // Function bindings
    // =========================================================================

    /// Create the binding of a declared function and attach it to its
    /// scope. Parameter types resolve through `scope` when first read; a
    /// trailing varargs parameter is typed as an array of its element type.
    pub(crate) fn create_function_binding(
        &mut self,
        decl: &MethodDecl,
        declaring_class: TypeId,
        kind: MethodKind,
        scope: ScopeId,
    ) -> MethodId {
        let selector = self.interner.intern(decl.selector().unwrap_or_default());
        let kind = if decl.is_constructor {
            MethodKind::Constructor
        } else {
            kind
        };
        let mut modifiers = modifiers_from_keywords(&decl.modifiers).with_default_public();
        let allow_varargs = self.options.allows_boxing_and_varargs();
        let last = decl.parameters.len().saturating_sub(1);

        let mut parameters: SmallVec<[LazyType; 4]> = SmallVec::with_capacity(decl.parameters.len());
        for (index, param) in decl.parameters.iter().enumerate() {
            if param.varargs && index == last && allow_varargs {
                modifiers |= Modifiers::VARARGS;
                let element = param.type_name.as_deref().unwrap_or("any");
                parameters.push(self.lazy_type(Some(&format!("{element}[]")), Some(scope)));
            } else {
                parameters.push(self.lazy_type(param.type_name.as_deref(), Some(scope)));
            }
        }
        let return_type = if kind == MethodKind::Constructor {
            LazyType::Resolved(TypeId::VOID)
        } else {
            self.lazy_type(decl.return_type.as_deref(), Some(scope))
        };
        if !return_type.is_resolved() || parameters.iter().any(|param| !param.is_resolved()) {
            modifiers |= Modifiers::UNRESOLVED;
        }

        let method = self.alloc_method(MethodBinding {
            selector,
            modifiers,
            parameters,
            return_type,
            declaring_class,
            kind,
            allocation_type: (kind == MethodKind::Constructor).then_some(declaring_class),
            span: Some(decl.span),
        });
        self.method_scopes.insert(method, scope);
        if let Some(method_scope) = self.scope_mut(scope).as_method_mut() {
            method_scope.method = Some(method);
            method_scope.is_static |= modifiers.is_static();
        }
        method
    }

    // =========================================================================
    // Fields
    // =========================================================================

    /// Build the field bindings of a source type. Every source type gets a
    /// `prototype` field unless it declares one itself.
    pub(crate) fn build_source_fields(&mut self, ty: TypeId) {
        let Some(binding) = self.reference_mut(ty) else {
            return;
        };
        let type_modifiers = binding.modifiers;
        let Some(origin) = binding.provenance.as_source_mut() else {
            return;
        };
        if origin.build.fields_built {
            return;
        }
        origin.build.fields_built = true;
        let decl = Arc::clone(&origin.decl);
        let class_scope = origin.class_scope;
        trace!(ty = %self.type_name(ty), "building source fields");

        let mut first_by_name: FxHashMap<Atom, FieldId> = FxHashMap::default();
        let mut duplicates: FxHashSet<Atom> = FxHashSet::default();
        let mut fields: Vec<FieldId> = Vec::with_capacity(decl.fields.len() + 1);
        for field in &decl.fields {
            let name = self.interner.intern(&field.name);
            let binding = FieldBinding {
                name,
                ty: self.lazy_type(field.type_name.as_deref(), Some(class_scope)),
                modifiers: modifiers_from_keywords(&field.modifiers).with_default_public(),
                declaring_class: ty,
                span: Some(field.span),
            };
            let id = self.alloc_field(binding);
            match first_by_name.get(&name) {
                Some(first) => {
                    if duplicates.insert(name) {
                        self.report_duplicate_field(ty, *first);
                    }
                    self.report_duplicate_field(ty, id);
                }
                None => {
                    first_by_name.insert(name, id);
                }
            }
            fields.push(id);
        }
        if !duplicates.is_empty() {
            fields.retain(|field| !duplicates.contains(&self.fields[field.index()].name));
        }
        if !decl.has_field_named(PROTOTYPE) {
            let prototype = FieldBinding {
                name: self.interner.intern(PROTOTYPE),
                ty: LazyType::ANY,
                modifiers: type_modifiers & (Modifiers::ACCESS_MASK | Modifiers::STATIC),
                declaring_class: ty,
                span: None,
            };
            fields.push(self.alloc_field(prototype));
        }
        if let Some(binding) = self.reference_mut(ty) {
            binding.fields.replace(fields, false);
        }
    }

    fn report_duplicate_field(&mut self, ty: TypeId, field: FieldId) {
        let binding = &self.fields[field.index()];
        let span = binding.span;
        let args = [self.type_name(ty), self.resolve_atom(binding.name).to_string()];
        self.report(ReferenceContext::Type(ty), diagnostic_codes::DUPLICATE_FIELD, span, &args);
    }

    // =========================================================================
    // Methods
    // =========================================================================

    /// Build the method bindings of a source type: only the overloads of
    /// `selector` when given, else every method not built yet. Reentrant
    /// calls for a selector (or a full build) already under way return
    /// immediately.
    pub(crate) fn build_source_methods(&mut self, ty: TypeId, selector: Option<Atom>) {
        let Some(origin) = self
            .reference_mut(ty)
            .and_then(|binding| binding.provenance.as_source_mut())
        else {
            return;
        };
        let state = &mut origin.build;
        if state.built_all || state.building_all {
            return;
        }
        match selector {
            Some(selector) => {
                if state.built.contains(&selector) || state.building.contains(&selector) {
                    return;
                }
                state.building.push(selector);
            }
            None => state.building_all = true,
        }
        let already_built = state.built.clone();
        let decl = Arc::clone(&origin.decl);
        let method_scopes = origin.method_scopes.clone();
        trace!(ty = %self.type_name(ty), selector = ?selector.map(|s| self.resolve_atom(s).to_string()), "building source methods");

        let mut created: Vec<MethodId> = Vec::new();
        for (index, method) in decl.methods.iter().enumerate() {
            let Some(name) = method.selector() else {
                continue;
            };
            let name = self.interner.intern(name);
            let wanted = match selector {
                Some(selector) => name == selector,
                None => !already_built.contains(&name),
            };
            if !wanted {
                continue;
            }
            let Some(scope) = method_scopes.get(index).copied() else {
                continue;
            };
            created.push(self.create_function_binding(method, ty, MethodKind::Method, scope));
        }
        let kept = self.drop_duplicate_methods(ty, created);

        let Some(binding) = self.reference_mut(ty) else {
            return;
        };
        binding.methods.extend(&kept);
        if let Some(origin) = binding.provenance.as_source_mut() {
            let state = &mut origin.build;
            match selector {
                Some(selector) => {
                    state.building.retain(|building| *building != selector);
                    state.built.push(selector);
                }
                None => {
                    state.building_all = false;
                    state.built_all = true;
                }
            }
        }
    }

    /// Remove every method whose selector and parameters repeat another
    /// method in `created`, reporting each copy.
    fn drop_duplicate_methods(&mut self, ty: TypeId, created: Vec<MethodId>) -> Vec<MethodId> {
        let keys: Vec<(Atom, SmallVec<[ParameterKey; 4]>)> = created
            .iter()
            .map(|method| {
                let binding = &self.methods[method.index()];
                (
                    binding.selector,
                    binding.parameters.iter().copied().map(ParameterKey::from).collect(),
                )
            })
            .collect();
        let duplicated: Vec<bool> = (0..keys.len())
            .map(|i| (0..keys.len()).any(|j| i != j && keys[i] == keys[j]))
            .collect();
        if !duplicated.contains(&true) {
            return created;
        }
        let mut kept = Vec::with_capacity(created.len());
        for (method, duplicate) in created.into_iter().zip(duplicated) {
            if duplicate {
                let span = self.methods[method.index()].span;
                let args = [self.method_name(method), self.type_name(ty)];
                self.report(ReferenceContext::Type(ty), diagnostic_codes::DUPLICATE_METHOD, span, &args);
                self.method_scopes.remove(&method);
            } else {
                kept.push(method);
            }
        }
        kept
    }

    // =========================================================================
    // Phase 4
    // =========================================================================

    /// Build and resolve every field and method of the unit's types, and
    /// the signatures of its unit-level functions and variables.
    pub(crate) fn build_unit_fields_and_methods(&mut self, unit: UnitId) -> LookupResult<()> {
        let record = &self.units[unit.index()];
        let _span = debug_span!("build_fields_and_methods", file = %record.decl.file_name).entered();
        let types = record.types.clone();
        let unit_type = record.unit_type;
        let scope = record.scope;

        for ty in types {
            self.build_source_fields(ty);
            self.build_source_methods(ty, None);
            self.own_fields(ty)?;
            self.own_methods(ty)?;
        }
        self.own_methods(unit_type)?;
        let variables = self
            .scope(scope)
            .block()
            .map(|block| block.locals.clone())
            .unwrap_or_default();
        for local in variables {
            self.local_type(local)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/source_tests.rs"]
mod tests;

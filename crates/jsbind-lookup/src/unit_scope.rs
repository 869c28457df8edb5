//! Compilation unit scopes: unit creation, imports, unit-level variables
//! and functions, and the global super type.

use std::sync::Arc;

use jsbind_common::Atom;
use jsbind_common::diagnostics::diagnostic_codes;
use rustc_hash::FxHashMap;
use tracing::{debug, debug_span, trace};

use crate::binding::{Binding, ImportBinding};
use crate::class_scope::TypeSite;
use crate::decl::CompilationUnitDecl;
use crate::environment::{LookupEnvironment, Phase, UnitRecord};
use crate::error::LookupResult;
use crate::ids::{ScopeId, TypeId, UnitId};
use crate::members::MemberTable;
use crate::modifiers::{Modifiers, TypeTags};
use crate::problem::ReferenceContext;
use crate::scope::{BlockScope, ReferenceRecord, Scope, ScopeData, SuperTypeBuildLock, UnitScope};
use crate::symbols::MethodKind;
use crate::types::{Provenance, ReferenceBinding, TypeData};

impl LookupEnvironment {
    // =========================================================================
    // Unit creation
    // =========================================================================

    /// Allocate the unit record, its root scope and the unit binding that
    /// holds unit-level functions. The unit binding is named after the file
    /// but never registered in the package.
    pub(crate) fn create_unit(
        &mut self,
        decl: Arc<CompilationUnitDecl>,
        restricted_to: Option<Vec<Atom>>,
    ) -> UnitId {
        let unit = UnitId::from_index(self.units.len());
        let file_name = self.interner.intern(&decl.file_name);
        let package_name: Vec<Atom> = decl
            .package_segments()
            .into_iter()
            .map(|segment| self.interner.intern(segment))
            .collect();
        let package = self.create_package(&package_name);

        let references = self.options.produce_reference_info.then(ReferenceRecord::default);
        let scope = self.alloc_scope(Scope {
            parent: None,
            data: ScopeData::Unit(Box::new(UnitScope {
                unit,
                package,
                imports: None,
                top_level_types: Vec::new(),
                type_or_package_cache: None,
                block: BlockScope::default(),
                references,
                super_type: None,
                super_type_lock: SuperTypeBuildLock::default(),
                function_scopes: Vec::new(),
            })),
        });

        let mut compound = package_name;
        compound.push(self.interner.intern(decl.main_type_name()));
        let mut binding = ReferenceBinding::new(compound, package, Modifiers::PUBLIC, Provenance::Unit(unit));
        binding.file_name = file_name;
        binding.tags |= TypeTags::HAS_NO_MEMBER_TYPES;
        binding.fields = MemberTable::complete_empty();
        let unit_type = self.alloc_type(TypeData::Reference(Box::new(binding)));

        self.units.push(UnitRecord {
            decl,
            scope,
            unit_type,
            file_name,
            types: Vec::new(),
            restricted_to,
            phase: Phase::NotStarted,
            aborted: None,
        });
        unit
    }

    /// Phase 1 for one unit: skeleton bindings of its types, then (unless
    /// the unit was accepted for specific type names) its unit-level
    /// variables and functions, registered in the unit's package.
    pub(crate) fn build_unit_type_bindings(&mut self, unit: UnitId) {
        let record = &self.units[unit.index()];
        let decl = Arc::clone(&record.decl);
        let scope = record.scope;
        let unit_type = record.unit_type;
        let restricted = record.restricted_to.clone();
        let package = self.current_package(scope);
        let _span = debug_span!("build_type_bindings", file = %decl.file_name).entered();

        for ty in &decl.types {
            if let Some(names) = &restricted {
                let name = self.interner.intern(&ty.name);
                if !names.contains(&name) {
                    continue;
                }
            }
            let site = TypeSite {
                unit,
                parent_scope: scope,
                package,
                enclosing: None,
                is_local: false,
                enclosing_case: None,
            };
            self.build_type(site, ty);
        }
        if restricted.is_some() {
            return;
        }

        for variable in &decl.variables {
            let local = self.declare_local(scope, &variable.name, variable.type_name.as_deref(), Some(variable.span), false);
            let name = self.locals[local.index()].name;
            self.package_add_binding(package, name, &Binding::Variable(local));
        }

        let mut functions = Vec::with_capacity(decl.functions.len());
        let mut function_scopes = Vec::with_capacity(decl.functions.len());
        for function in &decl.functions {
            if function.selector().is_none() {
                continue;
            }
            let function_scope = self.new_method_scope(scope, false);
            let method = self.create_function_binding(function, unit_type, MethodKind::LocalFunction, function_scope);
            self.populate_method_scope(function_scope, function);
            let selector = self.methods[method.index()].selector;
            self.package_add_binding(package, selector, &Binding::Method(method));
            functions.push(method);
            function_scopes.push(function_scope);
        }
        if let Some(unit_scope) = self.scope_mut(scope).as_unit_mut() {
            unit_scope.block.local_functions.extend(functions.iter().copied());
            unit_scope.function_scopes = function_scopes;
        }
        if let Some(binding) = self.reference_mut(unit_type) {
            binding.methods = MemberTable::new(functions);
        }
        trace!(types = self.units[unit.index()].types.len(), "built unit type bindings");
    }

    // =========================================================================
    // Phase 2: imports
    // =========================================================================

    /// Resolve the unit's imports. Imports that resolve to nothing are
    /// reported and dropped; repeated imports and on-demand imports of the
    /// unit's own package are ignored. Runs once per unit.
    pub(crate) fn check_and_set_imports(&mut self, unit: UnitId) -> LookupResult<()> {
        let scope = self.units[unit.index()].scope;
        let Some(unit_scope) = self.scope(scope).as_unit() else {
            return Ok(());
        };
        if unit_scope.imports.is_some() {
            return Ok(());
        }
        let package = unit_scope.package;
        let own_package = self.packages[package.index()].compound_name.clone();
        let decl = Arc::clone(&self.units[unit.index()].decl);

        let mut resolved: Vec<ImportBinding> = Vec::with_capacity(decl.imports.len());
        for import in &decl.imports {
            let compound = self.interner.intern_dotted(&import.name);
            if compound.is_empty() {
                continue;
            }
            let repeated = resolved.iter().any(|known| {
                known.compound_name == compound
                    && known.on_demand == import.on_demand
                    && known.is_file_import == import.is_file_import
            });
            if repeated || (import.on_demand && !import.is_file_import && compound == own_package) {
                continue;
            }

            let target = if import.is_file_import {
                self.unit_for_file(&import.name).map(Binding::CompilationUnit)
            } else if import.on_demand {
                match self.get_package(&compound) {
                    Some(package) => Some(Binding::Package(package)),
                    None => self.get_type(&compound)?.filter(Binding::is_valid),
                }
            } else {
                self.get_type(&compound)?.filter(|binding| binding.as_type().is_some())
            };
            match target {
                Some(target) => resolved.push(ImportBinding {
                    compound_name: compound,
                    on_demand: import.on_demand,
                    is_file_import: import.is_file_import,
                    resolved: Some(target),
                }),
                None => {
                    self.report(
                        ReferenceContext::Unit(unit),
                        diagnostic_codes::IMPORT_NOT_FOUND,
                        Some(import.span),
                        &[import.name.clone()],
                    );
                }
            }
        }

        let mut cache = FxHashMap::default();
        for import in resolved.iter().filter(|import| !import.on_demand && !import.is_file_import) {
            if let Some(target) = &import.resolved {
                cache.entry(import.simple_name()).or_insert_with(|| target.clone());
            }
        }
        debug!(file = %decl.file_name, imports = resolved.len(), "resolved imports");
        if let Some(unit_scope) = self.scope_mut(scope).as_unit_mut() {
            unit_scope.imports = Some(resolved);
            unit_scope.type_or_package_cache = Some(cache);
        }
        Ok(())
    }

    /// Resolved imports of a unit, empty before the import phase.
    pub fn unit_imports(&self, unit: UnitId) -> &[ImportBinding] {
        self.scope(self.unit_scope(unit))
            .as_unit()
            .and_then(|scope| scope.imports.as_deref())
            .unwrap_or(&[])
    }

    // =========================================================================
    // Global super type
    // =========================================================================

    /// Super type of the unit binding: the library type named by the unit's
    /// `global_super_type`, else the root object type. Built once; a caller
    /// that finds the build already claimed gets the root object type
    /// instead of building it a second time.
    pub(crate) fn build_super_type(&mut self, unit: UnitId) -> LookupResult<Option<TypeId>> {
        let scope = self.units[unit.index()].scope;
        let unit_type = self.units[unit.index()].unit_type;
        let object = self.object_type;
        let Some(unit_scope) = self.scope(scope).as_unit() else {
            return Ok(Some(object));
        };
        if let Some(existing) = unit_scope.super_type {
            return Ok(Some(existing));
        }
        let lock = unit_scope.super_type_lock.clone();
        let Some(guard) = lock.try_begin() else {
            trace!(unit = unit.0, "super type build already claimed");
            return Ok(Some(object));
        };

        let name = self.units[unit.index()]
            .decl
            .global_super_type
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        let superclass = match name {
            Some(name) => {
                let compound = self.interner.intern_dotted(&name);
                match self.get_type(&compound)?.and_then(|binding| binding.as_type()) {
                    Some(found) if !self.is_missing_type(found) && found != unit_type => found,
                    _ => object,
                }
            }
            None => object,
        };

        if let Some(binding) = self.reference_mut(unit_type) {
            binding.superclass = Some(superclass);
        }
        if let Some(unit_scope) = self.scope_mut(scope).as_unit_mut() {
            unit_scope.super_type = Some(superclass);
        }
        guard.finish();
        trace!(unit = unit.0, superclass = %self.type_name(superclass), "built unit super type");
        Ok(Some(superclass))
    }

    /// Drop an unfinished super type build of an aborted unit.
    pub(crate) fn release_super_type_build(&mut self, unit: UnitId) {
        let scope = self.units[unit.index()].scope;
        if let Some(unit_scope) = self.scope(scope).as_unit() {
            unit_scope.super_type_lock.reset();
        }
    }

    // =========================================================================
    // Reference recording
    // =========================================================================

    pub(crate) fn record_qualified_reference(&mut self, scope: ScopeId, compound: &[Atom]) {
        if let Some(references) = self
            .unit_scope_data_mut(scope)
            .and_then(|unit| unit.references.as_mut())
        {
            references.record_qualified(compound);
        }
    }

    pub(crate) fn record_simple_reference(&mut self, scope: ScopeId, name: Atom) {
        if let Some(references) = self
            .unit_scope_data_mut(scope)
            .and_then(|unit| unit.references.as_mut())
        {
            references.record_simple(name);
        }
    }

    pub(crate) fn record_type_reference(&mut self, scope: ScopeId, ty: TypeId) {
        if let Some(references) = self
            .unit_scope_data_mut(scope)
            .and_then(|unit| unit.references.as_mut())
        {
            references.record_type(ty);
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit_scope_tests.rs"]
mod tests;

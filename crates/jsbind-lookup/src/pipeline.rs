//! Unit acceptance, the four completion phases and on-demand requests.
//!
//! Units accepted since the last batch wait in the queue with only their
//! skeleton type bindings built. `complete_type_bindings` then runs imports,
//! hierarchy connection and member building over the whole batch, one phase
//! at a time. A unit that turns up in the middle of a batch (because a
//! lookup asked the name environment for it) catches up to the phase the
//! batch has reached and is carried along from there; a unit that turns up
//! after a batch finished starts a fresh batch.
//!
//! A unit whose completion raises `AbortCompilation` is isolated: its
//! in-progress markers are cleared, the abort is recorded and reported, and
//! the batch continues with the remaining units.

use std::sync::Arc;

use jsbind_common::Atom;
use jsbind_common::diagnostics::diagnostic_codes;
use jsbind_common::limits::{MAX_HIERARCHY_WALK, MAX_TYPE_REQUEST_DEPTH};
use tracing::{debug, debug_span, trace, warn};

use crate::binding::{Binding, BindingMask};
use crate::decl::CompilationUnitDecl;
use crate::environment::{LookupEnvironment, Phase};
use crate::error::{AbortCompilation, LookupResult};
use crate::ids::{PackageId, TypeId, UnitId};
use crate::members::MemberTable;
use crate::modifiers::{Modifiers, TypeTags};
use crate::name_env::NameAnswer;
use crate::problem::ReferenceContext;
use crate::types::{BaseKind, Provenance, ReferenceBinding, TypeData};

/// Where `install_type` put a new binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Installed {
    /// Registered under its name (possibly in a former placeholder's slot).
    Canonical(TypeId),
    /// Another real binding already owns the name.
    Shadowed { id: TypeId, existing: TypeId },
}

impl Installed {
    pub(crate) fn id(self) -> TypeId {
        match self {
            Installed::Canonical(id) | Installed::Shadowed { id, .. } => id,
        }
    }
}

impl LookupEnvironment {
    // =========================================================================
    // Type registration
    // =========================================================================

    /// Add a new reference binding to the arena and register it in
    /// `package`. A placeholder for the same name is overwritten in place so
    /// earlier holders of its id see the real binding; a missing-type proxy
    /// is replaced in the package but keeps its own slot.
    pub(crate) fn install_type(
        &mut self,
        package: PackageId,
        simple: Atom,
        binding: ReferenceBinding,
    ) -> Installed {
        match self.packages[package.index()].get_type0(simple) {
            Some(existing) if self.is_placeholder(existing) => {
                self.types[existing.index()] = TypeData::Reference(Box::new(binding));
                trace!(name = %self.type_name(existing), "filled placeholder slot");
                Installed::Canonical(existing)
            }
            Some(existing) if !self.is_missing_type(existing) => {
                let id = self.alloc_type(TypeData::Reference(Box::new(binding)));
                Installed::Shadowed { id, existing }
            }
            _ => {
                let id = self.alloc_type(TypeData::Reference(Box::new(binding)));
                self.packages[package.index()].add_type(simple, id);
                Installed::Canonical(id)
            }
        }
    }

    #[inline]
    pub fn is_placeholder(&self, ty: TypeId) -> bool {
        self.reference(ty).is_some_and(ReferenceBinding::is_placeholder)
    }

    #[inline]
    pub fn is_missing_type(&self, ty: TypeId) -> bool {
        self.reference(ty).is_some_and(ReferenceBinding::is_missing)
    }

    // =========================================================================
    // Unit acceptance
    // =========================================================================

    /// Accept a parsed unit: build its skeleton type bindings and queue it
    /// for the next batch. A file accepted before is not built twice.
    pub fn accept_unit(&mut self, decl: CompilationUnitDecl) -> UnitId {
        self.accept_unit_restricted(decl, None)
    }

    /// Accept a unit building only the named top-level types.
    pub fn build_type_bindings(&mut self, decl: CompilationUnitDecl, type_names: &[&str]) -> UnitId {
        let names: Vec<Atom> = type_names.iter().map(|name| self.interner.intern(name)).collect();
        self.accept_unit_restricted(decl, Some(names))
    }

    fn accept_unit_restricted(
        &mut self,
        decl: CompilationUnitDecl,
        restrict_to: Option<Vec<Atom>>,
    ) -> UnitId {
        if let Some(existing) = self.unit_for_file(&decl.file_name) {
            return existing;
        }
        self.accepted_files.insert(decl.file_name.clone());
        let file_name = decl.file_name.clone();
        let unit = self.create_unit(Arc::new(decl), restrict_to);
        self.pipeline.queue.push(unit);
        self.build_unit_type_bindings(unit);
        self.units[unit.index()].phase = Phase::BuildTypeHierarchy;
        debug!(file = %file_name, unit = unit.0, "accepted compilation unit");
        unit
    }

    pub fn unit_for_file(&self, file_name: &str) -> Option<UnitId> {
        if !self.accepted_files.contains(file_name) {
            return None;
        }
        self.units()
            .find(|(_, unit)| unit.decl.file_name == file_name)
            .map(|(id, _)| id)
    }

    /// Units that have been accepted but not completed by any batch.
    pub fn pending_units(&self) -> &[UnitId] {
        &self.pipeline.queue[self.pipeline.completed_count..]
    }

    // =========================================================================
    // Batch completion
    // =========================================================================

    /// Run imports, hierarchy connection and member building over every
    /// unit accepted since the last batch. Units discovered while the batch
    /// runs join it.
    pub fn complete_type_bindings(&mut self) {
        let pending = self.pipeline.queue.len() - self.pipeline.completed_count;
        let _span = debug_span!("complete_type_bindings", pending).entered();

        self.pipeline.step_completed = Phase::BuildTypeHierarchy;
        for phase in [
            Phase::CheckAndSetImports,
            Phase::ConnectTypeHierarchy,
            Phase::BuildFieldsAndMethods,
        ] {
            let mut i = self.pipeline.completed_count;
            while i < self.pipeline.queue.len() {
                let unit = self.pipeline.queue[i];
                self.run_unit_phase(unit, phase);
                i += 1;
            }
            self.pipeline.step_completed = phase;
            debug!(?phase, units = self.pipeline.queue.len() - self.pipeline.completed_count, "phase completed");
        }
        self.pipeline.completed_count = self.pipeline.queue.len();
        self.pipeline.unit_being_completed = None;
    }

    /// Bring a unit accepted on demand up to the phase the current batch has
    /// reached. When no batch is running the unit starts a fresh one.
    pub fn complete_type_bindings_for(&mut self, unit: UnitId) {
        if self.pipeline.step_completed == Phase::BuildFieldsAndMethods {
            self.complete_type_bindings();
            return;
        }
        let step = self.pipeline.step_completed;
        if step >= Phase::CheckAndSetImports {
            self.run_unit_phase(unit, Phase::CheckAndSetImports);
        }
        if step >= Phase::ConnectTypeHierarchy {
            self.run_unit_phase(unit, Phase::ConnectTypeHierarchy);
        }
    }

    /// Run one phase for one unit, isolating an abort to that unit.
    fn run_unit_phase(&mut self, unit: UnitId, phase: Phase) {
        let record = &self.units[unit.index()];
        if record.aborted.is_some() || record.phase >= phase {
            return;
        }
        let previous = self.pipeline.unit_being_completed.replace(unit);
        let request_depth = self.type_requests.len();

        let result = match phase {
            Phase::CheckAndSetImports => self.check_and_set_imports(unit),
            Phase::ConnectTypeHierarchy => self.connect_unit_type_hierarchy(unit),
            Phase::BuildFieldsAndMethods => self
                .build_unit_fields_and_methods(unit)
                .and_then(|()| self.verify_unit(unit)),
            Phase::NotStarted | Phase::BuildTypeHierarchy => Ok(()),
        }
        .and_then(|()| self.check_cancelled());

        match result {
            Ok(()) => self.units[unit.index()].phase = phase,
            Err(abort) => {
                self.type_requests.truncate(request_depth);
                self.abort_unit(unit, abort);
            }
        }
        self.pipeline.unit_being_completed = previous;
    }

    /// Unwind a unit after an abort: clear every in-progress marker its
    /// types carry, record the abort and report it.
    fn abort_unit(&mut self, unit: UnitId, abort: AbortCompilation) {
        let file = self.units[unit.index()].decl.file_name.clone();
        warn!(file = %file, error = %abort, "aborted compilation unit");
        let types = self.units[unit.index()].types.clone();
        for ty in types {
            if let Some(binding) = self.reference_mut(ty) {
                binding.tags -= TypeTags::HIERARCHY_BEING_CONNECTED;
                if binding.tags.contains(TypeTags::BEGIN_HIERARCHY_CHECK)
                    && !binding.tags.contains(TypeTags::END_HIERARCHY_CHECK)
                {
                    binding.tags -= TypeTags::BEGIN_HIERARCHY_CHECK;
                }
                if let Some(origin) = binding.provenance.as_source_mut() {
                    origin.build.clear_in_progress();
                }
            }
        }
        self.release_super_type_build(unit);
        let message = abort.to_string();
        self.units[unit.index()].aborted = Some(abort);
        self.report(
            ReferenceContext::Unit(unit),
            diagnostic_codes::UNIT_ABORTED,
            None,
            &[file, message],
        );
    }

    // =========================================================================
    // On-demand requests
    // =========================================================================

    /// Ask the name environment for a type that is not in the cache. Whatever
    /// comes back is accepted (and caught up with the running batch) before
    /// the cache is consulted again.
    pub fn ask_for_type(&mut self, compound_name: &[Atom]) -> LookupResult<Option<TypeId>> {
        if self.type_requests.iter().any(|pending| pending.as_slice() == compound_name) {
            trace!(name = %self.compound_to_string(compound_name), "type already requested");
            return Ok(None);
        }
        if self.type_requests.len() >= MAX_TYPE_REQUEST_DEPTH {
            return Err(AbortCompilation::ReentrantTypeRequest {
                name: self.compound_to_string(compound_name),
                limit: MAX_TYPE_REQUEST_DEPTH,
            });
        }
        let names: Vec<String> = compound_name
            .iter()
            .map(|atom| self.interner.resolve(*atom).to_string())
            .collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let Some(name_environment) = self.name_environment.as_mut() else {
            return Err(AbortCompilation::NoNameEnvironment(names.join(".")));
        };
        let Some(answer) = name_environment.find_type(&refs)? else {
            return Ok(None);
        };

        let depth = self.type_requests.len();
        self.type_requests.push(compound_name.to_vec());
        self.accept_answer(answer);
        self.type_requests.truncate(depth);

        Ok(self.get_cached_type(compound_name))
    }

    /// Ask the name environment for the units declaring a unit-level
    /// function or variable, then look the name up again.
    pub fn ask_for_binding(
        &mut self,
        package: PackageId,
        name: Atom,
        mask: BindingMask,
    ) -> LookupResult<Option<Binding>> {
        let mut compound = self.packages[package.index()].compound_name.clone();
        compound.push(name);
        if self.type_requests.iter().any(|pending| *pending == compound) {
            return Ok(None);
        }
        let package_names: Vec<String> = self.packages[package.index()]
            .compound_name
            .iter()
            .map(|atom| self.interner.resolve(*atom).to_string())
            .collect();
        let package_refs: Vec<&str> = package_names.iter().map(String::as_str).collect();
        let text = self.interner.resolve(name).to_string();
        let Some(name_environment) = self.name_environment.as_mut() else {
            return Err(AbortCompilation::NoNameEnvironment(text));
        };
        let Some(answer) = name_environment.find_binding(&text, &package_refs, mask)? else {
            return Ok(None);
        };

        let depth = self.type_requests.len();
        self.type_requests.push(compound);
        self.accept_answer(answer);
        self.type_requests.truncate(depth);

        Ok(self.packages[package.index()].get_binding0(name, mask))
    }

    fn accept_answer(&mut self, answer: NameAnswer) {
        match answer {
            NameAnswer::Binary(descriptor) => {
                self.accept_binary(descriptor);
            }
            NameAnswer::Metadata(descriptor) => {
                self.accept_metadata(descriptor);
            }
            NameAnswer::CompilationUnits(units) => {
                for decl in units {
                    if self.unit_for_file(&decl.file_name).is_some() {
                        continue;
                    }
                    let unit = self.accept_unit(decl);
                    self.complete_type_bindings_for(unit);
                }
            }
            NameAnswer::Package => {}
        }
    }

    /// Cached binding for a compound name, if one exists and is more than a
    /// placeholder.
    pub fn get_cached_type(&self, compound_name: &[Atom]) -> Option<TypeId> {
        let (&simple, package_name) = compound_name.split_last()?;
        let mut package = self.default_package;
        for segment in package_name {
            package = self.packages[package.index()].get_package0(*segment)?;
        }
        self.packages[package.index()]
            .get_type0(simple)
            .filter(|ty| !self.is_placeholder(*ty))
    }

    // =========================================================================
    // Placeholders and missing types
    // =========================================================================

    /// Resolve a placeholder in place. Anything else is returned unchanged.
    /// A placeholder nobody can supply becomes a missing-type proxy.
    pub fn resolve_type(&mut self, ty: TypeId) -> LookupResult<TypeId> {
        match self.types.get(ty.index()) {
            Some(TypeData::Array { leaf, .. }) => {
                let leaf = *leaf;
                self.resolve_type(leaf)?;
                Ok(ty)
            }
            Some(TypeData::Reference(binding)) if binding.is_placeholder() => {
                let compound = binding.compound_name.clone();
                trace!(name = %self.compound_to_string(&compound), "resolving placeholder");
                self.ask_for_type(&compound)?;
                if self.is_placeholder(ty) {
                    self.fill_missing(ty, &compound);
                }
                Ok(ty)
            }
            _ => Ok(ty),
        }
    }

    /// Proxy for a type nobody could supply, registered under its name and
    /// extending `Object` so dependents keep resolving.
    pub fn cache_missing_binary_type(&mut self, compound_name: &[Atom]) -> TypeId {
        let Some((&simple, package_name)) = compound_name.split_last() else {
            return TypeId::ANY;
        };
        let package = self.create_package(package_name);
        match self.packages[package.index()].get_type0(simple) {
            Some(existing) if self.is_placeholder(existing) => {
                self.fill_missing(existing, compound_name);
                existing
            }
            Some(existing) if self.is_missing_type(existing) => existing,
            _ => {
                let binding = self.missing_binding(compound_name, package);
                let id = self.alloc_type(TypeData::Reference(Box::new(binding)));
                self.packages[package.index()].add_type(simple, id);
                id
            }
        }
    }

    fn fill_missing(&mut self, slot: TypeId, compound_name: &[Atom]) {
        let package = self.reference(slot).map_or(self.default_package, |binding| binding.package);
        let binding = self.missing_binding(compound_name, package);
        self.types[slot.index()] = TypeData::Reference(Box::new(binding));
        debug!(name = %self.compound_to_string(compound_name), "created missing type");
    }

    fn missing_binding(&mut self, compound_name: &[Atom], package: PackageId) -> ReferenceBinding {
        let mut binding = ReferenceBinding::new(
            compound_name.to_vec(),
            package,
            Modifiers::PUBLIC,
            Provenance::Missing,
        );
        binding.tags |= TypeTags::IS_MISSING_TYPE | TypeTags::HAS_NO_MEMBER_TYPES;
        binding.superclass = Some(self.object_type);
        binding.fields = MemberTable::complete_empty();
        binding.methods = MemberTable::complete_empty();
        if let Some(unit) = self.pipeline.unit_being_completed {
            binding.file_name = self.units[unit.index()].file_name;
        }
        binding
    }

    // =========================================================================
    // Arrays and boxing
    // =========================================================================

    /// The unique array type of `dimensions` over `leaf`. Arrays of arrays
    /// are flattened onto the leaf.
    pub fn create_array_type(&mut self, leaf: TypeId, dimensions: u8) -> TypeId {
        let (leaf, dimensions) = match self.types.get(leaf.index()) {
            Some(TypeData::Array {
                leaf: inner,
                dimensions: inner_dims,
            }) => (*inner, inner_dims.saturating_add(dimensions)),
            _ => (leaf, dimensions),
        };
        if dimensions == 0 {
            return leaf;
        }
        if let Some(existing) = self.array_types.get(&(leaf, dimensions)) {
            return *existing;
        }
        let id = self.alloc_type(TypeData::Array { leaf, dimensions });
        self.array_types.insert((leaf, dimensions), id);
        id
    }

    /// Element type of an array (one dimension less), `None` for non-arrays.
    pub fn element_type(&mut self, array: TypeId) -> Option<TypeId> {
        match self.types.get(array.index()) {
            Some(TypeData::Array { leaf, dimensions }) => {
                let (leaf, dimensions) = (*leaf, *dimensions);
                Some(self.create_array_type(leaf, dimensions - 1))
            }
            _ => None,
        }
    }

    /// Boxing conversion: a base type maps to its wrapper type, a wrapper
    /// type back to its base type. `None` when the wrapper type is not known
    /// to anyone; other types map to themselves.
    pub fn compute_boxing_type(&mut self, ty: TypeId) -> LookupResult<Option<TypeId>> {
        if let Some(TypeData::Base(kind)) = self.types.get(ty.index()) {
            let Some(wrapper) = kind.wrapper_name() else {
                return Ok(Some(ty));
            };
            let name = self.interner.intern(wrapper);
            let boxed = self.get_type(&[name])?;
            return Ok(boxed.and_then(|binding| binding.as_type()));
        }
        if let Some(binding) = self.reference(ty)
            && binding.package == self.default_package
            && let Some(kind) = BaseKind::from_wrapper_name(self.resolve_atom(binding.source_name))
        {
            return Ok(BaseKind::from_name(kind.name()));
        }
        Ok(Some(ty))
    }

    /// Superclass chain of `ty`, nearest first. Stops at a repeated type, so
    /// corrupt binary hierarchies cannot loop.
    pub fn superclass_chain(&mut self, ty: TypeId) -> LookupResult<Vec<TypeId>> {
        let mut chain = Vec::new();
        let mut current = self.superclass(ty)?;
        while let Some(next) = current {
            if next == ty || chain.contains(&next) || chain.len() >= MAX_HIERARCHY_WALK {
                break;
            }
            chain.push(next);
            current = self.superclass(next)?;
        }
        Ok(chain)
    }
}


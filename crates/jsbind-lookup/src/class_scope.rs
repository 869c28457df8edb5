//! Class scopes: building source type bindings and connecting their
//! hierarchies.
//!
//! Phase 1 turns every inferred type of a unit (top-level, member and local)
//! into a skeleton binding with a class scope and one method scope per
//! declared function. Phase 3 connects each type to its superclass, detects
//! cycles and merges mixed-in members.

use std::sync::Arc;

use jsbind_common::diagnostics::diagnostic_codes;
use jsbind_common::limits::MAX_HIERARCHY_WALK;
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::binding::{Binding, ProblemReason};
use crate::decl::{InferredTypeDecl, MethodDecl, Span};
use crate::environment::{LookupEnvironment, Phase};
use crate::error::LookupResult;
use crate::ids::{PackageId, ScopeId, TypeId, UnitId};
use crate::modifiers::{ModifierKeyword, TypeTags};
use crate::pipeline::Installed;
use crate::problem::ReferenceContext;
use crate::scope::{ClassScope, Scope, ScopeData};
use crate::types::{MemberBuildState, Provenance, ReferenceBinding, SourceOrigin, TypeData};

/// Where a source type is being declared.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TypeSite {
    pub(crate) unit: UnitId,
    pub(crate) parent_scope: ScopeId,
    pub(crate) package: PackageId,
    pub(crate) enclosing: Option<TypeId>,
    /// Declared inside a function: never registered in the package.
    pub(crate) is_local: bool,
    pub(crate) enclosing_case: Option<u32>,
}

impl LookupEnvironment {
    // =========================================================================
    // Phase 1: skeleton bindings
    // =========================================================================

    /// Create the binding, class scope and method scopes of `decl` and of
    /// its member types.
    pub(crate) fn build_type(&mut self, site: TypeSite, decl: &InferredTypeDecl) -> TypeId {
        let name = if decl.name.trim().is_empty() {
            format!("${}", self.units[site.unit.index()].types.len() + 1)
        } else {
            decl.name.clone()
        };
        let source_name = self.interner.intern(&name);
        let registered_name = match site.enclosing.and_then(|outer| self.reference(outer)) {
            Some(outer) if !site.is_local => {
                let outer_simple = outer.compound_name.last().copied().unwrap_or(outer.source_name);
                let text = format!("{}${name}", self.resolve_atom(outer_simple));
                self.interner.intern(&text)
            }
            _ => source_name,
        };
        let mut compound = self.packages[site.package.index()].compound_name.clone();
        compound.push(registered_name);

        let decl = Arc::new(decl.clone());
        let class_scope = self.alloc_scope(Scope {
            parent: Some(site.parent_scope),
            data: ScopeData::Class(ClassScope {
                ty: TypeId::ANY,
                decl: Arc::clone(&decl),
            }),
        });
        self.register_subscope(site.parent_scope, class_scope);

        let mut binding = ReferenceBinding::new(
            compound,
            site.package,
            decl.modifier_set().with_default_public(),
            Provenance::Source(Box::new(SourceOrigin {
                unit: site.unit,
                class_scope,
                decl: Arc::clone(&decl),
                build: MemberBuildState::default(),
                method_scopes: Vec::new(),
                captured_locals: Vec::new(),
                enclosing_case: site.enclosing_case,
            })),
        );
        binding.source_name = source_name;
        binding.file_name = self.units[site.unit.index()].file_name;
        binding.enclosing_type = site.enclosing;
        binding.tags |= type_tags(decl.as_ref(), site);

        let id = if site.is_local {
            self.alloc_type(TypeData::Reference(Box::new(binding)))
        } else {
            match self.install_type(site.package, registered_name, binding) {
                Installed::Canonical(id) => id,
                Installed::Shadowed { id, existing } => {
                    let existing_is_source = self
                        .reference(existing)
                        .is_some_and(|binding| matches!(binding.provenance, Provenance::Source(_)));
                    if existing_is_source {
                        self.add_linked_binding(existing, id);
                    } else {
                        trace!(name = %name, "source type shadowed by an earlier binding");
                    }
                    id
                }
            }
        };
        if let ScopeData::Class(class) = &mut self.scope_mut(class_scope).data {
            class.ty = id;
        }
        self.units[site.unit.index()].types.push(id);
        match site.enclosing {
            Some(outer) => {
                if let Some(outer) = self.reference_mut(outer) {
                    outer.member_types.push(id);
                    outer.tags -= TypeTags::HAS_NO_MEMBER_TYPES;
                }
            }
            None if !site.is_local => {
                if let Some(unit_scope) = self.unit_scope_data_mut(site.parent_scope) {
                    unit_scope.top_level_types.push(id);
                }
            }
            None => {}
        }
        if !site.is_local {
            for synonym in &decl.synonyms {
                let synonym = self.interner.intern(synonym);
                if self.packages[site.package.index()].get_type0(synonym).is_none() {
                    self.packages[site.package.index()].add_type(synonym, id);
                }
            }
        }

        self.build_member_types(id, class_scope, site, &decl);
        let method_scopes = self.build_method_scopes(class_scope, &decl.methods, true);
        if let Some(origin) = self
            .reference_mut(id)
            .and_then(|binding| binding.provenance.as_source_mut())
        {
            origin.method_scopes = method_scopes;
        }
        trace!(name = %self.type_name(id), local = site.is_local, "built source type");
        id
    }

    /// Member types, skipping any named like an enclosing type or an
    /// earlier sibling.
    fn build_member_types(&mut self, ty: TypeId, class_scope: ScopeId, site: TypeSite, decl: &InferredTypeDecl) {
        let mut taken = Vec::new();
        let mut outer = Some(ty);
        let mut steps = 0;
        while let Some(current) = outer {
            let Some(binding) = self.reference(current) else {
                break;
            };
            taken.push(self.resolve_atom(binding.source_name).to_string());
            outer = binding.enclosing_type;
            steps += 1;
            if steps > MAX_HIERARCHY_WALK {
                break;
            }
        }
        for member in &decl.member_types {
            if !member.name.is_empty() && taken.contains(&member.name) {
                trace!(name = %member.name, "skipped member type hiding an enclosing name");
                continue;
            }
            taken.push(member.name.clone());
            let member_site = TypeSite {
                parent_scope: class_scope,
                enclosing: Some(ty),
                ..site
            };
            self.build_type(member_site, member);
        }
    }

    /// One method scope per declared function, in declaration order.
    fn build_method_scopes(&mut self, class_scope: ScopeId, methods: &[MethodDecl], with_local_types: bool) -> Vec<ScopeId> {
        methods
            .iter()
            .map(|method| {
                let is_static = is_static_decl(&method.modifiers);
                let scope = self.new_method_scope(class_scope, is_static);
                if with_local_types {
                    self.populate_method_scope(scope, method);
                } else {
                    self.declare_method_locals(scope, method);
                }
                scope
            })
            .collect()
    }

    /// Declare a function's arguments, its locals and its local types.
    pub(crate) fn populate_method_scope(&mut self, scope: ScopeId, decl: &MethodDecl) {
        self.declare_method_locals(scope, decl);
        for local_type in &decl.local_types {
            self.build_local_type(scope, local_type);
        }
    }

    fn declare_method_locals(&mut self, scope: ScopeId, decl: &MethodDecl) {
        let allow_varargs = self.options.allows_boxing_and_varargs();
        let last = decl.parameters.len().saturating_sub(1);
        for (index, param) in decl.parameters.iter().enumerate() {
            let type_name = match param.type_name.as_deref() {
                Some(element) if param.varargs && index == last && allow_varargs => Some(format!("{element}[]")),
                other => other.map(str::to_string),
            };
            self.declare_local(scope, &param.name, type_name.as_deref(), Some(decl.span), true);
        }
        for local in &decl.locals {
            self.declare_local(scope, &local.name, local.type_name.as_deref(), Some(local.span), false);
        }
    }

    /// A type declared inside a function body.
    fn build_local_type(&mut self, scope: ScopeId, decl: &InferredTypeDecl) -> Option<TypeId> {
        let unit = self.unit_scope_data(scope)?.unit;
        let site = TypeSite {
            unit,
            parent_scope: scope,
            package: self.current_package(scope),
            enclosing: self.enclosing_source_type(scope),
            is_local: true,
            enclosing_case: self.innermost_switch_case(scope),
        };
        let id = self.build_type(site, decl);
        if let Some(block) = self.scope_mut(scope).block_mut() {
            block.local_types.push(id);
        }
        Some(id)
    }

    /// Declare a local type in `scope` after the unit was built. The type
    /// catches up with the phases its unit already went through.
    pub fn add_local_type(&mut self, scope: ScopeId, decl: &InferredTypeDecl) -> LookupResult<Option<TypeId>> {
        let Some(id) = self.build_local_type(scope, decl) else {
            return Ok(None);
        };
        let Some(origin) = self.reference(id).and_then(|binding| binding.provenance.as_source()) else {
            return Ok(Some(id));
        };
        let phase = self.units[origin.unit.index()].phase;
        if phase >= Phase::ConnectTypeHierarchy {
            self.connect_type_hierarchy(id)?;
        }
        if phase >= Phase::BuildFieldsAndMethods {
            self.build_source_fields(id);
            self.build_source_methods(id, None);
        }
        Ok(Some(id))
    }

    // =========================================================================
    // Phase 3: hierarchy connection
    // =========================================================================

    /// Connect the hierarchies of every type of `unit`, after its global
    /// super type.
    pub(crate) fn connect_unit_type_hierarchy(&mut self, unit: UnitId) -> LookupResult<()> {
        self.build_super_type(unit)?;
        let types = self.units[unit.index()].types.clone();
        for ty in types {
            self.connect_type_hierarchy(ty)?;
        }
        Ok(())
    }

    /// Resolve the superclass and mixins of a source type. Runs once per
    /// type; enclosing types are connected first.
    pub(crate) fn connect_type_hierarchy(&mut self, ty: TypeId) -> LookupResult<()> {
        let Some(binding) = self.reference(ty) else {
            return Ok(());
        };
        if binding.tags.intersects(TypeTags::BEGIN_HIERARCHY_CHECK | TypeTags::END_HIERARCHY_CHECK) {
            return Ok(());
        }
        let Some(origin) = binding.provenance.as_source() else {
            return Ok(());
        };
        let unit = origin.unit;
        let enclosing = binding.enclosing_type;

        let imports_missing = self
            .scope(self.units[unit.index()].scope)
            .as_unit()
            .is_some_and(|scope| scope.imports.is_none());
        if imports_missing {
            self.check_and_set_imports(unit)?;
        }
        if let Some(enclosing) = enclosing {
            self.connect_type_hierarchy(enclosing)?;
        }
        if self
            .reference(ty)
            .is_some_and(|binding| binding.tags.contains(TypeTags::BEGIN_HIERARCHY_CHECK))
        {
            return Ok(());
        }

        if let Some(binding) = self.reference_mut(ty) {
            binding.tags |= TypeTags::BEGIN_HIERARCHY_CHECK | TypeTags::HIERARCHY_BEING_CONNECTED;
        }
        trace!(ty = %self.type_name(ty), "connecting type hierarchy");
        let mut no_problems = self.connect_superclass(ty)?;
        no_problems &= self.connect_mixins(ty)?;
        if let Some(binding) = self.reference_mut(ty) {
            binding.tags -= TypeTags::HIERARCHY_BEING_CONNECTED;
            binding.tags |= TypeTags::END_HIERARCHY_CHECK;
        }

        if no_problems && self.has_hierarchy_problems(ty) && self.options.report_hierarchy_problems {
            let span = self.source_span(ty);
            let args = [self.type_name(ty)];
            self.report(ReferenceContext::Type(ty), diagnostic_codes::HIERARCHY_HAS_PROBLEMS, span, &args);
        }
        Ok(())
    }

    fn source_span(&self, ty: TypeId) -> Option<Span> {
        self.reference(ty)
            .and_then(|binding| binding.provenance.as_source())
            .map(|origin| origin.decl.span)
    }

    fn set_superclass(&mut self, ty: TypeId, superclass: TypeId, problems: bool) {
        if let Some(binding) = self.reference_mut(ty) {
            binding.superclass = Some(superclass);
            if problems {
                binding.tags |= TypeTags::HIERARCHY_HAS_PROBLEMS;
            }
        }
    }

    /// Answers whether the declared superclass was connected. Otherwise the
    /// type extends the root object type and has hierarchy problems.
    fn connect_superclass(&mut self, ty: TypeId) -> LookupResult<bool> {
        let Some(origin) = self.reference(ty).and_then(|binding| binding.provenance.as_source()) else {
            return Ok(true);
        };
        let class_scope = origin.class_scope;
        let span = origin.decl.span;
        let declared = origin
            .decl
            .superclass
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        let object = self.object_type;
        let Some(name) = declared else {
            self.set_superclass(ty, object, false);
            return Ok(true);
        };
        match self.find_supertype(ty, &name, class_scope, span)? {
            Some(superclass)
                if !self
                    .reference(ty)
                    .is_some_and(|binding| binding.tags.contains(TypeTags::HIERARCHY_CYCLE)) =>
            {
                self.set_superclass(ty, superclass, false);
                trace!(ty = %self.type_name(ty), superclass = %self.type_name(superclass), "connected superclass");
                Ok(true)
            }
            _ => {
                self.set_superclass(ty, object, true);
                Ok(false)
            }
        }
    }

    /// Resolve a superclass name from the scope around the class. `None`
    /// when the name does not denote a usable type or a cycle was found.
    fn find_supertype(
        &mut self,
        ty: TypeId,
        name: &str,
        class_scope: ScopeId,
        span: Span,
    ) -> LookupResult<Option<TypeId>> {
        let compound = self.interner.intern_dotted(name);
        self.record_qualified_reference(class_scope, &compound);
        let lookup_scope = self.parent_scope(class_scope).unwrap_or(class_scope);
        let binding = self.get_type_compound(lookup_scope, &compound)?;
        let found = match &binding {
            Binding::Type(found) => Some(*found),
            Binding::Problem(problem)
                if matches!(
                    problem.reason,
                    ProblemReason::NotVisible | ProblemReason::InternalNameProvided
                ) =>
            {
                problem.closest_match.as_ref().and_then(Binding::as_type)
            }
            _ => None,
        };
        let superclass = match found {
            Some(found) if self.reference(found).is_some() && !self.is_missing_type(found) => found,
            _ => {
                let args = [self.type_name(ty), name.to_string()];
                self.report(ReferenceContext::Type(ty), diagnostic_codes::SUPERCLASS_NOT_FOUND, Some(span), &args);
                return Ok(None);
            }
        };
        if self.detect_hierarchy_cycle(ty, superclass, span)? {
            return Ok(None);
        }
        Ok(Some(superclass))
    }

    /// Answer whether making `superclass` the super of `source` closes a
    /// cycle, reporting it once. Problems of the superclass propagate to
    /// `source`.
    fn detect_hierarchy_cycle(&mut self, source: TypeId, superclass: TypeId, span: Span) -> LookupResult<bool> {
        if superclass == source || self.is_linked_with(source, superclass) {
            self.report_circularity(source, superclass, span);
            return Ok(true);
        }

        let mut enclosing = self.reference(superclass).and_then(|binding| binding.enclosing_type);
        let mut steps = 0;
        while let Some(outer) = enclosing {
            let being_connected = self
                .reference(outer)
                .is_some_and(ReferenceBinding::is_hierarchy_being_connected);
            if outer == source && being_connected {
                self.report_circularity(source, outer, span);
                return Ok(true);
            }
            enclosing = self.reference(outer).and_then(|binding| binding.enclosing_type);
            steps += 1;
            if steps > MAX_HIERARCHY_WALK {
                break;
            }
        }

        let Some(binding) = self.reference(superclass) else {
            return Ok(false);
        };
        if matches!(binding.provenance, Provenance::Source(_)) {
            if binding.is_hierarchy_being_connected() {
                self.report_circularity(source, superclass, span);
                return Ok(true);
            }
            if !binding
                .tags
                .intersects(TypeTags::BEGIN_HIERARCHY_CHECK | TypeTags::END_HIERARCHY_CHECK)
            {
                self.connect_type_hierarchy(superclass)?;
            }
            if self
                .reference(source)
                .is_some_and(|binding| binding.tags.contains(TypeTags::HIERARCHY_CYCLE))
            {
                return Ok(true);
            }
            self.propagate_hierarchy_problems(source, superclass);
            return Ok(false);
        }

        let mut visited = FxHashSet::default();
        let mut current = self.superclass(superclass)?;
        while let Some(candidate) = current {
            if !visited.insert(candidate) || visited.len() > MAX_HIERARCHY_WALK {
                break;
            }
            let being_connected = self
                .reference(candidate)
                .is_some_and(ReferenceBinding::is_hierarchy_being_connected);
            if candidate == source || self.is_linked_with(source, candidate) || being_connected {
                self.report_circularity(source, superclass, span);
                return Ok(true);
            }
            current = self.superclass(candidate)?;
        }
        self.propagate_hierarchy_problems(source, superclass);
        Ok(false)
    }

    fn propagate_hierarchy_problems(&mut self, source: TypeId, superclass: TypeId) {
        if self.has_hierarchy_problems(superclass)
            && let Some(binding) = self.reference_mut(source)
        {
            binding.tags |= TypeTags::HIERARCHY_HAS_PROBLEMS;
        }
    }

    fn report_circularity(&mut self, source: TypeId, through: TypeId, span: Span) {
        debug!(ty = %self.type_name(source), through = %self.type_name(through), "hierarchy cycle");
        let args = [self.type_name(source), self.type_name(through)];
        self.report(ReferenceContext::Type(source), diagnostic_codes::HIERARCHY_CIRCULARITY, Some(span), &args);
        for ty in [source, through] {
            if let Some(binding) = self.reference_mut(ty) {
                binding.tags |= TypeTags::HIERARCHY_CYCLE | TypeTags::HIERARCHY_HAS_PROBLEMS;
            }
        }
    }

    // =========================================================================
    // Mixins
    // =========================================================================

    /// Merge the instance members of every mixed-in source type (all of its
    /// linked declarations) into this type's declaration. A mixin name that
    /// does not resolve is reported and leaves the hierarchy with problems.
    /// Members already built are not touched again.
    fn connect_mixins(&mut self, ty: TypeId) -> LookupResult<bool> {
        let Some(origin) = self.reference(ty).and_then(|binding| binding.provenance.as_source()) else {
            return Ok(true);
        };
        if origin.decl.mixins.is_empty() {
            return Ok(true);
        }
        let mixins = origin.decl.mixins.clone();
        let class_scope = origin.class_scope;
        let span = origin.decl.span;
        let lookup_scope = self.parent_scope(class_scope).unwrap_or(class_scope);

        let mut no_problems = true;
        let mut merged: Vec<Arc<InferredTypeDecl>> = Vec::new();
        for name in &mixins {
            let compound = self.interner.intern_dotted(name);
            let binding = self.get_type_compound(lookup_scope, &compound)?;
            let Some(mixin) = binding.as_type().filter(|mixin| !self.is_missing_type(*mixin)) else {
                self.report(
                    ReferenceContext::Type(ty),
                    diagnostic_codes::UNDEFINED_TYPE,
                    Some(span),
                    &[name.clone()],
                );
                if let Some(binding) = self.reference_mut(ty) {
                    binding.tags |= TypeTags::HIERARCHY_HAS_PROBLEMS;
                }
                no_problems = false;
                continue;
            };
            if mixin == ty || self.is_linked_with(ty, mixin) {
                continue;
            }
            self.perform_action_on_linked_bindings(mixin, |env, linked| {
                if let Some(origin) = env.reference(linked).and_then(|binding| binding.provenance.as_source()) {
                    merged.push(Arc::clone(&origin.decl));
                }
                true
            });
        }
        if !merged.is_empty() {
            self.mix_in(ty, &merged);
        }
        Ok(no_problems)
    }

    fn mix_in(&mut self, ty: TypeId, mixins: &[Arc<InferredTypeDecl>]) {
        let Some(origin) = self.reference(ty).and_then(|binding| binding.provenance.as_source()) else {
            return;
        };
        let build = &origin.build;
        if build.fields_built || build.built_all || build.building_all || !build.built.is_empty() {
            trace!(ty = %self.type_name(ty), "members already built, mixins ignored");
            return;
        }
        let class_scope = origin.class_scope;
        let mut decl = InferredTypeDecl::clone(&origin.decl);
        let mut method_scopes = origin.method_scopes.clone();

        let mut added_methods = Vec::new();
        for mixin in mixins {
            for field in mixin.fields.iter().filter(|field| !is_static_decl(&field.modifiers)) {
                decl.fields.retain(|existing| existing.name != field.name);
                decl.fields.push(field.clone());
            }
            for method in mixin.methods.iter().filter(|method| !method.is_constructor) {
                if is_static_decl(&method.modifiers) {
                    continue;
                }
                if let Some(index) = decl
                    .methods
                    .iter()
                    .position(|existing| existing.selector() == method.selector())
                {
                    decl.methods.remove(index);
                    if index < method_scopes.len() {
                        method_scopes.remove(index);
                    }
                }
                decl.methods.push(method.clone());
                added_methods.push(method.clone());
            }
        }
        method_scopes.extend(self.build_method_scopes(class_scope, &added_methods, false));
        debug!(ty = %self.type_name(ty), mixins = mixins.len(), "mixed in members");

        let decl = Arc::new(decl);
        if let ScopeData::Class(class) = &mut self.scope_mut(class_scope).data {
            class.decl = Arc::clone(&decl);
        }
        if let Some(origin) = self
            .reference_mut(ty)
            .and_then(|binding| binding.provenance.as_source_mut())
        {
            origin.decl = decl;
            origin.method_scopes = method_scopes;
        }
    }
}

fn is_static_decl(modifiers: &[ModifierKeyword]) -> bool {
    modifiers.contains(&ModifierKeyword::Static)
}

fn type_tags(decl: &InferredTypeDecl, site: TypeSite) -> TypeTags {
    let mut tags = TypeTags::empty();
    if site.enclosing.is_some() && !site.is_local {
        tags |= TypeTags::IS_MEMBER_TYPE;
    }
    if site.is_local {
        tags |= TypeTags::IS_LOCAL_TYPE;
    }
    if decl.is_anonymous {
        tags |= TypeTags::IS_ANONYMOUS_TYPE;
    }
    if decl.is_object_literal {
        tags |= TypeTags::IS_OBJECT_LITERAL;
    }
    if decl.is_indexed {
        tags |= TypeTags::IS_INDEXED;
    }
    if decl.member_types.is_empty() {
        tags |= TypeTags::HAS_NO_MEMBER_TYPES;
    }
    tags
}

#[cfg(test)]
#[path = "../tests/class_scope_tests.rs"]
mod tests;

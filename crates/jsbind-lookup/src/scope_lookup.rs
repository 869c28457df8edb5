//! Name resolution through the scope tree.
//!
//! A simple name is looked up innermost scope first: locals and local
//! functions of blocks and methods, then the fields and member types of
//! each enclosing class, then the unit. At the unit root a name falls back
//! through the unit's own types, single-type imports, the current package,
//! on-demand imports, the default package and finally the top-level
//! packages. The first valid binding wins; a problem found on the way is
//! kept and answered only when nothing better turns up.

use jsbind_common::Atom;
use tracing::trace;

use crate::binding::{Binding, BindingMask, ImportBinding, ProblemBinding, ProblemKind, ProblemReason};
use crate::environment::LookupEnvironment;
use crate::error::LookupResult;
use crate::ids::{MethodId, PackageId, ScopeId, TypeId, UnitId};
use crate::scope::{InvocationSite, ScopeData};

/// A field found in an enclosing class that is not yet known to be the
/// final answer.
struct FoundField {
    binding: Binding,
    depth: u32,
    receiver: TypeId,
    inside_problem: Option<ProblemReason>,
}

fn problem_with_closest(
    name: Vec<Atom>,
    reason: ProblemReason,
    kind: ProblemKind,
    closest: Binding,
) -> Binding {
    Binding::Problem(Box::new(
        ProblemBinding::new(name, reason, kind).with_closest_match(closest),
    ))
}

/// Rename a problem to the prefix that failed.
fn with_problem_name(binding: Binding, name: &[Atom]) -> Binding {
    match binding {
        Binding::Problem(mut problem) => {
            problem.name = name.to_vec();
            Binding::Problem(problem)
        }
        other => other,
    }
}

impl LookupEnvironment {
    // =========================================================================
    // Simple names
    // =========================================================================

    /// Binding of the simple name `name` seen from `scope`, restricted to
    /// the categories in `mask`. `site` receives the number of class
    /// boundaries crossed and the receiver of a field found in an
    /// enclosing class.
    pub fn get_binding(
        &mut self,
        scope: ScopeId,
        name: Atom,
        mask: BindingMask,
        site: &mut InvocationSite,
    ) -> LookupResult<Binding> {
        self.check_cancelled()?;
        let chain: Vec<ScopeId> = self.scope_chain(scope).collect();
        let compliant = self.options.is_compliant_1_4();
        let mut depth = 0u32;
        let mut inside_static = false;
        let mut inside_constructor_call = false;
        let mut problem: Option<Binding> = None;
        let mut found_field: Option<FoundField> = None;

        for id in chain {
            let (class_type, is_unit) = match &self.scope(id).data {
                ScopeData::Method(method) => {
                    inside_static |= method.is_static;
                    inside_constructor_call |= method.is_constructor_call;
                    (None, false)
                }
                ScopeData::Block(_) => (None, false),
                ScopeData::Class(class) => (Some(class.ty), false),
                ScopeData::Unit(_) => (None, true),
            };
            if is_unit {
                break;
            }

            let Some(receiver) = class_type else {
                if mask.contains(BindingMask::LOCAL)
                    && let Some(local) = self.find_variable(id, name)
                {
                    if let Some(found) = &found_field
                        && found.binding.is_valid()
                    {
                        return Ok(problem_with_closest(
                            vec![name],
                            ProblemReason::InheritedNameHidesEnclosingName,
                            ProblemKind::Field,
                            found.binding.clone(),
                        ));
                    }
                    site.depth = depth;
                    return Ok(Binding::Variable(local));
                }
                if mask.contains(BindingMask::METHOD)
                    && let Some(binding) = self.find_local_method(id, name, false)?
                {
                    site.depth = depth;
                    return Ok(binding);
                }
                if mask.contains(BindingMask::TYPE)
                    && let Some(ty) = self.find_local_type(id, name, scope)
                {
                    self.record_type_reference(scope, ty);
                    return Ok(Binding::Type(ty));
                }
                continue;
            };

            if mask.contains(BindingMask::FIELD)
                && let Some(field_binding) = self.find_field(scope, receiver, name, site)?
            {
                let mut inside_problem = None;
                if let Some(field) = field_binding.as_field() {
                    let binding = &self.fields[field.index()];
                    let (is_static, declaring) = (binding.is_static(), binding.declaring_class);
                    if !is_static {
                        if inside_constructor_call {
                            inside_problem = Some(ProblemReason::NonStaticReferenceInConstructorInvocation);
                        } else if inside_static {
                            inside_problem = Some(ProblemReason::NonStaticReferenceInStaticContext);
                        }
                    }
                    if receiver == declaring || self.is_linked_with(receiver, declaring) || compliant {
                        match &found_field {
                            None => {
                                site.depth = depth;
                                site.actual_receiver = Some(receiver);
                                return Ok(self.field_with_problem(name, field_binding, inside_problem));
                            }
                            Some(found) => {
                                let found_declaring = found
                                    .binding
                                    .as_field()
                                    .map(|field| self.fields[field.index()].declaring_class);
                                if found.binding.is_valid() && found_declaring != Some(declaring) {
                                    return Ok(problem_with_closest(
                                        vec![name],
                                        ProblemReason::InheritedNameHidesEnclosingName,
                                        ProblemKind::Field,
                                        found.binding.clone(),
                                    ));
                                }
                            }
                        }
                    }
                }
                let replace = match &found_field {
                    None => true,
                    Some(found) => {
                        found.binding.problem_reason() == Some(ProblemReason::NotVisible)
                            && field_binding.problem_reason() != Some(ProblemReason::NotVisible)
                    }
                };
                if replace {
                    found_field = Some(FoundField {
                        binding: field_binding,
                        depth,
                        receiver,
                        inside_problem,
                    });
                }
            }

            if mask.contains(BindingMask::METHOD)
                && let Some(method) = self.first_method_named(receiver, name)?
            {
                site.depth = depth;
                site.actual_receiver = Some(receiver);
                return Ok(Binding::Method(method));
            }

            if mask.contains(BindingMask::TYPE) {
                if self.reference(receiver).is_some_and(|binding| binding.source_name == name) {
                    return Ok(Binding::Type(receiver));
                }
                match self.find_member_type(scope, receiver, name)? {
                    Some(binding @ Binding::Type(_)) => return Ok(binding),
                    Some(binding) => {
                        problem.get_or_insert(binding);
                    }
                    None => {}
                }
            }

            depth += 1;
            inside_static |= self
                .reference(receiver)
                .is_some_and(|binding| binding.modifiers.is_static());
        }

        if let Some(found) = found_field {
            if found.binding.is_valid() {
                site.depth = found.depth;
                site.actual_receiver = Some(found.receiver);
                return Ok(self.field_with_problem(name, found.binding, found.inside_problem));
            }
            problem.get_or_insert(found.binding);
        }

        if let Some(binding) = self.get_unit_binding(scope, name, mask, site)? {
            if binding.is_valid() {
                return Ok(binding);
            }
            problem.get_or_insert(binding);
        }

        trace!(name = %self.resolve_atom(name), "name not found");
        Ok(problem.unwrap_or_else(|| {
            let kind = if mask == BindingMask::TYPE {
                ProblemKind::Type
            } else {
                ProblemKind::Name
            };
            Binding::problem(vec![name], ProblemReason::NotFound, kind)
        }))
    }

    fn field_with_problem(&self, name: Atom, field: Binding, reason: Option<ProblemReason>) -> Binding {
        match reason {
            Some(reason) => problem_with_closest(vec![name], reason, ProblemKind::Field, field),
            None => field,
        }
    }

    /// Lookups that happen at the unit root: unit-level variables and
    /// functions, types and packages, bindings other units registered in
    /// the package, then members of the global super type.
    fn get_unit_binding(
        &mut self,
        scope: ScopeId,
        name: Atom,
        mask: BindingMask,
        site: &mut InvocationSite,
    ) -> LookupResult<Option<Binding>> {
        let unit_scope = self.unit_scope_of(scope);
        self.record_simple_reference(scope, name);
        let mut problem = None;

        if mask.contains(BindingMask::LOCAL)
            && let Some(local) = self.find_variable(unit_scope, name)
        {
            return Ok(Some(Binding::Variable(local)));
        }
        if mask.contains(BindingMask::METHOD)
            && let Some(binding) = self.find_local_method(unit_scope, name, false)?
        {
            return Ok(Some(binding));
        }

        if mask.intersects(BindingMask::TYPE | BindingMask::PACKAGE) {
            let binding = self.get_type_or_package(scope, name, mask & (BindingMask::TYPE | BindingMask::PACKAGE))?;
            if binding.is_valid() {
                return Ok(Some(binding));
            }
            if binding.problem_reason() != Some(ProblemReason::NotFound) {
                problem = Some(binding);
            }
        }

        let value_mask = mask & (BindingMask::METHOD | BindingMask::VARIABLE);
        if !value_mask.is_empty() {
            let package = self.current_package(scope);
            if let Some(binding) = self.package_value_binding(package, name, value_mask)? {
                return Ok(Some(binding));
            }
            if package != self.default_package
                && let Some(binding) = self.package_value_binding(self.default_package, name, value_mask)?
            {
                return Ok(Some(binding));
            }

            let unit = self.unit_of_scope(unit_scope);
            if let Some(unit) = unit
                && let Some(superclass) = self.build_super_type(unit)?
                && superclass != self.object_type
            {
                let receiver = self.units[unit.index()].unit_type;
                if mask.contains(BindingMask::FIELD)
                    && let Some(field) = self.get_field_in_hierarchy(superclass, name)?
                {
                    site.actual_receiver = Some(receiver);
                    return Ok(Some(Binding::Field(field)));
                }
                if mask.contains(BindingMask::METHOD)
                    && let Some(method) = self.first_method_named(superclass, name)?
                {
                    site.actual_receiver = Some(receiver);
                    return Ok(Some(Binding::Method(method)));
                }
            }
        }
        Ok(problem)
    }

    fn package_value_binding(
        &mut self,
        package: PackageId,
        name: Atom,
        mask: BindingMask,
    ) -> LookupResult<Option<Binding>> {
        Ok(self
            .package_get_type_or_package(package, name, mask)?
            .filter(|binding| binding.mask().intersects(mask)))
    }

    pub(crate) fn unit_of_scope(&self, scope: ScopeId) -> Option<UnitId> {
        self.unit_scope_data(scope).map(|unit| unit.unit)
    }

    /// First method named `name` on `ty` or one of its superclasses.
    fn first_method_named(&mut self, ty: TypeId, name: Atom) -> LookupResult<Option<MethodId>> {
        let mut chain = vec![ty];
        chain.extend(self.superclass_chain(ty)?);
        for candidate in chain {
            if let Some(method) = self.get_methods(candidate, name)?.first() {
                return Ok(Some(*method));
            }
        }
        Ok(None)
    }

    // =========================================================================
    // Types and packages
    // =========================================================================

    /// Type or package named `name` seen from `scope`. Local types and the
    /// member types of enclosing classes come first, then the unit's
    /// fallback order.
    pub fn get_type_or_package(&mut self, scope: ScopeId, name: Atom, mask: BindingMask) -> LookupResult<Binding> {
        let chain: Vec<ScopeId> = self.scope_chain(scope).collect();
        let mut problem: Option<Binding> = None;

        if mask.contains(BindingMask::TYPE) {
            for id in chain {
                match &self.scope(id).data {
                    ScopeData::Block(_) | ScopeData::Method(_) => {
                        if let Some(ty) = self.find_local_type(id, name, scope) {
                            self.record_type_reference(scope, ty);
                            return Ok(Binding::Type(ty));
                        }
                    }
                    ScopeData::Class(class) => {
                        let ty = class.ty;
                        if self.reference(ty).is_some_and(|binding| binding.source_name == name) {
                            return Ok(Binding::Type(ty));
                        }
                        match self.find_member_type(scope, ty, name)? {
                            Some(binding @ Binding::Type(_)) => return Ok(binding),
                            Some(binding) => {
                                problem.get_or_insert(binding);
                            }
                            None => {}
                        }
                    }
                    ScopeData::Unit(_) => break,
                }
            }
        }

        let binding = self.unit_type_or_package(scope, name, mask)?;
        if binding.is_valid() {
            if let Some(ty) = binding.as_type() {
                self.record_type_reference(scope, ty);
            }
            return Ok(binding);
        }
        Ok(problem.unwrap_or(binding))
    }

    /// Unit root fallback order for a type or package name.
    fn unit_type_or_package(&mut self, scope: ScopeId, name: Atom, mask: BindingMask) -> LookupResult<Binding> {
        let unit_scope = self.unit_scope_of(scope);
        if let Some(unit) = self.unit_of_scope(unit_scope) {
            self.check_and_set_imports(unit)?;
        }
        let kind = if mask.contains(BindingMask::TYPE) {
            ProblemKind::Type
        } else {
            ProblemKind::Name
        };
        let mut problem: Option<Binding> = None;

        if mask.contains(BindingMask::TYPE) {
            let (top_level, cached) = match self.scope(unit_scope).as_unit() {
                Some(unit) => (
                    unit.top_level_types.clone(),
                    unit.type_or_package_cache
                        .as_ref()
                        .and_then(|cache| cache.get(&name).cloned()),
                ),
                None => (Vec::new(), None),
            };
            if let Some(ty) = top_level
                .into_iter()
                .find(|ty| self.reference(*ty).is_some_and(|binding| binding.source_name == name))
            {
                return Ok(Binding::Type(ty));
            }
            if let Some(cached) = cached {
                return Ok(cached);
            }

            let package = self.current_package(scope);
            if let Some(binding) = self.package_get_type(package, name)? {
                if binding.is_valid() {
                    self.cache_type_or_package(unit_scope, name, &binding);
                    return Ok(binding);
                }
                problem.get_or_insert(binding);
            }

            if let Some(binding) = self.find_on_demand_import(scope, name)? {
                if binding.is_valid() {
                    self.cache_type_or_package(unit_scope, name, &binding);
                    return Ok(binding);
                }
                problem.get_or_insert(binding);
            }

            let default_package = self.default_package;
            if package != default_package
                && let Some(binding) = self.package_get_type(default_package, name)?
                && binding.is_valid()
            {
                self.cache_type_or_package(unit_scope, name, &binding);
                return Ok(binding);
            }
        }

        if mask.contains(BindingMask::PACKAGE)
            && let Some(package) = self.get_top_level_package(name)
        {
            return Ok(Binding::Package(package));
        }

        Ok(problem.unwrap_or_else(|| Binding::problem(vec![name], ProblemReason::NotFound, kind)))
    }

    /// Search the on-demand imports. The same simple name reachable through
    /// two different imports is ambiguous; a type the unit cannot see is
    /// kept as a `NotVisible` problem.
    fn find_on_demand_import(&mut self, scope: ScopeId, name: Atom) -> LookupResult<Option<Binding>> {
        let imports: Vec<ImportBinding> = self
            .scope(self.unit_scope_of(scope))
            .as_unit()
            .and_then(|unit| unit.imports.clone())
            .unwrap_or_default();
        let mut found: Option<TypeId> = None;
        let mut problem: Option<Binding> = None;
        for import in imports.iter().filter(|import| import.on_demand) {
            let candidate = match &import.resolved {
                Some(Binding::Package(package)) => self
                    .package_get_type(*package, name)?
                    .and_then(|binding| binding.as_type()),
                Some(Binding::Type(ty)) => self.member_type(*ty, name)?,
                Some(Binding::CompilationUnit(unit)) => self.unit_top_level_type(*unit, name),
                _ => None,
            };
            let Some(candidate) = candidate else {
                continue;
            };
            if !self.can_type_be_seen_by(candidate, scope) {
                problem.get_or_insert_with(|| {
                    problem_with_closest(vec![name], ProblemReason::NotVisible, ProblemKind::Type, Binding::Type(candidate))
                });
                continue;
            }
            match found {
                Some(existing) if existing != candidate => {
                    return Ok(Some(problem_with_closest(
                        vec![name],
                        ProblemReason::Ambiguous,
                        ProblemKind::Type,
                        Binding::Type(existing),
                    )));
                }
                _ => found = Some(candidate),
            }
        }
        Ok(found.map(Binding::Type).or(problem))
    }

    fn unit_top_level_type(&self, unit: UnitId, name: Atom) -> Option<TypeId> {
        let scope = self.units.get(unit.index())?.scope;
        self.scope(scope)
            .as_unit()?
            .top_level_types
            .iter()
            .copied()
            .find(|ty| self.reference(*ty).is_some_and(|binding| binding.source_name == name))
    }

    fn cache_type_or_package(&mut self, unit_scope: ScopeId, name: Atom, binding: &Binding) {
        if let Some(unit) = self.scope_mut(unit_scope).as_unit_mut()
            && let Some(cache) = unit.type_or_package_cache.as_mut()
        {
            cache.entry(name).or_insert_with(|| binding.clone());
        }
    }

    /// Member type `name` of `receiver` or one of its superclasses. A member
    /// type the scope cannot see is answered as a `NotVisible` problem.
    pub fn find_member_type(
        &mut self,
        scope: ScopeId,
        receiver: TypeId,
        name: Atom,
    ) -> LookupResult<Option<Binding>> {
        let mut chain = vec![receiver];
        chain.extend(self.superclass_chain(receiver)?);
        for ty in chain {
            if let Some(member) = self.member_type(ty, name)? {
                if self.can_type_be_seen_by(member, scope) {
                    return Ok(Some(Binding::Type(member)));
                }
                return Ok(Some(
                    Binding::Problem(Box::new(
                        ProblemBinding::new(vec![name], ProblemReason::NotVisible, ProblemKind::Type)
                            .with_closest_match(Binding::Type(member))
                            .with_searched_type(receiver),
                    )),
                ));
            }
        }
        Ok(None)
    }

    // =========================================================================
    // Compound names
    // =========================================================================

    /// Type named by a possibly qualified name. On failure the problem's
    /// name is the prefix up to and including the segment that failed.
    pub fn get_type_compound(&mut self, scope: ScopeId, compound: &[Atom]) -> LookupResult<Binding> {
        let Some((&first, rest)) = compound.split_first() else {
            return Ok(Binding::problem(Vec::new(), ProblemReason::NotFound, ProblemKind::Type));
        };
        if rest.is_empty() {
            return self.get_type_or_package(scope, first, BindingMask::TYPE);
        }
        self.record_qualified_reference(scope, compound);

        let mut current = self.get_type_or_package(scope, first, BindingMask::TYPE | BindingMask::PACKAGE)?;
        if !current.is_valid() {
            if let Some(binding) = self.get_type(compound)?
                && let Some(ty) = binding.as_type()
                && !self.is_missing_type(ty)
            {
                return Ok(binding);
            }
            return Ok(with_problem_name(current, &compound[..1]));
        }

        for (index, &segment) in rest.iter().enumerate() {
            let prefix = &compound[..index + 2];
            current = match current {
                Binding::Package(package) => {
                    match self.package_get_type_or_package(package, segment, BindingMask::TYPE | BindingMask::PACKAGE)? {
                        Some(binding) if binding.is_valid() => binding,
                        Some(binding) => return Ok(with_problem_name(binding, prefix)),
                        None => {
                            return Ok(Binding::problem(prefix.to_vec(), ProblemReason::NotFound, ProblemKind::Type));
                        }
                    }
                }
                Binding::Type(ty) => match self.find_member_type(scope, ty, segment)? {
                    Some(binding) if binding.is_valid() => binding,
                    Some(binding) => return Ok(with_problem_name(binding, prefix)),
                    None => {
                        return Ok(Binding::Problem(Box::new(
                            ProblemBinding::new(prefix.to_vec(), ProblemReason::NotFound, ProblemKind::Type)
                                .with_searched_type(ty),
                        )));
                    }
                },
                other => return Ok(with_problem_name(other, &compound[..=index])),
            };
        }

        match current {
            Binding::Type(ty) => {
                self.record_type_reference(scope, ty);
                Ok(Binding::Type(ty))
            }
            Binding::Package(package) => Ok(problem_with_closest(
                compound.to_vec(),
                ProblemReason::NotFound,
                ProblemKind::Type,
                Binding::Package(package),
            )),
            other => Ok(other),
        }
    }

    /// Binding of a qualified name such as `a.b.c`: the first segment is
    /// looked up like a simple name, every following one as a sub-package,
    /// member type or field of what came before.
    pub fn get_binding_compound(
        &mut self,
        scope: ScopeId,
        compound: &[Atom],
        mask: BindingMask,
        site: &mut InvocationSite,
    ) -> LookupResult<Binding> {
        let Some((&first, rest)) = compound.split_first() else {
            return Ok(Binding::problem(Vec::new(), ProblemReason::NotFound, ProblemKind::Name));
        };
        if rest.is_empty() {
            return self.get_binding(scope, first, mask, site);
        }
        self.record_qualified_reference(scope, compound);

        let first_mask = BindingMask::VARIABLE | BindingMask::TYPE | BindingMask::PACKAGE;
        let mut current = self.get_binding(scope, first, first_mask, site)?;
        if !current.is_valid() {
            return Ok(with_problem_name(current, &compound[..1]));
        }

        for (index, &segment) in rest.iter().enumerate() {
            let prefix = &compound[..index + 2];
            let is_last = index + 1 == rest.len();
            let next = match current {
                Binding::Package(package) => {
                    let mut segment_mask = BindingMask::TYPE | BindingMask::PACKAGE;
                    if is_last {
                        segment_mask |= mask & (BindingMask::METHOD | BindingMask::VARIABLE);
                    }
                    self.package_get_type_or_package(package, segment, segment_mask)?
                }
                Binding::Type(ty) => match self.find_field(scope, ty, segment, site)? {
                    Some(field) if field.is_valid() => Some(field),
                    field => match self.find_member_type(scope, ty, segment)? {
                        Some(member) => Some(member),
                        None => field,
                    },
                },
                Binding::Field(field) => {
                    let ty = self.field_type(field)?;
                    self.find_field(scope, ty, segment, site)?
                }
                Binding::Variable(local) => {
                    let ty = self.local_type(local)?;
                    self.find_field(scope, ty, segment, site)?
                }
                _ => None,
            };
            current = match next {
                Some(binding) if binding.is_valid() => binding,
                Some(binding) => return Ok(with_problem_name(binding, prefix)),
                None => return Ok(Binding::problem(prefix.to_vec(), ProblemReason::NotFound, ProblemKind::Name)),
            };
        }

        if current.mask().intersects(mask) {
            Ok(current)
        } else {
            Ok(problem_with_closest(
                compound.to_vec(),
                ProblemReason::NotFound,
                ProblemKind::Name,
                current,
            ))
        }
    }

    // =========================================================================
    // Fields
    // =========================================================================

    /// Field `name` reachable through `receiver`, nearest declaration
    /// first. `None` when no type in the hierarchy declares it; a problem
    /// when the receiver or every declaration is out of sight.
    pub fn find_field(
        &mut self,
        scope: ScopeId,
        receiver: TypeId,
        name: Atom,
        site: &InvocationSite,
    ) -> LookupResult<Option<Binding>> {
        let receiver = self.resolve_type(receiver)?;
        if self.reference(receiver).is_none() {
            return Ok(None);
        }
        self.record_type_reference(scope, receiver);
        if !self.can_type_be_seen_by(receiver, scope) {
            return Ok(Some(Binding::Problem(Box::new(
                ProblemBinding::new(vec![name], ProblemReason::ReceiverTypeNotVisible, ProblemKind::Field)
                    .with_closest_match(Binding::Type(receiver))
                    .with_searched_type(receiver),
            ))));
        }

        let mut chain = vec![receiver];
        chain.extend(self.superclass_chain(receiver)?);
        let mut problem = None;
        for ty in chain {
            let Some(field) = self.get_field(ty, name)? else {
                continue;
            };
            if self.can_field_be_seen_by(field, site, scope)? {
                return Ok(Some(Binding::Field(field)));
            }
            problem.get_or_insert_with(|| {
                Binding::Problem(Box::new(
                    ProblemBinding::new(vec![name], ProblemReason::NotVisible, ProblemKind::Field)
                        .with_closest_match(Binding::Field(field))
                        .with_searched_type(receiver),
                ))
            });
        }
        Ok(problem)
    }
}

#[cfg(test)]
#[path = "../tests/scope_lookup_tests.rs"]
mod tests;

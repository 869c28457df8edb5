//! Method and constructor resolution.
//!
//! Candidates are collected from the receiver and its superclasses, then
//! ranked by the compatibility ladder: plain compatibility first, then
//! autoboxing, then varargs. The first level with a visible candidate
//! decides. Several candidates on that level go through the most specific
//! check, and a tie nobody breaks is ambiguous.

use jsbind_common::Atom;
use smallvec::SmallVec;
use tracing::trace;

use crate::binary::INIT;
use crate::binding::{Binding, BindingMask, ProblemBinding, ProblemKind, ProblemReason};
use crate::compat::CompatibilityLevel;
use crate::environment::LookupEnvironment;
use crate::error::LookupResult;
use crate::ids::{MethodId, ScopeId, TypeId};
use crate::modifiers::Modifiers;
use crate::scope::{InvocationSite, ScopeData};
use crate::symbols::{LazyType, MethodBinding, MethodKind};

fn method_problem(
    selector: Atom,
    reason: ProblemReason,
    receiver: Option<TypeId>,
    arguments: &[TypeId],
    closest: Option<MethodId>,
) -> Binding {
    let mut problem = ProblemBinding::new(vec![selector], reason, ProblemKind::Method).with_arguments(arguments);
    if let Some(receiver) = receiver {
        problem = problem.with_searched_type(receiver);
    }
    if let Some(closest) = closest {
        problem = problem.with_closest_match(Binding::Method(closest));
    }
    Binding::Problem(Box::new(problem))
}

impl LookupEnvironment {
    // =========================================================================
    // Qualified calls
    // =========================================================================

    /// Method `selector` of `receiver` that best fits `arguments`.
    pub fn find_method(
        &mut self,
        scope: ScopeId,
        receiver: TypeId,
        selector: Atom,
        arguments: &[TypeId],
        site: &InvocationSite,
    ) -> LookupResult<Binding> {
        self.check_cancelled()?;
        let receiver = self.resolve_type(receiver)?;
        self.record_type_reference(scope, receiver);
        if !self.can_type_be_seen_by(receiver, scope) {
            return Ok(method_problem(
                selector,
                ProblemReason::ReceiverTypeNotVisible,
                Some(receiver),
                arguments,
                None,
            ));
        }
        let candidates = self.collect_methods(receiver, selector)?;
        if candidates.is_empty() {
            return Ok(method_problem(selector, ProblemReason::NotFound, Some(receiver), arguments, None));
        }
        self.rank_candidates(scope, receiver, selector, &candidates, arguments, site)
    }

    /// Every method named `selector` on `receiver` and its superclasses,
    /// nearest first. From compliance 1.4 on, a method overridden lower in
    /// the hierarchy is left out.
    fn collect_methods(&mut self, receiver: TypeId, selector: Atom) -> LookupResult<SmallVec<[MethodId; 4]>> {
        let mut chain = vec![receiver];
        chain.extend(self.superclass_chain(receiver)?);
        let drop_overridden = self.options.is_compliant_1_4();
        let mut found: SmallVec<[MethodId; 4]> = SmallVec::new();
        for ty in chain {
            let declared = self.get_methods(ty, selector)?;
            let known = found.len();
            for method in declared {
                if drop_overridden {
                    let mut overridden = false;
                    for existing in &found[..known] {
                        if self.are_parameters_equal(*existing, method)? {
                            overridden = true;
                            break;
                        }
                    }
                    if overridden {
                        continue;
                    }
                }
                found.push(method);
            }
        }
        Ok(found)
    }

    /// Pick the best of `candidates` for `arguments`.
    fn rank_candidates(
        &mut self,
        scope: ScopeId,
        receiver: TypeId,
        selector: Atom,
        candidates: &[MethodId],
        arguments: &[TypeId],
        site: &InvocationSite,
    ) -> LookupResult<Binding> {
        let mut levels: SmallVec<[CompatibilityLevel; 4]> = SmallVec::with_capacity(candidates.len());
        for method in candidates {
            levels.push(self.parameter_compatibility_level(*method, arguments)?);
        }

        let mut invisible: Option<MethodId> = None;
        for level in CompatibilityLevel::LADDER {
            let mut visible: SmallVec<[MethodId; 4]> = SmallVec::new();
            for (method, method_level) in candidates.iter().zip(&levels) {
                if *method_level != level {
                    continue;
                }
                if self.can_method_be_seen_by(*method, site, scope)? {
                    visible.push(*method);
                } else {
                    invisible.get_or_insert(*method);
                }
            }
            match visible.len() {
                0 => continue,
                1 => return Ok(Binding::Method(visible[0])),
                _ => {
                    trace!(selector = %self.resolve_atom(selector), ?level, count = visible.len(), "choosing most specific method");
                    return self.most_specific_method(receiver, selector, &visible, arguments);
                }
            }
        }

        if let Some(method) = invisible {
            return Ok(method_problem(selector, ProblemReason::NotVisible, Some(receiver), arguments, Some(method)));
        }
        Ok(method_problem(
            selector,
            ProblemReason::NotFound,
            Some(receiver),
            arguments,
            candidates.first().copied(),
        ))
    }

    /// A candidate wins when every other candidate accepts its parameter
    /// list. Winners with identical parameters are overrides of each other;
    /// the one declared lowest in the hierarchy is taken.
    fn most_specific_method(
        &mut self,
        receiver: TypeId,
        selector: Atom,
        candidates: &[MethodId],
        arguments: &[TypeId],
    ) -> LookupResult<Binding> {
        let mut winners: SmallVec<[MethodId; 2]> = SmallVec::new();
        for (index, method) in candidates.iter().enumerate() {
            let parameters = self.method_parameter_types(*method)?;
            let mut beats_all = true;
            for (other_index, other) in candidates.iter().enumerate() {
                if index != other_index && !self.are_parameters_compatible_with(*other, &parameters)? {
                    beats_all = false;
                    break;
                }
            }
            if beats_all {
                winners.push(*method);
            }
        }

        let mut best = match winners.first() {
            Some(first) => *first,
            None => {
                return Ok(method_problem(
                    selector,
                    ProblemReason::Ambiguous,
                    Some(receiver),
                    arguments,
                    candidates.first().copied(),
                ));
            }
        };
        for other in winners.iter().skip(1).copied() {
            let best_class = self.methods[best.index()].declaring_class;
            let other_class = self.methods[other.index()].declaring_class;
            if best_class == other_class || !self.are_parameters_equal(best, other)? {
                return Ok(method_problem(selector, ProblemReason::Ambiguous, Some(receiver), arguments, Some(best)));
            }
            if self.is_superclass_of(best_class, other_class)? {
                best = other;
            } else if !self.is_superclass_of(other_class, best_class)? {
                return Ok(method_problem(selector, ProblemReason::Ambiguous, Some(receiver), arguments, Some(best)));
            }
        }
        Ok(Binding::Method(best))
    }

    /// Like `find_method`, but always answers some method when one with the
    /// selector exists: the one matching the most argument positions, the
    /// nearest declaration on a tie.
    pub fn find_method_best_effort(
        &mut self,
        scope: ScopeId,
        receiver: TypeId,
        selector: Atom,
        arguments: &[TypeId],
        site: &InvocationSite,
    ) -> LookupResult<Option<MethodId>> {
        let binding = self.find_method(scope, receiver, selector, arguments, site)?;
        if let Some(method) = binding.as_method() {
            return Ok(Some(method));
        }
        let receiver = self.resolve_type(receiver)?;
        let candidates = self.collect_methods(receiver, selector)?;
        let mut best: Option<(usize, MethodId)> = None;
        for method in candidates {
            let parameters = self.method_parameter_types(method)?;
            let mut matching = 0;
            for (argument, parameter) in arguments.iter().zip(&parameters) {
                if self.is_compatible_with(*argument, *parameter)? {
                    matching += 1;
                }
            }
            if best.is_none_or(|(score, _)| matching > score) {
                best = Some((matching, method));
            }
        }
        Ok(best.map(|(_, method)| method))
    }

    /// Method of `receiver` whose parameters are exactly `arguments`, if the
    /// scope can see it.
    pub fn find_exact_method(
        &mut self,
        scope: ScopeId,
        receiver: TypeId,
        selector: Atom,
        arguments: &[TypeId],
        site: &InvocationSite,
    ) -> LookupResult<Option<MethodId>> {
        let receiver = self.resolve_type(receiver)?;
        let Some(method) = self.get_exact_method(receiver, selector, arguments)? else {
            return Ok(None);
        };
        if !self.can_type_be_seen_by(receiver, scope) || !self.can_method_be_seen_by(method, site, scope)? {
            return Ok(None);
        }
        Ok(Some(method))
    }

    /// Exact match first, then overload resolution.
    pub fn get_method(
        &mut self,
        scope: ScopeId,
        receiver: TypeId,
        selector: Atom,
        arguments: &[TypeId],
        site: &InvocationSite,
    ) -> LookupResult<Binding> {
        if let Some(method) = self.find_exact_method(scope, receiver, selector, arguments, site)? {
            return Ok(Binding::Method(method));
        }
        self.find_method(scope, receiver, selector, arguments, site)
    }

    // =========================================================================
    // Unqualified calls
    // =========================================================================

    /// Target of the unqualified call `selector(arguments)` made at
    /// `scope`: local functions (and variables holding functions) of the
    /// enclosing blocks, methods of the enclosing classes, unit-level
    /// functions, functions other units registered in the package, then
    /// methods of the global super type.
    pub fn get_implicit_method(
        &mut self,
        scope: ScopeId,
        selector: Atom,
        arguments: &[TypeId],
        site: &mut InvocationSite,
    ) -> LookupResult<Binding> {
        self.check_cancelled()?;
        let chain: Vec<ScopeId> = self.scope_chain(scope).collect();
        let mut depth = 0u32;
        let mut inside_static = false;
        let mut inside_constructor_call = false;
        let mut problem: Option<Binding> = None;

        for id in chain {
            let class_type = match &self.scope(id).data {
                ScopeData::Method(method) => {
                    inside_static |= method.is_static;
                    inside_constructor_call |= method.is_constructor_call;
                    None
                }
                ScopeData::Block(_) => None,
                ScopeData::Class(class) => Some(class.ty),
                ScopeData::Unit(_) => break,
            };

            let Some(receiver) = class_type else {
                if let Some(binding) = self.find_local_method(id, selector, true)? {
                    if binding.is_valid() {
                        site.depth = depth;
                        return Ok(binding);
                    }
                    problem.get_or_insert(binding);
                }
                continue;
            };

            let binding = self.find_method(scope, receiver, selector, arguments, site)?;
            if let Some(method) = binding.as_method() {
                site.depth = depth;
                site.actual_receiver = Some(receiver);
                if !self.methods[method.index()].is_static() {
                    let reason = if inside_constructor_call {
                        Some(ProblemReason::NonStaticReferenceInConstructorInvocation)
                    } else if inside_static {
                        Some(ProblemReason::NonStaticReferenceInStaticContext)
                    } else {
                        None
                    };
                    if let Some(reason) = reason {
                        return Ok(method_problem(selector, reason, Some(receiver), arguments, Some(method)));
                    }
                }
                return Ok(binding);
            }
            if binding.problem_reason() != Some(ProblemReason::NotFound) {
                problem.get_or_insert(binding);
            }
            depth += 1;
            inside_static |= self
                .reference(receiver)
                .is_some_and(|binding| binding.modifiers.is_static());
        }

        let unit_scope = self.unit_scope_of(scope);
        if let Some(binding) = self.find_local_method(unit_scope, selector, true)? {
            if binding.is_valid() {
                return Ok(binding);
            }
            problem.get_or_insert(binding);
        }

        let package = self.current_package(scope);
        let mut packages = vec![package];
        if package != self.default_package {
            packages.push(self.default_package);
        }
        for package in packages {
            match self.package_get_type_or_package(package, selector, BindingMask::METHOD | BindingMask::LOCAL)? {
                Some(Binding::Method(method)) => return Ok(Binding::Method(method)),
                Some(Binding::Variable(local)) => {
                    let ty = self.local_type(local)?;
                    if ty == TypeId::ANY || ty == self.function_type {
                        return Ok(Binding::Method(self.variable_function(scope, local)));
                    }
                    problem.get_or_insert_with(|| {
                        Binding::Problem(Box::new(
                            ProblemBinding::new(vec![selector], ProblemReason::NotAFunction, ProblemKind::Method)
                                .with_closest_match(Binding::Variable(local)),
                        ))
                    });
                }
                _ => {}
            }
        }

        if let Some(unit) = self.unit_of_scope(unit_scope)
            && let Some(superclass) = self.build_super_type(unit)?
            && superclass != self.object_type
        {
            let binding = self.find_method(scope, superclass, selector, arguments, site)?;
            if binding.is_valid() {
                site.actual_receiver = Some(self.units[unit.index()].unit_type);
                return Ok(binding);
            }
            if binding.problem_reason() != Some(ProblemReason::NotFound) {
                problem.get_or_insert(binding);
            }
        }

        Ok(problem.unwrap_or_else(|| method_problem(selector, ProblemReason::NotFound, None, arguments, None)))
    }

    // =========================================================================
    // Constructors
    // =========================================================================

    /// Constructor of `receiver` for `arguments`: an exact match, else the
    /// best of its declared constructors, else the default constructor of a
    /// type that declares none.
    pub fn get_constructor(
        &mut self,
        scope: ScopeId,
        receiver: TypeId,
        arguments: &[TypeId],
        site: &InvocationSite,
    ) -> LookupResult<Binding> {
        let receiver = self.resolve_type(receiver)?;
        self.record_type_reference(scope, receiver);
        let init = self.interner.intern(INIT);
        if let Some(exact) = self.get_exact_constructor(receiver, arguments)?
            && self.can_method_be_seen_by(exact, site, scope)?
        {
            return Ok(Binding::Method(exact));
        }

        let declared = self.get_methods(receiver, init)?;
        if !declared.is_empty() {
            return self.rank_candidates(scope, receiver, init, &declared, arguments, site);
        }
        if self.reference(receiver).is_none() {
            return Ok(method_problem(init, ProblemReason::NotFound, Some(receiver), arguments, None));
        }

        let constructor = self.default_constructor(receiver, init);
        if !self.can_method_be_seen_by(constructor, site, scope)? {
            return Ok(method_problem(init, ProblemReason::NotVisible, Some(receiver), arguments, Some(constructor)));
        }
        Ok(Binding::Method(constructor))
    }

    /// The implicit no-argument constructor of a type, created once and
    /// visible wherever the type is.
    fn default_constructor(&mut self, ty: TypeId, init: Atom) -> MethodId {
        if let Some(existing) = self.default_constructors.get(&ty) {
            return *existing;
        }
        let access = self
            .reference(ty)
            .map_or(Modifiers::PUBLIC, |binding| binding.modifiers & Modifiers::ACCESS_MASK);
        let method = self.alloc_method(MethodBinding {
            selector: init,
            modifiers: access | Modifiers::DEFAULT_CONSTRUCTOR,
            parameters: SmallVec::new(),
            return_type: LazyType::Resolved(TypeId::VOID),
            declaring_class: ty,
            kind: MethodKind::Constructor,
            allocation_type: Some(ty),
            span: None,
        });
        self.default_constructors.insert(ty, method);
        method
    }
}

#[cfg(test)]
#[path = "../tests/scope_methods_tests.rs"]
mod tests;

//! Locals, local functions and local types of block and method scopes.

use jsbind_common::Atom;
use jsbind_common::diagnostics::diagnostic_codes;
use smallvec::{SmallVec, smallvec};
use tracing::trace;

use crate::binding::{Binding, ProblemBinding, ProblemKind, ProblemReason};
use crate::decl::{MethodDecl, Span};
use crate::environment::LookupEnvironment;
use crate::error::LookupResult;
use crate::ids::{LocalId, MethodId, ScopeId, TypeId};
use crate::modifiers::Modifiers;
use crate::problem::ReferenceContext;
use crate::scope::{ScopeData, ScopeKind};
use crate::symbols::{LazyType, LocalVariableBinding, MethodBinding, MethodKind};

/// Name of the implicit variable every function can read.
pub const ARGUMENTS: &str = "arguments";

/// One step of the path that reaches an outer local from inside a nested
/// type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmulationStep {
    /// Go through the enclosing instance of this type.
    OuterInstance(TypeId),
    /// This local type holds a synthetic copy of the variable.
    SyntheticCopy(TypeId),
    /// The variable itself, in a scope of the current function.
    Variable(LocalId),
}

impl LookupEnvironment {
    /// Context problems found in `scope` are reported against.
    pub(crate) fn scope_context(&self, scope: ScopeId) -> ReferenceContext {
        for id in self.scope_chain(scope) {
            match &self.scope(id).data {
                ScopeData::Method(method) => {
                    if let Some(method) = method.method {
                        return ReferenceContext::Method(method);
                    }
                }
                ScopeData::Class(class) => return ReferenceContext::Type(class.ty),
                ScopeData::Unit(unit) => return ReferenceContext::Unit(unit.unit),
                ScopeData::Block(_) => {}
            }
        }
        ReferenceContext::Environment
    }

    // =========================================================================
    // Local variables
    // =========================================================================

    /// Declare a local in `scope`. Redeclaring a name already visible in the
    /// same function reports a duplicate and answers the first declaration.
    pub fn add_local_variable(
        &mut self,
        scope: ScopeId,
        name: &str,
        type_name: Option<&str>,
        span: Option<Span>,
    ) -> LocalId {
        self.declare_local(scope, name, type_name, span, false)
    }

    pub(crate) fn declare_local(
        &mut self,
        scope: ScopeId,
        name: &str,
        type_name: Option<&str>,
        span: Option<Span>,
        is_argument: bool,
    ) -> LocalId {
        let atom = self.interner.intern(name);
        if let Some(existing) = self.find_duplicate_local(scope, atom) {
            self.report(
                self.scope_context(scope),
                diagnostic_codes::DUPLICATE_LOCAL_VARIABLE,
                span,
                &[name.to_string()],
            );
            return existing;
        }
        let ty = self.lazy_type(type_name, Some(scope));
        let index = self
            .scope(scope)
            .block()
            .map_or(0, |block| block.locals.len());
        let local = self.alloc_local(LocalVariableBinding {
            name: atom,
            ty,
            modifiers: Modifiers::empty(),
            declaring_scope: Some(scope),
            is_argument,
            index: u32::try_from(index).unwrap_or(u32::MAX),
            span,
        });
        if let Some(block) = self.scope_mut(scope).block_mut() {
            block.locals.push(local);
        }
        local
    }

    /// A local of the same name declared in `scope` or an enclosing block
    /// of the same function.
    fn find_duplicate_local(&self, scope: ScopeId, name: Atom) -> Option<LocalId> {
        for id in self.scope_chain(scope) {
            let found = self.scope(id).block().and_then(|block| {
                block
                    .locals
                    .iter()
                    .rev()
                    .copied()
                    .find(|local| self.locals[local.index()].name == name)
            });
            if found.is_some() {
                return found;
            }
            if matches!(self.scope(id).kind(), ScopeKind::Method | ScopeKind::Unit | ScopeKind::Class) {
                break;
            }
        }
        None
    }

    /// Local named `name` declared directly in `scope`, latest first. Method
    /// scopes also answer the implicit `arguments` variable.
    pub fn find_variable(&mut self, scope: ScopeId, name: Atom) -> Option<LocalId> {
        let found = self.scope(scope).block().and_then(|block| {
            block
                .locals
                .iter()
                .rev()
                .copied()
                .find(|local| self.locals[local.index()].name == name)
        });
        if found.is_some() {
            return found;
        }
        if self.scope(scope).kind() == ScopeKind::Method && self.resolve_atom(name) == ARGUMENTS {
            return Some(self.arguments_local(scope));
        }
        None
    }

    fn arguments_local(&mut self, scope: ScopeId) -> LocalId {
        if let Some(existing) = self.scope(scope).as_method().and_then(|method| method.arguments_local) {
            return existing;
        }
        let index = self.scope(scope).block().map_or(0, |block| block.locals.len());
        let name = self.interner.intern(ARGUMENTS);
        let local = self.alloc_local(LocalVariableBinding {
            name,
            ty: LazyType::ANY,
            modifiers: Modifiers::SYNTHETIC,
            declaring_scope: Some(scope),
            is_argument: true,
            index: u32::try_from(index).unwrap_or(u32::MAX),
            span: None,
        });
        if let Some(method) = self.scope_mut(scope).as_method_mut() {
            method.arguments_local = Some(local);
        }
        local
    }

    // =========================================================================
    // Local functions
    // =========================================================================

    /// Declare a function inside `scope`. A second function with the same
    /// name in the same block is ignored and the first one answered.
    pub fn add_local_function(&mut self, scope: ScopeId, decl: &MethodDecl) -> Option<MethodId> {
        let selector = self.interner.intern(decl.selector()?);
        if let Some(existing) = self.find_local_function_here(scope, selector) {
            return Some(existing);
        }
        let declaring_class = self.enclosing_receiver_type(scope).unwrap_or(self.object_type);
        let is_static = self
            .enclosing_method_scope(scope)
            .and_then(|id| self.scope(id).as_method())
            .is_some_and(|method| method.is_static);
        let function_scope = self.new_method_scope(scope, is_static);
        let method = self.create_function_binding(decl, declaring_class, MethodKind::LocalFunction, function_scope);
        self.populate_method_scope(function_scope, decl);
        if let Some(block) = self.scope_mut(scope).block_mut() {
            block.local_functions.push(method);
        }
        trace!(name = %self.resolve_atom(selector), "declared local function");
        Some(method)
    }

    fn find_local_function_here(&self, scope: ScopeId, selector: Atom) -> Option<MethodId> {
        self.scope(scope).block().and_then(|block| {
            block
                .local_functions
                .iter()
                .copied()
                .find(|method| self.methods[method.index()].selector == selector)
        })
    }

    /// Function named `selector` declared directly in `scope`. With
    /// `check_vars`, a variable of that name also answers: typed `any` or
    /// `Function` it acts as a function returning `any`, typed otherwise it
    /// is a `NotAFunction` problem.
    pub fn find_local_method(
        &mut self,
        scope: ScopeId,
        selector: Atom,
        check_vars: bool,
    ) -> LookupResult<Option<Binding>> {
        if let Some(method) = self.find_local_function_here(scope, selector) {
            return Ok(Some(Binding::Method(method)));
        }
        if !check_vars {
            return Ok(None);
        }
        let Some(local) = self.find_variable(scope, selector) else {
            return Ok(None);
        };
        let ty = self.local_type(local)?;
        if ty == TypeId::ANY || ty == self.function_type {
            return Ok(Some(Binding::Method(self.variable_function(scope, local))));
        }
        Ok(Some(Binding::Problem(Box::new(
            ProblemBinding::new(vec![selector], ProblemReason::NotAFunction, ProblemKind::Method)
                .with_closest_match(Binding::Variable(local)),
        ))))
    }

    /// Method binding standing in for a call through a variable.
    pub(crate) fn variable_function(&mut self, scope: ScopeId, local: LocalId) -> MethodId {
        if let Some(existing) = self.variable_functions.get(&local) {
            return *existing;
        }
        let any_array = self.create_array_type(TypeId::ANY, 1);
        let declaring_class = self.enclosing_receiver_type(scope).unwrap_or(self.object_type);
        let method = self.alloc_method(MethodBinding {
            selector: self.locals[local.index()].name,
            modifiers: Modifiers::PUBLIC | Modifiers::VARARGS,
            parameters: smallvec![LazyType::Resolved(any_array)],
            return_type: LazyType::ANY,
            declaring_class,
            kind: MethodKind::LocalFunction,
            allocation_type: None,
            span: self.locals[local.index()].span,
        });
        self.variable_functions.insert(local, method);
        method
    }

    // =========================================================================
    // Local types
    // =========================================================================

    /// Local type named `name` declared directly in `scope`, latest first.
    /// From compliance 1.4 on, a type declared in a switch case is only
    /// visible inside that case.
    pub fn find_local_type(&self, scope: ScopeId, name: Atom, from: ScopeId) -> Option<TypeId> {
        let block = self.scope(scope).block()?;
        let compliant = self.options.is_compliant_1_4();
        block.local_types.iter().rev().copied().find(|ty| {
            let Some(binding) = self.reference(*ty) else {
                return false;
            };
            if binding.source_name != name {
                return false;
            }
            let case = binding
                .provenance
                .as_source()
                .and_then(|origin| origin.enclosing_case);
            match case {
                Some(case) if compliant => self.is_inside_case(from, case),
                _ => true,
            }
        })
    }

    /// Record that local type `ty` keeps a copy of outer local `local`.
    pub fn add_captured_local(&mut self, ty: TypeId, local: LocalId) {
        if let Some(origin) = self
            .reference_mut(ty)
            .and_then(|binding| binding.provenance.as_source_mut())
            && !origin.captured_locals.contains(&local)
        {
            origin.captured_locals.push(local);
        }
    }

    // =========================================================================
    // Outer local emulation
    // =========================================================================

    /// How code at `scope` reaches `local`: directly when both are in the
    /// same function, otherwise one outer-instance hop per type boundary
    /// until the declaring function or a type holding a synthetic copy.
    /// `None` when `local` is not in scope.
    pub fn emulation_path(&self, scope: ScopeId, local: LocalId) -> Option<SmallVec<[EmulationStep; 4]>> {
        let declaring = self.locals[local.index()].declaring_scope?;
        let mut path = SmallVec::new();
        for id in self.scope_chain(scope) {
            if id == declaring {
                path.push(EmulationStep::Variable(local));
                return Some(path);
            }
            if let Some(class) = self.scope(id).as_class() {
                let captured = self
                    .reference(class.ty)
                    .and_then(|binding| binding.provenance.as_source())
                    .is_some_and(|origin| origin.captured_locals.contains(&local));
                if captured {
                    path.push(EmulationStep::SyntheticCopy(class.ty));
                    return Some(path);
                }
                path.push(EmulationStep::OuterInstance(class.ty));
            }
        }
        None
    }
}

#[cfg(test)]
#[path = "../tests/block_scope_tests.rs"]
mod tests;

//! Override checks run when a unit's members are complete.

use jsbind_common::diagnostics::diagnostic_codes;
use tracing::trace;

use crate::environment::LookupEnvironment;
use crate::error::LookupResult;
use crate::ids::{MethodId, TypeId, UnitId};
use crate::modifiers::{Modifiers, TypeTags};
use crate::problem::ReferenceContext;

impl LookupEnvironment {
    /// Check every method of the unit's types against the method it
    /// overrides. Types whose hierarchy is cyclic are skipped.
    pub(crate) fn verify_unit(&mut self, unit: UnitId) -> LookupResult<()> {
        let types = self.units[unit.index()].types.clone();
        for ty in types {
            let cyclic = self
                .reference(ty)
                .is_none_or(|binding| binding.tags.contains(TypeTags::HIERARCHY_CYCLE));
            if !cyclic {
                self.verify_type(ty)?;
            }
        }
        Ok(())
    }

    fn verify_type(&mut self, ty: TypeId) -> LookupResult<()> {
        let methods = self.own_methods(ty)?;
        if methods.is_empty() {
            return Ok(());
        }
        let chain = self.superclass_chain(ty)?;
        for method in methods.iter().copied() {
            if self.methods[method.index()].is_constructor() {
                continue;
            }
            if let Some(inherited) = self.find_inherited(method, &chain)? {
                self.check_override(ty, method, inherited)?;
            }
        }
        Ok(())
    }

    /// Nearest method up the hierarchy with the same selector and
    /// parameters.
    fn find_inherited(&mut self, method: MethodId, chain: &[TypeId]) -> LookupResult<Option<MethodId>> {
        let selector = self.methods[method.index()].selector;
        for superclass in chain {
            for candidate in self.get_methods(*superclass, selector)? {
                if self.are_parameters_equal(method, candidate)? {
                    return Ok(Some(candidate));
                }
            }
        }
        Ok(None)
    }

    fn check_override(&mut self, ty: TypeId, method: MethodId, inherited: MethodId) -> LookupResult<()> {
        let current = &self.methods[method.index()];
        let span = current.span;
        let (modifiers, is_static) = (current.modifiers, current.is_static());
        let inherited_binding = &self.methods[inherited.index()];
        let inherited_modifiers = inherited_binding.modifiers;
        let inherited_class = inherited_binding.declaring_class;
        let context = ReferenceContext::Method(method);

        if is_static != inherited_binding.is_static() {
            let kind = if inherited_binding.is_static() { "static" } else { "instance" };
            let args = [self.method_name(method), self.type_name(ty), kind.to_string()];
            self.report(context, diagnostic_codes::STATIC_AND_INSTANCE_CONFLICT, span, &args);
            return Ok(());
        }

        self.methods[method.index()].modifiers |= Modifiers::OVERRIDING;
        trace!(method = %self.method_name(method), from = %self.type_name(inherited_class), "overrides");

        if modifiers.visibility_rank() < inherited_modifiers.visibility_rank() {
            let args = [self.method_name(method), self.type_name(inherited_class)];
            self.report(context, diagnostic_codes::VISIBILITY_CONFLICT, span, &args);
        }

        let return_type = self.method_return_type(method)?;
        let inherited_return = self.method_return_type(inherited)?;
        if return_type != inherited_return && !self.is_compatible_with(return_type, inherited_return)? {
            let args = [self.method_name(method), self.type_name(inherited_class)];
            self.report(context, diagnostic_codes::INCOMPATIBLE_RETURN_TYPE, span, &args);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/verifier_tests.rs"]
mod tests;

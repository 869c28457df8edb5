//! Access checks for types and members.

use jsbind_common::limits::MAX_HIERARCHY_WALK;

use crate::environment::LookupEnvironment;
use crate::error::LookupResult;
use crate::ids::{FieldId, MethodId, ScopeId, TypeId};
use crate::modifiers::Modifiers;
use crate::scope::InvocationSite;
use crate::types::TypeData;

impl LookupEnvironment {
    /// Outermost enclosing type of `ty` (`ty` itself when top-level).
    pub fn outermost_enclosing_type(&self, ty: TypeId) -> TypeId {
        let mut current = ty;
        let mut steps = 0;
        while let Some(enclosing) = self.reference(current).and_then(|binding| binding.enclosing_type) {
            current = enclosing;
            steps += 1;
            if steps > MAX_HIERARCHY_WALK {
                break;
            }
        }
        current
    }

    /// Can code at `scope` name type `ty`?
    pub fn can_type_be_seen_by(&self, ty: TypeId, scope: ScopeId) -> bool {
        let ty = match self.types.get(ty.index()) {
            Some(TypeData::Array { leaf, .. }) => *leaf,
            _ => ty,
        };
        let Some(binding) = self.reference(ty) else {
            return true;
        };
        if binding.modifiers.is_public() {
            return true;
        }
        let invocation = self.enclosing_source_type(scope);
        if invocation == Some(ty) {
            return true;
        }
        if binding.modifiers.is_private() {
            return invocation.is_some_and(|invocation| {
                self.outermost_enclosing_type(invocation) == self.outermost_enclosing_type(ty)
            });
        }
        binding.package == self.current_package(scope)
    }

    pub fn can_field_be_seen_by(
        &mut self,
        field: FieldId,
        site: &InvocationSite,
        scope: ScopeId,
    ) -> LookupResult<bool> {
        let binding = &self.fields[field.index()];
        let (modifiers, declaring) = (binding.modifiers, binding.declaring_class);
        self.can_member_be_seen_by(modifiers, declaring, site, scope)
    }

    pub fn can_method_be_seen_by(
        &mut self,
        method: MethodId,
        site: &InvocationSite,
        scope: ScopeId,
    ) -> LookupResult<bool> {
        let binding = &self.methods[method.index()];
        let (modifiers, declaring) = (binding.modifiers, binding.declaring_class);
        self.can_member_be_seen_by(modifiers, declaring, site, scope)
    }

    /// Public members are visible everywhere and any member is visible
    /// from its own type. Outside a type, anything but private is visible
    /// within the package. Protected members are also visible from
    /// subclasses and through `super`; private members only within the
    /// same outermost type.
    fn can_member_be_seen_by(
        &mut self,
        modifiers: Modifiers,
        declaring: TypeId,
        site: &InvocationSite,
        scope: ScopeId,
    ) -> LookupResult<bool> {
        if modifiers.is_public() {
            return Ok(true);
        }
        let same_package = self
            .reference(declaring)
            .is_some_and(|binding| binding.package == self.current_package(scope));
        let Some(invocation) = self.enclosing_source_type(scope) else {
            return Ok(!modifiers.is_private() && same_package);
        };
        if invocation == declaring || self.is_linked_with(invocation, declaring) {
            return Ok(true);
        }
        if modifiers.is_protected() {
            if same_package || site.is_super_access {
                return Ok(true);
            }
            let mut current = Some(invocation);
            while let Some(ty) = current {
                if self.is_superclass_of(declaring, ty)? {
                    return Ok(true);
                }
                current = self.reference(ty).and_then(|binding| binding.enclosing_type);
            }
            return Ok(false);
        }
        if modifiers.is_private() {
            return Ok(self.outermost_enclosing_type(invocation) == self.outermost_enclosing_type(declaring));
        }
        Ok(same_package)
    }
}

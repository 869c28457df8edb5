//! Type relations and the parameter compatibility ladder.

use jsbind_common::limits::MAX_HIERARCHY_WALK;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::environment::LookupEnvironment;
use crate::error::LookupResult;
use crate::ids::{MethodId, TypeId};
use crate::types::{BaseKind, TypeData};

/// How well an argument list fits a method, best first. Overload
/// resolution tries the levels in this order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CompatibilityLevel {
    Compatible,
    /// Needs a boxing or unboxing conversion.
    Autobox,
    /// Needs the trailing arguments collected into the varargs array.
    Varargs,
    NotCompatible,
}

impl CompatibilityLevel {
    /// Levels overload resolution walks, in order.
    pub const LADDER: [CompatibilityLevel; 3] = [
        CompatibilityLevel::Compatible,
        CompatibilityLevel::Autobox,
        CompatibilityLevel::Varargs,
    ];
}

impl LookupEnvironment {
    /// True when `superclass` is `ty` itself, linked with it, or on its
    /// superclass chain.
    pub fn is_superclass_of(&mut self, superclass: TypeId, ty: TypeId) -> LookupResult<bool> {
        let mut visited = FxHashSet::default();
        let mut current = Some(ty);
        while let Some(candidate) = current {
            if candidate == superclass || self.is_linked_with(candidate, superclass) {
                return Ok(true);
            }
            if !visited.insert(candidate) || visited.len() > MAX_HIERARCHY_WALK {
                break;
            }
            current = self.superclass(candidate)?;
        }
        Ok(false)
    }

    /// Assignment compatibility of `ty` to `target`. `any` fits everything
    /// both ways, `null` fits every reference and array type, base types
    /// widen, arrays are covariant in their element type and every
    /// reference or array type fits the root object type. Answers for
    /// reference types are memoized on the source type.
    pub fn is_compatible_with(&mut self, ty: TypeId, target: TypeId) -> LookupResult<bool> {
        if ty == target || ty == TypeId::ANY || target == TypeId::ANY {
            return Ok(true);
        }
        let (Some(source), Some(destination)) = (self.types.get(ty.index()), self.types.get(target.index())) else {
            return Ok(false);
        };
        match (source, destination) {
            (TypeData::Base(BaseKind::Null), TypeData::Base(_)) => Ok(false),
            (TypeData::Base(BaseKind::Null), _) => Ok(true),
            (TypeData::Base(from), TypeData::Base(to)) => Ok(from.widens_to(*to)),
            (TypeData::Base(_), _) | (_, TypeData::Base(_)) => Ok(false),
            (
                TypeData::Array { leaf, dimensions },
                TypeData::Array {
                    leaf: target_leaf,
                    dimensions: target_dimensions,
                },
            ) => {
                let (leaf, dimensions, target_leaf, target_dimensions) =
                    (*leaf, *dimensions, *target_leaf, *target_dimensions);
                if dimensions == target_dimensions {
                    if leaf.is_base() || target_leaf.is_base() {
                        return Ok(leaf == target_leaf || target_leaf == TypeId::ANY);
                    }
                    return self.is_compatible_with(leaf, target_leaf);
                }
                Ok(dimensions > target_dimensions && target_leaf == self.object_type)
            }
            (TypeData::Array { .. }, TypeData::Reference(_)) => Ok(target == self.object_type),
            (TypeData::Reference(_), TypeData::Array { .. }) => Ok(false),
            (TypeData::Reference(binding), TypeData::Reference(_)) => {
                if target == self.object_type {
                    return Ok(true);
                }
                if let Some(known) = binding.compatible_cache.get(&target) {
                    return Ok(*known);
                }
                self.set_compatible(ty, target, false);
                let compatible = self.is_superclass_of(target, ty)?;
                self.set_compatible(ty, target, compatible);
                Ok(compatible)
            }
        }
    }

    fn set_compatible(&mut self, ty: TypeId, target: TypeId, compatible: bool) {
        if let Some(binding) = self.reference_mut(ty) {
            binding.compatible_cache.insert(target, compatible);
        }
    }

    // =========================================================================
    // Compatibility ladder
    // =========================================================================

    /// How well `arguments` fit the parameters of `method`. Below source
    /// level 1.5 only exact-arity plain compatibility counts.
    pub fn parameter_compatibility_level(
        &mut self,
        method: MethodId,
        arguments: &[TypeId],
    ) -> LookupResult<CompatibilityLevel> {
        let parameters = self.method_parameter_types(method)?;
        let parameter_count = parameters.len();
        let argument_count = arguments.len();

        if !self.options.allows_boxing_and_varargs() {
            if parameter_count != argument_count {
                return Ok(CompatibilityLevel::NotCompatible);
            }
            for (argument, parameter) in arguments.iter().zip(&parameters) {
                if !self.is_compatible_with(*argument, *parameter)? {
                    return Ok(CompatibilityLevel::NotCompatible);
                }
            }
            return Ok(CompatibilityLevel::Compatible);
        }

        let mut level = CompatibilityLevel::Compatible;
        let mut last_index = argument_count;
        if self.methods[method.index()].is_varargs() && parameter_count > 0 {
            last_index = parameter_count - 1;
            let varargs_type = parameters[last_index];
            if parameter_count == argument_count {
                let argument = arguments[last_index];
                if argument != varargs_type {
                    level = self.argument_level(argument, varargs_type)?;
                    if level == CompatibilityLevel::NotCompatible {
                        let element = self.element_type(varargs_type).unwrap_or(TypeId::ANY);
                        if self.argument_level(argument, element)? == CompatibilityLevel::NotCompatible {
                            return Ok(CompatibilityLevel::NotCompatible);
                        }
                        level = CompatibilityLevel::Varargs;
                    }
                }
            } else {
                if parameter_count < argument_count {
                    let element = self.element_type(varargs_type).unwrap_or(TypeId::ANY);
                    for argument in &arguments[last_index..] {
                        if *argument != element
                            && self.argument_level(*argument, element)? == CompatibilityLevel::NotCompatible
                        {
                            return Ok(CompatibilityLevel::NotCompatible);
                        }
                    }
                } else if last_index != argument_count {
                    return Ok(CompatibilityLevel::NotCompatible);
                }
                level = CompatibilityLevel::Varargs;
            }
        } else if parameter_count != argument_count {
            return Ok(CompatibilityLevel::NotCompatible);
        }

        for index in 0..last_index {
            let (argument, parameter) = (arguments[index], parameters[index]);
            if argument == parameter {
                continue;
            }
            let argument_level = self.argument_level(argument, parameter)?;
            if argument_level == CompatibilityLevel::NotCompatible {
                return Ok(CompatibilityLevel::NotCompatible);
            }
            level = level.max(argument_level);
        }
        Ok(level)
    }

    /// Level of a single argument: plain compatibility, or autoboxing when
    /// exactly one side is a base type and the boxed argument fits.
    fn argument_level(&mut self, argument: TypeId, parameter: TypeId) -> LookupResult<CompatibilityLevel> {
        if self.is_compatible_with(argument, parameter)? {
            return Ok(CompatibilityLevel::Compatible);
        }
        let argument_is_base = matches!(self.types.get(argument.index()), Some(TypeData::Base(_)));
        let parameter_is_base = matches!(self.types.get(parameter.index()), Some(TypeData::Base(_)));
        if argument_is_base != parameter_is_base
            && let Some(boxed) = self.compute_boxing_type(argument)?
            && boxed != argument
            && (boxed == parameter || self.is_compatible_with(boxed, parameter)?)
        {
            return Ok(CompatibilityLevel::Autobox);
        }
        Ok(CompatibilityLevel::NotCompatible)
    }

    /// Resolved parameters of both methods are identical.
    pub fn are_parameters_equal(&mut self, method: MethodId, other: MethodId) -> LookupResult<bool> {
        let parameters = self.method_parameter_types(method)?;
        let others = self.method_parameter_types(other)?;
        Ok(parameters == others)
    }

    /// Every parameter of `method` accepts the matching type in `parameters`.
    pub(crate) fn are_parameters_compatible_with(
        &mut self,
        method: MethodId,
        parameters: &SmallVec<[TypeId; 4]>,
    ) -> LookupResult<bool> {
        let own = self.method_parameter_types(method)?;
        if own.len() != parameters.len() {
            return Ok(false);
        }
        for (own, other) in own.iter().zip(parameters) {
            if own != other && !self.is_compatible_with(*other, *own)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
#[path = "../tests/compat_tests.rs"]
mod tests;

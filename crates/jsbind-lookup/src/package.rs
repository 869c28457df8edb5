//! Package trie and package-level lookups.
//!
//! The default package is the root of the trie; its child packages are the
//! top-level packages. Each package caches the types, unit-level bindings
//! and sub-packages it knows, and remembers names the name environment has
//! already denied so they are never asked for twice.

use jsbind_common::Atom;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use crate::binding::{Binding, BindingMask, ProblemBinding, ProblemKind, ProblemReason};
use crate::environment::LookupEnvironment;
use crate::error::LookupResult;
use crate::ids::{LocalId, MethodId, PackageId, TypeId};
use crate::modifiers::Modifiers;
use crate::types::{Provenance, ReferenceBinding, TypeData};

#[derive(Clone, Debug, Default)]
pub struct PackageBinding {
    pub compound_name: Vec<Atom>,
    pub parent: Option<PackageId>,
    known_types: FxHashMap<Atom, TypeId>,
    known_packages: FxHashMap<Atom, PackageId>,
    known_methods: FxHashMap<Atom, MethodId>,
    known_variables: FxHashMap<Atom, LocalId>,
    not_found_types: FxHashSet<Atom>,
    not_found_packages: FxHashSet<Atom>,
}

impl PackageBinding {
    pub fn new(compound_name: Vec<Atom>, parent: Option<PackageId>) -> Self {
        Self {
            compound_name,
            parent,
            ..Self::default()
        }
    }

    #[inline]
    pub fn is_default(&self) -> bool {
        self.compound_name.is_empty()
    }

    /// Type registered under `name`, without asking anyone.
    #[inline]
    pub fn get_type0(&self, name: Atom) -> Option<TypeId> {
        self.known_types.get(&name).copied()
    }

    #[inline]
    pub fn get_package0(&self, name: Atom) -> Option<PackageId> {
        self.known_packages.get(&name).copied()
    }

    pub fn known_types(&self) -> impl Iterator<Item = (Atom, TypeId)> + '_ {
        self.known_types.iter().map(|(name, ty)| (*name, *ty))
    }

    pub(crate) fn add_type(&mut self, name: Atom, ty: TypeId) {
        self.not_found_types.remove(&name);
        self.known_types.insert(name, ty);
    }

    pub(crate) fn add_package(&mut self, name: Atom, package: PackageId) {
        self.not_found_packages.remove(&name);
        self.known_packages.insert(name, package);
    }

    pub(crate) fn add_not_found_type(&mut self, name: Atom) {
        self.not_found_types.insert(name);
    }

    pub(crate) fn add_not_found_package(&mut self, name: Atom) {
        self.not_found_packages.insert(name);
    }

    #[inline]
    pub fn is_known_missing_type(&self, name: Atom) -> bool {
        self.not_found_types.contains(&name)
    }

    /// Unit-level function or variable registered under `name`.
    pub fn get_binding0(&self, name: Atom, mask: BindingMask) -> Option<Binding> {
        if mask.contains(BindingMask::METHOD)
            && let Some(method) = self.known_methods.get(&name)
        {
            return Some(Binding::Method(*method));
        }
        if mask.intersects(BindingMask::VARIABLE)
            && let Some(local) = self.known_variables.get(&name)
        {
            return Some(Binding::Variable(*local));
        }
        None
    }

    pub(crate) fn add_method(&mut self, name: Atom, method: MethodId) {
        self.known_methods.entry(name).or_insert(method);
    }

    pub(crate) fn add_variable(&mut self, name: Atom, local: LocalId) {
        self.known_variables.entry(name).or_insert(local);
    }
}

impl LookupEnvironment {
    // =========================================================================
    // Trie construction
    // =========================================================================

    /// Create (or find) the package with the given compound name and all of
    /// its parents.
    pub fn create_package(&mut self, compound_name: &[Atom]) -> PackageId {
        let mut current = self.default_package;
        for (depth, segment) in compound_name.iter().enumerate() {
            current = match self.packages[current.index()].get_package0(*segment) {
                Some(existing) => existing,
                None => {
                    let id = PackageId::from_index(self.packages.len());
                    self.packages.push(PackageBinding::new(
                        compound_name[..=depth].to_vec(),
                        Some(current),
                    ));
                    self.packages[current.index()].add_package(*segment, id);
                    trace!(package = %self.compound_to_string(&compound_name[..=depth]), "created package");
                    id
                }
            };
        }
        current
    }

    /// Top-level package named `name`, asking the name environment when the
    /// package has not been seen yet.
    pub fn get_top_level_package(&mut self, name: Atom) -> Option<PackageId> {
        let root = self.default_package;
        self.get_child_package(root, name)
    }

    /// Sub-package `name` of `parent`.
    pub fn get_child_package(&mut self, parent: PackageId, name: Atom) -> Option<PackageId> {
        let package = &self.packages[parent.index()];
        if let Some(existing) = package.get_package0(name) {
            return Some(existing);
        }
        if package.not_found_packages.contains(&name) {
            return None;
        }
        let mut compound = package.compound_name.clone();
        compound.push(name);
        let names: Vec<String> = compound
            .iter()
            .map(|atom| self.interner.resolve(*atom).to_string())
            .collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let is_package = self
            .name_environment
            .as_mut()
            .is_some_and(|name_environment| name_environment.is_package(&refs));
        if is_package {
            Some(self.create_package(&compound))
        } else {
            self.packages[parent.index()].add_not_found_package(name);
            None
        }
    }

    /// Package with the given compound name, or `None` as soon as one
    /// segment is not a package.
    pub fn get_package(&mut self, compound_name: &[Atom]) -> Option<PackageId> {
        let mut current = self.default_package;
        for segment in compound_name {
            current = self.get_child_package(current, *segment)?;
        }
        Some(current)
    }

    // =========================================================================
    // Package-level lookups
    // =========================================================================

    /// Type `name` in `package`, asking the name environment if needed.
    /// Nested types named directly answer `InternalNameProvided`.
    pub fn package_get_type(
        &mut self,
        package: PackageId,
        name: Atom,
    ) -> LookupResult<Option<Binding>> {
        let ty = match self.packages[package.index()].get_type0(name) {
            Some(ty) => ty,
            None => {
                if self.packages[package.index()].is_known_missing_type(name) {
                    return Ok(None);
                }
                let mut compound = self.packages[package.index()].compound_name.clone();
                compound.push(name);
                match self.ask_for_type(&compound)? {
                    Some(ty) => ty,
                    None => {
                        self.packages[package.index()].add_not_found_type(name);
                        return Ok(None);
                    }
                }
            }
        };
        let ty = self.resolve_type(ty)?;
        if self.is_missing_type(ty) {
            return Ok(None);
        }
        Ok(Some(self.check_nested_by_name(ty, name)))
    }

    fn check_nested_by_name(&self, ty: TypeId, name: Atom) -> Binding {
        match self.reference(ty) {
            Some(binding) if binding.is_nested() && !binding.is_local() => Binding::Problem(Box::new(
                ProblemBinding::new(
                    vec![name],
                    ProblemReason::InternalNameProvided,
                    ProblemKind::Type,
                )
                .with_closest_match(Binding::Type(ty)),
            )),
            _ => Binding::Type(ty),
        }
    }

    /// Type, sub-package or unit-level binding named `name` in `package`.
    pub fn package_get_type_or_package(
        &mut self,
        package: PackageId,
        name: Atom,
        mask: BindingMask,
    ) -> LookupResult<Option<Binding>> {
        let mut type_known = false;
        if mask.contains(BindingMask::TYPE) {
            if let Some(ty) = self.packages[package.index()].get_type0(name) {
                let ty = self.resolve_type(ty)?;
                if !self.is_missing_type(ty) {
                    return Ok(Some(self.check_nested_by_name(ty, name)));
                }
                type_known = true;
            } else {
                type_known = self.packages[package.index()].is_known_missing_type(name);
            }
        }
        if mask.intersects(BindingMask::METHOD | BindingMask::VARIABLE) {
            if let Some(binding) = self.packages[package.index()].get_binding0(name, mask) {
                return Ok(Some(binding));
            }
            if let Some(binding) = self.ask_for_binding(package, name, mask)? {
                return Ok(Some(binding));
            }
        }
        if mask.contains(BindingMask::PACKAGE) {
            if let Some(existing) = self.packages[package.index()].get_package0(name) {
                return Ok(Some(Binding::Package(existing)));
            }
        }
        if mask.contains(BindingMask::TYPE) && !type_known {
            if let Some(binding) = self.package_get_type(package, name)? {
                return Ok(Some(binding));
            }
        }
        if mask.contains(BindingMask::PACKAGE) {
            if let Some(found) = self.get_child_package(package, name) {
                return Ok(Some(Binding::Package(found)));
            }
        }
        Ok(None)
    }

    /// Register a unit-level function or variable in `package`.
    pub(crate) fn package_add_binding(&mut self, package: PackageId, name: Atom, binding: &Binding) {
        let package = &mut self.packages[package.index()];
        match binding {
            Binding::Method(method) => package.add_method(name, *method),
            Binding::Variable(local) => package.add_variable(name, *local),
            _ => {}
        }
    }

    // =========================================================================
    // Qualified type names
    // =========================================================================

    /// Type with a fully qualified name. The last segment is the type, the
    /// rest the package.
    pub fn get_type(&mut self, compound_name: &[Atom]) -> LookupResult<Option<Binding>> {
        let Some((&simple, package_name)) = compound_name.split_last() else {
            return Ok(None);
        };
        let package = if package_name.is_empty() {
            self.default_package
        } else {
            match self.get_package(package_name) {
                Some(package) => package,
                None => match self.ask_for_type(compound_name)? {
                    Some(ty) => return Ok(Some(Binding::Type(self.resolve_type(ty)?))),
                    None => return Ok(None),
                },
            }
        };
        self.package_get_type(package, simple)
    }

    /// Canonical binding for a qualified name, creating an unresolved
    /// placeholder (and the packages leading to it) when the type is not
    /// known yet. The placeholder is resolved in place on first use.
    pub fn get_type_from_compound_name(&mut self, compound_name: &[Atom]) -> TypeId {
        let Some((&simple, package_name)) = compound_name.split_last() else {
            return TypeId::ANY;
        };
        let package = self.create_package(package_name);
        if let Some(existing) = self.packages[package.index()].get_type0(simple) {
            return existing;
        }
        let placeholder = ReferenceBinding::new(
            compound_name.to_vec(),
            package,
            Modifiers::UNRESOLVED,
            Provenance::Unresolved,
        );
        let id = self.alloc_type(TypeData::Reference(Box::new(placeholder)));
        self.packages[package.index()].add_type(simple, id);
        trace!(name = %self.compound_to_string(compound_name), "created placeholder type");
        id
    }
}

#[cfg(test)]
#[path = "../tests/package_tests.rs"]
mod tests;

//! The scope tree.
//!
//! Scopes live in the environment's scope arena and point at their parent
//! by id. A compilation unit scope sits at the root; class scopes hold one
//! source type each; method scopes hold a function's arguments and locals;
//! block scopes nest below method scopes (switch cases are block scopes
//! tagged with the case index).

use std::sync::{Arc, Mutex, PoisonError};

use jsbind_common::Atom;
use rustc_hash::FxHashMap;

use crate::binding::{Binding, ImportBinding};
use crate::decl::InferredTypeDecl;
use crate::environment::LookupEnvironment;
use crate::ids::{LocalId, MethodId, PackageId, ScopeId, TypeId, UnitId};

// =============================================================================
// Invocation site
// =============================================================================

/// Where a lookup is performed from. Lookups fill in how many class
/// boundaries they crossed and the receiver they settled on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InvocationSite {
    /// Enclosing class scopes crossed before the binding was found.
    pub depth: u32,
    pub actual_receiver: Option<TypeId>,
    /// The reference is qualified by `super`.
    pub is_super_access: bool,
}

impl InvocationSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn super_access() -> Self {
        Self {
            is_super_access: true,
            ..Self::default()
        }
    }
}

// =============================================================================
// Scope kinds
// =============================================================================

#[derive(Clone, Debug, Default)]
pub struct BlockScope {
    /// Locals in declaration order.
    pub locals: Vec<LocalId>,
    pub local_functions: Vec<MethodId>,
    pub local_types: Vec<TypeId>,
    pub subscopes: Vec<ScopeId>,
    /// Switch case this block belongs to.
    pub enclosing_case: Option<u32>,
}

#[derive(Clone, Debug, Default)]
pub struct MethodScope {
    pub block: BlockScope,
    pub is_static: bool,
    /// Inside the arguments of an explicit constructor call.
    pub is_constructor_call: bool,
    pub method: Option<MethodId>,
    /// The implicit `arguments` variable, created on first lookup.
    pub arguments_local: Option<LocalId>,
}

#[derive(Clone, Debug)]
pub struct ClassScope {
    pub ty: TypeId,
    pub decl: Arc<InferredTypeDecl>,
}

/// Qualified, simple and type references a unit made while resolving.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReferenceRecord {
    pub qualified: Vec<Vec<Atom>>,
    pub simple: Vec<Atom>,
    pub types: Vec<TypeId>,
}

impl ReferenceRecord {
    pub(crate) fn record_qualified(&mut self, compound: &[Atom]) {
        if !self.qualified.iter().any(|known| known.as_slice() == compound) {
            self.qualified.push(compound.to_vec());
        }
    }

    pub(crate) fn record_simple(&mut self, name: Atom) {
        if !self.simple.contains(&name) {
            self.simple.push(name);
        }
    }

    pub(crate) fn record_type(&mut self, ty: TypeId) {
        if !self.types.contains(&ty) {
            self.types.push(ty);
        }
    }
}

#[derive(Debug, Default)]
struct SuperTypeBuildState {
    building: bool,
    built: bool,
}

/// Guards building a unit's global super type so concurrent callers
/// neither build it twice nor see it half built.
#[derive(Clone, Debug, Default)]
pub struct SuperTypeBuildLock {
    inner: Arc<Mutex<SuperTypeBuildState>>,
}

impl SuperTypeBuildLock {
    /// Claim the build. `None` when it is done or someone else holds it.
    pub fn try_begin(&self) -> Option<SuperTypeBuildGuard> {
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if state.built || state.building {
            return None;
        }
        state.building = true;
        Some(SuperTypeBuildGuard {
            inner: Arc::clone(&self.inner),
        })
    }

    pub fn is_built(&self) -> bool {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).built
    }

    /// Drop an unfinished claim (after an abort).
    pub fn reset(&self) {
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        state.building = false;
    }
}

/// An exclusive claim on a super type build. Dropping it without
/// `finish` leaves the super type unbuilt.
#[derive(Debug)]
pub struct SuperTypeBuildGuard {
    inner: Arc<Mutex<SuperTypeBuildState>>,
}

impl SuperTypeBuildGuard {
    pub fn finish(self) {
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        state.built = true;
    }
}

impl Drop for SuperTypeBuildGuard {
    fn drop(&mut self) {
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        state.building = false;
    }
}

#[derive(Clone, Debug)]
pub struct UnitScope {
    pub unit: UnitId,
    pub package: PackageId,
    /// Resolved imports; `None` until the import phase ran.
    pub imports: Option<Vec<ImportBinding>>,
    pub top_level_types: Vec<TypeId>,
    /// Simple names already resolved through the imports.
    pub type_or_package_cache: Option<FxHashMap<Atom, Binding>>,
    /// Unit-level variables and functions.
    pub block: BlockScope,
    pub references: Option<ReferenceRecord>,
    pub super_type: Option<TypeId>,
    pub super_type_lock: SuperTypeBuildLock,
    /// Method scope of each unit-level function, in declaration order.
    pub function_scopes: Vec<ScopeId>,
}

#[derive(Clone, Debug)]
pub enum ScopeData {
    Unit(Box<UnitScope>),
    Class(ClassScope),
    Method(Box<MethodScope>),
    Block(BlockScope),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Unit,
    Class,
    Method,
    Block,
}

#[derive(Clone, Debug)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    pub data: ScopeData,
}

impl Scope {
    pub fn kind(&self) -> ScopeKind {
        match self.data {
            ScopeData::Unit(_) => ScopeKind::Unit,
            ScopeData::Class(_) => ScopeKind::Class,
            ScopeData::Method(_) => ScopeKind::Method,
            ScopeData::Block(_) => ScopeKind::Block,
        }
    }

    pub fn as_unit(&self) -> Option<&UnitScope> {
        match &self.data {
            ScopeData::Unit(unit) => Some(unit),
            _ => None,
        }
    }

    pub(crate) fn as_unit_mut(&mut self) -> Option<&mut UnitScope> {
        match &mut self.data {
            ScopeData::Unit(unit) => Some(unit),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&ClassScope> {
        match &self.data {
            ScopeData::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&MethodScope> {
        match &self.data {
            ScopeData::Method(method) => Some(method),
            _ => None,
        }
    }

    pub(crate) fn as_method_mut(&mut self) -> Option<&mut MethodScope> {
        match &mut self.data {
            ScopeData::Method(method) => Some(method),
            _ => None,
        }
    }

    /// Block contents of a method, block or unit scope.
    pub fn block(&self) -> Option<&BlockScope> {
        match &self.data {
            ScopeData::Method(method) => Some(&method.block),
            ScopeData::Block(block) => Some(block),
            ScopeData::Unit(unit) => Some(&unit.block),
            ScopeData::Class(_) => None,
        }
    }

    pub(crate) fn block_mut(&mut self) -> Option<&mut BlockScope> {
        match &mut self.data {
            ScopeData::Method(method) => Some(&mut method.block),
            ScopeData::Block(block) => Some(block),
            ScopeData::Unit(unit) => Some(&mut unit.block),
            ScopeData::Class(_) => None,
        }
    }
}

// =============================================================================
// Scope construction and navigation
// =============================================================================

impl LookupEnvironment {
    pub(crate) fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.index()]
    }

    #[inline]
    pub fn parent_scope(&self, id: ScopeId) -> Option<ScopeId> {
        self.scopes[id.index()].parent
    }

    /// Iterate from `scope` up to the unit scope, `scope` first.
    pub fn scope_chain(&self, scope: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(scope), move |current| self.parent_scope(*current))
    }

    pub fn new_method_scope(&mut self, parent: ScopeId, is_static: bool) -> ScopeId {
        let scope = self.alloc_scope(Scope {
            parent: Some(parent),
            data: ScopeData::Method(Box::new(MethodScope {
                is_static,
                ..MethodScope::default()
            })),
        });
        self.register_subscope(parent, scope);
        scope
    }

    /// A nested block, registered with its parent so local type lookups can
    /// walk into it.
    pub fn new_block_scope(&mut self, parent: ScopeId) -> ScopeId {
        let enclosing_case = self.innermost_switch_case(parent);
        self.push_block_scope(parent, enclosing_case)
    }

    /// The block of switch case `case`.
    pub fn new_case_block_scope(&mut self, parent: ScopeId, case: u32) -> ScopeId {
        self.push_block_scope(parent, Some(case))
    }

    fn push_block_scope(&mut self, parent: ScopeId, enclosing_case: Option<u32>) -> ScopeId {
        let scope = self.alloc_scope(Scope {
            parent: Some(parent),
            data: ScopeData::Block(BlockScope {
                enclosing_case,
                ..BlockScope::default()
            }),
        });
        self.register_subscope(parent, scope);
        scope
    }

    pub(crate) fn register_subscope(&mut self, parent: ScopeId, child: ScopeId) {
        if let Some(block) = self.scope_mut(parent).block_mut() {
            block.subscopes.push(child);
        }
    }

    /// Root scope of the unit `scope` belongs to.
    pub fn unit_scope_of(&self, scope: ScopeId) -> ScopeId {
        self.scope_chain(scope).last().unwrap_or(scope)
    }

    pub(crate) fn unit_scope_data(&self, scope: ScopeId) -> Option<&UnitScope> {
        self.scope(self.unit_scope_of(scope)).as_unit()
    }

    pub(crate) fn unit_scope_data_mut(&mut self, scope: ScopeId) -> Option<&mut UnitScope> {
        let root = self.unit_scope_of(scope);
        self.scope_mut(root).as_unit_mut()
    }

    /// Nearest class scope at or above `scope`.
    pub fn enclosing_class_scope(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scope_chain(scope)
            .find(|id| self.scope(*id).kind() == ScopeKind::Class)
    }

    /// Type of the nearest enclosing class scope.
    pub fn enclosing_source_type(&self, scope: ScopeId) -> Option<TypeId> {
        self.enclosing_class_scope(scope)
            .and_then(|id| self.scope(id).as_class())
            .map(|class| class.ty)
    }

    pub fn enclosing_method_scope(&self, scope: ScopeId) -> Option<ScopeId> {
        for id in self.scope_chain(scope) {
            match self.scope(id).kind() {
                ScopeKind::Method => return Some(id),
                ScopeKind::Class | ScopeKind::Unit => return None,
                ScopeKind::Block => {}
            }
        }
        None
    }

    /// Method scope farthest from `scope` without crossing a class scope.
    pub fn outermost_method_scope(&self, scope: ScopeId) -> Option<ScopeId> {
        let mut found = None;
        for id in self.scope_chain(scope) {
            match self.scope(id).kind() {
                ScopeKind::Method => found = Some(id),
                ScopeKind::Class | ScopeKind::Unit => break,
                ScopeKind::Block => {}
            }
        }
        found
    }

    pub fn outermost_class_scope(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scope_chain(scope)
            .filter(|id| self.scope(*id).kind() == ScopeKind::Class)
            .last()
    }

    /// Package of the unit `scope` belongs to.
    pub fn current_package(&self, scope: ScopeId) -> PackageId {
        self.unit_scope_data(scope)
            .map_or(self.default_package, |unit| unit.package)
    }

    /// Case index of the innermost switch case block around `scope`.
    pub fn innermost_switch_case(&self, scope: ScopeId) -> Option<u32> {
        for id in self.scope_chain(scope) {
            match &self.scope(id).data {
                ScopeData::Block(block) if block.enclosing_case.is_some() => {
                    return block.enclosing_case;
                }
                ScopeData::Block(_) | ScopeData::Method(_) => {}
                ScopeData::Class(_) | ScopeData::Unit(_) => return None,
            }
        }
        None
    }

    /// True if `scope` lies inside the case block numbered `case`.
    pub fn is_inside_case(&self, scope: ScopeId, case: u32) -> bool {
        self.scope_chain(scope).any(|id| {
            matches!(&self.scope(id).data, ScopeData::Block(block) if block.enclosing_case == Some(case))
        })
    }

    /// Type that owns the code at `scope`: the enclosing class, or the unit
    /// binding for unit-level code.
    pub fn enclosing_receiver_type(&self, scope: ScopeId) -> Option<TypeId> {
        self.enclosing_source_type(scope).or_else(|| {
            self.unit_scope_data(scope)
                .map(|unit| self.units[unit.unit.index()].unit_type)
        })
    }

    /// Scope of the class declaring source type `ty`.
    pub fn class_scope_of(&self, ty: TypeId) -> Option<ScopeId> {
        self.reference(ty)?
            .provenance
            .as_source()
            .map(|origin| origin.class_scope)
    }

    /// Scope of a source function.
    pub fn method_scope_of(&self, method: MethodId) -> Option<ScopeId> {
        self.method_scopes.get(&method).copied()
    }

    /// Method scope of the `index`th method declared by source type `ty`.
    pub fn declared_method_scope(&self, ty: TypeId, index: usize) -> Option<ScopeId> {
        self.reference(ty)?
            .provenance
            .as_source()
            .and_then(|origin| origin.method_scopes.get(index).copied())
    }

    /// Scope of the unit, for lookups at unit level.
    pub fn unit_scope(&self, unit: UnitId) -> ScopeId {
        self.units[unit.index()].scope
    }

    /// References recorded for a unit when reference info is on.
    pub fn unit_references(&self, unit: UnitId) -> Option<&ReferenceRecord> {
        self.scope(self.unit_scope(unit))
            .as_unit()
            .and_then(|scope| scope.references.as_ref())
    }
}

#[cfg(test)]
#[path = "../tests/scope_tests.rs"]
mod tests;

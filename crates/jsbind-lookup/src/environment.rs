//! The lookup environment: the session context every resolution call goes
//! through.
//!
//! It owns all arenas (types, fields, methods, locals, packages, scopes,
//! units, linked groups), the array-type intern table, the pending-unit
//! queue with its phase counter, the type-request stack, the name
//! environment and the problem reporter. `reset` discards all of it and
//! starts over with a fresh set of base types.
//!
//! The operations are split across modules by concern, each adding an
//! `impl LookupEnvironment` block:
//!
//! - `package.rs`: package trie, package-level type and binding lookup
//! - `pipeline.rs`: unit acceptance, the four completion phases, on-demand
//!   requests to the name environment
//! - `type_queries.rs`: the lazy member contract of type bindings
//! - `source.rs`, `binary.rs`, `metadata.rs`: per-provenance member building
//! - `linked.rs`: linked type groups
//! - `compat.rs`: type relations and the compatibility ladder
//! - `scope*.rs`, `*_scope.rs`: the scope tree and name resolution
//! - `verifier.rs`: inherited method checks

use std::sync::Arc;

use jsbind_common::limits::INITIAL_UNIT_QUEUE_CAPACITY;
use jsbind_common::{Atom, CompilerOptions, Diagnostic, Interner};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::decl::{CompilationUnitDecl, Span};
use crate::error::{AbortCompilation, LookupResult};
use crate::ids::{FieldId, GroupId, LocalId, MethodId, PackageId, ScopeId, TypeId, UnitId};
use crate::members::MemberTable;
use crate::modifiers::Modifiers;
use crate::name_env::{InMemoryNameEnvironment, NameEnvironment};
use crate::package::PackageBinding;
use crate::problem::{CollectingReporter, Problem, ProblemReporter, ReferenceContext};
use crate::scope::Scope;
use crate::symbols::{FieldBinding, LazyType, LocalVariableBinding, MethodBinding};
use crate::types::{BaseKind, Provenance, ReferenceBinding, TypeData, TypeGroup};

// =============================================================================
// Phases
// =============================================================================

/// Completion phases, in the order they run over a batch of units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    #[default]
    NotStarted = 0,
    /// Skeleton type bindings exist (names and modifiers only).
    BuildTypeHierarchy = 1,
    CheckAndSetImports = 2,
    ConnectTypeHierarchy = 3,
    BuildFieldsAndMethods = 4,
}

/// An accepted compilation unit.
#[derive(Clone, Debug)]
pub struct UnitRecord {
    pub decl: Arc<CompilationUnitDecl>,
    pub scope: ScopeId,
    /// Binding holding the unit-level functions.
    pub unit_type: TypeId,
    pub file_name: Atom,
    /// Every source type built for the unit: top-level, member and local.
    pub types: Vec<TypeId>,
    /// Only these type names were built, when the unit was accepted for a
    /// specific request.
    pub restricted_to: Option<Vec<Atom>>,
    /// Last phase completed for this unit.
    pub phase: Phase,
    pub aborted: Option<AbortCompilation>,
}

/// Batch bookkeeping of the completion pipeline.
#[derive(Clone, Debug, Default)]
pub(crate) struct PipelineState {
    /// Phase the running (or last) batch has completed.
    pub(crate) step_completed: Phase,
    /// Units in acceptance order. Units before `completed_count` went
    /// through all four phases in an earlier batch.
    pub(crate) queue: Vec<UnitId>,
    pub(crate) completed_count: usize,
    pub(crate) unit_being_completed: Option<UnitId>,
}

// =============================================================================
// LookupEnvironment
// =============================================================================

pub struct LookupEnvironment {
    pub(crate) interner: Interner,
    pub(crate) options: CompilerOptions,
    pub(crate) types: Vec<TypeData>,
    pub(crate) fields: Vec<FieldBinding>,
    pub(crate) methods: Vec<MethodBinding>,
    pub(crate) locals: Vec<LocalVariableBinding>,
    pub(crate) packages: Vec<PackageBinding>,
    pub(crate) scopes: Vec<Scope>,
    pub(crate) units: Vec<UnitRecord>,
    pub(crate) groups: Vec<TypeGroup>,
    pub(crate) array_types: FxHashMap<(TypeId, u8), TypeId>,
    pub(crate) default_package: PackageId,
    pub(crate) object_type: TypeId,
    pub(crate) function_type: TypeId,
    pub(crate) name_environment: Option<Box<dyn NameEnvironment>>,
    pub(crate) reporter: Box<dyn ProblemReporter>,
    pub(crate) pipeline: PipelineState,
    /// Compound names currently being requested from the name environment.
    pub(crate) type_requests: Vec<Vec<Atom>>,
    /// Files already accepted, so a unit supplied twice is built once.
    pub(crate) accepted_files: FxHashSet<String>,
    /// Scope of every source function that has a binding.
    pub(crate) method_scopes: FxHashMap<MethodId, ScopeId>,
    /// Constructors synthesized for types that declare none.
    pub(crate) default_constructors: FxHashMap<TypeId, MethodId>,
    /// Method bindings standing in for variables called as functions.
    pub(crate) variable_functions: FxHashMap<LocalId, MethodId>,
}

impl std::fmt::Debug for LookupEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupEnvironment")
            .field("types", &self.types.len())
            .field("units", &self.units.len())
            .field("packages", &self.packages.len())
            .field("step_completed", &self.pipeline.step_completed)
            .finish_non_exhaustive()
    }
}

impl LookupEnvironment {
    /// Environment with an empty in-memory name environment and a
    /// collecting reporter.
    pub fn new(options: CompilerOptions) -> Self {
        Self::with_collaborators(
            options,
            Some(Box::new(InMemoryNameEnvironment::new())),
            Box::new(CollectingReporter::new()),
        )
    }

    pub fn with_collaborators(
        options: CompilerOptions,
        name_environment: Option<Box<dyn NameEnvironment>>,
        reporter: Box<dyn ProblemReporter>,
    ) -> Self {
        let mut env = Self {
            interner: Interner::new(),
            options,
            types: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            locals: Vec::new(),
            packages: Vec::new(),
            scopes: Vec::new(),
            units: Vec::new(),
            groups: Vec::new(),
            array_types: FxHashMap::default(),
            default_package: PackageId(0),
            object_type: TypeId(0),
            function_type: TypeId(0),
            name_environment,
            reporter,
            pipeline: PipelineState::default(),
            type_requests: Vec::new(),
            accepted_files: FxHashSet::default(),
            method_scopes: FxHashMap::default(),
            default_constructors: FxHashMap::default(),
            variable_functions: FxHashMap::default(),
        };
        env.initialize();
        env
    }

    /// Base types, the default package and the synthetic roots.
    fn initialize(&mut self) {
        self.types.extend(BaseKind::ALL.iter().map(|kind| TypeData::Base(*kind)));
        self.packages.push(PackageBinding::new(Vec::new(), None));
        self.default_package = PackageId(0);
        self.pipeline.queue.reserve(INITIAL_UNIT_QUEUE_CAPACITY);

        let object_name = self.interner.intern("Object");
        self.object_type = self.alloc_type(TypeData::Reference(Box::new(ReferenceBinding::new(
            vec![object_name],
            self.default_package,
            Modifiers::PUBLIC,
            Provenance::Synthetic,
        ))));
        let function_name = self.interner.intern("Function");
        let mut function = ReferenceBinding::new(
            vec![function_name],
            self.default_package,
            Modifiers::PUBLIC,
            Provenance::Synthetic,
        );
        function.superclass = Some(self.object_type);
        self.function_type = self.alloc_type(TypeData::Reference(Box::new(function)));
        for root in [self.object_type, self.function_type] {
            if let Some(binding) = self.reference_mut(root) {
                binding.fields = MemberTable::complete_empty();
                binding.methods = MemberTable::complete_empty();
            }
        }
        let default_package = self.default_package;
        let package = &mut self.packages[default_package.index()];
        package.add_type(object_name, self.object_type);
        package.add_type(function_name, self.function_type);
    }

    /// Discard every binding, scope and unit and start from fresh base
    /// types. The name environment and reporter stay attached.
    pub fn reset(&mut self) {
        debug!("resetting lookup environment");
        if let Some(name_environment) = self.name_environment.as_mut() {
            name_environment.cleanup();
        }
        self.interner = Interner::new();
        self.types.clear();
        self.fields.clear();
        self.methods.clear();
        self.locals.clear();
        self.packages.clear();
        self.scopes.clear();
        self.units.clear();
        self.groups.clear();
        self.array_types.clear();
        self.pipeline = PipelineState::default();
        self.type_requests.clear();
        self.accepted_files.clear();
        self.method_scopes.clear();
        self.default_constructors.clear();
        self.variable_functions.clear();
        self.initialize();
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    pub fn intern(&mut self, text: &str) -> Atom {
        self.interner.intern(text)
    }

    pub fn intern_dotted(&mut self, dotted: &str) -> Vec<Atom> {
        self.interner.intern_dotted(dotted)
    }

    #[inline]
    pub fn resolve_atom(&self, atom: Atom) -> &str {
        self.interner.resolve(atom)
    }

    pub fn object_type(&self) -> TypeId {
        self.object_type
    }

    pub fn function_type(&self) -> TypeId {
        self.function_type
    }

    pub fn default_package(&self) -> PackageId {
        self.default_package
    }

    pub fn phase(&self) -> Phase {
        self.pipeline.step_completed
    }

    pub fn type_data(&self, id: TypeId) -> &TypeData {
        &self.types[id.index()]
    }

    pub fn reference(&self, id: TypeId) -> Option<&ReferenceBinding> {
        self.types.get(id.index()).and_then(TypeData::as_reference)
    }

    pub(crate) fn reference_mut(&mut self, id: TypeId) -> Option<&mut ReferenceBinding> {
        self.types.get_mut(id.index()).and_then(TypeData::as_reference_mut)
    }

    pub fn field(&self, id: FieldId) -> &FieldBinding {
        &self.fields[id.index()]
    }

    pub fn method(&self, id: MethodId) -> &MethodBinding {
        &self.methods[id.index()]
    }

    pub fn local(&self, id: LocalId) -> &LocalVariableBinding {
        &self.locals[id.index()]
    }

    pub fn package(&self, id: PackageId) -> &PackageBinding {
        &self.packages[id.index()]
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn unit(&self, id: UnitId) -> &UnitRecord {
        &self.units[id.index()]
    }

    pub fn units(&self) -> impl Iterator<Item = (UnitId, &UnitRecord)> {
        self.units
            .iter()
            .enumerate()
            .map(|(i, unit)| (UnitId::from_index(i), unit))
    }

    pub fn group(&self, id: GroupId) -> &TypeGroup {
        &self.groups[id.index()]
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    // =========================================================================
    // Arena allocation
    // =========================================================================

    pub(crate) fn alloc_type(&mut self, data: TypeData) -> TypeId {
        let id = TypeId::from_index(self.types.len());
        self.types.push(data);
        id
    }

    pub(crate) fn alloc_field(&mut self, field: FieldBinding) -> FieldId {
        let id = FieldId::from_index(self.fields.len());
        self.fields.push(field);
        id
    }

    pub(crate) fn alloc_method(&mut self, method: MethodBinding) -> MethodId {
        let id = MethodId::from_index(self.methods.len());
        self.methods.push(method);
        id
    }

    pub(crate) fn alloc_local(&mut self, local: LocalVariableBinding) -> LocalId {
        let id = LocalId::from_index(self.locals.len());
        self.locals.push(local);
        id
    }

    pub(crate) fn alloc_scope(&mut self, scope: Scope) -> ScopeId {
        let id = ScopeId::from_index(self.scopes.len());
        self.scopes.push(scope);
        id
    }

    pub(crate) fn alloc_group(&mut self, group: TypeGroup) -> GroupId {
        let id = GroupId::from_index(self.groups.len());
        self.groups.push(group);
        id
    }

    /// Descriptor that resolves through `scope` (or the environment) when
    /// first read. Absent descriptors mean `any`.
    pub(crate) fn lazy_type(&mut self, descriptor: Option<&str>, scope: Option<ScopeId>) -> LazyType {
        match descriptor.map(str::trim) {
            None | Some("") => LazyType::ANY,
            Some(text) => match BaseKind::from_name(text) {
                Some(base) => LazyType::Resolved(base),
                None => LazyType::Raw {
                    descriptor: self.interner.intern(text),
                    scope,
                },
            },
        }
    }

    // =========================================================================
    // Names
    // =========================================================================

    /// Dotted compound name of a type (`a.b.Foo`, `int`, `Foo[][]`).
    pub fn type_name(&self, id: TypeId) -> String {
        match self.types.get(id.index()) {
            Some(TypeData::Base(kind)) => kind.name().to_string(),
            Some(TypeData::Array { leaf, dimensions }) => {
                let mut name = self.type_name(*leaf);
                for _ in 0..*dimensions {
                    name.push_str("[]");
                }
                name
            }
            Some(TypeData::Reference(binding)) => self.interner.join(&binding.compound_name, '.'),
            None => "<invalid>".to_string(),
        }
    }

    pub fn compound_to_string(&self, compound: &[Atom]) -> String {
        self.interner.join(compound, '.')
    }

    pub fn method_name(&self, id: MethodId) -> String {
        let method = self.method(id);
        let params: Vec<String> = method
            .parameters
            .iter()
            .map(|param| match param {
                LazyType::Resolved(ty) => self.type_name(*ty),
                LazyType::Raw { descriptor, .. } => self.resolve_atom(*descriptor).to_string(),
            })
            .collect();
        format!("{}({})", self.resolve_atom(method.selector), params.join(", "))
    }

    // =========================================================================
    // Problem reporting
    // =========================================================================

    pub(crate) fn context_file(&self, context: ReferenceContext) -> String {
        match context {
            ReferenceContext::Unit(unit) => self.units[unit.index()].decl.file_name.clone(),
            ReferenceContext::Type(ty) => self
                .reference(ty)
                .map(|binding| self.resolve_atom(binding.file_name).to_string())
                .unwrap_or_default(),
            ReferenceContext::Method(method) => {
                let declaring = self.method(method).declaring_class;
                self.context_file(ReferenceContext::Type(declaring))
            }
            ReferenceContext::Environment => String::new(),
        }
    }

    /// Report a diagnostic from the message table.
    pub(crate) fn report(
        &mut self,
        context: ReferenceContext,
        code: u32,
        span: Option<Span>,
        args: &[String],
    ) {
        let file = self.context_file(context);
        let span = span.unwrap_or_default();
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let diagnostic = Diagnostic::from_code(file, span.start, span.length, code, &args);
        self.reporter.report(Problem { context, diagnostic });
    }

    pub(crate) fn check_cancelled(&self) -> LookupResult<()> {
        if self.reporter.is_cancelled() {
            Err(AbortCompilation::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "../tests/environment_tests.rs"]
mod tests;

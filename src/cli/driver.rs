//! Load declarations, run the binding pipeline and answer lookups.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info_span};

use jsbind_common::{CompilerOptions, Diagnostic};
use jsbind_lookup::{
    Binding, BindingMask, CollectingReporter, CompilationUnitDecl, InMemoryNameEnvironment, InvocationSite,
    LookupEnvironment, TypeId, UnitId,
};

use super::args::CliArgs;

/// Everything one run produced, in the order it is printed.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub units: Vec<UnitReport>,
    pub lookups: Vec<LookupReport>,
    pub diagnostics: Vec<Diagnostic>,
}

impl RunResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitReport {
    pub file: String,
    pub phase: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
    pub types: Vec<TypeReport>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeReport {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,
    pub hierarchy_problems: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupReport {
    pub query: String,
    pub binding: String,
    pub valid: bool,
}

// =============================================================================
// Loading
// =============================================================================

/// Options from the options file (if any) with command-line overrides.
pub fn resolve_options(args: &CliArgs) -> Result<CompilerOptions> {
    let mut options = match &args.options_file {
        Some(path) => {
            let text = read_file(path)?;
            CompilerOptions::from_json_str(&text)
                .with_context(|| format!("invalid compiler options in {}", path.display()))?
        }
        None => CompilerOptions::default(),
    };
    if let Some(level) = args.compliance {
        options.compliance_level = level.into();
    }
    if let Some(level) = args.source {
        options.source_level = level.into();
    }
    if args.reference_info {
        options.produce_reference_info = true;
    }
    if args.no_hierarchy_problems {
        options.report_hierarchy_problems = false;
    }
    Ok(options)
}

pub fn load_library(path: &Path) -> Result<InMemoryNameEnvironment> {
    let text = read_file(path)?;
    InMemoryNameEnvironment::from_json_str(&text)
        .with_context(|| format!("invalid library declarations in {}", path.display()))
}

/// A unit declaration. A declaration without a file name is named after
/// the file it was read from.
pub fn load_unit(path: &Path) -> Result<CompilationUnitDecl> {
    let text = read_file(path)?;
    let mut decl: CompilationUnitDecl = serde_json::from_str(&text)
        .with_context(|| format!("invalid compilation unit in {}", path.display()))?;
    if decl.file_name.is_empty() {
        decl.file_name = path.display().to_string();
    }
    Ok(decl)
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

// =============================================================================
// Running
// =============================================================================

pub fn run(args: &CliArgs) -> Result<RunResult> {
    let options = resolve_options(args)?;
    let library = match &args.library {
        Some(path) => load_library(path)?,
        None => InMemoryNameEnvironment::new(),
    };
    let mut decls = Vec::with_capacity(args.units.len());
    for path in &args.units {
        decls.push(load_unit(path)?);
    }

    let _span = info_span!("run", units = decls.len()).entered();
    let reporter = CollectingReporter::new();
    let mut env = LookupEnvironment::with_collaborators(options, Some(Box::new(library)), Box::new(reporter.clone()));
    let accepted: Vec<UnitId> = decls.into_iter().map(|decl| env.accept_unit(decl)).collect();
    env.complete_type_bindings();
    debug!(accepted = accepted.len(), total = env.units().count(), "completed type bindings");

    let mut result = RunResult::default();
    let all_units: Vec<UnitId> = env.units().map(|(unit, _)| unit).collect();
    for unit in all_units {
        result.units.push(report_unit(&mut env, unit, args.members));
    }
    if let Some(&first) = accepted.first() {
        for query in &args.lookups {
            result.lookups.push(lookup(&mut env, first, query));
        }
    }
    result.diagnostics = reporter.problems().into_iter().map(|problem| problem.diagnostic).collect();
    Ok(result)
}

fn report_unit(env: &mut LookupEnvironment, unit: UnitId, members: bool) -> UnitReport {
    let record = env.unit(unit);
    let file = record.decl.file_name.clone();
    let phase = format!("{:?}", record.phase);
    let aborted = record.aborted.as_ref().map(ToString::to_string);
    let types = record.types.clone();
    UnitReport {
        file,
        phase,
        aborted,
        types: types.into_iter().map(|ty| report_type(env, ty, members)).collect(),
    }
}

fn report_type(env: &mut LookupEnvironment, ty: TypeId, members: bool) -> TypeReport {
    let superclass = env.superclass(ty).ok().flatten().map(|superclass| env.type_name(superclass));
    let mut report = TypeReport {
        name: env.type_name(ty),
        superclass,
        hierarchy_problems: env.has_hierarchy_problems(ty),
        fields: Vec::new(),
        methods: Vec::new(),
    };
    if members {
        for field in env.available_fields(ty) {
            let name = env.resolve_atom(env.field(field).name).to_string();
            let field_type = env
                .field_type(field)
                .map_or_else(|_| "?".to_string(), |field_type| env.type_name(field_type));
            report.fields.push(format!("{name}: {field_type}"));
        }
        for method in env.available_methods(ty) {
            // Resolve first so the signature shows resolved parameter types.
            let _ = env.resolve_method_types(method);
            report.methods.push(env.method_name(method));
        }
    }
    report
}

/// Resolve `query` as a qualified name seen from the unit's scope.
pub fn lookup(env: &mut LookupEnvironment, unit: UnitId, query: &str) -> LookupReport {
    let compound = env.intern_dotted(query);
    let scope = env.unit_scope(unit);
    let mask = BindingMask::VARIABLE | BindingMask::TYPE | BindingMask::PACKAGE | BindingMask::METHOD;
    let mut site = InvocationSite::new();
    match env.get_binding_compound(scope, &compound, mask, &mut site) {
        Ok(binding) => LookupReport {
            query: query.to_string(),
            valid: binding.is_valid(),
            binding: describe_binding(env, &binding),
        },
        Err(abort) => LookupReport {
            query: query.to_string(),
            valid: false,
            binding: format!("aborted: {abort}"),
        },
    }
}

/// One-line description of a binding.
pub fn describe_binding(env: &mut LookupEnvironment, binding: &Binding) -> String {
    match binding {
        Binding::Package(package) => {
            let name = env.package(*package).compound_name.clone();
            format!("package {}", env.compound_to_string(&name))
        }
        Binding::Type(ty) => format!("type {}", env.type_name(*ty)),
        Binding::Field(field) => {
            let declaring = env.type_name(env.field(*field).declaring_class);
            let name = env.resolve_atom(env.field(*field).name).to_string();
            match env.field_type(*field) {
                Ok(ty) => format!("field {declaring}.{name}: {}", env.type_name(ty)),
                Err(_) => format!("field {declaring}.{name}"),
            }
        }
        Binding::Method(method) => {
            let _ = env.resolve_method_types(*method);
            let declaring = env.type_name(env.method(*method).declaring_class);
            format!("method {declaring}.{}", env.method_name(*method))
        }
        Binding::Variable(local) => {
            let name = env.resolve_atom(env.local(*local).name).to_string();
            match env.local_type(*local) {
                Ok(ty) => format!("variable {name}: {}", env.type_name(ty)),
                Err(_) => format!("variable {name}"),
            }
        }
        Binding::Import(import) => format!("import {}", env.compound_to_string(&import.compound_name)),
        Binding::CompilationUnit(unit) => format!("unit {}", env.unit(*unit).decl.file_name),
        Binding::Problem(problem) => {
            let mut text = format!("problem {:?} for {}", problem.reason, env.compound_to_string(&problem.name));
            if let Some(closest) = &problem.closest_match {
                text.push_str(" (closest: ");
                text.push_str(&describe_binding(env, closest));
                text.push(')');
            }
            text
        }
    }
}

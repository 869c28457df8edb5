//! Declaration input.
//!
//! The lookup engine never parses source text. A prior inference pass hands
//! it one `CompilationUnitDecl` per file: the unit's package, imports,
//! inferred types with their attributes and functions, and unit-level
//! variables and functions. Everything here is plain data and can be loaded
//! from JSON.

use serde::{Deserialize, Serialize};

use crate::modifiers::{ModifierKeyword, Modifiers, modifiers_from_keywords};

fn default_true() -> bool {
    true
}

/// Source range of a declaration, used for problem reporting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub length: u32,
}

impl Span {
    pub const fn new(start: u32, length: u32) -> Self {
        Self { start, length }
    }
}

/// One parsed and inferred file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompilationUnitDecl {
    pub file_name: String,
    /// Dotted package name; empty for the default package.
    pub package: String,
    pub imports: Vec<ImportDecl>,
    pub types: Vec<InferredTypeDecl>,
    /// Unit-level variables.
    pub variables: Vec<LocalDecl>,
    /// Unit-level functions.
    pub functions: Vec<MethodDecl>,
    /// Name of the library type every unit-level name implicitly extends
    /// (e.g. `Window`).
    pub global_super_type: Option<String>,
}

impl CompilationUnitDecl {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            ..Self::default()
        }
    }

    /// Split the dotted package name into segments.
    pub fn package_segments(&self) -> Vec<&str> {
        if self.package.is_empty() {
            Vec::new()
        } else {
            self.package.split('.').collect()
        }
    }

    /// Main type name: the file name without directories and extension.
    pub fn main_type_name(&self) -> &str {
        let start = self.file_name.rfind(['/', '\\']).map_or(0, |i| i + 1);
        let base = &self.file_name[start..];
        match base.rfind('.') {
            Some(end) if end > 0 => &base[..end],
            _ => base,
        }
    }
}

/// An import declaration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImportDecl {
    /// Dotted name of the imported type or package.
    pub name: String,
    /// `name.*` form.
    pub on_demand: bool,
    /// Imports the declarations of another file.
    pub is_file_import: bool,
    pub span: Span,
}

/// A type produced by inference: a class, a constructor function with its
/// prototype members, or an object literal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InferredTypeDecl {
    pub name: String,
    pub modifiers: Vec<ModifierKeyword>,
    pub superclass: Option<String>,
    /// Types whose members are mixed into this one.
    pub mixins: Vec<String>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
    pub member_types: Vec<InferredTypeDecl>,
    /// Other names that denote this same type.
    pub synonyms: Vec<String>,
    /// Declaration that may be merged with other declarations of the same
    /// name across units.
    pub is_indexed: bool,
    pub is_anonymous: bool,
    pub is_object_literal: bool,
    #[serde(default = "default_true")]
    pub is_definition: bool,
    pub span: Span,
}

impl Default for InferredTypeDecl {
    fn default() -> Self {
        Self {
            name: String::new(),
            modifiers: Vec::new(),
            superclass: None,
            mixins: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            member_types: Vec::new(),
            synonyms: Vec::new(),
            is_indexed: false,
            is_anonymous: false,
            is_object_literal: false,
            is_definition: true,
            span: Span::default(),
        }
    }
}

impl InferredTypeDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    #[must_use]
    pub fn with_field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn with_method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }

    #[must_use]
    pub fn with_member_type(mut self, member: InferredTypeDecl) -> Self {
        self.member_types.push(member);
        self
    }

    pub fn modifier_set(&self) -> Modifiers {
        modifiers_from_keywords(&self.modifiers)
    }

    pub(crate) fn has_field_named(&self, name: &str) -> bool {
        self.fields.iter().any(|field| field.name == name)
    }
}

/// An inferred attribute.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldDecl {
    pub name: String,
    /// Type descriptor (`int`, `Foo`, `a.b.Foo`, `Foo[]`); unknown when absent.
    pub type_name: Option<String>,
    pub modifiers: Vec<ModifierKeyword>,
    pub span: Span,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn typed(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    #[must_use]
    pub fn with_modifier(mut self, modifier: ModifierKeyword) -> Self {
        self.modifiers.push(modifier);
        self
    }

    #[must_use]
    pub fn at(mut self, start: u32, length: u32) -> Self {
        self.span = Span::new(start, length);
        self
    }
}

/// A function parameter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParamDecl {
    pub name: String,
    pub type_name: Option<String>,
    pub varargs: bool,
}

impl ParamDecl {
    pub fn new(name: impl Into<String>, type_name: Option<&str>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.map(str::to_string),
            varargs: false,
        }
    }

    pub fn varargs(name: impl Into<String>, type_name: &str) -> Self {
        Self {
            name: name.into(),
            type_name: Some(type_name.to_string()),
            varargs: true,
        }
    }
}

/// A function, method or constructor.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MethodDecl {
    /// Absent for anonymous functions and constructors.
    pub name: Option<String>,
    pub parameters: Vec<ParamDecl>,
    pub return_type: Option<String>,
    pub modifiers: Vec<ModifierKeyword>,
    pub is_constructor: bool,
    /// Locals declared in the body, for scope construction.
    pub locals: Vec<LocalDecl>,
    /// Function or class expressions nested in the body.
    pub local_types: Vec<InferredTypeDecl>,
    pub span: Span,
}

impl MethodDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn constructor() -> Self {
        Self {
            is_constructor: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn param(mut self, name: impl Into<String>, type_name: Option<&str>) -> Self {
        self.parameters.push(ParamDecl::new(name, type_name));
        self
    }

    #[must_use]
    pub fn varargs_param(mut self, name: impl Into<String>, type_name: &str) -> Self {
        self.parameters.push(ParamDecl::varargs(name, type_name));
        self
    }

    #[must_use]
    pub fn returns(mut self, type_name: impl Into<String>) -> Self {
        self.return_type = Some(type_name.into());
        self
    }

    #[must_use]
    pub fn with_modifier(mut self, modifier: ModifierKeyword) -> Self {
        self.modifiers.push(modifier);
        self
    }

    #[must_use]
    pub fn at(mut self, start: u32, length: u32) -> Self {
        self.span = Span::new(start, length);
        self
    }

    /// Name the function is looked up by. Constructors answer `<init>`.
    pub fn selector(&self) -> Option<&str> {
        if self.is_constructor {
            Some("<init>")
        } else {
            self.name.as_deref()
        }
    }
}

/// A variable declaration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LocalDecl {
    pub name: String,
    pub type_name: Option<String>,
    pub span: Span,
}

impl LocalDecl {
    pub fn new(name: impl Into<String>, type_name: Option<&str>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.map(str::to_string),
            span: Span::default(),
        }
    }
}

#[cfg(test)]
#[path = "../tests/decl_tests.rs"]
mod tests;

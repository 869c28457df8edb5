//! External API metadata descriptors and their bindings.
//!
//! Metadata types describe library APIs (browser objects, runtime
//! libraries) declaratively. Their fields and methods are built the first
//! time anyone asks for them; every metadata type also gets a `prototype`
//! field.

use std::sync::Arc;

use jsbind_common::Atom;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::binary::INIT;
use crate::environment::LookupEnvironment;
use crate::ids::{FieldId, MethodId, TypeId};
use crate::members::MemberTable;
use crate::modifiers::{Modifiers, TypeTags};
use crate::symbols::{FieldBinding, LazyType, MethodBinding, MethodKind};
use crate::types::{MetadataOrigin, Provenance, ReferenceBinding};

/// Name of the synthetic field every constructor-like type carries.
pub const PROTOTYPE: &str = "prototype";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MetadataProperty {
    pub name: String,
    pub data_type: Option<String>,
    pub is_static: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MetadataParameter {
    pub name: String,
    pub data_type: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MetadataMethod {
    pub name: String,
    pub parameters: Vec<MetadataParameter>,
    pub returns: Option<String>,
    pub is_static: bool,
}

/// A library type described by an API metadata file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MetadataTypeDescriptor {
    /// Dotted name of the type.
    pub name: String,
    pub superclass: Option<String>,
    pub properties: Vec<MetadataProperty>,
    pub methods: Vec<MetadataMethod>,
    pub constructors: Vec<MetadataMethod>,
    pub file_name: Option<String>,
}

impl MetadataTypeDescriptor {
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
    pub fn with_property(mut self, name: &str, data_type: Option<&str>) -> Self {
        self.properties.push(MetadataProperty {
            name: name.to_string(),
            data_type: data_type.map(str::to_string),
            is_static: false,
        });
        self
    }

    #[must_use]
    pub fn with_method(mut self, method: MetadataMethod) -> Self {
        self.methods.push(method);
        self
    }

    #[must_use]
    pub fn with_constructor(mut self, constructor: MetadataMethod) -> Self {
        self.constructors.push(constructor);
        self
    }
}

impl MetadataMethod {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn param(mut self, name: &str, data_type: Option<&str>) -> Self {
        self.parameters.push(MetadataParameter {
            name: name.to_string(),
            data_type: data_type.map(str::to_string),
        });
        self
    }

    #[must_use]
    pub fn returns(mut self, data_type: impl Into<String>) -> Self {
        self.returns = Some(data_type.into());
        self
    }
}

impl LookupEnvironment {
    /// Create the binding for a metadata type. Members are built lazily.
    pub fn accept_metadata(&mut self, descriptor: Arc<MetadataTypeDescriptor>) -> TypeId {
        let compound = self.interner.intern_dotted(&descriptor.name);
        let Some((&simple, package_name)) = compound.split_last() else {
            return TypeId::ANY;
        };
        let package = self.create_package(package_name);
        if let Some(existing) = self.packages[package.index()].get_type0(simple)
            && !self.is_placeholder(existing)
        {
            return existing;
        }
        let raw_superclass = descriptor
            .superclass
            .as_deref()
            .map(|name| self.interner.intern_dotted(name));
        let mut binding = ReferenceBinding::new(
            compound,
            package,
            Modifiers::PUBLIC,
            Provenance::Metadata(Box::new(MetadataOrigin {
                descriptor: Arc::clone(&descriptor),
                raw_superclass: raw_superclass.clone(),
                fields_built: false,
                methods_built: false,
            })),
        );
        binding.file_name = self
            .interner
            .intern(descriptor.file_name.as_deref().unwrap_or(&descriptor.name));
        binding.tags |= TypeTags::HAS_NO_MEMBER_TYPES;
        if raw_superclass.is_some() {
            binding.tags |= TypeTags::HAS_UNRESOLVED_SUPERCLASS;
        }
        let id = self.install_type(package, simple, binding).id();
        debug!(name = %descriptor.name, "accepted metadata type");
        id
    }

    /// Build the field table of a metadata type on first use. Duplicate
    /// property names are all dropped.
    pub(crate) fn build_metadata_fields(&mut self, ty: TypeId) {
        let Some(descriptor) = self.metadata_origin_pending(ty, false) else {
            return;
        };
        trace!(ty = %self.type_name(ty), "building metadata fields");
        let modifiers = self.reference(ty).map_or(Modifiers::PUBLIC, |binding| binding.modifiers);

        let mut seen: FxHashMap<Atom, usize> = FxHashMap::default();
        let mut duplicates = Vec::new();
        let mut fields: Vec<FieldId> = Vec::with_capacity(descriptor.properties.len() + 1);
        for property in &descriptor.properties {
            let name = self.interner.intern(&property.name);
            if seen.insert(name, fields.len()).is_some() {
                duplicates.push(name);
                continue;
            }
            let mut field_modifiers = Modifiers::PUBLIC;
            if property.is_static {
                field_modifiers |= Modifiers::STATIC;
            }
            let binding = FieldBinding {
                name,
                ty: self.lazy_type(property.data_type.as_deref(), None),
                modifiers: field_modifiers,
                declaring_class: ty,
                span: None,
            };
            fields.push(self.alloc_field(binding));
        }
        if !duplicates.is_empty() {
            fields.retain(|field| !duplicates.contains(&self.fields[field.index()].name));
        }
        let prototype = FieldBinding {
            name: self.interner.intern(PROTOTYPE),
            ty: LazyType::ANY,
            modifiers,
            declaring_class: ty,
            span: None,
        };
        fields.push(self.alloc_field(prototype));

        if let Some(binding) = self.reference_mut(ty) {
            binding.fields = MemberTable::new(fields);
            if let Provenance::Metadata(origin) = &mut binding.provenance {
                origin.fields_built = true;
            }
        }
    }

    /// Build the method table of a metadata type on first use. Constructors
    /// become `<init>` methods allocating the type.
    pub(crate) fn build_metadata_methods(&mut self, ty: TypeId) {
        let Some(descriptor) = self.metadata_origin_pending(ty, true) else {
            return;
        };
        trace!(ty = %self.type_name(ty), "building metadata methods");
        let mut methods: Vec<MethodId> =
            Vec::with_capacity(descriptor.methods.len() + descriptor.constructors.len());
        for method in &descriptor.methods {
            methods.push(self.create_metadata_method(ty, method, false));
        }
        for constructor in &descriptor.constructors {
            methods.push(self.create_metadata_method(ty, constructor, true));
        }
        if let Some(binding) = self.reference_mut(ty) {
            binding.methods = MemberTable::new(methods);
            if let Provenance::Metadata(origin) = &mut binding.provenance {
                origin.methods_built = true;
            }
        }
    }

    fn metadata_origin_pending(
        &self,
        ty: TypeId,
        methods: bool,
    ) -> Option<Arc<MetadataTypeDescriptor>> {
        match &self.reference(ty)?.provenance {
            Provenance::Metadata(origin) => {
                let built = if methods {
                    origin.methods_built
                } else {
                    origin.fields_built
                };
                (!built).then(|| Arc::clone(&origin.descriptor))
            }
            _ => None,
        }
    }

    fn create_metadata_method(
        &mut self,
        ty: TypeId,
        method: &MetadataMethod,
        is_constructor: bool,
    ) -> MethodId {
        let mut modifiers = Modifiers::PUBLIC;
        if method.is_static {
            modifiers |= Modifiers::STATIC;
        }
        let parameters: SmallVec<[LazyType; 4]> = method
            .parameters
            .iter()
            .map(|param| self.lazy_type(param.data_type.as_deref(), None))
            .collect();
        let return_type = if is_constructor {
            LazyType::Resolved(TypeId::VOID)
        } else {
            self.lazy_type(method.returns.as_deref(), None)
        };
        if !return_type.is_resolved() || parameters.iter().any(|param| !param.is_resolved()) {
            modifiers |= Modifiers::UNRESOLVED;
        }
        let selector = if is_constructor { INIT } else { method.name.as_str() };
        let binding = MethodBinding {
            selector: self.interner.intern(selector),
            modifiers,
            parameters,
            return_type,
            declaring_class: ty,
            kind: if is_constructor {
                MethodKind::Constructor
            } else {
                MethodKind::Method
            },
            allocation_type: is_constructor.then_some(ty),
            span: None,
        };
        self.alloc_method(binding)
    }
}

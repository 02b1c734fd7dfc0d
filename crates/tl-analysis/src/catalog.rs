//! Built-in library catalog
//!
//! Keyword documentation, global functions, standard modules and the methods
//! of built-in types. A catalog is plain data: the analyzer receives one at
//! construction and never mutates it. The compiled-in catalog can be extended
//! with a TOML file of the same shape.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::types::Type;

const BUILTIN: &str = include_str!("catalog/builtin.toml");

/// Errors loading a catalog extension
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// A function, method or module member with a signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FunctionEntry {
    pub params: Vec<String>,
    pub returns: String,
    pub doc: String,
}

impl Default for FunctionEntry {
    fn default() -> Self {
        Self {
            params: Vec::new(),
            returns: "Any".to_string(),
            doc: String::new(),
        }
    }
}

impl FunctionEntry {
    pub fn return_type(&self) -> Type {
        Type::parse(&self.returns)
    }

    /// `func name(params) -> returns`
    pub fn signature(&self, name: &str) -> String {
        format!("func {}({}) -> {}", name, self.params.join(", "), self.returns)
    }
}

/// A module constant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConstantEntry {
    #[serde(rename = "type")]
    pub ty: String,
    pub doc: String,
}

impl ConstantEntry {
    pub fn value_type(&self) -> Type {
        Type::parse(&self.ty)
    }
}

/// A standard module (`math`, `io`, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModuleEntry {
    pub doc: String,
    pub functions: BTreeMap<String, FunctionEntry>,
    pub constants: BTreeMap<String, ConstantEntry>,
}

/// A built-in type and its methods
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TypeEntry {
    pub doc: String,
    /// Type parameter names, in argument order
    pub generics: Vec<String>,
    pub methods: BTreeMap<String, FunctionEntry>,
}

impl TypeEntry {
    /// Pair the type parameters with a receiver's arguments (missing ones are `Any`)
    pub fn bindings(&self, receiver: &Type) -> Vec<(String, Type)> {
        let args = receiver.args();
        self.generics
            .iter()
            .enumerate()
            .map(|(i, param)| (param.clone(), args.get(i).cloned().unwrap_or(Type::Any)))
            .collect()
    }

    /// The type named with `Any` for every parameter (`Array<Any>`)
    pub fn open_instance(&self, name: &str) -> Type {
        if self.generics.is_empty() {
            Type::named(name)
        } else {
            Type::Generic {
                name: name.to_string(),
                args: vec![Type::Any; self.generics.len()],
            }
        }
    }
}

/// Immutable description of everything built into TL
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Catalog {
    pub keywords: BTreeMap<String, String>,
    pub globals: BTreeMap<String, FunctionEntry>,
    pub modules: BTreeMap<String, ModuleEntry>,
    pub types: BTreeMap<String, TypeEntry>,
}

impl Catalog {
    /// The catalog compiled into the crate
    pub fn builtin() -> Self {
        Self::from_toml_str(BUILTIN).unwrap_or_else(|err| {
            warn!("built-in catalog failed to parse: {}", err);
            Self::default()
        })
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load a catalog extension file
    pub fn load_file(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Merge another catalog into this one; entries in `other` win
    pub fn extend(&mut self, other: Catalog) {
        self.keywords.extend(other.keywords);
        self.globals.extend(other.globals);
        for (name, module) in other.modules {
            let entry = self.modules.entry(name).or_default();
            if !module.doc.is_empty() {
                entry.doc = module.doc;
            }
            entry.functions.extend(module.functions);
            entry.constants.extend(module.constants);
        }
        for (name, ty) in other.types {
            let entry = self.types.entry(name).or_default();
            if !ty.doc.is_empty() {
                entry.doc = ty.doc;
            }
            if !ty.generics.is_empty() {
                entry.generics = ty.generics;
            }
            entry.methods.extend(ty.methods);
        }
    }

    pub fn keyword_doc(&self, word: &str) -> Option<&str> {
        self.keywords.get(word).map(String::as_str)
    }

    pub fn global(&self, name: &str) -> Option<&FunctionEntry> {
        self.globals.get(name)
    }

    pub fn module(&self, name: &str) -> Option<&ModuleEntry> {
        self.modules.get(name)
    }

    pub fn module_function(&self, module: &str, name: &str) -> Option<&FunctionEntry> {
        self.module(module)?.functions.get(name)
    }

    pub fn module_constant(&self, module: &str, name: &str) -> Option<&ConstantEntry> {
        self.module(module)?.constants.get(name)
    }

    pub fn type_entry(&self, name: &str) -> Option<&TypeEntry> {
        self.types.get(name)
    }

    /// Method of a built-in type, looked up by the receiver's type name
    pub fn method(&self, receiver: &Type, name: &str) -> Option<(&TypeEntry, &FunctionEntry)> {
        let entry = self.type_entry(receiver.name()?)?;
        entry.methods.get(name).map(|method| (entry, method))
    }
}

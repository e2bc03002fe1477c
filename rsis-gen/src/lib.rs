#![doc = include_str!("../README.md")]
//! ## Feature flags
#![doc = document_features::document_features!()]
#![deny(unsafe_code)]
#![deny(clippy::all)]

use std::{
    fmt::Display,
    path::{Path, PathBuf},
    str::FromStr,
};

use rsis_schema::{InterfaceDocument, Language};

#[cfg(feature = "cpp")]
mod cpp;
pub mod model;
#[cfg(feature = "rust")]
mod rust;
mod template;

pub use model::{FieldDef, FieldKind, Literal, StructDef};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Struct '{class}' referenced by '{referenced_by}' is not declared")]
    UnresolvedClass {
        class: String,
        referenced_by: String,
    },

    #[error("Struct cycle: {}", .chain.join(" -> "))]
    Cycle { chain: Vec<String> },

    #[error("Unknown type '{ty}' for field '{field}'")]
    UnknownType { field: String, ty: String },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("'{0}' is not a valid identifier")]
    InvalidIdentifier(String),

    #[error("Unresolved template placeholder '{0}'")]
    Template(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Schema(#[from] rsis_schema::Error),
}

/// Output language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    #[cfg(feature = "cpp")]
    Cpp,
    #[cfg(feature = "rust")]
    Rust,
}

impl Target {
    pub fn language(self) -> Language {
        match self {
            #[cfg(feature = "cpp")]
            Target::Cpp => Language::Cpp,
            #[cfg(feature = "rust")]
            Target::Rust => Language::Rust,
        }
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.language())
    }
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<Language>()? {
            #[cfg(feature = "cpp")]
            Language::Cpp => Ok(Target::Cpp),
            #[cfg(feature = "rust")]
            Language::Rust => Ok(Target::Rust),
            #[allow(unreachable_patterns)]
            other => Err(rsis_schema::Error::UnknownLanguage(other.to_string()).into()),
        }
    }
}

/// A generated source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// File name, relative to the output directory
    pub name: String,
    pub contents: String,
}

/// A fully resolved interface, ready for emission.
///
/// Every struct reference, type name and default value is checked on construction, so nothing is
/// emitted for an invalid document.
#[derive(Debug, Clone)]
pub struct Generator {
    model: String,
    structs: Vec<StructDef>,
}

impl Generator {
    pub fn new(document: &InterfaceDocument) -> Result<Self, Error> {
        let structs = model::resolve(document)?;
        log::debug!(
            "Resolved interface '{}': {} structs",
            document.model,
            structs.len()
        );
        Ok(Self {
            model: document.model.clone(),
            structs,
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::new(&InterfaceDocument::from_path(path)?)
    }

    /// Name of the top-level model struct
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Structs in emission order: every struct follows the structs it contains.
    pub fn structs(&self) -> &[StructDef] {
        &self.structs
    }

    pub fn generate(&self, target: Target) -> Result<Vec<GeneratedFile>, Error> {
        match target {
            #[cfg(feature = "cpp")]
            Target::Cpp => cpp::generate(self),
            #[cfg(feature = "rust")]
            Target::Rust => rust::generate(self),
        }
    }

    /// Generate `target` and write the files into `dir`, creating it if needed.
    pub fn write_to(&self, target: Target, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, Error> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        self.generate(target)?
            .into_iter()
            .map(|file| {
                let path = dir.join(&file.name);
                log::info!("Writing {path:?}");
                std::fs::write(&path, file.contents)?;
                Ok(path)
            })
            .collect()
    }
}

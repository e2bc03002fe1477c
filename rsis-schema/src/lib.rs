#![doc=include_str!( "../README.md")]
#![deny(unsafe_code)]
#![deny(clippy::all)]

use thiserror::Error;

pub mod document;
pub mod interface;
pub mod library;
pub mod manifest;
pub mod port;
pub mod primitive;
mod utils;

pub use document::SchemaDocument;
pub use interface::{InterfaceDocument, InterfaceField};
pub use library::{ClassData, Field, LibraryData};
pub use manifest::{Manifest, ManifestName};
pub use port::{Direction, Port, PortType};
pub use primitive::{Language, PrimitiveType};
pub use utils::OrderedMap;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unknown primitive type '{0}'")]
    UnknownPrimitive(String),

    #[error("Unknown implementation language '{0}'")]
    UnknownLanguage(String),

    #[error("Unknown port direction '{0}'")]
    UnknownDirection(String),

    #[error("Field '{field}' collides with '{existing}' at offset {offset}")]
    OffsetCollision {
        field: String,
        existing: String,
        offset: usize,
    },

    #[error("Error in schema: {0}")]
    Schema(String),

    #[error("Error parsing TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Error parsing JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Semver(#[from] lenient_semver::parser::OwnedError),
}

//! The `rsis` crate lets a host process manipulate model objects owned by natively compiled,
//! dynamically loaded model libraries.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use rsis::{Location, LoaderOptions, Session, Value};
//!
//! let mut session = Session::new(LoaderOptions::from_env());
//! session.load_library("satellite", None, Some("release")).unwrap();
//!
//! let sat = session.create_model("satellite", "sat1", ["flight"]).unwrap();
//! let gnc = session.create_model("satellite", "sat2", ["flight"]).unwrap();
//!
//! session.set(&sat, "data.mass", &Value::from(35.6)).unwrap();
//! assert_eq!(session.get(&sat, "data.mass").unwrap().as_scalar::<f64>(), Some(35.6));
//!
//! session
//!     .connect(Location::new(sat, "pos"), Location::new(gnc, "pos"))
//!     .unwrap();
//! ```
//!
//! ## Safety
//!
//! Reads and writes go straight to native process memory. Their correctness depends entirely on
//! the accuracy of the loaded metadata, and nothing here synchronises with the native scheduler.
#![doc = document_features::document_features!()]
#![deny(clippy::all)]

use std::{fmt::Display, path::PathBuf};

// Re-export the schema crate
pub use rsis_schema as schema;
pub use rsis_sys as sys;

#[cfg(feature = "gen")]
pub use rsis_gen as gen;

pub mod connection;
pub mod loader;
pub mod model;
mod reflect;
pub mod registry;
pub mod resolver;
pub mod scheduler;
pub mod session;
pub mod signal;
pub mod value;

pub use connection::ConnectionGraph;
pub use loader::{LibraryLoader, LoadStatus, LoaderOptions};
pub use model::{Location, ModelInstance, ModelReference};
pub use registry::MetadataRegistry;
pub use resolver::{PortResolver, ResolvedPort};
pub use scheduler::{Scheduler, SchedulerState};
pub use session::Session;
pub use signal::{SignalAccessor, Utf8Access};
pub use value::Value;

pub mod built_info {
    // The file has been placed there by the build script.
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

/// The kind of entity a lookup failed for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Library,
    Model,
    Struct,
    Field,
    Connection,
}

impl Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Entity::Library => "Library",
            Entity::Model => "Model",
            Entity::Struct => "Struct",
            Entity::Field => "Field",
            Entity::Connection => "Connection",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{kind} '{name}' not found")]
    NotFound { kind: Entity, name: String },

    #[error("{kind} '{name}' already exists")]
    AlreadyExists { kind: Entity, name: String },

    #[error("Type mismatch at '{path}': expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: String,
        found: String,
    },

    #[error("Unsupported type '{ty}' at '{path}'")]
    UnsupportedType { path: String, ty: String },

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Native call {call} failed: {message}")]
    NativeCall { call: &'static str, message: String },

    #[error("No manifest found for library '{name}' (profile: {})", .profile.as_deref().unwrap_or("any"))]
    LibraryNotFound {
        name: String,
        profile: Option<String>,
    },

    #[error("Invalid manifest {}: {reason}", .path.display())]
    InvalidManifest { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Schema(#[from] rsis_schema::Error),

    #[error(transparent)]
    Sys(#[from] rsis_sys::Error),

    #[error(transparent)]
    Utf8Error(#[from] std::str::Utf8Error),
}

impl Error {
    pub(crate) fn not_found(kind: Entity, name: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            name: name.into(),
        }
    }
}

//! User-authored interface documents consumed by the generator.
//!
//! ```toml
//! model = "Sat"
//!
//! [fields.inputs]
//! class = "SatInputs"
//!
//! [fields.data]
//! type = "Float64"
//! dims = []
//! value = 35.6
//!
//! [structs.SatInputs.pos]
//! type = "Float64"
//! dims = [3]
//! unit = "m"
//! ```
//!
//! `fields` holds the top-level model's fields; every other struct lives under `structs`. Field
//! order follows the document.

use std::{path::Path, str::FromStr};

use serde::Deserialize;

use crate::{utils::OrderedMap, Error};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum InterfaceField {
    /// A nested struct
    Composite {
        class: String,
        #[serde(default)]
        dims: Vec<usize>,
        #[serde(default)]
        desc: String,
    },
    /// A primitive signal
    Signal {
        #[serde(rename = "type")]
        r#type: String,
        #[serde(default)]
        dims: Vec<usize>,
        #[serde(default)]
        unit: Option<String>,
        #[serde(default)]
        value: Option<serde_json::Value>,
        #[serde(default)]
        desc: String,
    },
}

impl InterfaceField {
    pub fn dims(&self) -> &[usize] {
        match self {
            InterfaceField::Composite { dims, .. } | InterfaceField::Signal { dims, .. } => dims,
        }
    }

    pub fn desc(&self) -> &str {
        match self {
            InterfaceField::Composite { desc, .. } | InterfaceField::Signal { desc, .. } => desc,
        }
    }

    pub fn class(&self) -> Option<&str> {
        match self {
            InterfaceField::Composite { class, .. } => Some(class),
            InterfaceField::Signal { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InterfaceDocument {
    /// Name of the top-level model struct
    pub model: String,
    #[serde(default)]
    pub fields: OrderedMap<InterfaceField>,
    #[serde(default)]
    pub structs: OrderedMap<OrderedMap<InterfaceField>>,
}

impl InterfaceDocument {
    pub fn from_toml_str(s: &str) -> Result<Self, Error> {
        toml::from_str(s).map_err(Error::from)
    }

    pub fn from_json_str(s: &str) -> Result<Self, Error> {
        serde_json::from_str(s).map_err(Error::from)
    }

    /// Read a document, choosing the format by file extension (`.json`, anything else is TOML).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Schema(format!("reading {}: {e}", path.display())))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&text),
            _ => Self::from_toml_str(&text),
        }
    }

    /// Fields of a struct by name. The model name resolves to the top-level `fields` table.
    pub fn struct_fields(&self, name: &str) -> Option<&OrderedMap<InterfaceField>> {
        if name == self.model {
            Some(&self.fields)
        } else {
            self.structs.get(name)
        }
    }
}

impl FromStr for InterfaceDocument {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_toml_str(s)
    }
}

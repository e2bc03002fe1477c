//! Library manifests.
//!
//! A manifest is a TOML file named `<library>.<profile>.rsis.toml` that sits next to (or above) a
//! compiled model library:
//!
//! ```toml
//! [rsis]
//! name = "satellite"
//! language = "cpp"
//! version = "0.1.0"
//!
//! [binary]
//! file = "libsatellite.so"
//!
//! [schema]
//! top = "Sat"
//! ```

use std::{path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{document::SchemaDocument, primitive::Language, Error};

/// Suffix shared by every manifest file name
pub const MANIFEST_SUFFIX: &str = ".rsis.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsisSection {
    /// Library identifier
    pub name: String,
    /// Implementation language of the binary
    pub language: Language,
    /// Framework version the library was built against
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinarySection {
    /// File name of the shared library, relative to the manifest's directory
    pub file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub rsis: RsisSection,
    pub binary: BinarySection,
    /// Embedded schema document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<serde_json::Value>,
}

impl FromStr for Manifest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s).map_err(Error::from)
    }
}

impl Manifest {
    /// The declared framework version
    pub fn framework_version(&self) -> Result<semver::Version, Error> {
        lenient_semver::parse(&self.rsis.version).map_err(|e| e.owned().into())
    }

    /// The embedded schema document, if any
    pub fn schema_document(&self) -> Option<Result<SchemaDocument, Error>> {
        self.schema.clone().map(SchemaDocument::from_value)
    }
}

/// Library identifier and build profile encoded in a manifest file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ManifestName {
    pub library: String,
    pub profile: String,
}

impl ManifestName {
    pub fn new(library: impl Into<String>, profile: impl Into<String>) -> Self {
        Self {
            library: library.into(),
            profile: profile.into(),
        }
    }

    /// Parse `<library>.<profile>.rsis.toml`. Returns `None` for any other file name.
    pub fn parse(file_name: &str) -> Option<Self> {
        let stem = file_name.strip_suffix(MANIFEST_SUFFIX)?;
        let (library, profile) = stem.rsplit_once('.')?;
        if library.is_empty() || profile.is_empty() {
            return None;
        }
        Some(Self::new(library, profile))
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}{MANIFEST_SUFFIX}", self.library, self.profile)
    }
}

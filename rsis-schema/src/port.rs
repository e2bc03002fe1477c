//! Port descriptors: one named field of a native struct, either a leaf signal or a nested struct.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{primitive::PrimitiveType, Error};

/// Direction tag of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Input,
    Output,
    Data,
    #[default]
    Unspecified,
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "input" | "in" => Ok(Direction::Input),
            "output" | "out" => Ok(Direction::Output),
            "data" => Ok(Direction::Data),
            "" | "unspecified" => Ok(Direction::Unspecified),
            _ => Err(Error::UnknownDirection(s.to_owned())),
        }
    }
}

/// The element type carried by a port.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PortType {
    /// A member of the supported primitive set
    Primitive(PrimitiveType),
    /// A leaf whose type name is outside the supported primitive set. Kept so that the failure
    /// surfaces when the port is accessed rather than when the library is loaded.
    Unsupported(String),
    /// A nested struct, by name
    Class(String),
}

impl Display for PortType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortType::Primitive(ty) => write!(f, "{ty}"),
            PortType::Unsupported(name) => f.write_str(name),
            PortType::Class(name) => write!(f, "struct {name}"),
        }
    }
}

/// Field descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Port {
    pub r#type: PortType,
    /// Dimension tuple. Empty means scalar.
    pub dims: Vec<usize>,
    /// Optional unit string. An empty unit is normalised to `None`.
    pub unit: Option<String>,
    pub desc: String,
    pub direction: Direction,
    /// Declared default value. Always `None` for composite ports.
    pub default: Option<serde_json::Value>,
}

impl Port {
    /// Create a leaf port of a supported primitive type
    pub fn signal(ty: PrimitiveType, dims: Vec<usize>) -> Self {
        Self::with_type(PortType::Primitive(ty), dims)
    }

    /// Create a composite port referencing another struct
    pub fn composite(class: impl Into<String>, dims: Vec<usize>) -> Self {
        Self::with_type(PortType::Class(class.into()), dims)
    }

    /// Create a leaf port from a schema type name, keeping unknown names as
    /// [`PortType::Unsupported`].
    pub fn from_type_name(name: &str, dims: Vec<usize>) -> Self {
        let r#type = name
            .parse::<PrimitiveType>()
            .map(PortType::Primitive)
            .unwrap_or_else(|_| PortType::Unsupported(name.to_owned()));
        Self::with_type(r#type, dims)
    }

    fn with_type(r#type: PortType, dims: Vec<usize>) -> Self {
        Self {
            r#type,
            dims,
            unit: None,
            desc: String::new(),
            direction: Direction::Unspecified,
            default: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        let unit = unit.into();
        self.unit = (!unit.is_empty()).then_some(unit);
        self
    }

    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_default(mut self, default: serde_json::Value) -> Self {
        if !self.is_composite() {
            self.default = Some(default);
        }
        self
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.r#type, PortType::Class(_))
    }

    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty()
    }

    /// Name of the referenced struct for composite ports
    pub fn class(&self) -> Option<&str> {
        match &self.r#type {
            PortType::Class(name) => Some(name),
            _ => None,
        }
    }

    /// The primitive element type for supported leaf ports
    pub fn primitive(&self) -> Option<PrimitiveType> {
        match self.r#type {
            PortType::Primitive(ty) => Some(ty),
            _ => None,
        }
    }

    /// Total number of elements described by the dimension tuple; 1 for scalars. `None` if the
    /// count overflows `usize`.
    pub fn element_count(&self) -> Option<usize> {
        element_count(&self.dims)
    }
}

/// Number of elements described by a dimension tuple, or `None` if it overflows `usize`.
pub fn element_count(dims: &[usize]) -> Option<usize> {
    dims.iter().try_fold(1usize, |count, &d| count.checked_mul(d))
}

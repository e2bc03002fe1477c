//! The fixed primitive-type table shared by the registry, the signal accessor and the generator.
//!
//! Every schema primitive maps to exactly one native type name per implementation language, and
//! every native type name maps back to exactly one schema primitive.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// A primitive element type as it appears in schema documents (`"Float64"`, `"Int32"`, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    String,
}

/// Implementation language of a native model library, as declared in its manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[serde(alias = "c++")]
    Cpp,
    Rust,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::Cpp, Language::Rust];

    /// Whether model objects of this language are handed out boxed.
    ///
    /// A boxed object pointer addresses a single machine word holding the address of the actual
    /// struct, so one level of indirection must be applied before field offsets.
    pub fn is_boxed(self) -> bool {
        matches!(self, Language::Rust)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Cpp => "cpp",
            Language::Rust => "rust",
        }
    }
}

impl Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cpp" | "c++" => Ok(Language::Cpp),
            "rust" => Ok(Language::Rust),
            _ => Err(Error::UnknownLanguage(s.to_owned())),
        }
    }
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 12] = [
        PrimitiveType::Boolean,
        PrimitiveType::Int8,
        PrimitiveType::Int16,
        PrimitiveType::Int32,
        PrimitiveType::Int64,
        PrimitiveType::UInt8,
        PrimitiveType::UInt16,
        PrimitiveType::UInt32,
        PrimitiveType::UInt64,
        PrimitiveType::Float32,
        PrimitiveType::Float64,
        PrimitiveType::String,
    ];

    /// The schema spelling of this type
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "Boolean",
            PrimitiveType::Int8 => "Int8",
            PrimitiveType::Int16 => "Int16",
            PrimitiveType::Int32 => "Int32",
            PrimitiveType::Int64 => "Int64",
            PrimitiveType::UInt8 => "UInt8",
            PrimitiveType::UInt16 => "UInt16",
            PrimitiveType::UInt32 => "UInt32",
            PrimitiveType::UInt64 => "UInt64",
            PrimitiveType::Float32 => "Float32",
            PrimitiveType::Float64 => "Float64",
            PrimitiveType::String => "String",
        }
    }

    /// Width in bytes of a single native element. Strings are opaque native objects and have no
    /// fixed width from the host's point of view.
    pub fn width(self) -> Option<usize> {
        match self {
            PrimitiveType::Boolean | PrimitiveType::Int8 | PrimitiveType::UInt8 => Some(1),
            PrimitiveType::Int16 | PrimitiveType::UInt16 => Some(2),
            PrimitiveType::Int32 | PrimitiveType::UInt32 | PrimitiveType::Float32 => Some(4),
            PrimitiveType::Int64 | PrimitiveType::UInt64 | PrimitiveType::Float64 => Some(8),
            PrimitiveType::String => None,
        }
    }

    /// The native type name used for this primitive in generated code of the given language.
    pub fn native_name(self, language: Language) -> &'static str {
        match language {
            Language::Cpp => match self {
                PrimitiveType::Boolean => "bool",
                PrimitiveType::Int8 => "int8_t",
                PrimitiveType::Int16 => "int16_t",
                PrimitiveType::Int32 => "int32_t",
                PrimitiveType::Int64 => "int64_t",
                PrimitiveType::UInt8 => "uint8_t",
                PrimitiveType::UInt16 => "uint16_t",
                PrimitiveType::UInt32 => "uint32_t",
                PrimitiveType::UInt64 => "uint64_t",
                PrimitiveType::Float32 => "float",
                PrimitiveType::Float64 => "double",
                PrimitiveType::String => "std::string",
            },
            Language::Rust => match self {
                PrimitiveType::Boolean => "bool",
                PrimitiveType::Int8 => "i8",
                PrimitiveType::Int16 => "i16",
                PrimitiveType::Int32 => "i32",
                PrimitiveType::Int64 => "i64",
                PrimitiveType::UInt8 => "u8",
                PrimitiveType::UInt16 => "u16",
                PrimitiveType::UInt32 => "u32",
                PrimitiveType::UInt64 => "u64",
                PrimitiveType::Float32 => "f32",
                PrimitiveType::Float64 => "f64",
                PrimitiveType::String => "String",
            },
        }
    }

    /// Reverse lookup of [`PrimitiveType::native_name`].
    pub fn from_native(language: Language, native: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.native_name(language) == native)
    }

    pub fn is_float(self) -> bool {
        matches!(self, PrimitiveType::Float32 | PrimitiveType::Float64)
    }

    pub fn is_integer(self) -> bool {
        !matches!(
            self,
            PrimitiveType::Boolean
                | PrimitiveType::Float32
                | PrimitiveType::Float64
                | PrimitiveType::String
        )
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            PrimitiveType::Int8 | PrimitiveType::Int16 | PrimitiveType::Int32 | PrimitiveType::Int64
        )
    }
}

impl Display for PrimitiveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PrimitiveType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownPrimitive(s.to_owned()))
    }
}

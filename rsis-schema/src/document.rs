//! Schema documents describing the byte layout of a library's native structs.
//!
//! A document has the shape
//!
//! ```json
//! {
//!   "top": "Sat",
//!   "structs": {
//!     "Sat":       { "inputs": { "class": "SatInputs", "offset": 0 } },
//!     "SatInputs": { "pos": { "type": "Float64", "offset": 0, "dims": [3], "unit": "m" } }
//!   }
//! }
//! ```
//!
//! Documents are kept as loosely typed JSON values so that a single malformed field entry can be
//! rejected on its own instead of failing the whole document.

use std::str::FromStr;

use serde_json::{Map, Value};

use crate::{
    port::{element_count, Port},
    Error,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDocument {
    top: String,
    structs: Map<String, Value>,
}

impl SchemaDocument {
    pub fn from_value(value: Value) -> Result<Self, Error> {
        let Value::Object(mut root) = value else {
            return Err(Error::Schema("schema document is not a table".into()));
        };
        let top = match root.remove("top") {
            Some(Value::String(top)) => top,
            Some(_) => return Err(Error::Schema("'top' is not a string".into())),
            None => return Err(Error::Schema("missing 'top'".into())),
        };
        let structs = match root.remove("structs") {
            Some(Value::Object(structs)) => structs,
            Some(_) => return Err(Error::Schema("'structs' is not a table".into())),
            None => return Err(Error::Schema("missing 'structs'".into())),
        };
        Ok(Self { top, structs })
    }

    /// Name of the top-level struct
    pub fn top(&self) -> &str {
        &self.top
    }

    /// The raw field table of a struct, if the struct is declared and is a table
    pub fn struct_entry(&self, name: &str) -> Option<&Map<String, Value>> {
        self.structs.get(name).and_then(Value::as_object)
    }

    pub fn struct_names(&self) -> impl Iterator<Item = &str> {
        self.structs.keys().map(String::as_str)
    }
}

impl FromStr for SchemaDocument {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_value(serde_json::from_str(s)?)
    }
}

fn parse_dims(entry: &Map<String, Value>, required: bool) -> Result<Vec<usize>, Error> {
    match entry.get("dims") {
        None if required => Err(Error::Schema("missing 'dims'".into())),
        None => Ok(Vec::new()),
        Some(Value::Array(dims)) => dims
            .iter()
            .map(|d| {
                d.as_u64()
                    .map(|d| d as usize)
                    .ok_or_else(|| Error::Schema(format!("invalid dimension {d}")))
            })
            .collect(),
        Some(other) => Err(Error::Schema(format!("'dims' is not a list: {other}"))),
    }
}

fn optional_str<'a>(entry: &'a Map<String, Value>, key: &str) -> Result<Option<&'a str>, Error> {
    match entry.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(Error::Schema(format!("'{key}' is not a string: {other}"))),
    }
}

/// Parse a single field entry into its byte offset and port descriptor.
///
/// Composite entries need `class` and `offset`; leaf entries need `type`, `offset` and `dims`.
pub fn parse_field(entry: &Value) -> Result<(usize, Port), Error> {
    let entry = entry
        .as_object()
        .ok_or_else(|| Error::Schema("field entry is not a table".into()))?;

    let offset = entry
        .get("offset")
        .ok_or_else(|| Error::Schema("missing 'offset'".into()))?
        .as_u64()
        .ok_or_else(|| Error::Schema("'offset' is not an unsigned integer".into()))?
        as usize;

    if let Some(class) = optional_str(entry, "class")? {
        let dims = parse_dims(entry, false)?;
        let port = Port::composite(class, dims).with_desc(optional_str(entry, "desc")?.unwrap_or_default());
        return Ok((offset, port));
    }

    let type_name =
        optional_str(entry, "type")?.ok_or_else(|| Error::Schema("missing 'class' or 'type'".into()))?;
    let dims = parse_dims(entry, true)?;
    if element_count(&dims).is_none() {
        return Err(Error::Schema(format!("dimensions {dims:?} overflow the element count")));
    }
    let mut port = Port::from_type_name(type_name, dims)
        .with_unit(optional_str(entry, "unit")?.unwrap_or_default())
        .with_desc(optional_str(entry, "desc")?.unwrap_or_default());
    if let Some(direction) = optional_str(entry, "direction")? {
        port = port.with_direction(direction.parse()?);
    }
    if let Some(value) = entry.get("value").filter(|v| !v.is_null()) {
        port = port.with_default(value.clone());
    }
    Ok((offset, port))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{port::Direction, primitive::PrimitiveType, PortType};

    #[test]
    fn test_document_shape() {
        let doc: SchemaDocument = r#"{"top": "Sat", "structs": {"Sat": {}}}"#.parse().unwrap();
        assert_eq!(doc.top(), "Sat");
        assert!(doc.struct_entry("Sat").is_some());
        assert!(doc.struct_entry("Other").is_none());

        assert!(SchemaDocument::from_value(json!({"structs": {}})).is_err());
        assert!(SchemaDocument::from_value(json!({"top": "A", "structs": []})).is_err());
        assert!(SchemaDocument::from_value(json!([1, 2])).is_err());
    }

    #[test]
    fn test_parse_leaf() {
        let (offset, port) = parse_field(&json!({
            "type": "Float64", "offset": 24, "dims": [3], "unit": "m/s",
            "desc": "velocity", "direction": "output", "value": [0.0, 0.0, 1.0]
        }))
        .unwrap();
        assert_eq!(offset, 24);
        assert_eq!(port.r#type, PortType::Primitive(PrimitiveType::Float64));
        assert_eq!(port.dims, [3]);
        assert_eq!(port.unit.as_deref(), Some("m/s"));
        assert_eq!(port.direction, Direction::Output);
        assert_eq!(port.default, Some(json!([0.0, 0.0, 1.0])));
    }

    #[test]
    fn test_parse_composite() {
        let (offset, port) = parse_field(&json!({"class": "Inner", "offset": 8})).unwrap();
        assert_eq!(offset, 8);
        assert_eq!(port.class(), Some("Inner"));
        assert!(port.dims.is_empty());
    }

    #[test]
    fn test_parse_missing_keys() {
        assert!(parse_field(&json!({"type": "Float64", "dims": []})).is_err());
        assert!(parse_field(&json!({"type": "Float64", "offset": 0})).is_err());
        assert!(parse_field(&json!({"offset": 0, "dims": []})).is_err());
        assert!(parse_field(&json!({"type": "Float64", "offset": -4, "dims": []})).is_err());
        assert!(parse_field(&json!("Float64")).is_err());
    }

    #[test]
    fn test_parse_overflowing_dims() {
        let big = 1u64 << 32;
        assert!(matches!(
            parse_field(&json!({"type": "Int8", "offset": 0, "dims": [big, big]})),
            Err(Error::Schema(reason)) if reason.contains("overflow")
        ));
    }
}

//! Resolution of an [`InterfaceDocument`] into an ordered list of struct definitions.
//!
//! Structs are visited depth-first starting at the model, and each struct is emitted only after
//! every struct it contains. Generated definitions therefore never forward-reference.

use convert_case::{Case, Casing};
use rsis_schema::{port::element_count, InterfaceDocument, InterfaceField, PrimitiveType};
use serde_json::Value;

use crate::Error;

/// A validated default value for a single element
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Bool(bool),
    Int(i128),
    Float(f64),
    Str(String),
}

impl Literal {
    /// The default implied by a type when the document gives none.
    pub fn implied(ty: PrimitiveType) -> Self {
        match ty {
            PrimitiveType::Boolean => Literal::Bool(false),
            PrimitiveType::String => Literal::Str(String::new()),
            PrimitiveType::Float32 | PrimitiveType::Float64 => Literal::Float(0.0),
            _ => Literal::Int(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Primitive(PrimitiveType),
    /// A nested struct, by name
    Class(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
    /// Empty for scalars
    pub dims: Vec<usize>,
    pub unit: Option<String>,
    pub desc: String,
    /// One literal per element in row-major order. Empty for nested structs.
    pub defaults: Vec<Literal>,
}

/// Largest array a generated initializer may spell out
pub const MAX_ELEMENTS: usize = 1 << 20;

#[derive(Debug, Clone, PartialEq)]
pub struct StructDef {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

/// Resolve every struct reachable from the document's model, dependencies first.
pub fn resolve(document: &InterfaceDocument) -> Result<Vec<StructDef>, Error> {
    let mut resolver = Resolver {
        document,
        done: Vec::new(),
        stack: Vec::new(),
    };
    resolver.visit(&document.model, "model")?;
    check_symbols(&resolver.done)?;

    for name in document.structs.names() {
        if !resolver.done.iter().any(|s| s.name == name) {
            log::warn!("Struct '{name}' is not reachable from '{}'", document.model);
        }
    }
    Ok(resolver.done)
}

struct Resolver<'a> {
    document: &'a InterfaceDocument,
    done: Vec<StructDef>,
    stack: Vec<String>,
}

impl Resolver<'_> {
    fn visit(&mut self, name: &str, referenced_by: &str) -> Result<(), Error> {
        if self.done.iter().any(|s| s.name == name) {
            return Ok(());
        }
        if let Some(pos) = self.stack.iter().position(|s| s == name) {
            let mut chain = self.stack[pos..].to_vec();
            chain.push(name.to_owned());
            return Err(Error::Cycle { chain });
        }
        let fields = self
            .document
            .struct_fields(name)
            .ok_or_else(|| Error::UnresolvedClass {
                class: name.to_owned(),
                referenced_by: referenced_by.to_owned(),
            })?;
        check_identifier(name)?;

        self.stack.push(name.to_owned());
        let mut defs = Vec::with_capacity(fields.len());
        for (field, entry) in fields.iter() {
            check_identifier(field)?;
            let path = format!("{name}.{field}");
            let dims = entry.dims().to_vec();
            if dims.contains(&0) {
                return Err(Error::InvalidValue {
                    field: path,
                    reason: format!("zero-sized dimension in {dims:?}"),
                });
            }
            let count = match element_count(&dims) {
                Some(count) if count <= MAX_ELEMENTS => count,
                _ => {
                    return Err(Error::InvalidValue {
                        field: path,
                        reason: format!("{dims:?} exceeds {MAX_ELEMENTS} elements"),
                    })
                }
            };

            let def = match entry {
                InterfaceField::Composite { class, desc, .. } => {
                    self.visit(class, &path)?;
                    FieldDef {
                        name: field.to_owned(),
                        kind: FieldKind::Class(class.clone()),
                        dims,
                        unit: None,
                        desc: desc.clone(),
                        defaults: Vec::new(),
                    }
                }
                InterfaceField::Signal {
                    r#type,
                    unit,
                    value,
                    desc,
                    ..
                } => {
                    let ty: PrimitiveType = r#type.parse().map_err(|_| Error::UnknownType {
                        field: path.clone(),
                        ty: r#type.clone(),
                    })?;
                    FieldDef {
                        name: field.to_owned(),
                        kind: FieldKind::Primitive(ty),
                        defaults: defaults(&path, ty, count, value.as_ref())?,
                        dims,
                        unit: unit.clone(),
                        desc: desc.clone(),
                    }
                }
            };
            defs.push(def);
        }
        self.stack.pop();

        log::trace!("Resolved struct '{name}' ({} fields)", defs.len());
        self.done.push(StructDef {
            name: name.to_owned(),
            fields: defs,
        });
        Ok(())
    }
}

/// Every struct gets a `rsis_reflect_<snake_case>` symbol, so snake-cased names must not clash.
fn check_symbols(structs: &[StructDef]) -> Result<(), Error> {
    for (i, def) in structs.iter().enumerate() {
        let snake = def.name.to_case(Case::Snake);
        if let Some(other) = structs[..i]
            .iter()
            .find(|other| other.name.to_case(Case::Snake) == snake)
        {
            log::error!(
                "Structs '{}' and '{}' both map to 'rsis_reflect_{snake}'",
                other.name,
                def.name
            );
            return Err(Error::InvalidIdentifier(def.name.clone()));
        }
    }
    Ok(())
}

fn check_identifier(name: &str) -> Result<(), Error> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidIdentifier(name.to_owned()))
    }
}

/// Expand a declared value into one literal per element. A single value is broadcast.
fn defaults(
    path: &str,
    ty: PrimitiveType,
    count: usize,
    value: Option<&Value>,
) -> Result<Vec<Literal>, Error> {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return Ok(vec![Literal::implied(ty); count]);
    };

    let mut flat = Vec::new();
    flatten(value, &mut flat);
    let mut literals = flat
        .into_iter()
        .map(|v| literal(path, ty, v))
        .collect::<Result<Vec<_>, _>>()?;

    match literals.len() {
        n if n == count => Ok(literals),
        1 => Ok(vec![literals.remove(0); count]),
        n => Err(Error::InvalidValue {
            field: path.to_owned(),
            reason: format!("expected {count} values, found {n}"),
        }),
    }
}

fn flatten<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
    match value {
        Value::Array(items) => items.iter().for_each(|item| flatten(item, out)),
        other => out.push(other),
    }
}

fn literal(path: &str, ty: PrimitiveType, value: &Value) -> Result<Literal, Error> {
    let invalid = |reason: String| Error::InvalidValue {
        field: path.to_owned(),
        reason,
    };

    let literal = match ty {
        PrimitiveType::Boolean => value.as_bool().map(Literal::Bool),
        PrimitiveType::String => value.as_str().map(|s| Literal::Str(s.to_owned())),
        PrimitiveType::Float32 | PrimitiveType::Float64 => value
            .as_f64()
            .filter(|f| ty == PrimitiveType::Float64 || f.abs() <= f64::from(f32::MAX))
            .map(Literal::Float),
        _ => {
            let int = value
                .as_i64()
                .map(i128::from)
                .or_else(|| value.as_u64().map(i128::from));
            if let Some(int) = int {
                let (min, max) = int_range(ty);
                if int < min || int > max {
                    return Err(invalid(format!("{int} is out of range for {ty}")));
                }
            }
            int.map(Literal::Int)
        }
    };
    literal.ok_or_else(|| invalid(format!("{value} is not a valid {ty}")))
}

fn int_range(ty: PrimitiveType) -> (i128, i128) {
    match ty {
        PrimitiveType::Int8 => (i8::MIN.into(), i8::MAX.into()),
        PrimitiveType::Int16 => (i16::MIN.into(), i16::MAX.into()),
        PrimitiveType::Int32 => (i32::MIN.into(), i32::MAX.into()),
        PrimitiveType::Int64 => (i64::MIN.into(), i64::MAX.into()),
        PrimitiveType::UInt8 => (0, u8::MAX.into()),
        PrimitiveType::UInt16 => (0, u16::MAX.into()),
        PrimitiveType::UInt32 => (0, u32::MAX.into()),
        _ => (0, u64::MAX.into()),
    }
}

//! Rust target: a single module with `#[repr(C)]` structs and the reflection entry points.

use convert_case::{Case, Casing};
use itertools::Itertools;
use rsis_schema::{Language, PrimitiveType};

use crate::{
    model::{FieldDef, FieldKind, Literal, StructDef},
    template::{nest, render},
    Error, GeneratedFile, Generator,
};

const MODULE: &str = include_str!("../templates/rust/module.rs");
const STRUCT: &str = include_str!("../templates/rust/struct.rs");
const REFLECT: &str = include_str!("../templates/rust/reflect.rs");

/// Keywords usable as raw identifiers
const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

/// Keywords that can't be raw identifiers either
const RESERVED: &[&str] = &["crate", "self", "Self", "super", "_"];

pub(crate) fn generate(generator: &Generator) -> Result<Vec<GeneratedFile>, Error> {
    let model = generator.model();

    let mut structs = Vec::new();
    let mut functions = Vec::new();
    for def in generator.structs() {
        structs.push(definition(def)?);
        functions.push(reflect_function(def)?);
    }
    let calls = generator
        .structs()
        .iter()
        .map(|def| {
            format!(
                "    rsis_reflect_{}(ctx, on_class, on_member);",
                def.name.to_case(Case::Snake)
            )
        })
        .join("\n");

    let module = render(
        MODULE,
        &[
            ("version", env!("CARGO_PKG_VERSION")),
            ("model", &ident(model)?),
            ("structs", &structs.join("\n")),
            ("reflect_functions", &functions.join("\n")),
            ("reflect_calls", &calls),
        ],
    )?;

    Ok(vec![GeneratedFile {
        name: format!("{}.rs", model.to_case(Case::Snake)),
        contents: module,
    }])
}

/// The identifier as written in Rust source, raw if it is a keyword.
fn ident(name: &str) -> Result<String, Error> {
    if RESERVED.contains(&name) {
        Err(Error::InvalidIdentifier(name.to_owned()))
    } else if KEYWORDS.contains(&name) {
        Ok(format!("r#{name}"))
    } else {
        Ok(name.to_owned())
    }
}

/// `[[T; 3]; 2]` for dims `[2, 3]`
fn array_type(element: &str, dims: &[usize]) -> String {
    dims.iter()
        .rev()
        .fold(element.to_owned(), |inner, d| format!("[{inner}; {d}]"))
}

fn definition(def: &StructDef) -> Result<String, Error> {
    let name = ident(&def.name)?;
    let mut fields = Vec::new();
    let mut defaults = Vec::new();
    for field in &def.fields {
        let field_name = ident(&field.name)?;
        let (element, value) = match &field.kind {
            FieldKind::Class(class) => {
                let class = ident(class)?;
                let value = field
                    .dims
                    .iter()
                    .fold(format!("{class}::default()"), |inner, _| {
                        format!("std::array::from_fn(|_| {inner})")
                    });
                (class, value)
            }
            FieldKind::Primitive(ty) => (
                ty.native_name(Language::Rust).to_owned(),
                primitive_default(*ty, field),
            ),
        };

        let doc = match (field.desc.is_empty(), &field.unit) {
            (true, None) => String::new(),
            (false, None) => format!("    /// {}\n", field.desc),
            (true, Some(unit)) => format!("    /// [{unit}]\n"),
            (false, Some(unit)) => format!("    /// {} [{unit}]\n", field.desc),
        };
        fields.push(format!(
            "{doc}    pub {field_name}: {},",
            array_type(&element, &field.dims)
        ));
        defaults.push(format!("            {field_name}: {value},"));
    }

    render(
        STRUCT,
        &[
            ("name", &name),
            ("fields", &fields.join("\n")),
            ("defaults", &defaults.join("\n")),
        ],
    )
}

fn primitive_default(ty: PrimitiveType, field: &FieldDef) -> String {
    let items = field
        .defaults
        .iter()
        .map(|value| literal(ty, value))
        .collect_vec();
    nest(&field.dims, &items, "[", "]")
}

fn reflect_function(def: &StructDef) -> Result<String, Error> {
    let name = ident(&def.name)?;
    let members = def
        .fields
        .iter()
        .map(|field| {
            let tag = match &field.kind {
                FieldKind::Class(class) => class.as_str(),
                FieldKind::Primitive(ty) => ty.native_name(Language::Rust),
            };
            let dims = if field.dims.is_empty() {
                "std::ptr::null(), 0".to_owned()
            } else {
                format!(
                    "[{}].as_ptr(), {}",
                    field.dims.iter().map(|d| format!("{d}usize")).join(", "),
                    field.dims.len()
                )
            };
            Ok(format!(
                "    on_member(ctx, c\"{}\".as_ptr(), c\"{}\".as_ptr(), c\"{tag}\".as_ptr(), offset_of!({name}, {}), {dims});",
                def.name,
                field.name,
                ident(&field.name)?
            ))
        })
        .collect::<Result<Vec<_>, Error>>()?
        .join("\n");

    render(
        REFLECT,
        &[
            ("snake", &def.name.to_case(Case::Snake)),
            ("name", &name),
            ("members", &members),
        ],
    )
}

fn literal(ty: PrimitiveType, value: &Literal) -> String {
    match value {
        Literal::Bool(b) => b.to_string(),
        Literal::Int(i) => i.to_string(),
        Literal::Float(f) if ty == PrimitiveType::Float32 => format!("{:?}", *f as f32),
        Literal::Float(f) => format!("{f:?}"),
        Literal::Str(s) => format!("String::from({s:?})"),
    }
}

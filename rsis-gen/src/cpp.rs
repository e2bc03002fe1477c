//! C++ target: a header with the struct definitions and a source file with the reflection entry
//! points.

use convert_case::{Case, Casing};
use itertools::Itertools;
use rsis_schema::{Language, PrimitiveType};

use crate::{
    model::{FieldDef, FieldKind, Literal, StructDef},
    template::{nest, render},
    Error, GeneratedFile, Generator,
};

const HEADER: &str = include_str!("../templates/cpp/header.hpp");
const SOURCE: &str = include_str!("../templates/cpp/source.cpp");
const STRUCT: &str = include_str!("../templates/cpp/struct.hpp");
const REFLECT: &str = include_str!("../templates/cpp/reflect.cpp");

const KEYWORDS: &[&str] = &[
    "alignas", "alignof", "and", "asm", "auto", "bool", "break", "case", "catch", "char", "class",
    "const", "constexpr", "continue", "decltype", "default", "delete", "do", "double", "else",
    "enum", "explicit", "export", "extern", "false", "float", "for", "friend", "goto", "if",
    "inline", "int", "long", "mutable", "namespace", "new", "noexcept", "not", "nullptr",
    "operator", "or", "private", "protected", "public", "register", "return", "short", "signed",
    "sizeof", "static", "struct", "switch", "template", "this", "throw", "true", "try", "typedef",
    "typeid", "typename", "union", "unsigned", "using", "virtual", "void", "volatile", "while",
    "xor",
];

pub(crate) fn generate(generator: &Generator) -> Result<Vec<GeneratedFile>, Error> {
    let version = env!("CARGO_PKG_VERSION");
    let model = generator.model();
    let snake = model.to_case(Case::Snake);
    let header_name = format!("{snake}.hpp");

    let mut definitions = Vec::new();
    let mut functions = Vec::new();
    for def in generator.structs() {
        check_keyword(&def.name)?;
        for field in &def.fields {
            check_keyword(&field.name)?;
        }
        definitions.push(definition(def)?);
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

    let header = render(
        HEADER,
        &[
            ("version", version),
            ("model", model),
            ("structs", &definitions.join("\n")),
        ],
    )?;
    let source = render(
        SOURCE,
        &[
            ("version", version),
            ("model", model),
            ("header", &header_name),
            ("reflect_functions", &functions.join("\n")),
            ("reflect_calls", &calls),
        ],
    )?;

    Ok(vec![
        GeneratedFile {
            name: header_name,
            contents: header,
        },
        GeneratedFile {
            name: format!("{snake}_reflect.cpp"),
            contents: source,
        },
    ])
}

fn check_keyword(name: &str) -> Result<(), Error> {
    if KEYWORDS.contains(&name) {
        Err(Error::InvalidIdentifier(name.to_owned()))
    } else {
        Ok(())
    }
}

fn definition(def: &StructDef) -> Result<String, Error> {
    let members = def.fields.iter().map(member).join("\n");
    render(STRUCT, &[("name", &def.name), ("members", &members)])
}

fn member(field: &FieldDef) -> String {
    let mut out = String::new();
    match (field.desc.is_empty(), &field.unit) {
        (true, None) => {}
        (false, None) => out.push_str(&format!("    /// {}\n", field.desc)),
        (true, Some(unit)) => out.push_str(&format!("    /// [{unit}]\n")),
        (false, Some(unit)) => out.push_str(&format!("    /// {} [{unit}]\n", field.desc)),
    }

    let extents: String = field.dims.iter().map(|d| format!("[{d}]")).collect();
    match &field.kind {
        FieldKind::Class(class) => {
            out.push_str(&format!("    {class} {}{extents}{{}};", field.name));
        }
        FieldKind::Primitive(ty) => {
            let items = field
                .defaults
                .iter()
                .map(|value| literal(*ty, value))
                .collect_vec();
            let init = nest(&field.dims, &items, "{", "}");
            out.push_str(&format!(
                "    {} {}{extents} = {init};",
                ty.native_name(Language::Cpp),
                field.name
            ));
        }
    }
    out
}

fn reflect_function(def: &StructDef) -> Result<String, Error> {
    let members = def
        .fields
        .iter()
        .map(|field| {
            let tag = match &field.kind {
                FieldKind::Class(class) => class.as_str(),
                FieldKind::Primitive(ty) => ty.native_name(Language::Cpp),
            };
            let call = |dims: &str, ndims: usize| {
                format!(
                    "on_member(ctx, \"{}\", \"{}\", \"{tag}\", offsetof({}, {}), {dims}, {ndims});",
                    def.name, field.name, def.name, field.name
                )
            };
            if field.dims.is_empty() {
                format!("    {}", call("nullptr", 0))
            } else {
                format!(
                    "    {{\n        static const size_t dims[] = {{{}}};\n        {}\n    }}",
                    field.dims.iter().join(", "),
                    call("dims", field.dims.len())
                )
            }
        })
        .join("\n");

    render(
        REFLECT,
        &[
            ("snake", &def.name.to_case(Case::Snake)),
            ("name", &def.name),
            ("members", &members),
        ],
    )
}

fn literal(ty: PrimitiveType, value: &Literal) -> String {
    match value {
        Literal::Bool(b) => b.to_string(),
        Literal::Int(i) => match ty {
            PrimitiveType::Int64 if *i == i128::from(i64::MIN) => "(-9223372036854775807LL - 1)".into(),
            PrimitiveType::Int64 => format!("{i}LL"),
            PrimitiveType::UInt64 => format!("{i}ULL"),
            PrimitiveType::UInt32 => format!("{i}U"),
            _ => i.to_string(),
        },
        Literal::Float(f) if ty == PrimitiveType::Float32 => format!("{:?}f", *f as f32),
        Literal::Float(f) => format!("{f:?}"),
        Literal::Str(s) => quote(s),
    }
}

/// A C++ string literal. Control and non-ASCII bytes are written as octal escapes.
fn quote(s: &str) -> String {
    let mut out = String::from("\"");
    for byte in s.bytes() {
        match byte {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            b'?' => out.push_str("\\?"),
            0x20..=0x7e => out.push(byte as char),
            _ => out.push_str(&format!("\\{byte:03o}")),
        }
    }
    out.push('"');
    out
}

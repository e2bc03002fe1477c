//! Builds a library's schema tree from its native reflection callbacks.
//!
//! `rsis_reflect` reports every struct once through the class callback, then its members through
//! the member callback. Member type tags are native type names in the library's implementation
//! language; a tag that is not a primitive name refers to a reported struct. Structs are reported
//! dependencies first, so the last reported struct is the top-level model.

use std::{
    ffi::{c_char, c_void, CStr},
    ptr,
};

use rsis_schema::{ClassData, Language, LibraryData, Port, PortType, PrimitiveType};
use rsis_sys::model::ModelBinding;

use crate::Error;

#[derive(Debug)]
struct Member {
    class: String,
    name: String,
    tag: String,
    offset: usize,
    dims: Vec<usize>,
}

#[derive(Debug, Default)]
struct Collector {
    classes: Vec<(String, usize)>,
    members: Vec<Member>,
    errors: Vec<String>,
}

unsafe fn read_str(ptr: *const c_char, what: &str, errors: &mut Vec<String>) -> Option<String> {
    if ptr.is_null() {
        errors.push(format!("null {what}"));
        return None;
    }
    match CStr::from_ptr(ptr).to_str() {
        Ok(s) => Some(s.to_owned()),
        Err(e) => {
            errors.push(format!("{what} is not UTF-8: {e}"));
            None
        }
    }
}

unsafe extern "C" fn on_class(ctx: *mut c_void, name: *const c_char, size: usize) {
    let Some(collector) = (ctx as *mut Collector).as_mut() else {
        return;
    };
    if let Some(name) = read_str(name, "struct name", &mut collector.errors) {
        collector.classes.push((name, size));
    }
}

unsafe extern "C" fn on_member(
    ctx: *mut c_void,
    class: *const c_char,
    name: *const c_char,
    type_tag: *const c_char,
    offset: usize,
    dims: *const usize,
    ndims: usize,
) {
    let Some(collector) = (ctx as *mut Collector).as_mut() else {
        return;
    };
    let errors = &mut collector.errors;
    let (Some(class), Some(name), Some(tag)) = (
        read_str(class, "struct name", errors),
        read_str(name, "member name", errors),
        read_str(type_tag, "type tag", errors),
    ) else {
        return;
    };
    let dims = if ndims == 0 || dims.is_null() {
        Vec::new()
    } else {
        std::slice::from_raw_parts(dims, ndims).to_vec()
    };
    collector.members.push(Member {
        class,
        name,
        tag,
        offset,
        dims,
    });
}

/// Run the reflection traversal and build the schema tree.
pub(crate) fn reflect_library(
    binding: &ModelBinding,
    language: Language,
) -> Result<LibraryData, Error> {
    let mut collector = Collector::default();
    // SAFETY: the collector outlives the call and the callbacks are not retained by native code.
    unsafe {
        binding.rsis_reflect(
            ptr::addr_of_mut!(collector) as *mut c_void,
            on_class,
            on_member,
        );
    }

    for error in &collector.errors {
        log::warn!("Ignoring reflected entry: {error}");
    }

    let Some((top, _)) = collector.classes.last() else {
        return Err(Error::NativeCall {
            call: rsis_sys::model::RSIS_REFLECT,
            message: "no structs were reported".to_owned(),
        });
    };

    let mut data = LibraryData::new(top.as_str());
    for (class_name, size) in &collector.classes {
        let mut class = ClassData::with_size(*size);
        for member in collector.members.iter().filter(|m| &m.class == class_name) {
            let r#type = match PrimitiveType::from_native(language, &member.tag) {
                Some(ty) => PortType::Primitive(ty),
                None if collector.classes.iter().any(|(c, _)| c == &member.tag) => {
                    PortType::Class(member.tag.clone())
                }
                None => PortType::Unsupported(member.tag.clone()),
            };
            let port = match r#type {
                PortType::Class(child) if &child == class_name => {
                    log::warn!("Skipping member '{class_name}.{}': struct contains itself", member.name);
                    continue;
                }
                PortType::Class(child) => Port::composite(child, member.dims.clone()),
                PortType::Primitive(ty) => Port::signal(ty, member.dims.clone()),
                PortType::Unsupported(tag) => Port::from_type_name(&tag, member.dims.clone()),
            };
            if member.offset >= *size {
                log::warn!(
                    "Member '{class_name}.{}' at offset {} lies outside the {size}-byte struct",
                    member.name,
                    member.offset
                );
            }
            class
                .insert(member.name.as_str(), member.offset, port)
                .map_err(|e| Error::InvalidValue(format!("struct '{class_name}': {e}")))?;
        }
        data.insert_class(class_name.as_str(), class);
    }

    for member in &collector.members {
        if !data.contains(&member.class) {
            log::warn!(
                "Skipping member '{}.{}': struct was never reported",
                member.class,
                member.name
            );
        }
    }

    Ok(data)
}

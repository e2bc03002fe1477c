//! Translation of dotted port paths into native addresses.
//!
//! Resolution walks the schema tree from the library's top-level struct, one path segment per
//! level, summing field offsets onto the model's base address. Objects of boxed languages (see
//! [`Language::is_boxed`]) are reached through one pointer indirection first.

use std::{ffi::c_void, ptr::NonNull};

use rsis_schema::{Language, Port, PortType};

use crate::{model::ModelInstance, registry::MetadataRegistry, Entity, Error};

/// A leaf port located in native memory.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedPort<'a> {
    pub address: NonNull<u8>,
    pub port: &'a Port,
}

#[derive(Debug, Clone, Copy)]
pub struct PortResolver<'a> {
    registry: &'a MetadataRegistry,
}

/// `None` if the offset runs past the end of the address space.
fn offset_address(address: NonNull<u8>, offset: usize) -> Option<NonNull<u8>> {
    (address.as_ptr() as usize).checked_add(offset)?;
    NonNull::new(address.as_ptr().wrapping_add(offset))
}

impl<'a> PortResolver<'a> {
    pub fn new(registry: &'a MetadataRegistry) -> Self {
        Self { registry }
    }

    /// The address where a model's top-level struct begins.
    pub fn base_address(&self, model: &ModelInstance) -> Result<NonNull<u8>, Error> {
        let language = self.registry.language(model.library())?;
        Self::base_address_for(model.object(), language)
    }

    fn base_address_for(object: NonNull<c_void>, language: Language) -> Result<NonNull<u8>, Error> {
        if !language.is_boxed() {
            return Ok(object.cast());
        }
        // SAFETY: boxed factories return the address of a pointer-sized slot holding the object.
        let inner = unsafe { std::ptr::read_unaligned(object.as_ptr() as *const *mut u8) };
        NonNull::new(inner).ok_or_else(|| Error::NativeCall {
            call: rsis_sys::model::RSIS_CREATE_MODEL,
            message: "boxed model object is null".to_owned(),
        })
    }

    /// Resolve `path` on `model` to the address and descriptor of a primitive leaf.
    pub fn resolve(&self, model: &ModelInstance, path: &str) -> Result<ResolvedPort<'a>, Error> {
        let library = self.registry.library(model.library())?;
        let mut address = self.base_address(model)?;
        let mut class_name = library.top();

        let full_path = |depth: usize| {
            let prefix: Vec<&str> = path.split('.').take(depth + 1).collect();
            format!("{}.{}", model.name(), prefix.join("."))
        };

        let mut segments = path.split('.').enumerate().peekable();
        while let Some((depth, segment)) = segments.next() {
            let class = library
                .class(class_name)
                .ok_or_else(|| Error::not_found(Entity::Struct, class_name))?;
            let field = class
                .get(segment)
                .ok_or_else(|| Error::not_found(Entity::Field, full_path(depth)))?;
            address = offset_address(address, field.offset).ok_or_else(|| {
                Error::InvalidValue(format!(
                    "{}: offset {} overflows the model address",
                    full_path(depth),
                    field.offset
                ))
            })?;
            let is_leaf = segments.peek().is_none();

            match (&field.port.r#type, is_leaf) {
                (PortType::Class(child), false) => {
                    if !field.port.dims.is_empty() {
                        return Err(Error::UnsupportedType {
                            path: full_path(depth),
                            ty: format!("{child}{:?}", field.port.dims),
                        });
                    }
                    class_name = child;
                }
                (PortType::Class(child), true) => {
                    return Err(Error::TypeMismatch {
                        path: full_path(depth),
                        expected: "signal".to_owned(),
                        found: format!("struct {child}"),
                    });
                }
                (other, false) => {
                    return Err(Error::TypeMismatch {
                        path: full_path(depth),
                        expected: "struct".to_owned(),
                        found: format!("signal {other}"),
                    });
                }
                (PortType::Unsupported(ty), true) => {
                    return Err(Error::UnsupportedType {
                        path: full_path(depth),
                        ty: ty.clone(),
                    });
                }
                (PortType::Primitive(_), true) => {
                    return Ok(ResolvedPort {
                        address,
                        port: &field.port,
                    });
                }
            }
        }

        // `split` yields at least one segment, so the loop has always returned.
        Err(Error::not_found(Entity::Field, format!("{}.{path}", model.name())))
    }
}

//! Typed reads and writes of leaf signals.

use std::ptr::NonNull;

use rsis_schema::{Port, PrimitiveType};

use crate::{
    model::{ModelReference, ModelTable},
    resolver::PortResolver,
    value::Value,
    Error,
};

/// Marshals native string objects, whose layout only the implementation language knows.
pub trait Utf8Access {
    /// Copy the contents of the native string object at `object`.
    ///
    /// # Safety
    /// `object` must address a live string object of the owning library's language.
    unsafe fn get_utf8(&self, object: NonNull<u8>) -> Result<String, Error>;

    /// Replace the contents of the native string object at `object`.
    ///
    /// # Safety
    /// `object` must address a live string object of the owning library's language.
    unsafe fn set_utf8(&self, object: NonNull<u8>, value: &str) -> Result<(), Error>;
}

fn no_string_runtime(call: &'static str) -> Error {
    Error::NativeCall {
        call,
        message: "no scheduler runtime is attached to marshal strings".to_owned(),
    }
}

/// Reads and writes leaf signals of live models.
pub struct SignalAccessor<'a> {
    resolver: PortResolver<'a>,
    models: &'a ModelTable,
    strings: Option<&'a dyn Utf8Access>,
}

impl<'a> SignalAccessor<'a> {
    pub fn new(resolver: PortResolver<'a>, models: &'a ModelTable) -> Self {
        Self {
            resolver,
            models,
            strings: None,
        }
    }

    /// Use `strings` to read and write `String` leaves.
    pub fn with_strings(mut self, strings: &'a dyn Utf8Access) -> Self {
        self.strings = Some(strings);
        self
    }

    /// Read the current value of a leaf signal.
    pub fn get(&self, model: &ModelReference, path: &str) -> Result<Value, Error> {
        let instance = self.models.get(model)?;
        let resolved = self.resolver.resolve(instance, path)?;
        let port = resolved.port;
        let ty = primitive(port, model, path)?;

        if ty == PrimitiveType::String {
            check_scalar_string(port, model, path)?;
            let strings = self.strings.ok_or_else(|| no_string_runtime("rsis_get_utf8"))?;
            // SAFETY: the address was resolved from the library's own metadata.
            let text = unsafe { strings.get_utf8(resolved.address)? };
            return Ok(Value::string(text));
        }

        if port.element_count().is_none() {
            return Err(Error::InvalidValue(format!(
                "{model}.{path}: dimensions {:?} overflow the element count",
                port.dims
            )));
        }
        // SAFETY: the resolver located `element_count` elements of `ty` at this address.
        unsafe { Value::read(ty, &port.dims, resolved.address.as_ptr()) }.ok_or_else(|| {
            Error::UnsupportedType {
                path: format!("{model}.{path}"),
                ty: ty.to_string(),
            }
        })
    }

    /// Write a value to a leaf signal.
    ///
    /// The element type and dimensions must match the port exactly; nothing is written otherwise.
    pub fn set(&self, model: &ModelReference, path: &str, value: &Value) -> Result<(), Error> {
        let instance = self.models.get(model)?;
        let resolved = self.resolver.resolve(instance, path)?;
        let port = resolved.port;
        let ty = primitive(port, model, path)?;

        if value.element_type() != ty {
            return Err(Error::TypeMismatch {
                path: format!("{model}.{path}"),
                expected: ty.to_string(),
                found: value.element_type().to_string(),
            });
        }
        if value.dims() != port.dims.as_slice() {
            return Err(Error::TypeMismatch {
                path: format!("{model}.{path}"),
                expected: format!("dimensions {:?}", port.dims),
                found: format!("dimensions {:?}", value.dims()),
            });
        }

        if let Some(text) = value.as_str() {
            check_scalar_string(port, model, path)?;
            let strings = self.strings.ok_or_else(|| no_string_runtime("rsis_set_utf8"))?;
            // SAFETY: the address was resolved from the library's own metadata.
            return unsafe { strings.set_utf8(resolved.address, text) };
        }

        log::trace!("{model}.{path} <- {value:?}");
        // SAFETY: type and shape were checked against the port above.
        unsafe { value.write(resolved.address.as_ptr()) };
        Ok(())
    }
}

fn primitive(port: &Port, model: &ModelReference, path: &str) -> Result<PrimitiveType, Error> {
    port.primitive().ok_or_else(|| Error::UnsupportedType {
        path: format!("{model}.{path}"),
        ty: port.r#type.to_string(),
    })
}

fn check_scalar_string(port: &Port, model: &ModelReference, path: &str) -> Result<(), Error> {
    if port.is_scalar() {
        Ok(())
    } else {
        Err(Error::UnsupportedType {
            path: format!("{model}.{path}"),
            ty: format!("String{:?}", port.dims),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{ffi::c_void, mem::offset_of};

    use rsis_schema::{ClassData, Language, LibraryData};

    use super::*;
    use crate::{model::ModelInstance, registry::MetadataRegistry, Entity};

    #[repr(C)]
    #[derive(Default)]
    struct Block {
        gain: f64,
        flags: [bool; 2],
        counts: [[i16; 3]; 2],
        label: String,
    }

    struct RustStrings;

    impl Utf8Access for RustStrings {
        unsafe fn get_utf8(&self, object: NonNull<u8>) -> Result<String, Error> {
            Ok((*(object.as_ptr() as *const String)).clone())
        }

        unsafe fn set_utf8(&self, object: NonNull<u8>, value: &str) -> Result<(), Error> {
            *(object.as_ptr() as *mut String) = value.to_owned();
            Ok(())
        }
    }

    fn registry() -> MetadataRegistry {
        let mut block = ClassData::new();
        block
            .insert("gain", offset_of!(Block, gain), Port::signal(PrimitiveType::Float64, vec![]))
            .unwrap();
        block
            .insert("flags", offset_of!(Block, flags), Port::signal(PrimitiveType::Boolean, vec![2]))
            .unwrap();
        block
            .insert("counts", offset_of!(Block, counts), Port::signal(PrimitiveType::Int16, vec![2, 3]))
            .unwrap();
        block
            .insert("label", offset_of!(Block, label), Port::signal(PrimitiveType::String, vec![]))
            .unwrap();
        let mut data = LibraryData::new("Block");
        data.insert_class("Block", block);
        let mut registry = MetadataRegistry::new();
        registry.register_data("blocks", Language::Cpp, None, data);
        registry
    }

    fn models(object: &mut Block) -> ModelTable {
        let mut table = ModelTable::new();
        table
            .insert(ModelInstance::new(
                "blocks",
                "b",
                ["test"],
                NonNull::from(object).cast::<c_void>(),
            ))
            .unwrap();
        table
    }

    #[test]
    fn test_get_set() {
        let registry = registry();
        let mut object = Block::default();
        let table = models(&mut object);
        let accessor = SignalAccessor::new(PortResolver::new(&registry), &table);
        let b = ModelReference::from("b");

        accessor.set(&b, "gain", &Value::from(35.6)).unwrap();
        assert_eq!(accessor.get(&b, "gain").unwrap().as_scalar::<f64>(), Some(35.6));

        accessor.set(&b, "flags", &Value::from(vec![true, false])).unwrap();
        assert_eq!(
            accessor.get(&b, "flags").unwrap().as_slice::<bool>(),
            Some(&[true, false][..])
        );

        let counts = Value::array(vec![2, 3], vec![1i16, 2, 3, 4, 5, 6]).unwrap();
        accessor.set(&b, "counts", &counts).unwrap();
        assert_eq!(accessor.get(&b, "counts").unwrap(), counts);
        assert_eq!(object.counts, [[1, 2, 3], [4, 5, 6]]);
    }

    #[test]
    fn test_set_rejects_mismatch() {
        let registry = registry();
        let mut object = Block::default();
        let table = models(&mut object);
        let accessor = SignalAccessor::new(PortResolver::new(&registry), &table);
        let b = ModelReference::from("b");

        assert!(matches!(
            accessor.set(&b, "gain", &Value::from(1.0f32)),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(matches!(
            accessor.set(&b, "counts", &Value::from(vec![1i16, 2, 3, 4, 5, 6])),
            Err(Error::TypeMismatch { .. })
        ));
        assert_eq!(object.counts, [[0; 3]; 2]);
        assert!(matches!(
            accessor.get(&"nobody".into(), "gain"),
            Err(Error::NotFound { kind: Entity::Model, .. })
        ));
    }

    #[test]
    fn test_strings() {
        let registry = registry();
        let mut object = Block::default();
        let table = models(&mut object);
        let b = ModelReference::from("b");

        let bare = SignalAccessor::new(PortResolver::new(&registry), &table);
        assert!(matches!(bare.get(&b, "label"), Err(Error::NativeCall { .. })));

        let accessor = bare.with_strings(&RustStrings);
        accessor.set(&b, "label", &Value::from("thruster")).unwrap();
        assert_eq!(accessor.get(&b, "label").unwrap().as_str(), Some("thruster"));
    }
}

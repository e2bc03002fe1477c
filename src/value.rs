//! Typed signal values exchanged with native memory.
//!
//! Array elements are laid out in the order the native type stores them, without any row- or
//! column-major conversion.

use std::ptr;

use rsis_schema::{port::element_count, PrimitiveType};

use crate::Error;

/// Element storage of a [`Value`]
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    Boolean(Vec<bool>),
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    UInt8(Vec<u8>),
    UInt16(Vec<u16>),
    UInt32(Vec<u32>),
    UInt64(Vec<u64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    String(String),
}

/// A primitive element type that can be copied to and from native memory.
pub trait Element: Copy + private::Sealed {
    const TYPE: PrimitiveType;

    fn wrap(values: Vec<Self>) -> Data;

    fn unwrap(data: &Data) -> Option<&[Self]>;

    /// # Safety
    /// `ptr` must be valid for reading `size_of::<Self>()` bytes.
    unsafe fn read(ptr: *const u8) -> Self;

    /// # Safety
    /// `ptr` must be valid for writing `size_of::<Self>()` bytes.
    unsafe fn write(self, ptr: *mut u8);
}

mod private {
    pub trait Sealed {}
}

macro_rules! impl_element {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl private::Sealed for $ty {}

            impl Element for $ty {
                const TYPE: PrimitiveType = PrimitiveType::$variant;

                fn wrap(values: Vec<Self>) -> Data {
                    Data::$variant(values)
                }

                fn unwrap(data: &Data) -> Option<&[Self]> {
                    match data {
                        Data::$variant(values) => Some(values),
                        _ => None,
                    }
                }

                unsafe fn read(ptr: *const u8) -> Self {
                    ptr::read_unaligned(ptr as *const $ty)
                }

                unsafe fn write(self, ptr: *mut u8) {
                    ptr::write_unaligned(ptr as *mut $ty, self)
                }
            }

            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::scalar(value)
                }
            }

            impl From<Vec<$ty>> for Value {
                fn from(values: Vec<$ty>) -> Self {
                    Value::vector(values)
                }
            }
        )+
    };
}

impl_element!(
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
);

impl private::Sealed for bool {}

/// Booleans occupy one byte; any non-zero byte reads as `true`.
impl Element for bool {
    const TYPE: PrimitiveType = PrimitiveType::Boolean;

    fn wrap(values: Vec<Self>) -> Data {
        Data::Boolean(values)
    }

    fn unwrap(data: &Data) -> Option<&[Self]> {
        match data {
            Data::Boolean(values) => Some(values),
            _ => None,
        }
    }

    unsafe fn read(ptr: *const u8) -> Self {
        ptr::read(ptr) != 0
    }

    unsafe fn write(self, ptr: *mut u8) {
        ptr::write(ptr, self as u8)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::scalar(value)
    }
}

impl From<Vec<bool>> for Value {
    fn from(values: Vec<bool>) -> Self {
        Value::vector(values)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::string(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::string(value)
    }
}

/// A signal value: element data plus its dimension tuple.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    dims: Vec<usize>,
    data: Data,
}

impl Value {
    pub fn scalar<T: Element>(value: T) -> Self {
        Self {
            dims: vec![],
            data: T::wrap(vec![value]),
        }
    }

    /// A one-dimensional array
    pub fn vector<T: Element>(values: Vec<T>) -> Self {
        Self {
            dims: vec![values.len()],
            data: T::wrap(values),
        }
    }

    /// An array of any rank. The element count must match the product of `dims`.
    pub fn array<T: Element>(dims: Vec<usize>, values: Vec<T>) -> Result<Self, Error> {
        let expected = element_count(&dims).ok_or_else(|| {
            Error::InvalidValue(format!("dimensions {dims:?} overflow the element count"))
        })?;
        if expected != values.len() {
            return Err(Error::InvalidValue(format!(
                "dimensions {dims:?} describe {expected} elements, {} given",
                values.len()
            )));
        }
        Ok(Self {
            dims,
            data: T::wrap(values),
        })
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self {
            dims: vec![],
            data: Data::String(value.into()),
        }
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    pub fn element_type(&self) -> PrimitiveType {
        match self.data {
            Data::Boolean(_) => PrimitiveType::Boolean,
            Data::Int8(_) => PrimitiveType::Int8,
            Data::Int16(_) => PrimitiveType::Int16,
            Data::Int32(_) => PrimitiveType::Int32,
            Data::Int64(_) => PrimitiveType::Int64,
            Data::UInt8(_) => PrimitiveType::UInt8,
            Data::UInt16(_) => PrimitiveType::UInt16,
            Data::UInt32(_) => PrimitiveType::UInt32,
            Data::UInt64(_) => PrimitiveType::UInt64,
            Data::Float32(_) => PrimitiveType::Float32,
            Data::Float64(_) => PrimitiveType::Float64,
            Data::String(_) => PrimitiveType::String,
        }
    }

    /// The single element of a scalar value of type `T`
    pub fn as_scalar<T: Element>(&self) -> Option<T> {
        match (self.dims.is_empty(), T::unwrap(&self.data)) {
            (true, Some([value])) => Some(*value),
            _ => None,
        }
    }

    /// All elements, in native storage order
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        T::unwrap(&self.data)
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.data {
            Data::String(s) => Some(s),
            _ => None,
        }
    }

    /// Read every element described by `dims` starting at `ptr`. `None` for strings and for
    /// dimensions whose byte size overflows.
    ///
    /// # Safety
    /// `ptr` must be valid for reading `count` consecutive elements of `ty`.
    pub(crate) unsafe fn read(
        ty: PrimitiveType,
        dims: &[usize],
        ptr: *const u8,
    ) -> Option<Self> {
        let count = element_count(dims)?;
        ty.width()?.checked_mul(count)?;
        unsafe fn read_all<T: Element>(ptr: *const u8, count: usize) -> Data {
            let values = (0..count)
                .map(|i| T::read(ptr.add(i * std::mem::size_of::<T>())))
                .collect();
            T::wrap(values)
        }
        let data = match ty {
            PrimitiveType::Boolean => read_all::<bool>(ptr, count),
            PrimitiveType::Int8 => read_all::<i8>(ptr, count),
            PrimitiveType::Int16 => read_all::<i16>(ptr, count),
            PrimitiveType::Int32 => read_all::<i32>(ptr, count),
            PrimitiveType::Int64 => read_all::<i64>(ptr, count),
            PrimitiveType::UInt8 => read_all::<u8>(ptr, count),
            PrimitiveType::UInt16 => read_all::<u16>(ptr, count),
            PrimitiveType::UInt32 => read_all::<u32>(ptr, count),
            PrimitiveType::UInt64 => read_all::<u64>(ptr, count),
            PrimitiveType::Float32 => read_all::<f32>(ptr, count),
            PrimitiveType::Float64 => read_all::<f64>(ptr, count),
            PrimitiveType::String => return None,
        };
        Some(Self {
            dims: dims.to_vec(),
            data,
        })
    }

    /// Write every element to consecutive slots starting at `ptr`. Strings are not written.
    ///
    /// # Safety
    /// `ptr` must be valid for writing every element of the value.
    pub(crate) unsafe fn write(&self, ptr: *mut u8) {
        unsafe fn write_all<T: Element>(values: &[T], ptr: *mut u8) {
            for (i, value) in values.iter().enumerate() {
                value.write(ptr.add(i * std::mem::size_of::<T>()));
            }
        }
        match &self.data {
            Data::Boolean(v) => write_all(v, ptr),
            Data::Int8(v) => write_all(v, ptr),
            Data::Int16(v) => write_all(v, ptr),
            Data::Int32(v) => write_all(v, ptr),
            Data::Int64(v) => write_all(v, ptr),
            Data::UInt8(v) => write_all(v, ptr),
            Data::UInt16(v) => write_all(v, ptr),
            Data::UInt32(v) => write_all(v, ptr),
            Data::UInt64(v) => write_all(v, ptr),
            Data::Float32(v) => write_all(v, ptr),
            Data::Float64(v) => write_all(v, ptr),
            Data::String(_) => {}
        }
    }
}

//! In-memory schema tree of one native library.

use std::collections::HashMap;

use itertools::Itertools;

use crate::{port::Port, Error};

/// A field of a struct: its byte offset within the parent and its descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub offset: usize,
    pub port: Port,
}

/// The fields of a single native struct, keyed by name.
///
/// Offsets come from the native build and are never recomputed here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassData {
    fields: HashMap<String, Field>,
    size: Option<usize>,
}

impl ClassData {
    pub fn new() -> Self {
        Self::default()
    }

    /// A struct whose native size is known, as reported by reflection.
    pub fn with_size(size: usize) -> Self {
        Self {
            size: Some(size),
            ..Self::default()
        }
    }

    /// Native size in bytes, if the library reported it
    pub fn size(&self) -> Option<usize> {
        self.size
    }

    /// Insert a field. Offsets must be unique within the struct; re-inserting a field under the
    /// same name replaces it.
    pub fn insert(&mut self, name: impl Into<String>, offset: usize, port: Port) -> Result<(), Error> {
        let name = name.into();
        if let Some(existing) = self
            .fields
            .values()
            .find(|f| f.offset == offset && f.name != name)
        {
            return Err(Error::OffsetCollision {
                field: name,
                existing: existing.name.clone(),
                offset,
            });
        }
        self.fields.insert(name.clone(), Field { name, offset, port });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Fields ordered by ascending offset, mirroring native memory layout.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values().sorted_by_key(|f| f.offset)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// All structs of one library plus the name of its top-level struct.
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryData {
    top: String,
    classes: HashMap<String, ClassData>,
}

impl LibraryData {
    pub fn new(top: impl Into<String>) -> Self {
        Self {
            top: top.into(),
            classes: HashMap::new(),
        }
    }

    /// Name of the struct that model objects of this library are instances of
    pub fn top(&self) -> &str {
        &self.top
    }

    pub fn class(&self, name: &str) -> Option<&ClassData> {
        self.classes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn insert_class(&mut self, name: impl Into<String>, class: ClassData) {
        self.classes.insert(name.into(), class);
    }

    /// Struct names in lexical order
    pub fn struct_names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str).sorted()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

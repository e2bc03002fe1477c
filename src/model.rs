//! Model instances and the table that owns them.

use std::{
    collections::{BTreeMap, BTreeSet},
    ffi::c_void,
    fmt::Display,
    ptr::NonNull,
};

use crate::{Entity, Error};

/// Names a model instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelReference(String);

impl ModelReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Display for ModelReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelReference {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ModelReference {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&ModelReference> for ModelReference {
    fn from(reference: &ModelReference) -> Self {
        reference.clone()
    }
}

/// A port on a specific model.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub model: ModelReference,
    pub path: String,
}

impl Location {
    pub fn new(model: impl Into<ModelReference>, path: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            path: path.into(),
        }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.model, self.path)
    }
}

/// A live object created by a model library's factory.
///
/// The object is owned by native code. Its pointer may be replaced when the scheduler relocates
/// the model.
#[derive(Debug)]
pub struct ModelInstance {
    library: String,
    name: String,
    tags: BTreeSet<String>,
    object: NonNull<c_void>,
}

impl ModelInstance {
    pub fn new(
        library: impl Into<String>,
        name: impl Into<String>,
        tags: impl IntoIterator<Item = impl Into<String>>,
        object: NonNull<c_void>,
    ) -> Self {
        Self {
            library: library.into(),
            name: name.into(),
            tags: tags.into_iter().map(Into::into).collect(),
            object,
        }
    }

    /// Identifier of the library that created this model
    pub fn library(&self) -> &str {
        &self.library
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reference(&self) -> ModelReference {
        ModelReference::new(&self.name)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// The current native object pointer
    pub fn object(&self) -> NonNull<c_void> {
        self.object
    }

    /// Replace the object pointer, returning the previous one.
    pub(crate) fn relocate(&mut self, object: NonNull<c_void>) -> NonNull<c_void> {
        log::debug!(
            "Model '{}' relocated from {:p} to {:p}",
            self.name,
            self.object,
            object
        );
        std::mem::replace(&mut self.object, object)
    }
}

/// Model instances keyed by name.
#[derive(Debug, Default)]
pub struct ModelTable {
    models: BTreeMap<String, ModelInstance>,
}

impl ModelTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, model: ModelInstance) -> Result<ModelReference, Error> {
        if self.models.contains_key(model.name()) {
            return Err(Error::AlreadyExists {
                kind: Entity::Model,
                name: model.name().to_owned(),
            });
        }
        let reference = model.reference();
        self.models.insert(model.name().to_owned(), model);
        Ok(reference)
    }

    pub fn get(&self, model: &ModelReference) -> Result<&ModelInstance, Error> {
        self.models
            .get(model.name())
            .ok_or_else(|| Error::not_found(Entity::Model, model.name()))
    }

    pub fn get_mut(&mut self, model: &ModelReference) -> Result<&mut ModelInstance, Error> {
        self.models
            .get_mut(model.name())
            .ok_or_else(|| Error::not_found(Entity::Model, model.name()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<ModelInstance> {
        self.models.remove(name)
    }

    /// Remove every model created by `library`, returning their names.
    pub fn purge_library(&mut self, library: &str) -> Vec<String> {
        let names: Vec<String> = self
            .models
            .values()
            .filter(|model| model.library() == library)
            .map(|model| model.name().to_owned())
            .collect();
        for name in &names {
            self.models.remove(name);
        }
        names
    }

    /// Model references in name order
    pub fn references(&self) -> Vec<ModelReference> {
        self.models.keys().map(ModelReference::new).collect()
    }

    pub fn with_tag(&self, tag: &str) -> Vec<ModelReference> {
        self.models
            .values()
            .filter(|model| model.has_tag(tag))
            .map(ModelInstance::reference)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelInstance> {
        self.models.values()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.models.clear();
    }
}

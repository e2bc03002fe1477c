//! Schema metadata of the loaded libraries.

use std::collections::{HashMap, HashSet};

use itertools::Itertools;

use rsis_schema::{
    document::parse_field, ClassData, Field, Language, LibraryData, SchemaDocument,
};
use rsis_sys::model::ModelBinding;

use crate::{reflect, Entity, Error};

#[derive(Debug)]
struct RegisteredLibrary {
    data: LibraryData,
    language: Language,
    namespace: Option<String>,
}

/// Per-library schema trees, keyed by library identifier.
#[derive(Debug, Default)]
pub struct MetadataRegistry {
    libraries: HashMap<String, RegisteredLibrary>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a library's schema tree by walking `document` from its top-level struct.
    ///
    /// Malformed fields, fields that reference an undeclared struct, and fields that would make a
    /// struct contain itself are skipped with a warning. Two fields sharing an offset fail the whole
    /// library. Structs not reachable from the top-level struct are ignored.
    pub fn build_library(document: &SchemaDocument) -> Result<LibraryData, Error> {
        let top = document.top();
        if document.struct_entry(top).is_none() {
            return Err(Error::not_found(Entity::Struct, top));
        }
        let mut data = LibraryData::new(top);
        let mut stack = HashSet::new();
        walk(document, top, &mut data, &mut stack)?;
        Ok(data)
    }

    /// Register a library from a schema document.
    pub fn register(
        &mut self,
        library: &str,
        language: Language,
        namespace: Option<&str>,
        document: &SchemaDocument,
    ) -> Result<(), Error> {
        let data = Self::build_library(document)?;
        self.register_data(library, language, namespace, data);
        Ok(())
    }

    /// Register a library by walking its native reflection callbacks.
    pub fn register_reflected(
        &mut self,
        library: &str,
        language: Language,
        namespace: Option<&str>,
        binding: &ModelBinding,
    ) -> Result<(), Error> {
        let data = reflect::reflect_library(binding, language)?;
        self.register_data(library, language, namespace, data);
        Ok(())
    }

    /// Register an already built schema tree, replacing any previous registration.
    pub fn register_data(
        &mut self,
        library: &str,
        language: Language,
        namespace: Option<&str>,
        data: LibraryData,
    ) {
        log::debug!(
            "Registering library '{library}' ({language}): {} structs, top '{}'",
            data.len(),
            data.top()
        );
        let previous = self.libraries.insert(
            library.to_owned(),
            RegisteredLibrary {
                data,
                language,
                namespace: namespace.map(str::to_owned),
            },
        );
        if previous.is_some() {
            log::warn!(
                "Library '{library}' was already registered; its previous metadata has been replaced"
            );
        }
    }

    /// Remove a library's metadata. Returns `false` (with a warning) if it was not registered.
    pub fn unregister(&mut self, library: &str) -> bool {
        if self.libraries.remove(library).is_none() {
            log::warn!("Library '{library}' is not registered");
            return false;
        }
        log::debug!("Unregistered library '{library}'");
        true
    }

    pub fn contains(&self, library: &str) -> bool {
        self.libraries.contains_key(library)
    }

    /// Registered library identifiers, sorted
    pub fn libraries(&self) -> Vec<&str> {
        self.libraries.keys().map(String::as_str).sorted_unstable().collect()
    }

    fn entry(&self, library: &str) -> Result<&RegisteredLibrary, Error> {
        self.libraries
            .get(library)
            .ok_or_else(|| Error::not_found(Entity::Library, library))
    }

    pub fn library(&self, library: &str) -> Result<&LibraryData, Error> {
        self.entry(library).map(|entry| &entry.data)
    }

    pub fn language(&self, library: &str) -> Result<Language, Error> {
        self.entry(library).map(|entry| entry.language)
    }

    /// The namespace supplied when the library was registered
    pub fn namespace(&self, library: &str) -> Result<Option<&str>, Error> {
        self.entry(library).map(|entry| entry.namespace.as_deref())
    }

    pub fn struct_names(&self, library: &str) -> Result<Vec<&str>, Error> {
        Ok(self.library(library)?.struct_names().collect())
    }

    fn class(&self, library: &str, name: &str) -> Result<&ClassData, Error> {
        self.library(library)?
            .class(name)
            .ok_or_else(|| Error::not_found(Entity::Struct, format!("{library}::{name}")))
    }

    /// Fields of a struct in ascending offset order
    pub fn struct_fields(&self, library: &str, name: &str) -> Result<Vec<&Field>, Error> {
        Ok(self.class(library, name)?.fields().collect())
    }

    /// `namespace::Struct` when the library was registered with a namespace, otherwise the bare
    /// struct name.
    pub fn qualified_name(&self, library: &str, name: &str) -> Result<String, Error> {
        self.class(library, name)?;
        Ok(match self.namespace(library)? {
            Some(namespace) => format!("{namespace}::{name}"),
            None => name.to_owned(),
        })
    }

    /// Find a struct by its qualified name, returning the library that declares it.
    pub fn find_struct(&self, qualified: &str) -> Option<(&str, &ClassData)> {
        let (namespace, name) = match qualified.rsplit_once("::") {
            Some((namespace, name)) => (Some(namespace), name),
            None => (None, qualified),
        };
        self.libraries
            .iter()
            .sorted_unstable_by(|(a, _), (b, _)| a.cmp(b))
            .filter(|(_, entry)| entry.namespace.as_deref() == namespace)
            .find_map(|(library, entry)| {
                entry.data.class(name).map(|class| (library.as_str(), class))
            })
    }
}

fn walk(
    document: &SchemaDocument,
    name: &str,
    data: &mut LibraryData,
    stack: &mut HashSet<String>,
) -> Result<(), Error> {
    let Some(entry) = document.struct_entry(name) else {
        return Ok(());
    };
    stack.insert(name.to_owned());

    let mut class = ClassData::new();
    for (field_name, value) in entry {
        let (offset, port) = match parse_field(value) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::warn!("Skipping field '{name}.{field_name}': {e}");
                continue;
            }
        };

        if let Some(child) = port.class() {
            if stack.contains(child) {
                log::warn!("Skipping field '{name}.{field_name}': struct '{child}' contains itself");
                continue;
            }
            if document.struct_entry(child).is_none() {
                log::warn!("Skipping field '{name}.{field_name}': unknown struct '{child}'");
                continue;
            }
            if !data.contains(child) {
                walk(document, child, data, stack)?;
            }
        }

        class
            .insert(field_name.as_str(), offset, port)
            .map_err(|e| Error::InvalidValue(format!("struct '{name}': {e}")))?;
    }

    stack.remove(name);
    data.insert_class(name, class);
    Ok(())
}

#[cfg(test)]
mod tests {
    use rsis_schema::{PortType, PrimitiveType};
    use serde_json::json;

    use super::*;

    fn document() -> SchemaDocument {
        SchemaDocument::from_value(json!({
            "top": "Sat",
            "structs": {
                "Sat": {
                    "inputs": {"class": "SatInputs", "offset": 0},
                    "data": {"type": "Float64", "offset": 32, "dims": [], "unit": "kg"},
                    "broken": {"type": "Float64", "dims": []},
                    "ghost": {"class": "Missing", "offset": 40},
                },
                "SatInputs": {
                    "enabled": {"type": "Boolean", "offset": 24, "dims": []},
                    "pos": {"type": "Float64", "offset": 0, "dims": [3], "unit": "m"},
                },
                "Unreachable": {
                    "x": {"type": "Int8", "offset": 0, "dims": []},
                },
            }
        }))
        .unwrap()
    }

    #[test_log::test]
    fn test_register_document() {
        let mut registry = MetadataRegistry::new();
        registry
            .register("sat", Language::Cpp, Some("space"), &document())
            .unwrap();

        assert_eq!(registry.struct_names("sat").unwrap(), ["Sat", "SatInputs"]);

        let names: Vec<_> = registry
            .struct_fields("sat", "Sat")
            .unwrap()
            .into_iter()
            .map(|field| field.name.as_str())
            .collect();
        // `broken` and `ghost` are skipped
        assert_eq!(names.len(), 2);
        assert_eq!(names[0], "inputs");

        let inputs = registry.struct_fields("sat", "SatInputs").unwrap();
        assert_eq!(inputs[0].name, "pos");
        assert_eq!(inputs[0].port.dims, [3]);
        assert_eq!(inputs[0].port.unit.as_deref(), Some("m"));
        assert_eq!(inputs[1].name, "enabled");
        assert_eq!(inputs[1].port.r#type, PortType::Primitive(PrimitiveType::Boolean));

        assert_eq!(registry.qualified_name("sat", "SatInputs").unwrap(), "space::SatInputs");
        assert_eq!(
            registry.find_struct("space::SatInputs").map(|(lib, _)| lib),
            Some("sat")
        );
        assert!(registry.find_struct("SatInputs").is_none());
    }

    #[test_log::test]
    fn test_self_reference_is_skipped() {
        let document = SchemaDocument::from_value(json!({
            "top": "Node",
            "structs": {
                "Node": {
                    "value": {"type": "Int32", "offset": 0, "dims": []},
                    "next": {"class": "Node", "offset": 8},
                },
            }
        }))
        .unwrap();
        let data = MetadataRegistry::build_library(&document).unwrap();
        let node = data.class("Node").unwrap();
        assert_eq!(node.len(), 1);
        assert!(node.get("next").is_none());
    }

    #[test_log::test]
    fn test_duplicate_offset() {
        let document = SchemaDocument::from_value(json!({
            "top": "Sat",
            "structs": {
                "Sat": {
                    "inputs": {"class": "SatInputs", "offset": 0},
                    "data": {"type": "Float64", "offset": 8, "dims": []},
                },
                "SatInputs": {
                    "alias": {"type": "Int32", "offset": 4, "dims": []},
                    "count": {"type": "Int32", "offset": 4, "dims": []},
                },
            }
        }))
        .unwrap();
        match MetadataRegistry::build_library(&document) {
            Err(Error::InvalidValue(message)) => {
                assert!(message.contains("SatInputs"));
                assert!(message.contains("offset 4"));
            }
            other => panic!("unexpected {other:?}"),
        }

        let mut registry = MetadataRegistry::new();
        assert!(registry.register("sat", Language::Cpp, None, &document).is_err());
        assert!(!registry.contains("sat"));
    }

    #[test]
    fn test_missing_top() {
        let document =
            SchemaDocument::from_value(json!({"top": "Sat", "structs": {"Other": {}}})).unwrap();
        assert!(matches!(
            MetadataRegistry::build_library(&document),
            Err(Error::NotFound { kind: Entity::Struct, .. })
        ));
    }

    #[test_log::test]
    fn test_reregister_and_unregister() {
        let mut registry = MetadataRegistry::new();
        registry.register("sat", Language::Cpp, None, &document()).unwrap();
        registry.register("sat", Language::Rust, None, &document()).unwrap();
        assert_eq!(registry.language("sat").unwrap(), Language::Rust);
        assert_eq!(registry.qualified_name("sat", "Sat").unwrap(), "Sat");
        assert_eq!(registry.libraries(), ["sat"]);

        assert!(registry.unregister("sat"));
        assert!(!registry.unregister("sat"));
        assert!(matches!(
            registry.struct_names("sat"),
            Err(Error::NotFound { kind: Entity::Library, .. })
        ));
    }
}

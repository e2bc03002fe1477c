//! Discovery, linking and unlinking of model libraries, and the models they create.
//!
//! Libraries are located through manifests named `<library>.<profile>.rsis.toml` found in the
//! configured search directories. The manifest names the binary to link and, optionally, embeds
//! the library's schema document.

use std::{
    collections::BTreeMap,
    ffi::CStr,
    fmt::Display,
    path::{Path, PathBuf},
    ptr::NonNull,
};

use rsis_schema::{manifest::ManifestName, LibraryData, Manifest, SchemaDocument};
use rsis_sys::model::ModelBinding;

use crate::{
    model::{ModelInstance, ModelReference, ModelTable},
    reflect,
    registry::MetadataRegistry,
    Entity, Error,
};

/// Environment variable holding extra manifest search directories, in `PATH` syntax
pub const LIBRARY_PATH_ENV: &str = "RSIS_LIBRARY_PATH";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoaderOptions {
    /// Directories scanned for manifests, in order
    pub search_paths: Vec<PathBuf>,
    /// Profile used when a load does not request one
    pub default_profile: Option<String>,
}

impl LoaderOptions {
    /// Options with the search directories listed in `RSIS_LIBRARY_PATH`.
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Some(paths) = std::env::var_os(LIBRARY_PATH_ENV) {
            options.search_paths.extend(std::env::split_paths(&paths));
        }
        options
    }

    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }

    pub fn with_default_profile(mut self, profile: impl Into<String>) -> Self {
        self.default_profile = Some(profile.into());
        self
    }
}

/// Links the binary named by a manifest.
pub trait Linker {
    fn link(&self, manifest: &Manifest, binary: &Path) -> Result<ModelBinding, Error>;
}

/// Links binaries with the platform's dynamic loader.
#[derive(Debug, Default, Clone, Copy)]
pub struct DynamicLinker;

impl Linker for DynamicLinker {
    fn link(&self, _manifest: &Manifest, binary: &Path) -> Result<ModelBinding, Error> {
        log::debug!("Loading shared library {binary:?}");
        // SAFETY: the manifest vouches that the binary exports the model-library symbols.
        unsafe { ModelBinding::new(binary) }.map_err(Error::from)
    }
}

/// A manifest found during discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub name: ManifestName,
}

/// Outcome of a load request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Loaded {
        profile: String,
        namespace: Option<String>,
    },
    AlreadyLoaded,
}

impl Display for LoadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadStatus::Loaded {
                profile,
                namespace: Some(namespace),
            } => write!(f, "loaded ({profile}) as {namespace}"),
            LoadStatus::Loaded { profile, .. } => write!(f, "loaded ({profile})"),
            LoadStatus::AlreadyLoaded => f.write_str("already loaded"),
        }
    }
}

#[derive(Debug)]
struct LoadedLibrary {
    manifest_path: PathBuf,
    profile: String,
    binding: ModelBinding,
}

/// Owns the linked libraries and the models created from them.
pub struct LibraryLoader {
    options: LoaderOptions,
    linker: Box<dyn Linker>,
    models: ModelTable,
    libraries: BTreeMap<String, LoadedLibrary>,
}

impl std::fmt::Debug for LibraryLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryLoader")
            .field("options", &self.options)
            .field("models", &self.models)
            .field("libraries", &self.libraries)
            .finish_non_exhaustive()
    }
}

fn invalid_manifest(path: &Path, reason: impl Display) -> Error {
    Error::InvalidManifest {
        path: path.to_owned(),
        reason: reason.to_string(),
    }
}

impl LibraryLoader {
    pub fn new(options: LoaderOptions) -> Self {
        Self::with_linker(options, DynamicLinker)
    }

    pub fn with_linker(options: LoaderOptions, linker: impl Linker + 'static) -> Self {
        Self {
            options,
            linker: Box::new(linker),
            models: ModelTable::new(),
            libraries: BTreeMap::new(),
        }
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    pub fn add_search_path(&mut self, path: impl Into<PathBuf>) {
        self.options.search_paths.push(path.into());
    }

    /// Every manifest for `name`: search directories in order, file names sorted within each.
    pub fn candidates(&self, name: &str) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        for dir in &self.options.search_paths {
            let entries = match std::fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(e) => {
                    log::warn!("Skipping search path {dir:?}: {e}");
                    continue;
                }
            };
            let mut found: Vec<Candidate> = entries
                .filter_map(Result::ok)
                .filter_map(|entry| {
                    let file_name = entry.file_name();
                    let manifest_name = ManifestName::parse(file_name.to_str()?)?;
                    (manifest_name.library == name).then(|| Candidate {
                        path: entry.path(),
                        name: manifest_name,
                    })
                })
                .collect();
            found.sort_by(|a, b| a.path.cmp(&b.path));
            candidates.extend(found);
        }
        candidates
    }

    /// The manifest a load of `name` would use. Without an explicit or default profile the first
    /// candidate wins.
    pub fn discover(&self, name: &str, profile: Option<&str>) -> Result<Candidate, Error> {
        let profile = profile.or(self.options.default_profile.as_deref());
        self.candidates(name)
            .into_iter()
            .find(|candidate| profile.map_or(true, |p| candidate.name.profile == p))
            .ok_or_else(|| Error::LibraryNotFound {
                name: name.to_owned(),
                profile: profile.map(str::to_owned),
            })
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.libraries.contains_key(name)
    }

    /// Loaded library identifiers, sorted
    pub fn libraries(&self) -> Vec<&str> {
        self.libraries.keys().map(String::as_str).collect()
    }

    /// The manifest file and profile a loaded library came from
    pub fn source(&self, name: &str) -> Option<(&Path, &str)> {
        self.libraries
            .get(name)
            .map(|lib| (lib.manifest_path.as_path(), lib.profile.as_str()))
    }

    /// Discover, link and register a library. Loading an already loaded library does nothing.
    pub fn load(
        &mut self,
        registry: &mut MetadataRegistry,
        name: &str,
        namespace: Option<&str>,
        profile: Option<&str>,
    ) -> Result<LoadStatus, Error> {
        if self.is_loaded(name) {
            log::info!("Library '{name}' is already loaded");
            return Ok(LoadStatus::AlreadyLoaded);
        }

        let candidate = self.discover(name, profile)?;
        let path = candidate.path.as_path();
        log::debug!("Using manifest {path:?} for library '{name}'");

        let text = std::fs::read_to_string(path)?;
        let manifest: Manifest = text.parse().map_err(|e| invalid_manifest(path, e))?;
        if manifest.rsis.name != name {
            return Err(invalid_manifest(
                path,
                format!("declares library '{}'", manifest.rsis.name),
            ));
        }
        check_framework_version(&manifest, path)?;

        let embedded = manifest
            .schema_document()
            .transpose()
            .map_err(|e| invalid_manifest(path, e))?;

        let dir = path.parent().unwrap_or(Path::new("."));
        let binary = std::path::absolute(dir.join(&manifest.binary.file))?;
        let binding = self.linker.link(&manifest, &binary).map_err(|e| match e {
            Error::Sys(rsis_sys::Error::Open { .. }) => {
                log::error!("{e}");
                Error::LibraryNotFound {
                    name: name.to_owned(),
                    profile: Some(candidate.name.profile.clone()),
                }
            }
            Error::Sys(sys @ rsis_sys::Error::MissingSymbol { .. })
            | Error::Sys(sys @ rsis_sys::Error::NullSymbol(_)) => invalid_manifest(path, sys),
            other => other,
        })?;

        let language = manifest.rsis.language;
        let data = match embedded {
            Some(document) => MetadataRegistry::build_library(&document),
            None => library_metadata(&binding, language, path),
        }
        .map_err(|e| match e {
            Error::NotFound { .. } | Error::InvalidValue(_) => {
                invalid_manifest(path, format!("schema of library '{name}': {e}"))
            }
            other => other,
        })?;
        registry.register_data(name, language, namespace, data);

        log::info!(
            "Loaded library '{name}' ({}, profile {})",
            manifest.rsis.language,
            candidate.name.profile
        );
        self.libraries.insert(
            name.to_owned(),
            LoadedLibrary {
                manifest_path: candidate.path.clone(),
                profile: candidate.name.profile.clone(),
                binding,
            },
        );
        Ok(LoadStatus::Loaded {
            profile: candidate.name.profile,
            namespace: namespace.map(str::to_owned),
        })
    }

    /// Destroy the library's models, unlink it and drop its metadata.
    ///
    /// Returns `false` (with a warning) if the library was not loaded.
    pub fn unload(&mut self, registry: &mut MetadataRegistry, name: &str) -> bool {
        let Some(library) = self.libraries.remove(name) else {
            log::warn!("Library '{name}' is not loaded");
            return false;
        };
        for model in self.models.purge_library(name) {
            log::debug!("Removed model '{model}' of library '{name}'");
        }
        drop(library);
        registry.unregister(name);
        log::info!("Unloaded library '{name}'");
        true
    }

    /// Create a model through the library's factory and register it under `name`.
    pub fn create_model(
        &mut self,
        library: &str,
        name: &str,
        tags: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<ModelReference, Error> {
        if self.models.contains(name) {
            return Err(Error::AlreadyExists {
                kind: Entity::Model,
                name: name.to_owned(),
            });
        }
        let loaded = self
            .libraries
            .get(library)
            .ok_or_else(|| Error::not_found(Entity::Library, library))?;

        // SAFETY: the factory takes no arguments and returns an owned object or null.
        let object = unsafe { loaded.binding.rsis_create_model() };
        let object = NonNull::new(object).ok_or_else(|| Error::NativeCall {
            call: rsis_sys::model::RSIS_CREATE_MODEL,
            message: format!("library '{library}' returned no object"),
        })?;

        log::debug!("Created model '{name}' from library '{library}' at {object:p}");
        self.models
            .insert(ModelInstance::new(library, name, tags, object))
    }

    /// Remove a model. Returns `false` (with a warning) if there is no such model.
    pub fn delete_model(&mut self, name: &str) -> bool {
        if self.models.remove(name).is_none() {
            log::warn!("Model '{name}' does not exist");
            return false;
        }
        log::debug!("Deleted model '{name}'");
        true
    }

    pub fn models(&self) -> &ModelTable {
        &self.models
    }

    pub fn models_mut(&mut self) -> &mut ModelTable {
        &mut self.models
    }
}

impl Drop for LibraryLoader {
    fn drop(&mut self) {
        // Models must go before the code that created them.
        self.models.clear();
        while let Some((name, _)) = self.libraries.pop_last() {
            log::trace!("Unlinking library '{name}'");
        }
    }
}

fn check_framework_version(manifest: &Manifest, path: &Path) -> Result<(), Error> {
    let version = manifest
        .framework_version()
        .map_err(|e| invalid_manifest(path, e))?;
    let ours: Result<semver::Version, _> = lenient_semver::parse(crate::built_info::PKG_VERSION);
    match ours {
        Ok(ours) if ours.major != version.major || (ours.major == 0 && ours.minor != version.minor) => {
            log::warn!(
                "Library '{}' was built against framework version {version}, this is {ours}",
                manifest.rsis.name
            );
        }
        Ok(_) => {}
        Err(e) => log::trace!("Not checking framework version: {e}"),
    }
    Ok(())
}

/// Schema tree of a linked library without an embedded document: its `rsis_metadata` document if
/// it has one, otherwise the reflection traversal.
fn library_metadata(
    binding: &ModelBinding,
    language: rsis_schema::Language,
    path: &Path,
) -> Result<LibraryData, Error> {
    // SAFETY: `rsis_metadata` takes no arguments and returns a static string or null.
    let metadata = unsafe { binding.rsis_metadata() };
    if metadata.is_null() {
        return reflect::reflect_library(binding, language);
    }
    // SAFETY: non-null results are NUL-terminated and live as long as the library.
    let text = unsafe { CStr::from_ptr(metadata) }.to_str()?;
    let document: SchemaDocument = text.parse().map_err(|e| invalid_manifest(path, e))?;
    MetadataRegistry::build_library(&document)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn touch(dir: &Path, file: &str) {
        fs::write(dir.join(file), "").unwrap();
    }

    #[test]
    fn test_discovery_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        touch(first.path(), "sat.release.rsis.toml");
        touch(first.path(), "sat.debug.rsis.toml");
        touch(first.path(), "gnc.release.rsis.toml");
        touch(first.path(), "sat.rsis.toml");
        touch(second.path(), "sat.fast.rsis.toml");

        let loader = LibraryLoader::new(
            LoaderOptions::default()
                .with_search_path(first.path())
                .with_search_path(second.path().join("missing"))
                .with_search_path(second.path()),
        );

        let profiles: Vec<_> = loader
            .candidates("sat")
            .into_iter()
            .map(|c| c.name.profile)
            .collect();
        assert_eq!(profiles, ["debug", "release", "fast"]);

        assert_eq!(loader.discover("sat", None).unwrap().name.profile, "debug");
        assert_eq!(loader.discover("sat", Some("fast")).unwrap().name.profile, "fast");
        assert!(matches!(
            loader.discover("sat", Some("profiling")),
            Err(Error::LibraryNotFound { profile: Some(p), .. }) if p == "profiling"
        ));
        assert!(matches!(
            loader.discover("thermal", None),
            Err(Error::LibraryNotFound { profile: None, .. })
        ));
    }

    #[test]
    fn test_default_profile() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "sat.debug.rsis.toml");
        touch(dir.path(), "sat.release.rsis.toml");
        let loader = LibraryLoader::new(
            LoaderOptions::default()
                .with_search_path(dir.path())
                .with_default_profile("release"),
        );
        assert_eq!(loader.discover("sat", None).unwrap().name.profile, "release");
        assert_eq!(loader.discover("sat", Some("debug")).unwrap().name.profile, "debug");
    }

    #[test]
    fn test_unknown_entities() {
        let mut registry = MetadataRegistry::new();
        let mut loader = LibraryLoader::new(LoaderOptions::default());
        assert!(!loader.unload(&mut registry, "sat"));
        assert!(!loader.delete_model("sat1"));
        assert!(matches!(
            loader.create_model("sat", "sat1", ["a"]),
            Err(Error::NotFound { kind: Entity::Library, .. })
        ));
    }
}

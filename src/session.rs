//! A host session: loaded libraries, their models, the connections between them and an optional
//! scheduler runtime.

use std::ptr::NonNull;

use rsis_schema::Port;

use crate::{
    connection::ConnectionGraph,
    loader::{LibraryLoader, LoadStatus, LoaderOptions, Linker},
    model::{Location, ModelInstance, ModelReference},
    registry::MetadataRegistry,
    resolver::PortResolver,
    scheduler::Scheduler,
    signal::{SignalAccessor, Utf8Access},
    value::Value,
    Error,
};

/// Owns every host-side component.
///
/// Fields drop in declaration order: the scheduler shuts down before models are destroyed, and
/// models before their libraries are unlinked.
#[derive(Debug)]
pub struct Session {
    scheduler: Option<Scheduler>,
    connections: ConnectionGraph,
    loader: LibraryLoader,
    registry: MetadataRegistry,
}

impl Session {
    pub fn new(options: LoaderOptions) -> Self {
        Self::from_loader(LibraryLoader::new(options))
    }

    pub fn with_linker(options: LoaderOptions, linker: impl Linker + 'static) -> Self {
        Self::from_loader(LibraryLoader::with_linker(options, linker))
    }

    fn from_loader(loader: LibraryLoader) -> Self {
        Self {
            scheduler: None,
            connections: ConnectionGraph::new(),
            loader,
            registry: MetadataRegistry::new(),
        }
    }

    /// Attach a scheduler runtime, returning the one it replaces.
    pub fn attach_scheduler(&mut self, scheduler: Scheduler) -> Option<Scheduler> {
        self.scheduler.replace(scheduler)
    }

    pub fn scheduler(&self) -> Option<&Scheduler> {
        self.scheduler.as_ref()
    }

    pub fn scheduler_mut(&mut self) -> Option<&mut Scheduler> {
        self.scheduler.as_mut()
    }

    pub fn registry(&self) -> &MetadataRegistry {
        &self.registry
    }

    pub fn loader(&self) -> &LibraryLoader {
        &self.loader
    }

    pub fn add_search_path(&mut self, path: impl Into<std::path::PathBuf>) {
        self.loader.add_search_path(path);
    }

    pub fn load_library(
        &mut self,
        name: &str,
        namespace: Option<&str>,
        profile: Option<&str>,
    ) -> Result<LoadStatus, Error> {
        self.loader.load(&mut self.registry, name, namespace, profile)
    }

    /// Unload a library and every model it created. Connections touching those models are kept;
    /// see [`Session::dangling_connections`].
    pub fn unload_library(&mut self, name: &str) -> bool {
        self.loader.unload(&mut self.registry, name)
    }

    pub fn list_libraries(&self) -> Vec<&str> {
        self.loader.libraries()
    }

    pub fn create_model(
        &mut self,
        library: &str,
        name: &str,
        tags: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<ModelReference, Error> {
        self.loader.create_model(library, name, tags)
    }

    pub fn delete_model(&mut self, name: &str) -> bool {
        self.loader.delete_model(name)
    }

    pub fn list_models(&self) -> Vec<ModelReference> {
        self.loader.models().references()
    }

    pub fn models_with_tag(&self, tag: &str) -> Vec<ModelReference> {
        self.loader.models().with_tag(tag)
    }

    pub fn model(&self, model: &ModelReference) -> Result<&ModelInstance, Error> {
        self.loader.models().get(model)
    }

    /// Address and descriptor of a leaf port
    pub fn resolve(&self, model: &ModelReference, path: &str) -> Result<(NonNull<u8>, &Port), Error> {
        let instance = self.loader.models().get(model)?;
        let resolved = PortResolver::new(&self.registry).resolve(instance, path)?;
        Ok((resolved.address, resolved.port))
    }

    fn accessor(&self) -> SignalAccessor<'_> {
        let accessor =
            SignalAccessor::new(PortResolver::new(&self.registry), self.loader.models());
        match &self.scheduler {
            Some(scheduler) => accessor.with_strings(scheduler as &dyn Utf8Access),
            None => accessor,
        }
    }

    pub fn get(&self, model: &ModelReference, path: &str) -> Result<Value, Error> {
        self.accessor().get(model, path)
    }

    pub fn set(&mut self, model: &ModelReference, path: &str, value: &Value) -> Result<(), Error> {
        self.accessor().set(model, path, value)
    }

    pub fn connect(&mut self, output: Location, input: Location) -> Result<(), Error> {
        let resolver = PortResolver::new(&self.registry);
        self.connections
            .connect(&resolver, self.loader.models(), output, input)
    }

    pub fn remove_connection(&mut self, input: &Location) -> Option<Location> {
        self.connections.remove_connection(input)
    }

    pub fn list_connections(&self) -> Vec<(Location, Location)> {
        self.connections.list_connections()
    }

    pub fn connections_for(&self, model: &ModelReference) -> Vec<(Location, Location)> {
        self.connections.connections_for(model)
    }

    pub fn dangling_connections(&self) -> Vec<(Location, Location)> {
        self.connections.dangling(self.loader.models())
    }

    /// Schedule a model through the attached scheduler runtime.
    pub fn register_model(
        &mut self,
        model: &ModelReference,
        thread: u32,
        divisor: u32,
        offset: u32,
    ) -> Result<(), Error> {
        let scheduler = self.scheduler.as_mut().ok_or_else(|| Error::NativeCall {
            call: "rsis_register_model",
            message: "no scheduler runtime is attached".to_owned(),
        })?;
        let instance = self.loader.models_mut().get_mut(model)?;
        scheduler.register_model(instance, thread, divisor, offset)
    }
}

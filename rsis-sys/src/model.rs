//! Call table of a model library.

use std::{
    ffi::{c_char, c_void},
    path::PathBuf,
};

use libloading::Library;

use crate::{load_fn, open, Error};

pub const RSIS_CREATE_MODEL: &str = "rsis_create_model";
pub const RSIS_REFLECT: &str = "rsis_reflect";
pub const RSIS_METADATA: &str = "rsis_metadata";

/// Reports one struct: its name and total size in bytes.
pub type rsisClassCallback = unsafe extern "C" fn(ctx: *mut c_void, name: *const c_char, size: usize);

/// Reports one member of a previously reported struct: owning struct, member name, native type
/// tag, byte offset and dimension tuple (`ndims == 0` for scalars).
pub type rsisMemberCallback = unsafe extern "C" fn(
    ctx: *mut c_void,
    class: *const c_char,
    name: *const c_char,
    type_tag: *const c_char,
    offset: usize,
    dims: *const usize,
    ndims: usize,
);

pub type rsisCreateModel = unsafe extern "C" fn() -> *mut c_void;

/// Synchronously walks every struct of the library, calling `class` once per struct and `member`
/// once per member. Callbacks are not retained after it returns.
pub type rsisReflect =
    unsafe extern "C" fn(ctx: *mut c_void, class: rsisClassCallback, member: rsisMemberCallback);

/// Returns the library's schema document as NUL-terminated JSON, or null.
pub type rsisMetadata = unsafe extern "C" fn() -> *const c_char;

#[derive(Debug, Clone, Copy)]
pub struct ModelApi {
    pub create_model: rsisCreateModel,
    pub reflect: rsisReflect,
    pub metadata: rsisMetadata,
}

/// A resolved model-library call table, keeping its library resident.
pub struct ModelBinding {
    api: ModelApi,
    library: Option<Library>,
}

impl std::fmt::Debug for ModelBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelBinding")
            .field("api", &self.api)
            .field("dynamic", &self.library.is_some())
            .finish()
    }
}

impl ModelBinding {
    /// Open the shared library at `path` and resolve its call table.
    ///
    /// # Safety
    /// The library's initialisers run, and its symbols must have the signatures declared here.
    pub unsafe fn new(path: impl Into<PathBuf>) -> Result<Self, Error> {
        Self::from_library(open(path.into())?)
    }

    /// Resolve the call table from an already opened library.
    ///
    /// # Safety
    /// The library's symbols must have the signatures declared here.
    pub unsafe fn from_library(library: Library) -> Result<Self, Error> {
        let api = ModelApi {
            create_model: load_fn(&library, RSIS_CREATE_MODEL)?,
            reflect: load_fn(&library, RSIS_REFLECT)?,
            metadata: load_fn(&library, RSIS_METADATA)?,
        };
        Ok(Self {
            api,
            library: Some(library),
        })
    }

    /// Wrap a table of functions that are linked into the current process.
    pub fn from_api(api: ModelApi) -> Self {
        Self { api, library: None }
    }

    pub fn api(&self) -> &ModelApi {
        &self.api
    }

    /// # Safety
    /// Calls into native code.
    pub unsafe fn rsis_create_model(&self) -> *mut c_void {
        (self.api.create_model)()
    }

    /// # Safety
    /// Calls into native code; `ctx` must be valid for the callbacks for the whole call.
    pub unsafe fn rsis_reflect(
        &self,
        ctx: *mut c_void,
        class: rsisClassCallback,
        member: rsisMemberCallback,
    ) {
        (self.api.reflect)(ctx, class, member)
    }

    /// # Safety
    /// Calls into native code.
    pub unsafe fn rsis_metadata(&self) -> *const c_char {
        (self.api.metadata)()
    }
}

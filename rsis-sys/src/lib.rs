#![doc=include_str!( "../README.md")]
#![deny(clippy::all)]
#![allow(non_camel_case_types)]

use std::{ffi::c_void, path::PathBuf};

use libloading::{Library, Symbol};

pub mod model;
pub mod scheduler;

/// Status code returned by native calls. Zero is success, anything else is failure.
pub type rsisStatus = i32;

pub const RSIS_OK: rsisStatus = 0;

/// A borrowed UTF-8 buffer handed out by the native side: pointer plus byte length.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct rsisUtf8 {
    pub ptr: *const u8,
    pub len: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Error opening {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("Missing symbol '{symbol}': {source}")]
    MissingSymbol {
        symbol: &'static str,
        #[source]
        source: libloading::Error,
    },

    #[error("Symbol '{0}' resolves to a null address")]
    NullSymbol(&'static str),
}

/// Open a shared library.
///
/// # Safety
/// Loading a library runs its initialisers; the caller vouches for the binary.
pub(crate) unsafe fn open(path: PathBuf) -> Result<Library, Error> {
    log::trace!("dlopen {path:?}");
    Library::new(&path).map_err(|source| Error::Open { path, source })
}

/// Resolve a function symbol, refusing missing or null entries.
///
/// # Safety
/// `F` must be the `extern "C"` function-pointer type the symbol was compiled with.
pub(crate) unsafe fn load_fn<F: Copy>(library: &Library, symbol: &'static str) -> Result<F, Error> {
    debug_assert_eq!(
        std::mem::size_of::<F>(),
        std::mem::size_of::<*const c_void>()
    );
    let raw: Symbol<*const c_void> = library
        .get(symbol.as_bytes())
        .map_err(|source| Error::MissingSymbol { symbol, source })?;
    let raw: *const c_void = *raw;
    if raw.is_null() {
        return Err(Error::NullSymbol(symbol));
    }
    Ok(std::mem::transmute_copy::<*const c_void, F>(&raw))
}

//! In-process stand-ins for native model libraries.
//!
//! `satellite` behaves like a C++ library that publishes its schema through `rsis_metadata`.
//! `gnc` behaves like a Rust library: boxed objects, schema only through reflection.
#![allow(dead_code)]

use std::{
    ffi::{c_char, c_void, CString},
    mem::{offset_of, size_of},
    path::Path,
    ptr,
    sync::OnceLock,
};

use rsis::{
    loader::Linker,
    schema::Manifest,
    sys::model::{rsisClassCallback, rsisMemberCallback, ModelApi, ModelBinding},
    Error,
};
use serde_json::json;

#[repr(C)]
#[derive(Debug, Default)]
pub struct SatInputs {
    pub pos: [f64; 3],
    pub enabled: bool,
}

#[repr(C)]
#[derive(Debug, Default)]
pub struct SatOutputs {
    pub pos: [f64; 3],
    pub thrust: f32,
}

#[repr(C)]
#[derive(Debug, Default)]
pub struct SatData {
    pub mass: f64,
    pub count: i32,
    pub matrix: [[f32; 2]; 2],
    pub label: String,
}

#[repr(C)]
#[derive(Debug, Default)]
pub struct Sat {
    pub inputs: SatInputs,
    pub outputs: SatOutputs,
    pub data: SatData,
}

pub fn sat_schema() -> serde_json::Value {
    json!({
        "top": "Sat",
        "structs": {
            "Sat": {
                "inputs": {"class": "SatInputs", "offset": offset_of!(Sat, inputs)},
                "outputs": {"class": "SatOutputs", "offset": offset_of!(Sat, outputs)},
                "data": {"class": "SatData", "offset": offset_of!(Sat, data)},
            },
            "SatInputs": {
                "pos": {"type": "Float64", "offset": offset_of!(SatInputs, pos), "dims": [3], "unit": "m"},
                "enabled": {"type": "Boolean", "offset": offset_of!(SatInputs, enabled), "dims": []},
            },
            "SatOutputs": {
                "pos": {"type": "Float64", "offset": offset_of!(SatOutputs, pos), "dims": [3], "unit": "m"},
                "thrust": {"type": "Float32", "offset": offset_of!(SatOutputs, thrust), "dims": [], "unit": "N"},
            },
            "SatData": {
                "mass": {"type": "Float64", "offset": offset_of!(SatData, mass), "dims": [], "unit": "kg", "value": 35.6},
                "count": {"type": "Int32", "offset": offset_of!(SatData, count), "dims": []},
                "matrix": {"type": "Float32", "offset": offset_of!(SatData, matrix), "dims": [2, 2]},
                "label": {"type": "String", "offset": offset_of!(SatData, label), "dims": []},
            },
        }
    })
}

unsafe extern "C" fn sat_create() -> *mut c_void {
    Box::into_raw(Box::<Sat>::default()) as *mut c_void
}

unsafe extern "C" fn sat_metadata() -> *const c_char {
    static DOCUMENT: OnceLock<CString> = OnceLock::new();
    DOCUMENT
        .get_or_init(|| CString::new(sat_schema().to_string()).unwrap())
        .as_ptr()
}

unsafe extern "C" fn no_reflect(_: *mut c_void, _: rsisClassCallback, _: rsisMemberCallback) {}

pub const SATELLITE: ModelApi = ModelApi {
    create_model: sat_create,
    reflect: no_reflect,
    metadata: sat_metadata,
};

#[repr(C)]
#[derive(Debug, Default)]
pub struct GncInputs {
    pub pos: [f64; 3],
}

#[repr(C)]
#[derive(Debug, Default)]
pub struct GncOutputs {
    pub thrust: f32,
    pub column: [[f64; 1]; 3],
}

#[repr(C)]
#[derive(Debug, Default)]
pub struct Gnc {
    pub inputs: GncInputs,
    pub outputs: GncOutputs,
    pub gain: f64,
}

unsafe extern "C" fn gnc_create() -> *mut c_void {
    Box::into_raw(Box::new(Box::<Gnc>::default())) as *mut c_void
}

unsafe extern "C" fn gnc_reflect(
    ctx: *mut c_void,
    class: rsisClassCallback,
    member: rsisMemberCallback,
) {
    let three = [3usize];
    let column = [3usize, 1];
    class(ctx, c"GncInputs".as_ptr(), size_of::<GncInputs>());
    member(
        ctx,
        c"GncInputs".as_ptr(),
        c"pos".as_ptr(),
        c"f64".as_ptr(),
        offset_of!(GncInputs, pos),
        three.as_ptr(),
        1,
    );
    class(ctx, c"GncOutputs".as_ptr(), size_of::<GncOutputs>());
    member(
        ctx,
        c"GncOutputs".as_ptr(),
        c"thrust".as_ptr(),
        c"f32".as_ptr(),
        offset_of!(GncOutputs, thrust),
        ptr::null(),
        0,
    );
    member(
        ctx,
        c"GncOutputs".as_ptr(),
        c"column".as_ptr(),
        c"f64".as_ptr(),
        offset_of!(GncOutputs, column),
        column.as_ptr(),
        2,
    );
    class(ctx, c"Gnc".as_ptr(), size_of::<Gnc>());
    member(
        ctx,
        c"Gnc".as_ptr(),
        c"inputs".as_ptr(),
        c"GncInputs".as_ptr(),
        offset_of!(Gnc, inputs),
        ptr::null(),
        0,
    );
    member(
        ctx,
        c"Gnc".as_ptr(),
        c"outputs".as_ptr(),
        c"GncOutputs".as_ptr(),
        offset_of!(Gnc, outputs),
        ptr::null(),
        0,
    );
    member(
        ctx,
        c"Gnc".as_ptr(),
        c"gain".as_ptr(),
        c"f64".as_ptr(),
        offset_of!(Gnc, gain),
        ptr::null(),
        0,
    );
}

unsafe extern "C" fn no_metadata() -> *const c_char {
    ptr::null()
}

pub const GNC: ModelApi = ModelApi {
    create_model: gnc_create,
    reflect: gnc_reflect,
    metadata: no_metadata,
};

/// Resolves manifests to the in-process call tables above by library name.
pub struct StaticLinker;

impl Linker for StaticLinker {
    fn link(&self, manifest: &Manifest, _binary: &Path) -> Result<ModelBinding, Error> {
        match manifest.rsis.name.as_str() {
            "satellite" => Ok(ModelBinding::from_api(SATELLITE)),
            "gnc" => Ok(ModelBinding::from_api(GNC)),
            other => Err(Error::LibraryNotFound {
                name: other.to_owned(),
                profile: None,
            }),
        }
    }
}

pub fn write_manifest(dir: &Path, library: &str, profile: &str, language: &str, extra: &str) {
    let text = format!(
        "[rsis]\nname = \"{library}\"\nlanguage = \"{language}\"\nversion = \"{}\"\n\n[binary]\nfile = \"lib{library}.so\"\n{extra}",
        env!("CARGO_PKG_VERSION")
    );
    std::fs::write(dir.join(format!("{library}.{profile}.rsis.toml")), text).unwrap();
}

/// A directory with manifests for both stand-in libraries.
pub fn library_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path(), "satellite", "release", "cpp", "");
    write_manifest(dir.path(), "gnc", "debug", "rust", "");
    dir
}

/// The Rust object behind a model pointer from `satellite`
pub unsafe fn sat<'a>(object: ptr::NonNull<c_void>) -> &'a Sat {
    &*(object.as_ptr() as *const Sat)
}

/// The Rust object behind a model pointer from `gnc`
pub unsafe fn gnc<'a>(object: ptr::NonNull<c_void>) -> &'a Gnc {
    &**(object.as_ptr() as *const Box<Gnc>)
}

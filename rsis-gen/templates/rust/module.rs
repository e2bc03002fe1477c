//! Generated by rsis-gen {{version}} from interface '{{model}}'. Do not edit.
#![allow(clippy::all, non_camel_case_types, non_snake_case)]

use std::{
    ffi::{c_char, c_void},
    mem::{offset_of, size_of},
};

pub type RsisClassCallback =
    unsafe extern "C" fn(ctx: *mut c_void, name: *const c_char, size: usize);
pub type RsisMemberCallback = unsafe extern "C" fn(
    ctx: *mut c_void,
    class: *const c_char,
    name: *const c_char,
    type_tag: *const c_char,
    offset: usize,
    dims: *const usize,
    ndims: usize,
);

{{structs}}
{{reflect_functions}}
/// # Safety
///
/// `on_class` and `on_member` must be callable for the duration of the call.
#[no_mangle]
pub unsafe extern "C" fn rsis_reflect(
    ctx: *mut c_void,
    on_class: RsisClassCallback,
    on_member: RsisMemberCallback,
) {
{{reflect_calls}}
}

/// Model objects are handed out boxed: the returned pointer addresses a `Box<{{model}}>`.
#[no_mangle]
pub extern "C" fn rsis_create_model() -> *mut c_void {
    Box::into_raw(Box::new(Box::new({{model}}::default()))) as *mut c_void
}

#[no_mangle]
pub extern "C" fn rsis_metadata() -> *const c_char {
    std::ptr::null()
}

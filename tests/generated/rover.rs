//! Generated by rsis-gen 0.1.0 from interface 'Rover'. Do not edit.
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

#[repr(C)]
#[derive(Debug, Clone, PartialEq)]
pub struct RoverInputs {
    /// [m]
    pub pos: [f64; 3],
    pub enabled: bool,
}

impl Default for RoverInputs {
    fn default() -> Self {
        Self {
            pos: [0.0, 0.0, 0.0],
            enabled: false,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, PartialEq)]
pub struct RoverData {
    /// [kg]
    pub mass: f64,
    pub count: i32,
    pub matrix: [[f32; 2]; 2],
    pub r#type: u8,
    pub label: String,
}

impl Default for RoverData {
    fn default() -> Self {
        Self {
            mass: 35.6,
            count: 0,
            matrix: [[1.0, 2.0], [3.0, 4.0]],
            r#type: 7,
            label: String::from("r-1"),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, PartialEq)]
pub struct Wheel {
    /// angular rate [rad/s]
    pub speed: f32,
}

impl Default for Wheel {
    fn default() -> Self {
        Self {
            speed: 0.0,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, PartialEq)]
pub struct Rover {
    pub inputs: RoverInputs,
    pub data: RoverData,
    /// wheel states
    pub wheels: [Wheel; 4],
}

impl Default for Rover {
    fn default() -> Self {
        Self {
            inputs: RoverInputs::default(),
            data: RoverData::default(),
            wheels: std::array::from_fn(|_| Wheel::default()),
        }
    }
}

unsafe fn rsis_reflect_rover_inputs(
    ctx: *mut c_void,
    on_class: RsisClassCallback,
    on_member: RsisMemberCallback,
) {
    on_class(ctx, c"RoverInputs".as_ptr(), size_of::<RoverInputs>());
    on_member(ctx, c"RoverInputs".as_ptr(), c"pos".as_ptr(), c"f64".as_ptr(), offset_of!(RoverInputs, pos), [3usize].as_ptr(), 1);
    on_member(ctx, c"RoverInputs".as_ptr(), c"enabled".as_ptr(), c"bool".as_ptr(), offset_of!(RoverInputs, enabled), std::ptr::null(), 0);
}

unsafe fn rsis_reflect_rover_data(
    ctx: *mut c_void,
    on_class: RsisClassCallback,
    on_member: RsisMemberCallback,
) {
    on_class(ctx, c"RoverData".as_ptr(), size_of::<RoverData>());
    on_member(ctx, c"RoverData".as_ptr(), c"mass".as_ptr(), c"f64".as_ptr(), offset_of!(RoverData, mass), std::ptr::null(), 0);
    on_member(ctx, c"RoverData".as_ptr(), c"count".as_ptr(), c"i32".as_ptr(), offset_of!(RoverData, count), std::ptr::null(), 0);
    on_member(ctx, c"RoverData".as_ptr(), c"matrix".as_ptr(), c"f32".as_ptr(), offset_of!(RoverData, matrix), [2usize, 2usize].as_ptr(), 2);
    on_member(ctx, c"RoverData".as_ptr(), c"type".as_ptr(), c"u8".as_ptr(), offset_of!(RoverData, r#type), std::ptr::null(), 0);
    on_member(ctx, c"RoverData".as_ptr(), c"label".as_ptr(), c"String".as_ptr(), offset_of!(RoverData, label), std::ptr::null(), 0);
}

unsafe fn rsis_reflect_wheel(
    ctx: *mut c_void,
    on_class: RsisClassCallback,
    on_member: RsisMemberCallback,
) {
    on_class(ctx, c"Wheel".as_ptr(), size_of::<Wheel>());
    on_member(ctx, c"Wheel".as_ptr(), c"speed".as_ptr(), c"f32".as_ptr(), offset_of!(Wheel, speed), std::ptr::null(), 0);
}

unsafe fn rsis_reflect_rover(
    ctx: *mut c_void,
    on_class: RsisClassCallback,
    on_member: RsisMemberCallback,
) {
    on_class(ctx, c"Rover".as_ptr(), size_of::<Rover>());
    on_member(ctx, c"Rover".as_ptr(), c"inputs".as_ptr(), c"RoverInputs".as_ptr(), offset_of!(Rover, inputs), std::ptr::null(), 0);
    on_member(ctx, c"Rover".as_ptr(), c"data".as_ptr(), c"RoverData".as_ptr(), offset_of!(Rover, data), std::ptr::null(), 0);
    on_member(ctx, c"Rover".as_ptr(), c"wheels".as_ptr(), c"Wheel".as_ptr(), offset_of!(Rover, wheels), [4usize].as_ptr(), 1);
}

/// # Safety
///
/// `on_class` and `on_member` must be callable for the duration of the call.
#[no_mangle]
pub unsafe extern "C" fn rsis_reflect(
    ctx: *mut c_void,
    on_class: RsisClassCallback,
    on_member: RsisMemberCallback,
) {
    rsis_reflect_rover_inputs(ctx, on_class, on_member);
    rsis_reflect_rover_data(ctx, on_class, on_member);
    rsis_reflect_wheel(ctx, on_class, on_member);
    rsis_reflect_rover(ctx, on_class, on_member);
}

/// Model objects are handed out boxed: the returned pointer addresses a `Box<Rover>`.
#[no_mangle]
pub extern "C" fn rsis_create_model() -> *mut c_void {
    Box::into_raw(Box::new(Box::new(Rover::default()))) as *mut c_void
}

#[no_mangle]
pub extern "C" fn rsis_metadata() -> *const c_char {
    std::ptr::null()
}

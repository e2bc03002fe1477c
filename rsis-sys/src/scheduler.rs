//! Call table of the scheduler runtime.

use std::{
    ffi::{c_char, c_void},
    path::PathBuf,
};

use libloading::Library;

use crate::{load_fn, open, rsisStatus, rsisUtf8, Error};

pub type rsisSchedulerState = i32;

pub const RSIS_STATE_CONFIG: rsisSchedulerState = 0;
pub const RSIS_STATE_INITIALIZING: rsisSchedulerState = 1;
pub const RSIS_STATE_INITIALIZED: rsisSchedulerState = 2;
pub const RSIS_STATE_RUNNING: rsisSchedulerState = 3;
pub const RSIS_STATE_PAUSED: rsisSchedulerState = 4;
pub const RSIS_STATE_ENDING: rsisSchedulerState = 5;
pub const RSIS_STATE_ENDED: rsisSchedulerState = 6;
pub const RSIS_STATE_ERRORED: rsisSchedulerState = 7;

pub type rsisVoidStatus = unsafe extern "C" fn() -> rsisStatus;
pub type rsisRegisterThread = unsafe extern "C" fn(frequency: f64) -> rsisStatus;
/// Returns the (possibly relocated) object pointer, or null on failure.
pub type rsisRegisterModel = unsafe extern "C" fn(
    thread_id: u32,
    object: *mut c_void,
    divisor: u32,
    offset: u32,
) -> *mut c_void;
pub type rsisStepScheduler = unsafe extern "C" fn(steps: u64) -> rsisStatus;
pub type rsisGetSchedulerState = unsafe extern "C" fn() -> rsisSchedulerState;
pub type rsisGetMessage = unsafe extern "C" fn() -> *const c_char;
pub type rsisGetUtf8 = unsafe extern "C" fn(object: *const c_void) -> rsisUtf8;
pub type rsisSetUtf8 =
    unsafe extern "C" fn(object: *mut c_void, ptr: *const u8, len: usize) -> rsisStatus;

#[derive(Debug, Clone, Copy)]
pub struct SchedulerApi {
    pub initialize: rsisVoidStatus,
    pub shutdown: rsisVoidStatus,
    pub register_thread: rsisRegisterThread,
    pub register_model: rsisRegisterModel,
    pub init_scheduler: rsisVoidStatus,
    pub step_scheduler: rsisStepScheduler,
    pub pause_scheduler: rsisVoidStatus,
    pub run_scheduler: rsisVoidStatus,
    pub end_scheduler: rsisVoidStatus,
    pub get_scheduler_state: rsisGetSchedulerState,
    /// Places the scheduler's name in the message buffer
    pub get_scheduler_name: rsisVoidStatus,
    /// Text of the last diagnostic (or of the last name query)
    pub get_message: rsisGetMessage,
    pub get_utf8: rsisGetUtf8,
    pub set_utf8: rsisSetUtf8,
}

/// A resolved scheduler call table, keeping its library resident.
pub struct SchedulerBinding {
    api: SchedulerApi,
    library: Option<Library>,
}

impl std::fmt::Debug for SchedulerBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulerBinding")
            .field("dynamic", &self.library.is_some())
            .finish_non_exhaustive()
    }
}

impl SchedulerBinding {
    /// Open the scheduler runtime at `path` and resolve its call table.
    ///
    /// # Safety
    /// The library's initialisers run, and its symbols must have the signatures declared here.
    pub unsafe fn new(path: impl Into<PathBuf>) -> Result<Self, Error> {
        Self::from_library(open(path.into())?)
    }

    /// # Safety
    /// The library's symbols must have the signatures declared here.
    pub unsafe fn from_library(library: Library) -> Result<Self, Error> {
        let api = SchedulerApi {
            initialize: load_fn(&library, "rsis_initialize")?,
            shutdown: load_fn(&library, "rsis_shutdown")?,
            register_thread: load_fn(&library, "rsis_register_thread")?,
            register_model: load_fn(&library, "rsis_register_model")?,
            init_scheduler: load_fn(&library, "rsis_init_scheduler")?,
            step_scheduler: load_fn(&library, "rsis_step_scheduler")?,
            pause_scheduler: load_fn(&library, "rsis_pause_scheduler")?,
            run_scheduler: load_fn(&library, "rsis_run_scheduler")?,
            end_scheduler: load_fn(&library, "rsis_end_scheduler")?,
            get_scheduler_state: load_fn(&library, "rsis_get_scheduler_state")?,
            get_scheduler_name: load_fn(&library, "rsis_get_scheduler_name")?,
            get_message: load_fn(&library, "rsis_get_message")?,
            get_utf8: load_fn(&library, "rsis_get_utf8")?,
            set_utf8: load_fn(&library, "rsis_set_utf8")?,
        };
        Ok(Self {
            api,
            library: Some(library),
        })
    }

    /// Wrap a table of functions that are linked into the current process.
    pub fn from_api(api: SchedulerApi) -> Self {
        Self { api, library: None }
    }

    pub fn api(&self) -> &SchedulerApi {
        &self.api
    }
}

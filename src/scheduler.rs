//! Safe facade over the scheduler runtime.

use std::{ffi::CStr, fmt::Display, path::PathBuf, ptr::NonNull};

use rsis_sys::{
    rsisStatus,
    scheduler::{self as sys, SchedulerBinding},
    RSIS_OK,
};

use crate::{model::ModelInstance, signal::Utf8Access, Error};

/// Lifecycle state reported by the scheduler runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Config,
    Initializing,
    Initialized,
    Running,
    Paused,
    Ending,
    Ended,
    Errored,
}

impl TryFrom<sys::rsisSchedulerState> for SchedulerState {
    type Error = Error;

    fn try_from(state: sys::rsisSchedulerState) -> Result<Self, Self::Error> {
        Ok(match state {
            sys::RSIS_STATE_CONFIG => Self::Config,
            sys::RSIS_STATE_INITIALIZING => Self::Initializing,
            sys::RSIS_STATE_INITIALIZED => Self::Initialized,
            sys::RSIS_STATE_RUNNING => Self::Running,
            sys::RSIS_STATE_PAUSED => Self::Paused,
            sys::RSIS_STATE_ENDING => Self::Ending,
            sys::RSIS_STATE_ENDED => Self::Ended,
            sys::RSIS_STATE_ERRORED => Self::Errored,
            other => {
                return Err(Error::NativeCall {
                    call: "rsis_get_scheduler_state",
                    message: format!("unknown state {other}"),
                })
            }
        })
    }
}

impl Display for SchedulerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// The scheduler runtime. It is initialised on construction and shut down on drop.
#[derive(Debug)]
pub struct Scheduler {
    binding: SchedulerBinding,
}

impl Scheduler {
    /// Link the scheduler runtime at `path` and initialise it.
    ///
    /// # Safety
    /// The library's initialisers run, and it must export the scheduler symbols with their
    /// declared signatures.
    pub unsafe fn open(path: impl Into<PathBuf>) -> Result<Self, Error> {
        Self::new(SchedulerBinding::new(path)?)
    }

    pub fn new(binding: SchedulerBinding) -> Result<Self, Error> {
        // SAFETY: every call-table entry was resolved and null-checked.
        let status = unsafe { (binding.api().initialize)() };
        if status != RSIS_OK {
            return Err(Error::NativeCall {
                call: "rsis_initialize",
                message: message(&binding),
            });
        }
        log::debug!("Scheduler runtime initialised");
        Ok(Self { binding })
    }

    /// Text of the runtime's last diagnostic
    pub fn last_message(&self) -> String {
        message(&self.binding)
    }

    fn check(&self, call: &'static str, status: rsisStatus) -> Result<(), Error> {
        if status == RSIS_OK {
            Ok(())
        } else {
            Err(Error::NativeCall {
                call,
                message: self.last_message(),
            })
        }
    }

    pub fn name(&self) -> Result<String, Error> {
        let status = unsafe { (self.binding.api().get_scheduler_name)() };
        self.check("rsis_get_scheduler_name", status)?;
        Ok(self.last_message())
    }

    /// Add a thread running at `frequency` Hz.
    pub fn register_thread(&mut self, frequency: f64) -> Result<(), Error> {
        let status = unsafe { (self.binding.api().register_thread)(frequency) };
        self.check("rsis_register_thread", status)
    }

    /// Schedule `model` on a thread, adopting the object pointer the runtime hands back.
    ///
    /// On failure the model keeps its previous pointer.
    pub fn register_model(
        &mut self,
        model: &mut ModelInstance,
        thread: u32,
        divisor: u32,
        offset: u32,
    ) -> Result<(), Error> {
        // SAFETY: the object was created by a loaded library and is still alive.
        let object = unsafe {
            (self.binding.api().register_model)(thread, model.object().as_ptr(), divisor, offset)
        };
        let object = NonNull::new(object).ok_or_else(|| Error::NativeCall {
            call: "rsis_register_model",
            message: self.last_message(),
        })?;
        model.relocate(object);
        log::debug!(
            "Model '{}' scheduled on thread {thread} (divisor {divisor}, offset {offset})",
            model.name()
        );
        Ok(())
    }

    pub fn init(&mut self) -> Result<(), Error> {
        let status = unsafe { (self.binding.api().init_scheduler)() };
        self.check("rsis_init_scheduler", status)
    }

    pub fn step(&mut self, steps: u64) -> Result<(), Error> {
        let status = unsafe { (self.binding.api().step_scheduler)(steps) };
        self.check("rsis_step_scheduler", status)
    }

    pub fn pause(&mut self) -> Result<(), Error> {
        let status = unsafe { (self.binding.api().pause_scheduler)() };
        self.check("rsis_pause_scheduler", status)
    }

    pub fn run(&mut self) -> Result<(), Error> {
        let status = unsafe { (self.binding.api().run_scheduler)() };
        self.check("rsis_run_scheduler", status)
    }

    pub fn end(&mut self) -> Result<(), Error> {
        let status = unsafe { (self.binding.api().end_scheduler)() };
        self.check("rsis_end_scheduler", status)
    }

    pub fn state(&self) -> Result<SchedulerState, Error> {
        let state = unsafe { (self.binding.api().get_scheduler_state)() };
        SchedulerState::try_from(state)
    }
}

fn message(binding: &SchedulerBinding) -> String {
    // SAFETY: the returned string is owned by the runtime and valid until its next call.
    unsafe {
        let message = (binding.api().get_message)();
        if message.is_null() {
            return String::new();
        }
        CStr::from_ptr(message).to_string_lossy().into_owned()
    }
}

impl Utf8Access for Scheduler {
    unsafe fn get_utf8(&self, object: NonNull<u8>) -> Result<String, Error> {
        let buffer = (self.binding.api().get_utf8)(object.as_ptr() as *const _);
        if buffer.ptr.is_null() {
            if buffer.len == 0 {
                return Ok(String::new());
            }
            return Err(Error::NativeCall {
                call: "rsis_get_utf8",
                message: self.last_message(),
            });
        }
        let bytes = std::slice::from_raw_parts(buffer.ptr, buffer.len);
        Ok(std::str::from_utf8(bytes)?.to_owned())
    }

    unsafe fn set_utf8(&self, object: NonNull<u8>, value: &str) -> Result<(), Error> {
        let status = (self.binding.api().set_utf8)(object.as_ptr() as *mut _, value.as_ptr(), value.len());
        self.check("rsis_set_utf8", status)
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        let status = unsafe { (self.binding.api().shutdown)() };
        match self.check("rsis_shutdown", status) {
            Ok(()) => log::debug!("Scheduler runtime shut down"),
            Err(e) => log::error!("{e}"),
        }
    }
}

//! Outermost host boundary for native faults.
//!
//! # Responsibility
//! - Turn a panic escaping the host run into a `HostFault` carrying a fault
//!   code and a readable name.
//! - Stop the process after the fault is logged; continuing is unsafe.

use crate::logging::sanitize_message;
use std::any::Any;
use std::fmt::{Display, Formatter};
use std::panic::{catch_unwind, UnwindSafe};

/// Exit status Rust uses for panics, reused as the panic fault code.
pub const PANIC_FAULT_CODE: u32 = 101;
const PANIC_FAULT_NAME: &str = "RUST_PANIC";
const MAX_FAULT_MESSAGE_CHARS: usize = 256;

/// Fault translated from a native runtime failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFault {
    pub code: u32,
    pub name: &'static str,
    pub message: String,
}

impl HostFault {
    fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self {
            code: PANIC_FAULT_CODE,
            name: PANIC_FAULT_NAME,
            message: sanitize_message(&message, MAX_FAULT_MESSAGE_CHARS),
        }
    }
}

impl Display for HostFault {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({:#x}): {}", self.name, self.code, self.message)
    }
}

impl std::error::Error for HostFault {}

/// Runs `body`, translating an escaping panic into a [`HostFault`].
pub fn guard<T>(body: impl FnOnce() -> T + UnwindSafe) -> Result<T, HostFault> {
    catch_unwind(body).map_err(HostFault::from_panic)
}

/// Hands control to an attached debugger, or terminates the process.
pub fn debug_break() -> ! {
    std::process::abort()
}

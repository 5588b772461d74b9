//! Native host for the Rostrum scripting runtime.
//! Owns the interpreter state, the extension registry and the logging stack.

pub mod config;
pub mod error;
pub mod fault;
pub mod interp;
pub mod logging;
pub mod registry;
pub mod script;
pub mod system;

pub use config::{HostConfig, LoggingConfig};
pub use error::{HostError, HostResult};
pub use fault::{debug_break, guard, HostFault};
pub use interp::{initialize_interpreter_state, new_state};
pub use logging::{init_logging, logging_status, shutdown_logging, LogLevel};
pub use registry::{Manager, RescanReport, SharedManager};
pub use script::{fingerprint, load_fingerprinted, FingerprintedScript};

/// Returns the host crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// ABI version this host accepts from extension modules.
pub fn host_api_version() -> rostrum_api::Version {
    rostrum_api::ROSTRUM_API_VERSION
}

//! Host configuration and fixed layout constants.

use crate::logging::LogLevel;
use std::path::PathBuf;

/// File extension of loadable extension modules.
pub const MODULE_EXTENSION: &str = "rmod";
/// File extension of plain Lua C modules reachable through `package.cpath`.
pub const LUA_MODULE_EXTENSION: &str = "lmod";
/// Prefix marking a `require` request for a host-provided namespace.
pub const NAMESPACE_SENTINEL: char = ':';
/// Namespace name of the built-in core capability table.
pub const CORE_NAMESPACE: &str = "core";
/// Capacity of the primary logger's record queue.
pub const DEFAULT_LOG_QUEUE_CAPACITY: usize = 8192;

/// Settings for the logging subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Initial level of the primary logger.
    pub level: LogLevel,
    /// Threshold of the synchronous diagnostic logger.
    pub diagnostic_level: LogLevel,
    pub queue_capacity: usize,
    /// Echo primary records to stdout in addition to the log file.
    pub console: bool,
    /// Directory for the temporary log file; the OS temp dir when `None`.
    pub temp_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Trace,
            diagnostic_level: LogLevel::Info,
            queue_capacity: DEFAULT_LOG_QUEUE_CAPACITY,
            console: true,
            temp_dir: None,
        }
    }
}

/// Settings for one host run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    pub modules_dir: PathBuf,
    pub logging: LoggingConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            modules_dir: default_modules_dir(),
            logging: LoggingConfig::default(),
        }
    }
}

/// `<exe dir>/../modules`, falling back to `./modules`.
pub fn default_modules_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent()?.parent().map(|root| root.join("modules")))
        .unwrap_or_else(|| PathBuf::from("modules"))
}

#[cfg(test)]
mod tests {
    use super::{default_modules_dir, HostConfig, LoggingConfig};
    use crate::logging::LogLevel;

    #[test]
    fn default_modules_dir_ends_with_modules() {
        assert!(default_modules_dir().ends_with("modules"));
    }

    #[test]
    fn default_logging_traces_everything_into_queue() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, LogLevel::Trace);
        assert_eq!(config.queue_capacity, 8192);
        assert_eq!(HostConfig::default().logging, config);
    }
}

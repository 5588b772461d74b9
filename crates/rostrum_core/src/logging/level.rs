//! Script-facing log level names.

use super::{CRITICAL_TARGET, HOST_FATAL_TARGET};
use crate::error::HostError;
use log::{Level, LevelFilter, Record};

/// Severity accepted by `set_log_level` and the logging entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Err,
    Critical,
}

pub const LOG_LEVEL_TRACE: &str = "trace";
pub const LOG_LEVEL_DEBUG: &str = "debug";
pub const LOG_LEVEL_INFO: &str = "info";
pub const LOG_LEVEL_WARN: &str = "warn";
pub const LOG_LEVEL_ERR: &str = "err";
pub const LOG_LEVEL_CRITICAL: &str = "critical";

const SUPPORTED_LOG_LEVEL_STRINGS: &[&str] = &[
    LOG_LEVEL_TRACE,
    LOG_LEVEL_DEBUG,
    LOG_LEVEL_INFO,
    LOG_LEVEL_WARN,
    LOG_LEVEL_ERR,
    LOG_LEVEL_CRITICAL,
];

/// Returns the accepted level names in ascending severity.
pub fn supported_log_level_strings() -> &'static [&'static str] {
    SUPPORTED_LOG_LEVEL_STRINGS
}

impl LogLevel {
    /// Parses an exact, case-sensitive level name.
    pub fn parse(value: &str) -> Result<Self, HostError> {
        match value {
            LOG_LEVEL_TRACE => Ok(Self::Trace),
            LOG_LEVEL_DEBUG => Ok(Self::Debug),
            LOG_LEVEL_INFO => Ok(Self::Info),
            LOG_LEVEL_WARN => Ok(Self::Warn),
            LOG_LEVEL_ERR => Ok(Self::Err),
            LOG_LEVEL_CRITICAL => Ok(Self::Critical),
            other => Err(HostError::UnsupportedLogLevel(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => LOG_LEVEL_TRACE,
            Self::Debug => LOG_LEVEL_DEBUG,
            Self::Info => LOG_LEVEL_INFO,
            Self::Warn => LOG_LEVEL_WARN,
            Self::Err => LOG_LEVEL_ERR,
            Self::Critical => LOG_LEVEL_CRITICAL,
        }
    }

    /// `log` record level carrying this severity.
    ///
    /// `log` tops out at `Error`; critical records are error records sent to
    /// a critical target (see [`LogLevel::of_record`]).
    pub fn record_level(self) -> Level {
        match self {
            Self::Trace => Level::Trace,
            Self::Debug => Level::Debug,
            Self::Info => Level::Info,
            Self::Warn => Level::Warn,
            Self::Err | Self::Critical => Level::Error,
        }
    }

    /// Coarse `log` filter; `Err` and `Critical` both map to `Error`.
    pub fn level_filter(self) -> LevelFilter {
        self.record_level().to_level_filter()
    }

    /// Severity of an emitted record. Records on [`CRITICAL_TARGET`] or
    /// [`HOST_FATAL_TARGET`] are critical; others follow their `log` level.
    pub fn of_record(record: &Record) -> Self {
        if matches!(record.target(), CRITICAL_TARGET | HOST_FATAL_TARGET) {
            return Self::Critical;
        }
        match record.level() {
            Level::Trace => Self::Trace,
            Level::Debug => Self::Debug,
            Level::Info => Self::Info,
            Level::Warn => Self::Warn,
            Level::Error => Self::Err,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{supported_log_level_strings, LogLevel};
    use crate::error::HostError;
    use crate::logging::CRITICAL_TARGET;
    use log::{Level, LevelFilter, Record};

    #[test]
    fn parses_every_supported_level() {
        for name in supported_log_level_strings() {
            let level = LogLevel::parse(name).expect("supported level");
            assert_eq!(level.as_str(), *name);
        }
    }

    #[test]
    fn rejects_unknown_and_differently_cased_levels() {
        for name in ["off", "INFO", "Warn", "error", "warning", ""] {
            let err = LogLevel::parse(name).expect_err("level must be rejected");
            assert!(matches!(err, HostError::UnsupportedLogLevel(ref value) if value == name));
            assert!(err.to_string().contains(name));
        }
    }

    #[test]
    fn critical_shares_the_error_filter() {
        assert_eq!(LogLevel::Err.level_filter(), LevelFilter::Error);
        assert_eq!(LogLevel::Critical.level_filter(), LevelFilter::Error);
        assert_eq!(LogLevel::Trace.level_filter(), LevelFilter::Trace);
    }

    #[test]
    fn record_severity_separates_err_from_critical() {
        let plain = Record::builder()
            .level(Level::Error)
            .target("rostrum_core::registry")
            .args(format_args!("plain"))
            .build();
        assert_eq!(LogLevel::of_record(&plain), LogLevel::Err);

        let critical = Record::builder()
            .level(Level::Error)
            .target(CRITICAL_TARGET)
            .args(format_args!("critical"))
            .build();
        assert_eq!(LogLevel::of_record(&critical), LogLevel::Critical);
        assert!(LogLevel::of_record(&critical) > LogLevel::of_record(&plain));
    }
}

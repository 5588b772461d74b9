//! Host error taxonomy.
//!
//! # Responsibility
//! - Classify host failures into script, lookup, load and I/O errors.
//! - Convert lookup errors into interpreter-visible Lua errors.
//!
//! # Invariants
//! - `Display` output of lookup errors is the exact message scripts observe.

use crate::registry::ModuleLoadError;
use mlua::ExternalError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub type HostResult<T> = Result<T, HostError>;

#[derive(Debug)]
pub enum HostError {
    /// Syntax or runtime fault raised by the interpreter.
    Script(mlua::Error),
    ModuleNotFound(String),
    ModuleLoad(ModuleLoadError),
    UnsupportedLogLevel(String),
    UnsupportedLibGroup(String),
    ScriptNotFound(PathBuf),
    LoggingNotInitialized,
    LogReroute {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl HostError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error originated inside script code.
    pub fn is_script_error(&self) -> bool {
        matches!(self, Self::Script(_))
    }
}

impl Display for HostError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Script(err) => write!(f, "{err}"),
            Self::ModuleNotFound(name) => write!(f, "module {name} not found"),
            Self::ModuleLoad(err) => write!(f, "{err}"),
            Self::UnsupportedLogLevel(level) => {
                write!(f, "unsupported log level specified: {level}")
            }
            Self::UnsupportedLibGroup(group) => {
                write!(f, "unsupported library group specified: {group}")
            }
            Self::ScriptNotFound(path) => write!(f, "{} not found", path.display()),
            Self::LoggingNotInitialized => write!(f, "logging is not initialized"),
            Self::LogReroute { from, to, source } => write!(
                f,
                "cannot rename temp file for logger sink from `{}` to `{}`: {source}",
                from.display(),
                to.display()
            ),
            Self::Io { path, source } => write!(f, "i/o error at `{}`: {source}", path.display()),
        }
    }
}

impl Error for HostError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Script(err) => Some(err),
            Self::ModuleLoad(err) => Some(err),
            Self::LogReroute { source, .. } | Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<mlua::Error> for HostError {
    fn from(value: mlua::Error) -> Self {
        Self::Script(value)
    }
}

impl From<ModuleLoadError> for HostError {
    fn from(value: ModuleLoadError) -> Self {
        Self::ModuleLoad(value)
    }
}

impl From<HostError> for mlua::Error {
    fn from(value: HostError) -> Self {
        match value {
            HostError::Script(err) => err,
            other => other.into_lua_err(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::HostError;
    use std::path::PathBuf;

    #[test]
    fn lookup_errors_render_script_facing_messages() {
        assert_eq!(
            HostError::ModuleNotFound("forecast".to_string()).to_string(),
            "module forecast not found"
        );
        assert_eq!(
            HostError::UnsupportedLogLevel("off".to_string()).to_string(),
            "unsupported log level specified: off"
        );
        assert_eq!(
            HostError::ScriptNotFound(PathBuf::from("missing.lua")).to_string(),
            "missing.lua not found"
        );
    }

    #[test]
    fn lua_conversion_keeps_message() {
        let err: mlua::Error = HostError::ModuleNotFound("forecast".to_string()).into();
        assert!(err.to_string().contains("module forecast not found"));
    }
}

//! Module descriptor decoding, validation and ABI negotiation.

use rostrum_api::{ModuleInfo, Version, ROSTRUM_API_VERSION};
use std::error::Error;
use std::ffi::c_char;
use std::fmt::{Display, Formatter};

/// Immutable metadata a module reports at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    pub api_version: Version,
    /// Namespace name scripts use after the `:` sentinel.
    pub name: String,
    pub description: String,
    pub module_version: Version,
}

impl ModuleDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        module_version: Version,
    ) -> Self {
        Self {
            api_version: ROSTRUM_API_VERSION,
            name: name.into(),
            description: description.into(),
            module_version,
        }
    }

    /// Decodes the fixed-layout buffers of a queried [`ModuleInfo`].
    pub fn from_raw(info: &ModuleInfo) -> Result<Self, DescriptorError> {
        let descriptor = Self {
            api_version: info.api_version,
            name: decode_fixed(&info.name, "name")?,
            description: decode_fixed(&info.description, "description")?,
            module_version: info.module_version,
        };
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Any non-empty name is addressable as `:<name>`.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        if self.name.is_empty() {
            return Err(DescriptorError::EmptyName);
        }
        Ok(())
    }

    /// Checks the module's ABI version against what `host` implements.
    ///
    /// Majors must match; a module may not require a newer minor than the
    /// host provides.
    pub fn negotiate(&self, host: Version) -> Result<(), DescriptorError> {
        let module = self.api_version;
        if module.major != host.major || module.minor > host.minor {
            return Err(DescriptorError::AbiMismatch {
                expected: host,
                actual: module,
            });
        }
        Ok(())
    }
}

fn decode_fixed(buffer: &[c_char], field: &'static str) -> Result<String, DescriptorError> {
    let bytes: Vec<u8> = buffer.iter().map(|&c| c as u8).collect();
    let Some(end) = bytes.iter().position(|&b| b == 0) else {
        return Err(DescriptorError::Unterminated(field));
    };
    String::from_utf8(bytes[..end].to_vec()).map_err(|_| DescriptorError::InvalidUtf8(field))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    Unterminated(&'static str),
    InvalidUtf8(&'static str),
    EmptyName,
    MissingImbue,
    AbiMismatch { expected: Version, actual: Version },
}

impl Display for DescriptorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unterminated(field) => {
                write!(f, "descriptor {field} is not NUL-terminated")
            }
            Self::InvalidUtf8(field) => write!(f, "descriptor {field} is not valid UTF-8"),
            Self::EmptyName => write!(f, "descriptor name must not be empty"),
            Self::MissingImbue => write!(f, "descriptor has no imbue entry point"),
            Self::AbiMismatch { expected, actual } => write!(
                f,
                "module api version {actual} is incompatible with host api version {expected}"
            ),
        }
    }
}

impl Error for DescriptorError {}

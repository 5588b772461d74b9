//! Base-interpreter library groups scripts may activate on demand.

use crate::error::HostError;
use mlua::StdLib;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LibGroup {
    Base,
    Package,
    Coroutine,
    String,
    Os,
    Math,
    Table,
    Debug,
    Io,
    Utf8,
}

pub const LIB_GROUP_BASE: &str = "base";
pub const LIB_GROUP_PACKAGE: &str = "package";
pub const LIB_GROUP_COROUTINE: &str = "coroutine";
pub const LIB_GROUP_STRING: &str = "string";
pub const LIB_GROUP_OS: &str = "os";
pub const LIB_GROUP_MATH: &str = "math";
pub const LIB_GROUP_TABLE: &str = "table";
pub const LIB_GROUP_DEBUG: &str = "debug";
pub const LIB_GROUP_IO: &str = "io";
pub const LIB_GROUP_UTF8: &str = "utf8";

const SUPPORTED_LIB_GROUP_STRINGS: &[&str] = &[
    LIB_GROUP_BASE,
    LIB_GROUP_PACKAGE,
    LIB_GROUP_COROUTINE,
    LIB_GROUP_STRING,
    LIB_GROUP_OS,
    LIB_GROUP_MATH,
    LIB_GROUP_TABLE,
    LIB_GROUP_DEBUG,
    LIB_GROUP_IO,
    LIB_GROUP_UTF8,
];

pub fn supported_lib_group_strings() -> &'static [&'static str] {
    SUPPORTED_LIB_GROUP_STRINGS
}

impl LibGroup {
    pub fn parse(value: &str) -> Result<Self, HostError> {
        match value {
            LIB_GROUP_BASE => Ok(Self::Base),
            LIB_GROUP_PACKAGE => Ok(Self::Package),
            LIB_GROUP_COROUTINE => Ok(Self::Coroutine),
            LIB_GROUP_STRING => Ok(Self::String),
            LIB_GROUP_OS => Ok(Self::Os),
            LIB_GROUP_MATH => Ok(Self::Math),
            LIB_GROUP_TABLE => Ok(Self::Table),
            LIB_GROUP_DEBUG => Ok(Self::Debug),
            LIB_GROUP_IO => Ok(Self::Io),
            LIB_GROUP_UTF8 => Ok(Self::Utf8),
            other => Err(HostError::UnsupportedLibGroup(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Base => LIB_GROUP_BASE,
            Self::Package => LIB_GROUP_PACKAGE,
            Self::Coroutine => LIB_GROUP_COROUTINE,
            Self::String => LIB_GROUP_STRING,
            Self::Os => LIB_GROUP_OS,
            Self::Math => LIB_GROUP_MATH,
            Self::Table => LIB_GROUP_TABLE,
            Self::Debug => LIB_GROUP_DEBUG,
            Self::Io => LIB_GROUP_IO,
            Self::Utf8 => LIB_GROUP_UTF8,
        }
    }

    /// Standard library flags to open; the base library is always present.
    pub fn std_lib(self) -> StdLib {
        match self {
            Self::Base => StdLib::NONE,
            Self::Package => StdLib::PACKAGE,
            Self::Coroutine => StdLib::COROUTINE,
            Self::String => StdLib::STRING,
            Self::Os => StdLib::OS,
            Self::Math => StdLib::MATH,
            Self::Table => StdLib::TABLE,
            Self::Debug => StdLib::DEBUG,
            Self::Io => StdLib::IO,
            Self::Utf8 => StdLib::UTF8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{supported_lib_group_strings, LibGroup};
    use crate::error::HostError;

    #[test]
    fn parses_all_supported_groups() {
        for name in supported_lib_group_strings() {
            assert_eq!(LibGroup::parse(name).expect("supported group").as_str(), *name);
        }
    }

    #[test]
    fn rejects_groups_missing_from_lua54() {
        for name in ["jit", "ffi", "bit32", "String"] {
            let err = LibGroup::parse(name).expect_err("group must be rejected");
            assert!(matches!(err, HostError::UnsupportedLibGroup(_)));
        }
    }
}

//! Binary plugin ABI shared by the rostrum host and its extension modules.
//!
//! # Responsibility
//! - Define the fixed-layout module descriptor exchanged across the
//!   dynamic-library boundary.
//! - Name the single exported entry point the host queries after loading.
//! - Provide `declare_module!` so modules export a conforming entry point.
//!
//! # Invariants
//! - Every type crossing the boundary is `#[repr(C)]`.
//! - The query entry point must not unwind.
//! - Fixed string buffers are NUL-terminated; usable capacity is one byte
//!   less than the buffer size.
//!
//! # ABI contract
//! The host resolves [`QUERY_INFO_SYMBOL`], calls it with a zeroed
//! [`ModuleInfo`], and then checks `api_version` against
//! [`ROSTRUM_API_VERSION`] before registering the module. The `imbue`
//! function is a Lua C function: it receives the live interpreter state and
//! must push exactly one table.

#![allow(non_camel_case_types)]

use std::ffi::{c_char, c_int};

/// Size of the module name buffer, terminator included.
pub const MODULE_NAME_CAPACITY: usize = 12;
/// Size of the module description buffer, terminator included.
pub const MODULE_DESCRIPTION_CAPACITY: usize = 52;

/// Exported symbol every extension module must provide.
pub const QUERY_INFO_SYMBOL: &str = "__rostrum_query_info";

/// ABI version implemented by this crate.
pub const ROSTRUM_API_VERSION: Version = Version::new(0, 1);

/// `major.minor` pair used for both the ABI and module versions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Opaque interpreter state handed to `imbue`.
#[repr(C)]
pub struct lua_State {
    _private: [u8; 0],
}

/// Produces a module's capability table on top of the interpreter stack.
///
/// Returns the number of pushed values, which must be `1`.
pub type ImbueFn = unsafe extern "C-unwind" fn(state: *mut lua_State) -> c_int;

/// Signature of the exported [`QUERY_INFO_SYMBOL`] entry point.
pub type QueryInfoFn = unsafe extern "C" fn(out: *mut ModuleInfo);

/// Fixed-layout module descriptor filled in by the query entry point.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct ModuleInfo {
    pub api_version: Version,
    pub name: [c_char; MODULE_NAME_CAPACITY],
    pub description: [c_char; MODULE_DESCRIPTION_CAPACITY],
    pub module_version: Version,
    pub imbue: Option<ImbueFn>,
}

impl ModuleInfo {
    /// All-zero descriptor passed to the query entry point.
    pub const fn empty() -> Self {
        Self {
            api_version: Version::new(0, 0),
            name: [0; MODULE_NAME_CAPACITY],
            description: [0; MODULE_DESCRIPTION_CAPACITY],
            module_version: Version::new(0, 0),
            imbue: None,
        }
    }
}

/// Copies `value` into a NUL-terminated fixed buffer at compile time.
///
/// Panics (a compile error in const context) when `value` does not leave room
/// for the terminator.
pub const fn fixed_buffer<const N: usize>(value: &str) -> [c_char; N] {
    let bytes = value.as_bytes();
    assert!(bytes.len() < N, "string does not fit the fixed ABI buffer");
    let mut buffer = [0 as c_char; N];
    let mut index = 0;
    while index < bytes.len() {
        buffer[index] = bytes[index] as c_char;
        index += 1;
    }
    buffer
}

/// Exports the query entry point for one extension module.
///
/// ```ignore
/// rostrum_api::declare_module! {
///     name: "weather",
///     description: "Weather lookups",
///     version: (2, 1),
///     imbue: imbue_weather,
/// }
/// ```
#[macro_export]
macro_rules! declare_module {
    (
        name: $name:expr,
        description: $description:expr,
        version: ($major:expr, $minor:expr),
        imbue: $imbue:path $(,)?
    ) => {
        const __ROSTRUM_MODULE_INFO: $crate::ModuleInfo = $crate::ModuleInfo {
            api_version: $crate::ROSTRUM_API_VERSION,
            name: $crate::fixed_buffer::<{ $crate::MODULE_NAME_CAPACITY }>($name),
            description: $crate::fixed_buffer::<{ $crate::MODULE_DESCRIPTION_CAPACITY }>(
                $description,
            ),
            module_version: $crate::Version::new($major, $minor),
            imbue: Some($imbue),
        };

        /// # Safety
        /// `out` must be null or point to writable `ModuleInfo` storage.
        #[no_mangle]
        pub unsafe extern "C" fn __rostrum_query_info(out: *mut $crate::ModuleInfo) {
            if !out.is_null() {
                *out = __ROSTRUM_MODULE_INFO;
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::{fixed_buffer, ModuleInfo, Version, MODULE_NAME_CAPACITY, ROSTRUM_API_VERSION};
    use std::ffi::c_int;

    unsafe extern "C-unwind" fn noop_imbue(_state: *mut super::lua_State) -> c_int {
        0
    }

    declare_module! {
        name: "probe",
        description: "ABI probe",
        version: (3, 4),
        imbue: noop_imbue,
    }

    #[test]
    fn fixed_buffer_is_nul_terminated() {
        let buffer = fixed_buffer::<MODULE_NAME_CAPACITY>("weather");
        assert_eq!(buffer[6], b'r' as std::ffi::c_char);
        assert_eq!(buffer[7], 0);
        assert_eq!(buffer[MODULE_NAME_CAPACITY - 1], 0);
    }

    #[test]
    fn fixed_buffer_accepts_eleven_usable_chars() {
        let buffer = fixed_buffer::<MODULE_NAME_CAPACITY>("abcdefghijk");
        assert_eq!(buffer[10], b'k' as std::ffi::c_char);
        assert_eq!(buffer[11], 0);
    }

    #[test]
    #[should_panic(expected = "does not fit")]
    fn fixed_buffer_rejects_overlong_values() {
        let _ = fixed_buffer::<MODULE_NAME_CAPACITY>("abcdefghijkl");
    }

    #[test]
    fn declared_entry_point_fills_descriptor() {
        let mut info = ModuleInfo::empty();
        unsafe { __rostrum_query_info(&mut info) };

        assert_eq!(info.api_version, ROSTRUM_API_VERSION);
        assert_eq!(info.module_version, Version::new(3, 4));
        assert_eq!(info.name[..6], fixed_buffer::<MODULE_NAME_CAPACITY>("probe")[..6]);
        assert!(info.imbue.is_some());
    }

    #[test]
    fn version_displays_as_major_dot_minor() {
        assert_eq!(Version::new(2, 1).to_string(), "2.1");
    }
}

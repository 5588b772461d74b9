//! Extension module contract and the native dynamic-library loader.
//!
//! # Responsibility
//! - Define the interface every registry entry implements.
//! - Load `.rmod` files with `libloading` and query their descriptor.
//!
//! # Invariants
//! - A `NativeModule` owns its `Library`; the imbue function pointer is only
//!   reachable through the module, so it never outlives the library.
//! - The query entry point is resolved and called exactly once per load.

use super::descriptor::{DescriptorError, ModuleDescriptor};
use libloading::Library;
use mlua::{Lua, Table};
use rostrum_api::{ImbueFn, ModuleInfo, QueryInfoFn, QUERY_INFO_SYMBOL};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// One loaded extension module.
pub trait ExtensionModule {
    fn descriptor(&self) -> &ModuleDescriptor;

    /// Builds a fresh capability table inside `lua`.
    fn imbue(&self, lua: &Lua) -> mlua::Result<Table>;

    /// Canonical file the module was loaded from, if any.
    fn origin(&self) -> Option<&Path> {
        None
    }
}

/// Turns a file from the modules directory into an extension module.
pub trait ModuleLoader {
    fn load(&self, path: &Path) -> Result<Box<dyn ExtensionModule>, ModuleLoadError>;
}

/// Loader backed by the platform dynamic linker.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeLoader;

impl ModuleLoader for NativeLoader {
    fn load(&self, path: &Path) -> Result<Box<dyn ExtensionModule>, ModuleLoadError> {
        NativeModule::open(path).map(|module| Box::new(module) as Box<dyn ExtensionModule>)
    }
}

/// Extension module living in a dynamically loaded library.
pub struct NativeModule {
    descriptor: ModuleDescriptor,
    imbue: ImbueFn,
    path: PathBuf,
    _library: Library,
}

impl NativeModule {
    pub fn open(path: &Path) -> Result<Self, ModuleLoadError> {
        // SAFETY: loading runs the library's initializers; modules in the
        // modules directory are trusted native code.
        let library = unsafe { Library::new(path) }.map_err(|err| ModuleLoadError::Open {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;

        let query: QueryInfoFn = unsafe {
            // SAFETY: the exported symbol is declared with `QueryInfoFn` by
            // `rostrum_api::declare_module!`.
            *library
                .get::<QueryInfoFn>(QUERY_INFO_SYMBOL.as_bytes())
                .map_err(|err| ModuleLoadError::MissingEntryPoint {
                    path: path.to_path_buf(),
                    symbol: QUERY_INFO_SYMBOL,
                    message: err.to_string(),
                })?
        };

        let mut info = ModuleInfo::empty();
        // SAFETY: `info` is valid writable storage for the duration of the call.
        unsafe { query(&mut info) };

        let invalid = |reason: DescriptorError| ModuleLoadError::InvalidDescriptor {
            path: path.to_path_buf(),
            reason,
        };
        let imbue = info
            .imbue
            .ok_or_else(|| invalid(DescriptorError::MissingImbue))?;
        let descriptor = ModuleDescriptor::from_raw(&info).map_err(invalid)?;

        Ok(Self {
            descriptor,
            imbue,
            path: path.canonicalize().unwrap_or_else(|_| path.to_path_buf()),
            _library: library,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ExtensionModule for NativeModule {
    fn descriptor(&self) -> &ModuleDescriptor {
        &self.descriptor
    }

    fn origin(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn imbue(&self, lua: &Lua) -> mlua::Result<Table> {
        // SAFETY: `rostrum_api::lua_State` is an opaque stand-in for the
        // interpreter state; both signatures take one state pointer and
        // return `c_int`, so the function pointers are ABI-identical.
        let function = unsafe {
            let imbue: mlua::ffi::lua_CFunction = std::mem::transmute::<ImbueFn, _>(self.imbue);
            lua.create_c_function(imbue)?
        };
        function.call::<Table>(())
    }
}

/// Per-file failure while loading one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleLoadError {
    Open {
        path: PathBuf,
        message: String,
    },
    MissingEntryPoint {
        path: PathBuf,
        symbol: &'static str,
        message: String,
    },
    InvalidDescriptor {
        path: PathBuf,
        reason: DescriptorError,
    },
}

impl ModuleLoadError {
    pub fn path(&self) -> &Path {
        match self {
            Self::Open { path, .. }
            | Self::MissingEntryPoint { path, .. }
            | Self::InvalidDescriptor { path, .. } => path,
        }
    }
}

impl Display for ModuleLoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { path, message } => {
                write!(f, "failed to load {}: {message}", path.display())
            }
            Self::MissingEntryPoint {
                path,
                symbol,
                message,
            } => write!(
                f,
                "failed to load {}: missing entry point `{symbol}`: {message}",
                path.display()
            ),
            Self::InvalidDescriptor { path, reason } => {
                write!(f, "failed to load {}: {reason}", path.display())
            }
        }
    }
}

impl Error for ModuleLoadError {}

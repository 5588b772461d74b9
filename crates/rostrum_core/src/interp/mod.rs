//! Interpreter state bootstrap.
//!
//! # Responsibility
//! - Create the Lua state with the minimal base namespace set.
//! - Point `package.cpath` at the modules directory.
//! - Install the reserved-namespace resolver hook.
//!
//! # Invariants
//! - `initialize_interpreter_state` runs its setup at most once per state.
//! - The resolver hook sits directly after the preload searcher, ahead of the
//!   path-based searchers.

mod core_table;
mod lib_group;
mod resolver;

pub use core_table::{caller_location, imbue_core, load_lua_libs};
pub use lib_group::{supported_lib_group_strings, LibGroup};
pub use resolver::{classify_request, Namespace, NamespaceResolver};

use crate::config::LUA_MODULE_EXTENSION;
use crate::error::HostResult;
use crate::registry::SharedManager;
use log::debug;
use mlua::{Lua, LuaOptions, StdLib, Table};

/// Position of the resolver hook in `package.searchers` (1-based).
const RESOLVER_SEARCHER_INDEX: i64 = 2;

/// Marker stored in app data once a state is initialized.
struct HostInitialized;

/// Creates an interpreter state with only the base and package libraries.
///
/// The state is created in unsafe mode: extension modules are native code
/// and `.lmod` C modules must stay loadable through `package.cpath`.
pub fn new_state() -> Lua {
    // SAFETY: modules loaded into this state are trusted native code.
    unsafe { Lua::unsafe_new_with(StdLib::PACKAGE, LuaOptions::new()) }
}

/// Prepares `lua` for host scripts and wires it to `manager`.
///
/// Safe to call repeatedly for the same state; only the first call has an
/// effect.
pub fn initialize_interpreter_state(lua: &Lua, manager: &SharedManager) -> HostResult<()> {
    if lua.app_data_ref::<HostInitialized>().is_some() {
        debug!("event=interp_init module=interp status=skipped reason=already_initialized");
        return Ok(());
    }

    lua.load_std_libs(StdLib::PACKAGE)?;
    debug!("event=interp_init module=interp status=progress libs=base,package");

    let package: Table = lua.globals().get("package")?;
    let cpath = manager
        .borrow()
        .modules_dir()
        .join(format!("?.{LUA_MODULE_EXTENSION}"));
    package.set("cpath", cpath.to_string_lossy().into_owned())?;
    debug!(
        "event=interp_init module=interp status=progress cpath={}",
        cpath.display()
    );

    let searchers: Table = package.get("searchers")?;
    let searcher = NamespaceResolver::new(manager.clone()).into_searcher(lua)?;
    searchers.raw_insert(RESOLVER_SEARCHER_INDEX, searcher)?;
    debug!("event=interp_init module=interp status=ok hook=namespace_resolver");

    lua.set_app_data(HostInitialized);
    Ok(())
}

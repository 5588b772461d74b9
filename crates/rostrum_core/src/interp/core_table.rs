//! Built-in `:core` capability table.
//!
//! # Responsibility
//! - Expose host timing, library activation, fingerprinted script loading,
//!   logging controls and the system report to scripts.
//!
//! # Invariants
//! - Building the table performs no disk I/O.
//! - Script log records carry the calling Lua function's location.

use super::lib_group::{supported_lib_group_strings, LibGroup};
use crate::logging::{self, LogLevel, SourceLocation, DIAGNOSTIC_TARGET};
use crate::script::load_fingerprinted;
use crate::system::{elapsed_seconds, system_report};
use log::debug;
use mlua::{Function, Lua, Table, Variadic};
use std::path::PathBuf;

const CORE_FUNCTIONS: &[&str] = &[
    "get_elapsed_time",
    "load_lua_libs",
    "load_file_whash",
    "set_log_level",
    "reroute_log",
    "print_system_info",
];

const SCRIPT_LOG_FUNCTIONS: &[(&str, LogLevel)] = &[
    ("log_trace", LogLevel::Trace),
    ("log_debug", LogLevel::Debug),
    ("log_info", LogLevel::Info),
    ("log_warn", LogLevel::Warn),
    ("log_error", LogLevel::Err),
];

/// Builds a fresh core capability table in `lua`.
pub fn imbue_core(lua: &Lua) -> mlua::Result<Table> {
    let core = lua.create_table()?;

    let lib = lua.create_table()?;
    for name in supported_lib_group_strings() {
        lib.set(*name, *name)?;
    }
    core.set("lib", lib)?;

    core.set(
        "get_elapsed_time",
        lua.create_function(|_, ()| Ok(elapsed_seconds()))?,
    )?;
    core.set(
        "load_lua_libs",
        lua.create_function(|lua, groups: Variadic<String>| load_lua_libs(lua, &groups))?,
    )?;
    core.set(
        "load_file_whash",
        lua.create_function(|lua, path: String| {
            let script = load_fingerprinted(lua, &PathBuf::from(path))?;
            Ok((script.function, script.fingerprint))
        })?,
    )?;
    core.set(
        "set_log_level",
        lua.create_function(|_, level: String| {
            logging::set_log_level(&level)?;
            Ok(())
        })?,
    )?;
    core.set(
        "reroute_log",
        lua.create_function(|_, path: String| {
            logging::reroute_log(&PathBuf::from(path))?;
            Ok(())
        })?,
    )?;
    core.set(
        "print_system_info",
        lua.create_function(|_, ()| {
            log::info!(target: DIAGNOSTIC_TARGET, "{}", system_report());
            Ok(())
        })?,
    )?;
    debug!(
        "event=core_imbue module=interp status=ok functions={}",
        CORE_FUNCTIONS.join(",")
    );

    for (name, level) in SCRIPT_LOG_FUNCTIONS {
        core.set(*name, script_logger(lua, *level)?)?;
    }
    debug!(
        "event=core_imbue module=interp status=ok functions={}",
        SCRIPT_LOG_FUNCTIONS
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(",")
    );

    Ok(core)
}

/// Opens every named library group in `lua`.
pub fn load_lua_libs(lua: &Lua, groups: &[String]) -> mlua::Result<()> {
    for group in groups {
        let group = LibGroup::parse(group)?;
        lua.load_std_libs(group.std_lib())?;
        debug!(
            "event=lib_activate module=interp status=ok group={}",
            group.as_str()
        );
    }
    Ok(())
}

/// Location of the Lua function calling the current native callback.
pub fn caller_location(lua: &Lua) -> SourceLocation {
    let Some(frame) = lua.inspect_stack(1) else {
        return SourceLocation {
            file: "?".to_string(),
            function: None,
            line: -1,
        };
    };
    let source = frame.source();
    let names = frame.names();
    SourceLocation {
        file: source
            .short_src
            .as_deref()
            .unwrap_or("?")
            .to_string(),
        function: names.name.as_deref().map(str::to_string),
        line: frame.curr_line(),
    }
}

fn script_logger(lua: &Lua, level: LogLevel) -> mlua::Result<Function> {
    lua.create_function(move |lua, message: String| {
        let location = caller_location(lua);
        logging::log_with_location(level, &location, &message);
        Ok(())
    })
}

//! Script loading with content fingerprints.
//!
//! # Responsibility
//! - Read a script file, compile it, and return the chunk with an xxHash32
//!   fingerprint of the exact bytes read.
//!
//! # Invariants
//! - The fingerprint covers the source bytes only, not the path.
//! - No caching happens here; callers key their own caches on the fingerprint.

use crate::error::{HostError, HostResult};
use log::{debug, error};
use mlua::{Function, Lua};
use std::path::Path;
use xxhash_rust::xxh32::xxh32;

const FINGERPRINT_SEED: u32 = 0;

/// Compiled script chunk plus its content fingerprint.
#[derive(Debug, Clone)]
pub struct FingerprintedScript {
    pub function: Function,
    pub fingerprint: u32,
}

/// Fast content fingerprint used for change detection.
pub fn fingerprint(source: &[u8]) -> u32 {
    xxh32(source, FINGERPRINT_SEED)
}

/// Loads and compiles `path` without running it.
///
/// # Errors
/// - [`HostError::ScriptNotFound`] when the file cannot be opened.
/// - [`HostError::Script`] when compilation fails.
pub fn load_fingerprinted(lua: &Lua, path: &Path) -> HostResult<FingerprintedScript> {
    let source = std::fs::read(path).map_err(|err| {
        error!(
            "event=script_load module=script status=error path={} error={}",
            path.display(),
            err
        );
        HostError::ScriptNotFound(path.to_path_buf())
    })?;

    let function = lua
        .load(source.as_slice())
        .set_name(format!("@{}", path.display()))
        .into_function()?;
    let fingerprint = fingerprint(&source);
    debug!(
        "event=script_load module=script status=ok path={} bytes={} fingerprint={:#010x}",
        path.display(),
        source.len(),
        fingerprint
    );

    Ok(FingerprintedScript {
        function,
        fingerprint,
    })
}

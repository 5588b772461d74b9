use rostrum_core::interp::{imbue_core, new_state};
use rostrum_core::{fingerprint, load_fingerprinted, HostError};

#[test]
fn identical_bytes_share_a_fingerprint_and_edits_change_it() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.lua");
    let copy = dir.path().join("copy.lua");
    let edited = dir.path().join("edited.lua");
    std::fs::write(&first, "return 40 + 2\n").unwrap();
    std::fs::write(&copy, "return 40 + 2\n").unwrap();
    std::fs::write(&edited, "return 40 + 3\n").unwrap();

    let lua = new_state();
    let a = load_fingerprinted(&lua, &first).unwrap();
    let b = load_fingerprinted(&lua, &copy).unwrap();
    let c = load_fingerprinted(&lua, &edited).unwrap();

    assert_eq!(a.fingerprint, b.fingerprint);
    assert_ne!(a.fingerprint, c.fingerprint);
    assert_eq!(a.fingerprint, fingerprint(b"return 40 + 2\n"));
    assert_eq!(a.function.call::<i64>(()).unwrap(), 42);
    assert_eq!(c.function.call::<i64>(()).unwrap(), 43);
}

#[test]
fn loading_does_not_run_the_chunk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("side_effect.lua");
    std::fs::write(&path, "ran = true").unwrap();

    let lua = new_state();
    let script = load_fingerprinted(&lua, &path).unwrap();
    assert!(!lua.globals().contains_key("ran").unwrap());
    script.function.call::<()>(()).unwrap();
    assert!(lua.globals().get::<bool>("ran").unwrap());
}

#[test]
fn missing_script_reports_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.lua");

    let lua = new_state();
    let err = load_fingerprinted(&lua, &path).unwrap_err();
    assert!(matches!(err, HostError::ScriptNotFound(_)));
    assert_eq!(err.to_string(), format!("{} not found", path.display()));
}

#[test]
fn syntax_errors_surface_as_script_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.lua");
    std::fs::write(&path, "return (").unwrap();

    let lua = new_state();
    let err = load_fingerprinted(&lua, &path).unwrap_err();
    assert!(err.is_script_error());
}

#[test]
fn core_table_returns_chunk_and_fingerprint_to_scripts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("value.lua");
    std::fs::write(&path, "return 'loaded'").unwrap();

    let lua = new_state();
    lua.globals().set("core", imbue_core(&lua).unwrap()).unwrap();
    lua.globals()
        .set("script_path", path.to_string_lossy().into_owned())
        .unwrap();

    let (value, hash): (String, u32) = lua
        .load("local chunk, hash = core.load_file_whash(script_path); return chunk(), hash")
        .eval()
        .unwrap();
    assert_eq!(value, "loaded");
    assert_eq!(hash, fingerprint(b"return 'loaded'"));
}

//! Shared library that lacks the module query entry point.

#[no_mangle]
pub extern "C" fn rostrum_fixture_marker() -> i32 {
    7
}

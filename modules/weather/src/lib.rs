//! Sample extension module exposing canned weather lookups as `:weather`.

use mlua::{Lua, Result, Table};
use std::ffi::c_int;

const CONDITIONS: &[&str] = &["sunny", "cloudy", "rainy", "windy", "foggy"];

rostrum_api::declare_module! {
    name: "weather",
    description: "Canned weather lookups",
    version: (2, 1),
    imbue: imbue_weather,
}

/// Pushes a fresh `weather` capability table onto the interpreter stack.
///
/// # Safety
/// `state` must be the live interpreter state calling this C function.
unsafe extern "C-unwind" fn imbue_weather(state: *mut rostrum_api::lua_State) -> c_int {
    Lua::entrypoint1(state.cast::<mlua::ffi::lua_State>(), weather_table)
}

fn weather_table(lua: &Lua) -> Result<Table> {
    let weather = lua.create_table()?;
    weather.set("version", "2.1")?;
    weather.set(
        "forecast",
        lua.create_function(|_, city: String| Ok(forecast(&city)))?,
    )?;
    weather.set(
        "celsius_to_fahrenheit",
        lua.create_function(|_, celsius: f64| Ok(celsius * 9.0 / 5.0 + 32.0))?,
    )?;
    Ok(weather)
}

/// Deterministic per-city condition; identical input always yields the same
/// answer.
fn forecast(city: &str) -> String {
    let slot = city
        .bytes()
        .fold(0usize, |acc, byte| acc.wrapping_mul(31).wrapping_add(byte as usize));
    format!("{} in {city}", CONDITIONS[slot % CONDITIONS.len()])
}

#[cfg(test)]
mod tests {
    use super::forecast;

    #[test]
    fn forecast_is_stable_per_city() {
        assert_eq!(forecast("Oslo"), forecast("Oslo"));
        assert!(forecast("Oslo").ends_with(" in Oslo"));
    }
}

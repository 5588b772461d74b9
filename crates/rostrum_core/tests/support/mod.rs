//! In-memory module loader for registry and resolver tests.
//!
//! A `.rmod` file holds either `missing-export` or whitespace-separated
//! `api=<maj>.<min>`, `version=<maj>.<min>` and optional `name=<name>`
//! fields; the name defaults to the file stem.

#![allow(dead_code)]

use mlua::{Lua, Table};
use rostrum_core::registry::{
    ExtensionModule, ModuleDescriptor, ModuleLoadError, ModuleLoader,
};
use rostrum_api::Version;
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Clone, Default)]
pub struct FakeLoader {
    pub imbue_count: Rc<Cell<usize>>,
}

impl ModuleLoader for FakeLoader {
    fn load(&self, path: &Path) -> Result<Box<dyn ExtensionModule>, ModuleLoadError> {
        let contents = std::fs::read_to_string(path).map_err(|err| ModuleLoadError::Open {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        if contents.trim() == "missing-export" {
            return Err(ModuleLoadError::MissingEntryPoint {
                path: path.to_path_buf(),
                symbol: rostrum_api::QUERY_INFO_SYMBOL,
                message: "undefined symbol".to_string(),
            });
        }

        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .to_string();
        let mut descriptor = ModuleDescriptor::new(name, "fake module", Version::new(0, 0));
        for field in contents.split_whitespace() {
            match field.split_once('=') {
                Some(("name", value)) => descriptor.name = value.to_string(),
                Some(("api", value)) => descriptor.api_version = parse_version(value),
                Some(("version", value)) => descriptor.module_version = parse_version(value),
                _ => {}
            }
        }
        Ok(Box::new(FakeModule {
            descriptor,
            origin: path.to_path_buf(),
            imbue_count: Rc::clone(&self.imbue_count),
        }))
    }
}

struct FakeModule {
    descriptor: ModuleDescriptor,
    origin: PathBuf,
    imbue_count: Rc<Cell<usize>>,
}

impl ExtensionModule for FakeModule {
    fn descriptor(&self) -> &ModuleDescriptor {
        &self.descriptor
    }

    fn origin(&self) -> Option<&Path> {
        Some(&self.origin)
    }

    fn imbue(&self, lua: &Lua) -> mlua::Result<Table> {
        self.imbue_count.set(self.imbue_count.get() + 1);
        let table = lua.create_table()?;
        table.set("name", self.descriptor.name.clone())?;
        table.set("version", self.descriptor.module_version.to_string())?;
        table.set(
            "forecast",
            lua.create_function(|_, city: String| Ok(format!("sunny in {city}")))?,
        )?;
        Ok(table)
    }
}

fn parse_version(value: &str) -> Version {
    let (major, minor) = value.split_once('.').unwrap_or((value, "0"));
    Version::new(major.parse().unwrap_or(0), minor.parse().unwrap_or(0))
}

/// Writes a module file understood by [`FakeLoader`].
pub fn write_module(dir: &Path, file_name: &str, contents: &str) {
    std::fs::write(dir.join(file_name), contents).unwrap();
}

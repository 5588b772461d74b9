//! Module registry: rescan and resolve.

use super::descriptor::ModuleDescriptor;
use super::loader::{ExtensionModule, ModuleLoadError, ModuleLoader, NativeLoader};
use crate::config::MODULE_EXTENSION;
use crate::error::{HostError, HostResult};
use log::{debug, error, info, warn};
use mlua::{Lua, Table};
use rostrum_api::{Version, ROSTRUM_API_VERSION};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Instant;

/// Registry handle shared with the interpreter state it initializes.
pub type SharedManager = Rc<RefCell<Manager>>;

/// Outcome of one rescan.
#[derive(Debug, Default)]
pub struct RescanReport {
    /// Names registered, in registry order.
    pub loaded: Vec<String>,
    /// Files that were attempted and skipped.
    pub failures: Vec<ModuleLoadError>,
}

/// Authoritative record of the available extension modules.
///
/// Entries are replaced wholesale by [`Manager::rescan`]. Replaced entries
/// are retired rather than dropped: capability tables already handed to the
/// interpreter point into their libraries.
pub struct Manager {
    modules_dir: PathBuf,
    host_api_version: Version,
    loader: Box<dyn ModuleLoader>,
    entries: Vec<Box<dyn ExtensionModule>>,
    retired: Vec<Box<dyn ExtensionModule>>,
}

impl Manager {
    /// Creates a registry over `modules_dir` using the native loader.
    pub fn new(modules_dir: impl Into<PathBuf>) -> Self {
        Self::with_loader(modules_dir, Box::new(NativeLoader))
    }

    pub fn with_loader(modules_dir: impl Into<PathBuf>, loader: Box<dyn ModuleLoader>) -> Self {
        Self {
            modules_dir: modules_dir.into(),
            host_api_version: ROSTRUM_API_VERSION,
            loader,
            entries: Vec::new(),
            retired: Vec::new(),
        }
    }

    /// Overrides the ABI version modules are negotiated against.
    pub fn with_host_api_version(mut self, version: Version) -> Self {
        self.host_api_version = version;
        self
    }

    pub fn into_shared(self) -> SharedManager {
        Rc::new(RefCell::new(self))
    }

    pub fn modules_dir(&self) -> &Path {
        &self.modules_dir
    }

    /// Rebuilds the registry from the modules directory.
    ///
    /// # Errors
    /// - Per-file load, query and negotiation failures are logged, reported
    ///   in [`RescanReport::failures`] and skipped.
    /// - Failures enumerating the directory abort the rescan; the previous
    ///   registry is already discarded at that point.
    pub fn rescan(&mut self) -> HostResult<RescanReport> {
        let started_at = Instant::now();
        info!(
            "event=registry_rescan module=registry status=start dir={}",
            self.modules_dir.display()
        );

        let previous = std::mem::take(&mut self.entries);
        self.retire(previous);

        let mut report = RescanReport::default();
        let candidates = match self.module_files() {
            Ok(candidates) => candidates,
            Err(err) => {
                error!(
                    "event=registry_rescan module=registry status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err);
            }
        };

        for path in candidates {
            match self.load_one(&path) {
                Ok(module) => {
                    let descriptor = module.descriptor();
                    if self.position(&descriptor.name).is_some() {
                        warn!(
                            "event=module_load module=registry status=shadowed name={} path={}",
                            descriptor.name,
                            path.display()
                        );
                    }
                    debug!(
                        "event=module_load module=registry status=ok name={} version={} api={} path={}",
                        descriptor.name,
                        descriptor.module_version,
                        descriptor.api_version,
                        path.display()
                    );
                    report.loaded.push(descriptor.name.clone());
                    self.entries.push(module);
                }
                Err(err) => {
                    error!(
                        "event=module_load module=registry status=error path={} error={}",
                        path.display(),
                        err
                    );
                    report.failures.push(err);
                }
            }
        }

        info!(
            "event=registry_rescan module=registry status=ok duration_ms={} loaded={} failed={}",
            started_at.elapsed().as_millis(),
            report.loaded.len(),
            report.failures.len()
        );
        Ok(report)
    }

    /// Produces the capability table of the first module named `name`.
    pub fn resolve(&self, lua: &Lua, name: &str) -> HostResult<Table> {
        let Some(index) = self.position(name) else {
            return Err(HostError::ModuleNotFound(name.to_string()));
        };
        debug!("event=module_resolve module=registry status=start name={name}");
        let table = self.entries[index].imbue(lua)?;
        Ok(table)
    }

    pub fn descriptor(&self, name: &str) -> Option<&ModuleDescriptor> {
        self.position(name).map(|index| self.entries[index].descriptor())
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.entries.iter().map(|entry| entry.descriptor())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of replaced entries kept alive for previously handed-out tables.
    pub fn retired_len(&self) -> usize {
        self.retired.len()
    }

    /// Keeps one retired handle per origin. A second handle to an already
    /// retired library only holds a reference count, so dropping it never
    /// unmaps code.
    fn retire(&mut self, previous: Vec<Box<dyn ExtensionModule>>) {
        for module in previous {
            let duplicate = module.origin().is_some_and(|origin| {
                self.retired
                    .iter()
                    .any(|retired| retired.origin() == Some(origin))
            });
            if duplicate {
                debug!(
                    "event=module_retire module=registry status=deduplicated name={}",
                    module.descriptor().name
                );
            } else {
                self.retired.push(module);
            }
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.descriptor().name == name)
    }

    fn load_one(&self, path: &Path) -> Result<Box<dyn ExtensionModule>, ModuleLoadError> {
        let module = self.loader.load(path)?;
        let descriptor = module.descriptor();
        descriptor
            .validate()
            .and_then(|()| descriptor.negotiate(self.host_api_version))
            .map_err(|reason| ModuleLoadError::InvalidDescriptor {
                path: path.to_path_buf(),
                reason,
            })?;
        Ok(module)
    }

    fn module_files(&self) -> HostResult<Vec<PathBuf>> {
        let dir = self.modules_dir.as_path();
        if !dir.is_dir() {
            warn!(
                "event=registry_rescan module=registry status=skipped reason=missing_dir dir={}",
                dir.display()
            );
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let entries = std::fs::read_dir(dir).map_err(|err| HostError::io(dir, err))?;
        for entry in entries {
            let path = entry.map_err(|err| HostError::io(dir, err))?.path();
            let is_module = path
                .extension()
                .is_some_and(|extension| extension == MODULE_EXTENSION);
            if is_module && path.is_file() {
                files.push(path);
            }
        }
        // read_dir order is platform-defined; keep "first match wins" stable.
        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::Manager;
    use crate::error::HostError;

    #[test]
    fn missing_modules_dir_yields_empty_registry() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = Manager::new(dir.path().join("absent"));
        let report = manager.rescan().expect("missing directory is not fatal");
        assert!(report.loaded.is_empty());
        assert!(manager.is_empty());
    }

    #[test]
    fn resolve_on_empty_registry_is_not_found() {
        let lua = mlua::Lua::new();
        let manager = Manager::new("modules");
        let err = manager.resolve(&lua, "forecast").unwrap_err();
        assert!(matches!(err, HostError::ModuleNotFound(ref name) if name == "forecast"));
        assert_eq!(err.to_string(), "module forecast not found");
    }

    #[test]
    fn ignores_files_without_module_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("readme.txt"), b"not a module").unwrap();
        std::fs::write(dir.path().join("init.lmod"), b"lua c module").unwrap();

        let mut manager = Manager::new(dir.path());
        let report = manager.rescan().unwrap();
        assert!(report.loaded.is_empty());
        assert!(report.failures.is_empty());
    }
}

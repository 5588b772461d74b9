//! Extension module registry.
//!
//! # Responsibility
//! - Discover `.rmod` libraries in the modules directory.
//! - Query, validate and ABI-negotiate each module's descriptor.
//! - Produce capability tables on demand by module name.
//!
//! # Invariants
//! - A rescan replaces the registry wholesale; there is no merge.
//! - Loaded libraries are never unloaded while the owning `Manager` lives.
//! - Lookup is linear and the first registered match wins.

mod descriptor;
mod loader;
mod manager;

pub use descriptor::{DescriptorError, ModuleDescriptor};
pub use loader::{ExtensionModule, ModuleLoadError, ModuleLoader, NativeLoader, NativeModule};
pub use manager::{Manager, RescanReport, SharedManager};

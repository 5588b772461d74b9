//! `package.searchers` hook for the reserved `:` namespace.

use super::core_table::imbue_core;
use crate::config::{CORE_NAMESPACE, NAMESPACE_SENTINEL};
use crate::registry::SharedManager;
use log::debug;
use mlua::{Function, Lua, Table};

/// Target of one reserved-namespace request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace<'a> {
    Core,
    Module(&'a str),
}

/// Classifies a `require` request; `None` means the hook declines it.
pub fn classify_request(request: &str) -> Option<Namespace<'_>> {
    let name = request.strip_prefix(NAMESPACE_SENTINEL)?;
    if name == CORE_NAMESPACE {
        Some(Namespace::Core)
    } else {
        Some(Namespace::Module(name))
    }
}

/// Routes reserved-namespace requests to the core table or the registry.
#[derive(Clone)]
pub struct NamespaceResolver {
    manager: SharedManager,
}

impl NamespaceResolver {
    pub fn new(manager: SharedManager) -> Self {
        Self { manager }
    }

    /// Resolves `request` to a capability table, or `None` when declined.
    pub fn resolve(&self, lua: &Lua, request: &str) -> mlua::Result<Option<Table>> {
        let Some(namespace) = classify_request(request) else {
            return Ok(None);
        };
        debug!("event=namespace_resolve module=interp status=start request={request}");
        let table = match namespace {
            Namespace::Core => imbue_core(lua)?,
            Namespace::Module(name) => self.manager.borrow().resolve(lua, name)?,
        };
        Ok(Some(table))
    }

    /// Builds the searcher function installed into `package.searchers`.
    ///
    /// For a handled request the searcher returns a loader; `require` calls
    /// it and caches its single result in `package.loaded`.
    pub fn into_searcher(self, lua: &Lua) -> mlua::Result<Function> {
        lua.create_function(move |lua, request: String| {
            if classify_request(&request).is_none() {
                return Ok(None);
            }
            let resolver = self.clone();
            let loader = lua.create_function(move |lua, _: mlua::MultiValue| {
                match resolver.resolve(lua, &request)? {
                    Some(table) => Ok(table),
                    None => Err(mlua::Error::RuntimeError(format!(
                        "namespace request {request} was declined"
                    ))),
                }
            })?;
            Ok(Some(loader))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{classify_request, Namespace};

    #[test]
    fn declines_requests_without_sentinel() {
        assert_eq!(classify_request("weather"), None);
        assert_eq!(classify_request("lib.core"), None);
        assert_eq!(classify_request(""), None);
    }

    #[test]
    fn routes_core_and_module_names() {
        assert_eq!(classify_request(":core"), Some(Namespace::Core));
        assert_eq!(
            classify_request(":weather"),
            Some(Namespace::Module("weather"))
        );
        assert_eq!(classify_request(":"), Some(Namespace::Module("")));
    }
}

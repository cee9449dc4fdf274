// ws.rs - Writing system handle resolution

use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WsError {
    #[error("No writing system registered for '{0}'")]
    UnknownId(String),
    #[error("No writing system registered for handle {0}")]
    UnknownHandle(i32),
    #[error("Writing system identifier must not be empty")]
    EmptyId,
}

/// Maps writing system identifiers (e.g. `"en"`) to the opaque integer
/// handles stored in string properties, and back.
pub trait WritingSystemResolver {
    fn handle(&self, id: &str) -> Result<i32, WsError>;
    fn id(&self, handle: i32) -> Result<String, WsError>;
}

#[derive(Debug, Default)]
struct WsTables {
    by_id: HashMap<String, i32>,
    by_handle: HashMap<i32, String>,
}

/// In-memory resolver. Handles are handed out from 1 in registration order.
#[derive(Debug, Default)]
pub struct WsRegistry {
    tables: RwLock<WsTables>,
    auto_register: bool,
}

impl WsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that registers unknown identifiers on lookup instead of failing.
    pub fn permissive() -> Self {
        Self {
            auto_register: true,
            ..Self::default()
        }
    }

    pub fn with_ids<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        let registry = Self::new();
        for id in ids {
            // empty ids are skipped
            let _ = registry.register(id);
        }
        registry
    }

    pub fn set_auto_register(&mut self, auto_register: bool) {
        self.auto_register = auto_register;
    }

    /// Returns the handle for `id`, registering it if needed.
    pub fn register(&self, id: &str) -> Result<i32, WsError> {
        if id.is_empty() {
            return Err(WsError::EmptyId);
        }
        let mut tables = self.tables.write();
        if let Some(&handle) = tables.by_id.get(id) {
            return Ok(handle);
        }
        let handle = tables.by_id.len() as i32 + 1;
        tables.by_id.insert(id.to_string(), handle);
        tables.by_handle.insert(handle, id.to_string());
        debug!("Registered writing system '{}' as {}", id, handle);
        Ok(handle)
    }

    pub fn len(&self) -> usize {
        self.tables.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl WritingSystemResolver for WsRegistry {
    fn handle(&self, id: &str) -> Result<i32, WsError> {
        if let Some(&handle) = self.tables.read().by_id.get(id) {
            return Ok(handle);
        }
        if self.auto_register {
            self.register(id)
        } else {
            Err(WsError::UnknownId(id.to_string()))
        }
    }

    fn id(&self, handle: i32) -> Result<String, WsError> {
        self.tables
            .read()
            .by_handle
            .get(&handle)
            .cloned()
            .ok_or(WsError::UnknownHandle(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_resolve() {
        let registry = WsRegistry::with_ids(["en", "fr", "en"]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.handle("en"), Ok(1));
        assert_eq!(registry.handle("fr"), Ok(2));
        assert_eq!(registry.id(2), Ok("fr".to_string()));
        assert_eq!(registry.handle("de"), Err(WsError::UnknownId("de".to_string())));
        assert_eq!(registry.id(9), Err(WsError::UnknownHandle(9)));
    }

    #[test]
    fn test_permissive_registry() {
        let registry = WsRegistry::permissive();
        assert!(registry.is_empty());
        assert_eq!(registry.handle("seh"), Ok(1));
        assert_eq!(registry.handle("seh"), Ok(1));
        assert_eq!(registry.id(1), Ok("seh".to_string()));
        assert_eq!(registry.register(""), Err(WsError::EmptyId));
    }
}

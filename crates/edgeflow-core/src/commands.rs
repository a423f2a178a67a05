//! In-memory command allow-list.
//!
//! Services are registered with the executable path they are allowed to
//! launch. Request validation compares the first command-line token of
//! native/packaged variants against this registry, so a caller cannot
//! substitute an arbitrary binary for a registered service name.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::providers::CommandRegistry;

/// Thread-safe service-name → executable-path store.
#[derive(Debug, Default)]
pub struct CommandStore {
    entries: RwLock<HashMap<String, String>>,
}

impl CommandStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the executable for a service.
    pub fn register(&self, service_name: impl Into<String>, file_name: impl Into<String>) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(service_name.into(), file_name.into());
    }

    /// Remove a service's registration. Returns whether it existed.
    pub fn unregister(&self, service_name: &str) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(service_name).is_some()
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CommandRegistry for CommandStore {
    fn registered_file_name(&self, service_name: &str) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(service_name).cloned()
    }
}

//! # Quill Configuration
//!
//! A minimal string key/value store mirroring `app.set()` / `app.get()`.
//! Applications load their own settings (environment, files) and write
//! the values services need here.
//!
//! ```rust
//! use quill_core::QuillApp;
//! let app = QuillApp::<(), ()>::new();
//!
//! app.set("paginate.default", "10");
//! app.set("paginate.max", "50");
//!
//! assert_eq!(app.get("paginate.default"), Some("10".to_string()));
//! assert_eq!(app.config_snapshot().get_usize("paginate.max"), Some(50));
//! ```

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct QuillConfig {
    values: HashMap<String, String>,
}

impl QuillConfig {
    /// Create an empty config store.
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Set a configuration key to a string value.
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    /// Get a configuration value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn snapshot(&self) -> QuillConfigSnapshot {
        QuillConfigSnapshot::new(self.values.clone())
    }
}

/// Read-only copy of the config, cheap to hand to services.
#[derive(Debug, Clone, Default)]
pub struct QuillConfigSnapshot {
    map: HashMap<String, String>,
}

impl QuillConfigSnapshot {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.trim().parse::<usize>().ok())
    }
}

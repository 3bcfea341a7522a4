//! Durable key/value storage behind the collection store.
//!
//! The collection is kept under two independent entries, [`PHOTOS_KEY`] and
//! [`CATEGORIES_KEY`], each holding a JSON array.

use anyhow::Result;
use std::collections::HashMap;

pub const PHOTOS_KEY: &str = "photos";
pub const CATEGORIES_KEY: &str = "categories";

pub trait Storage {
    /// Read an entry, `None` when it was never written.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace an entry. Returns once the value is durable.
    fn write(&mut self, key: &str, value: &str) -> Result<()>;
}

/// In-process storage, for tests and throwaway sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

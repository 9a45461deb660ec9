//! Translation catalog.
//!
//! The engine resolves every user-visible string (help lines, error
//! messages) through the [`Translate`] trait. The stock implementation is
//! a flat key/value catalog deserialized from TOML. Lookup is pure: an
//! unknown key is echoed back unchanged, which keeps missing catalog
//! entries visible without failing dispatch.

use std::collections::HashMap;

/// Pure string-lookup collaborator.
pub trait Translate: Send + Sync {
    fn translate(&self, key: &str) -> String;
}

/// Flat key/value catalog loaded from a TOML table of strings.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: HashMap<String, String>,
}

impl Catalog {
    /// Parse a catalog from a TOML string table. Keys with dots must be
    /// quoted in the source file (`"error.mail" = "..."`).
    pub fn from_toml(source: &str) -> Result<Self, toml::de::Error> {
        let entries: HashMap<String, String> = toml::from_str(source)?;
        Ok(Self { entries })
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Translate for Catalog {
    fn translate(&self, key: &str) -> String {
        match self.entries.get(key) {
            Some(text) => text.clone(),
            None => key.to_string(),
        }
    }
}

//! Alias storage.
//!
//! Aliases are pure name rewrites keyed by `(shell type, alias name)`.
//! Collision checking against real command names happens in the registry
//! service at add time; this table only owns the entries.

use std::collections::HashMap;

use vesta_types::manifest::AliasRecord;
use vesta_types::shell::ShellType;

#[derive(Debug, Default)]
pub struct AliasTable {
    entries: HashMap<(ShellType, String), String>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expansion line for an alias, if defined.
    pub fn resolve(&self, shell: ShellType, name: &str) -> Option<&str> {
        self.entries
            .get(&(shell, name.to_ascii_lowercase()))
            .map(String::as_str)
    }

    /// Insert or replace an entry. Returns the previous expansion if the
    /// alias already existed.
    pub fn insert(&mut self, shell: ShellType, name: &str, expansion: &str) -> Option<String> {
        self.entries.insert(
            (shell, name.to_ascii_lowercase()),
            expansion.to_string(),
        )
    }

    /// Remove an entry. Returns false if it did not exist.
    pub fn remove(&mut self, shell: ShellType, name: &str) -> bool {
        self.entries
            .remove(&(shell, name.to_ascii_lowercase()))
            .is_some()
    }

    /// Sorted `(name, expansion)` pairs for one shell type.
    pub fn entries_for(&self, shell: ShellType) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = self
            .entries
            .iter()
            .filter(|((s, _), _)| *s == shell)
            .map(|((_, n), e)| (n.clone(), e.clone()))
            .collect();
        out.sort();
        out
    }

    /// Every entry as persistence records, sorted for stable output.
    pub fn records(&self) -> Vec<AliasRecord> {
        let mut out: Vec<AliasRecord> = self
            .entries
            .iter()
            .map(|((shell, name), expansion)| AliasRecord {
                shell: *shell,
                name: name.clone(),
                expansion: expansion.clone(),
            })
            .collect();
        out.sort_by(|a, b| (a.shell.label(), &a.name).cmp(&(b.shell.label(), &b.name)));
        out
    }
}

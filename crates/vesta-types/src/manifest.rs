//! Persisted configuration shapes.
//!
//! The engine itself never touches disk; the host loads these shapes and
//! hands the parsed data to the engine. Aliases persist as a TOML file of
//! `[[alias]]` tables, mod command exports as a JSON manifest.

use serde::{Deserialize, Serialize};

use crate::shell::ShellType;

/// One persisted alias triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRecord {
    pub shell: ShellType,
    pub name: String,
    /// Expansion line; the first token must name a non-alias command.
    pub expansion: String,
}

/// On-disk alias store: a list of `[[alias]]` tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AliasFile {
    #[serde(default, rename = "alias")]
    pub aliases: Vec<AliasRecord>,
}

impl AliasFile {
    pub fn from_toml(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// A mod's exported command surface, as declared in its JSON manifest.
///
/// Only the declarative command table is modeled here; how the mod's code
/// is located and loaded is the mod loader's concern.
#[derive(Debug, Clone, Deserialize)]
pub struct ModManifest {
    /// Source id used for registration and bulk removal.
    pub id: String,
    #[serde(default)]
    pub commands: Vec<ModCommand>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModCommand {
    pub shell: ShellType,
    pub name: String,
    pub help_key: String,
    /// Requires administrator privilege.
    #[serde(default)]
    pub strict: bool,
    /// Argument shapes; an empty list means "no arguments".
    #[serde(default)]
    pub variants: Vec<ModVariant>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModVariant {
    /// Positional part specs: `<name>` required, `[name]` optional,
    /// a trailing `...` marks the part repeatable.
    #[serde(default)]
    pub parts: Vec<String>,
    /// Switch names; a trailing `=` marks the switch value-taking.
    #[serde(default)]
    pub switches: Vec<String>,
}

impl ModManifest {
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }
}

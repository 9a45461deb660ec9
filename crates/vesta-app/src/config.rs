//! Configuration loading and saving.
//!
//! All disk I/O for the engine's collaborators lives here: the alias
//! store (TOML), the message catalog (TOML), and the optional mod
//! manifest (JSON). The engine only ever sees parsed data.

use std::path::{Path, PathBuf};

use anyhow::Context;
use vesta_types::locale::Catalog;
use vesta_types::manifest::{AliasFile, AliasRecord, ModManifest};

/// Embedded default catalog, used when the config dir has no `en.toml`.
const DEFAULT_CATALOG: &str = include_str!("../locale/en.toml");

/// Well-known file locations under the config directory.
pub struct Paths {
    dir: PathBuf,
}

impl Paths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn aliases(&self) -> PathBuf {
        self.dir.join("aliases.toml")
    }

    pub fn catalog(&self) -> PathBuf {
        self.dir.join("en.toml")
    }

    pub fn mods(&self) -> PathBuf {
        self.dir.join("mods.json")
    }
}

/// Load the message catalog, falling back to the embedded default.
pub fn load_catalog(path: &Path) -> anyhow::Result<Catalog> {
    let source = if path.is_file() {
        std::fs::read_to_string(path)
            .with_context(|| format!("reading catalog {}", path.display()))?
    } else {
        DEFAULT_CATALOG.to_string()
    };
    Catalog::from_toml(&source).with_context(|| format!("parsing catalog {}", path.display()))
}

/// Load persisted aliases; a missing file is an empty store.
pub fn load_aliases(path: &Path) -> anyhow::Result<Vec<AliasRecord>> {
    if !path.is_file() {
        return Ok(Vec::new());
    }
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("reading aliases {}", path.display()))?;
    let file = AliasFile::from_toml(&source)
        .with_context(|| format!("parsing aliases {}", path.display()))?;
    Ok(file.aliases)
}

/// Persist the alias store.
pub fn save_aliases(path: &Path, records: Vec<AliasRecord>) -> anyhow::Result<()> {
    let file = AliasFile { aliases: records };
    let body = file.to_toml().context("serializing aliases")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(path, body).with_context(|| format!("writing aliases {}", path.display()))
}

/// Load the mod manifest if one is present.
pub fn load_mod_manifest(path: &Path) -> anyhow::Result<Option<ModManifest>> {
    if !path.is_file() {
        return Ok(None);
    }
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("reading mod manifest {}", path.display()))?;
    let manifest = ModManifest::from_json(&source)
        .with_context(|| format!("parsing mod manifest {}", path.display()))?;
    Ok(Some(manifest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_parses_and_covers_error_keys() {
        let cat = Catalog::from_toml(DEFAULT_CATALOG).unwrap();
        use vesta_types::locale::Translate;
        assert_eq!(cat.translate("error.command_not_found"), "Unknown command");
        assert_ne!(cat.translate("error.mail"), "error.mail");
    }

    #[test]
    fn alias_round_trip_through_disk() {
        use vesta_types::shell::ShellType;
        let dir = std::env::temp_dir().join("vesta-config-test");
        let path = dir.join("aliases.toml");
        let records = vec![AliasRecord {
            shell: ShellType::Shell,
            name: "ll".into(),
            expansion: "list -showdetails".into(),
        }];
        save_aliases(&path, records.clone()).unwrap();
        assert_eq!(load_aliases(&path).unwrap(), records);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_files_are_tolerated() {
        let path = Path::new("/nonexistent/vesta/aliases.toml");
        assert!(load_aliases(path).unwrap().is_empty());
        assert!(load_mod_manifest(Path::new("/nonexistent/mods.json"))
            .unwrap()
            .is_none());
        assert!(load_catalog(Path::new("/nonexistent/en.toml")).is_ok());
    }
}

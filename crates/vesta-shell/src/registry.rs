//! Command registries and the shared registry service.
//!
//! One partition per shell type plus the cross-shell unified partition.
//! Partitions are internally split by origin so a mod or addon can be
//! removed in bulk without disturbing built-ins. Lookup precedence is
//! fixed: BuiltIn, then Mod, then Addon, then Unified; first match wins,
//! so a loaded mod can never shadow a built-in of the same name.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use vesta_types::error::{Result, ShellError};
use vesta_types::manifest::AliasRecord;
use vesta_types::shell::{Origin, OriginMask, ShellType};

use crate::alias::AliasTable;
use crate::descriptor::CommandDescriptor;

/// Per-shell-type command storage, partitioned by origin.
#[derive(Default)]
struct Partition {
    builtins: HashMap<String, Arc<CommandDescriptor>>,
    mods: HashMap<String, Arc<CommandDescriptor>>,
    addons: HashMap<String, Arc<CommandDescriptor>>,
}

impl Partition {
    fn lookup(&self, name: &str) -> Option<&Arc<CommandDescriptor>> {
        self.builtins
            .get(name)
            .or_else(|| self.mods.get(name))
            .or_else(|| self.addons.get(name))
    }

    fn retain_source(&mut self, origin: Origin, source_id: &str) -> usize {
        let slot = match origin {
            Origin::Mod => &mut self.mods,
            Origin::Addon => &mut self.addons,
            _ => return 0,
        };
        let before = slot.len();
        slot.retain(|_, d| d.source_id() != Some(source_id));
        before - slot.len()
    }
}

/// Shared, process-wide command resolution state.
///
/// Sessions hold this behind an `Arc`; reads may run concurrently from
/// many sessions while writes (mod load/unload, alias changes) take the
/// affected partition's write lock.
pub struct RegistryService {
    shells: [RwLock<Partition>; ShellType::ALL.len()],
    unified: RwLock<HashMap<String, Arc<CommandDescriptor>>>,
    aliases: RwLock<AliasTable>,
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn shell_index(shell: ShellType) -> usize {
    match shell {
        ShellType::Shell => 0,
        ShellType::Mail => 1,
        ShellType::Admin => 2,
        ShellType::HexEdit => 3,
    }
}

impl RegistryService {
    pub fn new() -> Self {
        Self {
            shells: std::array::from_fn(|_| RwLock::new(Partition::default())),
            unified: RwLock::new(HashMap::new()),
            aliases: RwLock::new(AliasTable::new()),
        }
    }

    fn partition(&self, shell: ShellType) -> &RwLock<Partition> {
        &self.shells[shell_index(shell)]
    }

    // -- Registration --

    /// Add a descriptor, routed by its origin. Mod and addon descriptors
    /// must carry a source id so they can be unloaded later.
    pub fn register(&self, desc: CommandDescriptor) -> Result<()> {
        let name = desc.name().to_string();
        let origin = desc.origin();
        match origin {
            Origin::BuiltIn | Origin::Mod | Origin::Addon => {
                let Some(shell) = desc.shell() else {
                    return Err(ShellError::Config(format!(
                        "command '{name}' has no owning shell type"
                    )));
                };
                if matches!(origin, Origin::Mod | Origin::Addon) && desc.source_id().is_none() {
                    return Err(ShellError::Config(format!(
                        "{} command '{name}' has no source id",
                        origin.label()
                    )));
                }
                let mut part = write(self.partition(shell));
                let slot = match origin {
                    Origin::BuiltIn => &mut part.builtins,
                    Origin::Mod => &mut part.mods,
                    _ => &mut part.addons,
                };
                slot.insert(name.clone(), Arc::new(desc));
                log::debug!("registered {} command '{shell}:{name}'", origin.label());
                Ok(())
            },
            Origin::Unified => {
                if desc.shell().is_some() {
                    return Err(ShellError::Config(format!(
                        "unified command '{name}' must not name an owning shell type"
                    )));
                }
                write(&self.unified).insert(name.clone(), Arc::new(desc));
                log::debug!("registered unified command '{name}'");
                Ok(())
            },
            Origin::Alias => Err(ShellError::Config(format!(
                "'{name}': aliases are managed through the alias table"
            ))),
        }
    }

    /// Remove every descriptor of one origin contributed by `source_id`.
    /// Every partition is locked before the sweep starts, so a concurrent
    /// lookup never observes a half-removed source in any shell type.
    pub fn remove_all_from_origin(&self, origin: Origin, source_id: &str) -> usize {
        let mut parts: Vec<_> = self.shells.iter().map(write).collect();
        parts
            .iter_mut()
            .map(|part| part.retain_source(origin, source_id))
            .sum()
    }

    /// The mod loader's unload surface: sweeps both removable origins,
    /// with all partitions locked for the duration of the sweep.
    pub fn unregister_all(&self, source_id: &str) -> usize {
        let mut parts: Vec<_> = self.shells.iter().map(write).collect();
        let mut removed = 0;
        for part in parts.iter_mut() {
            removed += part.retain_source(Origin::Mod, source_id);
            removed += part.retain_source(Origin::Addon, source_id);
        }
        drop(parts);
        if removed > 0 {
            log::info!("unregistered {removed} command(s) from source '{source_id}'");
        }
        removed
    }

    // -- Lookup --

    /// Precedence-ordered lookup: BuiltIn, Mod, Addon, then Unified.
    pub fn lookup(&self, shell: ShellType, name: &str) -> Option<Arc<CommandDescriptor>> {
        let name = name.to_ascii_lowercase();
        if let Some(desc) = read(self.partition(shell)).lookup(&name) {
            return Some(Arc::clone(desc));
        }
        read(&self.unified).get(&name).map(Arc::clone)
    }

    /// Every descriptor visible in `shell` under the origin mask, with
    /// precedence-shadowed duplicates removed. Unsorted.
    pub fn list(&self, shell: ShellType, mask: OriginMask) -> Vec<Arc<CommandDescriptor>> {
        let mut seen: HashMap<String, Arc<CommandDescriptor>> = HashMap::new();
        {
            let part = read(self.partition(shell));
            for (include, slot) in [
                (mask.contains(OriginMask::BUILTIN), &part.builtins),
                (mask.contains(OriginMask::MOD), &part.mods),
                (mask.contains(OriginMask::ADDON), &part.addons),
            ] {
                if !include {
                    continue;
                }
                for (name, desc) in slot {
                    seen.entry(name.clone()).or_insert_with(|| Arc::clone(desc));
                }
            }
        }
        if mask.contains(OriginMask::UNIFIED) {
            for (name, desc) in read(&self.unified).iter() {
                seen.entry(name.clone()).or_insert_with(|| Arc::clone(desc));
            }
        }
        seen.into_values().collect()
    }

    // -- Alias surface --

    /// Expansion line for an alias in `shell`, if one is defined.
    pub fn resolve_alias(&self, shell: ShellType, name: &str) -> Option<String> {
        read(&self.aliases)
            .resolve(shell, name)
            .map(str::to_string)
    }

    /// Define an alias. Fails fast if the name collides with any
    /// non-alias command visible in the same shell type.
    pub fn add_alias(&self, shell: ShellType, name: &str, expansion: &str) -> Result<()> {
        let name = name.trim();
        let expansion = expansion.trim();
        if name.is_empty() || expansion.is_empty() {
            return Err(ShellError::Config(
                "alias needs a name and an expansion".to_string(),
            ));
        }
        if self.lookup(shell, name).is_some() {
            return Err(ShellError::Config(format!(
                "alias '{name}' collides with an existing {shell} command"
            )));
        }
        write(&self.aliases).insert(shell, name, expansion);
        Ok(())
    }

    /// Remove an alias. Removing an unknown alias is reported as a
    /// failure, not ignored.
    pub fn remove_alias(&self, shell: ShellType, name: &str) -> Result<()> {
        if write(&self.aliases).remove(shell, name) {
            Ok(())
        } else {
            Err(ShellError::Config(format!("no such alias: {name}")))
        }
    }

    /// Load persisted alias triples. Entries that collide with a command
    /// are skipped with a warning rather than aborting the whole load.
    pub fn seed_aliases(&self, records: &[AliasRecord]) -> usize {
        let mut loaded = 0;
        for record in records {
            match self.add_alias(record.shell, &record.name, &record.expansion) {
                Ok(()) => loaded += 1,
                Err(e) => log::warn!("skipping persisted alias '{}': {e}", record.name),
            }
        }
        loaded
    }

    /// Sorted `(name, expansion)` pairs for one shell type.
    pub fn aliases_for(&self, shell: ShellType) -> Vec<(String, String)> {
        read(&self.aliases).entries_for(shell)
    }

    /// Snapshot of every alias for persistence.
    pub fn alias_records(&self) -> Vec<AliasRecord> {
        read(&self.aliases).records()
    }
}

impl Default for RegistryService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{CommandHandler, CommandInvocation};

    struct Nop;
    impl CommandHandler for Nop {
        fn run(&self, _inv: &mut CommandInvocation) -> Result<i32> {
            Ok(0)
        }
    }

    fn builtin(shell: ShellType, name: &str) -> CommandDescriptor {
        CommandDescriptor::new(shell, name, "help.test", Arc::new(Nop))
    }

    #[test]
    fn lookup_sees_descriptor_immediately_after_register() {
        let reg = RegistryService::new();
        reg.register(builtin(ShellType::Shell, "list")).unwrap();
        let found = reg.lookup(ShellType::Shell, "list").unwrap();
        assert_eq!(found.name(), "list");
        assert_eq!(found.origin(), Origin::BuiltIn);
    }

    #[test]
    fn lookup_is_per_shell_type() {
        let reg = RegistryService::new();
        reg.register(builtin(ShellType::Mail, "send")).unwrap();
        assert!(reg.lookup(ShellType::Mail, "send").is_some());
        assert!(reg.lookup(ShellType::Shell, "send").is_none());
    }

    #[test]
    fn builtin_always_wins_over_mod() {
        let reg = RegistryService::new();
        reg.register(builtin(ShellType::Shell, "shutdown")).unwrap();
        reg.register(
            builtin(ShellType::Shell, "shutdown").from_mod("evilmod"),
        )
        .unwrap();
        let found = reg.lookup(ShellType::Shell, "shutdown").unwrap();
        assert_eq!(found.origin(), Origin::BuiltIn);
    }

    #[test]
    fn mod_wins_over_addon_and_unified_is_last() {
        let reg = RegistryService::new();
        reg.register(CommandDescriptor::unified("probe", "k", Arc::new(Nop)))
            .unwrap();
        reg.register(builtin(ShellType::Shell, "probe").from_addon("pack"))
            .unwrap();
        assert_eq!(
            reg.lookup(ShellType::Shell, "probe").unwrap().origin(),
            Origin::Addon
        );

        reg.register(builtin(ShellType::Shell, "probe").from_mod("m1"))
            .unwrap();
        assert_eq!(
            reg.lookup(ShellType::Shell, "probe").unwrap().origin(),
            Origin::Mod
        );
    }

    #[test]
    fn unified_visible_in_every_shell() {
        let reg = RegistryService::new();
        reg.register(CommandDescriptor::unified("exit", "k", Arc::new(Nop)))
            .unwrap();
        for shell in ShellType::ALL {
            assert!(reg.lookup(shell, "exit").is_some());
        }
    }

    #[test]
    fn unregister_all_removes_every_trace_of_a_source() {
        let reg = RegistryService::new();
        reg.register(builtin(ShellType::Shell, "portscan").from_mod("netpack"))
            .unwrap();
        reg.register(builtin(ShellType::Admin, "fwflush").from_mod("netpack"))
            .unwrap();
        reg.register(builtin(ShellType::Shell, "trace").from_addon("netpack"))
            .unwrap();
        reg.register(builtin(ShellType::Shell, "other").from_mod("keepme"))
            .unwrap();

        assert_eq!(reg.unregister_all("netpack"), 3);

        for shell in ShellType::ALL {
            for desc in reg.list(shell, OriginMask::all()) {
                assert_ne!(desc.source_id(), Some("netpack"));
            }
        }
        assert!(reg.lookup(ShellType::Shell, "other").is_some());
    }

    #[test]
    fn remove_all_from_origin_is_origin_scoped() {
        let reg = RegistryService::new();
        reg.register(builtin(ShellType::Shell, "a").from_mod("pack"))
            .unwrap();
        reg.register(builtin(ShellType::Shell, "b").from_addon("pack"))
            .unwrap();
        assert_eq!(reg.remove_all_from_origin(Origin::Mod, "pack"), 1);
        assert!(reg.lookup(ShellType::Shell, "a").is_none());
        assert!(reg.lookup(ShellType::Shell, "b").is_some());
    }

    #[test]
    fn unified_mod_tagging_is_rejected() {
        let reg = RegistryService::new();
        // A unified descriptor retagged as a mod has no owning shell and
        // cannot be placed in any partition.
        let err = reg
            .register(CommandDescriptor::unified("x", "k", Arc::new(Nop)).from_mod("pack"))
            .unwrap_err();
        assert!(matches!(err, ShellError::Config(_)));
    }

    #[test]
    fn alias_collision_fails_fast() {
        let reg = RegistryService::new();
        reg.register(builtin(ShellType::Shell, "list")).unwrap();
        let err = reg
            .add_alias(ShellType::Shell, "list", "echo hi")
            .unwrap_err();
        assert!(matches!(err, ShellError::Config(_)));
        // Same name is fine in a different shell type.
        reg.add_alias(ShellType::Mail, "list", "echo hi").unwrap();
    }

    #[test]
    fn alias_remove_reports_missing() {
        let reg = RegistryService::new();
        assert!(reg.remove_alias(ShellType::Shell, "nope").is_err());
        reg.add_alias(ShellType::Shell, "ll", "list").unwrap();
        assert!(reg.remove_alias(ShellType::Shell, "ll").is_ok());
    }

    #[test]
    fn alias_resolution_is_idempotent() {
        let reg = RegistryService::new();
        reg.add_alias(ShellType::Shell, "ll", "list -showdetails")
            .unwrap();
        let first = reg.resolve_alias(ShellType::Shell, "ll");
        let second = reg.resolve_alias(ShellType::Shell, "ll");
        assert_eq!(first, second);
        assert_eq!(first.as_deref(), Some("list -showdetails"));
    }

    #[test]
    fn seed_skips_colliding_records() {
        let reg = RegistryService::new();
        reg.register(builtin(ShellType::Shell, "list")).unwrap();
        let records = vec![
            AliasRecord {
                shell: ShellType::Shell,
                name: "ll".into(),
                expansion: "list -showdetails".into(),
            },
            AliasRecord {
                shell: ShellType::Shell,
                name: "list".into(),
                expansion: "echo shadowed".into(),
            },
        ];
        assert_eq!(reg.seed_aliases(&records), 1);
        assert!(reg.resolve_alias(ShellType::Shell, "list").is_none());
    }

    #[test]
    fn list_respects_mask_and_precedence() {
        let reg = RegistryService::new();
        reg.register(builtin(ShellType::Shell, "list")).unwrap();
        reg.register(builtin(ShellType::Shell, "list").from_mod("pack"))
            .unwrap();
        reg.register(builtin(ShellType::Shell, "portscan").from_mod("pack"))
            .unwrap();
        reg.register(CommandDescriptor::unified("exit", "k", Arc::new(Nop)))
            .unwrap();

        let all = reg.list(ShellType::Shell, OriginMask::all());
        let mut names: Vec<&str> = all.iter().map(|d| d.name()).collect();
        names.sort_unstable();
        assert_eq!(names, ["exit", "list", "portscan"]);
        // The shadowed mod copy of `list` is not in the listing.
        let list_desc = all.iter().find(|d| d.name() == "list").unwrap();
        assert_eq!(list_desc.origin(), Origin::BuiltIn);

        let only_mods = reg.list(ShellType::Shell, OriginMask::MOD);
        let mut names: Vec<&str> = only_mods.iter().map(|d| d.name()).collect();
        names.sort_unstable();
        assert_eq!(names, ["list", "portscan"]);
    }
}

//! Mod registration from a declarative manifest.
//!
//! A manifest describes a mod's exported command table. Each entry is
//! registered with a stub handler that announces its provider; locating
//! and running real mod code is outside the host's scope.

use std::sync::Arc;

use vesta_shell::{
    ArgVariant, CommandDescriptor, CommandHandler, CommandInvocation, RegistryService,
};
use vesta_types::error::Result;
use vesta_types::flags::CommandFlags;
use vesta_types::manifest::{ModCommand, ModManifest};

/// Placeholder body for a manifest-declared command.
struct StubCmd {
    name: String,
    source: String,
}

impl CommandHandler for StubCmd {
    fn run(&self, inv: &mut CommandInvocation) -> Result<i32> {
        inv.emit(format!(
            "{}: provided by mod '{}' (stub)",
            self.name, self.source
        ));
        Ok(0)
    }
}

/// Register every command a manifest exports. Returns how many were
/// added.
pub fn register_manifest(registry: &RegistryService, manifest: &ModManifest) -> Result<usize> {
    for command in &manifest.commands {
        registry.register(descriptor(&manifest.id, command))?;
    }
    log::info!(
        "mod '{}' registered {} command(s)",
        manifest.id,
        manifest.commands.len()
    );
    Ok(manifest.commands.len())
}

fn descriptor(source_id: &str, command: &ModCommand) -> CommandDescriptor {
    let handler = Arc::new(StubCmd {
        name: command.name.clone(),
        source: source_id.to_string(),
    });
    let mut desc =
        CommandDescriptor::new(command.shell, &command.name, &command.help_key, handler)
            .from_mod(source_id);
    if command.strict {
        desc = desc.flags(CommandFlags::STRICT);
    }
    for variant in &command.variants {
        let mut v = ArgVariant::new();
        for part in &variant.parts {
            v = v.part(part);
        }
        for switch in &variant.switches {
            let (name, takes_value) = match switch.strip_suffix('=') {
                Some(stripped) => (stripped, true),
                None => (switch.as_str(), false),
            };
            v = v.switch(name, takes_value, &format!("{}.{name}", command.help_key));
        }
        desc = desc.variant(v);
    }
    desc
}

//! Help listings derived from the registries.
//!
//! A pure read layer: the same alias resolution and origin precedence as
//! dispatch, so `help <command>` always describes the descriptor that
//! would actually execute.

use vesta_types::error::{Result, ShellError};
use vesta_types::locale::Translate;
use vesta_types::shell::{OriginMask, ShellType};

use crate::descriptor::CommandDescriptor;
use crate::registry::RegistryService;
use crate::token::parse_line;

/// Sorted `(name, translated help line)` pairs for every command visible
/// in `shell` under the origin mask.
pub fn list_commands(
    registry: &RegistryService,
    shell: ShellType,
    mask: OriginMask,
    translator: &dyn Translate,
) -> Vec<(String, String)> {
    let mut entries: Vec<(String, String)> = registry
        .list(shell, mask)
        .iter()
        .map(|desc| {
            (
                desc.name().to_string(),
                translator.translate(desc.help_key()),
            )
        })
        .collect();
    entries.sort();
    entries
}

/// Rendered usage strings for a command name, after alias resolution.
pub fn usage(registry: &RegistryService, shell: ShellType, name: &str) -> Result<Vec<String>> {
    Ok(resolve(registry, shell, name)?.usages())
}

/// Full help block for one command: description, usage variants, and
/// switch help, each line ready to print.
pub fn describe(
    registry: &RegistryService,
    shell: ShellType,
    name: &str,
    translator: &dyn Translate,
) -> Result<Vec<String>> {
    let desc = resolve(registry, shell, name)?;
    let mut lines = Vec::new();
    lines.push(format!("{} ({})", desc.name(), desc.origin().label()));
    lines.push(format!("  {}", translator.translate(desc.help_key())));
    for usage in desc.usages() {
        lines.push(format!("  Usage: {usage}"));
    }
    let mut seen = std::collections::HashSet::new();
    for variant in desc.variants() {
        for sw in variant.switches() {
            if seen.insert(sw.name.clone()) {
                lines.push(format!(
                    "    -{}  {}",
                    sw.name,
                    translator.translate(&sw.help_key)
                ));
            }
        }
    }
    Ok(lines)
}

/// Alias-aware, precedence-aware descriptor resolution.
fn resolve(
    registry: &RegistryService,
    shell: ShellType,
    name: &str,
) -> Result<std::sync::Arc<CommandDescriptor>> {
    let mut target = name.to_ascii_lowercase();
    if let Some(expansion) = registry.resolve_alias(shell, &target)
        && let Ok(Some(parsed)) = parse_line(&expansion)
    {
        target = parsed.name;
    }
    registry
        .lookup(shell, &target)
        .ok_or(ShellError::CommandNotFound {
            name: name.to_string(),
        })
}

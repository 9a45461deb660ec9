//! VESTA_OS interactive entry point.
//!
//! Wires the shared registry service, loads configuration (aliases,
//! message catalog, optional mod manifest), and runs a main-shell
//! session over stdin/stdout. Aliases changed during the session are
//! persisted back on exit.

mod config;
mod mods;

use std::io;
use std::sync::Arc;

use anyhow::Result;

use vesta_shell::{KernelState, RegistryService, ShellSession, register_builtins};
use vesta_types::flags::UserFlags;
use vesta_types::shell::ShellType;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Config dir from CLI arg or VESTA_CONFIG, defaulting to ./config.
    let mut admin = false;
    let mut dir: Option<String> = None;
    for arg in std::env::args().skip(1) {
        if arg == "--admin" {
            admin = true;
        } else {
            dir = Some(arg);
        }
    }
    let dir = dir
        .or_else(|| std::env::var("VESTA_CONFIG").ok())
        .unwrap_or_else(|| "config".to_string());
    let paths = config::Paths::new(&dir);

    let registry = Arc::new(RegistryService::new());
    let kernel = Arc::new(KernelState::new());
    register_builtins(&registry, &kernel)?;

    let catalog = Arc::new(config::load_catalog(&paths.catalog())?);

    let aliases = config::load_aliases(&paths.aliases())?;
    let seeded = registry.seed_aliases(&aliases);
    log::info!("Loaded {seeded} alias(es) from {dir}");

    if let Some(manifest) = config::load_mod_manifest(&paths.mods())? {
        mods::register_manifest(&registry, &manifest)?;
    }

    let user = if admin {
        UserFlags::ADMINISTRATOR
    } else {
        UserFlags::empty()
    };
    log::info!(
        "Starting VESTA_OS main shell ({})",
        if admin { "administrator" } else { "regular user" }
    );

    let mut session = ShellSession::new(
        ShellType::Shell,
        Arc::clone(&registry),
        kernel,
        catalog,
        user,
    );
    let stdin = io::stdin();
    let stdout = io::stdout();
    session.run(&mut stdin.lock(), &mut stdout.lock())?;

    if let Err(e) = config::save_aliases(&paths.aliases(), registry.alias_records()) {
        log::warn!("could not persist aliases: {e:#}");
    }
    log::info!("Session ended with code {}", session.last_code());
    Ok(())
}

//! Command resolution and execution engine for VESTA_OS.
//!
//! Every shell type shares one engine: commands are declared as
//! descriptors in origin-partitioned registries, input lines run through
//! a fixed pipeline (tokenize, alias resolution, precedence-ordered
//! lookup, schema validation, permission/maintenance gating, invocation),
//! and every failure lands in a typed outcome with a reserved exit code.

mod alias;
mod descriptor;
mod dispatch;
mod gate;
mod help;
mod kernel;
mod registry;
mod schema;
mod session;
mod token;

pub mod admin_commands;
pub mod hexedit_commands;
pub mod mail_commands;
pub mod shell_commands;
pub mod unified_commands;

/// Positional/switch schema of one command usage form.
pub use descriptor::ArgVariant;
/// The declarative schema for one command.
pub use descriptor::CommandDescriptor;
/// A command body invoked by the dispatcher.
pub use descriptor::CommandHandler;
/// Arguments, switches, and effect channel handed to a handler.
pub use descriptor::CommandInvocation;
/// Session effect a handler may request (terminate, enter shell).
pub use descriptor::SessionEffect;
pub use descriptor::{ArgPart, SuggestFn, SwitchDescriptor};
/// Outcome of dispatching one input line.
pub use dispatch::DispatchOutcome;
/// The per-session dispatch engine.
pub use dispatch::Dispatcher;
pub use gate::authorize;
pub use help::{describe, list_commands, usage};
/// Process-wide kernel switches (maintenance mode).
pub use kernel::KernelState;
/// Shared command/alias registries with origin precedence.
pub use registry::RegistryService;
pub use schema::{MatchedArgs, match_variants};
/// A read-evaluate loop bound to one shell type.
pub use session::{EvalResult, ShellSession};
pub use token::{SwitchToken, TokenizedLine, parse_line, tokenize};

use std::sync::Arc;

use vesta_types::error::Result;

/// Register every built-in and unified vocabulary.
pub fn register_builtins(registry: &RegistryService, kernel: &Arc<KernelState>) -> Result<()> {
    shell_commands::register_shell_commands(registry, kernel)?;
    mail_commands::register_mail_commands(registry)?;
    admin_commands::register_admin_commands(registry, kernel)?;
    hexedit_commands::register_hexedit_commands(registry)?;
    unified_commands::register_unified_commands(registry, kernel)?;
    Ok(())
}

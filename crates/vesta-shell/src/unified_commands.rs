//! Unified commands, available identically in every shell type.

use std::sync::Arc;

use vesta_types::error::Result;
use vesta_types::flags::CommandFlags;

use crate::descriptor::{CommandDescriptor, CommandHandler, CommandInvocation};
use crate::kernel::KernelState;
use crate::registry::RegistryService;

/// Register the cross-shell command set.
pub fn register_unified_commands(reg: &RegistryService, kernel: &Arc<KernelState>) -> Result<()> {
    reg.register(
        CommandDescriptor::unified("exit", "help.unified.exit", Arc::new(ExitCmd))
            .flags(CommandFlags::NO_MAINTENANCE),
    )?;
    reg.register(
        CommandDescriptor::unified("logout", "help.unified.logout", Arc::new(ExitCmd))
            .flags(CommandFlags::NO_MAINTENANCE),
    )?;
    reg.register(
        CommandDescriptor::unified(
            "kernel",
            "help.unified.kernel",
            Arc::new(KernelCmd {
                kernel: Arc::clone(kernel),
            }),
        )
        .flags(CommandFlags::NO_MAINTENANCE | CommandFlags::WRAPPABLE),
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// exit / logout
// ---------------------------------------------------------------------------

struct ExitCmd;
impl CommandHandler for ExitCmd {
    fn run(&self, inv: &mut CommandInvocation) -> Result<i32> {
        inv.request_exit();
        Ok(0)
    }
}

// ---------------------------------------------------------------------------
// kernel
// ---------------------------------------------------------------------------

struct KernelCmd {
    kernel: Arc<KernelState>,
}
impl CommandHandler for KernelCmd {
    fn run(&self, inv: &mut CommandInvocation) -> Result<i32> {
        inv.emit("VESTA_OS kernel 0.1.0");
        inv.emit(format!(
            "maintenance: {}",
            if self.kernel.in_maintenance() {
                "on"
            } else {
                "off"
            }
        ));
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use vesta_types::flags::UserFlags;
    use vesta_types::shell::ShellType;

    use super::*;
    use crate::descriptor::SessionEffect;
    use crate::dispatch::{DispatchOutcome, Dispatcher};

    fn engine() -> Dispatcher {
        let reg = Arc::new(RegistryService::new());
        let kernel = Arc::new(KernelState::new());
        register_unified_commands(&reg, &kernel).unwrap();
        Dispatcher::new(reg, kernel)
    }

    #[test]
    fn exit_works_in_every_shell_type() {
        let d = engine();
        for shell in ShellType::ALL {
            let mut vars = HashMap::new();
            match d.dispatch(shell, "exit", UserFlags::empty(), &mut vars) {
                DispatchOutcome::Completed { effect, .. } => {
                    assert_eq!(effect, SessionEffect::Terminate);
                },
                other => panic!("unexpected in {shell}: {other:?}"),
            }
        }
    }

    #[test]
    fn kernel_reports_during_maintenance() {
        let d = engine();
        d.kernel().set_maintenance(true);
        let mut vars = HashMap::new();
        let out = d.dispatch(ShellType::Mail, "kernel", UserFlags::empty(), &mut vars);
        match out {
            DispatchOutcome::Completed { lines, code, .. } => {
                assert_eq!(code, 0);
                assert!(lines.iter().any(|l| l.contains("maintenance: on")));
            },
            other => panic!("unexpected: {other:?}"),
        }
    }
}

//! Built-in commands of the main shell.

use std::sync::Arc;

use vesta_types::error::{Result, ShellError};
use vesta_types::flags::CommandFlags;
use vesta_types::shell::ShellType;

use crate::descriptor::{ArgVariant, CommandDescriptor, CommandHandler, CommandInvocation};
use crate::kernel::KernelState;
use crate::registry::RegistryService;

/// Register the main shell vocabulary.
pub fn register_shell_commands(reg: &RegistryService, kernel: &Arc<KernelState>) -> Result<()> {
    reg.register(
        CommandDescriptor::new(ShellType::Shell, "echo", "help.shell.echo", Arc::new(EchoCmd))
            .variant(ArgVariant::new().part("[text...]"))
            .flags(CommandFlags::REDIRECTION | CommandFlags::WRAPPABLE),
    )?;
    reg.register(
        CommandDescriptor::new(
            ShellType::Shell,
            "hostname",
            "help.shell.hostname",
            Arc::new(HostnameCmd {
                name: "vesta-01".to_string(),
            }),
        )
        .flags(CommandFlags::SETS_VARIABLE | CommandFlags::REDIRECTION),
    )?;
    reg.register(
        CommandDescriptor::new(
            ShellType::Shell,
            "probe",
            "help.shell.probe",
            Arc::new(ProbeCmd),
        )
        .variant(
            ArgVariant::new()
                .part("<device>")
                .switch("full", false, "help.shell.probe.full"),
        )
        .flags(CommandFlags::REDIRECTION | CommandFlags::WRAPPABLE),
    )?;
    reg.register(
        CommandDescriptor::new(
            ShellType::Shell,
            "status",
            "help.shell.status",
            Arc::new(StatusCmd {
                kernel: Arc::clone(kernel),
            }),
        )
        .flags(CommandFlags::NO_MAINTENANCE | CommandFlags::WRAPPABLE),
    )?;
    reg.register(CommandDescriptor::new(
        ShellType::Shell,
        "mail",
        "help.shell.mail",
        Arc::new(EnterCmd(ShellType::Mail)),
    ))?;
    reg.register(
        CommandDescriptor::new(
            ShellType::Shell,
            "admin",
            "help.shell.admin",
            Arc::new(EnterCmd(ShellType::Admin)),
        )
        .flags(CommandFlags::STRICT),
    )?;
    reg.register(CommandDescriptor::new(
        ShellType::Shell,
        "hexedit",
        "help.shell.hexedit",
        Arc::new(EnterCmd(ShellType::HexEdit)),
    ))?;
    reg.register(
        CommandDescriptor::new(
            ShellType::Shell,
            "shutdown",
            "help.shell.shutdown",
            Arc::new(ShutdownCmd),
        )
        .flags(CommandFlags::STRICT),
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// echo
// ---------------------------------------------------------------------------

struct EchoCmd;
impl CommandHandler for EchoCmd {
    fn run(&self, inv: &mut CommandInvocation) -> Result<i32> {
        inv.emit(inv.args.join(" "));
        Ok(0)
    }
}

// ---------------------------------------------------------------------------
// hostname
// ---------------------------------------------------------------------------

struct HostnameCmd {
    name: String,
}
impl CommandHandler for HostnameCmd {
    fn run(&self, inv: &mut CommandInvocation) -> Result<i32> {
        inv.emit(self.name.clone());
        inv.set_output(self.name.clone());
        Ok(0)
    }
}

// ---------------------------------------------------------------------------
// probe
// ---------------------------------------------------------------------------

struct ProbeCmd;
impl CommandHandler for ProbeCmd {
    fn run(&self, inv: &mut CommandInvocation) -> Result<i32> {
        let device = inv.arg(0).unwrap_or_default().to_string();
        let summary = match device.as_str() {
            "cpu" => "cpu0: 333 MHz, 2 cores, thermal nominal",
            "mem" => "mem: 32768 KiB total, 20992 KiB free",
            "usb" => "usb: bus powered, no device attached",
            other => {
                return Err(ShellError::Hardware(format!("unknown device: {other}")));
            },
        };
        inv.emit(summary);
        if inv.has_switch("full") {
            inv.emit(format!("{device}: firmware rev 2.3, diagnostics passed"));
        }
        Ok(0)
    }
}

// ---------------------------------------------------------------------------
// status
// ---------------------------------------------------------------------------

struct StatusCmd {
    kernel: Arc<KernelState>,
}
impl CommandHandler for StatusCmd {
    fn run(&self, inv: &mut CommandInvocation) -> Result<i32> {
        inv.emit("VESTA_OS v0.1.0");
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

// ---------------------------------------------------------------------------
// mail / admin / hexedit entry
// ---------------------------------------------------------------------------

struct EnterCmd(ShellType);
impl CommandHandler for EnterCmd {
    fn run(&self, inv: &mut CommandInvocation) -> Result<i32> {
        inv.emit(format!("Entering {} shell.", self.0));
        inv.enter_shell(self.0);
        Ok(0)
    }
}

// ---------------------------------------------------------------------------
// shutdown
// ---------------------------------------------------------------------------

struct ShutdownCmd;
impl CommandHandler for ShutdownCmd {
    fn run(&self, inv: &mut CommandInvocation) -> Result<i32> {
        inv.emit("System is going down.");
        inv.request_exit();
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use vesta_types::error::ErrorKind;
    use vesta_types::flags::UserFlags;

    use super::*;
    use crate::descriptor::SessionEffect;
    use crate::dispatch::{DispatchOutcome, Dispatcher};

    fn engine() -> Dispatcher {
        let reg = Arc::new(RegistryService::new());
        let kernel = Arc::new(KernelState::new());
        register_shell_commands(&reg, &kernel).unwrap();
        Dispatcher::new(reg, kernel)
    }

    fn run(d: &Dispatcher, line: &str, user: UserFlags) -> DispatchOutcome {
        let mut vars = HashMap::new();
        d.dispatch(ShellType::Shell, line, user, &mut vars)
    }

    #[test]
    fn echo_joins_arguments() {
        let d = engine();
        match run(&d, "echo one two", UserFlags::empty()) {
            DispatchOutcome::Completed { lines, .. } => assert_eq!(lines, ["one two"]),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn probe_known_and_unknown_devices() {
        let d = engine();
        assert!(run(&d, "probe cpu", UserFlags::empty()).is_success());
        let out = run(&d, "probe flux", UserFlags::empty());
        assert_eq!(out.exit_code(), ErrorKind::Hardware.exit_code());
    }

    #[test]
    fn probe_full_switch_adds_detail() {
        let d = engine();
        match run(&d, "probe cpu -full", UserFlags::empty()) {
            DispatchOutcome::Completed { lines, .. } => {
                assert_eq!(lines.len(), 2);
                assert!(lines[1].contains("firmware"));
            },
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn hostname_fills_the_output_slot() {
        let d = engine();
        let mut vars = HashMap::new();
        let out = d.dispatch(
            ShellType::Shell,
            "host = hostname",
            UserFlags::empty(),
            &mut vars,
        );
        assert!(out.is_success());
        assert_eq!(vars.get("host").map(String::as_str), Some("vesta-01"));
    }

    #[test]
    fn admin_entry_is_strict() {
        let d = engine();
        let out = run(&d, "admin", UserFlags::empty());
        assert_eq!(out.exit_code(), ErrorKind::InsufficientPrivilege.exit_code());
        match run(&d, "admin", UserFlags::ADMINISTRATOR) {
            DispatchOutcome::Completed { effect, .. } => {
                assert_eq!(effect, SessionEffect::EnterShell(ShellType::Admin));
            },
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn status_is_maintenance_exempt() {
        let d = engine();
        d.kernel().set_maintenance(true);
        assert!(run(&d, "status", UserFlags::empty()).is_success());
        let out = run(&d, "echo blocked", UserFlags::empty());
        assert_eq!(out.exit_code(), ErrorKind::MaintenanceMode.exit_code());
    }

    #[test]
    fn shutdown_requests_termination() {
        let d = engine();
        match run(&d, "shutdown", UserFlags::ADMINISTRATOR) {
            DispatchOutcome::Completed { effect, .. } => {
                assert_eq!(effect, SessionEffect::Terminate);
            },
            other => panic!("unexpected: {other:?}"),
        }
    }
}

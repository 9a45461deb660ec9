//! Built-in commands of the administrative shell.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use vesta_types::error::{Result, ShellError};
use vesta_types::flags::{CommandFlags, UserFlags};
use vesta_types::shell::ShellType;

use crate::descriptor::{ArgVariant, CommandDescriptor, CommandHandler, CommandInvocation};
use crate::kernel::KernelState;
use crate::registry::RegistryService;

/// In-memory account table shared by the admin shell's commands.
#[derive(Debug, Default)]
pub struct UserStore {
    accounts: RwLock<BTreeMap<String, UserFlags>>,
}

impl UserStore {
    fn with_demo_content() -> Self {
        let store = Self::default();
        {
            let mut accounts = store.lock();
            accounts.insert("root".to_string(), UserFlags::ADMINISTRATOR);
            accounts.insert("guest".to_string(), UserFlags::empty());
        }
        store
    }

    fn lock(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, UserFlags>> {
        self.accounts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Register the admin shell vocabulary.
pub fn register_admin_commands(reg: &RegistryService, kernel: &Arc<KernelState>) -> Result<()> {
    let store = Arc::new(UserStore::with_demo_content());
    reg.register(
        CommandDescriptor::new(
            ShellType::Admin,
            "users",
            "help.admin.users",
            Arc::new(UsersCmd {
                store: Arc::clone(&store),
            }),
        )
        .flags(CommandFlags::REDIRECTION | CommandFlags::WRAPPABLE),
    )?;
    reg.register(
        CommandDescriptor::new(
            ShellType::Admin,
            "grant",
            "help.admin.grant",
            Arc::new(GrantCmd {
                store: Arc::clone(&store),
                grant: true,
            }),
        )
        .variant(ArgVariant::new().part("<user>"))
        .flags(CommandFlags::STRICT),
    )?;
    reg.register(
        CommandDescriptor::new(
            ShellType::Admin,
            "revoke",
            "help.admin.revoke",
            Arc::new(GrantCmd {
                store,
                grant: false,
            }),
        )
        .variant(ArgVariant::new().part("<user>"))
        .flags(CommandFlags::STRICT),
    )?;
    reg.register(
        CommandDescriptor::new(
            ShellType::Admin,
            "maintenance",
            "help.admin.maintenance",
            Arc::new(MaintenanceCmd {
                kernel: Arc::clone(kernel),
            }),
        )
        .variant(ArgVariant::new().part("<state>"))
        .flags(CommandFlags::STRICT | CommandFlags::NO_MAINTENANCE),
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// users
// ---------------------------------------------------------------------------

struct UsersCmd {
    store: Arc<UserStore>,
}
impl CommandHandler for UsersCmd {
    fn run(&self, inv: &mut CommandInvocation) -> Result<i32> {
        let accounts = self.store.lock();
        for (name, flags) in accounts.iter() {
            let role = if flags.contains(UserFlags::ADMINISTRATOR) {
                "administrator"
            } else {
                "user"
            };
            inv.emit(format!("{name:10} {role}"));
        }
        Ok(0)
    }
}

// ---------------------------------------------------------------------------
// grant / revoke
// ---------------------------------------------------------------------------

struct GrantCmd {
    store: Arc<UserStore>,
    grant: bool,
}
impl CommandHandler for GrantCmd {
    fn run(&self, inv: &mut CommandInvocation) -> Result<i32> {
        let name = inv.arg(0).unwrap_or_default().to_string();
        if !self.grant && name == "root" {
            return Err(ShellError::Users(
                "the root account cannot be demoted".to_string(),
            ));
        }
        let mut accounts = self.store.lock();
        let Some(flags) = accounts.get_mut(&name) else {
            return Err(ShellError::Users(format!("no such account: {name}")));
        };
        flags.set(UserFlags::ADMINISTRATOR, self.grant);
        inv.emit(format!(
            "{name} is now {}",
            if self.grant { "an administrator" } else { "a regular user" }
        ));
        Ok(0)
    }
}

// ---------------------------------------------------------------------------
// maintenance
// ---------------------------------------------------------------------------

struct MaintenanceCmd {
    kernel: Arc<KernelState>,
}
impl CommandHandler for MaintenanceCmd {
    fn run(&self, inv: &mut CommandInvocation) -> Result<i32> {
        match inv.arg(0) {
            Some("on") => {
                self.kernel.set_maintenance(true);
                inv.emit("Maintenance mode enabled.");
                Ok(0)
            },
            Some("off") => {
                self.kernel.set_maintenance(false);
                inv.emit("Maintenance mode disabled.");
                Ok(0)
            },
            _ => {
                inv.emit("maintenance: expected 'on' or 'off'");
                Ok(1)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use vesta_types::error::ErrorKind;

    use super::*;
    use crate::dispatch::{DispatchOutcome, Dispatcher};

    fn engine() -> Dispatcher {
        let reg = Arc::new(RegistryService::new());
        let kernel = Arc::new(KernelState::new());
        register_admin_commands(&reg, &kernel).unwrap();
        Dispatcher::new(reg, kernel)
    }

    fn run_as(d: &Dispatcher, line: &str, user: UserFlags) -> DispatchOutcome {
        let mut vars = HashMap::new();
        d.dispatch(ShellType::Admin, line, user, &mut vars)
    }

    #[test]
    fn users_lists_accounts_for_everyone() {
        let d = engine();
        match run_as(&d, "users", UserFlags::empty()) {
            DispatchOutcome::Completed { lines, .. } => {
                assert_eq!(lines.len(), 2);
                assert!(lines.iter().any(|l| l.contains("root")));
            },
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn grant_is_gated_on_privilege() {
        let d = engine();
        let out = run_as(&d, "grant guest", UserFlags::empty());
        assert_eq!(out.exit_code(), ErrorKind::InsufficientPrivilege.exit_code());
        assert!(run_as(&d, "grant guest", UserFlags::ADMINISTRATOR).is_success());
    }

    #[test]
    fn unknown_account_is_a_users_error() {
        let d = engine();
        let out = run_as(&d, "grant nobody", UserFlags::ADMINISTRATOR);
        assert_eq!(out.exit_code(), ErrorKind::Users.exit_code());
    }

    #[test]
    fn root_cannot_be_revoked() {
        let d = engine();
        let out = run_as(&d, "revoke root", UserFlags::ADMINISTRATOR);
        assert_eq!(out.exit_code(), ErrorKind::Users.exit_code());
    }

    #[test]
    fn maintenance_toggle_works_while_in_maintenance() {
        let d = engine();
        assert!(run_as(&d, "maintenance on", UserFlags::ADMINISTRATOR).is_success());
        assert!(d.kernel().in_maintenance());
        // Still dispatchable: the command is maintenance-exempt.
        assert!(run_as(&d, "maintenance off", UserFlags::ADMINISTRATOR).is_success());
        assert!(!d.kernel().in_maintenance());
    }

    #[test]
    fn maintenance_blocks_other_admin_commands() {
        let d = engine();
        assert!(run_as(&d, "maintenance on", UserFlags::ADMINISTRATOR).is_success());
        let out = run_as(&d, "users", UserFlags::ADMINISTRATOR);
        assert_eq!(out.exit_code(), ErrorKind::MaintenanceMode.exit_code());
    }

    #[test]
    fn maintenance_bad_state_is_a_small_handler_code() {
        let d = engine();
        let out = run_as(&d, "maintenance sideways", UserFlags::ADMINISTRATOR);
        assert_eq!(out.exit_code(), 1);
    }
}

//! Permission and maintenance gating.

use vesta_types::error::{Result, ShellError};
use vesta_types::flags::{CommandFlags, UserFlags};

use crate::descriptor::CommandDescriptor;

/// Decide whether a resolved command may run for this user right now.
///
/// Both checks are evaluated independently; the privilege denial is
/// reported first so error messages stay deterministic.
pub fn authorize(desc: &CommandDescriptor, user: UserFlags, in_maintenance: bool) -> Result<()> {
    let flags = desc.command_flags();
    if flags.contains(CommandFlags::STRICT) && !user.contains(UserFlags::ADMINISTRATOR) {
        return Err(ShellError::InsufficientPrivilege {
            name: desc.name().to_string(),
        });
    }
    if in_maintenance && !flags.contains(CommandFlags::NO_MAINTENANCE) {
        return Err(ShellError::MaintenanceMode {
            name: desc.name().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use vesta_types::shell::ShellType;

    use super::*;
    use crate::descriptor::{CommandHandler, CommandInvocation};

    struct Nop;
    impl CommandHandler for Nop {
        fn run(&self, _inv: &mut CommandInvocation) -> Result<i32> {
            Ok(0)
        }
    }

    fn desc(flags: CommandFlags) -> CommandDescriptor {
        CommandDescriptor::new(ShellType::Shell, "probe", "k", Arc::new(Nop)).flags(flags)
    }

    #[test]
    fn plain_command_for_plain_user() {
        assert!(authorize(&desc(CommandFlags::empty()), UserFlags::empty(), false).is_ok());
    }

    #[test]
    fn strict_requires_administrator() {
        let d = desc(CommandFlags::STRICT);
        let err = authorize(&d, UserFlags::empty(), false).unwrap_err();
        assert!(matches!(err, ShellError::InsufficientPrivilege { .. }));
        assert!(authorize(&d, UserFlags::ADMINISTRATOR, false).is_ok());
    }

    #[test]
    fn maintenance_blocks_unexempt_commands() {
        let d = desc(CommandFlags::empty());
        let err = authorize(&d, UserFlags::ADMINISTRATOR, true).unwrap_err();
        assert!(matches!(err, ShellError::MaintenanceMode { .. }));
    }

    #[test]
    fn no_maintenance_flag_exempts() {
        let d = desc(CommandFlags::NO_MAINTENANCE);
        assert!(authorize(&d, UserFlags::empty(), true).is_ok());
    }

    #[test]
    fn privilege_denial_reported_before_maintenance() {
        // Strict command, unprivileged user, kernel in maintenance: the
        // privilege check answers first.
        let d = desc(CommandFlags::STRICT);
        let err = authorize(&d, UserFlags::empty(), true).unwrap_err();
        assert!(matches!(err, ShellError::InsufficientPrivilege { .. }));
    }

    #[test]
    fn strict_command_still_passes_maintenance_check() {
        let d = desc(CommandFlags::STRICT);
        let err = authorize(&d, UserFlags::ADMINISTRATOR, true).unwrap_err();
        assert!(matches!(err, ShellError::MaintenanceMode { .. }));

        let d = desc(CommandFlags::STRICT | CommandFlags::NO_MAINTENANCE);
        assert!(authorize(&d, UserFlags::ADMINISTRATOR, true).is_ok());
    }
}

//! Flag sets for commands and users.

bitflags::bitflags! {
    /// Behavioral flags carried by a command descriptor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CommandFlags: u8 {
        /// Requires the administrator privilege.
        const STRICT = 1 << 0;
        /// The surrounding shell may capture this command's output into a
        /// file or variable. Consumed by the renderer, not the engine.
        const REDIRECTION = 1 << 1;
        /// Output may be reflowed to the terminal width. Consumed by the
        /// renderer, not the engine.
        const WRAPPABLE = 1 << 2;
        /// The handler may write to the caller-supplied output variable
        /// slot.
        const SETS_VARIABLE = 1 << 3;
        /// May execute even while the kernel is in maintenance mode.
        const NO_MAINTENANCE = 1 << 4;
    }
}

bitflags::bitflags! {
    /// Privilege flags of the current user.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct UserFlags: u8 {
        /// May run commands flagged `STRICT`.
        const ADMINISTRATOR = 1 << 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_flags_compose() {
        let f = CommandFlags::STRICT | CommandFlags::NO_MAINTENANCE;
        assert!(f.contains(CommandFlags::STRICT));
        assert!(f.contains(CommandFlags::NO_MAINTENANCE));
        assert!(!f.contains(CommandFlags::SETS_VARIABLE));
    }

    #[test]
    fn user_flags_default_is_unprivileged() {
        assert!(!UserFlags::default().contains(UserFlags::ADMINISTRATOR));
    }
}

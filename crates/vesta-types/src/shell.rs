//! Shell type identifiers and command origins.

use serde::{Deserialize, Serialize};

/// A named command vocabulary hosted by the kernel.
///
/// Each shell type owns its own command set; a session is always attached
/// to exactly one shell type at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShellType {
    /// The main command shell.
    Shell,
    /// The mail client shell.
    Mail,
    /// The administrative shell.
    Admin,
    /// The hex-editor shell.
    HexEdit,
}

impl ShellType {
    /// All shell types, in presentation order.
    pub const ALL: [ShellType; 4] = [
        ShellType::Shell,
        ShellType::Mail,
        ShellType::Admin,
        ShellType::HexEdit,
    ];

    /// Short label used in prompts and logs.
    pub fn label(self) -> &'static str {
        match self {
            ShellType::Shell => "shell",
            ShellType::Mail => "mail",
            ShellType::Admin => "admin",
            ShellType::HexEdit => "hexedit",
        }
    }
}

impl std::fmt::Display for ShellType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The source that contributed a command descriptor.
///
/// The origin determines lookup precedence and whether the descriptor can
/// be removed at runtime: built-ins and unified commands live for the
/// process lifetime, mod and addon descriptors are removed en masse when
/// their source is unloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Registered once at process start; never shadowed, never removed.
    BuiltIn,
    /// A name rewrite resolved before registry lookup.
    Alias,
    /// Contributed by a loaded mod; removable by source id.
    Mod,
    /// Contributed by a loaded addon package; removable by source id.
    Addon,
    /// Available identically in every shell type.
    Unified,
}

impl Origin {
    pub fn label(self) -> &'static str {
        match self {
            Origin::BuiltIn => "built-in",
            Origin::Alias => "alias",
            Origin::Mod => "mod",
            Origin::Addon => "addon",
            Origin::Unified => "unified",
        }
    }
}

bitflags::bitflags! {
    /// Selects which origins a registry listing should include.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OriginMask: u8 {
        const BUILTIN = 1 << 0;
        const MOD = 1 << 1;
        const ADDON = 1 << 2;
        const UNIFIED = 1 << 3;
    }
}

//! Error taxonomy for the VESTA_OS shell engine.
//!
//! Engine-produced failures map onto a reserved exit-code range
//! (`10000 + kind ordinal`) so they can never collide with the small
//! handler-specific codes in 1..=999 that command bodies return verbatim.

/// Base of the reserved engine exit-code range.
pub const ENGINE_CODE_BASE: i32 = 10_000;

/// Stable error-kind ordinals.
///
/// The discriminants are part of the exit-code contract and must not be
/// reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorKind {
    CommandNotFound = 1,
    InvalidArguments = 2,
    InsufficientPrivilege = 3,
    MaintenanceMode = 4,
    HandlerFault = 5,
    Mail = 6,
    Users = 7,
    Hardware = 8,
    Config = 9,
}

impl ErrorKind {
    /// The process-level exit code for this kind.
    pub fn exit_code(self) -> i32 {
        ENGINE_CODE_BASE + self as i32
    }

    /// Lookup key for the translated one-line message.
    pub fn message_key(self) -> &'static str {
        match self {
            ErrorKind::CommandNotFound => "error.command_not_found",
            ErrorKind::InvalidArguments => "error.invalid_arguments",
            ErrorKind::InsufficientPrivilege => "error.insufficient_privilege",
            ErrorKind::MaintenanceMode => "error.maintenance_mode",
            ErrorKind::HandlerFault => "error.handler_fault",
            ErrorKind::Mail => "error.mail",
            ErrorKind::Users => "error.users",
            ErrorKind::Hardware => "error.hardware",
            ErrorKind::Config => "error.config",
        }
    }
}

/// Errors produced by the shell engine and by command handlers that signal
/// a domain failure class instead of a small numeric code.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("unknown command: {name}")]
    CommandNotFound { name: String },

    /// Carries the rendered usage string of every variant of the closest
    /// descriptor so the caller can print "Usage: ..." lines.
    #[error("invalid arguments for '{name}'")]
    InvalidArguments { name: String, usages: Vec<String> },

    #[error("'{name}' requires administrator privilege")]
    InsufficientPrivilege { name: String },

    #[error("'{name}' is unavailable while the kernel is in maintenance mode")]
    MaintenanceMode { name: String },

    /// An unexpected panic escaped a handler and was contained at the
    /// dispatch boundary.
    #[error("'{name}' failed unexpectedly: {detail}")]
    HandlerFault { name: String, detail: String },

    #[error("mail error: {0}")]
    Mail(String),

    #[error("user management error: {0}")]
    Users(String),

    #[error("hardware error: {0}")]
    Hardware(String),

    #[error("config error: {0}")]
    Config(String),
}

impl ShellError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ShellError::CommandNotFound { .. } => ErrorKind::CommandNotFound,
            ShellError::InvalidArguments { .. } => ErrorKind::InvalidArguments,
            ShellError::InsufficientPrivilege { .. } => ErrorKind::InsufficientPrivilege,
            ShellError::MaintenanceMode { .. } => ErrorKind::MaintenanceMode,
            ShellError::HandlerFault { .. } => ErrorKind::HandlerFault,
            ShellError::Mail(_) => ErrorKind::Mail,
            ShellError::Users(_) => ErrorKind::Users,
            ShellError::Hardware(_) => ErrorKind::Hardware,
            ShellError::Config(_) => ErrorKind::Config,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.kind().exit_code()
    }

    pub fn message_key(&self) -> &'static str {
        self.kind().message_key()
    }

    /// Usage strings attached to an `InvalidArguments` failure.
    pub fn usages(&self) -> &[String] {
        match self {
            ShellError::InvalidArguments { usages, .. } => usages,
            _ => &[],
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ShellError>;

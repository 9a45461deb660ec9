//! Command dispatch.
//!
//! Runs one input line through the fixed pipeline: tokenize, alias
//! resolution, registry lookup, schema validation, gating, invocation.
//! Every engine-stage failure terminates in a typed outcome; a handler
//! panic is contained at the invocation boundary and downgraded to a
//! handler-fault outcome so one defective command body cannot take down
//! the owning session.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use vesta_types::error::ShellError;
use vesta_types::flags::{CommandFlags, UserFlags};
use vesta_types::shell::ShellType;

use crate::descriptor::{CommandInvocation, SessionEffect};
use crate::gate::authorize;
use crate::kernel::KernelState;
use crate::registry::RegistryService;
use crate::schema::match_variants;
use crate::token::{TokenizedLine, parse_line};

/// Result of dispatching one input line.
#[derive(Debug)]
pub enum DispatchOutcome {
    Completed {
        /// Handler exit code, surfaced verbatim. 0 is success.
        code: i32,
        /// Display lines the handler emitted.
        lines: Vec<String>,
        /// Session effect requested by the handler.
        effect: SessionEffect,
    },
    Failed(ShellError),
}

impl DispatchOutcome {
    /// Process-level code: the handler's own code, or the reserved
    /// engine code of the failure kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            DispatchOutcome::Completed { code, .. } => *code,
            DispatchOutcome::Failed(err) => err.exit_code(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DispatchOutcome::Completed { code: 0, .. })
    }
}

/// The per-session dispatch engine over the shared registry service.
pub struct Dispatcher {
    registry: Arc<RegistryService>,
    kernel: Arc<KernelState>,
}

impl Dispatcher {
    pub fn new(registry: Arc<RegistryService>, kernel: Arc<KernelState>) -> Self {
        Self { registry, kernel }
    }

    pub fn registry(&self) -> &Arc<RegistryService> {
        &self.registry
    }

    pub fn kernel(&self) -> &Arc<KernelState> {
        &self.kernel
    }

    /// Dispatch one raw input line for a session of `shell`.
    ///
    /// `vars` is the session variable store: it feeds `$name`
    /// interpolation and receives the output slot of a successful
    /// variable-assignment line (`name = <command ...>`).
    pub fn dispatch(
        &self,
        shell: ShellType,
        line: &str,
        user: UserFlags,
        vars: &mut HashMap<String, String>,
    ) -> DispatchOutcome {
        let line = line.trim();
        if line.is_empty() {
            return DispatchOutcome::Completed {
                code: 0,
                lines: Vec::new(),
                effect: SessionEffect::None,
            };
        }

        let (assign_to, body) = split_assignment(line);
        let expanded = expand_variables(body, vars);

        // Tokenize.
        let parsed = match parse_line(&expanded) {
            Ok(Some(parsed)) => parsed,
            Ok(None) => {
                return DispatchOutcome::Completed {
                    code: 0,
                    lines: Vec::new(),
                    effect: SessionEffect::None,
                };
            },
            Err(err) => return DispatchOutcome::Failed(err),
        };

        // Resolve: alias rewrite, then precedence-ordered lookup.
        let parsed = match self.apply_alias(shell, parsed) {
            Ok(parsed) => parsed,
            Err(err) => return DispatchOutcome::Failed(err),
        };
        let Some(desc) = self.registry.lookup(shell, &parsed.name) else {
            return DispatchOutcome::Failed(ShellError::CommandNotFound { name: parsed.name });
        };

        // Validate.
        let matched = match match_variants(&desc, &parsed) {
            Ok(matched) => matched,
            Err(err) => return DispatchOutcome::Failed(err),
        };

        // Authorize.
        if let Err(err) = authorize(&desc, user, self.kernel.in_maintenance()) {
            log::warn!("denied '{}': {err}", desc.name());
            return DispatchOutcome::Failed(err);
        }

        // Execute.
        let mut inv = CommandInvocation::new(
            shell,
            user,
            matched.variant,
            matched.positionals,
            matched.switches,
        );
        let run = catch_unwind(AssertUnwindSafe(|| desc.handler().run(&mut inv)));
        match run {
            Err(payload) => {
                let detail = panic_detail(payload.as_ref());
                log::warn!("handler for '{}' panicked: {detail}", desc.name());
                DispatchOutcome::Failed(ShellError::HandlerFault {
                    name: desc.name().to_string(),
                    detail,
                })
            },
            Ok(Err(err)) => DispatchOutcome::Failed(err),
            Ok(Ok(code)) => {
                if let Some(target) = assign_to
                    && desc.command_flags().contains(CommandFlags::SETS_VARIABLE)
                    && let Some(value) = inv.take_output()
                {
                    vars.insert(target.to_string(), value);
                }
                DispatchOutcome::Completed {
                    code,
                    lines: inv.take_emitted(),
                    effect: inv.effect(),
                }
            },
        }
    }

    /// Rewrite the command name through the alias table. The expansion's
    /// own tokens are spliced in front of the typed arguments; the result
    /// is looked up directly, so aliases never chain.
    fn apply_alias(
        &self,
        shell: ShellType,
        line: TokenizedLine,
    ) -> Result<TokenizedLine, ShellError> {
        let Some(expansion) = self.registry.resolve_alias(shell, &line.name) else {
            return Ok(line);
        };
        let Some(mut expanded) = parse_line(&expansion)? else {
            return Err(ShellError::CommandNotFound { name: line.name });
        };
        expanded.positionals.extend(line.positionals);
        expanded.switches.extend(line.switches);
        Ok(expanded)
    }
}

/// Split a `name = command ...` assignment prefix off an input line.
/// The left side must be a single bare identifier; anything else is
/// treated as a plain command line.
fn split_assignment(line: &str) -> (Option<&str>, &str) {
    let Some((lhs, rhs)) = line.split_once('=') else {
        return (None, line);
    };
    let name = lhs.trim();
    let is_ident = !name.is_empty()
        && name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if is_ident && !rhs.trim().is_empty() {
        (Some(name), rhs.trim())
    } else {
        (None, line)
    }
}

/// Interpolate `$name`, `${name}`, and `$?` from the session store.
/// Unknown names expand to the empty string.
fn expand_variables(input: &str, vars: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            out.push(ch);
            continue;
        }
        match chars.peek() {
            Some('?') => {
                chars.next();
                out.push_str(vars.get("?").map(String::as_str).unwrap_or("0"));
            },
            Some('{') => {
                chars.next();
                let mut name = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                if closed {
                    out.push_str(vars.get(&name).map(String::as_str).unwrap_or(""));
                } else {
                    out.push_str("${");
                    out.push_str(&name);
                }
            },
            Some(c) if c.is_ascii_alphanumeric() || *c == '_' => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push_str(vars.get(&name).map(String::as_str).unwrap_or(""));
            },
            _ => out.push('$'),
        }
    }
    out
}

fn panic_detail(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

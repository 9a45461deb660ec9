//! Interactive shell sessions.
//!
//! One session per interaction window. The loop blocks on input, runs
//! the dispatcher to completion, prints the result, and moves to the
//! next line; a failure never ends the loop. Session-scoped commands
//! that need registry or variable access (help, alias, set, which) are
//! intercepted here before dispatch, in front of the registries.

use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use vesta_types::error::ShellError;
use vesta_types::flags::UserFlags;
use vesta_types::locale::Translate;
use vesta_types::shell::{OriginMask, ShellType};

use crate::descriptor::SessionEffect;
use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::help;
use crate::kernel::KernelState;
use crate::registry::RegistryService;

/// Session-scoped command names resolved ahead of the registries.
const INTERCEPTED: [&str; 5] = ["help", "alias", "unalias", "set", "which"];

/// What one input line produced.
#[derive(Debug)]
pub struct EvalResult {
    pub lines: Vec<String>,
    pub code: i32,
    pub effect: SessionEffect,
}

impl EvalResult {
    fn quiet() -> Self {
        Self {
            lines: Vec::new(),
            code: 0,
            effect: SessionEffect::None,
        }
    }

    fn text(lines: Vec<String>) -> Self {
        Self {
            lines,
            code: 0,
            effect: SessionEffect::None,
        }
    }
}

/// A single-threaded read-evaluate loop over one shell type.
pub struct ShellSession {
    shell: ShellType,
    dispatcher: Dispatcher,
    translator: Arc<dyn Translate>,
    user: UserFlags,
    vars: HashMap<String, String>,
    last_code: i32,
}

impl ShellSession {
    pub fn new(
        shell: ShellType,
        registry: Arc<RegistryService>,
        kernel: Arc<KernelState>,
        translator: Arc<dyn Translate>,
        user: UserFlags,
    ) -> Self {
        Self {
            shell,
            dispatcher: Dispatcher::new(registry, kernel),
            translator,
            user,
            vars: HashMap::new(),
            last_code: 0,
        }
    }

    pub fn shell(&self) -> ShellType {
        self.shell
    }

    pub fn last_code(&self) -> i32 {
        self.last_code
    }

    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn set_var(&mut self, name: &str, value: &str) {
        self.vars.insert(name.to_string(), value.to_string());
    }

    /// Evaluate one input line: session intercepts first, then dispatch.
    pub fn eval(&mut self, line: &str) -> EvalResult {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return EvalResult::quiet();
        }

        let (word, rest) = split_first_word(trimmed);
        let mut result = match word.to_ascii_lowercase().as_str() {
            "help" => self.eval_help(rest),
            "alias" => self.eval_alias(rest),
            "unalias" => self.eval_unalias(rest),
            "set" => self.eval_set(rest),
            "which" => self.eval_which(rest),
            _ => self.eval_dispatch(trimmed),
        };

        self.last_code = result.code;
        self.vars.insert("?".to_string(), result.code.to_string());
        if result.code != 0 {
            log::debug!("'{trimmed}' exited with {}", result.code);
            // Effects of a failed line are never honored.
            result.effect = SessionEffect::None;
        }
        result
    }

    /// Run the read-evaluate loop until EOF or a terminate effect.
    pub fn run(&mut self, input: &mut dyn BufRead, out: &mut dyn Write) -> io::Result<()> {
        loop {
            write!(out, "{}> ", self.shell.label())?;
            out.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                return Ok(());
            }

            let result = self.eval(&line);
            for text in &result.lines {
                writeln!(out, "{text}")?;
            }
            match result.effect {
                SessionEffect::None => {},
                SessionEffect::Terminate => return Ok(()),
                SessionEffect::EnterShell(shell) => {
                    let mut nested = ShellSession::new(
                        shell,
                        Arc::clone(self.dispatcher.registry()),
                        Arc::clone(self.dispatcher.kernel()),
                        Arc::clone(&self.translator),
                        self.user,
                    );
                    nested.run(input, out)?;
                },
            }
        }
    }

    fn eval_dispatch(&mut self, line: &str) -> EvalResult {
        match self
            .dispatcher
            .dispatch(self.shell, line, self.user, &mut self.vars)
        {
            DispatchOutcome::Completed {
                code,
                lines,
                effect,
            } => EvalResult {
                lines,
                code,
                effect,
            },
            DispatchOutcome::Failed(err) => self.failure(err),
        }
    }

    /// Exactly one translated message line per failure; the usage set of
    /// an argument failure rides along as attached detail lines.
    fn failure(&self, err: ShellError) -> EvalResult {
        let mut lines = vec![format!(
            "{}: {}",
            self.translator.translate(err.message_key()),
            failure_detail(&err)
        )];
        for usage in err.usages() {
            lines.push(format!("  Usage: {usage}"));
        }
        EvalResult {
            lines,
            code: err.exit_code(),
            effect: SessionEffect::None,
        }
    }

    // -- Intercepted session commands --

    fn eval_help(&self, rest: &str) -> EvalResult {
        let registry = self.dispatcher.registry();
        let topic = rest.trim();
        if topic.is_empty() {
            let entries =
                help::list_commands(registry, self.shell, OriginMask::all(), &*self.translator);
            let mut lines = vec![format!("Commands ({}):", entries.len())];
            for (name, text) in &entries {
                lines.push(format!("  {name:12} {text}"));
            }
            lines.push("Type 'help <command>' for details.".to_string());
            return EvalResult::text(lines);
        }
        match help::describe(registry, self.shell, topic, &*self.translator) {
            Ok(lines) => EvalResult::text(lines),
            Err(err) => self.failure(err),
        }
    }

    fn eval_alias(&self, rest: &str) -> EvalResult {
        let registry = self.dispatcher.registry();
        let rest = rest.trim();
        if rest.is_empty() {
            let entries = registry.aliases_for(self.shell);
            if entries.is_empty() {
                return EvalResult::text(vec!["(no aliases defined)".to_string()]);
            }
            let lines = entries
                .iter()
                .map(|(name, exp)| format!("alias {name}='{exp}'"))
                .collect();
            return EvalResult::text(lines);
        }
        let Some((name, expansion)) = rest.split_once('=') else {
            return match registry.resolve_alias(self.shell, rest) {
                Some(exp) => EvalResult::text(vec![format!("alias {rest}='{exp}'")]),
                None => self.failure(ShellError::Config(format!("no such alias: {rest}"))),
            };
        };
        let expansion = expansion.trim().trim_matches('\'').trim_matches('"');
        match registry.add_alias(self.shell, name.trim(), expansion) {
            Ok(()) => EvalResult::quiet(),
            Err(err) => self.failure(err),
        }
    }

    fn eval_unalias(&self, rest: &str) -> EvalResult {
        let name = rest.trim();
        if name.is_empty() {
            return self.failure(ShellError::Config("usage: unalias <name>".to_string()));
        }
        match self.dispatcher.registry().remove_alias(self.shell, name) {
            Ok(()) => EvalResult::quiet(),
            Err(err) => self.failure(err),
        }
    }

    fn eval_set(&mut self, rest: &str) -> EvalResult {
        let rest = rest.trim();
        if rest.is_empty() {
            let mut entries: Vec<(&String, &String)> = self.vars.iter().collect();
            entries.sort();
            let lines = entries
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            return EvalResult::text(lines);
        }
        if let Some((name, value)) = rest.split_once('=') {
            let name = name.trim();
            if name.is_empty() {
                return self.failure(ShellError::Config("usage: set NAME=value".to_string()));
            }
            self.vars.insert(name.to_string(), value.trim().to_string());
            return EvalResult::quiet();
        }
        match self.vars.get(rest) {
            Some(value) => EvalResult::text(vec![format!("{rest}={value}")]),
            None => EvalResult::text(vec![format!("{rest}: not set")]),
        }
    }

    fn eval_which(&self, rest: &str) -> EvalResult {
        let name = rest.trim();
        if name.is_empty() {
            return self.failure(ShellError::Config("usage: which <command>".to_string()));
        }
        let lower = name.to_ascii_lowercase();
        if INTERCEPTED.contains(&lower.as_str()) {
            return EvalResult::text(vec![format!("{lower}: session built-in")]);
        }
        let registry = self.dispatcher.registry();
        if let Some(expansion) = registry.resolve_alias(self.shell, &lower) {
            return EvalResult::text(vec![format!("{lower}: aliased to '{expansion}'")]);
        }
        match registry.lookup(self.shell, &lower) {
            Some(desc) => EvalResult::text(vec![format!(
                "{}: {} command",
                desc.name(),
                desc.origin().label()
            )]),
            None => self.failure(ShellError::CommandNotFound {
                name: name.to_string(),
            }),
        }
    }
}

fn split_first_word(line: &str) -> (&str, &str) {
    match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest),
        None => (line, ""),
    }
}

/// The payload half of a failure message line.
fn failure_detail(err: &ShellError) -> String {
    match err {
        ShellError::CommandNotFound { name }
        | ShellError::InvalidArguments { name, .. }
        | ShellError::InsufficientPrivilege { name }
        | ShellError::MaintenanceMode { name } => name.clone(),
        ShellError::HandlerFault { name, detail } => format!("{name}: {detail}"),
        ShellError::Mail(msg)
        | ShellError::Users(msg)
        | ShellError::Hardware(msg)
        | ShellError::Config(msg) => msg.clone(),
    }
}

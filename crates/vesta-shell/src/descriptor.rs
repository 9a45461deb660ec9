//! Command descriptors: the declarative schema one command exposes to the
//! engine, plus the handler contract the dispatcher invokes.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use vesta_types::error::Result;
use vesta_types::flags::{CommandFlags, UserFlags};
use vesta_types::shell::{Origin, ShellType};

/// Optional dynamic suggestion callback for tab completion. Carried in the
/// schema for completeness; the dispatcher never calls it.
pub type SuggestFn = fn(partial: &str) -> Vec<String>;

/// One positional argument part of a variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgPart {
    pub name: String,
    pub required: bool,
    /// Only meaningful on the final part: it absorbs any number of
    /// trailing tokens.
    pub repeatable: bool,
}

impl ArgPart {
    /// Parse a part spec: `<name>` is required, `[name]` optional, a
    /// trailing `...` inside the brackets marks the part repeatable.
    /// A bare word is treated as required.
    pub fn parse(spec: &str) -> ArgPart {
        let spec = spec.trim();
        let (body, required) = if let Some(inner) = spec
            .strip_prefix('<')
            .and_then(|s| s.strip_suffix('>'))
        {
            (inner, true)
        } else if let Some(inner) = spec
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
        {
            (inner, false)
        } else {
            (spec, true)
        };
        let (name, repeatable) = match body.strip_suffix("...") {
            Some(stripped) => (stripped, true),
            None => (body, false),
        };
        ArgPart {
            name: name.to_string(),
            required,
            repeatable,
        }
    }
}

/// A declared switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchDescriptor {
    pub name: String,
    pub takes_value: bool,
    pub help_key: String,
}

/// One valid positional/switch shape of a command.
#[derive(Clone, Default)]
pub struct ArgVariant {
    parts: Vec<ArgPart>,
    switches: Vec<SwitchDescriptor>,
    min_override: Option<usize>,
    suggest: Option<SuggestFn>,
}

impl ArgVariant {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional part from its spec string.
    pub fn part(mut self, spec: &str) -> Self {
        self.parts.push(ArgPart::parse(spec));
        self
    }

    /// Declare a switch for this variant.
    pub fn switch(mut self, name: &str, takes_value: bool, help_key: &str) -> Self {
        self.switches.push(SwitchDescriptor {
            name: name.to_string(),
            takes_value,
            help_key: help_key.to_string(),
        });
        self
    }

    /// Override the minimum required positional count. Without an
    /// override the minimum is the number of required parts.
    pub fn min(mut self, count: usize) -> Self {
        self.min_override = Some(count);
        self
    }

    pub fn suggest(mut self, f: SuggestFn) -> Self {
        self.suggest = Some(f);
        self
    }

    pub fn parts(&self) -> &[ArgPart] {
        &self.parts
    }

    pub fn switches(&self) -> &[SwitchDescriptor] {
        &self.switches
    }

    pub fn find_switch(&self, name: &str) -> Option<&SwitchDescriptor> {
        self.switches.iter().find(|s| s.name == name)
    }

    pub fn min_required(&self) -> usize {
        self.min_override
            .unwrap_or_else(|| self.parts.iter().filter(|p| p.required).count())
    }

    /// Render this variant as a usage string, e.g.
    /// `send <recipient> <subject> [body...] -urgent`.
    pub fn usage(&self, command: &str) -> String {
        let mut out = command.to_string();
        for part in &self.parts {
            let dots = if part.repeatable { "..." } else { "" };
            if part.required {
                out.push_str(&format!(" <{}{dots}>", part.name));
            } else {
                out.push_str(&format!(" [{}{dots}]", part.name));
            }
        }
        for sw in &self.switches {
            if sw.takes_value {
                out.push_str(&format!(" -{}=<value>", sw.name));
            } else {
                out.push_str(&format!(" -{}", sw.name));
            }
        }
        out
    }
}

impl fmt::Debug for ArgVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgVariant")
            .field("parts", &self.parts)
            .field("switches", &self.switches)
            .field("min_required", &self.min_required())
            .field("has_suggest", &self.suggest.is_some())
            .finish()
    }
}

/// Effect a handler may request from its owning session. Terminating or
/// switching shells is a handler property, not an engine one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionEffect {
    #[default]
    None,
    /// End the owning session loop.
    Terminate,
    /// Open a nested session of the given shell type.
    EnterShell(ShellType),
}

/// Everything a handler receives: the matched arguments and switches, an
/// output-variable slot, and the session-effect channel.
pub struct CommandInvocation {
    pub shell: ShellType,
    pub user: UserFlags,
    /// Index of the matched variant in declaration order.
    pub variant: usize,
    pub args: Vec<String>,
    pub switches: HashMap<String, Option<String>>,
    emitted: Vec<String>,
    output: Option<String>,
    effect: SessionEffect,
}

impl CommandInvocation {
    pub fn new(
        shell: ShellType,
        user: UserFlags,
        variant: usize,
        args: Vec<String>,
        switches: HashMap<String, Option<String>>,
    ) -> Self {
        Self {
            shell,
            user,
            variant,
            args,
            switches,
            emitted: Vec::new(),
            output: None,
            effect: SessionEffect::None,
        }
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    pub fn has_switch(&self, name: &str) -> bool {
        self.switches.contains_key(name)
    }

    pub fn switch_value(&self, name: &str) -> Option<&str> {
        self.switches.get(name)?.as_deref()
    }

    /// Queue a line of display output for the renderer.
    pub fn emit(&mut self, line: impl Into<String>) {
        self.emitted.push(line.into());
    }

    /// Fill the output-variable slot. Only stored by the dispatcher when
    /// the descriptor carries `SETS_VARIABLE`.
    pub fn set_output(&mut self, value: impl Into<String>) {
        self.output = Some(value.into());
    }

    pub fn request_exit(&mut self) {
        self.effect = SessionEffect::Terminate;
    }

    pub fn enter_shell(&mut self, shell: ShellType) {
        self.effect = SessionEffect::EnterShell(shell);
    }

    pub fn effect(&self) -> SessionEffect {
        self.effect
    }

    pub fn take_emitted(&mut self) -> Vec<String> {
        std::mem::take(&mut self.emitted)
    }

    pub fn take_output(&mut self) -> Option<String> {
        self.output.take()
    }
}

/// A command body. Returns a small exit code (0 = success, 1..=999 by
/// convention) or a domain error kind.
pub trait CommandHandler: Send + Sync {
    fn run(&self, inv: &mut CommandInvocation) -> Result<i32>;
}

/// The declarative schema for one command.
#[derive(Clone)]
pub struct CommandDescriptor {
    name: String,
    /// `None` for unified commands, which belong to every shell type.
    shell: Option<ShellType>,
    help_key: String,
    variants: Vec<ArgVariant>,
    flags: CommandFlags,
    origin: Origin,
    source_id: Option<String>,
    handler: Arc<dyn CommandHandler>,
}

impl CommandDescriptor {
    /// A built-in command owned by one shell type.
    pub fn new(
        shell: ShellType,
        name: &str,
        help_key: &str,
        handler: Arc<dyn CommandHandler>,
    ) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            shell: Some(shell),
            help_key: help_key.to_string(),
            variants: Vec::new(),
            flags: CommandFlags::empty(),
            origin: Origin::BuiltIn,
            source_id: None,
            handler,
        }
    }

    /// A unified command, available identically in every shell type.
    pub fn unified(name: &str, help_key: &str, handler: Arc<dyn CommandHandler>) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            shell: None,
            help_key: help_key.to_string(),
            variants: Vec::new(),
            flags: CommandFlags::empty(),
            origin: Origin::Unified,
            source_id: None,
            handler,
        }
    }

    pub fn variant(mut self, variant: ArgVariant) -> Self {
        self.variants.push(variant);
        self
    }

    pub fn flags(mut self, flags: CommandFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Tag this descriptor as contributed by a mod.
    pub fn from_mod(mut self, source_id: &str) -> Self {
        self.origin = Origin::Mod;
        self.source_id = Some(source_id.to_string());
        self
    }

    /// Tag this descriptor as contributed by an addon package.
    pub fn from_addon(mut self, source_id: &str) -> Self {
        self.origin = Origin::Addon;
        self.source_id = Some(source_id.to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shell(&self) -> Option<ShellType> {
        self.shell
    }

    pub fn help_key(&self) -> &str {
        &self.help_key
    }

    pub fn variants(&self) -> &[ArgVariant] {
        &self.variants
    }

    pub fn command_flags(&self) -> CommandFlags {
        self.flags
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn source_id(&self) -> Option<&str> {
        self.source_id.as_deref()
    }

    pub fn handler(&self) -> &Arc<dyn CommandHandler> {
        &self.handler
    }

    /// Rendered usage string for every variant, in declaration order.
    pub fn usages(&self) -> Vec<String> {
        if self.variants.is_empty() {
            return vec![self.name.clone()];
        }
        self.variants.iter().map(|v| v.usage(&self.name)).collect()
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("shell", &self.shell)
            .field("origin", &self.origin)
            .field("flags", &self.flags)
            .field("variants", &self.variants.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Nop;
    impl CommandHandler for Nop {
        fn run(&self, _inv: &mut CommandInvocation) -> Result<i32> {
            Ok(0)
        }
    }

    #[test]
    fn part_spec_forms() {
        let p = ArgPart::parse("<recipient>");
        assert!(p.required && !p.repeatable);
        assert_eq!(p.name, "recipient");

        let p = ArgPart::parse("[subject]");
        assert!(!p.required && !p.repeatable);

        let p = ArgPart::parse("[body...]");
        assert!(!p.required && p.repeatable);

        let p = ArgPart::parse("<input...>");
        assert!(p.required && p.repeatable);

        let p = ArgPart::parse("bare");
        assert!(p.required);
        assert_eq!(p.name, "bare");
    }

    #[test]
    fn min_required_counts_required_parts() {
        let v = ArgVariant::new().part("<a>").part("<b>").part("[c]");
        assert_eq!(v.min_required(), 2);
    }

    #[test]
    fn min_override_wins() {
        let v = ArgVariant::new().part("<a>").part("<b>").min(1);
        assert_eq!(v.min_required(), 1);
    }

    #[test]
    fn usage_rendering() {
        let v = ArgVariant::new()
            .part("<recipient>")
            .part("[subject]")
            .part("[body...]")
            .switch("urgent", false, "help.mail.switch.urgent")
            .switch("copy", true, "help.mail.switch.copy");
        assert_eq!(
            v.usage("send"),
            "send <recipient> [subject] [body...] -urgent -copy=<value>"
        );
    }

    #[test]
    fn descriptor_usages_fall_back_to_name() {
        let d = CommandDescriptor::new(ShellType::Shell, "status", "help.status", Arc::new(Nop));
        assert_eq!(d.usages(), ["status".to_string()]);
    }

    #[test]
    fn descriptor_name_is_lowercased() {
        let d = CommandDescriptor::new(ShellType::Shell, "Echo", "help.echo", Arc::new(Nop));
        assert_eq!(d.name(), "echo");
    }

    #[test]
    fn unified_descriptor_has_no_owning_shell() {
        let d = CommandDescriptor::unified("exit", "help.exit", Arc::new(Nop));
        assert!(d.shell().is_none());
        assert_eq!(d.origin(), Origin::Unified);
    }

    #[test]
    fn mod_tagging_sets_origin_and_source() {
        let d = CommandDescriptor::new(ShellType::Shell, "portscan", "k", Arc::new(Nop))
            .from_mod("netpack");
        assert_eq!(d.origin(), Origin::Mod);
        assert_eq!(d.source_id(), Some("netpack"));
    }

    #[test]
    fn invocation_output_slot() {
        let mut inv = CommandInvocation::new(
            ShellType::Shell,
            UserFlags::empty(),
            0,
            vec!["a".into()],
            HashMap::new(),
        );
        assert_eq!(inv.arg(0), Some("a"));
        assert_eq!(inv.arg(1), None);
        inv.set_output("value");
        assert_eq!(inv.take_output().as_deref(), Some("value"));
        assert!(inv.take_output().is_none());
    }
}

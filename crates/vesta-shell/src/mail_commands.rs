//! Built-in commands of the mail client shell.

use std::sync::{Arc, PoisonError, RwLock};

use vesta_types::error::{Result, ShellError};
use vesta_types::flags::CommandFlags;
use vesta_types::shell::ShellType;

use crate::descriptor::{ArgVariant, CommandDescriptor, CommandHandler, CommandInvocation};
use crate::registry::RegistryService;

#[derive(Debug, Clone)]
struct Message {
    from: String,
    subject: String,
    body: String,
    urgent: bool,
    read: bool,
}

/// In-memory mailbox shared by the mail shell's commands.
#[derive(Debug, Default)]
pub struct MailStore {
    messages: RwLock<Vec<Message>>,
}

impl MailStore {
    fn with_demo_content() -> Self {
        let store = Self::default();
        {
            let mut inbox = store.lock();
            inbox.push(Message {
                from: "sysop".into(),
                subject: "Welcome to VESTA_OS".into(),
                body: "Your account is ready. Type 'help' to get started.".into(),
                urgent: false,
                read: false,
            });
            inbox.push(Message {
                from: "watchdog".into(),
                subject: "Nightly diagnostics".into(),
                body: "All subsystems nominal.".into(),
                urgent: false,
                read: false,
            });
        }
        store
    }

    fn lock(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Message>> {
        self.messages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Register the mail shell vocabulary.
pub fn register_mail_commands(reg: &RegistryService) -> Result<()> {
    let store = Arc::new(MailStore::with_demo_content());
    reg.register(
        CommandDescriptor::new(
            ShellType::Mail,
            "list",
            "help.mail.list",
            Arc::new(ListCmd {
                store: Arc::clone(&store),
            }),
        )
        .variant(ArgVariant::new().switch("unread", false, "help.mail.list.unread"))
        .flags(CommandFlags::REDIRECTION | CommandFlags::WRAPPABLE),
    )?;
    reg.register(
        CommandDescriptor::new(
            ShellType::Mail,
            "read",
            "help.mail.read",
            Arc::new(ReadCmd {
                store: Arc::clone(&store),
            }),
        )
        .variant(ArgVariant::new().part("<index>"))
        .flags(CommandFlags::WRAPPABLE),
    )?;
    reg.register(
        CommandDescriptor::new(
            ShellType::Mail,
            "send",
            "help.mail.send",
            Arc::new(SendCmd {
                store: Arc::clone(&store),
            }),
        )
        .variant(
            ArgVariant::new()
                .part("<recipient>")
                .part("<subject>")
                .part("[body...]")
                .switch("urgent", false, "help.mail.send.urgent"),
        ),
    )?;
    reg.register(
        CommandDescriptor::new(
            ShellType::Mail,
            "count",
            "help.mail.count",
            Arc::new(CountCmd { store }),
        )
        .flags(CommandFlags::SETS_VARIABLE),
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

struct ListCmd {
    store: Arc<MailStore>,
}
impl CommandHandler for ListCmd {
    fn run(&self, inv: &mut CommandInvocation) -> Result<i32> {
        let unread_only = inv.has_switch("unread");
        let inbox = self.store.lock();
        let mut shown = 0;
        for (i, msg) in inbox.iter().enumerate() {
            if unread_only && msg.read {
                continue;
            }
            let marker = if msg.urgent { "!" } else if msg.read { " " } else { "*" };
            inv.emit(format!("{marker} {i:3}  {:10}  {}", msg.from, msg.subject));
            shown += 1;
        }
        if shown == 0 {
            inv.emit("(no messages)");
        }
        Ok(0)
    }
}

// ---------------------------------------------------------------------------
// read
// ---------------------------------------------------------------------------

struct ReadCmd {
    store: Arc<MailStore>,
}
impl CommandHandler for ReadCmd {
    fn run(&self, inv: &mut CommandInvocation) -> Result<i32> {
        let raw = inv.arg(0).unwrap_or_default();
        let index: usize = raw
            .parse()
            .map_err(|_| ShellError::Mail(format!("not a message index: {raw}")))?;
        let mut inbox = self.store.lock();
        let Some(msg) = inbox.get_mut(index) else {
            return Err(ShellError::Mail(format!("no message {index}")));
        };
        msg.read = true;
        inv.emit(format!("From:    {}", msg.from));
        inv.emit(format!("Subject: {}", msg.subject));
        inv.emit(String::new());
        inv.emit(msg.body.clone());
        Ok(0)
    }
}

// ---------------------------------------------------------------------------
// send
// ---------------------------------------------------------------------------

struct SendCmd {
    store: Arc<MailStore>,
}
impl CommandHandler for SendCmd {
    fn run(&self, inv: &mut CommandInvocation) -> Result<i32> {
        let recipient = inv.arg(0).unwrap_or_default().to_string();
        let subject = inv.arg(1).unwrap_or_default().to_string();
        let body = inv.args[2..].join(" ");
        if recipient.is_empty() {
            return Err(ShellError::Mail("recipient must not be empty".to_string()));
        }
        let mut inbox = self.store.lock();
        inbox.push(Message {
            from: format!("to:{recipient}"),
            subject,
            body,
            urgent: inv.has_switch("urgent"),
            read: true,
        });
        inv.emit(format!("Message to {recipient} queued."));
        Ok(0)
    }
}

// ---------------------------------------------------------------------------
// count
// ---------------------------------------------------------------------------

struct CountCmd {
    store: Arc<MailStore>,
}
impl CommandHandler for CountCmd {
    fn run(&self, inv: &mut CommandInvocation) -> Result<i32> {
        let inbox = self.store.lock();
        let unread = inbox.iter().filter(|m| !m.read).count();
        inv.emit(format!("{} message(s), {unread} unread", inbox.len()));
        inv.set_output(inbox.len().to_string());
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use vesta_types::error::ErrorKind;
    use vesta_types::flags::UserFlags;

    use super::*;
    use crate::dispatch::{DispatchOutcome, Dispatcher};
    use crate::kernel::KernelState;

    fn engine() -> Dispatcher {
        let reg = Arc::new(RegistryService::new());
        register_mail_commands(&reg).unwrap();
        Dispatcher::new(reg, Arc::new(KernelState::new()))
    }

    fn run(d: &Dispatcher, line: &str) -> DispatchOutcome {
        let mut vars = HashMap::new();
        d.dispatch(ShellType::Mail, line, UserFlags::empty(), &mut vars)
    }

    fn lines(out: DispatchOutcome) -> Vec<String> {
        match out {
            DispatchOutcome::Completed { lines, .. } => lines,
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn list_shows_seeded_inbox() {
        let d = engine();
        let out = lines(run(&d, "list"));
        assert_eq!(out.len(), 2);
        assert!(out[0].contains("sysop"));
    }

    #[test]
    fn read_marks_message_and_unread_filter_hides_it() {
        let d = engine();
        assert!(run(&d, "read 0").is_success());
        let out = lines(run(&d, "list -unread"));
        assert_eq!(out.len(), 1);
        assert!(out[0].contains("watchdog"));
    }

    #[test]
    fn read_bad_index_is_a_mail_error() {
        let d = engine();
        assert_eq!(run(&d, "read 99").exit_code(), ErrorKind::Mail.exit_code());
        assert_eq!(run(&d, "read abc").exit_code(), ErrorKind::Mail.exit_code());
    }

    #[test]
    fn send_appends_and_count_reflects_it() {
        let d = engine();
        assert!(run(&d, "send alice \"status report\" all good").is_success());
        let out = lines(run(&d, "count"));
        assert!(out[0].starts_with("3 message(s)"));
    }

    #[test]
    fn send_requires_subject() {
        let d = engine();
        let out = run(&d, "send alice");
        assert_eq!(out.exit_code(), ErrorKind::InvalidArguments.exit_code());
    }

    #[test]
    fn count_sets_the_output_variable() {
        let d = engine();
        let mut vars = HashMap::new();
        let out = d.dispatch(ShellType::Mail, "n = count", UserFlags::empty(), &mut vars);
        assert!(out.is_success());
        assert_eq!(vars.get("n").map(String::as_str), Some("2"));
    }
}

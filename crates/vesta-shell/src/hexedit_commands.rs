//! Built-in commands of the hex-editor shell.
//!
//! The editor works on a single in-memory buffer. Its failures are
//! ordinary small handler codes (1 = no buffer open, 2 = out of range),
//! surfaced verbatim by the dispatcher.

use std::sync::{Arc, PoisonError, RwLock};

use vesta_types::error::Result;
use vesta_types::flags::CommandFlags;
use vesta_types::shell::ShellType;

use crate::descriptor::{ArgVariant, CommandDescriptor, CommandHandler, CommandInvocation};
use crate::registry::RegistryService;

const NO_BUFFER: i32 = 1;
const OUT_OF_RANGE: i32 = 2;

#[derive(Debug)]
struct Buffer {
    name: String,
    bytes: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct HexStore {
    buffer: RwLock<Option<Buffer>>,
}

impl HexStore {
    fn lock(&self) -> std::sync::RwLockWriteGuard<'_, Option<Buffer>> {
        self.buffer.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Register the hex-editor shell vocabulary.
pub fn register_hexedit_commands(reg: &RegistryService) -> Result<()> {
    let store = Arc::new(HexStore::default());
    reg.register(
        CommandDescriptor::new(
            ShellType::HexEdit,
            "open",
            "help.hexedit.open",
            Arc::new(OpenCmd {
                store: Arc::clone(&store),
            }),
        )
        .variant(ArgVariant::new().part("<name>").part("[size]")),
    )?;
    reg.register(
        CommandDescriptor::new(
            ShellType::HexEdit,
            "dump",
            "help.hexedit.dump",
            Arc::new(DumpCmd {
                store: Arc::clone(&store),
            }),
        )
        .variant(ArgVariant::new().part("[offset]").part("[count]"))
        .flags(CommandFlags::REDIRECTION | CommandFlags::WRAPPABLE),
    )?;
    reg.register(
        CommandDescriptor::new(
            ShellType::HexEdit,
            "poke",
            "help.hexedit.poke",
            Arc::new(PokeCmd { store }),
        )
        .variant(ArgVariant::new().part("<offset>").part("<byte...>")),
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// open
// ---------------------------------------------------------------------------

struct OpenCmd {
    store: Arc<HexStore>,
}
impl CommandHandler for OpenCmd {
    fn run(&self, inv: &mut CommandInvocation) -> Result<i32> {
        let name = inv.arg(0).unwrap_or_default().to_string();
        let size = match inv.arg(1) {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) => n,
                Err(_) => {
                    inv.emit(format!("open: not a size: {raw}"));
                    return Ok(OUT_OF_RANGE);
                },
            },
            None => 64,
        };
        *self.store.lock() = Some(Buffer {
            name: name.clone(),
            bytes: vec![0; size],
        });
        inv.emit(format!("{name}: {size} byte(s), zero-filled"));
        Ok(0)
    }
}

// ---------------------------------------------------------------------------
// dump
// ---------------------------------------------------------------------------

struct DumpCmd {
    store: Arc<HexStore>,
}
impl CommandHandler for DumpCmd {
    fn run(&self, inv: &mut CommandInvocation) -> Result<i32> {
        let guard = self.store.lock();
        let Some(buffer) = guard.as_ref() else {
            inv.emit("dump: no buffer open");
            return Ok(NO_BUFFER);
        };
        let offset: usize = inv.arg(0).unwrap_or("0").parse().unwrap_or(0);
        let count: usize = inv.arg(1).unwrap_or("64").parse().unwrap_or(64);
        if offset >= buffer.bytes.len() {
            inv.emit(format!("dump: offset {offset} past end of {}", buffer.name));
            return Ok(OUT_OF_RANGE);
        }
        let end = (offset + count).min(buffer.bytes.len());
        for (row_start, row) in buffer.bytes[offset..end].chunks(16).enumerate() {
            let hex: Vec<String> = row.iter().map(|b| format!("{b:02x}")).collect();
            inv.emit(format!(
                "{:08x}  {}",
                offset + row_start * 16,
                hex.join(" ")
            ));
        }
        Ok(0)
    }
}

// ---------------------------------------------------------------------------
// poke
// ---------------------------------------------------------------------------

struct PokeCmd {
    store: Arc<HexStore>,
}
impl CommandHandler for PokeCmd {
    fn run(&self, inv: &mut CommandInvocation) -> Result<i32> {
        let mut guard = self.store.lock();
        let Some(buffer) = guard.as_mut() else {
            inv.emit("poke: no buffer open");
            return Ok(NO_BUFFER);
        };
        let raw_offset = inv.arg(0).unwrap_or_default();
        let Ok(offset) = parse_number(raw_offset) else {
            inv.emit(format!("poke: not an offset: {raw_offset}"));
            return Ok(OUT_OF_RANGE);
        };
        let mut values = Vec::with_capacity(inv.args.len() - 1);
        for raw in &inv.args[1..] {
            match parse_number(raw) {
                Ok(v) if v <= 0xff => values.push(v as u8),
                _ => {
                    inv.emit(format!("poke: not a byte: {raw}"));
                    return Ok(OUT_OF_RANGE);
                },
            }
        }
        if offset + values.len() > buffer.bytes.len() {
            inv.emit(format!(
                "poke: write past end of {} ({} byte(s))",
                buffer.name,
                buffer.bytes.len()
            ));
            return Ok(OUT_OF_RANGE);
        }
        buffer.bytes[offset..offset + values.len()].copy_from_slice(&values);
        inv.emit(format!("wrote {} byte(s) at {offset:#x}", values.len()));
        Ok(0)
    }
}

/// Accepts decimal or `0x`-prefixed hex.
fn parse_number(raw: &str) -> std::result::Result<usize, std::num::ParseIntError> {
    match raw.strip_prefix("0x") {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => raw.parse(),
    }
}

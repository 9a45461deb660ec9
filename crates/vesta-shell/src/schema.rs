//! Argument schema validation.
//!
//! Matches a tokenized line against a descriptor's variants in
//! declaration order; the first satisfiable variant wins. A variant is
//! satisfiable when the positional count meets its minimum and every
//! switch token matches a declared switch (unknown or malformed switches
//! are a hard failure, never silently dropped).

use std::collections::HashMap;

use vesta_types::error::{Result, ShellError};

use crate::descriptor::{ArgVariant, CommandDescriptor};
use crate::token::{SwitchToken, TokenizedLine};

/// The outcome of a successful match: which variant matched and the
/// arguments as the handler will see them.
#[derive(Debug)]
pub struct MatchedArgs {
    pub variant: usize,
    pub positionals: Vec<String>,
    pub switches: HashMap<String, Option<String>>,
}

/// Find the first variant satisfied by `line`, or fail with the full
/// usage set attached.
pub fn match_variants(desc: &CommandDescriptor, line: &TokenizedLine) -> Result<MatchedArgs> {
    let variants = desc.variants();

    // A descriptor without declared variants accepts positionals freely
    // but no switches.
    if variants.is_empty() {
        if line.switches.is_empty() {
            return Ok(MatchedArgs {
                variant: 0,
                positionals: line.positionals.clone(),
                switches: HashMap::new(),
            });
        }
        return Err(invalid(desc));
    }

    for (index, variant) in variants.iter().enumerate() {
        if satisfies(variant, line) {
            let switches = line
                .switches
                .iter()
                .map(|s| (s.name.clone(), s.value.clone()))
                .collect();
            return Ok(MatchedArgs {
                variant: index,
                positionals: line.positionals.clone(),
                switches,
            });
        }
    }

    Err(invalid(desc))
}

fn satisfies(variant: &ArgVariant, line: &TokenizedLine) -> bool {
    if line.positionals.len() < variant.min_required() {
        return false;
    }
    line.switches.iter().all(|token| switch_ok(variant, token))
}

fn switch_ok(variant: &ArgVariant, token: &SwitchToken) -> bool {
    match variant.find_switch(&token.name) {
        Some(decl) => decl.takes_value == token.value.is_some(),
        None => false,
    }
}

fn invalid(desc: &CommandDescriptor) -> ShellError {
    ShellError::InvalidArguments {
        name: desc.name().to_string(),
        usages: desc.usages(),
    }
}

//! Command-line tokenizer.
//!
//! Splits a raw input line into a command name, positional tokens, and
//! switch tokens. Quoted substrings (matching `"` or `'` pairs) form a
//! single token; a backslash escapes the next character, so an embedded
//! escaped quote is literal.

use vesta_types::error::{Result, ShellError};

/// A parsed `-name` or `-name=value` token. Switch names are
/// case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchToken {
    pub name: String,
    pub value: Option<String>,
}

/// One tokenized input line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenizedLine {
    /// Lowercased command name.
    pub name: String,
    pub positionals: Vec<String>,
    pub switches: Vec<SwitchToken>,
}

/// Tokenize a line respecting quotes and backslash escapes.
pub fn tokenize(input: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars();
    let mut quote: Option<char> = None;
    // Distinguishes an empty quoted token ("") from no token at all.
    let mut token_open = false;

    while let Some(ch) = chars.next() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            } else if ch == '\\' {
                match chars.next() {
                    Some(next) if next == q || next == '\\' => current.push(next),
                    Some(next) => {
                        current.push('\\');
                        current.push(next);
                    },
                    None => current.push('\\'),
                }
            } else {
                current.push(ch);
            }
            continue;
        }

        match ch {
            '"' | '\'' => {
                quote = Some(ch);
                token_open = true;
            },
            '\\' => {
                if let Some(next) = chars.next() {
                    current.push(next);
                    token_open = true;
                }
            },
            c if c.is_whitespace() => {
                if token_open || !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                    token_open = false;
                }
            },
            _ => {
                current.push(ch);
                token_open = true;
            },
        }
    }

    if quote.is_some() {
        return Err(ShellError::InvalidArguments {
            name: first_word(input),
            usages: Vec::new(),
        });
    }

    if token_open || !current.is_empty() {
        tokens.push(current);
    }

    Ok(tokens)
}

/// Split a raw line into name, positionals, and switches.
///
/// Returns `Ok(None)` for a blank line. The command name is lowercased;
/// switch names keep their case.
pub fn parse_line(input: &str) -> Result<Option<TokenizedLine>> {
    let tokens = tokenize(input)?;
    let mut iter = tokens.into_iter();
    let Some(name) = iter.next() else {
        return Ok(None);
    };

    let mut line = TokenizedLine {
        name: name.to_ascii_lowercase(),
        ..TokenizedLine::default()
    };
    for token in iter {
        push_token(&mut line, token);
    }
    Ok(Some(line))
}

/// Append one already-tokenized argument to a line, classifying it as a
/// switch or positional.
pub fn push_token(line: &mut TokenizedLine, token: String) {
    if let Some(body) = switch_body(&token) {
        match body.split_once('=') {
            Some((name, value)) => line.switches.push(SwitchToken {
                name: name.to_string(),
                value: Some(value.to_string()),
            }),
            None => line.switches.push(SwitchToken {
                name: body.to_string(),
                value: None,
            }),
        }
    } else {
        line.positionals.push(token);
    }
}

/// A token is a switch if it starts with a single `-` followed by a
/// letter. Bare `-`, `--`, and negative numbers stay positional.
fn switch_body(token: &str) -> Option<&str> {
    let body = token.strip_prefix('-')?;
    let first = body.chars().next()?;
    if first.is_ascii_alphabetic() {
        Some(body)
    } else {
        None
    }
}

fn first_word(input: &str) -> String {
    input
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string()
}

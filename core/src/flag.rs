//! Flag and positional field definitions owned by a [`FlagSet`](crate::FlagSet).

use crate::value::Value;

/// A registered option, reachable by long name and/or short character.
#[derive(Debug, Clone, PartialEq)]
pub struct Flag {
    /// Long form without the leading `--` (empty for short-only flags).
    pub name: String,
    /// Short form without the leading `-`.
    pub short: Option<char>,
    pub usage: String,
    /// Current bound value.
    pub value: Value,
    /// Value at registration time.
    pub default: Value,
}

impl Flag {
    pub fn new(name: &str, short: Option<char>, value: Value, usage: &str) -> Self {
        Self {
            name: name.to_string(),
            short,
            usage: usage.to_string(),
            default: value.clone(),
            value,
        }
    }

    /// Whether the flag consumes no following token.
    pub fn is_nullary(&self) -> bool {
        self.value.is_nullary()
    }

    /// The registration-time value rendered as text.
    pub fn default_text(&self) -> String {
        self.default.to_string()
    }

    /// `--name` when a long form exists, `-c` otherwise.
    pub fn display_name(&self) -> String {
        match self.short {
            Some(c) if self.name.is_empty() => format!("-{c}"),
            _ => format!("--{}", self.name),
        }
    }
}

/// A value bound to the literal token at a fixed zero-based position.
///
/// Positions may have gaps. A field whose index is beyond the literal tokens
/// of a parse keeps the value it had before that parse.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionalField {
    pub name: String,
    pub index: usize,
    pub usage: String,
    pub value: Value,
    pub default: Value,
}

/// Named binding for a captured token list (rest or unknown capture).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capture {
    pub name: String,
    pub usage: String,
    pub values: Vec<String>,
}

impl Capture {
    pub fn new(name: &str, usage: &str) -> Self {
        Self {
            name: name.to_string(),
            usage: usage.to_string(),
            values: Vec::new(),
        }
    }
}

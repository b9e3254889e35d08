//! The option schema of a single command.
//!
//! A [`FlagSet`] owns its registered flags, positional fields, the optional
//! rest and unknown-flag captures, and the leftover literal tokens of the
//! last [`parse`](FlagSet::parse). Values live inside the set; callers read
//! them back through the typed getters after parsing.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::TimeDelta;
use serde::Serialize;
use tracing::debug;

use crate::flag::{Capture, Flag, PositionalField};
use crate::value::Value;

/// Option schema plus the mutable result of the last parse.
///
/// Registering a flag under a long name or short character that is already
/// taken silently re-points that name to the new flag. The earlier flag stays
/// reachable through whichever of its names was not taken over.
///
/// # Examples
///
/// ```
/// use cmdroute_core::FlagSet;
///
/// let mut fs = FlagSet::new("build");
/// fs.add_bool("verbose", Some('v'), false, "verbose output")
///     .add_string("output", Some('o'), "a.out", "output file")
///     .add_int("jobs", Some('j'), 1, "parallel jobs");
///
/// fs.parse(["-v", "--output=program", "-j4", "main.rs"]).unwrap();
///
/// assert_eq!(fs.get_bool("verbose"), Some(true));
/// assert_eq!(fs.get_str("output"), Some("program"));
/// assert_eq!(fs.get_int("jobs"), Some(4));
/// assert_eq!(fs.args(), ["main.rs"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FlagSet {
    name: String,
    pub(crate) flags: Vec<Flag>,
    pub(crate) long: HashMap<String, usize>,
    pub(crate) short: HashMap<char, usize>,
    pub(crate) positional: BTreeMap<usize, PositionalField>,
    pub(crate) rest: Option<Capture>,
    pub(crate) unknown: Option<Capture>,
    pub(crate) allow_unknown: bool,
    pub(crate) unknown_flags: Vec<String>,
    pub(crate) args: Vec<String>,
    pub(crate) parsed: bool,
}

impl FlagSet {
    /// Creates an empty set. The name is only used for diagnostics.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers a flag holding `value` (its registration-time default).
    ///
    /// An empty `name` registers a short-only flag; `short = None` a
    /// long-only flag.
    pub fn add_flag(
        &mut self,
        name: &str,
        short: Option<char>,
        value: Value,
        usage: &str,
    ) -> &mut Self {
        let index = self.flags.len();
        self.flags.push(Flag::new(name, short, value, usage));

        if !name.is_empty() && self.long.insert(name.to_string(), index).is_some() {
            debug!(set = %self.name, flag = name, "long flag re-registered; replacing earlier flag");
        }
        if let Some(c) = short {
            if self.short.insert(c, index).is_some() {
                debug!(set = %self.name, flag = %c, "short flag re-registered; replacing earlier flag");
            }
        }
        self
    }

    pub fn add_bool(&mut self, name: &str, short: Option<char>, default: bool, usage: &str) -> &mut Self {
        self.add_flag(name, short, Value::Bool(default), usage)
    }

    pub fn add_string(&mut self, name: &str, short: Option<char>, default: &str, usage: &str) -> &mut Self {
        self.add_flag(name, short, Value::String(default.to_string()), usage)
    }

    pub fn add_int(&mut self, name: &str, short: Option<char>, default: i64, usage: &str) -> &mut Self {
        self.add_flag(name, short, Value::Int(default), usage)
    }

    pub fn add_duration(
        &mut self,
        name: &str,
        short: Option<char>,
        default: TimeDelta,
        usage: &str,
    ) -> &mut Self {
        self.add_flag(name, short, Value::Duration(default), usage)
    }

    /// Registers a comma-separated list flag.
    pub fn add_string_list(
        &mut self,
        name: &str,
        short: Option<char>,
        default: &[&str],
        usage: &str,
    ) -> &mut Self {
        let default = default.iter().map(|s| s.to_string()).collect();
        self.add_flag(name, short, Value::StringList(default), usage)
    }

    /// Binds the literal token at zero-based `index` to a field named `name`.
    ///
    /// A second registration at the same index replaces the first.
    pub fn add_positional(&mut self, name: &str, index: usize, value: Value, usage: &str) -> &mut Self {
        let field = PositionalField {
            name: name.to_string(),
            index,
            usage: usage.to_string(),
            default: value.clone(),
            value,
        };
        if self.positional.insert(index, field).is_some() {
            debug!(set = %self.name, position = index, "positional field re-registered");
        }
        self
    }

    /// Captures the full literal-token sequence of every parse under `name`.
    pub fn capture_rest(&mut self, name: &str, usage: &str) -> &mut Self {
        self.rest = Some(Capture::new(name, usage));
        self
    }

    /// Captures unknown flags (and everything after the first one) under
    /// `name`, and enables unknown-flag mode.
    pub fn capture_unknown(&mut self, name: &str, usage: &str) -> &mut Self {
        self.unknown = Some(Capture::new(name, usage));
        self.allow_unknown = true;
        self
    }

    /// Switches unknown-flag mode. When enabled, the first unrecognized flag
    /// and every token after it are collected instead of failing the parse.
    pub fn allow_unknown_flags(&mut self, allow: bool) -> &mut Self {
        self.allow_unknown = allow;
        self
    }

    pub fn allows_unknown_flags(&self) -> bool {
        self.allow_unknown
    }

    /// Looks a flag up by long name (without `--`).
    pub fn lookup(&self, name: &str) -> Option<&Flag> {
        self.long.get(name).map(|&i| &self.flags[i])
    }

    /// Looks a flag up by short character (without `-`).
    pub fn lookup_short(&self, short: char) -> Option<&Flag> {
        self.short.get(&short).map(|&i| &self.flags[i])
    }

    /// Flags reachable by at least one name, in registration order.
    pub fn flags(&self) -> impl Iterator<Item = &Flag> {
        let reachable: BTreeSet<usize> = self.long.values().chain(self.short.values()).copied().collect();
        reachable.into_iter().map(move |i| &self.flags[i])
    }

    /// Calls `f` for each reachable flag, ordered by long name (short-only
    /// flags sort by their character).
    pub fn visit_all(&self, mut f: impl FnMut(&Flag)) {
        let mut flags: Vec<&Flag> = self.flags().collect();
        flags.sort_by_key(|flag| sort_key(flag));
        for flag in flags {
            f(flag);
        }
    }

    /// Long flag names with their `--` prefix, sorted.
    pub fn long_flags(&self) -> Vec<String> {
        let mut names: Vec<String> = self.long.keys().map(|name| format!("--{name}")).collect();
        names.sort();
        names
    }

    /// Short flag names with their `-` prefix, sorted.
    pub fn short_flags(&self) -> Vec<String> {
        let mut names: Vec<String> = self.short.keys().map(|c| format!("-{c}")).collect();
        names.sort();
        names
    }

    /// Current value of the flag with long name `name`.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.lookup(name).map(|flag| &flag.value)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.value(name).and_then(Value::as_bool)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.value(name).and_then(Value::as_str)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.value(name).and_then(Value::as_int)
    }

    pub fn get_duration(&self, name: &str) -> Option<TimeDelta> {
        self.value(name).and_then(Value::as_duration)
    }

    pub fn get_string_list(&self, name: &str) -> Option<&[String]> {
        self.value(name).and_then(Value::as_list)
    }

    /// Current value of the positional field named `name`.
    pub fn positional(&self, name: &str) -> Option<&Value> {
        self.positional
            .values()
            .find(|field| field.name == name)
            .map(|field| &field.value)
    }

    /// Current value of the positional field at `index`.
    pub fn positional_at(&self, index: usize) -> Option<&Value> {
        self.positional.get(&index).map(|field| &field.value)
    }

    /// Positional fields ordered by index.
    pub fn positional_fields(&self) -> impl Iterator<Item = &PositionalField> {
        self.positional.values()
    }

    pub fn has_positional_args(&self) -> bool {
        !self.positional.is_empty()
    }

    /// Highest declared position plus one (0 without positional fields).
    pub fn positional_count(&self) -> usize {
        self.positional.keys().next_back().map_or(0, |max| max + 1)
    }

    pub fn has_rest_args(&self) -> bool {
        self.rest.is_some()
    }

    pub fn rest_capture(&self) -> Option<&Capture> {
        self.rest.as_ref()
    }

    pub fn unknown_capture(&self) -> Option<&Capture> {
        self.unknown.as_ref()
    }

    /// The rest capture's tokens, if a rest capture is bound.
    pub fn rest(&self) -> Option<&[String]> {
        self.rest.as_ref().map(|capture| capture.values.as_slice())
    }

    /// Tokens absorbed in unknown-flag mode by the last parse.
    pub fn unknown_flags(&self) -> &[String] {
        &self.unknown_flags
    }

    /// Literal (non-flag) tokens left over by the last parse.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Whether [`parse`](FlagSet::parse) has been called.
    pub fn is_parsed(&self) -> bool {
        self.parsed
    }

    /// Snapshot of every bound value, keyed by flag or field name.
    ///
    /// Flags are keyed by long name, or by their short character when they
    /// have none.
    pub fn bindings(&self) -> Bindings {
        let flags = self
            .flags()
            .map(|flag| (sort_key(flag), flag.value.clone()))
            .collect();
        let positional = self
            .positional
            .values()
            .map(|field| (field.name.clone(), field.value.clone()))
            .collect();

        Bindings {
            flags,
            positional,
            rest: self.rest().map(<[String]>::to_vec),
            unknown: self.unknown_flags.clone(),
            args: self.args.clone(),
        }
    }
}

fn sort_key(flag: &Flag) -> String {
    match flag.short {
        Some(c) if flag.name.is_empty() => c.to_string(),
        _ => flag.name.clone(),
    }
}

/// Serializable snapshot of a [`FlagSet`] after parsing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bindings {
    pub flags: BTreeMap<String, Value>,
    pub positional: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rest: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unknown: Vec<String>,
    pub args: Vec<String>,
}

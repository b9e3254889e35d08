//! The command capability and a closure-backed implementation.

use std::fmt;

use cmdroute_core::{FlagSet, SchemaError, SchemaSpec};

/// What a command's [`run`](Command::run) returns.
pub type RunResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// A unit of work registered under a command path.
///
/// The dispatcher asks for the option schema once, at registration, and owns
/// that copy from then on. Each execution parses into it and hands it back
/// to [`run`](Command::run) by reference.
pub trait Command {
    /// The option schema the command's arguments are parsed against.
    fn flag_set(&self) -> FlagSet;

    /// Runs the command with the parsed schema and its leftover literal
    /// tokens.
    fn run(&mut self, flags: &FlagSet, args: &[String]) -> RunResult;

    /// One-line description shown in help and completions.
    fn usage(&self) -> &str {
        ""
    }
}

/// A [`Command`] made of an option schema and a closure.
///
/// # Examples
///
/// ```
/// use cmdroute_core::FlagSet;
/// use cmdroute_dispatch::{Command, FnCommand};
///
/// let mut fs = FlagSet::new("greet");
/// fs.add_string("name", Some('n'), "world", "who to greet");
///
/// let cmd = FnCommand::new(fs, |flags: &FlagSet, _args: &[String]| {
///     println!("hello, {}", flags.get_str("name").unwrap_or_default());
///     Ok(())
/// })
/// .with_usage("Print a greeting");
///
/// assert_eq!(cmd.usage(), "Print a greeting");
/// ```
pub struct FnCommand<F> {
    flags: FlagSet,
    usage: String,
    handler: F,
}

impl<F> FnCommand<F>
where
    F: FnMut(&FlagSet, &[String]) -> RunResult,
{
    pub fn new(flags: FlagSet, handler: F) -> Self {
        Self {
            flags,
            usage: String::new(),
            handler,
        }
    }

    /// Builds the option schema from a declarative description.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] when the description is malformed.
    pub fn from_spec(name: &str, spec: &SchemaSpec, handler: F) -> Result<Self, SchemaError> {
        Ok(Self::new(spec.build(name)?, handler))
    }

    pub fn with_usage(mut self, usage: &str) -> Self {
        self.usage = usage.to_string();
        self
    }
}

impl<F> Command for FnCommand<F>
where
    F: FnMut(&FlagSet, &[String]) -> RunResult,
{
    fn flag_set(&self) -> FlagSet {
        self.flags.clone()
    }

    fn run(&mut self, flags: &FlagSet, args: &[String]) -> RunResult {
        (self.handler)(flags, args)
    }

    fn usage(&self) -> &str {
        &self.usage
    }
}

impl<F> fmt::Debug for FnCommand<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCommand")
            .field("flags", &self.flags)
            .field("usage", &self.usage)
            .finish_non_exhaustive()
    }
}

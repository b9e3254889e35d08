//! The command registry and execution flow.

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};

use cmdroute_core::FlagSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::command::Command;
use crate::error::{DispatchError, Result};
use crate::manifest::CommandDecl;
use crate::resolve::is_help_flag;

/// Dispatcher settings.
///
/// # Examples
///
/// ```
/// use cmdroute_dispatch::DispatcherConfig;
///
/// let config: DispatcherConfig = serde_yaml::from_str("name: myapp\nhelp_word: false").unwrap();
/// assert_eq!(config.name, "myapp");
/// assert!(!config.help_word);
/// assert!(config.completion_flags);
/// assert_eq!(config.completion_env.as_deref(), Some("COMP_LINE"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Program name used in help output and completion scripts.
    pub name: String,
    /// Paragraph printed under the general usage line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Treat the bare word `help` as a help request.
    pub help_word: bool,
    /// Honor `--complete-bash`, `--complete-zsh`, `--generate-bash-completion`
    /// and `--generate-zsh-completion` as the first token.
    pub completion_flags: bool,
    /// Environment variable that, when set and non-empty, turns execution
    /// into printing bash completions.
    pub completion_env: Option<String>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            name: "app".to_string(),
            description: None,
            help_word: true,
            completion_flags: true,
            completion_env: Some("COMP_LINE".to_string()),
        }
    }
}

/// A registered command with the option schema it parses into.
pub struct CommandEntry {
    /// Normalized, space-joined command path.
    pub path: String,
    pub usage: String,
    pub(crate) flags: FlagSet,
    pub(crate) command: Box<dyn Command>,
}

impl CommandEntry {
    /// The entry's option schema, holding the values of the last execution.
    pub fn flags(&self) -> &FlagSet {
        &self.flags
    }

    pub fn command(&self) -> &dyn Command {
        self.command.as_ref()
    }
}

impl fmt::Debug for CommandEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandEntry")
            .field("path", &self.path)
            .field("usage", &self.usage)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

/// What [`Dispatcher::execute`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The command at this path ran successfully.
    Ran(String),
    /// Help was printed: for a command, or general help when `None`.
    Help(Option<String>),
    /// A completion request was answered.
    Completed,
}

/// Collapses runs of whitespace so paths compare word by word.
///
/// ```
/// assert_eq!(cmdroute_dispatch::normalize_path("  foo   bar "), "foo bar");
/// ```
pub fn normalize_path(path: &str) -> String {
    path.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Maps command paths to commands and routes argument vectors to them.
///
/// Not safe for concurrent use: registration and execution mutate the
/// registry in place.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, Mutex};
///
/// use cmdroute_core::FlagSet;
/// use cmdroute_dispatch::{Dispatcher, FnCommand, Outcome};
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
///
/// let mut fs = FlagSet::new("start");
/// fs.add_int("port", Some('p'), 8080, "listen port");
///
/// let mut d = Dispatcher::new("app");
/// d.dispatch(
///     "server start",
///     FnCommand::new(fs, move |flags: &FlagSet, args: &[String]| {
///         sink.lock().unwrap().push((flags.get_int("port"), args.to_vec()));
///         Ok(())
///     }),
/// );
///
/// let mut out = Vec::new();
/// let outcome = d.execute_with(["server", "-p", "9000", "start", "web"], &mut out).unwrap();
///
/// assert_eq!(outcome, Outcome::Ran("server start".into()));
/// assert_eq!(seen.lock().unwrap()[0], (Some(9000), vec!["web".to_string()]));
/// ```
#[derive(Debug, Default)]
pub struct Dispatcher {
    config: DispatcherConfig,
    pub(crate) commands: HashMap<String, CommandEntry>,
}

impl Dispatcher {
    pub fn new(name: &str) -> Self {
        Self::with_config(DispatcherConfig {
            name: name.to_string(),
            ..Default::default()
        })
    }

    pub fn with_config(config: DispatcherConfig) -> Self {
        Self {
            config,
            commands: HashMap::new(),
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Registers `command` under `path`, replacing any command already there.
    ///
    /// The command's option schema and usage text are captured now.
    pub fn dispatch(&mut self, path: &str, command: impl Command + 'static) -> &mut Self {
        let path = normalize_path(path);
        let entry = CommandEntry {
            path: path.clone(),
            usage: command.usage().to_string(),
            flags: command.flag_set(),
            command: Box::new(command),
        };
        if self.commands.insert(path.clone(), entry).is_some() {
            debug!(path = %path, "command re-registered; replacing earlier command");
        }
        self
    }

    pub fn get_command(&self, path: &str) -> Option<&dyn Command> {
        self.get_entry(path).map(CommandEntry::command)
    }

    pub fn get_entry(&self, path: &str) -> Option<&CommandEntry> {
        self.commands.get(&normalize_path(path))
    }

    pub fn has_command(&self, path: &str) -> bool {
        self.commands.contains_key(&normalize_path(path))
    }

    pub fn remove(&mut self, path: &str) -> Option<CommandEntry> {
        self.commands.remove(&normalize_path(path))
    }

    /// Registered entries sorted by path.
    pub fn entries(&self) -> Vec<&CommandEntry> {
        let mut entries: Vec<&CommandEntry> = self.commands.values().collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        entries
    }

    /// Serializable description of every registered command, sorted by path.
    pub fn describe(&self) -> Vec<CommandDecl> {
        self.entries()
            .into_iter()
            .map(|entry| CommandDecl {
                path: entry.path.clone(),
                usage: entry.usage.clone(),
                schema: entry.flags.to_spec(),
            })
            .collect()
    }

    /// Executes `args` (without the program name), writing any help or
    /// completion output to stdout.
    ///
    /// # Errors
    ///
    /// See [`execute_with`](Dispatcher::execute_with).
    pub fn execute<I, S>(&mut self, args: I) -> Result<Outcome>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.execute_with(args, &mut out)
    }

    /// Executes `args`, writing any help or completion output to `out`.
    ///
    /// In order: completion requests are answered; empty input prints general
    /// help; the command is resolved; a help token (`-h`, `--help`, or the
    /// word `help`, anywhere in `args`) prints that command's help, or general
    /// help when nothing resolved; otherwise the command's arguments are
    /// parsed and the command runs.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::CommandNotFound`] when no path matches,
    /// [`DispatchError::Parse`] when the command's schema rejects its
    /// arguments, [`DispatchError::Command`] when the command fails, and
    /// [`DispatchError::Io`] when writing output fails.
    pub fn execute_with<I, S, W>(&mut self, args: I, out: &mut W) -> Result<Outcome>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        W: Write,
    {
        let args: Vec<String> = args.into_iter().map(|arg| arg.as_ref().to_string()).collect();

        if self.handle_completion(&args, out)? {
            return Ok(Outcome::Completed);
        }

        if args.is_empty() {
            self.write_help(out)?;
            return Ok(Outcome::Help(None));
        }

        let wants_help = self.wants_help(&args);
        let resolved = match self.resolve(&args) {
            Some(resolved) => Some(resolved),
            None if wants_help && self.config.help_word => self.resolve(&without_help_word(&args)),
            None => None,
        };
        let Some(resolved) = resolved else {
            if wants_help {
                debug!("help requested without a command");
                self.write_help(out)?;
                return Ok(Outcome::Help(None));
            }
            return Err(DispatchError::CommandNotFound(args));
        };

        if wants_help {
            debug!(path = %resolved.path, "help requested");
            self.write_command_help(&resolved.path, out)?;
            return Ok(Outcome::Help(Some(resolved.path)));
        }

        let entry = self
            .commands
            .get_mut(&resolved.path)
            .ok_or_else(|| DispatchError::CommandNotFound(args.clone()))?;

        entry
            .flags
            .parse(&resolved.args)
            .map_err(|source| DispatchError::Parse {
                path: resolved.path.clone(),
                source,
            })?;

        debug!(path = %resolved.path, args = ?entry.flags.args(), "running command");
        entry
            .command
            .run(&entry.flags, entry.flags.args())
            .map_err(|source| DispatchError::Command {
                path: resolved.path.clone(),
                source,
            })?;

        Ok(Outcome::Ran(resolved.path))
    }

    fn wants_help(&self, args: &[String]) -> bool {
        args.iter()
            .any(|arg| is_help_flag(arg) || (self.config.help_word && arg == "help"))
    }
}

/// `args` with every `help` word removed, so `help server start` resolves
/// like `server start`.
fn without_help_word(args: &[String]) -> Vec<String> {
    args.iter().filter(|arg| *arg != "help").cloned().collect()
}

//! Hierarchical command registry and interspersed-flag resolver.
//!
//! A [`Dispatcher`] maps whitespace-normalized command paths such as
//! `"server start"` to [`Command`]s. Given raw program arguments it finds the
//! command they address, even when flags appear before, between or after
//! the path words, reassembles that command's argument vector, parses it
//! against the command's [`FlagSet`](cmdroute_core::FlagSet) and runs it.
//!
//! Around that core sit help rendering, shell completion (candidates,
//! protocol flags and bash/zsh scripts) and YAML [`Manifest`]s that declare
//! a whole program.
//!
//! # Example
//!
//! ```
//! use cmdroute_core::FlagSet;
//! use cmdroute_dispatch::{Dispatcher, FnCommand, Outcome};
//!
//! let mut fs = FlagSet::new("start");
//! fs.add_string("config", Some('C'), "", "config file");
//!
//! let mut d = Dispatcher::new("app");
//! d.dispatch(
//!     "server start",
//!     FnCommand::new(fs, |flags: &FlagSet, _args: &[String]| {
//!         assert_eq!(flags.get_str("config"), Some("prod.yml"));
//!         Ok(())
//!     })
//!     .with_usage("Start the server"),
//! );
//!
//! let mut out = Vec::new();
//! let outcome = d.execute_with(["server", "-C", "prod.yml", "start"], &mut out).unwrap();
//! assert_eq!(outcome, Outcome::Ran("server start".into()));
//!
//! let outcome = d.execute_with(["server", "start", "--help"], &mut out).unwrap();
//! assert_eq!(outcome, Outcome::Help(Some("server start".into())));
//! assert!(String::from_utf8(out).unwrap().contains("Start the server"));
//! ```

mod command;
mod completion;
mod dispatcher;
mod error;
mod help;
mod manifest;
mod resolve;

pub use cmdroute_core::Completion;
pub use command::{Command, FnCommand, RunResult};
pub use dispatcher::{CommandEntry, Dispatcher, DispatcherConfig, Outcome, normalize_path};
pub use error::{DispatchError, ManifestError, Result};
pub use manifest::{CommandDecl, Manifest};
pub use resolve::Resolved;

//! Option schemas and the token-level command-line parser.
//!
//! This crate defines the per-command side of argument handling:
//!
//! - [`Value`]: a typed value (bool, string, int, duration, string list)
//!   that knows how to parse and render itself and whether it is nullary.
//! - [`Flag`] and [`PositionalField`]: registered options and index-bound
//!   literal arguments.
//! - [`FlagSet`]: the option schema of one command plus the result of its
//!   last [`parse`](FlagSet::parse).
//! - [`SchemaSpec`]: a serializable, validated description that builds a
//!   [`FlagSet`].
//!
//! Parsing failures are reported as [`ParseError`]; malformed declarative
//! schemas as [`SchemaError`].
//!
//! # Example
//!
//! ```
//! use cmdroute_core::*;
//!
//! let mut fs = FlagSet::new("deploy");
//! fs.add_bool("verbose", Some('v'), false, "verbose output")
//!     .add_string("env", Some('e'), "staging", "target environment")
//!     .add_positional("service", 0, Value::String(String::new()), "service name")
//!     .capture_rest("args", "");
//!
//! fs.parse(["api", "-ve", "prod", "--", "--dry-run"]).unwrap();
//!
//! assert_eq!(fs.get_bool("verbose"), Some(true));
//! assert_eq!(fs.get_str("env"), Some("prod"));
//! assert_eq!(fs.positional("service"), Some(&Value::String("api".into())));
//! assert_eq!(fs.rest().unwrap(), ["api", "--dry-run"]);
//!
//! let err = fs.parse(["--region"]).unwrap_err();
//! assert_eq!(err, ParseError::UnknownFlag("--region".into()));
//! ```

mod complete;
mod error;
mod flag;
mod flagset;
mod parse;
mod spec;
mod value;

pub use complete::Completion;
pub use error::{ParseError, Result};
pub use flag::{Capture, Flag, PositionalField};
pub use flagset::{Bindings, FlagSet};
pub use spec::{CaptureSpec, FlagSpec, PositionalSpec, SchemaError, SchemaSpec};
pub use value::{Value, ValueError, ValueKind};

//! Parse failures reported by [`FlagSet::parse`](crate::FlagSet::parse).

use thiserror::Error;

use crate::value::ValueError;

/// Errors produced while parsing a token vector against a [`FlagSet`](crate::FlagSet).
///
/// The first failure aborts the parse. Values bound by tokens before the
/// failing one keep their new state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A flag token that is not registered, e.g. `--unknown` or `-x`.
    #[error("unknown flag: {0}")]
    UnknownFlag(String),
    /// A value-taking flag with no value available.
    #[error("flag needs an argument: {0}")]
    MissingValue(String),
    /// A flag value that does not convert to the flag's type.
    #[error("invalid flag value: {flag}: {source}")]
    InvalidValue {
        flag: String,
        #[source]
        source: ValueError,
    },
    /// A literal token that does not convert to its positional field's type.
    #[error("invalid value for position {position}: {source}")]
    PositionalConversion {
        position: usize,
        #[source]
        source: ValueError,
    },
}

/// Convenience alias for results with [`ParseError`].
pub type Result<T> = std::result::Result<T, ParseError>;

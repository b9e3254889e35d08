//! Typed values bound to flags and positional arguments.
//!
//! A [`Value`] is one of a closed set of kinds. Each kind knows how to parse
//! a raw token into itself, how to render itself back, and whether it is
//! *nullary* (a flag of that kind consumes no following token).

use std::fmt;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// The kind of a [`Value`], without its payload.
///
/// Used by declarative schemas to name the type of a flag or positional
/// argument.
///
/// # Examples
///
/// ```
/// use cmdroute_core::{Value, ValueKind};
///
/// let value = Value::zero(ValueKind::Duration);
/// assert_eq!(value.kind(), ValueKind::Duration);
/// assert_eq!(value.type_name(), "duration");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// On/off switch; the only nullary kind.
    Bool,
    /// Arbitrary string.
    String,
    /// Signed 64-bit integer.
    Int,
    /// Signed duration such as `1h30m` or `-5s`.
    Duration,
    /// Comma-separated list of strings.
    #[serde(alias = "list")]
    StringList,
}

/// Conversion failure of a raw token into a [`Value`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// Not one of the accepted boolean spellings.
    #[error("invalid boolean {0:?}")]
    Bool(String),
    /// Not a signed 64-bit decimal integer.
    #[error("invalid integer {input:?}: {reason}")]
    Int { input: String, reason: String },
    /// Not a duration.
    #[error("invalid duration {input:?}: {reason}")]
    Duration { input: String, reason: String },
}

/// A typed value held by a flag or positional field.
///
/// # Examples
///
/// ```
/// use cmdroute_core::Value;
///
/// let mut tags = Value::StringList(Vec::new());
/// tags.set("a,b,c").unwrap();
/// assert_eq!(tags.as_list(), Some(&["a".to_string(), "b".to_string(), "c".to_string()][..]));
/// assert_eq!(tags.to_string(), "a,b,c");
///
/// let mut verbose = Value::Bool(false);
/// assert!(verbose.is_nullary());
/// verbose.set("T").unwrap();
/// assert_eq!(verbose.as_bool(), Some(true));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    String(String),
    Int(i64),
    Duration(TimeDelta),
    StringList(Vec<String>),
}

impl Value {
    /// Returns the zero value of `kind` (`false`, `""`, `0`, `0s`, `[]`).
    pub fn zero(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Bool => Value::Bool(false),
            ValueKind::String => Value::String(String::new()),
            ValueKind::Int => Value::Int(0),
            ValueKind::Duration => Value::Duration(TimeDelta::zero()),
            ValueKind::StringList => Value::StringList(Vec::new()),
        }
    }

    /// Parses `raw` as a value of `kind`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValueError`] when `raw` is not a valid spelling for the kind.
    pub fn parse(kind: ValueKind, raw: &str) -> Result<Self, ValueError> {
        let mut value = Value::zero(kind);
        value.set(raw)?;
        Ok(value)
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::String(_) => ValueKind::String,
            Value::Int(_) => ValueKind::Int,
            Value::Duration(_) => ValueKind::Duration,
            Value::StringList(_) => ValueKind::StringList,
        }
    }

    /// Whether a flag holding this value takes no following token.
    pub fn is_nullary(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    /// Name of the value's type as shown in help output.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::String(_) => "string",
            Value::Int(_) => "int",
            Value::Duration(_) => "duration",
            Value::StringList(_) => "value,...",
        }
    }

    /// Replaces the payload with `raw` converted to this value's kind.
    ///
    /// On error the value is left untouched.
    ///
    /// # Errors
    ///
    /// Returns a [`ValueError`] when `raw` cannot be converted.
    pub fn set(&mut self, raw: &str) -> Result<(), ValueError> {
        match self {
            Value::Bool(b) => *b = parse_bool(raw)?,
            Value::String(s) => *s = raw.to_string(),
            Value::Int(i) => {
                *i = raw.parse::<i64>().map_err(|err| ValueError::Int {
                    input: raw.to_string(),
                    reason: err.to_string(),
                })?;
            }
            Value::Duration(d) => *d = parse_duration(raw)?,
            Value::StringList(list) => *list = raw.split(',').map(String::from).collect(),
        }
        Ok(())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<TimeDelta> {
        match self {
            Value::Duration(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::StringList(list) => Some(list),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::String(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{i}"),
            Value::Duration(d) => f.write_str(&format_duration(*d)),
            Value::StringList(list) => f.write_str(&list.join(",")),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::String(s) => serializer.serialize_str(s),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Duration(d) => serializer.serialize_str(&format_duration(*d)),
            Value::StringList(list) => list.serialize(serializer),
        }
    }
}

/// Accepts `1 t T TRUE true True` and `0 f F FALSE false False`.
fn parse_bool(raw: &str) -> Result<bool, ValueError> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(ValueError::Bool(raw.to_string())),
    }
}

fn parse_duration(raw: &str) -> Result<TimeDelta, ValueError> {
    let invalid = |reason: String| ValueError::Duration {
        input: raw.to_string(),
        reason,
    };

    let (negative, magnitude) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    if magnitude == "0" {
        return Ok(TimeDelta::zero());
    }
    // `.5s` means `0.5s`.
    let padded;
    let magnitude = if magnitude.starts_with('.') {
        padded = format!("0{magnitude}");
        padded.as_str()
    } else {
        magnitude
    };

    let std = humantime::parse_duration(magnitude).map_err(|err| invalid(err.to_string()))?;
    let delta = TimeDelta::from_std(std).map_err(|err| invalid(err.to_string()))?;
    Ok(if negative { -delta } else { delta })
}

fn format_duration(delta: TimeDelta) -> String {
    let (sign, magnitude) = if delta < TimeDelta::zero() {
        ("-", -delta)
    } else {
        ("", delta)
    };
    match magnitude.to_std() {
        Ok(std) => format!("{sign}{}", humantime::format_duration(std)),
        // Only reachable for TimeDelta::MIN, whose negation overflows.
        Err(_) => format!("{}ms", delta.num_milliseconds()),
    }
}

//! Declarative schema descriptions.
//!
//! A [`SchemaSpec`] is plain data (typically loaded from YAML or JSON) that
//! describes the flags, positional fields and captures of a command.
//! [`SchemaSpec::build`] validates it and registers everything on a fresh
//! [`FlagSet`]; [`FlagSet::to_spec`] goes the other way for introspection.
//!
//! # Examples
//!
//! ```
//! use cmdroute_core::{FlagSpec, SchemaSpec, ValueKind};
//!
//! let spec = SchemaSpec {
//!     flags: vec![FlagSpec::new(Some("jobs"), Some('j'), ValueKind::Int).with_default("2")],
//!     ..Default::default()
//! };
//! let mut fs = spec.build("build").unwrap();
//! assert_eq!(fs.get_int("jobs"), Some(2));
//!
//! fs.parse(["-j8"]).unwrap();
//! assert_eq!(fs.get_int("jobs"), Some(8));
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::flagset::FlagSet;
use crate::value::{Value, ValueError, ValueKind};

static LONG_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").expect("static regex must compile"));

/// Construction-time problems in a [`SchemaSpec`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A flag has neither a long name nor a short character.
    #[error("flag must define a long name or a short character")]
    MissingFlagName,
    /// Long names are written without dashes and cannot contain `=` or spaces.
    #[error("invalid long flag name: {0:?}")]
    InvalidLongName(String),
    /// Short characters must be ASCII letters or digits.
    #[error("invalid short flag character: {0:?}")]
    InvalidShortName(char),
    /// A declared default does not convert to the declared kind.
    #[error("invalid default for {name}: {source}")]
    InvalidDefault {
        name: String,
        #[source]
        source: ValueError,
    },
    #[error("positional argument at position {position} has no name")]
    EmptyPositionalName { position: usize },
    #[error("capture name cannot be empty")]
    EmptyCaptureName,
}

/// Description of a single flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagSpec {
    /// Long name without the leading `--`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,
    #[serde(default = "flag_kind")]
    pub kind: ValueKind,
    /// Default in its textual form; the kind's zero value when absent.
    #[serde(default, deserialize_with = "scalar_text", skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub usage: String,
}

impl FlagSpec {
    pub fn new(long: Option<&str>, short: Option<char>, kind: ValueKind) -> Self {
        Self {
            long: long.map(String::from),
            short,
            kind,
            default: None,
            usage: String::new(),
        }
    }

    pub fn with_default(mut self, default: &str) -> Self {
        self.default = Some(default.to_string());
        self
    }

    pub fn with_usage(mut self, usage: &str) -> Self {
        self.usage = usage.to_string();
        self
    }

    fn display_name(&self) -> String {
        match (&self.long, self.short) {
            (Some(long), _) => format!("--{long}"),
            (None, Some(c)) => format!("-{c}"),
            (None, None) => String::new(),
        }
    }
}

/// Description of a positional field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionalSpec {
    pub name: String,
    /// Zero-based index into the literal tokens.
    pub position: usize,
    #[serde(default = "positional_kind")]
    pub kind: ValueKind,
    #[serde(default, deserialize_with = "scalar_text", skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub usage: String,
}

/// Description of a rest or unknown-flag capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub usage: String,
}

/// Declarative option schema of one command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<FlagSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub positional: Vec<PositionalSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest: Option<CaptureSpec>,
    /// Binding an unknown capture also enables unknown-flag mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unknown: Option<CaptureSpec>,
    /// Enables unknown-flag mode without binding a capture.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub allow_unknown_flags: bool,
}

fn flag_kind() -> ValueKind {
    ValueKind::Bool
}

fn positional_kind() -> ValueKind {
    ValueKind::String
}

/// Accepts `default: 8080` and `default: true` as well as quoted text.
fn scalar_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Int(i64),
        Bool(bool),
        Float(f64),
    }

    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|scalar| match scalar {
        Scalar::Text(text) => text,
        Scalar::Int(i) => i.to_string(),
        Scalar::Bool(b) => b.to_string(),
        Scalar::Float(f) => f.to_string(),
    }))
}

impl SchemaSpec {
    /// Checks every declaration without building anything.
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaError`] found, in declaration order.
    pub fn validate(&self) -> Result<(), SchemaError> {
        for flag in &self.flags {
            if flag.long.is_none() && flag.short.is_none() {
                return Err(SchemaError::MissingFlagName);
            }
            if let Some(long) = &flag.long {
                if !LONG_NAME_RE.is_match(long) {
                    return Err(SchemaError::InvalidLongName(long.clone()));
                }
            }
            if let Some(c) = flag.short {
                if !c.is_ascii_alphanumeric() {
                    return Err(SchemaError::InvalidShortName(c));
                }
            }
            initial_value(flag.kind, flag.default.as_deref(), || flag.display_name())?;
        }

        for field in &self.positional {
            if field.name.trim().is_empty() {
                return Err(SchemaError::EmptyPositionalName {
                    position: field.position,
                });
            }
            initial_value(field.kind, field.default.as_deref(), || field.name.clone())?;
        }

        if self.rest.iter().chain(&self.unknown).any(|capture| capture.name.trim().is_empty()) {
            return Err(SchemaError::EmptyCaptureName);
        }

        Ok(())
    }

    /// Validates the description and registers it on a new [`FlagSet`].
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] when any declaration is malformed; nothing
    /// is built in that case.
    pub fn build(&self, name: &str) -> Result<FlagSet, SchemaError> {
        self.validate()?;

        let mut fs = FlagSet::new(name);
        for flag in &self.flags {
            let value = initial_value(flag.kind, flag.default.as_deref(), || flag.display_name())?;
            fs.add_flag(flag.long.as_deref().unwrap_or(""), flag.short, value, &flag.usage);
        }
        for field in &self.positional {
            let value = initial_value(field.kind, field.default.as_deref(), || field.name.clone())?;
            fs.add_positional(&field.name, field.position, value, &field.usage);
        }
        if let Some(rest) = &self.rest {
            fs.capture_rest(&rest.name, &rest.usage);
        }
        if let Some(unknown) = &self.unknown {
            fs.capture_unknown(&unknown.name, &unknown.usage);
        }
        if self.allow_unknown_flags {
            fs.allow_unknown_flags(true);
        }
        Ok(fs)
    }
}

fn initial_value(
    kind: ValueKind,
    default: Option<&str>,
    name: impl FnOnce() -> String,
) -> Result<Value, SchemaError> {
    match default {
        Some(raw) => Value::parse(kind, raw).map_err(|source| SchemaError::InvalidDefault {
            name: name(),
            source,
        }),
        None => Ok(Value::zero(kind)),
    }
}

/// Textual default for a spec, omitted when it equals the kind's zero value.
fn spec_default(default: &Value) -> Option<String> {
    (*default != Value::zero(default.kind())).then(|| default.to_string())
}

impl FlagSet {
    /// Describes the current schema (registration-time defaults, not bound
    /// values).
    ///
    /// Names taken over by a later registration are left out, so building
    /// the result yields a set with the same reachable flags.
    pub fn to_spec(&self) -> SchemaSpec {
        let flags = self
            .flags
            .iter()
            .enumerate()
            .filter_map(|(index, flag)| {
                let long = (!flag.name.is_empty() && self.long.get(&flag.name) == Some(&index))
                    .then(|| flag.name.clone());
                let short = flag.short.filter(|c| self.short.get(c) == Some(&index));
                if long.is_none() && short.is_none() {
                    return None;
                }
                Some(FlagSpec {
                    long,
                    short,
                    kind: flag.default.kind(),
                    default: spec_default(&flag.default),
                    usage: flag.usage.clone(),
                })
            })
            .collect();

        let positional = self
            .positional
            .values()
            .map(|field| PositionalSpec {
                name: field.name.clone(),
                position: field.index,
                kind: field.default.kind(),
                default: spec_default(&field.default),
                usage: field.usage.clone(),
            })
            .collect();

        let capture = |c: &crate::flag::Capture| CaptureSpec {
            name: c.name.clone(),
            usage: c.usage.clone(),
        };

        SchemaSpec {
            flags,
            positional,
            rest: self.rest.as_ref().map(capture),
            unknown: self.unknown.as_ref().map(capture),
            allow_unknown_flags: self.allow_unknown && self.unknown.is_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    const DEPLOY_SPEC: &str = r#"
flags:
  - long: verbose
    short: v
    usage: verbose output
  - long: timeout
    kind: duration
    default: 30s
  - long: tags
    short: t
    kind: string_list
    default: "web,api"
  - short: C
    kind: string
    usage: working directory
positional:
  - name: target
    position: 0
  - name: replicas
    position: 1
    kind: int
    default: 1
rest:
  name: extra
"#;

    #[test]
    fn test_build_from_yaml() {
        let spec: SchemaSpec = serde_yaml::from_str(DEPLOY_SPEC).unwrap();
        let mut fs = spec.build("deploy").unwrap();

        assert_eq!(fs.get_bool("verbose"), Some(false));
        assert_eq!(fs.get_duration("timeout"), Some(TimeDelta::seconds(30)));
        assert_eq!(fs.lookup_short('C').unwrap().value, Value::String(String::new()));
        assert_eq!(fs.positional("replicas"), Some(&Value::Int(1)));
        assert!(fs.has_rest_args());

        fs.parse(["prod", "-v", "3", "-C", "/srv", "--tags=db"]).unwrap();
        assert_eq!(fs.get_bool("verbose"), Some(true));
        assert_eq!(fs.positional("target"), Some(&Value::String("prod".into())));
        assert_eq!(fs.positional("replicas"), Some(&Value::Int(3)));
        assert_eq!(fs.get_string_list("tags"), Some(&["db".to_string()][..]));
        assert_eq!(fs.rest().unwrap(), ["prod", "3"]);
    }

    #[test]
    fn test_missing_flag_name() {
        let spec = SchemaSpec {
            flags: vec![FlagSpec::new(None, None, ValueKind::Bool)],
            ..Default::default()
        };
        assert_eq!(spec.build("x").unwrap_err(), SchemaError::MissingFlagName);
    }

    #[test]
    fn test_invalid_names() {
        for long in ["--verbose", "with space", "a=b", ""] {
            let spec = SchemaSpec {
                flags: vec![FlagSpec::new(Some(long), None, ValueKind::Bool)],
                ..Default::default()
            };
            assert_eq!(
                spec.validate(),
                Err(SchemaError::InvalidLongName(long.to_string())),
                "{long:?}"
            );
        }

        let spec = SchemaSpec {
            flags: vec![FlagSpec::new(None, Some('-'), ValueKind::Bool)],
            ..Default::default()
        };
        assert_eq!(spec.validate(), Err(SchemaError::InvalidShortName('-')));
    }

    #[test]
    fn test_invalid_default() {
        let spec = SchemaSpec {
            flags: vec![FlagSpec::new(Some("count"), None, ValueKind::Int).with_default("many")],
            ..Default::default()
        };
        let err = spec.build("x").unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDefault { ref name, .. } if name == "--count"));
    }

    #[test]
    fn test_empty_positional_and_capture_names() {
        let spec: SchemaSpec = serde_yaml::from_str("positional: [{name: ' ', position: 3}]").unwrap();
        assert_eq!(
            spec.validate(),
            Err(SchemaError::EmptyPositionalName { position: 3 })
        );

        let spec: SchemaSpec = serde_yaml::from_str("unknown: {name: ''}").unwrap();
        assert_eq!(spec.validate(), Err(SchemaError::EmptyCaptureName));
    }

    #[test]
    fn test_to_spec_describes_schema() {
        let spec: SchemaSpec = serde_yaml::from_str(DEPLOY_SPEC).unwrap();
        let mut fs = spec.build("deploy").unwrap();
        fs.parse(["prod", "--timeout", "1m"]).unwrap();

        let described = fs.to_spec();
        // Defaults, not bound values.
        let timeout = described.flags.iter().find(|f| f.long.as_deref() == Some("timeout")).unwrap();
        assert_eq!(timeout.default.as_deref(), Some("30s"));

        let rebuilt = described.build("deploy").unwrap();
        assert_eq!(rebuilt.long_flags(), fs.long_flags());
        assert_eq!(rebuilt.short_flags(), fs.short_flags());
        assert_eq!(rebuilt.get_duration("timeout"), Some(TimeDelta::seconds(30)));
        assert_eq!(rebuilt.positional("replicas"), Some(&Value::Int(1)));
        assert_eq!(described.rest.unwrap().name, "extra");
    }

    #[test]
    fn test_to_spec_drops_shadowed_names() {
        let mut fs = FlagSet::new("x");
        fs.add_bool("verbose", Some('v'), false, "first")
            .add_bool("verbose", None, true, "second");

        let spec = fs.to_spec();
        assert_eq!(spec.flags.len(), 2);
        assert_eq!(spec.flags[0].long, None);
        assert_eq!(spec.flags[0].short, Some('v'));
        assert_eq!(spec.flags[1].long.as_deref(), Some("verbose"));
        assert_eq!(spec.flags[1].default.as_deref(), Some("true"));
    }

    #[test]
    fn test_allow_unknown_without_capture() {
        let spec: SchemaSpec = serde_yaml::from_str("allow_unknown_flags: true").unwrap();
        let mut fs = spec.build("x").unwrap();
        fs.parse(["--anything", "goes"]).unwrap();
        assert_eq!(fs.unknown_flags(), ["--anything", "goes"]);
        assert!(fs.to_spec().allow_unknown_flags);
    }
}

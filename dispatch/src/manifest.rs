//! YAML program manifests.
//!
//! A manifest declares a program name and its commands, each with a path,
//! usage text and a flattened [`SchemaSpec`]. JSON is accepted too, being a
//! subset of YAML.
//!
//! # Examples
//!
//! ```
//! use cmdroute_dispatch::Manifest;
//!
//! let yaml = r#"
//! name: shipit
//! commands:
//!   - path: deploy
//!     usage: Deploy a service
//!     flags:
//!       - { long: env, short: e, kind: string, default: staging }
//!     positional:
//!       - { name: service, position: 0 }
//! "#;
//!
//! let manifest = Manifest::from_yaml_str(yaml).unwrap();
//! manifest.validate().unwrap();
//! assert_eq!(manifest.commands[0].schema.flags[0].default.as_deref(), Some("staging"));
//! ```

use std::collections::HashSet;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use cmdroute_core::{FlagSet, SchemaSpec};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::command::{FnCommand, RunResult};
use crate::dispatcher::{Dispatcher, DispatcherConfig, normalize_path};
use crate::error::ManifestError;

/// One command declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDecl {
    /// Command path such as `server start`.
    pub path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub usage: String,
    #[serde(flatten)]
    pub schema: SchemaSpec,
}

/// A program description: name, optional description and commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub commands: Vec<CommandDecl>,
}

impl Manifest {
    /// Loads a manifest from a YAML (or JSON) file.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](ManifestError::Io) if the file cannot be read, or
    /// [`Yaml`](ManifestError::Yaml) if parsing fails. The manifest is not
    /// validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let manifest = serde_yaml::from_reader(reader)?;
        Ok(manifest)
    }

    /// Parses a manifest from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`Yaml`](ManifestError::Yaml) if parsing fails.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ManifestError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Saves the manifest as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](ManifestError::Io) if the file cannot be written, or
    /// [`Yaml`](ManifestError::Yaml) if serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ManifestError> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Describes the commands registered on `dispatcher`.
    pub fn from_dispatcher(dispatcher: &Dispatcher) -> Self {
        Self {
            name: dispatcher.name().to_string(),
            description: dispatcher.config().description.clone(),
            commands: dispatcher.describe(),
        }
    }

    /// Checks the program name, every command path and every schema.
    ///
    /// # Errors
    ///
    /// Returns the first problem found, in declaration order.
    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.name.trim().is_empty() {
            return Err(ManifestError::EmptyName);
        }

        let mut seen = HashSet::new();
        for (index, decl) in self.commands.iter().enumerate() {
            let path = normalize_path(&decl.path);
            if path.is_empty() {
                return Err(ManifestError::EmptyPath { index });
            }
            if !seen.insert(path.clone()) {
                return Err(ManifestError::DuplicatePath(path));
            }
            decl.schema
                .validate()
                .map_err(|source| ManifestError::Schema { path, source })?;
        }
        Ok(())
    }

    /// Dispatcher settings for this program, defaults otherwise.
    pub fn config(&self) -> DispatcherConfig {
        DispatcherConfig {
            name: self.name.clone(),
            description: self.description.clone(),
            ..Default::default()
        }
    }

    /// Validates the manifest and registers every command on a new
    /// dispatcher, with handlers produced by `handler_for`.
    ///
    /// # Errors
    ///
    /// Returns the first validation problem; see [`validate`](Manifest::validate).
    pub fn build_dispatcher<F, H>(&self, mut handler_for: F) -> Result<Dispatcher, ManifestError>
    where
        F: FnMut(&CommandDecl) -> H,
        H: FnMut(&FlagSet, &[String]) -> RunResult + 'static,
    {
        self.validate()?;

        let mut dispatcher = Dispatcher::with_config(self.config());
        for decl in &self.commands {
            let path = normalize_path(&decl.path);
            let command = FnCommand::from_spec(&path, &decl.schema, handler_for(decl))
                .map_err(|source| ManifestError::Schema {
                    path: path.clone(),
                    source,
                })?
                .with_usage(&decl.usage);
            dispatcher.dispatch(&path, command);
        }

        debug!(program = %self.name, commands = self.commands.len(), "built dispatcher from manifest");
        Ok(dispatcher)
    }
}

#[cfg(test)]
mod tests {
    use cmdroute_core::{FlagSpec, SchemaError, ValueKind};

    use super::*;

    fn sample() -> Manifest {
        Manifest::from_yaml_str(
            r#"
name: shipit
description: Ship services
commands:
  - path: deploy
    usage: Deploy a service
    flags:
      - long: env
        short: e
        kind: string
        default: staging
  - path: "server   start"
    flags:
      - { long: port, short: p, kind: int, default: "8080" }
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_manifest() {
        let manifest = sample();
        assert_eq!(manifest.name, "shipit");
        assert_eq!(manifest.description.as_deref(), Some("Ship services"));
        assert_eq!(manifest.commands.len(), 2);
        assert_eq!(manifest.commands[0].usage, "Deploy a service");
        assert_eq!(
            manifest.commands[1].schema.flags[0],
            FlagSpec::new(Some("port"), Some('p'), ValueKind::Int).with_default("8080")
        );
        manifest.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_declarations() {
        let mut manifest = sample();
        manifest.name = " ".to_string();
        assert!(matches!(manifest.validate(), Err(ManifestError::EmptyName)));

        let mut manifest = sample();
        manifest.commands[1].path = "   ".to_string();
        assert!(matches!(manifest.validate(), Err(ManifestError::EmptyPath { index: 1 })));

        let mut manifest = sample();
        manifest.commands[1].path = "deploy".to_string();
        assert!(matches!(manifest.validate(), Err(ManifestError::DuplicatePath(ref p)) if p == "deploy"));

        let mut manifest = sample();
        manifest.commands[0].schema.flags.push(FlagSpec::new(None, None, ValueKind::Bool));
        let err = manifest.validate().unwrap_err();
        assert!(matches!(
            err,
            ManifestError::Schema { ref path, source: SchemaError::MissingFlagName } if path == "deploy"
        ));
        assert_eq!(
            err.to_string(),
            "invalid schema for 'deploy': flag must define a long name or a short character"
        );
    }

    #[test]
    fn test_build_dispatcher_normalizes_paths() {
        let manifest = sample();
        let dispatcher = manifest
            .build_dispatcher(|_| |_: &FlagSet, _: &[String]| Ok(()))
            .unwrap();

        assert_eq!(dispatcher.name(), "shipit");
        assert!(dispatcher.has_command("server start"));
        let entry = dispatcher.get_entry("deploy").unwrap();
        assert_eq!(entry.usage, "Deploy a service");
        assert_eq!(entry.flags().get_str("env"), Some("staging"));
    }

    #[test]
    fn test_json_is_accepted() {
        let manifest = Manifest::from_yaml_str(
            r#"{"name": "tool", "commands": [{"path": "run", "rest": {"name": "args"}}]}"#,
        )
        .unwrap();
        assert_eq!(manifest.commands[0].schema.rest.as_ref().unwrap().name, "args");
    }
}

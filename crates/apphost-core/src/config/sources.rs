use std::fmt::Debug;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;

use crate::config::error::ConfigError;
use crate::config::tree::{combine_key, Configuration, KEY_DELIMITER};

/// One layer of configuration. Layers are loaded in registration order and
/// later layers override earlier ones.
pub trait ConfigurationSource: Send + Sync + Debug {
    /// Human-readable description used in diagnostics.
    fn name(&self) -> String;

    /// Load this layer into a standalone configuration.
    fn load(&self) -> Result<Configuration, ConfigError>;
}

/// A JSON settings file.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
    optional: bool,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>, optional: bool) -> Self {
        Self {
            path: path.into(),
            optional,
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl ConfigurationSource for JsonFileSource {
    fn name(&self) -> String {
        format!("json file '{}'", self.path.display())
    }

    fn load(&self) -> Result<Configuration, ConfigError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound && self.optional => {
                log::debug!("Optional configuration file {} not found, skipping", self.path.display());
                return Ok(Configuration::new());
            }
            Err(err) => return Err(ConfigError::io(err, "read", self.path.clone())),
        };

        if text.trim().is_empty() {
            return Ok(Configuration::new());
        }

        let root: Value = serde_json::from_str(&text).map_err(|source| ConfigError::Malformed {
            path: self.path.clone(),
            source,
        })?;
        if !root.is_object() {
            return Err(ConfigError::InvalidRoot {
                path: self.path.clone(),
            });
        }

        let mut config = Configuration::new();
        flatten_json("", &root, &mut config);
        Ok(config)
    }
}

/// Objects nest with `:`, arrays nest by index, scalars are stringified and
/// `null` becomes the empty string.
fn flatten_json(prefix: &str, value: &Value, out: &mut Configuration) {
    match value {
        Value::Object(map) => {
            if map.is_empty() && !prefix.is_empty() {
                out.set(prefix, "");
            }
            for (key, child) in map {
                flatten_json(&combine_key(prefix, key), child, out);
            }
        }
        Value::Array(items) => {
            if items.is_empty() && !prefix.is_empty() {
                out.set(prefix, "");
            }
            for (index, child) in items.iter().enumerate() {
                flatten_json(&combine_key(prefix, &index.to_string()), child, out);
            }
        }
        Value::Null => out.set(prefix, ""),
        Value::String(text) => out.set(prefix, text.clone()),
        other => out.set(prefix, other.to_string()),
    }
}

/// Environment variables whose name starts with `prefix` (ASCII
/// case-insensitive). The prefix is stripped and `__` maps to `:`, so
/// `APPHOST_Application__Timeout` becomes `Application:Timeout`.
#[derive(Debug, Clone)]
pub struct EnvironmentVariablesSource {
    prefix: String,
    vars: Vec<(String, String)>,
}

impl EnvironmentVariablesSource {
    pub fn new(prefix: impl Into<String>, vars: Vec<(String, String)>) -> Self {
        Self {
            prefix: prefix.into(),
            vars,
        }
    }

    /// Snapshot of the current process environment. Variables that are not
    /// valid unicode are skipped.
    pub fn from_process(prefix: impl Into<String>) -> Self {
        Self::new(prefix, process_env_vars())
    }
}

/// Unicode-clean snapshot of the process environment.
pub fn process_env_vars() -> Vec<(String, String)> {
    std::env::vars_os()
        .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}

impl ConfigurationSource for EnvironmentVariablesSource {
    fn name(&self) -> String {
        format!("environment variables (prefix '{}')", self.prefix)
    }

    fn load(&self) -> Result<Configuration, ConfigError> {
        let mut config = Configuration::new();
        for (name, value) in &self.vars {
            let Some(head) = name.get(..self.prefix.len()) else {
                continue;
            };
            if !head.eq_ignore_ascii_case(&self.prefix) {
                continue;
            }
            let key = name[self.prefix.len()..].replace("__", &KEY_DELIMITER.to_string());
            if key.is_empty() {
                continue;
            }
            config.set(key, value.clone());
        }
        Ok(config)
    }
}

/// Command-line arguments.
///
/// Accepted forms: `--key=value`, `/key=value`, `key=value`, `--key value`
/// and `/key value`. Bare values and single-dash switches without `=` are
/// ignored; single-dash switches with `=` are rejected.
#[derive(Debug, Clone)]
pub struct CommandLineSource {
    args: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SwitchStyle {
    Long,
    Short,
    Plain,
}

impl CommandLineSource {
    pub fn new(args: Vec<String>) -> Self {
        Self { args }
    }
}

impl ConfigurationSource for CommandLineSource {
    fn name(&self) -> String {
        "command line".to_string()
    }

    fn load(&self) -> Result<Configuration, ConfigError> {
        let mut config = Configuration::new();
        let mut args = self.args.iter();

        while let Some(arg) = args.next() {
            let (style, body) = if let Some(rest) = arg.strip_prefix("--") {
                (SwitchStyle::Long, rest)
            } else if let Some(rest) = arg.strip_prefix('-') {
                (SwitchStyle::Short, rest)
            } else if let Some(rest) = arg.strip_prefix('/') {
                (SwitchStyle::Long, rest)
            } else {
                (SwitchStyle::Plain, arg.as_str())
            };

            match body.split_once('=') {
                Some(_) if style == SwitchStyle::Short => {
                    return Err(ConfigError::InvalidArgument {
                        argument: arg.clone(),
                        reason: "single-dash switches are not mapped; use --key=value".to_string(),
                    });
                }
                Some(("", _)) => {
                    return Err(ConfigError::InvalidArgument {
                        argument: arg.clone(),
                        reason: "missing key before '='".to_string(),
                    });
                }
                Some((key, value)) => config.set(key, value),
                None if style == SwitchStyle::Long && !body.is_empty() => match args.next() {
                    Some(value) => config.set(body, value.clone()),
                    None => log::debug!("Ignoring switch '{}' with no value", arg),
                },
                None => log::debug!("Ignoring command-line argument '{}'", arg),
            }
        }

        Ok(config)
    }
}

/// An already-built configuration placed under the other layers.
#[derive(Debug, Clone)]
pub struct ChainedSource {
    name: String,
    config: Arc<Configuration>,
}

impl ChainedSource {
    pub fn new(name: impl Into<String>, config: Arc<Configuration>) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }
}

impl ConfigurationSource for ChainedSource {
    fn name(&self) -> String {
        format!("chained configuration '{}'", self.name)
    }

    fn load(&self) -> Result<Configuration, ConfigError> {
        Ok(self.config.as_ref().clone())
    }
}

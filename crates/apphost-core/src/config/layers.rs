//! The fixed host/application layering.
//!
//! Host tree: `HostSettings.json` < environment variables < command line.
//!
//! Application tree: host tree < `AppSettings.json` <
//! `AppSettings.{environment}.json` < environment variables < command line.
//!
//! The environment name comes from the already-built host tree, so the host
//! tree is always resolved first.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::builder::ConfigurationBuilder;
use crate::config::error::ConfigError;
use crate::config::sources::process_env_vars;
use crate::config::tree::Configuration;
use crate::kernel::constants;

/// Inputs shared by both configuration trees.
#[derive(Debug, Clone)]
pub struct ConfigLayers {
    base_path: PathBuf,
    env_prefix: String,
    env_vars: Vec<(String, String)>,
    args: Vec<String>,
}

impl ConfigLayers {
    /// Layers over an explicit base path and prefix, reading the live process
    /// environment and arguments.
    pub fn new(base_path: impl Into<PathBuf>, env_prefix: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            env_prefix: env_prefix.into(),
            env_vars: process_env_vars(),
            args: std::env::args().skip(1).collect(),
        }
    }

    /// Layers derived from the running executable: its directory, its base
    /// name as the variable prefix, and its arguments.
    pub fn from_process() -> Self {
        Self::new(process_base_path(), env_prefix_for(&process_base_name()))
    }

    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env_vars = vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self
    }

    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_base_path(mut self, base_path: impl Into<PathBuf>) -> Self {
        self.base_path = base_path.into();
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn env_prefix(&self) -> &str {
        &self.env_prefix
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn host_builder(&self) -> ConfigurationBuilder {
        let mut builder = ConfigurationBuilder::new();
        builder
            .set_base_path(&self.base_path)
            .add_json_file(constants::HOST_SETTINGS_FILE, true)
            .add_environment_variables(&self.env_prefix, self.env_vars.clone())
            .add_command_line(&self.args);
        builder
    }

    pub fn app_builder(&self, host: Arc<Configuration>, environment: &str) -> ConfigurationBuilder {
        let mut builder = ConfigurationBuilder::new();
        builder
            .set_base_path(&self.base_path)
            .add_configuration("host", host)
            .add_json_file(constants::APP_SETTINGS_FILE, true)
            .add_json_file(constants::app_settings_file_for(environment), true)
            .add_environment_variables(&self.env_prefix, self.env_vars.clone())
            .add_command_line(&self.args);
        builder
    }

    pub fn build_host(&self) -> Result<Configuration, ConfigError> {
        self.host_builder().build()
    }

    pub fn build_app(&self, host: Arc<Configuration>, environment: &str) -> Result<Configuration, ConfigError> {
        self.app_builder(host, environment).build()
    }
}

/// Directory containing the running executable, or `.` if it cannot be determined.
pub fn process_base_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// File stem of the running executable, falling back to the application name.
pub fn process_base_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.file_stem().map(|stem| stem.to_string_lossy().into_owned()))
        .unwrap_or_else(|| constants::APP_NAME.to_string())
}

/// `apphost-demo` -> `apphost_demo_`.
pub fn env_prefix_for(base_name: &str) -> String {
    format!("{}_", base_name.replace('-', "_"))
}

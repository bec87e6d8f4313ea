use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::error::ConfigError;
use crate::config::sources::{
    ChainedSource, CommandLineSource, ConfigurationSource, EnvironmentVariablesSource, JsonFileSource,
};
use crate::config::tree::Configuration;

/// Collects configuration sources and merges them in order.
#[derive(Debug, Default)]
pub struct ConfigurationBuilder {
    base_path: Option<PathBuf>,
    sources: Vec<Box<dyn ConfigurationSource>>,
}

impl ConfigurationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory that relative file paths resolve against.
    pub fn set_base_path(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.base_path = Some(path.into());
        self
    }

    pub fn add_source(&mut self, source: impl ConfigurationSource + 'static) -> &mut Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn add_json_file(&mut self, path: impl AsRef<Path>, optional: bool) -> &mut Self {
        let resolved = self.resolve(path.as_ref());
        self.add_source(JsonFileSource::new(resolved, optional))
    }

    pub fn add_environment_variables(&mut self, prefix: &str, vars: Vec<(String, String)>) -> &mut Self {
        self.add_source(EnvironmentVariablesSource::new(prefix, vars))
    }

    pub fn add_command_line(&mut self, args: &[String]) -> &mut Self {
        self.add_source(CommandLineSource::new(args.to_vec()))
    }

    pub fn add_configuration(&mut self, name: &str, config: Arc<Configuration>) -> &mut Self {
        self.add_source(ChainedSource::new(name, config))
    }

    /// Source names in merge order.
    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|source| source.name()).collect()
    }

    /// Load every source and merge them, later sources winning. The first
    /// failing source aborts the build.
    pub fn build(&self) -> Result<Configuration, ConfigError> {
        let mut merged = Configuration::new();
        for source in &self.sources {
            let layer = source.load()?;
            log::debug!("Loaded {} configuration keys from {}", layer.len(), source.name());
            merged.merge(&layer);
        }
        Ok(merged)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_path {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

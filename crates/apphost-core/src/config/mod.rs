//! # Configuration
//!
//! Layered, case-insensitive key/value configuration. Sources (JSON files,
//! prefixed environment variables, command-line switches, or another
//! already-built tree) are merged in registration order by
//! [`ConfigurationBuilder`]; later layers win. [`ConfigLayers`] fixes the
//! two trees every host builds: the host tree and the application tree.
//!
//! Sections bind to any `serde::Deserialize` type through
//! [`ConfigSection::bind`], and [`OptionsServiceExt::configure`] exposes a
//! bound section as a typed service.
mod binder;
pub mod builder;
pub mod error;
pub mod layers;
pub mod options;
pub mod sources;
pub mod tree;

pub use builder::ConfigurationBuilder;
pub use error::ConfigError;
pub use layers::{env_prefix_for, process_base_name, process_base_path, ConfigLayers};
pub use options::OptionsServiceExt;
pub use sources::{
    ChainedSource, CommandLineSource, ConfigurationSource, EnvironmentVariablesSource, JsonFileSource,
};
pub use tree::{combine_key, ConfigSection, Configuration, KEY_DELIMITER};

// Test module declaration
#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::de::DeserializeOwned;

use crate::config::binder;
use crate::config::error::ConfigError;

/// Separator between section names in a configuration key (`Application:Timeout`).
pub const KEY_DELIMITER: char = ':';

/// Keys compare ASCII-case-insensitively; the normalized form keeps byte
/// offsets identical to the original so prefixes can be sliced off either.
fn normalize(key: &str) -> String {
    key.to_ascii_lowercase()
}

/// Joins a section path and a relative key.
pub fn combine_key(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else if key.is_empty() {
        path.to_string()
    } else {
        format!("{}{}{}", path, KEY_DELIMITER, key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ConfigEntry {
    key: String,
    value: String,
}

/// A merged configuration tree.
///
/// Stored flat: nesting is expressed in the key (`Logging:LogLevel:Default`).
/// Every value is a string; typed access goes through [`Configuration::get_parsed`]
/// or [`ConfigSection::bind`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    entries: BTreeMap<String, ConfigEntry>,
}

impl Configuration {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a raw configuration value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(&normalize(key)).map(|entry| entry.value.as_str())
    }

    /// Get a raw configuration value with default
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Get a configuration value parsed into `T`. Unparseable values read as absent.
    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|value| value.trim().parse().ok())
    }

    /// Set a configuration value, replacing any value stored under the same key
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.entries.insert(
            normalize(&key),
            ConfigEntry {
                key,
                value: value.into(),
            },
        );
    }

    /// Remove a configuration value
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(&normalize(key)).map(|entry| entry.value)
    }

    /// Check if key exists
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&normalize(key))
    }

    /// Get all keys, in their original casing
    pub fn keys(&self) -> Vec<String> {
        self.entries.values().map(|entry| entry.key.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .map(|entry| (entry.key.as_str(), entry.value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge with another configuration, overriding existing values
    pub fn merge(&mut self, other: &Configuration) {
        for (normalized, entry) in &other.entries {
            self.entries.insert(normalized.clone(), entry.clone());
        }
    }

    /// A view of the subtree rooted at `path`. The empty path is the whole tree.
    pub fn section(&self, path: &str) -> ConfigSection<'_> {
        ConfigSection {
            root: self,
            path: path.trim_matches(KEY_DELIMITER).to_string(),
        }
    }

    /// Shorthand for `self.section(path).bind()`.
    pub fn bind<T: DeserializeOwned>(&self, path: &str) -> Result<T, ConfigError> {
        self.section(path).bind()
    }
}

impl<K, V> FromIterator<(K, V)> for Configuration
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut config = Configuration::new();
        for (key, value) in iter {
            config.set(key, value);
        }
        config
    }
}

/// Borrowed view of one section of a [`Configuration`].
#[derive(Debug, Clone)]
pub struct ConfigSection<'a> {
    root: &'a Configuration,
    path: String,
}

impl<'a> ConfigSection<'a> {
    /// Full key of this section.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last segment of the section path.
    pub fn key(&self) -> &str {
        self.path
            .rsplit(KEY_DELIMITER)
            .next()
            .unwrap_or(self.path.as_str())
    }

    /// Value stored directly at this section's key, if any.
    pub fn value(&self) -> Option<&'a str> {
        if self.path.is_empty() {
            return None;
        }
        self.root.get(&self.path)
    }

    /// Value of a key relative to this section.
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.root.get(&combine_key(&self.path, key))
    }

    pub fn section(&self, key: &str) -> ConfigSection<'a> {
        self.root.section(&combine_key(&self.path, key))
    }

    /// True when the section has a value or at least one descendant.
    pub fn exists(&self) -> bool {
        self.value().is_some() || self.entries().next().is_some()
    }

    /// Names of the immediate children, deduplicated case-insensitively.
    pub fn children(&self) -> Vec<String> {
        let mut seen: BTreeMap<String, String> = BTreeMap::new();
        for (relative, _) in self.entries() {
            let head = relative.split(KEY_DELIMITER).next().unwrap_or(relative);
            seen.entry(normalize(head)).or_insert_with(|| head.to_string());
        }
        seen.into_values().collect()
    }

    /// Descendant entries with keys relative to this section.
    pub fn entries(&self) -> impl Iterator<Item = (&'a str, &'a str)> + '_ {
        let prefix = if self.path.is_empty() {
            String::new()
        } else {
            format!("{}{}", normalize(&self.path), KEY_DELIMITER)
        };
        let prefix_len = prefix.len();
        self.root
            .entries
            .range(prefix.clone()..)
            .take_while(move |(normalized, _)| normalized.starts_with(&prefix))
            .filter(move |(normalized, _)| normalized.len() > prefix_len)
            .map(move |(_, entry)| (&entry.key[prefix_len..], entry.value.as_str()))
    }

    /// Deserialize this section into `T`.
    ///
    /// Scalars are parsed from their string form, struct fields and enum
    /// variants match case-insensitively, and numeric child keys form
    /// sequences. A missing section binds like an empty object.
    pub fn bind<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        binder::bind(self)
    }
}

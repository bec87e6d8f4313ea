use std::time::Duration;

use serde::Deserialize;

/// Domain settings bound from the `Application` configuration section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Settings {
    pub title: String,
    /// Request timeout in seconds for the API profile
    pub timeout: u64,
    pub greeting: String,
    pub api_base_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            title: "Apphost".to_string(),
            timeout: 30,
            greeting: "Hello".to_string(),
            api_base_url: None,
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// The API base URL, if one is configured and not blank.
    pub fn api_base_url(&self) -> Option<&str> {
        self.api_base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apphost_core::Configuration;

    #[test]
    fn test_missing_section_uses_defaults() {
        let settings: Settings = Configuration::new().bind("Application").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: Configuration = [("application:timeout", "5"), ("Application:ApiBaseUrl", "  ")]
            .into_iter()
            .collect();
        let settings: Settings = config.bind("Application").unwrap();

        assert_eq!(settings.request_timeout(), Duration::from_secs(5));
        assert_eq!(settings.title, "Apphost");
        assert_eq!(settings.api_base_url(), None);
    }
}

/// Application name
pub const APP_NAME: &str = "apphost";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Host-level settings file, relative to the base path
pub const HOST_SETTINGS_FILE: &str = "HostSettings.json";

/// Application settings file, relative to the base path
pub const APP_SETTINGS_FILE: &str = "AppSettings.json";

/// Configuration section bound to the domain settings record
pub const APPLICATION_SECTION: &str = "Application";

/// Host configuration key selecting the environment name
pub const ENVIRONMENT_KEY: &str = "environment";

/// Host configuration key overriding the application name
pub const APPLICATION_NAME_KEY: &str = "applicationName";

/// Host configuration key overriding the content root
pub const CONTENT_ROOT_KEY: &str = "contentRoot";

/// Environment name used when none is configured
pub const DEFAULT_ENVIRONMENT: &str = "Production";

/// Application configuration key for the default log level
pub const LOG_LEVEL_KEY: &str = "Logging:LogLevel:Default";

/// Log level used when neither `RUST_LOG` nor configuration sets one
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Name of the OS thread reserved for the UI session
pub const UI_THREAD_NAME: &str = "ui-session";

/// Environment-specific application settings file, e.g. `AppSettings.Development.json`
pub fn app_settings_file_for(environment: &str) -> String {
    format!("AppSettings.{}.json", environment)
}

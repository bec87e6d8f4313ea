pub mod config;
pub mod http;
pub mod kernel;
pub mod logging;
pub mod services;
pub mod ui_bridge;
pub mod utils;

// Re-export key public types/traits for the binary and domain code
pub use config::{ConfigError, ConfigLayers, Configuration, OptionsServiceExt};
pub use http::{HttpClient, HttpClientFactory, HttpClientServiceExt, HttpError};
pub use kernel::error::Error as KernelError;
pub use kernel::{globals, Host, HostBuilder, HostContext, HostEnvironment, HostState, HostedService, Startup};
pub use logging::{Logger, LoggerFactory, LoggingServiceExt};
pub use services::{ServiceCollection, ServiceError, ServiceProvider};
pub use ui_bridge::{UiError, UiRoot, UiSession};

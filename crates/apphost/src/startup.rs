use apphost_core::http::HttpClientServiceExt;
use apphost_core::kernel::constants::APPLICATION_SECTION;
use apphost_core::kernel::{HostContext, Result, Startup};
use apphost_core::{Logger, LoggerFactory, ServiceCollection, UiError, UiRoot};

use crate::cli::ConsoleUiRoot;
use crate::greeting::GreetingService;
use crate::settings::Settings;

/// Name of the HTTP profile registered when `Application:ApiBaseUrl` is set
pub const API_PROFILE: &str = "API";

/// Domain wiring for the console application.
#[derive(Debug, Default)]
pub struct DemoStartup;

impl Startup for DemoStartup {
    type Settings = Settings;

    fn configure(&self, ctx: &HostContext<'_>, services: &mut ServiceCollection) -> Result<()> {
        let settings: Settings = ctx.configuration.bind(APPLICATION_SECTION)?;

        services.add_singleton_with(|provider| {
            let settings = provider.require::<Settings>()?;
            let logger = provider
                .get::<LoggerFactory>()
                .map(|factory| factory.create_for::<GreetingService>())
                .unwrap_or_else(|| Logger::noop("GreetingService"));
            Ok(GreetingService::new(settings.greeting.clone(), logger))
        });

        if let Some(url) = settings.api_base_url() {
            let timeout = settings.request_timeout();
            services.add_http_client(API_PROFILE, |profile| {
                profile.set_timeout(timeout);
                profile.set_header("Accept", "application/json")?;
                Ok(())
            })?;
            log::info!("Registered HTTP profile {} for {}", API_PROFILE, url);
        }

        log::debug!(
            "Domain services configured for environment '{}'",
            ctx.environment.environment_name()
        );
        Ok(())
    }

    fn create_ui_root(&self) -> std::result::Result<Box<dyn UiRoot>, UiError> {
        Ok(Box::new(ConsoleUiRoot::from_stdin()))
    }
}

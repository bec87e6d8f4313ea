use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::config::{process_base_name, ConfigLayers, Configuration, OptionsServiceExt};
use crate::http::{HttpClientFactory, HttpClientServiceExt, STANDARD_PROFILE};
use crate::kernel::constants;
use crate::kernel::error::{Error, KernelLifecyclePhase, Result};
use crate::logging::{init_sinks, LoggingServiceExt};
use crate::services::{ServiceCollection, ServiceProvider};
use crate::ui_bridge::{UiError, UiHostedService, UiRoot};

/// Where the host is in its single-shot lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostState {
    /// No host has been built yet. Only reported by the process-wide accessors.
    Unbuilt,
    Built,
    Started,
    Stopped,
}

impl fmt::Display for HostState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HostState::Unbuilt => "Unbuilt",
            HostState::Built => "Built",
            HostState::Started => "Started",
            HostState::Stopped => "Stopped",
        };
        f.write_str(name)
    }
}

/// Facts about the running host, resolved from the host configuration tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEnvironment {
    environment_name: String,
    application_name: String,
    content_root: PathBuf,
}

impl HostEnvironment {
    fn resolve(host: &Configuration, base_path: &Path) -> Self {
        let non_blank = |key: &str| host.get(key).map(str::trim).filter(|value| !value.is_empty());

        let environment_name = non_blank(constants::ENVIRONMENT_KEY)
            .unwrap_or(constants::DEFAULT_ENVIRONMENT)
            .to_string();
        let application_name = non_blank(constants::APPLICATION_NAME_KEY)
            .map(str::to_string)
            .unwrap_or_else(process_base_name);
        let content_root = match non_blank(constants::CONTENT_ROOT_KEY) {
            Some(root) if Path::new(root).is_relative() => base_path.join(root),
            Some(root) => PathBuf::from(root),
            None => base_path.to_path_buf(),
        };

        Self {
            environment_name,
            application_name,
            content_root,
        }
    }

    pub fn environment_name(&self) -> &str {
        &self.environment_name
    }

    pub fn application_name(&self) -> &str {
        &self.application_name
    }

    pub fn content_root(&self) -> &Path {
        &self.content_root
    }

    /// Case-insensitive comparison against the environment name.
    pub fn is_environment(&self, name: &str) -> bool {
        self.environment_name.eq_ignore_ascii_case(name)
    }

    pub fn is_development(&self) -> bool {
        self.is_environment("Development")
    }

    pub fn is_production(&self) -> bool {
        self.is_environment(constants::DEFAULT_ENVIRONMENT)
    }
}

/// Read-only view handed to service configuration hooks.
#[derive(Debug, Clone, Copy)]
pub struct HostContext<'a> {
    pub environment: &'a HostEnvironment,
    pub configuration: &'a Configuration,
    pub host_configuration: &'a Configuration,
}

/// The domain side of the application.
///
/// [`configure`](Startup::configure) runs once while the host is built and
/// receives the same registration surface the core uses.
/// [`create_ui_root`](Startup::create_ui_root) runs on the UI thread when the
/// session starts.
pub trait Startup: Send + Sync + 'static {
    /// Settings record bound from the `Application` configuration section.
    type Settings: DeserializeOwned + Send + Sync + 'static;

    fn configure(&self, ctx: &HostContext<'_>, services: &mut ServiceCollection) -> Result<()>;

    fn create_ui_root(&self) -> std::result::Result<Box<dyn UiRoot>, UiError>;
}

type ServicesHook = Box<dyn FnOnce(&HostContext<'_>, &mut ServiceCollection) -> Result<()> + Send>;

/// Runs the `Unbuilt -> Built` sequence.
///
/// Configuration is loaded first (host tree, then application tree), then
/// the core services are registered, then each hook runs in the order it was
/// added, and finally the registry is frozen.
pub struct HostBuilder {
    layers: ConfigLayers,
    hooks: Vec<ServicesHook>,
}

impl HostBuilder {
    /// A builder reading the executable directory, the process environment
    /// and the process arguments.
    pub fn new() -> Self {
        Self::with_layers(ConfigLayers::from_process())
    }

    pub fn with_layers(layers: ConfigLayers) -> Self {
        Self {
            layers,
            hooks: Vec::new(),
        }
    }

    pub fn base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.layers = self.layers.with_base_path(path);
        self
    }

    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.layers = self.layers.with_env_prefix(prefix);
        self
    }

    pub fn env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.layers = self.layers.with_env_vars(vars);
        self
    }

    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.layers = self.layers.with_args(args);
        self
    }

    pub fn layers(&self) -> &ConfigLayers {
        &self.layers
    }

    /// Add a registration step. Steps run after the core registrations.
    pub fn configure_services<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(&HostContext<'_>, &mut ServiceCollection) -> Result<()> + Send + 'static,
    {
        self.hooks.push(Box::new(hook));
        self
    }

    /// Bind `S::Settings`, run `S::configure` and register the UI hosted unit.
    pub fn startup<S: Startup>(self, startup: S) -> Self {
        let startup = Arc::new(startup);
        self.configure_services(move |ctx, services| {
            services.configure::<S::Settings>(constants::APPLICATION_SECTION);
            startup.configure(ctx, services)?;
            let ui_startup = startup.clone();
            services.add_hosted_service(UiHostedService::new(move || ui_startup.create_ui_root()));
            Ok(())
        })
    }

    pub fn build(self) -> Result<Host> {
        let bootstrap = KernelLifecyclePhase::Bootstrap;

        let host_configuration = Arc::new(
            self.layers
                .build_host()
                .map_err(|e| Error::lifecycle_with(bootstrap, "failed to load host configuration", e))?,
        );
        let environment = HostEnvironment::resolve(&host_configuration, self.layers.base_path());

        let configuration = self
            .layers
            .build_app(host_configuration.clone(), environment.environment_name())
            .map_err(|e| Error::lifecycle_with(bootstrap, "failed to load application configuration", e))?;

        init_sinks(&configuration);
        log::info!(
            "Building {} v{} for '{}' in environment '{}'",
            constants::APP_NAME,
            constants::APP_VERSION,
            environment.application_name(),
            environment.environment_name()
        );

        let mut services = ServiceCollection::new();
        services
            .add_singleton(configuration.clone())
            .add_singleton(environment.clone())
            .add_logging();

        let user_agent = format!("{}/{}", environment.application_name(), constants::APP_VERSION);
        services
            .add_http_client(STANDARD_PROFILE, |profile| {
                profile.set_header("User-Agent", &user_agent)?;
                profile.set_header("Accept", "application/json")?;
                Ok(())
            })
            .map_err(|e| Error::lifecycle_with(bootstrap, "failed to register the standard HTTP profile", e))?;

        let ctx = HostContext {
            environment: &environment,
            configuration: &configuration,
            host_configuration: &host_configuration,
        };
        for hook in self.hooks {
            hook(&ctx, &mut services)
                .map_err(|e| Error::lifecycle_with(bootstrap, "service configuration failed", e))?;
        }

        if services.hosted_service_count() > 1 {
            return Err(Error::lifecycle(
                bootstrap,
                format!(
                    "only one hosted service is supported, {} were registered",
                    services.hosted_service_count()
                ),
            ));
        }

        let provider = Arc::new(services.build());
        let configuration = provider
            .require::<Configuration>()
            .map_err(|e| Error::lifecycle_with(bootstrap, "application configuration missing from registry", e))?;

        log::debug!("Host built with {} services", provider.len());
        Ok(Host {
            environment,
            host_configuration,
            configuration,
            services: provider,
            state: Mutex::new(HostState::Built),
            shutdown: CancellationToken::new(),
        })
    }
}

impl Default for HostBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HostBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostBuilder")
            .field("layers", &self.layers)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

/// The built host: configuration trees, frozen registry and lifecycle.
#[derive(Debug)]
pub struct Host {
    environment: HostEnvironment,
    host_configuration: Arc<Configuration>,
    configuration: Arc<Configuration>,
    services: Arc<ServiceProvider>,
    state: Mutex<HostState>,
    shutdown: CancellationToken,
}

impl Host {
    pub fn builder() -> HostBuilder {
        HostBuilder::new()
    }

    pub fn state(&self) -> HostState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn services(&self) -> &Arc<ServiceProvider> {
        &self.services
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn host_configuration(&self) -> &Configuration {
        &self.host_configuration
    }

    pub fn environment(&self) -> &HostEnvironment {
        &self.environment
    }

    /// Cancelled when shutdown is requested. Hosted services receive child tokens.
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// Ask the host to shut down without waiting for it.
    pub fn request_shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Validate the registry, then start the hosted service. Resolves when
    /// the hosted service has finished.
    pub async fn start(&self) -> Result<()> {
        let current = self.state();
        if current != HostState::Built {
            return Err(Self::cannot_start(current));
        }

        // Registered checks may read host state, so the lock is not held here.
        self.services
            .validate()
            .map_err(|e| Error::lifecycle_with(KernelLifecyclePhase::Start, "service validation failed", e))?;

        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if *state != HostState::Built {
                return Err(Self::cannot_start(*state));
            }
            *state = HostState::Started;
        }

        for service in self.services.hosted_services() {
            log::info!("Starting hosted service: {}", service.name());
            service.start(self.shutdown.child_token()).await.map_err(|e| {
                Error::lifecycle_with(
                    KernelLifecyclePhase::Start,
                    format!("hosted service '{}' failed", service.name()),
                    e,
                )
            })?;
            log::info!("Hosted service finished: {}", service.name());
        }
        Ok(())
    }

    fn cannot_start(state: HostState) -> Error {
        Error::lifecycle(
            KernelLifecyclePhase::Start,
            format!("host cannot start from state {}", state),
        )
    }

    /// Request shutdown, stop hosted services in reverse order and release
    /// pooled HTTP handlers. Stopping twice is a no-op.
    pub async fn stop(&self) -> Result<()> {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if *state == HostState::Stopped {
                return Ok(());
            }
            *state = HostState::Stopped;
        }

        log::info!("Stopping host...");
        self.shutdown.cancel();

        let mut first_error = None;
        for service in self.services.hosted_services().iter().rev() {
            if let Err(e) = service.stop().await {
                log::error!("Error stopping hosted service {}: {}", service.name(), e);
                first_error.get_or_insert(Error::lifecycle_with(
                    KernelLifecyclePhase::Shutdown,
                    format!("hosted service '{}' failed to stop", service.name()),
                    e,
                ));
            }
        }

        if let Some(factory) = self.services.get::<HttpClientFactory>() {
            factory.shutdown();
        }
        log::info!("Host stopped.");
        first_error.map_or(Ok(()), Err)
    }

    /// Start, then stop. Ctrl-C requests shutdown while the host runs.
    pub async fn run(&self) -> Result<()> {
        let token = self.shutdown.clone();
        let signal = tokio::spawn(async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => match result {
                    Ok(()) => {
                        log::info!("Ctrl-C received, requesting shutdown");
                        token.cancel();
                    }
                    Err(e) => log::warn!("Unable to listen for Ctrl-C: {}", e),
                },
                _ = token.cancelled() => {}
            }
        });

        let started = self.start().await;
        let stopped = self.stop().await;
        signal.abort();

        started?;
        stopped
    }
}

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::Deserialize;
use tempfile::{tempdir, TempDir};
use tokio_util::sync::CancellationToken;

use crate::config::ConfigLayers;
use crate::http::{HttpClientFactory, HttpClientServiceExt};
use crate::kernel::bootstrap::*;
use crate::kernel::component::HostedService;
use crate::kernel::constants;
use crate::kernel::error::{Error, KernelLifecyclePhase, Result};
use crate::logging::LoggerFactory;
use crate::services::ServiceCollection;
use crate::ui_bridge::{UiError, UiRoot, UiSession};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TestSettings {
    #[serde(default)]
    title: String,
    #[serde(default)]
    timeout: u32,
}

#[derive(Debug)]
struct EnvironmentMarker(String);

struct CountingRoot {
    runs: Arc<AtomicUsize>,
}

impl UiRoot for CountingRoot {
    fn name(&self) -> &str {
        "counting"
    }

    fn run(&mut self, _session: &UiSession) -> std::result::Result<(), UiError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct TestStartup {
    created: Arc<AtomicUsize>,
    runs: Arc<AtomicUsize>,
}

impl TestStartup {
    fn new() -> (Self, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let created = Arc::new(AtomicUsize::new(0));
        let runs = Arc::new(AtomicUsize::new(0));
        let startup = TestStartup {
            created: created.clone(),
            runs: runs.clone(),
        };
        (startup, created, runs)
    }
}

impl Startup for TestStartup {
    type Settings = TestSettings;

    fn configure(&self, ctx: &HostContext<'_>, services: &mut ServiceCollection) -> Result<()> {
        services.add_singleton(EnvironmentMarker(ctx.environment.environment_name().to_string()));
        Ok(())
    }

    fn create_ui_root(&self) -> std::result::Result<Box<dyn UiRoot>, UiError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(CountingRoot {
            runs: self.runs.clone(),
        }))
    }
}

#[derive(Debug)]
struct IdleService;

#[async_trait]
impl HostedService for IdleService {
    fn name(&self) -> &'static str {
        "idle"
    }

    async fn start(&self, _cancellation: CancellationToken) -> Result<()> {
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        Ok(())
    }
}

// Helper function to set up an isolated configuration directory
fn setup_test_env() -> TempDir {
    tempdir().expect("Failed to create temporary directory")
}

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).expect("Failed to write settings file");
}

fn builder(dir: &Path) -> HostBuilder {
    HostBuilder::with_layers(
        ConfigLayers::new(dir, "TESTHOST_")
            .with_env_vars(Vec::<(String, String)>::new())
            .with_args(Vec::<String>::new()),
    )
}

#[test]
fn test_build_with_no_files_uses_defaults() {
    let dir = setup_test_env();
    let host = builder(dir.path())
        .args(["--applicationName=Demo"])
        .build()
        .expect("Host build failed");

    assert_eq!(host.state(), HostState::Built);
    assert_eq!(host.environment().environment_name(), constants::DEFAULT_ENVIRONMENT);
    assert!(host.environment().is_production());
    assert_eq!(host.environment().application_name(), "Demo");
    assert_eq!(host.environment().content_root(), dir.path());
    assert!(host.services().contains::<LoggerFactory>());
    assert!(host.services().contains::<HttpClientFactory>());
}

#[tokio::test]
async fn test_standard_profile_is_always_registered() {
    let dir = setup_test_env();
    let host = builder(dir.path())
        .args(["--applicationName=Demo"])
        .build()
        .unwrap();

    let factory = host.services().require::<HttpClientFactory>().unwrap();
    let client = factory.create_client(None).unwrap();
    assert_eq!(client.default_headers()[ACCEPT], "application/json");
    assert_eq!(
        client.default_headers()[USER_AGENT],
        format!("Demo/{}", constants::APP_VERSION).as_str()
    );
}

#[test]
fn test_domain_hook_can_amend_standard_profile() {
    let dir = setup_test_env();
    let host = builder(dir.path())
        .configure_services(|_, services| {
            services.add_http_client("standard", |profile| {
                profile.set_header("Accept", "text/plain")?;
                Ok(())
            })?;
            Ok(())
        })
        .build()
        .unwrap();

    let factory = host.services().require::<HttpClientFactory>().unwrap();
    let profile = factory.profile(None).unwrap();
    assert_eq!(profile.default_headers()[ACCEPT], "text/plain");
    assert!(profile.default_headers().contains_key(USER_AGENT));
}

#[test]
fn test_environment_selects_settings_file() {
    let dir = setup_test_env();
    write(dir.path(), "HostSettings.json", r#"{ "environment": "Development" }"#);
    write(dir.path(), "AppSettings.json", r#"{ "Application": { "Title": "base", "Timeout": 30 } }"#);
    write(dir.path(), "AppSettings.Development.json", r#"{ "Application": { "Title": "dev" } }"#);

    let host = builder(dir.path()).build().unwrap();
    assert!(host.environment().is_development());
    assert_eq!(host.configuration().get("Application:Title"), Some("dev"));
    assert_eq!(host.configuration().get("Application:Timeout"), Some("30"));
    assert_eq!(host.host_configuration().get("Application:Title"), None);
}

#[test]
fn test_environment_variable_overrides_settings_file() {
    let dir = setup_test_env();
    write(dir.path(), "AppSettings.json", r#"{ "Application": { "Timeout": 30 } }"#);
    let (startup, _, _) = TestStartup::new();

    let host = builder(dir.path())
        .env_vars([("TESTHOST_Application__Timeout", "60")])
        .startup(startup)
        .build()
        .unwrap();

    let settings = host.services().require::<TestSettings>().unwrap();
    assert_eq!(settings.timeout, 60);
}

#[test]
fn test_malformed_settings_abort_build() {
    let dir = setup_test_env();
    write(dir.path(), "AppSettings.json", r#"{ "Application": "#);
    let (startup, created, _) = TestStartup::new();

    let err = builder(dir.path()).startup(startup).build().unwrap_err();
    assert_eq!(err.phase(), Some(KernelLifecyclePhase::Bootstrap));
    assert_eq!(created.load(Ordering::SeqCst), 0);
}

#[test]
fn test_failing_hook_aborts_build() {
    let dir = setup_test_env();
    let err = builder(dir.path())
        .configure_services(|_, _| Err(Error::from("domain wiring failed")))
        .build()
        .unwrap_err();

    assert_eq!(err.phase(), Some(KernelLifecyclePhase::Bootstrap));
    assert!(std::error::Error::source(&err)
        .map(|source| source.to_string().contains("domain wiring failed"))
        .unwrap_or(false));
}

#[test]
fn test_second_hosted_service_is_rejected() {
    let dir = setup_test_env();
    let (startup, _, _) = TestStartup::new();

    let result = builder(dir.path())
        .startup(startup)
        .configure_services(|_, services| {
            services.add_hosted_service(IdleService);
            Ok(())
        })
        .build();

    assert!(matches!(
        result,
        Err(Error::KernelLifecycleError {
            phase: KernelLifecyclePhase::Bootstrap,
            ..
        })
    ));
}

#[tokio::test]
async fn test_start_runs_ui_session_once() {
    let dir = setup_test_env();
    let (startup, created, runs) = TestStartup::new();
    let host = builder(dir.path()).startup(startup).build().unwrap();
    let services_before = host.services().clone();

    host.start().await.expect("first start failed");
    assert_eq!(host.state(), HostState::Started);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(
        host.services().require::<EnvironmentMarker>().unwrap().0,
        constants::DEFAULT_ENVIRONMENT
    );

    // The session has ended; starting again is rejected and nothing is rebuilt.
    let err = host.start().await.unwrap_err();
    assert_eq!(err.phase(), Some(KernelLifecyclePhase::Start));
    assert_eq!(created.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&services_before, host.services()));

    host.stop().await.unwrap();
    assert_eq!(host.state(), HostState::Stopped);
    host.stop().await.expect("second stop should be a no-op");

    let err = host.start().await.unwrap_err();
    assert_eq!(err.phase(), Some(KernelLifecyclePhase::Start));
}

#[tokio::test]
async fn test_shutdown_before_start_skips_ui_session() {
    let dir = setup_test_env();
    let (startup, created, runs) = TestStartup::new();
    let host = builder(dir.path()).startup(startup).build().unwrap();

    host.request_shutdown();
    host.start().await.unwrap();

    assert_eq!(created.load(Ordering::SeqCst), 0);
    assert_eq!(runs.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unbindable_settings_fail_before_ui_session() {
    let dir = setup_test_env();
    write(dir.path(), "AppSettings.json", r#"{ "Application": { "Timeout": "soon" } }"#);
    let (startup, created, _) = TestStartup::new();
    let host = builder(dir.path()).startup(startup).build().unwrap();

    let err = host.start().await.unwrap_err();
    assert_eq!(err.phase(), Some(KernelLifecyclePhase::Start));
    assert_eq!(created.load(Ordering::SeqCst), 0);
    assert_eq!(host.state(), HostState::Built, "a failed validation must not mark the host started");
    host.stop().await.unwrap();
    assert_eq!(host.state(), HostState::Stopped);
}

#[tokio::test]
async fn test_run_starts_and_stops() {
    let dir = setup_test_env();
    let (startup, _, runs) = TestStartup::new();
    let host = builder(dir.path()).startup(startup).build().unwrap();

    host.run().await.unwrap();

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(host.state(), HostState::Stopped);
    assert!(host.shutdown_token().is_cancelled());
}

#[tokio::test]
async fn test_stop_releases_http_handlers() {
    let dir = setup_test_env();
    let host = builder(dir.path()).build().unwrap();
    let factory = host.services().require::<HttpClientFactory>().unwrap();

    let before = factory.create_client(None).unwrap();
    host.stop().await.unwrap();
    let after = factory.create_client(None).unwrap();

    assert!(after.handler_generation() > before.handler_generation());
}

#[test]
fn test_settings_are_bound_lazily_and_cached() {
    let dir = setup_test_env();
    write(dir.path(), "AppSettings.json", r#"{ "application": { "title": "Demo" } }"#);
    let (startup, _, _) = TestStartup::new();
    let host = builder(dir.path()).startup(startup).build().unwrap();

    let first = host.services().require::<TestSettings>().unwrap();
    let second = host.services().require::<TestSettings>().unwrap();
    assert_eq!(first.title, "Demo");
    assert!(Arc::ptr_eq(&first, &second));
}

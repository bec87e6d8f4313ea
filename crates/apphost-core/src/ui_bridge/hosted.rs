use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::kernel::component::HostedService;
use crate::kernel::constants::UI_THREAD_NAME;
use crate::kernel::error::Result;
use crate::ui_bridge::error::UiError;
use crate::ui_bridge::{UiRoot, UiSession};

/// Creates the UI root. Invoked on the UI thread.
pub type UiRootFactory = Arc<dyn Fn() -> std::result::Result<Box<dyn UiRoot>, UiError> + Send + Sync>;

/// The hosted unit that owns the UI session.
pub struct UiHostedService {
    factory: UiRootFactory,
    running: Arc<AtomicBool>,
}

impl UiHostedService {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> std::result::Result<Box<dyn UiRoot>, UiError> + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for UiHostedService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiHostedService")
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl HostedService for UiHostedService {
    fn name(&self) -> &'static str {
        "UiHostedService"
    }

    async fn start(&self, cancellation: CancellationToken) -> Result<()> {
        if cancellation.is_cancelled() {
            log::info!("Shutdown requested before the UI session started; skipping it");
            return Ok(());
        }
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(UiError::AlreadyRunning.into());
        }

        let (tx, rx) = oneshot::channel();
        let factory = self.factory.clone();
        let running = self.running.clone();
        let session = UiSession::new(cancellation);

        let spawned = thread::Builder::new()
            .name(UI_THREAD_NAME.to_string())
            .spawn(move || {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| run_session(&factory, &session)))
                    .unwrap_or_else(|payload| Err(UiError::SessionPanicked(panic_message(payload.as_ref()))));
                running.store(false, Ordering::SeqCst);
                // The receiver is gone only if the host stopped awaiting the session.
                let _ = tx.send(outcome);
            });
        if let Err(source) = spawned {
            self.running.store(false, Ordering::SeqCst);
            return Err(UiError::ThreadSpawn { source }.into());
        }

        let outcome = rx.await.map_err(|_| UiError::SessionLost)?;
        outcome?;
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        if self.is_running() {
            log::warn!("UI session is still running; it will end when its root returns");
        }
        Ok(())
    }
}

fn run_session(factory: &UiRootFactory, session: &UiSession) -> std::result::Result<(), UiError> {
    if session.close_requested() {
        log::info!("Shutdown requested before the UI root was created; skipping the session");
        return Ok(());
    }

    let mut root = factory()?;
    let name = root.name().to_string();
    log::debug!(
        "Initializing UI root '{}' on thread '{}'",
        name,
        thread::current().name().unwrap_or("<unnamed>")
    );
    root.initialize()?;

    log::info!("UI session '{}' started", name);
    root.run(session)?;
    log::info!("UI session '{}' ended", name);
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

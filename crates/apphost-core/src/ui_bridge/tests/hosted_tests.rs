use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::kernel::component::HostedService;
use crate::kernel::constants::UI_THREAD_NAME;
use crate::kernel::error::Error;
use crate::ui_bridge::{UiError, UiHostedService, UiRoot, UiSession};

/// Records where and how often it ran.
struct RecordingRoot {
    thread_name: Arc<Mutex<Option<String>>>,
    runs: Arc<AtomicUsize>,
}

impl UiRoot for RecordingRoot {
    fn name(&self) -> &str {
        "recording"
    }

    fn run(&mut self, _session: &UiSession) -> Result<(), UiError> {
        *self.thread_name.lock().unwrap() = thread::current().name().map(str::to_string);
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Loops until the host asks it to close.
struct PatientRoot;

impl UiRoot for PatientRoot {
    fn name(&self) -> &str {
        "patient"
    }

    fn run(&mut self, session: &UiSession) -> Result<(), UiError> {
        while !session.close_requested() {
            thread::sleep(Duration::from_millis(5));
        }
        Ok(())
    }
}

struct PanickingRoot;

impl UiRoot for PanickingRoot {
    fn name(&self) -> &str {
        "panicking"
    }

    fn run(&mut self, _session: &UiSession) -> Result<(), UiError> {
        panic!("window exploded");
    }
}

struct FailingRoot;

impl UiRoot for FailingRoot {
    fn name(&self) -> &str {
        "failing"
    }

    fn initialize(&mut self) -> Result<(), UiError> {
        Err(UiError::message("failing", "initialize", "no display"))
    }

    fn run(&mut self, _session: &UiSession) -> Result<(), UiError> {
        unreachable!("run must not be called after a failed initialize")
    }
}

fn recording_service() -> (UiHostedService, Arc<Mutex<Option<String>>>, Arc<AtomicUsize>) {
    let thread_name = Arc::new(Mutex::new(None));
    let runs = Arc::new(AtomicUsize::new(0));
    let (name_slot, run_count) = (thread_name.clone(), runs.clone());
    let service = UiHostedService::new(move || {
        Ok(Box::new(RecordingRoot {
            thread_name: name_slot.clone(),
            runs: run_count.clone(),
        }) as Box<dyn UiRoot>)
    });
    (service, thread_name, runs)
}

#[tokio::test]
async fn test_session_runs_on_dedicated_thread() {
    let (service, thread_name, runs) = recording_service();

    service.start(CancellationToken::new()).await.unwrap();

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(thread_name.lock().unwrap().as_deref(), Some(UI_THREAD_NAME));
    assert!(!service.is_running());
    service.stop().await.unwrap();
}

#[tokio::test]
async fn test_cancel_before_start_skips_session() {
    let created = Arc::new(AtomicUsize::new(0));
    let counter = created.clone();
    let service = UiHostedService::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(PatientRoot) as Box<dyn UiRoot>)
    });

    let token = CancellationToken::new();
    token.cancel();
    service.start(token).await.unwrap();

    assert_eq!(created.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_close_request_is_cooperative() {
    let service = UiHostedService::new(|| Ok(Box::new(PatientRoot) as Box<dyn UiRoot>));
    let token = CancellationToken::new();

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    tokio::time::timeout(Duration::from_secs(5), service.start(token))
        .await
        .expect("session should close after the request")
        .unwrap();
}

#[tokio::test]
async fn test_panic_is_reported_as_session_failure() {
    let service = UiHostedService::new(|| Ok(Box::new(PanickingRoot) as Box<dyn UiRoot>));

    match service.start(CancellationToken::new()).await {
        Err(Error::Ui(UiError::SessionPanicked(message))) => assert!(message.contains("window exploded")),
        other => panic!("Expected SessionPanicked, got {:?}", other),
    }
    assert!(!service.is_running());
}

#[tokio::test]
async fn test_root_failure_propagates() {
    let service = UiHostedService::new(|| Ok(Box::new(FailingRoot) as Box<dyn UiRoot>));

    let err = service.start(CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, Error::Ui(UiError::RootFailedWithMessage { .. })));
    assert!(err.to_string().contains("no display"));
}

#[tokio::test]
async fn test_factory_failure_propagates() {
    let service = UiHostedService::new(|| Err(UiError::message("window", "create", "toolkit missing")));

    let err = service.start(CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, Error::Ui(UiError::RootFailedWithMessage { .. })));
}

//! # UI Bridge
//!
//! Hosts the application's single UI session. A [`UiRoot`] is the opaque
//! front end; its main loop blocks the thread it runs on, so
//! [`UiHostedService`] gives it a dedicated OS thread for the whole session
//! and resolves its own `start` future only when that loop returns.
pub mod error;
pub mod hosted;

use tokio_util::sync::CancellationToken;

pub use error::UiError;
pub use hosted::{UiHostedService, UiRootFactory};

/// The front end started by the host.
///
/// A root is created on the UI thread and never leaves it, so it does not
/// need to be `Send`.
pub trait UiRoot {
    fn name(&self) -> &str;

    /// Prepare the root before its loop starts.
    fn initialize(&mut self) -> Result<(), UiError> {
        Ok(())
    }

    /// Run the main loop. Returns when the session ends.
    fn run(&mut self, session: &UiSession) -> Result<(), UiError>;
}

/// Handle passed to a running [`UiRoot`].
///
/// The host never interrupts a running loop. When shutdown is requested
/// while the session is active, [`UiSession::close_requested`] turns true
/// and the root may close itself.
#[derive(Debug, Clone)]
pub struct UiSession {
    cancellation: CancellationToken,
}

impl UiSession {
    pub fn new(cancellation: CancellationToken) -> Self {
        Self { cancellation }
    }

    pub fn close_requested(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

// Test module declaration
#[cfg(test)]
mod tests;

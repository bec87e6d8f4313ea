//! # Apphost Kernel
//!
//! The lifecycle supervisor. [`HostBuilder`] loads both configuration trees,
//! populates and freezes the service registry and yields a [`Host`], which
//! moves through `Built -> Started -> Stopped` exactly once. The
//! [`globals`] module exposes the single process-wide host and the accessors
//! derived from it.
pub mod bootstrap;
pub mod component;
pub mod constants;
pub mod error;
pub mod globals;

pub use bootstrap::{Host, HostBuilder, HostContext, HostEnvironment, HostState, Startup};
pub use component::HostedService;
pub use error::{Error, KernelLifecyclePhase, Result};
// Test module declaration
#[cfg(test)]
mod tests;

//! # Logging
//!
//! Library code logs through the `log` facade. [`init_sinks`] routes those
//! records into a `tracing-subscriber` registry with a console sink and, in
//! debug builds, a debug sink. [`Logger`] is a per-category handle resolved
//! from the service registry; when logging is not registered the accessors
//! hand out [`Logger::noop`] instead.
pub mod logger;
pub mod sinks;

pub use logger::{Logger, LoggerFactory, LoggingServiceExt};
pub use sinks::init_sinks;

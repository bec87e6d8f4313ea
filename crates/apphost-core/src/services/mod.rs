//! # Service Registry
//!
//! A write-once-then-frozen dependency container. [`ServiceCollection`] is
//! the mutable registration surface handed to every configuration step while
//! the host is built; [`ServiceCollection::build`] consumes it and yields the
//! read-only [`ServiceProvider`] that the process-wide accessors query.
pub mod collection;
pub mod error;
pub mod provider;

pub use collection::ServiceCollection;
pub use error::ServiceError;
pub use provider::ServiceProvider;

use std::any::type_name;
use std::fmt::Display;
use std::sync::Arc;

use log::Level;

use crate::services::ServiceCollection;

/// Logger bound to one category. The category becomes the log target.
#[derive(Debug, Clone)]
pub struct Logger {
    category: Arc<str>,
    enabled: bool,
}

impl Logger {
    fn new(category: &str) -> Self {
        Self {
            category: Arc::from(category),
            enabled: true,
        }
    }

    /// A logger that discards everything.
    pub fn noop(category: &str) -> Self {
        Self {
            category: Arc::from(category),
            enabled: false,
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn is_noop(&self) -> bool {
        !self.enabled
    }

    pub fn is_enabled(&self, level: Level) -> bool {
        self.enabled && log::log_enabled!(target: &*self.category, level)
    }

    pub fn log(&self, level: Level, message: impl Display) {
        if self.enabled {
            log::log!(target: &*self.category, level, "{}", message);
        }
    }

    pub fn trace(&self, message: impl Display) {
        self.log(Level::Trace, message);
    }

    pub fn debug(&self, message: impl Display) {
        self.log(Level::Debug, message);
    }

    pub fn info(&self, message: impl Display) {
        self.log(Level::Info, message);
    }

    pub fn warn(&self, message: impl Display) {
        self.log(Level::Warn, message);
    }

    pub fn error(&self, message: impl Display) {
        self.log(Level::Error, message);
    }
}

/// Hands out category loggers. Registered by [`LoggingServiceExt::add_logging`].
#[derive(Debug, Clone, Default)]
pub struct LoggerFactory;

impl LoggerFactory {
    pub fn new() -> Self {
        Self
    }

    pub fn create(&self, category: &str) -> Logger {
        Logger::new(category)
    }

    /// Logger whose category is the type name of `T`.
    pub fn create_for<T: ?Sized>(&self) -> Logger {
        Logger::new(type_name::<T>())
    }
}

pub trait LoggingServiceExt {
    /// Register the [`LoggerFactory`] capability.
    fn add_logging(&mut self) -> &mut Self;
}

impl LoggingServiceExt for ServiceCollection {
    fn add_logging(&mut self) -> &mut Self {
        self.add_singleton(LoggerFactory::new())
    }
}

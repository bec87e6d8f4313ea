use apphost_core::Logger;

/// The one domain service: builds greetings for the console session.
#[derive(Debug, Clone)]
pub struct GreetingService {
    greeting: String,
    logger: Logger,
}

impl GreetingService {
    pub fn new(greeting: impl Into<String>, logger: Logger) -> Self {
        Self {
            greeting: greeting.into(),
            logger,
        }
    }

    pub fn greet(&self, name: &str) -> String {
        let name = name.trim();
        self.logger.debug(format_args!("Greeting '{}'", name));
        if name.is_empty() {
            format!("{}!", self.greeting)
        } else {
            format!("{}, {}!", self.greeting, name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greet_formats_name() {
        let service = GreetingService::new("Hi", Logger::noop("test"));
        assert_eq!(service.greet("  Ada "), "Hi, Ada!");
        assert_eq!(service.greet(""), "Hi!");
    }
}

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::kernel::component::HostedService;
use crate::services::error::ServiceError;
use crate::services::provider::ServiceProvider;

pub(crate) type SharedService = Arc<dyn Any + Send + Sync>;
pub(crate) type ServiceFactory =
    Box<dyn Fn(&ServiceProvider) -> Result<SharedService, ServiceError> + Send + Sync>;
pub(crate) type Validation = Box<dyn Fn(&ServiceProvider) -> Result<(), ServiceError> + Send + Sync>;

pub(crate) enum Registration {
    /// Owned during the builder phase so it can still be mutated.
    Instance(Box<dyn Any + Send + Sync>),
    /// Built on first lookup, then cached.
    Singleton(ServiceFactory),
    /// Built on every lookup.
    Transient(ServiceFactory),
}

impl Registration {
    fn kind(&self) -> &'static str {
        match self {
            Registration::Instance(_) => "instance",
            Registration::Singleton(_) => "singleton",
            Registration::Transient(_) => "transient",
        }
    }
}

/// Mutable registration surface used while the host is being built.
///
/// Bindings are keyed by concrete type; registering a type twice replaces
/// the earlier binding. [`ServiceCollection::build`] consumes the collection,
/// so nothing can be registered once the registry is frozen.
#[derive(Default)]
pub struct ServiceCollection {
    registrations: HashMap<TypeId, (&'static str, Registration)>,
    validations: Vec<(String, Validation)>,
    hosted_services: Vec<Arc<dyn HostedService>>,
}

impl ServiceCollection {
    /// Create a new empty collection
    pub fn new() -> Self {
        Self::default()
    }

    fn insert<T: 'static>(&mut self, registration: Registration) -> &mut Self {
        let name = type_name::<T>();
        if let Some((_, previous)) = self.registrations.insert(TypeId::of::<T>(), (name, registration)) {
            log::debug!("Replacing {} registration for {}", previous.kind(), name);
        }
        self
    }

    /// Register a ready-made instance shared by every lookup.
    pub fn add_singleton<T>(&mut self, instance: T) -> &mut Self
    where
        T: Send + Sync + 'static,
    {
        self.insert::<T>(Registration::Instance(Box::new(instance)))
    }

    /// Register a singleton constructed on first lookup.
    pub fn add_singleton_with<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ServiceProvider) -> Result<T, ServiceError> + Send + Sync + 'static,
    {
        self.insert::<T>(Registration::Singleton(erase(factory)))
    }

    /// Register a factory invoked on every lookup.
    pub fn add_transient<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ServiceProvider) -> Result<T, ServiceError> + Send + Sync + 'static,
    {
        self.insert::<T>(Registration::Transient(erase(factory)))
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.registrations.contains_key(&TypeId::of::<T>())
    }

    /// Mutable access to an instance registered with [`add_singleton`](Self::add_singleton).
    pub fn instance_mut<T: 'static>(&mut self) -> Option<&mut T> {
        match self.registrations.get_mut(&TypeId::of::<T>()) {
            Some((_, Registration::Instance(instance))) => instance.downcast_mut::<T>(),
            _ => None,
        }
    }

    /// Register a check that [`ServiceProvider::validate`] runs before hosted
    /// services start.
    pub fn add_validation<F>(&mut self, name: impl Into<String>, check: F) -> &mut Self
    where
        F: Fn(&ServiceProvider) -> Result<(), ServiceError> + Send + Sync + 'static,
    {
        self.validations.push((name.into(), Box::new(check)));
        self
    }

    pub fn add_hosted_service<H: HostedService>(&mut self, service: H) -> &mut Self {
        self.hosted_services.push(Arc::new(service));
        self
    }

    pub fn hosted_service_count(&self) -> usize {
        self.hosted_services.len()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Freeze the collection into a read-only provider.
    pub fn build(self) -> ServiceProvider {
        log::debug!(
            "Freezing service registry with {} bindings and {} hosted services",
            self.registrations.len(),
            self.hosted_services.len()
        );
        ServiceProvider::new(self.registrations, self.validations, self.hosted_services)
    }
}

impl fmt::Debug for ServiceCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.registrations.values().map(|(name, _)| *name).collect();
        names.sort_unstable();
        f.debug_struct("ServiceCollection")
            .field("registrations", &names)
            .field("validations", &self.validations.len())
            .field("hosted_services", &self.hosted_services)
            .finish()
    }
}

fn erase<T, F>(factory: F) -> ServiceFactory
where
    T: Send + Sync + 'static,
    F: Fn(&ServiceProvider) -> Result<T, ServiceError> + Send + Sync + 'static,
{
    Box::new(move |provider| factory(provider).map(|value| Arc::new(value) as SharedService))
}

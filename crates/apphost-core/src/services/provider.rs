use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::kernel::component::HostedService;
use crate::services::collection::{Registration, ServiceFactory, SharedService, Validation};
use crate::services::error::ServiceError;
use crate::utils::{InitError, InitOnce};

enum Binding {
    Instance(SharedService),
    Singleton {
        factory: ServiceFactory,
        cell: InitOnce<SharedService>,
    },
    Transient(ServiceFactory),
}

impl From<Registration> for Binding {
    fn from(registration: Registration) -> Self {
        match registration {
            Registration::Instance(instance) => Binding::Instance(Arc::from(instance)),
            Registration::Singleton(factory) => Binding::Singleton {
                factory,
                cell: InitOnce::new(),
            },
            Registration::Transient(factory) => Binding::Transient(factory),
        }
    }
}

/// The frozen service registry.
///
/// Read-only after construction and safe to share across threads. Lazy
/// singletons are created at most once even when first requested from
/// several threads at the same time.
pub struct ServiceProvider {
    bindings: HashMap<TypeId, (&'static str, Binding)>,
    validations: Vec<(String, Validation)>,
    hosted_services: Vec<Arc<dyn HostedService>>,
}

impl ServiceProvider {
    pub(crate) fn new(
        registrations: HashMap<TypeId, (&'static str, Registration)>,
        validations: Vec<(String, Validation)>,
        hosted_services: Vec<Arc<dyn HostedService>>,
    ) -> Self {
        let bindings = registrations
            .into_iter()
            .map(|(type_id, (name, registration))| (type_id, (name, Binding::from(registration))))
            .collect();
        Self {
            bindings,
            validations,
            hosted_services,
        }
    }

    fn resolve(&self, type_id: &TypeId) -> Option<Result<SharedService, ServiceError>> {
        let (type_name, binding) = self.bindings.get(type_id)?;
        Some(match binding {
            Binding::Instance(instance) => Ok(instance.clone()),
            Binding::Singleton { factory, cell } => match cell.get_or_try_init(|| factory(self)) {
                Ok(instance) => Ok(instance.clone()),
                Err(InitError::Failed(err)) => Err(err),
                Err(InitError::Reentered) => Err(ServiceError::Reentered { type_name: *type_name }),
            },
            Binding::Transient(factory) => factory(self),
        })
    }

    /// Look up `T`, distinguishing "not registered" (`Ok(None)`) from a
    /// registered service that failed to construct (`Err`).
    pub fn try_get<T>(&self) -> Result<Option<Arc<T>>, ServiceError>
    where
        T: Send + Sync + 'static,
    {
        match self.resolve(&TypeId::of::<T>()) {
            None => Ok(None),
            Some(resolved) => {
                let shared = resolved?;
                let service = Arc::downcast::<T>(shared).map_err(|_| ServiceError::TypeMismatch {
                    type_name: type_name::<T>(),
                })?;
                Ok(Some(service))
            }
        }
    }

    /// Look up an optional capability. Construction failures are logged and
    /// read as absent.
    pub fn get<T>(&self) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        match self.try_get::<T>() {
            Ok(service) => service,
            Err(e) => {
                log::warn!("Service {} could not be resolved: {}", type_name::<T>(), e);
                None
            }
        }
    }

    /// Look up a capability the caller cannot work without.
    pub fn require<T>(&self) -> Result<Arc<T>, ServiceError>
    where
        T: Send + Sync + 'static,
    {
        self.try_get::<T>()?.ok_or(ServiceError::NotRegistered {
            type_name: type_name::<T>(),
        })
    }

    pub fn contains<T: Any>(&self) -> bool {
        self.bindings.contains_key(&TypeId::of::<T>())
    }

    /// Run every registered validation, stopping at the first failure.
    pub fn validate(&self) -> Result<(), ServiceError> {
        for (name, check) in &self.validations {
            log::debug!("Running service validation '{}'", name);
            check(self).map_err(|source| ServiceError::ValidationFailed {
                name: name.clone(),
                source: Box::new(source),
            })?;
        }
        Ok(())
    }

    pub fn hosted_services(&self) -> &[Arc<dyn HostedService>] {
        &self.hosted_services
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.bindings.values().map(|(name, _)| *name).collect();
        names.sort_unstable();
        f.debug_struct("ServiceProvider")
            .field("bindings", &names)
            .field("hosted_services", &self.hosted_services)
            .finish()
    }
}

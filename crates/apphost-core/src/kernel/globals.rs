//! Process-wide accessors.
//!
//! The entry point installs a recipe once with [`install`]; the first call to
//! any accessor that needs the host runs it. Concurrent first callers share
//! a single build. A failed build is returned to the caller and not cached,
//! so the next caller sees the same diagnostic again. Reaching for the host
//! from inside its own recipe (for example from a `configure_services` hook)
//! is a Bootstrap error; [`logger_for`] falls back to a no-op logger there.
use std::any::type_name;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use crate::http::{HttpClient, HttpClientFactory, HttpError};
use crate::kernel::bootstrap::{Host, HostState};
use crate::kernel::error::{Error, KernelLifecyclePhase, Result};
use crate::logging::{Logger, LoggerFactory};
use crate::services::ServiceProvider;
use crate::utils::{InitError, InitOnce};

type HostRecipe = Box<dyn Fn() -> Result<Host> + Send + Sync>;

static RECIPE: OnceLock<HostRecipe> = OnceLock::new();
static HOST: InitOnce<Host> = InitOnce::new();
static BUILDS: AtomicUsize = AtomicUsize::new(0);

/// Install the recipe used to build the process host. Only the first call succeeds.
pub fn install<F>(recipe: F) -> Result<()>
where
    F: Fn() -> Result<Host> + Send + Sync + 'static,
{
    RECIPE
        .set(Box::new(recipe))
        .map_err(|_| Error::lifecycle(KernelLifecyclePhase::Bootstrap, "a host recipe is already installed"))
}

/// The process host, built on first access.
pub fn host() -> Result<&'static Host> {
    HOST.get_or_try_init(|| {
        let recipe = RECIPE.get().ok_or_else(|| {
            Error::lifecycle(
                KernelLifecyclePhase::Bootstrap,
                "no host recipe installed; call globals::install first",
            )
        })?;
        BUILDS.fetch_add(1, Ordering::SeqCst);
        recipe()
    })
    .map_err(|err| match err {
        InitError::Failed(err) => err,
        InitError::Reentered => Error::lifecycle(
            KernelLifecyclePhase::Bootstrap,
            "host accessed while it is being built; use the HostContext passed to the hook instead",
        ),
    })
}

/// Number of times a host build has been attempted in this process.
pub fn build_count() -> usize {
    BUILDS.load(Ordering::SeqCst)
}

pub fn state() -> HostState {
    HOST.get().map_or(HostState::Unbuilt, Host::state)
}

pub fn services() -> Result<Arc<ServiceProvider>> {
    Ok(host()?.services().clone())
}

/// Logger for the type name of `T`.
pub fn logger<T: ?Sized>() -> Logger {
    logger_for(type_name::<T>())
}

/// Logger for `category`. Falls back to a no-op logger when the host cannot
/// be built or logging is not registered.
pub fn logger_for(category: &str) -> Logger {
    match host() {
        Ok(host) => host
            .services()
            .get::<LoggerFactory>()
            .map(|factory| factory.create(category))
            .unwrap_or_else(|| Logger::noop(category)),
        Err(_) => Logger::noop(category),
    }
}

/// The settings record bound from the `Application` section.
pub fn settings<S>() -> Result<Arc<S>>
where
    S: Send + Sync + 'static,
{
    Ok(host()?.services().require::<S>()?)
}

/// A client for the named profile; `None` or a blank name selects the standard profile.
pub fn http_client(name: Option<&str>) -> Result<HttpClient> {
    let factory = host()?
        .services()
        .get::<HttpClientFactory>()
        .ok_or(HttpError::FactoryNotRegistered)?;
    Ok(factory.create_client(name)?)
}

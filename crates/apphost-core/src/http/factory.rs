use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use reqwest::cookie::Jar;
use reqwest::Client;

use crate::http::client::HttpClient;
use crate::http::error::HttpError;
use crate::http::profile::{normalize_profile_name, HttpClientProfile};

/// One pooled transport: a `reqwest::Client` plus the cookie jar it owns.
#[derive(Debug, Clone)]
struct TransportHandler {
    client: Client,
    cookies: Arc<Jar>,
    created_at: Instant,
    generation: u64,
}

impl TransportHandler {
    fn build(profile: &HttpClientProfile, generation: u64) -> Result<Self, HttpError> {
        let cookies = Arc::new(Jar::default());
        let mut builder = Client::builder()
            .default_headers(profile.default_headers().clone())
            .cookie_provider(cookies.clone())
            .pool_idle_timeout(profile.handler_lifetime());
        if let Some(timeout) = profile.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|source| HttpError::ClientBuild {
            profile: profile.name().to_string(),
            source,
        })?;
        Ok(Self {
            client,
            cookies,
            created_at: Instant::now(),
            generation,
        })
    }
}

#[derive(Debug)]
struct ProfileSlot {
    profile: HttpClientProfile,
    handler: Mutex<Option<TransportHandler>>,
    generations: AtomicU64,
}

impl ProfileSlot {
    fn new(profile: HttpClientProfile) -> Self {
        Self {
            profile,
            handler: Mutex::new(None),
            generations: AtomicU64::new(0),
        }
    }

    /// The live handler, replaced first if it has outlived the profile's lifetime.
    fn current_handler(&self) -> Result<TransportHandler, HttpError> {
        let mut guard = self.handler.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handler) = guard.as_ref() {
            if handler.created_at.elapsed() < self.profile.handler_lifetime() {
                return Ok(handler.clone());
            }
            log::debug!(
                "Recycling transport handler #{} for profile {} after {:?}",
                handler.generation,
                self.profile.name(),
                handler.created_at.elapsed()
            );
        }

        let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
        let handler = TransportHandler::build(&self.profile, generation)?;
        *guard = Some(handler.clone());
        Ok(handler)
    }

    fn release(&self) {
        self.handler.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}

/// Named, resilient HTTP clients.
///
/// Profiles are registered while the host is being built and looked up by
/// name afterwards. Names are case-insensitive; a missing or blank name
/// selects the standard profile.
#[derive(Debug, Default)]
pub struct HttpClientFactory {
    profiles: HashMap<String, ProfileSlot>,
}

impl HttpClientFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a profile, or apply `configure` on top of an existing one.
    pub fn register<F>(&mut self, name: &str, configure: F) -> &mut Self
    where
        F: FnOnce(&mut HttpClientProfile),
    {
        let slot = self.slot_mut(name);
        configure(&mut slot.profile);
        self
    }

    /// Like [`register`](Self::register) for configuration steps that can fail.
    pub fn try_register<F>(&mut self, name: &str, configure: F) -> Result<&mut Self, HttpError>
    where
        F: FnOnce(&mut HttpClientProfile) -> Result<(), HttpError>,
    {
        let slot = self.slot_mut(name);
        configure(&mut slot.profile)?;
        Ok(self)
    }

    fn slot_mut(&mut self, name: &str) -> &mut ProfileSlot {
        let key = normalize_profile_name(Some(name));
        let slot = self
            .profiles
            .entry(key.clone())
            .or_insert_with(|| ProfileSlot::new(HttpClientProfile::new(&key)));
        // A reconfigured profile must not keep serving a handler built from the old settings.
        slot.handler.get_mut().unwrap_or_else(PoisonError::into_inner).take();
        slot
    }

    pub fn contains(&self, name: &str) -> bool {
        self.profiles.contains_key(&normalize_profile_name(Some(name)))
    }

    pub fn profile(&self, name: Option<&str>) -> Option<&HttpClientProfile> {
        self.profiles
            .get(&normalize_profile_name(name))
            .map(|slot| &slot.profile)
    }

    /// Registered profile names, sorted.
    pub fn profile_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.profiles.keys().cloned().collect();
        names.sort();
        names
    }

    /// A client for `name`, or for the standard profile when `name` is `None`
    /// or blank. Unknown names are an error, never a default client.
    pub fn create_client(&self, name: Option<&str>) -> Result<HttpClient, HttpError> {
        let key = normalize_profile_name(name);
        let slot = self.profiles.get(&key).ok_or_else(|| HttpError::UnknownProfile {
            name: key.clone(),
            known: self.profile_names(),
        })?;
        let handler = slot.current_handler()?;
        Ok(HttpClient::new(
            slot.profile.name(),
            handler.client,
            slot.profile.default_headers().clone(),
            slot.profile.retry_policy().clone(),
            handler.cookies,
            handler.generation,
        ))
    }

    /// Drop every pooled handler. Clients already handed out keep working;
    /// the next `create_client` builds a fresh handler.
    pub fn shutdown(&self) {
        for slot in self.profiles.values() {
            slot.release();
        }
        log::debug!("Released transport handlers for {} HTTP profiles", self.profiles.len());
    }
}

//! Typed settings bound from a configuration section.
use std::any::type_name;

use serde::de::DeserializeOwned;

use crate::config::tree::Configuration;
use crate::services::{ServiceCollection, ServiceError};

/// Registration of typed settings objects.
pub trait OptionsServiceExt {
    /// Bind `S` from `section` of the registered [`Configuration`] on first
    /// lookup. Binding is also checked before hosted services start, so a
    /// section that does not fit `S` fails the host instead of the first
    /// caller.
    fn configure<S>(&mut self, section: &str) -> &mut Self
    where
        S: DeserializeOwned + Send + Sync + 'static;
}

impl OptionsServiceExt for ServiceCollection {
    fn configure<S>(&mut self, section: &str) -> &mut Self
    where
        S: DeserializeOwned + Send + Sync + 'static,
    {
        let path = section.to_string();
        self.add_singleton_with::<S, _>(move |provider| {
            let config = provider.require::<Configuration>()?;
            config
                .bind::<S>(&path)
                .map_err(|err| ServiceError::construction(type_name::<S>(), err))
        })
        .add_validation(format!("settings '{}'", section), |provider| {
            provider.require::<S>().map(|_| ())
        })
    }
}

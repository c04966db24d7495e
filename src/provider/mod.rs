//! Per-resource page variable providers.
//!
//! A script definition may name a provider handle (`config = "app"`). At
//! emission the handle is looked up in a [`ProviderRegistry`] and the
//! provider returns the variables written into the config script that
//! follows the resource.

use rustc_hash::FxHashMap;
use serde_json::{Map, Value};

use crate::emit::RequestContext;
use crate::error::{Error, Result};

/// Ordered variable name → JSON value mapping.
pub type Variables = Map<String, Value>;

/// Supplies page variables for a resource.
pub trait ConfigProvider {
    /// Variables for resource `name` in the current request.
    fn variables(&self, name: &str, ctx: &RequestContext) -> anyhow::Result<Variables>;
}

/// Fixed variables, as declared under `[variables.<handle>]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticProvider {
    variables: Variables,
}

impl StaticProvider {
    pub fn new(variables: Variables) -> Self {
        Self { variables }
    }
}

impl ConfigProvider for StaticProvider {
    fn variables(&self, _name: &str, _ctx: &RequestContext) -> anyhow::Result<Variables> {
        Ok(self.variables.clone())
    }
}

impl<F> ConfigProvider for F
where
    F: Fn(&str, &RequestContext) -> anyhow::Result<Variables>,
{
    fn variables(&self, name: &str, ctx: &RequestContext) -> anyhow::Result<Variables> {
        self(name, ctx)
    }
}

/// Handle → provider lookup.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: FxHashMap<String, Box<dyn ConfigProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider` under `handle`, replacing any previous one.
    pub fn register(&mut self, handle: impl Into<String>, provider: impl ConfigProvider + 'static) {
        self.providers.insert(handle.into(), Box::new(provider));
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, handle: impl Into<String>, provider: impl ConfigProvider + 'static) -> Self {
        self.register(handle, provider);
        self
    }

    pub fn contains(&self, handle: &str) -> bool {
        self.providers.contains_key(handle)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Variables of resource `name` from the provider registered as `handle`.
    pub fn variables(&self, handle: &str, name: &str, ctx: &RequestContext) -> Result<Variables> {
        let provider = self
            .providers
            .get(handle)
            .ok_or_else(|| Error::UnknownProvider {
                name: name.to_owned(),
                provider: handle.to_owned(),
            })?;
        provider.variables(name, ctx).map_err(|e| Error::Provider {
            name: name.to_owned(),
            message: format!("{e:#}"),
        })
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut handles: Vec<_> = self.providers.keys().collect();
        handles.sort_unstable();
        f.debug_struct("ProviderRegistry")
            .field("handles", &handles)
            .finish()
    }
}

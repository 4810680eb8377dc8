//! Manual override configuration source
//!
//! The highest-precedence provider: anything set here wins over platform
//! settings, environment variables, and auto-discovery. Used by embedders
//! that let an operator pin a PAC URL or a static proxy regardless of what
//! the host system advertises.

use std::sync::{Arc, RwLock};

use crate::traits::ConfigSource;

#[derive(Debug, Default)]
struct Overrides {
    auto_discover: Option<bool>,
    auto_config_url: Option<String>,
    proxy: Option<String>,
    bypass_list: Option<String>,
}

/// Manual override provider
///
/// Cloning shares the underlying override set, so an embedder can keep one
/// handle for mutation after registering a clone with the stack. Every
/// field starts absent; an override set to an empty string is still "set".
#[derive(Debug, Default, Clone)]
pub struct OverrideConfigSource {
    overrides: Arc<RwLock<Overrides>>,
}

impl OverrideConfigSource {
    /// Create a provider with no overrides set
    pub fn new() -> Self {
        Self::default()
    }

    /// Force auto-discovery on or off
    pub fn set_auto_discover(&self, enabled: bool) {
        self.overrides.write().unwrap().auto_discover = Some(enabled);
    }

    /// Pin the PAC URL
    pub fn set_auto_config_url(&self, url: impl Into<String>) {
        self.overrides.write().unwrap().auto_config_url = Some(url.into());
    }

    /// Pin the proxy for every protocol
    ///
    /// The value is returned as given; callers configuring in PAC grammar
    /// should pass `PROXY host:port`.
    pub fn set_proxy(&self, proxy: impl Into<String>) {
        self.overrides.write().unwrap().proxy = Some(proxy.into());
    }

    /// Pin the bypass list
    pub fn set_bypass_list(&self, bypass: impl Into<String>) {
        self.overrides.write().unwrap().bypass_list = Some(bypass.into());
    }

    /// Drop every override, returning the provider to fully absent
    pub fn clear(&self) {
        *self.overrides.write().unwrap() = Overrides::default();
    }
}

impl ConfigSource for OverrideConfigSource {
    fn name(&self) -> &'static str {
        "override"
    }

    fn auto_discover(&self) -> bool {
        self.overrides
            .read()
            .unwrap()
            .auto_discover
            .unwrap_or(false)
    }

    fn auto_config_url(&self) -> Option<String> {
        self.overrides.read().unwrap().auto_config_url.clone()
    }

    fn proxy_for_protocol(&self, _protocol: &str) -> Option<String> {
        self.overrides.read().unwrap().proxy.clone()
    }

    fn bypass_list(&self) -> Option<String> {
        self.overrides.read().unwrap().bypass_list.clone()
    }
}

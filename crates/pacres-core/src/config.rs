//! Configuration types for the proxy resolution system
//!
//! This module defines the structures that tune discovery and execution.
//! Per-provider proxy *settings* (overrides, environment variables) live
//! with their [`crate::ConfigSource`] implementations; these types carry
//! the knobs of the resolution machinery itself.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Main resolver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// WPAD discovery settings
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Script execution settings
    #[serde(default)]
    pub exec: ExecConfig,
}

impl ResolverConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self {
            discovery: DiscoveryConfig::default(),
            exec: ExecConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.discovery.validate()?;
        self.exec.validate()?;
        Ok(())
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// WPAD discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Whether to consult DHCP-advertised WPAD URLs
    #[serde(default = "default_true")]
    pub dhcp: bool,

    /// Whether to walk DNS suffixes for wpad.dat
    #[serde(default = "default_true")]
    pub dns: bool,

    /// Per-adapter DHCP query timeout in seconds
    #[serde(default = "default_dhcp_timeout_secs")]
    pub dhcp_timeout_secs: u64,

    /// FQDN seed for the DNS suffix walk; derived from the local host
    /// name when absent
    #[serde(default)]
    pub fqdn: Option<String>,
}

impl DiscoveryConfig {
    /// Validate the discovery configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.dhcp_timeout_secs == 0 {
            return Err(crate::Error::config("DHCP timeout must be > 0"));
        }
        Ok(())
    }

    /// DHCP query timeout as a [`Duration`]
    pub fn dhcp_timeout(&self) -> Duration {
        Duration::from_secs(self.dhcp_timeout_secs)
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            dhcp: true,
            dns: true,
            dhcp_timeout_secs: default_dhcp_timeout_secs(),
            fqdn: None,
        }
    }
}

/// Script execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecConfig {
    /// Ordered candidate backend names to probe at global init
    ///
    /// Empty means "probe every registered candidate in registration
    /// order".
    #[serde(default)]
    pub backends: Vec<String>,
}

impl ExecConfig {
    /// Validate the execution configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.backends.iter().any(|name| name.is_empty()) {
            return Err(crate::Error::config("Backend name cannot be empty"));
        }
        Ok(())
    }
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            backends: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_dhcp_timeout_secs() -> u64 {
    3
}

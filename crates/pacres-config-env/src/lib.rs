// # Environment Variable Configuration Source
//
// This crate provides a proxy configuration source backed by the
// conventional Unix proxy environment variables:
//
// - `<protocol>_proxy` (and `<PROTOCOL>_PROXY`) name the proxy for one
//   protocol, e.g. `http_proxy`, `https_proxy`, `ftp_proxy`
// - `no_proxy` / `NO_PROXY` hold the bypass list
//
// The uppercase form is NOT consulted for `http`: in CGI-like
// environments `HTTP_PROXY` can be populated from an attacker-controlled
// `Proxy` request header, so only the lowercase `http_proxy` is trusted.
//
// Environment variables carry no PAC URL and no discovery flag, so this
// source never answers `auto_config_url` and never requests discovery.

use pacres_core::registry::SourceStack;
use pacres_core::traits::ConfigSource;
use tracing::debug;

/// Configuration source reading the process environment
///
/// Values are read live on each query; changes to the environment are
/// visible to subsequent resolutions.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvConfigSource;

impl EnvConfigSource {
    pub fn new() -> Self {
        Self
    }

    // A variable set to the empty string is still set; only an unset
    // variable reads as absent.
    fn var(name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl ConfigSource for EnvConfigSource {
    fn name(&self) -> &'static str {
        "env"
    }

    fn auto_discover(&self) -> bool {
        false
    }

    fn auto_config_url(&self) -> Option<String> {
        None
    }

    fn proxy_for_protocol(&self, protocol: &str) -> Option<String> {
        let lower = format!("{}_proxy", protocol.to_ascii_lowercase());
        let value = Self::var(&lower).or_else(|| {
            if protocol.eq_ignore_ascii_case("http") {
                // HTTP_PROXY is spoofable through the CGI Proxy header.
                None
            } else {
                Self::var(&format!("{}_PROXY", protocol.to_ascii_uppercase()))
            }
        })?;
        debug!("Using {} proxy from environment: {}", protocol, value);
        Some(format!("PROXY {value}"))
    }

    fn bypass_list(&self) -> Option<String> {
        Self::var("no_proxy").or_else(|| Self::var("NO_PROXY"))
    }
}

/// Register the environment source with a configuration stack
pub fn register(stack: &SourceStack) {
    stack.register(Box::new(EnvConfigSource::new()));
}

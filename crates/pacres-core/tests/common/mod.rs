//! Test doubles and common utilities for architecture contract tests
//!
//! This module provides minimal test doubles that verify architectural
//! constraints without implementing real functionality.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use pacres_core::error::{Error, Result};
use pacres_core::exec::{PacEngine, PacEngineFactory};
use pacres_core::traits::net_adapter::{Adapter, AdapterSource, DhcpWpadLookup};
use pacres_core::traits::{ConfigSource, DnsResolver};

/// A config source answering from fixed values
pub struct FixedConfigSource {
    name: &'static str,
    auto_discover: bool,
    auto_config_url: Option<String>,
    proxies: HashMap<String, String>,
    bypass: Option<String>,
    /// Call counter across all query methods
    query_count: Arc<AtomicUsize>,
}

impl FixedConfigSource {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            auto_discover: false,
            auto_config_url: None,
            proxies: HashMap::new(),
            bypass: None,
            query_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_auto_discover(mut self, enabled: bool) -> Self {
        self.auto_discover = enabled;
        self
    }

    pub fn with_auto_config_url(mut self, url: &str) -> Self {
        self.auto_config_url = Some(url.to_string());
        self
    }

    pub fn with_proxy(mut self, protocol: &str, proxy: &str) -> Self {
        self.proxies.insert(protocol.to_string(), proxy.to_string());
        self
    }

    pub fn with_bypass(mut self, bypass: &str) -> Self {
        self.bypass = Some(bypass.to_string());
        self
    }

    /// Get the number of times any query method was called
    pub fn query_count(&self) -> usize {
        self.query_count.load(Ordering::SeqCst)
    }
}

impl ConfigSource for FixedConfigSource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn auto_discover(&self) -> bool {
        self.query_count.fetch_add(1, Ordering::SeqCst);
        self.auto_discover
    }

    fn auto_config_url(&self) -> Option<String> {
        self.query_count.fetch_add(1, Ordering::SeqCst);
        self.auto_config_url.clone()
    }

    fn proxy_for_protocol(&self, protocol: &str) -> Option<String> {
        self.query_count.fetch_add(1, Ordering::SeqCst);
        self.proxies.get(protocol).cloned()
    }

    fn bypass_list(&self) -> Option<String> {
        self.query_count.fetch_add(1, Ordering::SeqCst);
        self.bypass.clone()
    }
}

/// Handle used by a test to unblock a [`GatedConfigSource`]
#[derive(Clone)]
pub struct Gate(Arc<(Mutex<bool>, Condvar)>);

impl Gate {
    pub fn open(&self) {
        let (lock, cvar) = &*self.0;
        *lock.lock().unwrap() = true;
        cvar.notify_all();
    }
}

/// A config source whose `auto_config_url` answer blocks until the test
/// opens the gate
///
/// Lets a test hold a resolution at a known point while it observes or
/// cancels it. Run tests using this double on a multi-threaded runtime.
pub struct GatedConfigSource {
    url: String,
    gate: Arc<(Mutex<bool>, Condvar)>,
}

impl GatedConfigSource {
    pub fn new(url: &str) -> (Self, Gate) {
        let gate = Arc::new((Mutex::new(false), Condvar::new()));
        let source = Self {
            url: url.to_string(),
            gate: Arc::clone(&gate),
        };
        (source, Gate(gate))
    }
}

impl ConfigSource for GatedConfigSource {
    fn name(&self) -> &'static str {
        "gated"
    }

    fn auto_discover(&self) -> bool {
        false
    }

    fn auto_config_url(&self) -> Option<String> {
        let (lock, cvar) = &*self.gate;
        let mut opened = lock.lock().unwrap();
        while !*opened {
            opened = cvar.wait(opened).unwrap();
        }
        Some(self.url.clone())
    }

    fn proxy_for_protocol(&self, _protocol: &str) -> Option<String> {
        None
    }

    fn bypass_list(&self) -> Option<String> {
        None
    }
}

/// A DNS resolver answering from a fixed table
pub struct TableDnsResolver {
    entries: HashMap<String, String>,
    local: String,
    /// Call counter for resolve()
    resolve_call_count: Arc<AtomicUsize>,
}

impl TableDnsResolver {
    pub fn new(local: &str) -> Self {
        Self {
            entries: HashMap::new(),
            local: local.to_string(),
            resolve_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_entry(mut self, host: &str, addr: &str) -> Self {
        self.entries.insert(host.to_string(), addr.to_string());
        self
    }

    /// Get the number of times resolve() was called
    pub fn resolve_call_count(&self) -> usize {
        self.resolve_call_count.load(Ordering::SeqCst)
    }
}

impl DnsResolver for TableDnsResolver {
    fn resolve(&self, host: Option<&str>) -> Option<String> {
        self.resolve_call_count.fetch_add(1, Ordering::SeqCst);
        match host {
            Some(host) => self.entries.get(host).cloned(),
            None => Some(self.local.clone()),
        }
    }
}

/// An adapter source backed by a fixed list
pub struct StaticAdapters(pub Vec<Adapter>);

impl AdapterSource for StaticAdapters {
    fn enumerate(&self, callback: &mut dyn FnMut(&Adapter) -> bool) -> bool {
        for adapter in &self.0 {
            if callback(adapter) {
                break;
            }
        }
        true
    }
}

/// A DHCP lookup answering with one preset URL for every adapter
pub struct ScriptedDhcp {
    url: Option<String>,
    /// Call counter for lookup()
    lookup_call_count: Arc<AtomicUsize>,
}

impl ScriptedDhcp {
    pub fn new(url: Option<&str>) -> Self {
        Self {
            url: url.map(str::to_string),
            lookup_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of times lookup() was called
    pub fn lookup_call_count(&self) -> usize {
        self.lookup_call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DhcpWpadLookup for ScriptedDhcp {
    async fn lookup(&self, _adapter: &Adapter, _timeout: Duration) -> Option<String> {
        self.lookup_call_count.fetch_add(1, Ordering::SeqCst);
        self.url.clone()
    }
}

/// Build an adapter snapshot for discovery tests
pub fn test_adapter(name: &str, connected: bool, dhcp: bool, loopback: bool) -> Adapter {
    Adapter {
        name: name.to_string(),
        description: format!("{name} (test)"),
        mac: [0x02, 0, 0, 0, 0, 1],
        is_connected: connected,
        is_ethernet: true,
        is_dhcp: dhcp,
        is_loopback: loopback,
        ip: None,
        netmask: None,
        gateway: None,
        dns_servers: Vec::new(),
        dhcp_server: None,
    }
}

/// A script engine that returns a canned proxy list and records its calls
pub struct ScriptedEngine {
    result: String,
    calls: Arc<RwLock<Vec<(String, String)>>>,
}

impl PacEngine for ScriptedEngine {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn find_proxy_for_url(
        &self,
        script: &str,
        url: &str,
        _dns: &Arc<dyn DnsResolver>,
    ) -> Result<String> {
        self.calls
            .write()
            .unwrap()
            .push((script.to_string(), url.to_string()));
        Ok(self.result.clone())
    }
}

/// Factory producing [`ScriptedEngine`]s
pub struct ScriptedEngineFactory {
    result: String,
    calls: Arc<RwLock<Vec<(String, String)>>>,
}

impl ScriptedEngineFactory {
    pub fn new(result: &str) -> Self {
        Self {
            result: result.to_string(),
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Get the `(script, url)` pairs the engine was asked to evaluate
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.read().unwrap().clone()
    }

    /// Shared handle to the recorded calls, usable after the factory is
    /// handed to `exec::global_init`
    pub fn calls_handle(&self) -> Arc<RwLock<Vec<(String, String)>>> {
        Arc::clone(&self.calls)
    }
}

impl PacEngineFactory for ScriptedEngineFactory {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn probe(&self) -> Result<Box<dyn PacEngine>> {
        Ok(Box::new(ScriptedEngine {
            result: self.result.clone(),
            calls: Arc::clone(&self.calls),
        }))
    }
}

/// A factory whose probe always refuses
pub struct UnavailableEngineFactory;

impl PacEngineFactory for UnavailableEngineFactory {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn probe(&self) -> Result<Box<dyn PacEngine>> {
        Err(Error::engine_unavailable("backend not present"))
    }
}

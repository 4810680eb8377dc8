//! Proxy resolver orchestrator
//!
//! Composes the configuration stack, WPAD discovery, the fetch client, and
//! the script execution engine into the end-to-end "resolve proxy for URL"
//! operation.
//!
//! ## Resolution order
//!
//! 1. Bypass list — a matching target host completes with `DIRECT`.
//! 2. Static per-protocol proxy — completes without discovery/execution.
//! 3. Explicit PAC URL — fetched; a fetch failure is terminal.
//! 4. WPAD discovery (when requested) — absence of WPAD is normal, not
//!    an error.
//! 5. PAC execution against the target URL, on a blocking worker.
//! 6. Nothing configured at all — completes with an implicit `DIRECT`.
//!
//! ## Lifecycle
//!
//! `Created → Running → {Completed, Failed, Cancelled}`. Each resolution
//! runs to completion on one spawned task; handles share no mutable state
//! with each other beyond the process-wide engine binding. Cancellation is
//! cooperative and observed before each suspension point. Terminal states
//! are immutable: exactly one proxy list or one error is associated with a
//! terminal handle, never both, never neither.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use crate::cancel::CancelFlag;
use crate::config::ResolverConfig;
use crate::error::{Error, Result};
use crate::exec::PacExecutor;
use crate::proxy::ProxyList;
use crate::registry::SourceStack;
use crate::traits::net_adapter::{AdapterSource, DhcpWpadLookup, NoAdapters};
use crate::traits::{DnsResolver, SystemDnsResolver};
use crate::wpad;

/// Lifecycle state of one resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverState {
    /// Handle allocated, resolution not yet started
    Created,
    /// Resolution in flight on its worker task
    Running,
    /// Terminal: a proxy list was produced
    Completed,
    /// Terminal: resolution failed with an error
    Failed,
    /// Terminal: resolution was cancelled
    Cancelled,
}

impl ResolverState {
    /// Whether this state is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Shared collaborators for resolutions
///
/// Built once at composition time; any number of [`ProxyResolver`] handles
/// may run against one context concurrently.
pub struct ResolverContext {
    config: ResolverConfig,
    sources: Arc<SourceStack>,
    dns: Arc<dyn DnsResolver>,
    adapters: Arc<dyn AdapterSource>,
    dhcp: Arc<dyn DhcpWpadLookup>,
}

impl ResolverContext {
    /// Create a context with the system DNS resolver and no platform
    /// adapter integration
    pub fn new(config: ResolverConfig, sources: Arc<SourceStack>) -> Self {
        Self {
            config,
            sources,
            dns: Arc::new(SystemDnsResolver::new()),
            adapters: Arc::new(NoAdapters),
            dhcp: Arc::new(NoAdapters),
        }
    }

    /// Replace the DNS resolution collaborator
    pub fn with_dns(mut self, dns: Arc<dyn DnsResolver>) -> Self {
        self.dns = dns;
        self
    }

    /// Supply platform adapter enumeration for DHCP-based discovery
    pub fn with_adapters(mut self, adapters: Arc<dyn AdapterSource>) -> Self {
        self.adapters = adapters;
        self
    }

    /// Supply the DHCP option-252 lookup collaborator
    pub fn with_dhcp(mut self, dhcp: Arc<dyn DhcpWpadLookup>) -> Self {
        self.dhcp = dhcp;
        self
    }

    /// The configuration-source stack this context queries
    pub fn sources(&self) -> &SourceStack {
        &self.sources
    }
}

/// Handle for exactly one in-flight resolution
///
/// Dropping the handle cancels a still-running resolution and releases
/// everything it owns; dropping a terminal handle releases the stored
/// outcome exactly once (ownership makes a double release impossible).
pub struct ProxyResolver {
    context: Arc<ResolverContext>,
    cancel: CancelFlag,
    state_tx: Arc<watch::Sender<ResolverState>>,
    state_rx: watch::Receiver<ResolverState>,
    outcome: Arc<Mutex<Option<Result<ProxyList>>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ProxyResolver {
    /// Allocate a handle in the `Created` state
    pub fn new(context: Arc<ResolverContext>) -> Self {
        let (state_tx, state_rx) = watch::channel(ResolverState::Created);
        Self {
            context,
            cancel: CancelFlag::new(),
            state_tx: Arc::new(state_tx),
            state_rx,
            outcome: Arc::new(Mutex::new(None)),
            task: Mutex::new(None),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ResolverState {
        *self.state_rx.borrow()
    }

    /// Start resolving the proxy for `url`
    ///
    /// Transitions to `Running` and spawns the worker task. Starting a
    /// handle twice, or starting one that was cancelled before it ran, is
    /// a contract violation reported as a configuration error.
    pub fn start(&self, url: &str) -> Result<()> {
        if self.state() != ResolverState::Created {
            return Err(Error::config("resolution already started"));
        }
        self.state_tx.send_replace(ResolverState::Running);

        let context = Arc::clone(&self.context);
        let cancel = self.cancel.clone();
        let state_tx = Arc::clone(&self.state_tx);
        let outcome = Arc::clone(&self.outcome);
        let url = url.to_string();

        let handle = tokio::spawn(async move {
            let result = resolve_for_url(&context, &url, &cancel).await;

            let state = match &result {
                Ok(list) => {
                    info!("Resolved proxy for {}: {}", url, list);
                    ResolverState::Completed
                }
                Err(Error::Cancelled) => {
                    debug!("Resolution for {} cancelled", url);
                    ResolverState::Cancelled
                }
                Err(e) => {
                    warn!("Resolution for {} failed: {}", url, e);
                    ResolverState::Failed
                }
            };

            // Outcome is stored before the state flips so that a waiter
            // observing a terminal state always finds it.
            *outcome.lock().unwrap() = Some(result);
            state_tx.send_replace(state);
        });

        *self.task.lock().unwrap() = Some(handle);
        Ok(())
    }

    /// Block the caller until the handle leaves `Running` or the timeout
    /// elapses
    ///
    /// Returns `true` if the handle is terminal. A timed-out wait leaves
    /// the resolution running; the caller may then [`ProxyResolver::cancel`].
    pub async fn wait(&self, timeout: Duration) -> bool {
        let mut rx = self.state_rx.clone();
        if rx.borrow_and_update().is_terminal() {
            return true;
        }
        tokio::time::timeout(timeout, async {
            loop {
                if rx.changed().await.is_err() {
                    break;
                }
                if rx.borrow_and_update().is_terminal() {
                    break;
                }
            }
        })
        .await
        .is_ok()
            && self.state().is_terminal()
    }

    /// Request early termination
    ///
    /// A `Running` resolution transitions to `Cancelled` at its next
    /// checked cancellation point; a terminal handle is unaffected. A
    /// `Created` handle becomes terminally `Cancelled` immediately.
    pub fn cancel(&self) {
        match self.state() {
            ResolverState::Created => {
                self.cancel.cancel();
                *self.outcome.lock().unwrap() = Some(Err(Error::Cancelled));
                self.state_tx.send_replace(ResolverState::Cancelled);
            }
            ResolverState::Running => {
                self.cancel.cancel();
            }
            _ => {}
        }
    }

    /// The produced proxy list; `None` until `Completed`
    pub fn get_list(&self) -> Option<ProxyList> {
        match &*self.outcome.lock().unwrap() {
            Some(Ok(list)) => Some(list.clone()),
            _ => None,
        }
    }

    /// The terminal error; `None` unless `Failed` or `Cancelled`
    pub fn get_error(&self) -> Option<Error> {
        match &*self.outcome.lock().unwrap() {
            Some(Err(e)) => Some(e.clone()),
            _ => None,
        }
    }
}

impl Drop for ProxyResolver {
    fn drop(&mut self) {
        // Cooperative: the worker observes the flag at its next
        // checkpoint and exits on its own.
        self.cancel();
    }
}

/// One end-to-end resolution
async fn resolve_for_url(
    context: &ResolverContext,
    url: &str,
    cancel: &CancelFlag,
) -> Result<ProxyList> {
    cancel.check()?;

    let parsed = Url::parse(url).ok();
    let protocol = parsed
        .as_ref()
        .map(|u| u.scheme().to_string())
        .unwrap_or_else(|| "http".to_string());
    let host = parsed.as_ref().and_then(|u| u.host_str().map(str::to_string));

    if let (Some(host), Some(bypass)) = (host.as_deref(), context.sources.bypass_list()) {
        if bypass_matches(&bypass, host) {
            debug!("Host {} matches bypass list, going direct", host);
            return Ok(ProxyList::direct());
        }
    }

    if let Some(proxy) = context.sources.proxy_for_protocol(&protocol) {
        debug!("Static {} proxy configured: {}", protocol, proxy);
        return Ok(ProxyList::from(proxy));
    }

    let script = if let Some(pac_url) = context.sources.auto_config_url() {
        debug!("Fetching configured PAC url: {}", pac_url);
        cancel.check()?;
        let body = fetch_pac(&pac_url, cancel).await?;
        Some(body)
    } else if context.sources.auto_discover() {
        cancel.check()?;
        wpad::discover(
            &context.config.discovery,
            context.adapters.as_ref(),
            context.dhcp.as_ref(),
            context.dns.as_ref(),
            cancel,
        )
        .await
    } else {
        None
    };

    cancel.check()?;

    match script {
        Some(script) => execute_pac(context, script, url).await,
        // Absence of configuration is not an error.
        None => Ok(ProxyList::direct()),
    }
}

async fn fetch_pac(pac_url: &str, cancel: &CancelFlag) -> Result<String> {
    let body = crate::fetch::fetch(pac_url, cancel).await?;
    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// Run the PAC script on a blocking worker
///
/// Script evaluation is CPU-bound and not a cancellation point; a runaway
/// script is bounded only by the caller's `wait` timeout.
async fn execute_pac(context: &ResolverContext, script: String, url: &str) -> Result<ProxyList> {
    let dns = Arc::clone(&context.dns);
    let url = url.to_string();

    tokio::task::spawn_blocking(move || {
        let mut exec = PacExecutor::create(dns)?;
        if exec.get_proxies_for_url(&script, &url) {
            Ok(exec
                .into_list()
                .unwrap_or_else(ProxyList::direct))
        } else {
            Err(exec
                .error()
                .cloned()
                .unwrap_or_else(|| Error::invalid_result("execution produced no result")))
        }
    })
    .await
    .map_err(|e| Error::Other(format!("execution worker failed: {e}")))?
}

/// Whether `host` matches the bypass list
///
/// Entries are comma- or semicolon-separated. `<local>` matches dot-less
/// hosts; `.domain` and `*.domain` entries match the domain and its
/// subdomains; anything else must match the whole host. Matching is
/// case-insensitive.
fn bypass_matches(bypass: &str, host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    bypass
        .split([',', ';'])
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .any(|entry| {
            let entry = entry.to_ascii_lowercase();
            if entry == "<local>" {
                return !host.contains('.');
            }
            let suffix = entry
                .strip_prefix("*.")
                .or_else(|| entry.strip_prefix('.'));
            match suffix {
                Some(domain) => {
                    host == domain || host.ends_with(&format!(".{domain}"))
                }
                None => host == entry,
            }
        })
}

//! PAC script execution engine
//!
//! The engine half that lives in the core: the backend capability traits,
//! the process-wide backend binding, and the per-resolution execution
//! handle. Actual script evaluation belongs to a backend crate (one
//! backend is bound per process; running several simultaneously is
//! unsupported).
//!
//! ## Backend binding
//!
//! [`global_init`] probes an ordered list of candidate factories and binds
//! the first one that fully succeeds. The binding is process-wide and
//! read-only once made, so concurrent resolutions can execute scripts
//! without additional locking. [`global_cleanup`] clears the binding to a
//! well-defined empty state; execution attempted outside the
//! init/cleanup bracket fails with [`Error::EngineUnavailable`] rather
//! than behaving undefined. Both calls are idempotent.

use std::sync::{Arc, RwLock};

use tracing::{info, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::proxy::ProxyList;
use crate::traits::DnsResolver;

/// The Mozilla PAC helper library evaluated before every user script
///
/// Backends must evaluate this into the fresh context first; a failure
/// here is an engine defect, not a user-script error.
pub const PAC_UTILS_JS: &str = include_str!("pac_utils.js");

/// Trait for a bound, ready-to-evaluate script-engine backend
///
/// One call = one fully isolated evaluation: fresh global scope, host
/// callbacks bound, helper library plus user script evaluated,
/// `FindProxyForURL(url, host)` invoked, context torn down unconditionally.
/// No state survives across calls.
pub trait PacEngine: Send + Sync {
    /// Backend name, used in logs
    fn name(&self) -> &'static str;

    /// Evaluate `script` and return `FindProxyForURL(url, host)`'s string
    ///
    /// `dns` backs the `dnsResolve` and `myIpAddress` host callbacks for
    /// the duration of this one call. Evaluation is CPU-bound; callers on
    /// an async runtime must dispatch to a blocking worker.
    fn find_proxy_for_url(
        &self,
        script: &str,
        url: &str,
        dns: &Arc<dyn DnsResolver>,
    ) -> Result<String>;
}

/// Trait for candidate backend descriptors probed at global init
pub trait PacEngineFactory: Send + Sync {
    /// Candidate name, used in logs and for [`crate::config::ExecConfig`]
    /// backend selection
    fn name(&self) -> &'static str;

    /// Try to bring the backend up completely
    ///
    /// Partial capability is refused: either every piece of the backend
    /// resolves and a working engine is returned, or this fails and the
    /// next candidate is tried.
    fn probe(&self) -> Result<Box<dyn PacEngine>>;
}

static BINDING: RwLock<Option<Arc<dyn PacEngine>>> = RwLock::new(None);

/// Bind the first candidate backend that probes successfully
///
/// Idempotent: a second call while bound is a no-op reporting success.
/// Exhausting every candidate fails with [`Error::EngineUnavailable`] and
/// leaves the binding empty.
pub fn global_init(candidates: Vec<Box<dyn PacEngineFactory>>) -> Result<()> {
    let mut binding = BINDING.write().unwrap();
    if binding.is_some() {
        return Ok(());
    }

    for candidate in candidates {
        match candidate.probe() {
            Ok(engine) => {
                info!("Bound script-engine backend: {}", engine.name());
                *binding = Some(Arc::from(engine));
                return Ok(());
            }
            Err(e) => {
                warn!("Script-engine candidate {} unusable: {}", candidate.name(), e);
            }
        }
    }

    Err(Error::engine_unavailable(
        "no script-engine backend could be bound",
    ))
}

/// Clear the process-wide backend binding
///
/// Idempotent; executions created before cleanup keep their engine alive
/// until they are dropped, new executions fail deterministically.
pub fn global_cleanup() {
    BINDING.write().unwrap().take();
}

/// Whether a backend is currently bound
pub fn is_initialized() -> bool {
    BINDING.read().unwrap().is_some()
}

fn bound_engine() -> Result<Arc<dyn PacEngine>> {
    BINDING
        .read()
        .unwrap()
        .clone()
        .ok_or_else(|| Error::engine_unavailable("global_init has not bound a backend"))
}

/// Per-resolution execution handle
///
/// Owns the engine reference, the DNS collaborator for the host callbacks,
/// and the outcome of the last evaluation. After a call to
/// [`PacExecutor::get_proxies_for_url`] exactly one of list or error is
/// set, never both, never neither.
pub struct PacExecutor {
    engine: Arc<dyn PacEngine>,
    dns: Arc<dyn DnsResolver>,
    list: Option<ProxyList>,
    error: Option<Error>,
}

impl PacExecutor {
    /// Create an execution handle against the bound backend
    pub fn create(dns: Arc<dyn DnsResolver>) -> Result<Self> {
        Ok(Self {
            engine: bound_engine()?,
            dns,
            list: None,
            error: None,
        })
    }

    /// Evaluate a PAC script against a target URL
    ///
    /// Returns `true` on success with the proxy list stored, `false` with
    /// the error stored otherwise.
    pub fn get_proxies_for_url(&mut self, script: &str, url: &str) -> bool {
        self.list = None;
        self.error = None;

        match self.engine.find_proxy_for_url(script, url, &self.dns) {
            Ok(list) => {
                self.list = Some(ProxyList::from(list));
                true
            }
            Err(e) => {
                self.error = Some(e);
                false
            }
        }
    }

    /// The proxy list produced by the last successful evaluation
    pub fn list(&self) -> Option<&ProxyList> {
        self.list.as_ref()
    }

    /// The error produced by the last failed evaluation
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Name of the backend this handle executes on
    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    /// Take the proxy list out of the handle
    pub fn into_list(self) -> Option<ProxyList> {
        self.list
    }
}

/// The host component of a URL, for `FindProxyForURL`'s second argument
///
/// Falls back to the whole URL string when host parsing fails, mirroring
/// the standard PAC entry point contract.
pub fn url_host(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

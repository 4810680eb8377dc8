// # Boa PAC Engine Backend
//
// This crate provides a PAC script execution backend built on the Boa
// ECMAScript interpreter.
//
// ## Sandbox model
//
// Each evaluation creates a fresh `Context`: no module loader, no host
// objects beyond the two PAC host callbacks (`dnsResolve`, `myIpAddress`)
// and the pure-JavaScript PAC helper library. Scripts therefore have no
// access to the filesystem, network, or process state, and nothing
// survives from one evaluation to the next.
//
// ## DNS bridge
//
// Boa native functions are plain function pointers and cannot capture the
// per-call DNS resolver, so the resolver is parked in a thread-local slot
// for the duration of one evaluation. Evaluations run synchronously on
// the calling thread, which makes the slot race-free; an RAII guard
// clears it even when evaluation fails.

use std::cell::RefCell;
use std::sync::Arc;

use boa_engine::{js_string, Context, JsResult, JsString, JsValue, NativeFunction, Source};
use pacres_core::error::{Error, Result};
use pacres_core::exec::{url_host, PacEngine, PacEngineFactory, PAC_UTILS_JS};
use pacres_core::traits::DnsResolver;
use tracing::debug;

thread_local! {
    static ACTIVE_DNS: RefCell<Option<Arc<dyn DnsResolver>>> = const { RefCell::new(None) };
}

/// Clears the thread-local resolver slot on drop
struct DnsGuard;

impl DnsGuard {
    fn install(dns: Arc<dyn DnsResolver>) -> Self {
        ACTIVE_DNS.with(|slot| *slot.borrow_mut() = Some(dns));
        Self
    }
}

impl Drop for DnsGuard {
    fn drop(&mut self) {
        ACTIVE_DNS.with(|slot| slot.borrow_mut().take());
    }
}

fn with_dns<R>(f: impl FnOnce(&Arc<dyn DnsResolver>) -> R) -> Option<R> {
    ACTIVE_DNS.with(|slot| slot.borrow().as_ref().map(f))
}

/// `dnsResolve(host)` host callback
///
/// Strict arity and type: exactly one string argument, anything else
/// resolves to `null` rather than aborting the script.
fn dns_resolve(_this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    if args.len() != 1 {
        return Ok(JsValue::null());
    }
    let host = match args[0].as_string() {
        Some(s) => s.to_std_string_escaped(),
        None => return Ok(JsValue::null()),
    };
    let resolved = with_dns(|dns| dns.resolve(Some(&host))).flatten();
    Ok(match resolved {
        Some(addr) => JsValue::from(JsString::from(addr.as_str())),
        None => JsValue::null(),
    })
}

/// `myIpAddress()` host callback
///
/// Answers `null` when the local address cannot be determined, formatted
/// identically to `dnsResolve`'s result otherwise.
fn my_ip_address(_this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let addr = with_dns(|dns| dns.resolve(None)).flatten();
    Ok(match addr {
        Some(addr) => JsValue::from(JsString::from(addr.as_str())),
        None => JsValue::null(),
    })
}

/// PAC engine backed by the Boa interpreter
pub struct BoaEngine;

impl BoaEngine {
    fn fresh_context(&self) -> Result<Context> {
        let mut context = Context::default();
        context
            .register_global_callable(
                js_string!("dnsResolve"),
                1,
                NativeFunction::from_fn_ptr(dns_resolve),
            )
            .map_err(|e| Error::engine_unavailable(format!("installing dnsResolve: {e}")))?;
        context
            .register_global_callable(
                js_string!("myIpAddress"),
                0,
                NativeFunction::from_fn_ptr(my_ip_address),
            )
            .map_err(|e| Error::engine_unavailable(format!("installing myIpAddress: {e}")))?;
        context
            .eval(Source::from_bytes(PAC_UTILS_JS))
            .map_err(|e| Error::engine_unavailable(format!("helper library rejected: {e}")))?;
        Ok(context)
    }
}

impl PacEngine for BoaEngine {
    fn name(&self) -> &'static str {
        "boa"
    }

    fn find_proxy_for_url(
        &self,
        script: &str,
        url: &str,
        dns: &Arc<dyn DnsResolver>,
    ) -> Result<String> {
        let _guard = DnsGuard::install(Arc::clone(dns));
        let mut context = self.fresh_context()?;

        context
            .eval(Source::from_bytes(script))
            .map_err(|e| Error::script_exception(e.to_string()))?;

        let find = context
            .global_object()
            .get(js_string!("FindProxyForURL"), &mut context)
            .map_err(|e| Error::script_exception(e.to_string()))?;
        let find = find.as_callable().ok_or_else(|| {
            Error::invalid_result("script does not define a FindProxyForURL function")
        })?;

        let host = url_host(url);
        debug!("Evaluating FindProxyForURL({}, {})", url, host);
        let result = find
            .call(
                &JsValue::undefined(),
                &[
                    JsValue::from(JsString::from(url)),
                    JsValue::from(JsString::from(host.as_str())),
                ],
                &mut context,
            )
            .map_err(|e| Error::script_exception(e.to_string()))?;

        match result.as_string() {
            Some(s) => Ok(s.to_std_string_escaped()),
            None => Err(Error::invalid_result(
                "FindProxyForURL returned a non-string value",
            )),
        }
    }
}

/// Factory probed at engine initialization
pub struct BoaEngineFactory;

impl PacEngineFactory for BoaEngineFactory {
    fn name(&self) -> &'static str {
        "boa"
    }

    fn probe(&self) -> Result<Box<dyn PacEngine>> {
        // Evaluate a trivial expression so a broken interpreter is
        // refused at init rather than at first resolution.
        let mut context = Context::default();
        context
            .eval(Source::from_bytes("1 + 1"))
            .map_err(|e| Error::engine_unavailable(format!("boa self-test failed: {e}")))?;
        Ok(Box::new(BoaEngine))
    }
}

/// Backend candidates this crate contributes, in probe order
pub fn candidates() -> Vec<Box<dyn PacEngineFactory>> {
    vec![Box::new(BoaEngineFactory)]
}

//! WPAD discovery cascade
//!
//! Two independent strategies for locating a PAC script:
//!
//! - **DHCP**: ask each DHCP-configured, connected adapter's server for an
//!   option-252 WPAD URL (wire decoding belongs to the [`DhcpWpadLookup`]
//!   collaborator, not to this module).
//! - **DNS**: walk the local FQDN's domain suffixes, fetching
//!   `http://wpad.<suffix>/wpad.dat` at each step.
//!
//! Failures at one step (one adapter, one suffix) are absorbed and the
//! cascade advances; exhausting every step yields `None`, which is a
//! normal outcome — most networks simply have no WPAD — and never an error.
//! Conventional WPAD precedence is DHCP first, then DNS, which is what
//! [`discover`] applies.

use std::time::Duration;

use tracing::debug;

use crate::cancel::CancelFlag;
use crate::config::DiscoveryConfig;
use crate::fetch::fetch;
use crate::traits::dns::DnsResolver;
use crate::traits::net_adapter::{Adapter, AdapterSource, DhcpWpadLookup};

/// Discover a PAC script, DHCP strategy first, then DNS
///
/// Returns the PAC script text, or `None` when no strategy located one.
pub async fn discover(
    config: &DiscoveryConfig,
    adapters: &dyn AdapterSource,
    dhcp: &dyn DhcpWpadLookup,
    dns: &dyn DnsResolver,
    cancel: &CancelFlag,
) -> Option<String> {
    if config.dhcp {
        let adapter_list = adapters.list();
        if let Some(url) =
            discover_via_dhcp(&adapter_list, dhcp, config.dhcp_timeout(), cancel).await
        {
            debug!("DHCP-advertised WPAD url: {}", url);
            match fetch(&url, cancel).await {
                Ok(body) if !body.is_empty() => {
                    return Some(String::from_utf8_lossy(&body).into_owned());
                }
                Ok(_) => debug!("Empty wpad.dat at DHCP-advertised {}", url),
                Err(e) => debug!("Unable to fetch DHCP-advertised {}: {}", url, e),
            }
        }
    }

    if cancel.is_cancelled() {
        return None;
    }

    if config.dns {
        if let Some(script) = discover_via_dns(config.fqdn.as_deref(), dns, cancel).await {
            return Some(script);
        }
    }

    None
}

/// DNS half of the cascade: walk domain suffixes looking for wpad.dat
///
/// When no FQDN is supplied, one is derived from the local host name,
/// qualified through the resolver's canonical-name lookup when the name
/// carries no domain of its own. Candidates that are empty, `localhost`,
/// or numeric (look like an address) yield no discovery rather than an
/// error. Each iteration drops the leftmost label, constructs
/// `http://wpad.<suffix>/wpad.dat`, and attempts a fetch; the first
/// non-empty body wins. DNS and fetch failures at one suffix are non-fatal.
pub async fn discover_via_dns(
    fqdn: Option<&str>,
    dns: &dyn DnsResolver,
    cancel: &CancelFlag,
) -> Option<String> {
    let derived;
    let fqdn = match fqdn {
        Some(name) => name,
        None => {
            derived = qualify_host_name(local_host_name()?, dns);
            derived.as_str()
        }
    };

    if !candidate_fqdn_is_usable(fqdn) {
        debug!("No usable FQDN for WPAD DNS discovery: {:?}", fqdn);
        return None;
    }

    for suffix in wpad_suffixes(fqdn) {
        if cancel.is_cancelled() {
            return None;
        }

        let wpad_url = format!("http://wpad.{suffix}/wpad.dat");
        debug!("Checking next WPAD DNS url: {}", wpad_url);

        match fetch(&wpad_url, cancel).await {
            Ok(body) if !body.is_empty() => {
                return Some(String::from_utf8_lossy(&body).into_owned());
            }
            Ok(_) => debug!("Empty wpad.dat at {}", wpad_url),
            Err(e) => debug!("No wpad.dat at {} ({})", wpad_url, e),
        }
    }

    None
}

/// DHCP half of the cascade: first advertised URL from an eligible adapter
///
/// Connected, DHCP-configured adapters are queried in enumeration order,
/// non-loopback adapters first; the first non-empty answer wins.
pub async fn discover_via_dhcp(
    adapters: &[Adapter],
    lookup: &dyn DhcpWpadLookup,
    timeout: Duration,
    cancel: &CancelFlag,
) -> Option<String> {
    let mut eligible: Vec<&Adapter> = adapters
        .iter()
        .filter(|a| a.is_connected && a.is_dhcp)
        .collect();
    // Fully eligible adapters lead; connected loopbacks trail as a last resort.
    eligible.sort_by_key(|a| !a.eligible_for_dhcp_wpad());

    for adapter in eligible {
        if cancel.is_cancelled() {
            return None;
        }

        debug!("Querying adapter {} for WPAD url", adapter.name);
        match lookup.lookup(adapter, timeout).await {
            Some(url) if !url.is_empty() => return Some(url),
            Some(_) | None => {
                debug!("No WPAD url from adapter {}", adapter.name);
            }
        }
    }

    None
}

/// The ordered wpad suffixes for an FQDN
///
/// Drops the leftmost label each step; the remainder itself is the suffix
/// to probe. The walk stops after the first remainder with no dot left.
fn wpad_suffixes(fqdn: &str) -> Vec<String> {
    let mut suffixes = Vec::new();
    let mut rest = fqdn;
    while let Some(dot) = rest.find('.') {
        rest = &rest[dot + 1..];
        if rest.is_empty() {
            break;
        }
        suffixes.push(rest.to_string());
        if !rest.contains('.') {
            break;
        }
    }
    suffixes
}

fn candidate_fqdn_is_usable(fqdn: &str) -> bool {
    !fqdn.is_empty()
        && fqdn != "localhost"
        && !fqdn.starts_with(|c: char| c.is_ascii_digit())
}

fn local_host_name() -> Option<String> {
    match hostname::get() {
        Ok(name) => Some(name.to_string_lossy().into_owned()),
        Err(e) => {
            debug!("Unable to get local host name: {}", e);
            None
        }
    }
}

/// Expand a bare machine name to its canonical, fully qualified DNS name
///
/// `gethostname` commonly answers a dot-less machine name; without a
/// domain part the suffix walk has nothing to strip. A name that already
/// contains a dot is taken as qualified; otherwise the resolver's
/// canonical-name lookup supplies the domain, falling back to the bare
/// name when it knows none.
fn qualify_host_name(name: String, dns: &dyn DnsResolver) -> String {
    if name.contains('.') {
        return name;
    }
    match dns.canonical_name(&name) {
        Some(canonical) => {
            debug!("Canonicalized local host name {} to {}", name, canonical);
            canonical
        }
        None => name,
    }
}

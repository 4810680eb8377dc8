// # DNS Resolution Trait
//
// Defines the collaborator used by the PAC host callbacks (`dnsResolve`,
// `myIpAddress`) and by anything else that needs a plain "name to address
// string" lookup.
//
// The trait is synchronous on purpose: its primary call sites are host
// callbacks invoked from inside script evaluation, which is CPU-bound and
// runs on a blocking worker. An async resolver would have nowhere to await.

use std::net::{IpAddr, ToSocketAddrs, UdpSocket};

use tracing::debug;

/// Trait for DNS resolution collaborators
///
/// `resolve(Some(host))` answers with the first address the system resolver
/// returns for `host`, formatted as a plain address string.
///
/// `resolve(None)` means "resolve my own address" and answers with the local
/// host's outward-facing address.
///
/// Failures are answered with `None`; resolution is best-effort and callers
/// treat absence as "not resolvable", never as a hard error.
pub trait DnsResolver: Send + Sync {
    /// Resolve a host name, or the local host when `host` is `None`
    fn resolve(&self, host: Option<&str>) -> Option<String>;

    /// Canonical DNS name for a host, when the resolver knows one
    ///
    /// Used to expand a bare machine name into its fully qualified form.
    fn canonical_name(&self, _host: &str) -> Option<String> {
        None
    }
}

/// System resolver backed by the platform's name service
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemDnsResolver;

impl SystemDnsResolver {
    /// Create a new system resolver
    pub fn new() -> Self {
        Self
    }

    fn lookup(host: &str) -> Option<IpAddr> {
        // Port 0 satisfies ToSocketAddrs; only the address part is used.
        match (host, 0u16).to_socket_addrs() {
            Ok(mut addrs) => addrs.next().map(|a| a.ip()),
            Err(e) => {
                debug!("Unable to resolve {}: {}", host, e);
                None
            }
        }
    }

    fn local_address() -> Option<IpAddr> {
        // Connecting a UDP socket performs no I/O but selects the outward
        // route, so local_addr reports the address peers would see.
        let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
        socket.connect("8.8.8.8:80").ok()?;
        socket.local_addr().ok().map(|a| a.ip())
    }
}

impl DnsResolver for SystemDnsResolver {
    fn resolve(&self, host: Option<&str>) -> Option<String> {
        let addr = match host {
            Some(host) if !host.is_empty() => Self::lookup(host)?,
            Some(_) => return None,
            None => Self::local_address()?,
        };
        Some(addr.to_string())
    }

    fn canonical_name(&self, host: &str) -> Option<String> {
        // AI_CANONNAME asks getaddrinfo for the canonical node name.
        const AI_CANONNAME: i32 = 0x0002;
        let hints = dns_lookup::AddrInfoHints {
            flags: AI_CANONNAME,
            ..Default::default()
        };
        match dns_lookup::getaddrinfo(Some(host), None, Some(hints)) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok())
                .find_map(|info| info.canonname),
            Err(e) => {
                debug!("Unable to canonicalize {}: {:?}", host, e);
                None
            }
        }
    }
}

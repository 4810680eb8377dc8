// # Network Adapter Collaborators
//
// The resolver never enumerates network interfaces itself; platform code
// supplies an [`AdapterSource`] that yields already-decoded [`Adapter`]
// snapshots, and a [`DhcpWpadLookup`] that speaks DHCP option 252 for a
// particular adapter. Both are consumed, never implemented, by this crate
// (aside from the [`NoAdapters`] null object used when no platform
// integration is wired in).

use std::net::Ipv4Addr;
use std::time::Duration;

use async_trait::async_trait;

/// Immutable snapshot of one network adapter
///
/// Produced per enumeration call by platform code; the core never mutates
/// or retains adapters beyond a single discovery pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adapter {
    /// Interface name (e.g. "eth0")
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Hardware address
    pub mac: [u8; 6],
    /// Whether the interface is up
    pub is_connected: bool,
    /// Whether the interface is ethernet or wireless
    pub is_ethernet: bool,
    /// Whether IPv4 configuration came from DHCP
    pub is_dhcp: bool,
    /// Whether this is a loopback interface
    pub is_loopback: bool,
    /// IPv4 address
    pub ip: Option<Ipv4Addr>,
    /// IPv4 netmask
    pub netmask: Option<Ipv4Addr>,
    /// Default gateway
    pub gateway: Option<Ipv4Addr>,
    /// DNS servers, primary first
    pub dns_servers: Vec<Ipv4Addr>,
    /// DHCP server that configured the interface
    pub dhcp_server: Option<Ipv4Addr>,
}

impl Adapter {
    /// Whether this adapter is worth asking for a DHCP-advertised WPAD URL
    pub fn eligible_for_dhcp_wpad(&self) -> bool {
        self.is_connected && self.is_dhcp && !self.is_loopback
    }
}

/// Trait for platform adapter enumeration
///
/// `enumerate` invokes the callback once per adapter until the callback
/// returns `true` (stop early) or the adapter list is exhausted. Returns
/// `false` if the platform query itself failed.
pub trait AdapterSource: Send + Sync {
    /// Enumerate adapters, invoking `callback` for each
    fn enumerate(&self, callback: &mut dyn FnMut(&Adapter) -> bool) -> bool;

    /// Collect all adapters into a vector
    fn list(&self) -> Vec<Adapter> {
        let mut adapters = Vec::new();
        self.enumerate(&mut |adapter| {
            adapters.push(adapter.clone());
            false
        });
        adapters
    }
}

/// Trait for DHCP-based WPAD URL lookup (option 252)
///
/// Implementations send an INFORM-style query on the given adapter and
/// answer with the advertised URL, or `None` when the DHCP server does not
/// advertise one or does not answer within `timeout`.
#[async_trait]
pub trait DhcpWpadLookup: Send + Sync {
    /// Query one adapter for a WPAD URL
    async fn lookup(&self, adapter: &Adapter, timeout: Duration) -> Option<String>;
}

/// Null adapter source for deployments without platform integration
///
/// Reports an empty adapter list, which disables the DHCP half of WPAD
/// discovery while leaving the DNS half intact.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAdapters;

impl AdapterSource for NoAdapters {
    fn enumerate(&self, _callback: &mut dyn FnMut(&Adapter) -> bool) -> bool {
        true
    }
}

#[async_trait]
impl DhcpWpadLookup for NoAdapters {
    async fn lookup(&self, _adapter: &Adapter, _timeout: Duration) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter(connected: bool, dhcp: bool, loopback: bool) -> Adapter {
        Adapter {
            name: "test0".to_string(),
            description: String::new(),
            mac: [0; 6],
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

    #[test]
    fn dhcp_eligibility_requires_connected_dhcp_non_loopback() {
        assert!(adapter(true, true, false).eligible_for_dhcp_wpad());
        assert!(!adapter(false, true, false).eligible_for_dhcp_wpad());
        assert!(!adapter(true, false, false).eligible_for_dhcp_wpad());
        assert!(!adapter(true, true, true).eligible_for_dhcp_wpad());
    }

    #[test]
    fn no_adapters_lists_nothing() {
        assert!(NoAdapters.list().is_empty());
    }
}

//! Capability traits for the proxy resolution system
//!
//! Each trait gets its own module for clarity.

pub mod config_source;
pub mod dns;
pub mod net_adapter;

pub use config_source::ConfigSource;
pub use dns::{DnsResolver, SystemDnsResolver};
pub use net_adapter::{Adapter, AdapterSource, DhcpWpadLookup, NoAdapters};

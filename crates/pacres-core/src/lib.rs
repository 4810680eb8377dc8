// # pacres-core
//
// Core library for proxy auto-configuration resolution.
//
// ## Architecture Overview
//
// This library provides the core functionality for resolving the proxy to
// use for a target URL:
// - **ConfigSource**: Trait for pluggable proxy configuration sources
// - **SourceStack**: Priority-ordered registry of configuration sources
// - **wpad**: WPAD discovery cascade (DHCP option 252, then DNS suffix walk)
// - **fetch**: Minimal HTTP/1.0 client for retrieving PAC scripts
// - **PacEngine / PacExecutor**: Sandboxed PAC script execution with
//   pluggable engine backends
// - **ProxyResolver**: Orchestrator tying the pieces into one
//   create → start → wait → result lifecycle
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Discovery, fetching, and execution are
//    independent modules usable on their own
// 2. **Plugin-Based**: Configuration sources and script engines register
//    dynamically, no hard-coded if-else
// 3. **Library-First**: All core functionality can be used as a library
// 4. **Cooperative Cancellation**: Long-running resolutions observe a
//    shared flag before every suspension point

pub mod cancel;
pub mod config;
pub mod error;
pub mod exec;
pub mod fetch;
pub mod proxy;
pub mod registry;
pub mod resolver;
pub mod sources;
pub mod traits;
pub mod wpad;

// Re-export core types for convenience
pub use cancel::CancelFlag;
pub use config::{DiscoveryConfig, ExecConfig, ResolverConfig};
pub use error::{Error, Result};
pub use exec::{PacEngine, PacEngineFactory, PacExecutor};
pub use proxy::{ProxyDirective, ProxyList};
pub use registry::SourceStack;
pub use resolver::{ProxyResolver, ResolverContext, ResolverState};
pub use sources::OverrideConfigSource;
pub use traits::{Adapter, AdapterSource, ConfigSource, DhcpWpadLookup, DnsResolver, SystemDnsResolver};

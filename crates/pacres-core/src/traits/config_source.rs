// # Configuration Source Trait
//
// Defines the interface for proxy configuration providers.
//
// ## Implementations
//
// - Manual override: `pacres_core::sources::OverrideConfigSource`
// - Environment variables: `pacres-config-env` crate
// - Future: platform settings (system proxy configuration APIs)
//
// ## Usage
//
// ```rust,ignore
// use pacres_core::ConfigSource;
//
// let source = /* ConfigSource implementation */;
// if let Some(proxy) = source.proxy_for_protocol("https") {
//     println!("static proxy: {proxy}");
// }
// ```

/// Trait for proxy configuration providers
///
/// A provider answers four independent questions:
/// 1. **auto_discover()**: should WPAD discovery run?
/// 2. **auto_config_url()**: is a PAC URL configured explicitly?
/// 3. **proxy_for_protocol()**: is a static proxy configured for a protocol?
/// 4. **bypass_list()**: which hosts skip the proxy entirely?
///
/// Every string-valued answer distinguishes "unset" (`None`) from "set to
/// empty" (`Some("")`); callers must never conflate the two. Returned values
/// are owned and fresh on each query.
///
/// Providers are queried synchronously and must be side-effect-free and safe
/// for concurrent reads. They must not perform network I/O; discovery and
/// retrieval belong to the resolver, not to configuration.
///
/// `proxy_for_protocol` answers in PAC directive grammar (`PROXY host:port`),
/// so a provider's output can be consumed wherever a PAC script result can.
pub trait ConfigSource: Send + Sync {
    /// Short name of this provider, used in logs
    fn name(&self) -> &'static str;

    /// Whether this provider requests WPAD auto-discovery
    fn auto_discover(&self) -> bool;

    /// Explicitly configured PAC URL, if any
    fn auto_config_url(&self) -> Option<String>;

    /// Static proxy for the given protocol (e.g. "http", "https"),
    /// in PAC directive grammar
    fn proxy_for_protocol(&self, protocol: &str) -> Option<String>;

    /// Bypass list, verbatim in the provider's native grammar
    fn bypass_list(&self) -> Option<String>;

    /// Prepare the provider for queries
    ///
    /// Returns `false` if the provider cannot operate in this process
    /// (the stack skips it rather than failing).
    fn init(&self) -> bool {
        true
    }

    /// Release anything acquired by [`ConfigSource::init`]
    fn uninit(&self) -> bool {
        true
    }
}

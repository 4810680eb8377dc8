//! Ordered configuration-source stack
//!
//! Providers are registered in precedence order (manual override first,
//! then platform/environment providers, then auto-discovery policy) and
//! each configuration field is resolved independently: the first provider
//! with a present value for that field wins. Fields are deliberately not
//! bound to a single winning provider as a whole — a deployment may take
//! its PAC URL from an override and its bypass list from the environment.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pacres_core::SourceStack;
//! use pacres_core::sources::OverrideConfigSource;
//!
//! let stack = SourceStack::new();
//! stack.register(Box::new(OverrideConfigSource::new()));
//! pacres_config_env::register(&stack);
//!
//! let proxy = stack.proxy_for_protocol("https");
//! ```

use std::sync::Arc;
use std::sync::RwLock;

use tracing::debug;

use crate::traits::ConfigSource;

/// Precedence-ordered stack of configuration sources
///
/// ## Thread Safety
///
/// The stack uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive registration.
#[derive(Default)]
pub struct SourceStack {
    sources: RwLock<Vec<Arc<dyn ConfigSource>>>,
}

impl SourceStack {
    /// Create a new empty stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider at the lowest precedence position
    pub fn register(&self, source: Box<dyn ConfigSource>) {
        let mut sources = self.sources.write().unwrap();
        debug!("Registering config source: {}", source.name());
        sources.push(Arc::from(source));
    }

    /// Names of the registered providers, highest precedence first
    pub fn source_names(&self) -> Vec<&'static str> {
        let sources = self.sources.read().unwrap();
        sources.iter().map(|s| s.name()).collect()
    }

    /// Number of registered providers
    pub fn len(&self) -> usize {
        self.sources.read().unwrap().len()
    }

    /// Whether no providers are registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Initialize every provider, dropping those that report failure
    ///
    /// A provider that cannot operate in this process is removed from the
    /// stack rather than failing composition.
    pub fn init_all(&self) {
        let mut sources = self.sources.write().unwrap();
        sources.retain(|source| {
            let ok = source.init();
            if !ok {
                debug!("Config source {} failed init, dropping", source.name());
            }
            ok
        });
    }

    /// Uninitialize every provider
    pub fn uninit_all(&self) {
        let sources = self.sources.read().unwrap();
        for source in sources.iter() {
            source.uninit();
        }
    }

    /// Whether any provider requests WPAD auto-discovery
    ///
    /// `false` is the absent value for this field, so the first provider
    /// answering `true` decides.
    pub fn auto_discover(&self) -> bool {
        let sources = self.sources.read().unwrap();
        sources.iter().any(|source| source.auto_discover())
    }

    /// PAC URL from the highest-precedence provider that sets one
    pub fn auto_config_url(&self) -> Option<String> {
        self.first_present(|source| source.auto_config_url())
    }

    /// Static proxy for a protocol from the highest-precedence provider
    /// that sets one
    pub fn proxy_for_protocol(&self, protocol: &str) -> Option<String> {
        self.first_present(|source| source.proxy_for_protocol(protocol))
    }

    /// Bypass list from the highest-precedence provider that sets one
    pub fn bypass_list(&self) -> Option<String> {
        self.first_present(|source| source.bypass_list())
    }

    fn first_present<F>(&self, query: F) -> Option<String>
    where
        F: Fn(&dyn ConfigSource) -> Option<String>,
    {
        let sources = self.sources.read().unwrap();
        for source in sources.iter() {
            if let Some(value) = query(source.as_ref()) {
                debug!("Config field answered by source: {}", source.name());
                return Some(value);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSource {
        name: &'static str,
        url: Option<String>,
        bypass: Option<String>,
    }

    impl ConfigSource for FixedSource {
        fn name(&self) -> &'static str {
            self.name
        }
        fn auto_discover(&self) -> bool {
            false
        }
        fn auto_config_url(&self) -> Option<String> {
            self.url.clone()
        }
        fn proxy_for_protocol(&self, _protocol: &str) -> Option<String> {
            None
        }
        fn bypass_list(&self) -> Option<String> {
            self.bypass.clone()
        }
    }

    #[test]
    fn fields_resolve_independently() {
        let stack = SourceStack::new();
        stack.register(Box::new(FixedSource {
            name: "first",
            url: None,
            bypass: Some("<local>".to_string()),
        }));
        stack.register(Box::new(FixedSource {
            name: "second",
            url: Some("http://127.0.0.1:8000/wpad.dat".to_string()),
            bypass: Some("never-seen".to_string()),
        }));

        // URL comes from the second source, bypass from the first.
        assert_eq!(
            stack.auto_config_url().as_deref(),
            Some("http://127.0.0.1:8000/wpad.dat")
        );
        assert_eq!(stack.bypass_list().as_deref(), Some("<local>"));
    }

    #[test]
    fn explicit_empty_is_present() {
        let stack = SourceStack::new();
        stack.register(Box::new(FixedSource {
            name: "empty",
            url: Some(String::new()),
            bypass: None,
        }));
        stack.register(Box::new(FixedSource {
            name: "set",
            url: Some("http://wpad/wpad.dat".to_string()),
            bypass: None,
        }));

        // Set-to-empty wins over a lower-precedence set value.
        assert_eq!(stack.auto_config_url().as_deref(), Some(""));
    }

    #[test]
    fn empty_stack_answers_nothing() {
        let stack = SourceStack::new();
        assert!(stack.is_empty());
        assert!(!stack.auto_discover());
        assert_eq!(stack.auto_config_url(), None);
        assert_eq!(stack.proxy_for_protocol("http"), None);
        assert_eq!(stack.bypass_list(), None);
    }
}

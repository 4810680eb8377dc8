//! PAC proxy directive grammar
//!
//! A PAC result is a semicolon-separated list of directives, each either
//! `DIRECT` or `PROXY host:port`. Other directive kinds (`SOCKS`, `HTTPS`,
//! ...) are passed through uninterpreted; older PAC consumers only
//! understand the first two, newer ones understand more, and this crate
//! takes no position beyond parsing the shape.

use std::fmt;

/// One parsed PAC directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyDirective {
    /// Connect directly, without a proxy
    Direct,
    /// Connect through an HTTP proxy at `host:port`
    Proxy(String),
    /// Engine-specific directive, passed through uninterpreted
    Other {
        /// Directive keyword as written (e.g. "SOCKS", "HTTPS")
        kind: String,
        /// Remainder of the token, usually `host:port`
        value: String,
    },
}

impl fmt::Display for ProxyDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyDirective::Direct => write!(f, "DIRECT"),
            ProxyDirective::Proxy(endpoint) => write!(f, "PROXY {}", endpoint),
            ProxyDirective::Other { kind, value } => write!(f, "{} {}", kind, value),
        }
    }
}

/// A proxy list in PAC directive grammar
///
/// Wraps the string produced by a PAC script (or synthesized from static
/// configuration) and parses it on demand. The original string is preserved
/// byte for byte; parsing never normalizes it away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyList(String);

impl ProxyList {
    /// The implicit result when no proxy configuration applies at all
    pub fn direct() -> Self {
        Self("DIRECT".to_string())
    }

    /// The raw directive string as produced
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the semicolon-separated directives
    ///
    /// Empty tokens are skipped. A bare unknown keyword with no value is
    /// passed through with an empty value rather than dropped.
    pub fn directives(&self) -> Vec<ProxyDirective> {
        self.0
            .split(';')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| {
                let (kind, value) = match token.split_once(char::is_whitespace) {
                    Some((kind, value)) => (kind, value.trim()),
                    None => (token, ""),
                };
                if kind.eq_ignore_ascii_case("DIRECT") {
                    ProxyDirective::Direct
                } else if kind.eq_ignore_ascii_case("PROXY") {
                    ProxyDirective::Proxy(value.to_string())
                } else {
                    ProxyDirective::Other {
                        kind: kind.to_string(),
                        value: value.to_string(),
                    }
                }
            })
            .collect()
    }
}

impl From<String> for ProxyList {
    fn from(list: String) -> Self {
        Self(list)
    }
}

impl From<&str> for ProxyList {
    fn from(list: &str) -> Self {
        Self(list.to_string())
    }
}

impl fmt::Display for ProxyList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

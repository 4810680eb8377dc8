// # pacresd - Proxy Resolution Front End
//
// Thin integration layer over pacres-core: it composes the configuration
// stack, brings up a script engine backend, and resolves the proxy for
// each URL given on the command line. All resolution logic lives in
// pacres-core.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Overrides (optional, win over everything else)
// - `PACRES_PROXY`: Pin a proxy in PAC grammar, e.g. `PROXY host:8080`
// - `PACRES_PAC_URL`: Pin the PAC script URL
// - `PACRES_BYPASS_LIST`: Pin the bypass list, e.g. `localhost,.corp.test`
// - `PACRES_AUTO_DISCOVER`: `true`/`false`, force WPAD on or off
//
// ### Discovery
// - `PACRES_WPAD_FQDN`: FQDN to walk for DNS WPAD (default: local hostname)
// - `PACRES_DHCP_TIMEOUT_SECS`: Per-adapter DHCP query timeout (default 3)
//
// ### Runtime
// - `PACRES_ENGINE`: Comma-separated script-engine backend names to probe,
//   in order (default: every built-in backend)
// - `PACRES_TIMEOUT_SECS`: Per-URL resolution timeout (default 30)
// - `PACRES_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// The conventional `<protocol>_proxy` / `no_proxy` environment variables
// are honored below the overrides.
//
// ## Example
//
// ```bash
// export PACRES_PAC_URL=http://config.corp.test/proxy.pac
// pacresd http://www.example.com/ https://intranet/
// ```

use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use pacres_core::registry::SourceStack;
use pacres_core::resolver::{ProxyResolver, ResolverContext, ResolverState};
use pacres_core::sources::OverrideConfigSource;
use pacres_core::{exec, DiscoveryConfig, ResolverConfig};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Every URL resolved
/// - 1: Configuration or startup error
/// - 2: At least one resolution failed
#[derive(Debug, Clone, Copy)]
enum PacresExitCode {
    AllResolved = 0,
    ConfigError = 1,
    ResolutionError = 2,
}

impl From<PacresExitCode> for ExitCode {
    fn from(code: PacresExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    proxy: Option<String>,
    pac_url: Option<String>,
    bypass_list: Option<String>,
    auto_discover: Option<bool>,
    wpad_fqdn: Option<String>,
    dhcp_timeout_secs: Option<u64>,
    engines: Vec<String>,
    timeout_secs: u64,
    log_level: String,
    urls: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables and argv
    fn from_env() -> Result<Self> {
        Ok(Self {
            proxy: env::var("PACRES_PROXY").ok(),
            pac_url: env::var("PACRES_PAC_URL").ok(),
            bypass_list: env::var("PACRES_BYPASS_LIST").ok(),
            auto_discover: match env::var("PACRES_AUTO_DISCOVER").ok().as_deref() {
                None => None,
                Some("true") | Some("1") => Some(true),
                Some("false") | Some("0") => Some(false),
                Some(other) => {
                    anyhow::bail!("PACRES_AUTO_DISCOVER must be true or false. Got: {}", other)
                }
            },
            wpad_fqdn: env::var("PACRES_WPAD_FQDN").ok(),
            engines: env::var("PACRES_ENGINE")
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            dhcp_timeout_secs: env::var("PACRES_DHCP_TIMEOUT_SECS")
                .ok()
                .map(|s| s.parse())
                .transpose()
                .map_err(|e| anyhow::anyhow!("PACRES_DHCP_TIMEOUT_SECS is not a number: {}", e))?,
            timeout_secs: env::var("PACRES_TIMEOUT_SECS")
                .ok()
                .map(|s| s.parse())
                .transpose()
                .map_err(|e| anyhow::anyhow!("PACRES_TIMEOUT_SECS is not a number: {}", e))?
                .unwrap_or(30),
            log_level: env::var("PACRES_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            urls: env::args().skip(1).collect(),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.urls.is_empty() {
            anyhow::bail!("Usage: pacresd <url> [<url> ...]");
        }

        if !(1..=300).contains(&self.timeout_secs) {
            anyhow::bail!(
                "PACRES_TIMEOUT_SECS must be between 1 and 300. Got: {}",
                self.timeout_secs
            );
        }

        if let Some(secs) = self.dhcp_timeout_secs
            && !(1..=60).contains(&secs)
        {
            anyhow::bail!(
                "PACRES_DHCP_TIMEOUT_SECS must be between 1 and 60. Got: {}",
                secs
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "PACRES_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    fn resolver_config(&self) -> ResolverConfig {
        let mut discovery = DiscoveryConfig::default();
        if let Some(fqdn) = &self.wpad_fqdn {
            discovery.fqdn = Some(fqdn.clone());
        }
        if let Some(secs) = self.dhcp_timeout_secs {
            discovery.dhcp_timeout_secs = secs;
        }
        let mut config = ResolverConfig::new();
        config.discovery = discovery;
        config.exec.backends = self.engines.clone();
        config
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return PacresExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return PacresExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return PacresExitCode::ConfigError.into();
    }

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return PacresExitCode::ResolutionError.into();
        }
    };

    let result = rt.block_on(run(config));

    // Release the process-wide engine binding before exit.
    exec::global_cleanup();

    match result {
        Ok(true) => PacresExitCode::AllResolved.into(),
        Ok(false) => PacresExitCode::ResolutionError.into(),
        Err(e) => {
            error!("Startup error: {}", e);
            PacresExitCode::ConfigError.into()
        }
    }
}

/// Resolve each URL, reporting per-URL outcomes; `Ok(true)` when all
/// resolved
async fn run(config: Config) -> Result<bool> {
    // Compose the configuration stack, highest precedence first.
    let stack = SourceStack::new();

    let overrides = OverrideConfigSource::new();
    if let Some(proxy) = &config.proxy {
        overrides.set_proxy(proxy.clone());
    }
    if let Some(url) = &config.pac_url {
        overrides.set_auto_config_url(url.clone());
    }
    if let Some(bypass) = &config.bypass_list {
        overrides.set_bypass_list(bypass.clone());
    }
    if let Some(enabled) = config.auto_discover {
        overrides.set_auto_discover(enabled);
    }
    stack.register(Box::new(overrides));

    #[cfg(feature = "env")]
    {
        info!("Registering environment configuration source");
        pacres_config_env::register(&stack);
    }

    stack.init_all();
    info!("Configuration sources: {:?}", stack.source_names());

    let resolver_config = config.resolver_config();
    resolver_config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {}", e))?;

    #[cfg(feature = "boa")]
    {
        info!("Initializing script engine backends");
        let mut candidates = pacres_engine_boa::candidates();
        let preferred = &resolver_config.exec.backends;
        if !preferred.is_empty() {
            candidates.retain(|c| preferred.iter().any(|name| name == c.name()));
        }
        exec::global_init(candidates)
            .map_err(|e| anyhow::anyhow!("no script engine available: {}", e))?;
    }

    let context = Arc::new(ResolverContext::new(resolver_config, Arc::new(stack)));
    let timeout = Duration::from_secs(config.timeout_secs);

    let mut all_resolved = true;
    for url in &config.urls {
        let resolver = ProxyResolver::new(Arc::clone(&context));
        if let Err(e) = resolver.start(url) {
            error!("{}: {}", url, e);
            all_resolved = false;
            continue;
        }

        if !resolver.wait(timeout).await {
            resolver.cancel();
            resolver.wait(timeout).await;
        }

        match resolver.state() {
            ResolverState::Completed => match resolver.get_list() {
                Some(list) => println!("{} -> {}", url, list),
                None => {
                    error!("{}: completed without a proxy list", url);
                    all_resolved = false;
                }
            },
            _ => {
                let detail = resolver
                    .get_error()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "timed out".to_string());
                error!("{}: {}", url, detail);
                all_resolved = false;
            }
        }
    }

    context.sources().uninit_all();
    Ok(all_resolved)
}

use std::env;
use std::time::Duration;

use twinkly_client::TransportConfig;

use crate::cli::Cli;

const DEFAULT_HOST: &str = "192.168.1.160";
const DEFAULT_LED_COUNT: usize = 600;
const DEFAULT_FRAME_DELAY_MS: u32 = 500;
const DEFAULT_PROXY: &str = "http://127.0.0.1:8888";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings for the interactive front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Device to connect to when `connect` is given no host.
    pub host: String,
    pub led_count: usize,
    pub frame_delay_ms: u32,
    /// Proxy used once `enable-proxy` is issued, e.g. a local traffic inspector.
    pub proxy: String,
    pub use_proxy: bool,
    pub timeout: Duration,
}

fn env_truthy(name: &str) -> bool {
    env::var(name)
        .map(|value| {
            matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
        .unwrap_or(false)
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|value| value.trim().parse().ok())
}

impl Config {
    pub fn from_env() -> Self {
        let host = env::var("TWINKLY_HOST")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let proxy = env::var("TWINKLY_PROXY")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PROXY.to_string());

        Self {
            host,
            led_count: env_parsed("TWINKLY_LED_COUNT").unwrap_or(DEFAULT_LED_COUNT),
            frame_delay_ms: env_parsed("TWINKLY_FRAME_DELAY_MS").unwrap_or(DEFAULT_FRAME_DELAY_MS),
            proxy,
            use_proxy: env_truthy("TWINKLY_USE_PROXY"),
            timeout: Duration::from_secs(
                env_parsed("TWINKLY_TIMEOUT_SECS").unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
        }
    }

    /// Command-line flags win over the environment.
    pub fn with_overrides(mut self, cli: &Cli) -> Self {
        if let Some(host) = &cli.host {
            self.host = host.clone();
        }
        if let Some(led_count) = cli.led_count {
            self.led_count = led_count;
        }
        if let Some(frame_delay) = cli.frame_delay {
            self.frame_delay_ms = frame_delay;
        }
        if let Some(proxy) = &cli.proxy {
            self.proxy = proxy.clone();
        }
        if cli.use_proxy {
            self.use_proxy = true;
        }
        self
    }

    pub fn transport(&self, use_proxy: bool) -> TransportConfig {
        let config = TransportConfig::default().with_timeout(self.timeout);
        if use_proxy {
            config.with_proxy(self.proxy.clone())
        } else {
            config
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            led_count: DEFAULT_LED_COUNT,
            frame_delay_ms: DEFAULT_FRAME_DELAY_MS,
            proxy: DEFAULT_PROXY.to_string(),
            use_proxy: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

use anyhow::Context;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Upper bound on every breakdown the aggregator requests.
pub const MAX_BREAKDOWN_LIMIT: usize = 5;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub stats: StatsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Base URL of the stats API, e.g. `https://plausible.io/api/v1/stats`
    pub base_url: String,
    pub api_key: SecretString,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// `limit` sent with every breakdown request
    #[serde(default = "StatsConfig::default_breakdown_limit")]
    pub breakdown_limit: usize,
    /// How many per-source time-on-page lookups may be in flight at once
    #[serde(default = "StatsConfig::default_source_lookup_concurrency")]
    pub source_lookup_concurrency: usize,
}

/// Settings for the `pagestats-report` client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub server_url: String,
    pub site_id: String,
    pub timeout_secs: u64,
}

impl UpstreamConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://plausible.io/api/v1/stats";

    const fn default_timeout_secs() -> u64 {
        30
    }
}

impl StatsConfig {
    const fn default_breakdown_limit() -> usize {
        MAX_BREAKDOWN_LIMIT
    }

    const fn default_source_lookup_concurrency() -> usize {
        1
    }

    /// Breakdown limit clamped to `1..=MAX_BREAKDOWN_LIMIT`.
    pub fn effective_limit(&self) -> usize {
        self.breakdown_limit.clamp(1, MAX_BREAKDOWN_LIMIT)
    }

    /// Lookup concurrency clamped to `1..=effective_limit()`.
    pub fn effective_concurrency(&self) -> usize {
        self.source_lookup_concurrency.clamp(1, self.effective_limit())
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            breakdown_limit: Self::default_breakdown_limit(),
            source_lookup_concurrency: Self::default_source_lookup_concurrency(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let api_host = std::env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let api_port = std::env::var("API_PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()
            .context("API_PORT must be a valid port number")?;

        let base_url = std::env::var("PLAUSIBLE_BASE_URL")
            .unwrap_or_else(|_| UpstreamConfig::DEFAULT_BASE_URL.to_string());

        let api_key = std::env::var("PLAUSIBLE_API_KEY")
            .context("PLAUSIBLE_API_KEY must be set")?;
        if api_key.trim().is_empty() {
            anyhow::bail!("PLAUSIBLE_API_KEY must not be empty");
        }

        let timeout_secs = std::env::var("UPSTREAM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or_else(UpstreamConfig::default_timeout_secs);

        let breakdown_limit = std::env::var("BREAKDOWN_LIMIT")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or_else(StatsConfig::default_breakdown_limit);

        if breakdown_limit == 0 || breakdown_limit > MAX_BREAKDOWN_LIMIT {
            tracing::warn!(
                "BREAKDOWN_LIMIT={breakdown_limit} is outside 1..={MAX_BREAKDOWN_LIMIT}, it will be clamped"
            );
        }

        let source_lookup_concurrency = std::env::var("SOURCE_LOOKUP_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or_else(StatsConfig::default_source_lookup_concurrency);

        Ok(Config {
            api_server: ServerConfig {
                host: api_host,
                port: api_port,
            },
            upstream: UpstreamConfig {
                base_url,
                api_key: SecretString::from(api_key),
                timeout_secs,
            },
            stats: StatsConfig {
                breakdown_limit,
                source_lookup_concurrency,
            },
        })
    }
}

impl ReportConfig {
    pub const DEFAULT_SERVER_URL: &'static str = "http://localhost:5000";
    pub const DEFAULT_SITE_ID: &'static str = "example.com";

    /// Client settings never require the upstream credential.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let server_url = std::env::var("REPORT_SERVER_URL")
            .unwrap_or_else(|_| Self::DEFAULT_SERVER_URL.to_string());
        let site_id =
            std::env::var("REPORT_SITE_ID").unwrap_or_else(|_| Self::DEFAULT_SITE_ID.to_string());
        let timeout_secs = std::env::var("REPORT_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or_else(UpstreamConfig::default_timeout_secs);

        ReportConfig {
            server_url,
            site_id,
            timeout_secs,
        }
    }
}

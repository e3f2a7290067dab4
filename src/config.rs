use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::freshness::FreshnessPolicy;
use crate::providers::oxr::DEFAULT_BASE_URL;

/// Service configuration, read from flags or the environment.
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct AppConfig {
    /// Open Exchange Rates app id
    #[arg(long, env = "OXR_APP_ID", hide_env_values = true, value_parser = non_blank)]
    pub app_id: String,

    /// Root URL of the rate provider API
    #[arg(long, env = "OXR_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Bearer token clients must present
    #[arg(long, env = "AUTH_TOKEN", hide_env_values = true, value_parser = non_blank)]
    pub auth_token: String,

    /// Address to bind
    #[arg(long, env = "BIND_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Directory holding the cached rates and currencies
    #[arg(long, env = "DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Per-request timeout for upstream calls, in seconds
    #[arg(long, env = "OXR_TIMEOUT_SECS", default_value_t = 10)]
    pub upstream_timeout_secs: u64,

    /// How long cached rates stay fresh, in seconds
    #[arg(
        long,
        env = "RATES_TTL_SECS",
        default_value_t = 3600,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub rates_ttl_secs: u64,

    /// How long cached currency names stay fresh, in seconds
    #[arg(
        long,
        env = "SYMBOLS_TTL_SECS",
        default_value_t = 86400,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub symbols_ttl_secs: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

fn non_blank(value: &str) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        Err("must not be empty".to_string())
    } else {
        Ok(value.to_string())
    }
}

impl AppConfig {
    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|e| anyhow::anyhow!("Invalid bind address {addr}: {e}"))
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn freshness(&self) -> FreshnessPolicy {
        FreshnessPolicy {
            rates_ttl: Duration::from_secs(self.rates_ttl_secs),
            symbols_ttl: Duration::from_secs(self.symbols_ttl_secs),
        }
    }
}

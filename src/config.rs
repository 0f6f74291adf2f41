use anyhow::{Context, Result};
use std::{env, fmt::Display, net::SocketAddr, str::FromStr, time::Duration};
use tracing::{info, warn};

pub const SEARCH_URL_VAR: &str = "API_SEARCH_URL";
const LEGACY_SEARCH_URL_VAR: &str = "NEXT_PUBLIC_API_SEARCH_URL";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// External search endpoint. Empty when unset.
    pub search_url: String,
    pub bind_addr: SocketAddr,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let search_url = env::var(SEARCH_URL_VAR)
            .or_else(|_| env::var(LEGACY_SEARCH_URL_VAR))
            .unwrap_or_else(|_| {
                warn!("{SEARCH_URL_VAR} not set, every proxied request will fail");
                String::new()
            });

        if !search_url.is_empty() {
            if let Err(e) = url::Url::parse(&search_url) {
                warn!("{SEARCH_URL_VAR} is not an absolute URL ({e}), using it as is");
            }
        }

        Ok(Self {
            search_url,
            bind_addr: try_load("BIND_ADDR", "0.0.0.0:3000")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub api_base: String,
    /// `None` disables interval polling.
    pub health_interval: Option<Duration>,
}

impl CliConfig {
    pub fn from_env() -> Result<Self> {
        let api_base: String = try_load("PAN_SEARCH_API", "http://127.0.0.1:3000")?;
        let secs: u64 = try_load("HEALTH_POLL_SECS", "30")?;
        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            health_interval: (secs > 0).then(|| Duration::from_secs(secs)),
        })
    }
}

fn try_load<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse::<T>()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("invalid {key} value: {raw}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_load_falls_back_to_default() {
        let addr: SocketAddr = try_load("PAN_SEARCH_TEST_UNSET_ADDR", "127.0.0.1:8080").unwrap();
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn try_load_rejects_garbage() {
        let parsed: Result<u64> = try_load("PAN_SEARCH_TEST_UNSET_NUM", "thirty");
        let err = parsed.unwrap_err();
        assert!(err.to_string().contains("PAN_SEARCH_TEST_UNSET_NUM"));
    }
}

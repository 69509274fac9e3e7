//! Server configuration from the environment.

use anyhow::Context;
use std::net::SocketAddr;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3030";
pub const DEFAULT_LOG_FILTER: &str = "tagout_server=info,tower_http=info";

/// Settings read at startup.
///
/// | Env Var            | Default                                 |
/// |--------------------|-----------------------------------------|
/// | `TAGOUT_BIND_ADDR` | `0.0.0.0:3030`                          |
/// | `TAGOUT_LOG`       | `tagout_server=info,tower_http=info`    |
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// `tracing-subscriber` env-filter directives.
    pub log_filter: String,
}

impl ServerConfig {
    /// Load from the process environment. Call `dotenvy::dotenv()` first to
    /// pick up a `.env` file.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let bind = lookup("TAGOUT_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
        let bind_addr = bind
            .parse()
            .with_context(|| format!("TAGOUT_BIND_ADDR is not a socket address: {bind}"))?;
        let log_filter = lookup("TAGOUT_LOG")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.into());
        Ok(Self { bind_addr, log_filter })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:3030".parse().unwrap());
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_overrides_and_bad_addr() {
        let config =
            ServerConfig::from_lookup(lookup(&[("TAGOUT_BIND_ADDR", "127.0.0.1:8080"), ("TAGOUT_LOG", "debug")]))
                .unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.log_filter, "debug");

        assert!(ServerConfig::from_lookup(lookup(&[("TAGOUT_BIND_ADDR", "nowhere")])).is_err());
    }
}

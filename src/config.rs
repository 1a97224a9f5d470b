//! Service configuration, read from the environment (and `.env` if present).

use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
/// 200 MiB, the largest workbook the dashboard accepts.
const DEFAULT_MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub max_upload_bytes: usize,
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 3000))),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            cors_permissive: true,
        }
    }
}

impl ServerConfig {
    /// Read `TAKEDOWN_BIND_ADDR`, `TAKEDOWN_MAX_UPLOAD_BYTES` and
    /// `TAKEDOWN_CORS_PERMISSIVE`, falling back to defaults when unset.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(addr) = lookup("TAKEDOWN_BIND_ADDR") {
            config.bind_addr = addr
                .trim()
                .parse()
                .with_context(|| format!("Invalid TAKEDOWN_BIND_ADDR: {}", addr))?;
        }

        if let Some(limit) = lookup("TAKEDOWN_MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = limit
                .trim()
                .parse()
                .with_context(|| format!("Invalid TAKEDOWN_MAX_UPLOAD_BYTES: {}", limit))?;
        }

        if let Some(flag) = lookup("TAKEDOWN_CORS_PERMISSIVE") {
            config.cors_permissive = match flag.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => anyhow::bail!("Invalid TAKEDOWN_CORS_PERMISSIVE: {}", other),
            };
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.max_upload_bytes, 209_715_200);
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("TAKEDOWN_BIND_ADDR", "127.0.0.1:8080"),
            ("TAKEDOWN_MAX_UPLOAD_BYTES", "1024"),
            ("TAKEDOWN_CORS_PERMISSIVE", "off"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.max_upload_bytes, 1024);
        assert!(!config.cors_permissive);
    }

    #[test]
    fn test_invalid_values() {
        assert!(ServerConfig::from_lookup(lookup(&[("TAKEDOWN_BIND_ADDR", "nowhere")])).is_err());
        assert!(ServerConfig::from_lookup(lookup(&[("TAKEDOWN_MAX_UPLOAD_BYTES", "-1")])).is_err());
        assert!(
            ServerConfig::from_lookup(lookup(&[("TAKEDOWN_CORS_PERMISSIVE", "maybe")])).is_err()
        );
    }
}

//! Server configuration from environment variables
//!
//! | Variable | Default |
//! |----------|---------|
//! | `SVID_SERVER_PORT` | `8081` |
//! | `SVID_SERVER_TRUST_DOMAIN` | `example.org` |
//! | `SVID_SERVER_BASE_SVID_TTL` | `3600` |
//! | `SVID_SERVER_SVID_TTL` | `3600` |
//! | `SVID_SERVER_JOIN_TOKENS` | none (comma separated) |
//! | `SVID_SERVER_ENABLE_MOCK_ATTESTOR` | `false` |
//! | `SVID_SERVER_DATABASE_URL` | none (memory store) |
//! | `SVID_SERVER_LOG_LEVEL` | `info` |
//!
//! `SVID_SERVER_SVID_TTL` sets the validity actually written into every
//! certificate the CA signs. The `ttl` returned next to each SVID is a
//! separate value: `SVID_SERVER_BASE_SVID_TTL` for base SVIDs and the
//! registration entry's TTL for workload SVIDs. The two can disagree.

use std::time::Duration;
use thiserror::Error;

use svid_core::SpiffeId;

use crate::core::DEFAULT_BASE_SVID_TTL;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub trust_domain: String,
    /// TTL reported for base SVIDs, in seconds
    pub base_svid_ttl: i32,
    /// Validity of certificates signed by the CA, independent of the TTL
    /// reported in responses
    pub svid_ttl: Duration,
    pub join_tokens: Vec<String>,
    pub enable_mock_attestor: bool,
    pub database_url: Option<String>,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8081,
            trust_domain: "example.org".into(),
            base_svid_ttl: DEFAULT_BASE_SVID_TTL,
            svid_ttl: Duration::from_secs(3600),
            join_tokens: Vec::new(),
            enable_mock_attestor: false,
            database_url: None,
            log_level: "info".into(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through a variable lookup function
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = parse_var(&lookup, "SVID_SERVER_PORT")?.unwrap_or(defaults.port);

        let trust_domain = lookup("SVID_SERVER_TRUST_DOMAIN").unwrap_or(defaults.trust_domain);
        SpiffeId::trust_domain_id(&trust_domain).map_err(|e| ConfigError::Invalid {
            name: "SVID_SERVER_TRUST_DOMAIN",
            reason: e.to_string(),
        })?;

        let base_svid_ttl: i32 =
            parse_var(&lookup, "SVID_SERVER_BASE_SVID_TTL")?.unwrap_or(defaults.base_svid_ttl);
        if base_svid_ttl <= 0 {
            return Err(ConfigError::Invalid {
                name: "SVID_SERVER_BASE_SVID_TTL",
                reason: "must be positive".into(),
            });
        }

        let svid_ttl = parse_var::<u64, _>(&lookup, "SVID_SERVER_SVID_TTL")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.svid_ttl);
        if svid_ttl.is_zero() {
            return Err(ConfigError::Invalid {
                name: "SVID_SERVER_SVID_TTL",
                reason: "must be positive".into(),
            });
        }

        let join_tokens = lookup("SVID_SERVER_JOIN_TOKENS")
            .map(|tokens| {
                tokens
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let enable_mock_attestor = parse_var(&lookup, "SVID_SERVER_ENABLE_MOCK_ATTESTOR")?
            .unwrap_or(defaults.enable_mock_attestor);

        Ok(Self {
            port,
            trust_domain,
            base_svid_ttl,
            svid_ttl,
            join_tokens,
            enable_mock_attestor,
            database_url: lookup("SVID_SERVER_DATABASE_URL").filter(|url| !url.is_empty()),
            log_level: lookup("SVID_SERVER_LOG_LEVEL").unwrap_or(defaults.log_level),
        })
    }
}

fn parse_var<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|raw| {
            raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                name,
                reason: e.to_string(),
            })
        })
        .transpose()
}

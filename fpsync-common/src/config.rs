//! Configuration loading and validation
//!
//! Values resolve in this priority order:
//! 1. Command-line flag or environment variable (highest priority)
//! 2. TOML config file
//! 3. Compiled default (fallback)
//!
//! The gateway turns its CLI arguments into a [`ConfigLayer`]; the optional
//! TOML file deserializes into another. [`GatewayConfig::from_layers`] merges
//! and validates them.

use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::dsn::{parse_dsn, redact_dsn, Datastore};
use crate::store::StoreOptions;
use crate::sync::{DEFAULT_FETCH_LIMIT, DEFAULT_MAX_ACK_IDS, MAX_FETCH_LIMIT};
use crate::{Error, Result};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_DB_ACQUIRE_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// One source of configuration values; every field is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    pub db_dsn: Option<String>,
    pub api_key: Option<String>,
    pub bind_addr: Option<String>,
    pub port: Option<u16>,
    pub fetch_limit: Option<u32>,
    pub max_ack_ids: Option<usize>,
    pub request_timeout_secs: Option<u64>,
    pub db_max_connections: Option<u32>,
    pub db_acquire_timeout_secs: Option<u64>,
    pub max_body_bytes: Option<usize>,
}

impl ConfigLayer {
    /// Load a layer from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("read config file {}: {}", path.display(), e),
            ))
        })?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{} ({})", e, path.display())))
    }

    /// Parse a layer from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Fill every unset field from `lower`
    pub fn or(self, lower: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            db_dsn: self.db_dsn.or(lower.db_dsn),
            api_key: self.api_key.or(lower.api_key),
            bind_addr: self.bind_addr.or(lower.bind_addr),
            port: self.port.or(lower.port),
            fetch_limit: self.fetch_limit.or(lower.fetch_limit),
            max_ack_ids: self.max_ack_ids.or(lower.max_ack_ids),
            request_timeout_secs: self.request_timeout_secs.or(lower.request_timeout_secs),
            db_max_connections: self.db_max_connections.or(lower.db_max_connections),
            db_acquire_timeout_secs: self
                .db_acquire_timeout_secs
                .or(lower.db_acquire_timeout_secs),
            max_body_bytes: self.max_body_bytes.or(lower.max_body_bytes),
        }
    }
}

/// Validated gateway configuration
#[derive(Clone)]
pub struct GatewayConfig {
    /// DSN as configured, kept for redacted logging
    pub db_dsn: String,
    /// Parsed connection target
    pub datastore: Datastore,
    pub api_key: String,
    pub bind_addr: IpAddr,
    pub port: u16,
    pub fetch_limit: u32,
    pub max_ack_ids: usize,
    pub request_timeout: Duration,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub max_body_bytes: usize,
}

// Custom Debug implementation to hide credentials
impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("db_dsn", &redact_dsn(&self.db_dsn))
            .field("datastore", &self.datastore)
            .field("api_key", &"[REDACTED]")
            .field("bind_addr", &self.bind_addr)
            .field("port", &self.port)
            .field("fetch_limit", &self.fetch_limit)
            .field("max_ack_ids", &self.max_ack_ids)
            .field("request_timeout", &self.request_timeout)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_acquire_timeout", &self.db_acquire_timeout)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

impl GatewayConfig {
    /// Merge `primary` over `file`, apply defaults and validate
    pub fn from_layers(primary: ConfigLayer, file: ConfigLayer) -> Result<Self> {
        let layer = primary.or(file);

        let db_dsn = layer
            .db_dsn
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| Error::Config("DB_DSN is not set".to_string()))?;
        let datastore = parse_dsn(&db_dsn)?;

        let api_key = layer
            .api_key
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::Config("API_KEY is not set".to_string()))?;

        let bind_addr = layer
            .bind_addr
            .as_deref()
            .unwrap_or(DEFAULT_BIND_ADDR)
            .parse::<IpAddr>()
            .map_err(|e| Error::Config(format!("Invalid bind address: {}", e)))?;

        let fetch_limit = layer.fetch_limit.unwrap_or(DEFAULT_FETCH_LIMIT);
        if fetch_limit == 0 || fetch_limit > MAX_FETCH_LIMIT {
            return Err(Error::Config(format!(
                "fetch limit must be between 1 and {}, got {}",
                MAX_FETCH_LIMIT, fetch_limit
            )));
        }

        let max_ack_ids = layer.max_ack_ids.unwrap_or(DEFAULT_MAX_ACK_IDS);
        if max_ack_ids == 0 {
            return Err(Error::Config("max ack ids must be at least 1".to_string()));
        }

        let request_timeout_secs = layer
            .request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        if request_timeout_secs == 0 {
            return Err(Error::Config("request timeout must be at least 1s".to_string()));
        }

        let db_max_connections = layer
            .db_max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);
        if db_max_connections == 0 {
            return Err(Error::Config(
                "database pool needs at least 1 connection".to_string(),
            ));
        }

        let db_acquire_timeout_secs = layer
            .db_acquire_timeout_secs
            .unwrap_or(DEFAULT_DB_ACQUIRE_TIMEOUT_SECS);
        if db_acquire_timeout_secs == 0 {
            return Err(Error::Config("acquire timeout must be at least 1s".to_string()));
        }

        Ok(Self {
            db_dsn,
            datastore,
            api_key,
            bind_addr,
            port: layer.port.unwrap_or(DEFAULT_PORT),
            fetch_limit,
            max_ack_ids,
            request_timeout: Duration::from_secs(request_timeout_secs),
            db_max_connections,
            db_acquire_timeout: Duration::from_secs(db_acquire_timeout_secs),
            max_body_bytes: layer.max_body_bytes.unwrap_or(DEFAULT_MAX_BODY_BYTES),
        })
    }

    /// Address to listen on
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    /// Pool settings for [`crate::store::connect`]
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            datastore: self.datastore.clone(),
            max_connections: self.db_max_connections,
            acquire_timeout: self.db_acquire_timeout,
        }
    }

    /// Configured DSN with the password masked
    pub fn redacted_dsn(&self) -> String {
        redact_dsn(&self.db_dsn)
    }
}

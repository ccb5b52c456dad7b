//! Command-line arguments
//!
//! Every flag can also be set from the environment. Flags and environment
//! take priority over the optional TOML file named by `--config`.

use std::path::PathBuf;

use clap::Parser;
use fpsync_common::{ConfigLayer, GatewayConfig};

#[derive(Parser)]
#[command(name = "fpsync-gateway")]
#[command(about = "HTTP gateway serving pending fingerprint attendance logs")]
#[command(version)]
pub struct Args {
    /// TOML file with defaults for any option below
    #[arg(short, long, env = "FPSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Datastore DSN (mysql://, mariadb://, sqlite: or user:pass@tcp(host:port)/db)
    #[arg(long, env = "DB_DSN", hide_env_values = true)]
    pub db_dsn: Option<String>,

    /// Shared secret expected in the X-API-KEY header
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Address to listen on [default: 0.0.0.0]
    #[arg(long, env = "BIND_ADDR")]
    pub bind_addr: Option<String>,

    /// Port to listen on [default: 8080]
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Maximum records returned by one fetch [default: 1000]
    #[arg(long, env = "FETCH_LIMIT")]
    pub fetch_limit: Option<u32>,

    /// Maximum ids accepted by one acknowledge [default: 10000]
    #[arg(long, env = "MAX_ACK_IDS")]
    pub max_ack_ids: Option<usize>,

    /// Whole-request timeout in seconds [default: 30]
    #[arg(long, env = "REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: Option<u64>,

    /// Database pool size [default: 10]
    #[arg(long, env = "DB_MAX_CONNECTIONS")]
    pub db_max_connections: Option<u32>,

    /// Seconds to wait for a pooled connection [default: 5]
    #[arg(long, env = "DB_ACQUIRE_TIMEOUT_SECS")]
    pub db_acquire_timeout_secs: Option<u64>,

    /// Request body cap in bytes [default: 1048576]
    #[arg(long, env = "MAX_BODY_BYTES")]
    pub max_body_bytes: Option<usize>,
}

impl Args {
    /// Flag/env values as a configuration layer
    pub fn layer(&self) -> ConfigLayer {
        ConfigLayer {
            db_dsn: self.db_dsn.clone(),
            api_key: self.api_key.clone(),
            bind_addr: self.bind_addr.clone(),
            port: self.port,
            fetch_limit: self.fetch_limit,
            max_ack_ids: self.max_ack_ids,
            request_timeout_secs: self.request_timeout_secs,
            db_max_connections: self.db_max_connections,
            db_acquire_timeout_secs: self.db_acquire_timeout_secs,
            max_body_bytes: self.max_body_bytes,
        }
    }

    /// Merge with the config file, if any, and validate
    pub fn into_config(self) -> fpsync_common::Result<GatewayConfig> {
        let file = match &self.config {
            Some(path) => ConfigLayer::from_toml_file(path)?,
            None => ConfigLayer::default(),
        };

        GatewayConfig::from_layers(self.layer(), file)
    }
}

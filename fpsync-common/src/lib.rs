//! # fpsync Common Library
//!
//! Shared code for the fingerprint-log sync gateway:
//! - Record model for the `tb_fps` table
//! - `RecordStore` trait with MySQL, SQLite and in-memory backends
//! - Access guard (shared-secret check)
//! - Fetch/acknowledge coordinator
//! - Configuration resolution and DSN parsing
//! - API request/response types

pub mod api;
pub mod config;
pub mod dsn;
pub mod error;
pub mod record;
pub mod store;
pub mod sync;

pub use api::auth::AccessGuard;
pub use config::{ConfigLayer, GatewayConfig};
pub use dsn::Datastore;
pub use error::{Error, Result};
pub use record::FingerprintLog;
pub use store::RecordStore;
pub use sync::SyncCoordinator;

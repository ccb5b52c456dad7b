//! Fingerprint log record as stored in `tb_fps`

use serde::{Deserialize, Serialize};

/// One attendance/fingerprint log entry.
///
/// Only pending rows (`is_fetched = 0`) are ever materialized, so the fetch
/// flag is not part of the struct. Text columns are opaque to this system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FingerprintLog {
    /// Primary key assigned by the datastore
    pub id: i64,

    /// External person/device identifier
    pub pin: String,

    /// Serialized attendance payload
    #[serde(rename = "attlog")]
    #[sqlx(rename = "attlog")]
    pub log_payload: String,

    /// External correlation identifier
    #[serde(rename = "cloud_id")]
    #[sqlx(rename = "cloud_id")]
    pub origin_id: String,
}

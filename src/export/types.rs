//! Export job record types.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A generated, time-limited CSV artifact derived from a filtered
/// submission set.
///
/// Lifecycle: created → active (servable, download count increments) →
/// expired (time-triggered, treated as not-found even before any sweep) →
/// swept (row and file both gone).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportJob {
    pub id: String,
    pub schema_id: String,
    pub filename: String,
    pub path: String,
    pub created_at: DateTime<Utc>,
    /// Always `created_at` plus the configured TTL
    pub expires_at: DateTime<Utc>,
    pub last_download_at: Option<DateTime<Utc>>,
    pub download_count: u64,
}

impl ExportJob {
    pub fn new(
        schema_id: impl Into<String>,
        filename: impl Into<String>,
        path: impl Into<String>,
        ttl_secs: i64,
    ) -> Self {
        let created_at = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            schema_id: schema_id.into(),
            filename: filename.into(),
            path: path.into(),
            created_at,
            expires_at: created_at + Duration::seconds(ttl_secs),
            last_download_at: None,
            download_count: 0,
        }
    }

    /// Whether the artifact has passed its expiry at the given instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Read-only reporting view over the export collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportStats {
    pub total: u64,
    pub active: u64,
    /// Expired rows the sweep has not yet physically removed
    pub expired_pending_sweep: u64,
    pub total_downloads: u64,
}

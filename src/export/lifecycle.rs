//! Export artifact lifecycle.
//!
//! Expiry is time-triggered the moment an artifact's deadline passes: an
//! expired job reads as not-found even while its row and file still exist
//! on disk. The sweep only reclaims space; it never changes visibility.

use crate::db_operations::DbOperations;
use crate::error::{FormFoldError, FormFoldResult};
use crate::export::types::{ExportJob, ExportStats};
use crate::storage::FileStore;
use chrono::Utc;
use log::{info, warn};
use std::path::Path;
use std::sync::Arc;

pub struct ExportLifecycle {
    db_ops: Arc<DbOperations>,
    file_store: Arc<dyn FileStore>,
}

impl ExportLifecycle {
    pub fn new(db_ops: Arc<DbOperations>, file_store: Arc<dyn FileStore>) -> Self {
        Self { db_ops, file_store }
    }

    /// Gets an export job, treating expired rows as absent.
    pub fn get(&self, export_id: &str) -> FormFoldResult<ExportJob> {
        let job = self
            .db_ops
            .get_export_job(export_id)?
            .ok_or_else(|| FormFoldError::NotFound(format!("Export {} not found", export_id)))?;
        if job.is_expired_at(Utc::now()) {
            return Err(FormFoldError::NotFound(format!(
                "Export {} not found",
                export_id
            )));
        }
        Ok(job)
    }

    /// Records one download access on a non-expired job: increments the
    /// count and stamps the access time.
    pub fn record_download(&self, export_id: &str) -> FormFoldResult<ExportJob> {
        let mut job = self.get(export_id)?;
        job.download_count += 1;
        job.last_download_at = Some(Utc::now());
        self.db_ops.store_export_job(&job)?;
        Ok(job)
    }

    /// Serves a download: reads the artifact bytes and records the access
    /// on the job. Expired exports are not servable.
    pub fn download(&self, export_id: &str) -> FormFoldResult<(ExportJob, Vec<u8>)> {
        let job = self.get(export_id)?;
        let bytes = self.file_store.read(Path::new(&job.path))?;
        let job = self.record_download(&job.id)?;
        Ok((job, bytes))
    }

    /// Lists a schema's servable (non-expired) exports, newest first.
    pub fn list_active(&self, schema_id: &str) -> FormFoldResult<Vec<ExportJob>> {
        let now = Utc::now();
        let mut jobs: Vec<ExportJob> = self
            .db_ops
            .list_export_jobs_for_schema(schema_id)?
            .into_iter()
            .filter(|job| !job.is_expired_at(now))
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }

    /// Deletes an export's file and row regardless of expiry state.
    pub fn delete(&self, export_id: &str) -> FormFoldResult<()> {
        let job = self
            .db_ops
            .get_export_job(export_id)?
            .ok_or_else(|| FormFoldError::NotFound(format!("Export {} not found", export_id)))?;
        if self.file_store.delete(Path::new(&job.path)).is_err() {
            warn!("failed to delete export file {}", job.path);
        }
        self.db_ops.delete_export_job(export_id)?;
        Ok(())
    }

    /// Reclaims expired exports: artifact bytes and rows both. Safe to
    /// run repeatedly and from overlapping schedules; each pass removes
    /// only what is expired at that instant and returns the count.
    pub fn sweep_expired(&self) -> FormFoldResult<usize> {
        let now = Utc::now();
        let mut removed = 0;
        for job in self.db_ops.list_export_jobs()? {
            if !job.is_expired_at(now) {
                continue;
            }
            if self.file_store.delete(Path::new(&job.path)).is_err() {
                warn!("failed to delete expired export file {}", job.path);
            }
            if self.db_ops.delete_export_job(&job.id)? {
                removed += 1;
            }
        }
        if removed > 0 {
            info!("swept {} expired exports", removed);
        }
        Ok(removed)
    }

    /// Reporting view over the export collection, counting expired rows
    /// the sweep has not yet reclaimed. Scoped to one schema when given.
    pub fn stats(&self, schema_id: Option<&str>) -> FormFoldResult<ExportStats> {
        let now = Utc::now();
        let mut stats = ExportStats::default();
        let jobs = match schema_id {
            Some(schema_id) => self.db_ops.list_export_jobs_for_schema(schema_id)?,
            None => self.db_ops.list_export_jobs()?,
        };
        for job in jobs {
            stats.total += 1;
            stats.total_downloads += job.download_count;
            if job.is_expired_at(now) {
                stats.expired_pending_sweep += 1;
            } else {
                stats.active += 1;
            }
        }
        Ok(stats)
    }
}

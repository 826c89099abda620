//! Pre-upload staging.
//!
//! Files can be uploaded before their owning submission exists. Each one
//! is parked under an opaque token; submission time claims it into a
//! permanent attachment, and a periodic sweep garbage-collects whatever
//! was never claimed.

use crate::error::FormFoldResult;
use crate::submission::store::SubmissionStore;
use crate::submission::types::TempUpload;
use chrono::{Duration, Utc};
use log::{debug, info, warn};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};
use std::path::Path;

const TEMP_TOKEN_LENGTH: usize = 32;

impl SubmissionStore {
    /// Stages an uploaded file ahead of its submission.
    ///
    /// The bytes land in the temporary upload area and the returned
    /// record's token is what a later submission presents to claim them.
    pub fn stage_upload(
        &self,
        original_filename: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> FormFoldResult<TempUpload> {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TEMP_TOKEN_LENGTH)
            .map(char::from)
            .collect();
        let content_hash = hex::encode(Sha256::digest(bytes));

        let stored_path = self
            .file_store
            .store(&self.temp_uploads_dir, original_filename, bytes)?;

        let upload = TempUpload {
            token,
            original_filename: original_filename.to_string(),
            stored_path: stored_path.to_string_lossy().to_string(),
            size_bytes: bytes.len() as u64,
            mime_type: mime_type.to_string(),
            content_hash,
            staged_at: Utc::now(),
        };
        self.db_ops.store_temp_upload(&upload)?;
        debug!(
            "staged upload {} ({}, {} bytes)",
            upload.token, upload.original_filename, upload.size_bytes
        );
        Ok(upload)
    }

    /// Gets a staged upload by token, for pre-submission validation.
    pub fn get_staged_upload(&self, token: &str) -> FormFoldResult<Option<TempUpload>> {
        self.db_ops.get_temp_upload(token)
    }

    /// Discards a staged upload that will not be claimed.
    pub fn discard_staged_upload(&self, token: &str) -> FormFoldResult<bool> {
        match self.db_ops.get_temp_upload(token)? {
            Some(upload) => {
                self.file_store.delete(Path::new(&upload.stored_path))?;
                self.db_ops.delete_temp_upload(token)
            }
            None => Ok(false),
        }
    }

    /// Removes staged uploads older than the configured TTL, bytes and
    /// rows both. Safe to run repeatedly; returns how many were removed.
    pub fn sweep_temp_uploads(&self) -> FormFoldResult<usize> {
        let cutoff = Utc::now() - Duration::seconds(self.temp_upload_ttl_secs);
        let mut removed = 0;
        for upload in self.db_ops.list_temp_uploads()? {
            if upload.staged_at >= cutoff {
                continue;
            }
            if self
                .file_store
                .delete(Path::new(&upload.stored_path))
                .is_err()
            {
                warn!("failed to delete staged file {}", upload.stored_path);
            }
            if self.db_ops.delete_temp_upload(&upload.token)? {
                removed += 1;
            }
        }
        if removed > 0 {
            info!("swept {} expired staged uploads", removed);
        }
        Ok(removed)
    }
}

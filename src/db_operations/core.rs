//! Core database operations struct and generic tree helpers.

use crate::error::{FormFoldError, FormFoldResult};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;

/// Unified access to all persistent collections.
///
/// Owns the sled database and caches one tree handle per collection:
/// schemas, the share-token index, submissions, file attachments, staged
/// pre-uploads, and export jobs. Values are JSON-encoded; writes are
/// flushed so records are durable before the caller sees success.
#[derive(Clone)]
pub struct DbOperations {
    /// The underlying sled database instance
    db: sled::Db,
    /// Cached trees for performance
    pub(crate) schemas_tree: sled::Tree,
    pub(crate) share_tokens_tree: sled::Tree,
    pub(crate) submissions_tree: sled::Tree,
    pub(crate) attachments_tree: sled::Tree,
    pub(crate) temp_uploads_tree: sled::Tree,
    pub(crate) exports_tree: sled::Tree,
}

impl DbOperations {
    /// Creates a new DbOperations instance with all required trees
    pub fn new(db: sled::Db) -> Result<Self, sled::Error> {
        let schemas_tree = db.open_tree("schemas")?;
        let share_tokens_tree = db.open_tree("share_tokens")?;
        let submissions_tree = db.open_tree("submissions")?;
        let attachments_tree = db.open_tree("attachments")?;
        let temp_uploads_tree = db.open_tree("temp_uploads")?;
        let exports_tree = db.open_tree("exports")?;

        Ok(Self {
            db,
            schemas_tree,
            share_tokens_tree,
            submissions_tree,
            attachments_tree,
            temp_uploads_tree,
            exports_tree,
        })
    }

    /// Gets a reference to the underlying database
    pub fn db(&self) -> &sled::Db {
        &self.db
    }

    /// Generic function to store any serializable item in a specific tree
    pub fn store_in_tree<T: Serialize>(
        &self,
        tree: &sled::Tree,
        key: &str,
        item: &T,
    ) -> FormFoldResult<()> {
        let bytes = serde_json::to_vec(item)
            .map_err(|e| FormFoldError::Serialization(format!("Serialization failed: {}", e)))?;

        tree.insert(key.as_bytes(), bytes)
            .map_err(|e| FormFoldError::Storage(format!("Store failed: {}", e)))?;

        // Ensure the data is durably written to disk
        tree.flush()
            .map_err(|e| FormFoldError::Storage(format!("Flush failed: {}", e)))?;

        Ok(())
    }

    /// Generic function to retrieve any deserializable item from a specific tree
    pub fn get_from_tree<T: DeserializeOwned>(
        &self,
        tree: &sled::Tree,
        key: &str,
    ) -> FormFoldResult<Option<T>> {
        match tree.get(key.as_bytes()) {
            Ok(Some(bytes)) => {
                let item = serde_json::from_slice(&bytes).map_err(|e| {
                    FormFoldError::Serialization(format!("Deserialization failed: {}", e))
                })?;
                Ok(Some(item))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(FormFoldError::Storage(format!("Retrieval failed: {}", e))),
        }
    }

    /// Delete an item from a specific tree, reporting whether it existed
    pub fn delete_from_tree(&self, tree: &sled::Tree, key: &str) -> FormFoldResult<bool> {
        let existed = tree
            .remove(key.as_bytes())
            .map_err(|e| FormFoldError::Storage(format!("Delete failed: {}", e)))?
            .is_some();

        tree.flush()
            .map_err(|e| FormFoldError::Storage(format!("Flush failed: {}", e)))?;

        Ok(existed)
    }

    /// Check if a key exists in a specific tree
    pub fn exists_in_tree(&self, tree: &sled::Tree, key: &str) -> FormFoldResult<bool> {
        tree.contains_key(key.as_bytes())
            .map_err(|e| FormFoldError::Storage(format!("Existence check failed: {}", e)))
    }

    /// List all key-value pairs in a tree
    pub fn list_items_in_tree<T: DeserializeOwned>(
        &self,
        tree: &sled::Tree,
    ) -> FormFoldResult<Vec<(String, T)>> {
        let mut items = Vec::new();
        for result in tree.iter() {
            let (key, value) = result
                .map_err(|e| FormFoldError::Storage(format!("Tree iteration failed: {}", e)))?;
            let key_str = String::from_utf8_lossy(&key).to_string();
            let item = serde_json::from_slice(&value).map_err(|e| {
                FormFoldError::Serialization(format!(
                    "Deserialization failed for key '{}': {}",
                    key_str, e
                ))
            })?;
            items.push((key_str, item));
        }
        Ok(items)
    }

    /// List all values under a key prefix in a tree
    pub fn list_items_with_prefix<T: DeserializeOwned>(
        &self,
        tree: &sled::Tree,
        prefix: &str,
    ) -> FormFoldResult<Vec<T>> {
        let mut items = Vec::new();
        for result in tree.scan_prefix(prefix.as_bytes()) {
            let (key, value) = result
                .map_err(|e| FormFoldError::Storage(format!("Failed to scan prefix: {}", e)))?;
            let key_str = String::from_utf8_lossy(&key).to_string();
            let item = serde_json::from_slice(&value).map_err(|e| {
                FormFoldError::Serialization(format!(
                    "Deserialization failed for key '{}': {}",
                    key_str, e
                ))
            })?;
            items.push(item);
        }
        Ok(items)
    }

    /// Counts items under a key prefix in a tree
    pub fn count_items_with_prefix(&self, tree: &sled::Tree, prefix: &str) -> FormFoldResult<u64> {
        let mut count = 0;
        for result in tree.scan_prefix(prefix.as_bytes()) {
            result.map_err(|e| FormFoldError::Storage(format!("Failed to scan prefix: {}", e)))?;
            count += 1;
        }
        Ok(count)
    }

    /// Removes every key under a prefix, returning how many were deleted
    pub fn delete_items_with_prefix(&self, tree: &sled::Tree, prefix: &str) -> FormFoldResult<u64> {
        let mut keys = Vec::new();
        for result in tree.scan_prefix(prefix.as_bytes()) {
            let (key, _) = result
                .map_err(|e| FormFoldError::Storage(format!("Failed to scan prefix: {}", e)))?;
            keys.push(key);
        }

        let count = keys.len() as u64;
        for key in keys {
            tree.remove(&key)
                .map_err(|e| FormFoldError::Storage(format!("Delete failed: {}", e)))?;
        }
        tree.flush()
            .map_err(|e| FormFoldError::Storage(format!("Flush failed: {}", e)))?;

        Ok(count)
    }

    /// Gets record counts per collection
    pub fn get_stats(&self) -> FormFoldResult<HashMap<String, u64>> {
        let mut stats = HashMap::new();
        stats.insert("schemas".to_string(), self.schemas_tree.len() as u64);
        stats.insert(
            "share_tokens".to_string(),
            self.share_tokens_tree.len() as u64,
        );
        stats.insert(
            "submissions".to_string(),
            self.submissions_tree.len() as u64,
        );
        stats.insert(
            "attachments".to_string(),
            self.attachments_tree.len() as u64,
        );
        stats.insert(
            "temp_uploads".to_string(),
            self.temp_uploads_tree.len() as u64,
        );
        stats.insert("exports".to_string(), self.exports_tree.len() as u64);
        Ok(stats)
    }
}

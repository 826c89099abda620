//! Export job persistence.

use super::core::DbOperations;
use crate::error::FormFoldResult;
use crate::export::types::ExportJob;

impl DbOperations {
    /// Stores an export job record
    pub fn store_export_job(&self, job: &ExportJob) -> FormFoldResult<()> {
        self.store_in_tree(&self.exports_tree, &job.id, job)
    }

    /// Gets an export job by id. Expiry is the lifecycle manager's
    /// concern; this returns the row as stored.
    pub fn get_export_job(&self, export_id: &str) -> FormFoldResult<Option<ExportJob>> {
        self.get_from_tree(&self.exports_tree, export_id)
    }

    /// Deletes an export job row
    pub fn delete_export_job(&self, export_id: &str) -> FormFoldResult<bool> {
        self.delete_from_tree(&self.exports_tree, export_id)
    }

    /// Lists all export job rows
    pub fn list_export_jobs(&self) -> FormFoldResult<Vec<ExportJob>> {
        let items: Vec<(String, ExportJob)> = self.list_items_in_tree(&self.exports_tree)?;
        Ok(items.into_iter().map(|(_, job)| job).collect())
    }

    /// Lists all export job rows for one schema
    pub fn list_export_jobs_for_schema(&self, schema_id: &str) -> FormFoldResult<Vec<ExportJob>> {
        Ok(self
            .list_export_jobs()?
            .into_iter()
            .filter(|job| job.schema_id == schema_id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> DbOperations {
        let db = sled::Config::new().temporary(true).open().unwrap();
        DbOperations::new(db).unwrap()
    }

    #[test]
    fn export_jobs_listed_per_schema() {
        let ops = test_db();
        ops.store_export_job(&ExportJob::new("schema-a", "a1.csv", "/e/a1.csv", 60))
            .unwrap();
        ops.store_export_job(&ExportJob::new("schema-a", "a2.csv", "/e/a2.csv", 60))
            .unwrap();
        ops.store_export_job(&ExportJob::new("schema-b", "b1.csv", "/e/b1.csv", 60))
            .unwrap();

        assert_eq!(ops.list_export_jobs().unwrap().len(), 3);
        assert_eq!(ops.list_export_jobs_for_schema("schema-a").unwrap().len(), 2);
    }

    #[test]
    fn export_job_round_trip_and_delete() {
        let ops = test_db();
        let job = ExportJob::new("schema-a", "a.csv", "/e/a.csv", 60);
        ops.store_export_job(&job).unwrap();
        assert_eq!(ops.get_export_job(&job.id).unwrap(), Some(job.clone()));
        assert!(ops.delete_export_job(&job.id).unwrap());
        assert!(ops.get_export_job(&job.id).unwrap().is_none());
    }
}

//! Shared fixture for integration tests.

use formfold::{FormFold, FormFoldConfig};
use tempfile::TempDir;

pub struct TestFixture {
    pub fold: FormFold,
    // keeps the temp directory alive for the test's duration
    pub temp_dir: TempDir,
}

impl TestFixture {
    pub fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let temp_dir = tempfile::tempdir().expect("failed to create temp directory");
        let config = FormFoldConfig::rooted_at(temp_dir.path());
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .expect("failed to open temporary database");
        let fold = FormFold::with_db(config, db).expect("failed to initialize FormFold");
        Self { fold, temp_dir }
    }
}

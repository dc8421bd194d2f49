//! Common test utilities for integration tests.
//!
//! Each [`TestStore`] owns a temporary directory holding one store file.
//! Tests that simulate several processes open one [`Database`] per thread
//! against the same file.

pub mod fixtures;

use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;

use holdfast::database::{Database, DatabaseConfig};

/// A store file in a temporary directory, removed when dropped.
pub struct TestStore {
    dir: TempDir,
}

#[allow(dead_code)]
impl TestStore {
    /// Creates the directory and initializes the schema.
    pub fn new() -> Self {
        let store = Self {
            dir: tempfile::tempdir().unwrap(),
        };
        // Create the schema before any concurrent opener races for it
        drop(store.open());
        store
    }

    /// Path of the data directory.
    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Connection settings for the store file.
    pub fn config(&self) -> DatabaseConfig {
        DatabaseConfig::new(self.dir.path().join("holdfast.db"))
    }

    /// Opens a connection with the default lock wait.
    pub fn open(&self) -> Database {
        Database::open(self.config()).unwrap()
    }

    /// Opens a connection that waits long enough for heavy contention.
    pub fn open_patient(&self) -> Database {
        Database::open(self.config().with_busy_timeout(Duration::from_secs(30))).unwrap()
    }
}

//! Database configuration and connection parameters.
//!
//! This module provides configuration types for database connections,
//! including path resolution and the lock wait bound.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// File name of the store inside the data directory.
pub const DATABASE_FILE_NAME: &str = "holdfast.db";

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "HOLDFAST_DATA_DIR";

/// Configuration for database connections.
///
/// This struct contains all parameters needed to open and configure
/// a database connection, including the database file path, the lock
/// wait bound, and access modes.
///
/// # Examples
///
/// ```
/// use holdfast::database::DatabaseConfig;
/// use std::time::Duration;
///
/// // Create a configuration with default settings
/// let config = DatabaseConfig::new("/tmp/holdfast.db");
///
/// // Wait longer for the write lock
/// let config = DatabaseConfig::new("/tmp/holdfast.db")
///     .with_busy_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the database file.
    pub path: PathBuf,
    /// How long a write waits for the lock before failing with
    /// [`Error::LockTimeout`].
    pub busy_timeout: Duration,
    /// Whether to automatically create the database if it doesn't exist.
    pub auto_create: bool,
    /// Whether to open the database in read-only mode.
    pub read_only: bool,
}

impl DatabaseConfig {
    /// Creates a new database configuration with default settings.
    ///
    /// Default settings:
    /// - `busy_timeout`: 5000ms
    /// - `auto_create`: true
    /// - `read_only`: false
    ///
    /// # Examples
    ///
    /// ```
    /// use holdfast::database::DatabaseConfig;
    ///
    /// let config = DatabaseConfig::new("/tmp/holdfast.db");
    /// assert_eq!(config.path.to_str().unwrap(), "/tmp/holdfast.db");
    /// ```
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            busy_timeout: Duration::from_millis(5000),
            auto_create: true,
            read_only: false,
        }
    }

    /// Sets the lock wait bound.
    #[must_use]
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Refuses to create a missing database file.
    #[must_use]
    pub fn no_create(mut self) -> Self {
        self.auto_create = false;
        self
    }

    /// Configures the database to be opened in read-only mode.
    ///
    /// When read-only is enabled, `auto_create` is automatically disabled.
    ///
    /// # Examples
    ///
    /// ```
    /// use holdfast::database::DatabaseConfig;
    ///
    /// let config = DatabaseConfig::new("/tmp/holdfast.db").read_only();
    /// assert!(config.read_only);
    /// assert!(!config.auto_create);
    /// ```
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self.auto_create = false;
        self
    }
}

/// Returns the default data directory, `~/.holdfast`.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn default_data_dir() -> Result<PathBuf> {
    let home = home::home_dir().ok_or_else(|| Error::Validation {
        field: "home_directory".into(),
        message: "Cannot determine home directory".into(),
    })?;
    Ok(home.join(".holdfast"))
}

/// Resolves the data directory: `$HOLDFAST_DATA_DIR` if set, else `~/.holdfast`.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined and
/// `HOLDFAST_DATA_DIR` is not set.
pub fn resolve_data_dir() -> Result<PathBuf> {
    match std::env::var(DATA_DIR_ENV) {
        Ok(data_dir) => Ok(PathBuf::from(data_dir)),
        Err(_) => default_data_dir(),
    }
}

/// Resolves the database path using environment variables or defaults.
///
/// The resolution order is:
/// 1. `$HOLDFAST_DATA_DIR/holdfast.db` if `HOLDFAST_DATA_DIR` is set
/// 2. `~/.holdfast/holdfast.db` otherwise
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined and
/// `HOLDFAST_DATA_DIR` is not set.
///
/// # Examples
///
/// ```no_run
/// use holdfast::database::resolve_database_path;
///
/// let db_path = resolve_database_path().unwrap();
/// println!("Database path: {}", db_path.display());
/// ```
pub fn resolve_database_path() -> Result<PathBuf> {
    Ok(resolve_data_dir()?.join(DATABASE_FILE_NAME))
}

//! Store initialization.
//!
//! Creates the data directory and the schema, optionally alongside a
//! commented `config.yaml` listing every setting at its default.

use std::fs;
use std::path::PathBuf;

use crate::config::CONFIG_FILE_NAME;
use crate::database::{Database, DatabaseConfig, DATABASE_FILE_NAME};
use crate::error::{Error, Result};

/// Options for store initialization.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Data directory to initialize.
    pub data_dir: PathBuf,
    /// Replace an existing store file.
    pub overwrite: bool,
    /// Write a default configuration file.
    pub create_config: bool,
}

impl InitOptions {
    /// Creates options for `data_dir`.
    #[must_use]
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            overwrite: false,
            create_config: false,
        }
    }

    /// Sets whether an existing store is replaced.
    #[must_use]
    pub const fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Sets whether a default configuration file is written.
    #[must_use]
    pub const fn with_create_config(mut self, create_config: bool) -> Self {
        self.create_config = create_config;
        self
    }
}

/// What initialization did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitResult {
    /// The data directory did not exist before.
    pub data_dir_created: bool,
    /// The store file was created or recreated.
    pub database_created: bool,
    /// A configuration file was written.
    pub config_created: bool,
    /// The initialized data directory.
    pub data_dir: PathBuf,
}

const DEFAULT_CONFIG_TEMPLATE: &str = r"# holdfast configuration
# Every setting is optional; the values shown are the defaults.

# Age in seconds after which an unpaid reservation is expired
# hold_timeout_seconds: 300

# Seconds between two expiration sweeps
# sweep_interval_seconds: 60

# rollover:
#   horizon_days: 30     # dates kept bookable ahead of today (1..=365)
#   interval_hours: 24

# Seconds a writer waits for the store's write lock
# maximum_lock_wait_seconds: 5

# human | json | csv
# output_format: human
";

/// Creates the data directory and store.
///
/// # Errors
///
/// Returns an error if:
/// - The data directory cannot be created
/// - A store already exists and `overwrite` is not set
/// - The store cannot be opened or its schema created
/// - The configuration file cannot be written
///
/// # Examples
///
/// ```no_run
/// use std::path::PathBuf;
/// use holdfast::operations::init::{init_database, InitOptions};
///
/// let options = InitOptions::new(PathBuf::from("/tmp/holdfast")).with_create_config(true);
/// let result = init_database(&options).unwrap();
/// assert!(result.database_created);
/// ```
pub fn init_database(options: &InitOptions) -> Result<InitResult> {
    let mut result = InitResult {
        data_dir_created: false,
        database_created: false,
        config_created: false,
        data_dir: options.data_dir.clone(),
    };

    if !options.data_dir.exists() {
        fs::create_dir_all(&options.data_dir)?;
        result.data_dir_created = true;
    }

    let db_path = options.data_dir.join(DATABASE_FILE_NAME);
    if db_path.exists() {
        if !options.overwrite {
            return Err(Error::Validation {
                field: "database".into(),
                message: format!(
                    "store already exists at {}; use --overwrite to replace it",
                    db_path.display()
                ),
            });
        }
        fs::remove_file(&db_path)?;
        for suffix in ["-wal", "-shm"] {
            let sidecar = options.data_dir.join(format!("{DATABASE_FILE_NAME}{suffix}"));
            if sidecar.exists() {
                fs::remove_file(sidecar)?;
            }
        }
    }

    Database::open(DatabaseConfig::new(&db_path))?;
    result.database_created = true;
    log::info!("initialized store at {}", db_path.display());

    if options.create_config {
        let config_path = options.data_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)?;
            result.config_created = true;
        }
    }

    Ok(result)
}

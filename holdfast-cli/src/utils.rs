//! Utility functions for CLI operations.
//!
//! This module provides the helpers every command shares: locating the data
//! directory, loading configuration, opening the store, and writing
//! listings in the selected output format.

use crate::error::CliError;
use chrono::NaiveDate;
use holdfast::database::{resolve_data_dir, DATABASE_FILE_NAME};
use holdfast::{
    Config, ConfigBuilder, Database, DatabaseConfig, OutputFormat, ReservationId, StayPeriod,
};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

/// Global CLI options shared across all commands.
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    /// Enable verbose output.
    pub verbose: bool,

    /// Suppress non-essential output.
    pub quiet: bool,

    /// Override the data directory location.
    pub data_dir: Option<PathBuf>,

    /// Override the configured lock wait (in seconds).
    pub busy_timeout: Option<u32>,

    /// Disable automatic store initialization.
    pub disable_autoinit: bool,
}

/// Resolve the data directory: `--data-dir`, then `HOLDFAST_DATA_DIR`, then `~/.holdfast`.
pub fn data_dir(global: &GlobalOptions) -> Result<PathBuf, CliError> {
    match global.data_dir {
        Some(ref dir) => Ok(dir.clone()),
        None => resolve_data_dir().map_err(|e| CliError::Config(e.to_string())),
    }
}

/// Load layered configuration.
///
/// Configuration is merged from multiple sources with precedence:
/// 1. Environment variables
/// 2. `config.yaml` in the data directory
/// 3. Built-in defaults
pub fn load_configuration(global: &GlobalOptions) -> Result<Config, CliError> {
    let dir = data_dir(global)?;
    ConfigBuilder::new()
        .with_data_dir(&dir)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))
}

/// Store connection settings for the resolved data directory.
///
/// The busy timeout comes from `--busy-timeout` if given, else from the
/// configured maximum lock wait.
pub fn database_config(
    global: &GlobalOptions,
    config: &Config,
) -> Result<DatabaseConfig, CliError> {
    let db_path = data_dir(global)?.join(DATABASE_FILE_NAME);

    let busy_timeout = global
        .busy_timeout
        .map_or_else(|| config.lock_wait(), |seconds| Duration::from_secs(seconds.into()));

    let mut db_config = DatabaseConfig::new(db_path).with_busy_timeout(busy_timeout);
    if global.disable_autoinit {
        db_config = db_config.no_create();
    }
    Ok(db_config)
}

/// Open the store.
///
/// # Errors
///
/// Returns `NoDataDirectory` if the store doesn't exist and auto-init is disabled.
pub fn open_database(global: &GlobalOptions, config: &Config) -> Result<Database, CliError> {
    let db_config = database_config(global, config)?;
    Database::open(db_config).map_err(CliError::from)
}

/// Format a timestamp for display.
pub fn format_timestamp(ts: std::time::SystemTime) -> String {
    use chrono::{DateTime, Utc};
    let dt: DateTime<Utc> = ts.into();
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Format an amount in minor currency units as `units.cents`.
pub fn format_amount(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

/// Build a period from `--from`/`--to`, or a single day from `--from` alone.
pub fn period_from_args(from: NaiveDate, to: Option<NaiveDate>) -> Result<StayPeriod, CliError> {
    match to {
        Some(to) => Ok(StayPeriod::new(from, to)?),
        None => Ok(StayPeriod::single_day(from)?),
    }
}

/// Parse a reservation id argument.
pub fn parse_reservation_id(s: &str) -> Result<ReservationId, String> {
    ReservationId::new(s).map_err(|e| e.message)
}

/// Pick the listing format: the command flag, else the configured default.
pub fn output_format(flag: Option<OutputFormat>, config: &Config) -> OutputFormat {
    flag.unwrap_or_else(|| config.output_format())
}

/// Convert csv::Error to CliError.
fn csv_error(e: csv::Error) -> CliError {
    CliError::Io(std::io::Error::other(e))
}

/// A listing that can be rendered as a table, JSON, or CSV.
///
/// `rows` and `json` describe the same records; the table and CSV renderers
/// use `rows`, the JSON renderer uses `json`.
pub struct Listing<'a> {
    /// Column names, lowercase.
    pub headers: &'a [&'a str],
    /// One cell per column for each record.
    pub rows: Vec<Vec<String>>,
    /// The records as JSON objects.
    pub json: Vec<serde_json::Value>,
}

impl Listing<'_> {
    /// Write the listing to stdout.
    pub fn print(&self, format: OutputFormat) -> Result<(), CliError> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        self.write_to(&mut handle, format)
    }

    /// Write the listing to `out`.
    pub fn write_to<W: Write>(&self, out: &mut W, format: OutputFormat) -> Result<(), CliError> {
        match format {
            OutputFormat::Human => {
                let header_line = self
                    .headers
                    .iter()
                    .map(|s| s.to_uppercase())
                    .collect::<Vec<_>>()
                    .join("\t");
                writeln!(out, "{header_line}")?;
                for row in &self.rows {
                    let cells: Vec<&str> = row
                        .iter()
                        .map(|cell| if cell.is_empty() { "-" } else { cell.as_str() })
                        .collect();
                    writeln!(out, "{}", cells.join("\t"))?;
                }
            }
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *out, &self.json)
                    .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
                writeln!(out)?;
            }
            OutputFormat::Csv => {
                let mut writer = csv::WriterBuilder::new().from_writer(&mut *out);
                writer.write_record(self.headers).map_err(csv_error)?;
                for row in &self.rows {
                    writer.write_record(row).map_err(csv_error)?;
                }
                writer.flush()?;
            }
        }
        Ok(())
    }
}

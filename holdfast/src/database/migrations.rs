//! Database schema management and migrations.
//!
//! This module handles database schema initialization, version checking,
//! and migrations.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::error::{Error, Result};

use super::schema::{
    CREATE_ACTOR_INDEX, CREATE_BOOKABLE_UNITS_TABLE, CREATE_DATE_INVENTORY_TABLE,
    CREATE_DISCRETE_UNITS_TABLE, CREATE_HOLDS_TABLE, CREATE_HOLDS_UNIT_INDEX,
    CREATE_METADATA_TABLE, CREATE_PAYMENTS_TABLE, CREATE_PAYMENT_REF_INDEX,
    CREATE_RESERVATIONS_TABLE, CREATE_SEQUENCE_COUNTERS_TABLE, CREATE_STATUS_CREATED_INDEX,
    CURRENT_SCHEMA_VERSION, INSERT_SCHEMA_VERSION, SELECT_SCHEMA_VERSION,
};

/// Initializes the database schema.
///
/// All tables, indices, and the version row are created in one immediate
/// transaction, so several processes opening a fresh file at once end up
/// with a single consistent schema.
///
/// # Errors
///
/// Returns an error if any SQL statement fails to execute.
///
/// # Examples
///
/// ```no_run
/// use rusqlite::Connection;
/// use holdfast::database::migrations::initialize_schema;
///
/// let conn = Connection::open_in_memory().unwrap();
/// initialize_schema(&conn).unwrap();
/// ```
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;

    tx.execute(CREATE_METADATA_TABLE, [])?;

    tx.execute(CREATE_BOOKABLE_UNITS_TABLE, [])?;
    tx.execute(CREATE_DATE_INVENTORY_TABLE, [])?;
    tx.execute(CREATE_DISCRETE_UNITS_TABLE, [])?;
    tx.execute(CREATE_RESERVATIONS_TABLE, [])?;
    tx.execute(CREATE_HOLDS_TABLE, [])?;
    tx.execute(CREATE_SEQUENCE_COUNTERS_TABLE, [])?;
    tx.execute(CREATE_PAYMENTS_TABLE, [])?;

    tx.execute(CREATE_ACTOR_INDEX, [])?;
    tx.execute(CREATE_PAYMENT_REF_INDEX, [])?;
    tx.execute(CREATE_STATUS_CREATED_INDEX, [])?;
    tx.execute(CREATE_HOLDS_UNIT_INDEX, [])?;

    tx.execute(INSERT_SCHEMA_VERSION, [CURRENT_SCHEMA_VERSION])?;

    tx.commit()?;
    Ok(())
}

/// Gets the current schema version from the database.
///
/// # Errors
///
/// Returns an error if the query fails for reasons other than
/// "no rows returned" or a missing metadata table (both mean version 0).
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
    match conn.query_row(SELECT_SCHEMA_VERSION, [], |row| {
        let value: String = row.get(0)?;
        value.parse::<i32>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
    }) {
        Ok(version) => Ok(version),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(rusqlite::Error::SqliteFailure(ref failure, Some(ref message)))
            if failure.code == rusqlite::ErrorCode::Unknown
                && message.contains("no such table") =>
        {
            Ok(0)
        }
        Err(e) => Err(e.into()),
    }
}

/// Checks schema compatibility and initializes if needed.
///
/// A fresh database is initialized; any version other than
/// [`CURRENT_SCHEMA_VERSION`] is rejected.
///
/// # Errors
///
/// Returns an error if the schema version is incompatible, or if
/// initialization or the version query fails.
pub fn check_schema_compatibility(conn: &Connection) -> Result<()> {
    let version = get_schema_version(conn)?;

    if version == 0 {
        initialize_schema(conn)?;
    } else if version != CURRENT_SCHEMA_VERSION {
        #[allow(clippy::cast_sign_loss)]
        return Err(Error::UnsupportedSchemaVersion {
            expected: CURRENT_SCHEMA_VERSION as u32,
            found: version.max(0) as u32,
        });
    }

    Ok(())
}

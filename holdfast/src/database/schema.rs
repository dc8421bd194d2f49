//! Database schema definitions and SQL constants.
//!
//! This module contains all SQL table definitions, indices, and constants
//! related to the database schema for the holdfast engine.

/// Current schema version for the database.
///
/// This version is stored in the metadata table and is used to ensure
/// compatibility between the database and the application.
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// SQL statement to create the metadata table.
pub const CREATE_METADATA_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS metadata (
        key TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL
    )";

/// Catalog of dated units. Rollover seeds `date_inventory` from here.
pub const CREATE_BOOKABLE_UNITS_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS bookable_units (
        unit_id TEXT PRIMARY KEY NOT NULL,
        target_type TEXT NOT NULL,
        baseline_capacity INTEGER NOT NULL,
        active INTEGER NOT NULL DEFAULT 1,
        created_at INTEGER NOT NULL
    )";

/// Per-unit, per-date availability.
///
/// The CHECK constraints back up the ledger's conditional updates: a
/// decrement below zero or an increment past capacity fails the statement.
pub const CREATE_DATE_INVENTORY_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS date_inventory (
        unit_id TEXT NOT NULL,
        stay_date TEXT NOT NULL,
        remaining INTEGER NOT NULL CHECK (remaining >= 0),
        capacity INTEGER NOT NULL CHECK (capacity >= 0),
        available INTEGER NOT NULL DEFAULT 1,
        PRIMARY KEY (unit_id, stay_date),
        CHECK (remaining <= capacity)
    )";

/// Physical seats, keyed per parent trip so seat numbers repeat across trips.
/// `held_by` is the reservation id, NULL when free.
pub const CREATE_DISCRETE_UNITS_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS discrete_units (
        parent_id TEXT NOT NULL,
        unit_id TEXT NOT NULL,
        seat_class TEXT NOT NULL,
        held_by TEXT,
        PRIMARY KEY (parent_id, unit_id)
    )";

/// SQL statement to create the reservations table.
pub const CREATE_RESERVATIONS_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS reservations (
        id TEXT PRIMARY KEY NOT NULL,
        actor_id TEXT NOT NULL,
        target_type TEXT NOT NULL,
        target_id TEXT NOT NULL,
        check_in TEXT,
        check_out TEXT,
        quantity INTEGER NOT NULL,
        unit_price INTEGER NOT NULL,
        total_price INTEGER NOT NULL,
        status TEXT NOT NULL,
        status_reason TEXT,
        payment_ref TEXT,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        confirmed_at INTEGER
    )";

/// SQL statement to create an index on the actor column.
pub const CREATE_ACTOR_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_reservations_actor ON reservations(actor_id)";

/// A payment settles at most one reservation.
pub const CREATE_PAYMENT_REF_INDEX: &str = r"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_reservations_payment_ref
    ON reservations(payment_ref) WHERE payment_ref IS NOT NULL
";

/// Speeds up the reconciler's scan for stale pending reservations.
pub const CREATE_STATUS_CREATED_INDEX: &str = r"
    CREATE INDEX IF NOT EXISTS idx_reservations_status_created
    ON reservations(status, created_at)
";

/// Inventory taken by each reservation.
///
/// `stay_date` is the empty string for seats so the primary key never
/// contains NULL.
pub const CREATE_HOLDS_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS reservation_holds (
        reservation_id TEXT NOT NULL REFERENCES reservations(id),
        unit_id TEXT NOT NULL,
        stay_date TEXT NOT NULL DEFAULT '',
        quantity INTEGER NOT NULL,
        released_at INTEGER,
        PRIMARY KEY (reservation_id, unit_id, stay_date)
    )";

/// Lets rollover find live holds on a date row quickly.
pub const CREATE_HOLDS_UNIT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_holds_unit_date ON reservation_holds(unit_id, stay_date)";

/// SQL statement to create the sequence counter table.
pub const CREATE_SEQUENCE_COUNTERS_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS sequence_counters (
        date_key TEXT NOT NULL,
        category TEXT NOT NULL,
        next_value INTEGER NOT NULL,
        PRIMARY KEY (date_key, category)
    )";

/// Payments recorded by the bundled payment ledger.
pub const CREATE_PAYMENTS_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS payments (
        merchant_id TEXT PRIMARY KEY NOT NULL,
        reservation_id TEXT,
        amount INTEGER NOT NULL,
        refunded_amount INTEGER NOT NULL DEFAULT 0,
        status TEXT NOT NULL,
        updated_at INTEGER NOT NULL
    )";

/// SQL statement to select the schema version from the metadata table.
pub const SELECT_SCHEMA_VERSION: &str = "SELECT value FROM metadata WHERE key = 'schema_version'";

/// SQL statement to insert or update the schema version in the metadata table.
pub const INSERT_SCHEMA_VERSION: &str =
    "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?)";

/// SQL statement to insert a reservation row.
pub const INSERT_RESERVATION: &str = r"
    INSERT INTO reservations
    (id, actor_id, target_type, target_id, check_in, check_out, quantity,
     unit_price, total_price, status, status_reason, payment_ref,
     created_at, updated_at, confirmed_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
";

/// Column list matching `row_to_reservation`.
pub const RESERVATION_COLUMNS: &str = r"
    id, actor_id, target_type, target_id, check_in, check_out, quantity,
    unit_price, total_price, status, status_reason, payment_ref,
    created_at, updated_at, confirmed_at
";

/// SQL statement to insert a hold row.
pub const INSERT_HOLD: &str = r"
    INSERT INTO reservation_holds (reservation_id, unit_id, stay_date, quantity)
    VALUES (?, ?, ?, ?)
";

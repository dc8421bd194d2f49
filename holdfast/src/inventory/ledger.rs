//! The inventory ledger: atomic reserve and release of dated rows and seats.
//!
//! Every decrement is a single conditional `UPDATE` whose `WHERE` clause
//! re-checks availability, so the check and the write can never be split by
//! another writer. A multi-date reserve runs inside a savepoint: if date `k`
//! is short, the decrements already applied to dates `1..k` are undone
//! before the error is returned.

use std::collections::HashSet;
use std::time::SystemTime;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use crate::database::{date_to_sql, sql_to_date, systemtime_to_unix_secs, Database};
use crate::error::{Error, Result};
use crate::reservation::TargetType;

use super::{BookableUnit, DateInventory, DiscreteUnit, Hold, SeatClass, StayPeriod};

const DECREMENT_DATE: &str = r"
    UPDATE date_inventory
    SET remaining = remaining - ?1
    WHERE unit_id = ?2 AND stay_date = ?3 AND available = 1 AND remaining >= ?1
";

const INCREMENT_DATE: &str = r"
    UPDATE date_inventory
    SET remaining = MIN(capacity, remaining + ?1)
    WHERE unit_id = ?2 AND stay_date = ?3
";

const SELECT_DATE_ROW: &str = r"
    SELECT unit_id, stay_date, remaining, capacity, available
    FROM date_inventory
    WHERE unit_id = ? AND stay_date = ?
";

const SELECT_DATE_RANGE: &str = r"
    SELECT unit_id, stay_date, remaining, capacity, available
    FROM date_inventory
    WHERE unit_id = ? AND stay_date >= ? AND stay_date < ?
    ORDER BY stay_date
";

const INSERT_DATE_ROW: &str = r"
    INSERT OR IGNORE INTO date_inventory (unit_id, stay_date, remaining, capacity, available)
    VALUES (?1, ?2, ?3, ?3, 1)
";

const SET_DATE_AVAILABLE: &str =
    "UPDATE date_inventory SET available = ? WHERE unit_id = ? AND stay_date = ?";

const UPSERT_UNIT: &str = r"
    INSERT INTO bookable_units (unit_id, target_type, baseline_capacity, active, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5)
    ON CONFLICT(unit_id) DO UPDATE SET
        target_type = excluded.target_type,
        baseline_capacity = excluded.baseline_capacity,
        active = excluded.active
";

const SELECT_UNIT: &str = r"
    SELECT unit_id, target_type, baseline_capacity, active
    FROM bookable_units
    WHERE unit_id = ?
";

const SELECT_UNITS: &str = r"
    SELECT unit_id, target_type, baseline_capacity, active
    FROM bookable_units
    ORDER BY unit_id
";

const HOLD_SEAT: &str = r"
    UPDATE discrete_units
    SET held_by = ?1
    WHERE unit_id = ?2 AND parent_id = ?3 AND held_by IS NULL
";

// A reservation holds seats of a single trip, so the holder pins the parent.
const RELEASE_SEAT: &str =
    "UPDATE discrete_units SET held_by = NULL WHERE unit_id = ? AND held_by = ?";

const INSERT_SEAT: &str = r"
    INSERT OR IGNORE INTO discrete_units (parent_id, unit_id, seat_class, held_by)
    VALUES (?, ?, ?, NULL)
";

const SELECT_SEAT: &str = r"
    SELECT unit_id, parent_id, seat_class, held_by
    FROM discrete_units
    WHERE parent_id = ? AND unit_id = ?
";

const SELECT_SEATS: &str = r"
    SELECT unit_id, parent_id, seat_class, held_by
    FROM discrete_units
    WHERE parent_id = ?
    ORDER BY unit_id
";

const UNIT_KNOWN: &str = r"
    SELECT EXISTS (SELECT 1 FROM bookable_units WHERE unit_id = ?1)
        OR EXISTS (SELECT 1 FROM date_inventory WHERE unit_id = ?1)
";

/// Rows before the cutoff that no live reservation still holds.
const PURGEABLE_CONDITION: &str = r"
    stay_date < ?1 AND NOT EXISTS (
        SELECT 1
        FROM reservation_holds h
        JOIN reservations r ON r.id = h.reservation_id
        WHERE h.unit_id = date_inventory.unit_id
          AND h.stay_date = date_inventory.stay_date
          AND h.released_at IS NULL
          AND r.status IN ('PENDING', 'CONFIRMED', 'PARTIALLY_REFUNDED')
    )
";

fn row_to_date_inventory(row: &rusqlite::Row<'_>) -> rusqlite::Result<DateInventory> {
    let stay_date: String = row.get(1)?;
    Ok(DateInventory {
        unit_id: row.get(0)?,
        date: sql_to_date(&stay_date, 1)?,
        remaining: row.get(2)?,
        capacity: row.get(3)?,
        available: row.get(4)?,
    })
}

fn row_to_unit(row: &rusqlite::Row<'_>) -> rusqlite::Result<BookableUnit> {
    let target_type: String = row.get(1)?;
    Ok(BookableUnit {
        unit_id: row.get(0)?,
        target_type: target_type.parse().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?,
        baseline_capacity: row.get(2)?,
        active: row.get(3)?,
    })
}

fn row_to_seat(row: &rusqlite::Row<'_>) -> rusqlite::Result<DiscreteUnit> {
    let seat_class: String = row.get(2)?;
    Ok(DiscreteUnit {
        unit_id: row.get(0)?,
        parent_id: row.get(1)?,
        seat_class: seat_class.parse().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?,
        held_by: row.get(3)?,
    })
}

/// Runs `f` inside a named savepoint, rolling back to it on error.
fn within_savepoint<T>(conn: &Connection, name: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    conn.execute_batch(&format!("SAVEPOINT {name}"))?;
    match f() {
        Ok(value) => {
            conn.execute_batch(&format!("RELEASE {name}"))?;
            Ok(value)
        }
        Err(err) => {
            let rollback_sql = format!("ROLLBACK TO {name}; RELEASE {name}");
            if let Err(rollback) = conn.execute_batch(&rollback_sql) {
                log::warn!("rolling back savepoint {name} failed: {rollback}");
            }
            Err(err)
        }
    }
}

fn positive_quantity(quantity: u32) -> Result<()> {
    if quantity == 0 {
        return Err(Error::Validation {
            field: "quantity".into(),
            message: "quantity must be at least 1".into(),
        });
    }
    Ok(())
}

/// Reserves and releases inventory in the shared store.
///
/// All methods take a [`Connection`]; pass the transaction handed out by
/// [`Database::write`] so the check and the write share one lock scope.
///
/// # Examples
///
/// ```no_run
/// use chrono::NaiveDate;
/// use holdfast::database::{Database, DatabaseConfig};
/// use holdfast::inventory::{BookableUnit, InventoryLedger, StayPeriod};
/// use holdfast::TargetType;
///
/// let mut db = Database::open(DatabaseConfig::new("/tmp/holdfast.db")).unwrap();
/// let period = StayPeriod::new(
///     NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
///     NaiveDate::from_ymd_opt(2026, 10, 21).unwrap(),
/// ).unwrap();
///
/// db.write(|tx| {
///     InventoryLedger::register_unit(tx, &BookableUnit::new("deluxe", TargetType::Room, 4)?)?;
///     InventoryLedger::materialize_dates(tx, "deluxe", period, None)?;
///     InventoryLedger::reserve_dates(tx, "deluxe", period, 2)
/// })
/// .unwrap();
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryLedger;

impl InventoryLedger {
    /// Adds a unit to the catalog, or updates its type, baseline, and flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn register_unit(conn: &Connection, unit: &BookableUnit) -> Result<()> {
        conn.execute(
            UPSERT_UNIT,
            params![
                unit.unit_id,
                unit.target_type.as_str(),
                unit.baseline_capacity,
                unit.active,
                systemtime_to_unix_secs(SystemTime::now())?,
            ],
        )?;
        log::debug!(
            "registered {} unit {} with baseline {}",
            unit.target_type,
            unit.unit_id,
            unit.baseline_capacity
        );
        Ok(())
    }

    /// Looks up a catalog entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_unit(conn: &Connection, unit_id: &str) -> Result<Option<BookableUnit>> {
        Ok(conn.query_row(SELECT_UNIT, [unit_id], row_to_unit).optional()?)
    }

    /// Lists the catalog ordered by unit id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_units(conn: &Connection) -> Result<Vec<BookableUnit>> {
        let mut stmt = conn.prepare(SELECT_UNITS)?;
        let units = stmt
            .query_map([], row_to_unit)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(units)
    }

    /// Returns the catalog entry for a dated unit, checking its target type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the unit is not in the catalog or has
    /// a different target type.
    pub fn require_unit(
        conn: &Connection,
        unit_id: &str,
        target_type: TargetType,
    ) -> Result<BookableUnit> {
        match Self::get_unit(conn, unit_id)? {
            Some(unit) if unit.target_type == target_type => Ok(unit),
            _ => Err(Error::NotFound {
                resource: format!("{target_type} unit {unit_id}"),
            }),
        }
    }

    /// Seeds inventory rows for every date of `period` that has none yet.
    ///
    /// Rows are created at `capacity`, or at the unit's baseline when
    /// `capacity` is `None`. Existing rows are left untouched. Returns the
    /// number of rows created.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown unit, a validation error
    /// when no capacity is given and the unit's baseline is not sellable,
    /// or a database error.
    pub fn materialize_dates(
        conn: &Connection,
        unit_id: &str,
        period: StayPeriod,
        capacity: Option<u32>,
    ) -> Result<usize> {
        let unit = Self::get_unit(conn, unit_id)?.ok_or_else(|| Error::NotFound {
            resource: format!("unit {unit_id}"),
        })?;
        let capacity = capacity
            .or_else(|| unit.seed_capacity())
            .ok_or_else(|| Error::Validation {
                field: "capacity".into(),
                message: format!("unit {unit_id} has no sellable baseline capacity"),
            })?;

        let mut stmt = conn.prepare(INSERT_DATE_ROW)?;
        let mut created = 0;
        for date in period.dates() {
            created += stmt.execute(params![unit_id, date_to_sql(date), capacity])?;
        }
        log::debug!("materialized {created} dates for {unit_id} over {period}");
        Ok(created)
    }

    /// Opens or closes one date for new holds. Existing holds are unaffected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the row does not exist.
    pub fn set_availability(
        conn: &Connection,
        unit_id: &str,
        date: NaiveDate,
        available: bool,
    ) -> Result<()> {
        let rows = conn.execute(
            SET_DATE_AVAILABLE,
            params![available, unit_id, date_to_sql(date)],
        )?;
        if rows == 0 {
            return Err(Error::NotFound {
                resource: format!("inventory for {unit_id} on {date}"),
            });
        }
        Ok(())
    }

    /// Returns the materialized rows of a unit within `period`.
    ///
    /// Dates without a row are simply absent from the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn date_inventory(
        conn: &Connection,
        unit_id: &str,
        period: StayPeriod,
    ) -> Result<Vec<DateInventory>> {
        let mut stmt = conn.prepare(SELECT_DATE_RANGE)?;
        let rows = stmt
            .query_map(
                params![
                    unit_id,
                    date_to_sql(period.check_in()),
                    date_to_sql(period.check_out())
                ],
                row_to_date_inventory,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Returns one inventory row.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn date_row(
        conn: &Connection,
        unit_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DateInventory>> {
        Ok(conn
            .query_row(
                SELECT_DATE_ROW,
                params![unit_id, date_to_sql(date)],
                row_to_date_inventory,
            )
            .optional()?)
    }

    /// Takes `quantity` units on every date of `period`, or nothing at all.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if the unit has neither a catalog entry nor any
    ///   inventory row
    /// - [`Error::InsufficientInventory`] if any date is short, closed, or
    ///   not materialized; no date is changed in that case
    pub fn reserve_dates(
        conn: &Connection,
        unit_id: &str,
        period: StayPeriod,
        quantity: u32,
    ) -> Result<()> {
        positive_quantity(quantity)?;

        within_savepoint(conn, "reserve_dates", || {
            let mut stmt = conn.prepare(DECREMENT_DATE)?;
            for date in period.dates() {
                if stmt.execute(params![quantity, unit_id, date_to_sql(date)])? == 0 {
                    return Err(Self::diagnose_shortfall(conn, unit_id, date, quantity));
                }
            }
            Ok(())
        })?;

        log::debug!("reserved {quantity} of {unit_id} over {period}");
        Ok(())
    }

    fn diagnose_shortfall(
        conn: &Connection,
        unit_id: &str,
        date: NaiveDate,
        quantity: u32,
    ) -> Error {
        let row = match Self::date_row(conn, unit_id, date) {
            Ok(row) => row,
            Err(err) => return err,
        };

        let detail = match row {
            Some(row) if !row.available => format!("{date} is closed for booking"),
            Some(row) => format!("{date} has {} remaining, {quantity} requested", row.remaining),
            None => {
                let known = conn.query_row(UNIT_KNOWN, [unit_id], |r| r.get::<_, bool>(0));
                match known {
                    Ok(true) => {}
                    Ok(false) => {
                        return Error::NotFound {
                            resource: format!("unit {unit_id}"),
                        }
                    }
                    Err(err) => return err.into(),
                }
                format!("{date} is not open for booking")
            }
        };

        Error::InsufficientInventory {
            unit_id: unit_id.to_string(),
            detail,
        }
    }

    /// Gives back `quantity` units on every date of `period`.
    ///
    /// Each row saturates at its capacity, and dates whose row no longer
    /// exists are skipped, so a release never fails on already-restored
    /// inventory.
    ///
    /// # Errors
    ///
    /// Returns an error if an update fails.
    pub fn release_dates(
        conn: &Connection,
        unit_id: &str,
        period: StayPeriod,
        quantity: u32,
    ) -> Result<()> {
        let mut stmt = conn.prepare(INCREMENT_DATE)?;
        for date in period.dates() {
            if stmt.execute(params![quantity, unit_id, date_to_sql(date)])? == 0 {
                log::debug!("no inventory row for {unit_id} on {date}, nothing to release");
            }
        }
        log::debug!("released {quantity} of {unit_id} over {period}");
        Ok(())
    }

    /// Adds seats to a parent trip. Seats that already exist are left alone.
    ///
    /// Returns the number of seats created.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty parent or seat id, or a
    /// database error.
    pub fn materialize_seats(
        conn: &Connection,
        parent_id: &str,
        seats: &[(String, SeatClass)],
    ) -> Result<usize> {
        if parent_id.trim().is_empty() {
            return Err(Error::Validation {
                field: "parent_id".into(),
                message: "parent id must be non-empty".into(),
            });
        }
        let mut stmt = conn.prepare(INSERT_SEAT)?;
        let mut created = 0;
        for (seat_id, class) in seats {
            if seat_id.trim().is_empty() {
                return Err(Error::Validation {
                    field: "seat".into(),
                    message: "seat id must be non-empty".into(),
                });
            }
            created += stmt.execute(params![parent_id, seat_id, class.as_str()])?;
        }
        Ok(created)
    }

    /// Lists the seats of a parent trip.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn seats(conn: &Connection, parent_id: &str) -> Result<Vec<DiscreteUnit>> {
        let mut stmt = conn.prepare(SELECT_SEATS)?;
        let seats = stmt
            .query_map([parent_id], row_to_seat)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(seats)
    }

    /// Holds every listed seat of `parent_id` for `holder`, or none of them.
    ///
    /// # Errors
    ///
    /// - Validation error for an empty or duplicated seat list
    /// - [`Error::NotFound`] if a seat does not belong to `parent_id`
    /// - [`Error::InsufficientInventory`] if a seat is already held
    pub fn hold_seats(
        conn: &Connection,
        parent_id: &str,
        seats: &[String],
        holder: &str,
    ) -> Result<()> {
        if seats.is_empty() {
            return Err(Error::Validation {
                field: "seats".into(),
                message: "at least one seat is required".into(),
            });
        }
        let mut seen = HashSet::new();
        if let Some(dup) = seats.iter().find(|s| !seen.insert(s.as_str())) {
            return Err(Error::Validation {
                field: "seats".into(),
                message: format!("seat {dup} requested twice"),
            });
        }

        within_savepoint(conn, "hold_seats", || {
            let mut stmt = conn.prepare(HOLD_SEAT)?;
            for seat_id in seats {
                if stmt.execute(params![holder, seat_id, parent_id])? == 0 {
                    return Err(Self::diagnose_seat(conn, parent_id, seat_id));
                }
            }
            Ok(())
        })?;

        log::debug!("{holder} holds seats {} on {parent_id}", seats.join(","));
        Ok(())
    }

    fn diagnose_seat(conn: &Connection, parent_id: &str, seat_id: &str) -> Error {
        match conn
            .query_row(SELECT_SEAT, [parent_id, seat_id], row_to_seat)
            .optional()
        {
            Ok(Some(_)) => Error::InsufficientInventory {
                unit_id: seat_id.to_string(),
                detail: format!("seat {seat_id} on {parent_id} is already held"),
            },
            Ok(None) => Error::NotFound {
                resource: format!("seat {seat_id} on {parent_id}"),
            },
            Err(err) => err.into(),
        }
    }

    /// Frees a seat if `holder` still holds it. Returns whether it was freed.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn release_seat(conn: &Connection, seat_id: &str, holder: &str) -> Result<bool> {
        let rows = conn.execute(RELEASE_SEAT, params![seat_id, holder])?;
        Ok(rows > 0)
    }

    /// Gives back the inventory recorded by one hold row.
    ///
    /// # Errors
    ///
    /// Returns an error if an update fails.
    pub fn release_hold(conn: &Connection, hold: &Hold) -> Result<()> {
        match hold.date {
            Some(date) => Self::release_dates(
                conn,
                &hold.unit_id,
                StayPeriod::single_day(date)?,
                hold.quantity,
            ),
            None => {
                if !Self::release_seat(conn, &hold.unit_id, &hold.reservation_id)? {
                    log::debug!(
                        "seat {} was not held by {}, nothing to release",
                        hold.unit_id,
                        hold.reservation_id
                    );
                }
                Ok(())
            }
        }
    }

    /// Lists rows dated before `cutoff` that no live reservation holds.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn purgeable_dates(conn: &Connection, cutoff: NaiveDate) -> Result<Vec<DateInventory>> {
        let sql = format!(
            "SELECT unit_id, stay_date, remaining, capacity, available FROM date_inventory
             WHERE {PURGEABLE_CONDITION} ORDER BY stay_date, unit_id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([date_to_sql(cutoff)], row_to_date_inventory)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Deletes rows dated before `cutoff` that no live reservation holds.
    ///
    /// Returns the number of rows deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn purge_dates(conn: &Connection, cutoff: NaiveDate) -> Result<usize> {
        let sql = format!("DELETE FROM date_inventory WHERE {PURGEABLE_CONDITION}");
        Ok(conn.execute(&sql, [date_to_sql(cutoff)])?)
    }
}

impl Database {
    /// Reserves `quantity` of a dated unit over `period` in its own transaction.
    ///
    /// # Errors
    ///
    /// See [`InventoryLedger::reserve_dates`]; additionally
    /// [`Error::LockTimeout`] if the write lock is not obtained in time.
    pub fn reserve(&mut self, unit_id: &str, period: StayPeriod, quantity: u32) -> Result<()> {
        self.write(|tx| InventoryLedger::reserve_dates(tx, unit_id, period, quantity))
    }

    /// Releases `quantity` of a dated unit over `period` in its own transaction.
    ///
    /// # Errors
    ///
    /// See [`InventoryLedger::release_dates`].
    pub fn release(&mut self, unit_id: &str, period: StayPeriod, quantity: u32) -> Result<()> {
        self.write(|tx| InventoryLedger::release_dates(tx, unit_id, period, quantity))
    }
}

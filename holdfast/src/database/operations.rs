//! Database operations for reservation and hold rows.
//!
//! The functions here take a plain [`Connection`] so they can run either
//! standalone or inside a [`Database::write`] transaction (a
//! `rusqlite::Transaction` derefs to a `Connection`).

use std::time::{Duration, SystemTime};

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Error, Result};
use crate::inventory::{Hold, StayPeriod};
use crate::reservation::{Reservation, ReservationId, ReservationStatus, TargetType};

use super::connection::Database;
use super::schema::{INSERT_HOLD, INSERT_RESERVATION, RESERVATION_COLUMNS};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Converts a `SystemTime` to Unix epoch seconds for database storage.
///
/// # Errors
///
/// Returns an error if the time is before the Unix epoch.
#[allow(clippy::cast_possible_wrap)]
pub(crate) fn systemtime_to_unix_secs(time: SystemTime) -> Result<i64> {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .map_err(|e| Error::Validation {
            field: "timestamp".into(),
            message: format!("Invalid timestamp: {e}"),
        })
        .map(|d| d.as_secs() as i64)
}

/// Converts Unix epoch seconds from the database to a `SystemTime`.
#[allow(clippy::cast_sign_loss)]
pub(crate) fn unix_secs_to_systemtime(secs: i64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs.max(0) as u64)
}

/// Formats a date the way the store keeps it (`YYYY-MM-DD`).
pub(crate) fn date_to_sql(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parses a stored date inside a row mapper.
pub(crate) fn sql_to_date(value: &str, column: usize) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

fn conversion_error(
    column: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}

/// Deserializes a reservation from a row selected with [`RESERVATION_COLUMNS`].
fn row_to_reservation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Reservation> {
    let id: String = row.get(0)?;
    let actor_id: String = row.get(1)?;
    let target_type: String = row.get(2)?;
    let target_id: String = row.get(3)?;
    let check_in: Option<String> = row.get(4)?;
    let check_out: Option<String> = row.get(5)?;
    let quantity: u32 = row.get(6)?;
    let unit_price: i64 = row.get(7)?;
    let total_price: i64 = row.get(8)?;
    let status: String = row.get(9)?;
    let status_reason: Option<String> = row.get(10)?;
    let payment_ref: Option<String> = row.get(11)?;
    let created_secs: i64 = row.get(12)?;
    let updated_secs: i64 = row.get(13)?;
    let confirmed_secs: Option<i64> = row.get(14)?;

    let id = ReservationId::new(id).map_err(|e| conversion_error(0, e))?;
    let target_type = target_type
        .parse::<TargetType>()
        .map_err(|e| conversion_error(2, e))?;
    let status = status
        .parse::<ReservationStatus>()
        .map_err(|e| conversion_error(9, e))?;

    let period = match (check_in, check_out) {
        (Some(check_in), Some(check_out)) => Some(
            StayPeriod::new(sql_to_date(&check_in, 4)?, sql_to_date(&check_out, 5)?)
                .map_err(|e| conversion_error(4, e))?,
        ),
        _ => None,
    };

    Reservation::builder(id, target_type, target_id)
        .actor_id(actor_id)
        .period(period)
        .quantity(quantity)
        .unit_price(unit_price)
        .total_price(total_price)
        .status(status)
        .status_reason(status_reason)
        .payment_ref(payment_ref)
        .created_at(unix_secs_to_systemtime(created_secs))
        .updated_at(unix_secs_to_systemtime(updated_secs))
        .confirmed_at(confirmed_secs.map(unix_secs_to_systemtime))
        .build()
        .map_err(|e| conversion_error(0, e))
}

fn row_to_hold(row: &rusqlite::Row<'_>) -> rusqlite::Result<Hold> {
    let reservation_id: String = row.get(0)?;
    let unit_id: String = row.get(1)?;
    let stay_date: String = row.get(2)?;
    let quantity: u32 = row.get(3)?;
    let released_secs: Option<i64> = row.get(4)?;

    let date = if stay_date.is_empty() {
        None
    } else {
        Some(sql_to_date(&stay_date, 2)?)
    };

    Ok(Hold {
        reservation_id,
        unit_id,
        date,
        quantity,
        released_at: released_secs.map(unix_secs_to_systemtime),
    })
}

const UPDATE_STATUS: &str = r"
    UPDATE reservations
    SET status = ?1,
        status_reason = COALESCE(?2, status_reason),
        payment_ref = COALESCE(?3, payment_ref),
        updated_at = ?4,
        confirmed_at = CASE WHEN ?1 = 'CONFIRMED' THEN ?4 ELSE confirmed_at END
    WHERE id = ?5 AND status = ?6
";

const SELECT_HOLDS: &str = r"
    SELECT reservation_id, unit_id, stay_date, quantity, released_at
    FROM reservation_holds
    WHERE reservation_id = ?
    ORDER BY unit_id, stay_date
";

const SELECT_UNRELEASED_HOLDS: &str = r"
    SELECT reservation_id, unit_id, stay_date, quantity, released_at
    FROM reservation_holds
    WHERE reservation_id = ? AND released_at IS NULL
    ORDER BY unit_id, stay_date
";

const MARK_HOLDS_RELEASED: &str = r"
    UPDATE reservation_holds
    SET released_at = ?
    WHERE reservation_id = ? AND released_at IS NULL
";

/// A requested status change, applied only if the row is still in `from`.
#[derive(Debug, Clone)]
pub struct StatusChange<'a> {
    /// Reservation to update.
    pub id: &'a ReservationId,
    /// Status the row must currently have.
    pub from: ReservationStatus,
    /// Status to move to.
    pub to: ReservationStatus,
    /// Reason recorded with the new status; `None` keeps the previous one.
    pub reason: Option<&'a str>,
    /// Payment reference to record; `None` keeps the previous one.
    pub payment_ref: Option<&'a str>,
    /// Time of the change.
    pub at: SystemTime,
}

impl Database {
    /// Inserts a new reservation row.
    ///
    /// # Errors
    ///
    /// Returns an error if a reservation with the same id exists or the
    /// insert fails.
    pub fn insert_reservation(conn: &Connection, reservation: &Reservation) -> Result<()> {
        let period = reservation.period();
        conn.execute(
            INSERT_RESERVATION,
            params![
                reservation.id().as_str(),
                reservation.actor_id(),
                reservation.target_type().as_str(),
                reservation.target_id(),
                period.map(|p| date_to_sql(p.check_in())),
                period.map(|p| date_to_sql(p.check_out())),
                reservation.quantity(),
                reservation.unit_price(),
                reservation.total_price(),
                reservation.status().as_str(),
                reservation.status_reason(),
                reservation.payment_ref(),
                systemtime_to_unix_secs(reservation.created_at())?,
                systemtime_to_unix_secs(reservation.updated_at())?,
                reservation
                    .confirmed_at()
                    .map(systemtime_to_unix_secs)
                    .transpose()?,
            ],
        )?;
        Ok(())
    }

    /// Retrieves a reservation.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(reservation))` if the reservation exists
    /// - `Ok(None)` if it doesn't
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row cannot be decoded.
    pub fn get_reservation(conn: &Connection, id: &ReservationId) -> Result<Option<Reservation>> {
        let sql = format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = ?");
        Ok(conn
            .query_row(&sql, [id.as_str()], row_to_reservation)
            .optional()?)
    }

    /// Retrieves a reservation, failing with [`Error::NotFound`] if absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no row exists, or a database error.
    pub fn require_reservation(conn: &Connection, id: &ReservationId) -> Result<Reservation> {
        Self::get_reservation(conn, id)?.ok_or_else(|| Error::NotFound {
            resource: format!("reservation {id}"),
        })
    }

    /// Lists the reservations of one actor, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row cannot be decoded.
    pub fn list_reservations_by_actor(
        conn: &Connection,
        actor_id: &str,
    ) -> Result<Vec<Reservation>> {
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations \
             WHERE actor_id = ? ORDER BY created_at, id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([actor_id], row_to_reservation)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Lists every reservation, optionally restricted to one status, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row cannot be decoded.
    pub fn list_reservations(
        conn: &Connection,
        status: Option<ReservationStatus>,
    ) -> Result<Vec<Reservation>> {
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations \
             WHERE ?1 IS NULL OR status = ?1 ORDER BY created_at, id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([status.map(ReservationStatus::as_str)], row_to_reservation)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Finds pending reservations created strictly before `cutoff`.
    ///
    /// # Errors
    ///
    /// Returns an error if the timestamp conversion or query fails.
    pub fn find_stale_pending(conn: &Connection, cutoff: SystemTime) -> Result<Vec<ReservationId>> {
        let cutoff = systemtime_to_unix_secs(cutoff)?;
        let mut stmt = conn.prepare(
            "SELECT id FROM reservations \
             WHERE status = 'PENDING' AND created_at < ? ORDER BY created_at, id",
        )?;
        let ids = stmt
            .query_map([cutoff], |row| {
                let id: String = row.get(0)?;
                ReservationId::new(id).map_err(|e| conversion_error(0, e))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }

    /// Returns the reservation that already carries `payment_ref`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn reservation_for_payment(
        conn: &Connection,
        payment_ref: &str,
    ) -> Result<Option<ReservationId>> {
        let id: Option<String> = conn
            .query_row(
                "SELECT id FROM reservations WHERE payment_ref = ?",
                [payment_ref],
                |row| row.get(0),
            )
            .optional()?;
        id.map(ReservationId::new)
            .transpose()
            .map_err(Error::from)
    }

    /// Applies a status change if the row is still in `change.from`.
    ///
    /// This is a compare-and-swap: of two callers racing to move the same
    /// reservation out of the same status, exactly one sees `true`.
    ///
    /// # Errors
    ///
    /// Returns an error if the timestamp conversion or update fails.
    pub fn compare_and_set_status(conn: &Connection, change: &StatusChange<'_>) -> Result<bool> {
        let rows = conn.execute(
            UPDATE_STATUS,
            params![
                change.to.as_str(),
                change.reason,
                change.payment_ref,
                systemtime_to_unix_secs(change.at)?,
                change.id.as_str(),
                change.from.as_str(),
            ],
        )?;
        Ok(rows > 0)
    }

    /// Records inventory taken by a reservation.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_hold(conn: &Connection, hold: &Hold) -> Result<()> {
        conn.execute(
            INSERT_HOLD,
            params![
                hold.reservation_id,
                hold.unit_id,
                hold.date.map(date_to_sql).unwrap_or_default(),
                hold.quantity,
            ],
        )?;
        Ok(())
    }

    /// Lists every hold a reservation ever took, released or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row cannot be decoded.
    pub fn holds_for(conn: &Connection, id: &ReservationId) -> Result<Vec<Hold>> {
        let mut stmt = conn.prepare(SELECT_HOLDS)?;
        let holds = stmt
            .query_map([id.as_str()], row_to_hold)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(holds)
    }

    /// Marks a reservation's unreleased holds as released and returns them.
    ///
    /// A second call returns nothing, so inventory is handed back at most once.
    ///
    /// # Errors
    ///
    /// Returns an error if the query or update fails.
    pub fn take_unreleased_holds(
        conn: &Connection,
        id: &ReservationId,
        at: SystemTime,
    ) -> Result<Vec<Hold>> {
        let holds = conn
            .prepare(SELECT_UNRELEASED_HOLDS)?
            .query_map([id.as_str()], row_to_hold)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        if !holds.is_empty() {
            conn.execute(
                MARK_HOLDS_RELEASED,
                params![systemtime_to_unix_secs(at)?, id.as_str()],
            )?;
        }

        Ok(holds
            .into_iter()
            .map(|hold| Hold {
                released_at: Some(at),
                ..hold
            })
            .collect())
    }
}

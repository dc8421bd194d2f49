//! Transaction management utilities.
//!
//! Every state change in the engine runs through [`Database::write`], which
//! takes the store's write lock up front (`BEGIN IMMEDIATE`). Two writers
//! therefore never interleave, and a writer that cannot get the lock within
//! the configured bound fails with [`Error::LockTimeout`](crate::Error::LockTimeout)
//! instead of deadlocking halfway through.

use rusqlite::{Transaction, TransactionBehavior};

use crate::error::Result;

use super::connection::Database;

impl Database {
    /// Runs `f` inside an immediate transaction and commits on success.
    ///
    /// If `f` returns an error the transaction is rolled back, so every row
    /// it touched is restored. Busy and locked failures are reported as
    /// [`Error::LockTimeout`](crate::Error::LockTimeout).
    ///
    /// # Errors
    ///
    /// Returns the error from `f`, or an error if the transaction cannot be
    /// started or committed.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use holdfast::database::{Database, DatabaseConfig};
    ///
    /// let mut db = Database::open(DatabaseConfig::new("/tmp/holdfast.db")).unwrap();
    /// let count: i64 = db
    ///     .write(|tx| Ok(tx.query_row("SELECT COUNT(*) FROM reservations", [], |r| r.get(0))?))
    ///     .unwrap();
    /// ```
    pub fn write<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let waited = self.busy_timeout();
        let run = |db: &mut Self| -> Result<T> {
            let tx = db
                .conn
                .transaction_with_behavior(TransactionBehavior::Immediate)?;
            let value = f(&tx)?;
            tx.commit()?;
            Ok(value)
        };
        run(self).map_err(|e| e.into_lock_timeout(waited))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::database::test_util::create_test_database;
    use crate::database::DatabaseConfig;
    use crate::Error;
    use tempfile::tempdir;

    #[test]
    fn test_write_commits_on_success() {
        let mut db = create_test_database();
        db.write(|tx| {
            tx.execute(
                "INSERT INTO metadata (key, value) VALUES ('marker', 'yes')",
                [],
            )?;
            Ok(())
        })
        .unwrap();

        let value: String = db
            .connection()
            .query_row("SELECT value FROM metadata WHERE key = 'marker'", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(value, "yes");
    }

    #[test]
    fn test_write_rolls_back_on_error() {
        let mut db = create_test_database();
        let result: Result<()> = db.write(|tx| {
            tx.execute(
                "INSERT INTO metadata (key, value) VALUES ('marker', 'yes')",
                [],
            )?;
            Err(Error::NotFound {
                resource: "marker".into(),
            })
        });
        assert!(result.unwrap_err().is_not_found());

        let count: i64 = db
            .connection()
            .query_row("SELECT COUNT(*) FROM metadata WHERE key = 'marker'", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_write_reports_lock_timeout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let mut holder = Database::open(DatabaseConfig::new(&path)).unwrap();
        let mut waiter =
            Database::open(DatabaseConfig::new(&path).with_busy_timeout(Duration::from_millis(50)))
                .unwrap();

        let tx = holder
            .connection_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .unwrap();

        let err = waiter.write(|_| Ok(())).unwrap_err();
        assert!(matches!(err, Error::LockTimeout { .. }));
        assert!(err.is_retryable());

        tx.rollback().unwrap();
        waiter.write(|_| Ok(())).unwrap();
    }
}

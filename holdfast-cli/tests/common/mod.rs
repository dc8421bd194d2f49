//! Common test utilities for CLI integration tests.
//!
//! This module provides shared helpers for CLI testing:
//! - An isolated data directory per test
//! - Command builders with `--data-dir` preset
//! - Shortcuts for provisioning inventory and driving reservations

use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::TempDir;

/// Test environment with an isolated data directory.
pub struct TestEnv {
    /// Temporary directory (kept alive for the duration of the test)
    #[allow(dead_code)]
    temp_dir: TempDir,
    /// Path to the holdfast data directory
    pub data_dir: PathBuf,
}

#[allow(dead_code)]
impl TestEnv {
    /// Create a new test environment.
    ///
    /// The data directory is not created; the first command creates it.
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let data_dir = temp_dir.path().join("holdfast-data");
        Self { temp_dir, data_dir }
    }

    /// A command with only the holdfast binary.
    pub fn command_bare(&self) -> Command {
        let mut cmd = Command::cargo_bin("holdfast").expect("Failed to find holdfast binary");
        for var in [
            "HOLDFAST_DATA_DIR",
            "HOLDFAST_BUSY_TIMEOUT",
            "HOLDFAST_DISABLE_AUTOINIT",
            "HOLDFAST_LOG_MODE",
            "HOLDFAST_HOLD_TIMEOUT_SECONDS",
            "HOLDFAST_SWEEP_INTERVAL_SECONDS",
            "HOLDFAST_ROLLOVER_HORIZON_DAYS",
            "HOLDFAST_MAXIMUM_LOCK_WAIT_SECONDS",
            "HOLDFAST_OUTPUT_FORMAT",
        ] {
            cmd.env_remove(var);
        }
        cmd
    }

    /// A command with `--data-dir` pointing at this environment.
    pub fn command(&self) -> Command {
        let mut cmd = self.command_bare();
        cmd.arg("--data-dir").arg(&self.data_dir);
        cmd
    }

    /// Path of the store file.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("holdfast.db")
    }

    /// Run `holdfast init`.
    pub fn init(&self) {
        self.command().arg("init").assert().success();
    }

    /// Register a room type and materialize its dates.
    pub fn add_room(&self, unit_id: &str, capacity: u32, from: &str, to: &str) {
        self.command()
            .args(["unit", "add", unit_id, "--capacity", &capacity.to_string()])
            .assert()
            .success();
        self.command()
            .args(["unit", "materialize", unit_id, "--from", from, "--to", to])
            .assert()
            .success();
    }

    /// Add economy seats to a trip.
    pub fn add_seats(&self, trip_id: &str, seats: &[&str]) {
        self.command()
            .args(["seats", "add", trip_id])
            .args(seats)
            .assert()
            .success();
    }

    /// Reserve a room and return the reservation id.
    ///
    /// # Panics
    /// Panics if the reserve command fails.
    pub fn reserve_room(&self, unit_id: &str, from: &str, to: &str, actor: &str) -> String {
        let output = self
            .command()
            .args(["reserve", unit_id, "--actor", actor, "--from", from, "--to", to])
            .output()
            .expect("Failed to run reserve command");
        assert!(
            output.status.success(),
            "Reserve failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout)
            .expect("Invalid UTF-8 in output")
            .trim()
            .to_string()
    }

    /// Record a payment for a reservation and settle it; returns the merchant id.
    pub fn settled_payment(&self, reservation_id: &str, amount: i64) -> String {
        let output = self
            .command()
            .args([
                "payment",
                "record",
                "--amount",
                &amount.to_string(),
                "--reservation",
                reservation_id,
            ])
            .output()
            .expect("Failed to run payment record");
        assert!(output.status.success());
        let merchant_id = String::from_utf8(output.stdout).unwrap().trim().to_string();

        self.command()
            .args(["payment", "settle", &merchant_id])
            .assert()
            .success();
        merchant_id
    }

    /// The `show --format json` document of a reservation.
    pub fn show_json(&self, reservation_id: &str) -> serde_json::Value {
        let output = self
            .command()
            .args(["show", reservation_id, "--format", "json"])
            .output()
            .expect("Failed to run show");
        assert!(output.status.success());
        serde_json::from_slice(&output.stdout).expect("show printed invalid JSON")
    }

    /// Remaining units of a room on one date, from `availability --format json`.
    pub fn remaining(&self, unit_id: &str, date: &str) -> u64 {
        let output = self
            .command()
            .args(["availability", unit_id, "--from", date, "--format", "json"])
            .output()
            .expect("Failed to run availability");
        assert!(output.status.success());
        let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        rows[0]["remaining"].as_u64().expect("no row for date")
    }

    /// Backdate a reservation's creation so the sweep sees it as stale.
    pub fn age_reservation(&self, reservation_id: &str, seconds: i64) {
        let conn = rusqlite::Connection::open(self.db_path()).unwrap();
        let rows = conn
            .execute(
                "UPDATE reservations SET created_at = created_at - ?1 WHERE id = ?2",
                rusqlite::params![seconds, reservation_id],
            )
            .unwrap();
        assert_eq!(rows, 1);
    }
}

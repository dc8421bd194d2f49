//! Background threads for the expiration sweep and the inventory rollover.
//!
//! Each task owns its own store connection and calls the same operations a
//! request handler would. A task sleeps on its stop channel between runs,
//! so shutdown takes effect without waiting out the interval.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::config::Config;
use crate::database::{Database, DatabaseConfig};
use crate::error::Result;

use super::reconcile::ExpirationReconciler;
use super::rollover::InventoryRollover;

/// Intervals and parameters of the background tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    /// Time between two sweeps.
    pub sweep_interval: Duration,
    /// PENDING age after which a reservation is expired.
    pub hold_timeout: Duration,
    /// Time between two rollover runs.
    pub rollover_interval: Duration,
    /// Days ahead kept materialized.
    pub horizon_days: u32,
}

impl ScheduleConfig {
    /// Reads the schedule from a merged configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            sweep_interval: config.sweep_interval(),
            hold_timeout: config.hold_timeout(),
            rollover_interval: config.rollover_interval(),
            horizon_days: config.horizon_days(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Handle to the running sweep and rollover threads.
///
/// Dropping the handle stops and joins both threads.
///
/// # Examples
///
/// ```no_run
/// use holdfast::database::DatabaseConfig;
/// use holdfast::operations::{BackgroundTasks, ScheduleConfig};
///
/// let tasks = BackgroundTasks::spawn(
///     DatabaseConfig::new("/tmp/holdfast.db"),
///     ScheduleConfig::default(),
/// )
/// .unwrap();
/// // ... serve requests ...
/// tasks.shutdown();
/// ```
#[derive(Debug)]
pub struct BackgroundTasks {
    stops: Vec<Sender<()>>,
    handles: Vec<JoinHandle<()>>,
}

impl BackgroundTasks {
    /// Opens one connection per task and starts both threads.
    ///
    /// The first rollover run backfills the whole window.
    ///
    /// # Errors
    ///
    /// Returns an error if a connection cannot be opened or a thread cannot
    /// be spawned. No thread is left running in that case.
    pub fn spawn(db_config: DatabaseConfig, schedule: ScheduleConfig) -> Result<Self> {
        let mut sweep_db = Database::open(db_config.clone())?;
        let mut rollover_db = Database::open(db_config)?;

        let mut tasks = Self {
            stops: Vec::with_capacity(2),
            handles: Vec::with_capacity(2),
        };

        let reconciler = ExpirationReconciler::new(schedule.hold_timeout);
        tasks.start("holdfast-sweep", schedule.sweep_interval, move || {
            if let Err(err) = reconciler.sweep(&mut sweep_db) {
                log::warn!("expiration sweep failed: {err}");
            }
        })?;

        let rollover = InventoryRollover::new(schedule.horizon_days);
        let mut backfill = true;
        tasks.start("holdfast-rollover", schedule.rollover_interval, move || {
            match rollover.with_backfill(backfill).run(&mut rollover_db, false) {
                Ok(_) => backfill = false,
                Err(err) => log::warn!("inventory rollover failed: {err}"),
            }
        })?;

        log::info!(
            "background tasks started: sweep every {:?}, rollover every {:?}",
            schedule.sweep_interval,
            schedule.rollover_interval
        );
        Ok(tasks)
    }

    fn start<F>(&mut self, name: &str, interval: Duration, task: F) -> Result<()>
    where
        F: FnMut() + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel();
        let handle = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || run_periodic(interval, &stop_rx, task))?;
        self.stops.push(stop_tx);
        self.handles.push(handle);
        Ok(())
    }

    /// Stops both threads and waits for them to finish their current run.
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        for stop in self.stops.drain(..) {
            // A closed channel means the thread already exited.
            let _ = stop.send(());
        }
        for handle in self.handles.drain(..) {
            let name = handle.thread().name().unwrap_or("background").to_string();
            if handle.join().is_err() {
                log::warn!("{name} thread panicked");
            }
        }
    }
}

impl Drop for BackgroundTasks {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

fn run_periodic(interval: Duration, stop: &Receiver<()>, mut task: impl FnMut()) {
    loop {
        task();
        match stop.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

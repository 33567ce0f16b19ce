use log::{error, info, warn};
use std::error::Error as StdError;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use crate::extract::{ExtractionError, Extractor};
use crate::notify::Notifier;
use crate::pipeline;
use crate::store::{SlotStore, StoreUnavailableError};
use crate::time_rule::ThresholdConfig;

/// Errors that end a cycle early
#[derive(Debug)]
pub enum CycleError {
    Extraction(ExtractionError),
    Store(StoreUnavailableError),
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleError::Extraction(err) => write!(f, "Extraction failed: {}", err),
            CycleError::Store(err) => write!(f, "{}", err),
        }
    }
}

impl StdError for CycleError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            CycleError::Extraction(err) => Some(err),
            CycleError::Store(err) => Some(err),
        }
    }
}

impl From<ExtractionError> for CycleError {
    fn from(err: ExtractionError) -> Self {
        CycleError::Extraction(err)
    }
}

impl From<StoreUnavailableError> for CycleError {
    fn from(err: StoreUnavailableError) -> Self {
        CycleError::Store(err)
    }
}

/// What a completed cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleReport {
    /// Records returned by the extractor
    pub listed: usize,
    /// New slots that passed the time rule
    pub new_slots: usize,
    /// A notification was attempted and succeeded
    pub notified: bool,
    /// A notification was attempted and failed
    pub delivery_failed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Idle,
    Running,
}

/// Paces the polling loop
pub trait Ticker {
    /// Block until the next cycle is due; false stops the loop
    fn wait(&mut self) -> bool;
}

/// Sleeps a fixed interval between cycles
pub struct IntervalTicker {
    interval: Duration,
}

impl IntervalTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for IntervalTicker {
    fn wait(&mut self) -> bool {
        let secs = self.interval.as_secs();
        info!(
            "Sleeping for {} seconds ({:.1} minutes)...",
            secs,
            secs as f64 / 60.0
        );
        std::thread::sleep(self.interval);
        true
    }
}

/// Runs extract -> filter -> notify cycles one at a time
pub struct Watcher<E, N, S> {
    extractor: E,
    notifier: N,
    store: S,
    thresholds: ThresholdConfig,
    state: WatcherState,
}

impl<E: Extractor, N: Notifier, S: SlotStore> Watcher<E, N, S> {
    pub fn new(extractor: E, notifier: N, store: S, thresholds: ThresholdConfig) -> Self {
        Self {
            extractor,
            notifier,
            store,
            thresholds,
            state: WatcherState::Idle,
        }
    }

    pub fn state(&self) -> WatcherState {
        self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run a single cycle
    ///
    /// A delivery failure is logged and reported but does not fail the cycle; the
    /// batch stays in the seen-set.
    pub fn run_cycle(&mut self) -> Result<CycleReport, CycleError> {
        self.state = WatcherState::Running;
        let result = self.cycle();
        self.state = WatcherState::Idle;
        result
    }

    fn cycle(&mut self) -> Result<CycleReport, CycleError> {
        let raw = self.extractor.extract()?;
        let fresh = pipeline::process(&raw, &self.thresholds, &self.store)?;

        let mut report = CycleReport {
            listed: raw.len(),
            new_slots: fresh.len(),
            ..CycleReport::default()
        };

        if fresh.is_empty() {
            info!("No new appointments to email.");
            return Ok(report);
        }

        info!("Found {} new appointment(s)", fresh.len());
        match self.notifier.notify(&fresh) {
            Ok(()) => {
                report.notified = true;
                let ids: Vec<String> = fresh.iter().map(|r| r.identifier.clone()).collect();
                if let Err(e) = self.store.mark_notified(&ids) {
                    warn!("Notification sent but could not flag slots as notified: {}", e);
                }
            }
            Err(e) => {
                report.delivery_failed = true;
                let ids: Vec<&str> = fresh.iter().map(|r| r.identifier.as_str()).collect();
                error!(
                    "Failed to send notification for {} slot(s) [{}]: {}",
                    fresh.len(),
                    ids.join("; "),
                    e
                );
            }
        }
        Ok(report)
    }

    /// Cycle, then wait on the ticker, until the ticker says stop
    ///
    /// Errors and panics inside a cycle are logged and the loop carries on.
    pub fn run<T: Ticker>(&mut self, ticker: &mut T) {
        loop {
            info!("Starting the scraper...");
            match panic::catch_unwind(AssertUnwindSafe(|| self.run_cycle())) {
                Ok(Ok(report)) => info!(
                    "Scraper completed: {} listed, {} new, notified={}",
                    report.listed, report.new_slots, report.notified
                ),
                Ok(Err(e)) => error!("Error in scraper: {}", e),
                Err(payload) => {
                    self.state = WatcherState::Idle;
                    error!("Cycle panicked: {}", panic_message(payload.as_ref()));
                }
            }

            if !ticker.wait() {
                break;
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

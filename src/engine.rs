use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::diff;
use crate::message::format_changes;
use crate::models::{ChangeSet, EndpointStatus, Snapshot};
use crate::notify::Transport;
use crate::source::StatusSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    /// No snapshot has been fetched successfully yet.
    Uninitialized,
    Tracking,
}

/// Holds the last good snapshot and diffs each new fetch against it.
pub struct Detector {
    source: Box<dyn StatusSource>,
    previous: Option<Snapshot>,
}

impl Detector {
    pub fn new(source: Box<dyn StatusSource>) -> Self {
        Self {
            source,
            previous: None,
        }
    }

    /// Build a detector and fetch the baseline right away so the first
    /// scheduled tick can already report changes.
    pub async fn bootstrap(source: Box<dyn StatusSource>) -> Self {
        let mut detector = Self::new(source);
        detector.tick().await;
        if detector.state() == DetectorState::Uninitialized {
            warn!("Eager bootstrap failed; the first scheduled tick will retry");
        }
        detector
    }

    pub fn state(&self) -> DetectorState {
        if self.previous.is_some() {
            DetectorState::Tracking
        } else {
            DetectorState::Uninitialized
        }
    }

    pub fn previous(&self) -> Option<&Snapshot> {
        self.previous.as_ref()
    }

    /// Fetch, diff against the previous snapshot, and keep the new one.
    ///
    /// A failed fetch leaves the previous snapshot in place and reports nothing.
    pub async fn tick(&mut self) -> ChangeSet {
        let current = match self.source.fetch().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Failed to fetch proxy status, skipping tick: {}", e);
                return ChangeSet::default();
            }
        };

        let changes = match &self.previous {
            None => {
                info!("Baseline recorded with {} proxies", current.len());
                ChangeSet::default()
            }
            Some(previous) => diff::compare(Some(previous), &current),
        };
        self.previous = Some(current);
        changes
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Another cycle still held the detector.
    Skipped,
    Quiet,
    Notified(usize),
    DeliveryFailed(usize),
}

/// Scheduler-facing session: one detector, one transport, ticks never overlap.
pub struct Watcher {
    detector: Mutex<Detector>,
    transport: Box<dyn Transport>,
    interval: Duration,
}

impl Watcher {
    pub fn new(detector: Detector, transport: Box<dyn Transport>, interval: Duration) -> Self {
        Self {
            detector: Mutex::new(detector),
            transport,
            interval,
        }
    }

    pub async fn state(&self) -> DetectorState {
        self.detector.lock().await.state()
    }

    /// Fetch, diff and notify while holding the detector, so a call that
    /// arrives before delivery finishes returns `Skipped`.
    pub async fn run_one_cycle(&self) -> CycleOutcome {
        let Ok(mut detector) = self.detector.try_lock() else {
            warn!("Previous cycle still running, skipping this one");
            return CycleOutcome::Skipped;
        };

        let changes = detector.tick().await;

        for entry in &changes {
            let old = entry.previous_status.as_ref().map_or("new", |s| s.as_str());
            let msg = format!("[CHANGE] {}: {} -> {}", entry.name, old, entry.current_status);
            if entry.current_status == EndpointStatus::Offline { error!("{}", msg); } else { warn!("{}", msg); }
        }

        let Some(message) = format_changes(&changes) else {
            return CycleOutcome::Quiet;
        };

        match self.transport.deliver(&message).await {
            Ok(()) => CycleOutcome::Notified(changes.len()),
            Err(e) => {
                error!("Failed to deliver change notification: {}", e);
                CycleOutcome::DeliveryFailed(changes.len())
            }
        }
    }

    pub async fn run(self: Arc<Self>) {
        info!("Watching proxy status every {}s", self.interval.as_secs());

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let start_time = Utc::now();

            let this = Arc::clone(&self);
            match tokio::spawn(async move { this.run_one_cycle().await }).await {
                Ok(outcome) => {
                    let duration = Utc::now() - start_time;
                    info!("Cycle finished ({:?}) in {:.2}s.",
                        outcome,
                        duration.num_milliseconds() as f64 / 1000.0);
                }
                Err(e) => error!("Cycle aborted unexpectedly: {}", e),
            }
        }
    }
}

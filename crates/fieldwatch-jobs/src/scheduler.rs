//! Interval runner for scan cycles.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

use fieldwatch_core::{defaults, Error, Result};

use crate::coordinator::{CycleReport, ScanCoordinator, ScanOutcome};

/// Capacity of the scheduler's event channel.
const EVENT_CAPACITY: usize = 64;

/// Configuration for the scan scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Whether periodic scanning runs at all.
    pub enabled: bool,
    /// Delay before the first cycle.
    pub warmup: Duration,
    /// Period between cycles.
    pub interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            warmup: Duration::from_secs(defaults::SCAN_WARMUP_SECS),
            interval: Duration::from_secs(defaults::SCAN_INTERVAL_SECS),
        }
    }
}

impl SchedulerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `SCAN_ENABLED` | `true` | Enable/disable periodic scanning |
    /// | `SCAN_WARMUP_SECS` | `5` | Delay before the first scan |
    /// | `SCAN_INTERVAL_SECS` | `10` | Interval between scans |
    pub fn from_env() -> Self {
        let enabled = std::env::var("SCAN_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let warmup_secs = std::env::var("SCAN_WARMUP_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::SCAN_WARMUP_SECS);

        let interval_secs = std::env::var("SCAN_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::SCAN_INTERVAL_SECS)
            .max(1);

        Self {
            enabled,
            warmup: Duration::from_secs(warmup_secs),
            interval: Duration::from_secs(interval_secs),
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_warmup(mut self, warmup: Duration) -> Self {
        self.warmup = warmup;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Event emitted by the scheduler.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// Scheduler loop started.
    SchedulerStarted,
    /// A cycle ran to completion.
    CycleCompleted(CycleReport),
    /// A trigger found a cycle already in flight.
    CycleSkipped,
    /// A cycle could not list its sources.
    CycleFailed { error: String },
    /// Scheduler loop stopped.
    SchedulerStopped,
}

/// Handle for controlling a running scheduler.
pub struct SchedulerHandle {
    shutdown_tx: mpsc::Sender<()>,
    event_rx: broadcast::Receiver<ScanEvent>,
}

impl SchedulerHandle {
    /// Signal the scheduler to stop. An in-flight cycle finishes on its own.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| Error::Internal("Failed to send shutdown signal".into()))?;
        Ok(())
    }

    /// Get a receiver for scheduler events.
    pub fn events(&self) -> broadcast::Receiver<ScanEvent> {
        self.event_rx.resubscribe()
    }
}

/// Drives a [`ScanCoordinator`] on a warm-up delay and a fixed interval.
#[derive(Clone)]
pub struct Scheduler {
    coordinator: ScanCoordinator,
    config: SchedulerConfig,
    event_tx: broadcast::Sender<ScanEvent>,
}

impl Scheduler {
    pub fn new(coordinator: ScanCoordinator, config: SchedulerConfig) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            coordinator,
            config,
            event_tx,
        }
    }

    pub fn coordinator(&self) -> &ScanCoordinator {
        &self.coordinator
    }

    /// Get a receiver for scheduler events.
    pub fn events(&self) -> broadcast::Receiver<ScanEvent> {
        self.event_tx.subscribe()
    }

    /// Run one cycle now, through the same single-flight guard as the
    /// periodic ones.
    pub async fn trigger(&self) -> Result<ScanOutcome> {
        let result = self.coordinator.run_cycle().await;
        self.publish(&result);
        result
    }

    /// Start the scheduler loop and return a handle for control.
    pub fn start(self) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let event_rx = self.event_tx.subscribe();

        tokio::spawn(async move {
            self.run(&mut shutdown_rx).await;
        });

        SchedulerHandle {
            shutdown_tx,
            event_rx,
        }
    }

    #[instrument(skip(self, shutdown_rx))]
    async fn run(&self, shutdown_rx: &mut mpsc::Receiver<()>) {
        if !self.config.enabled {
            info!("Scan scheduler is disabled, not starting");
            return;
        }

        info!(
            warmup_secs = self.config.warmup.as_secs(),
            interval_secs = self.config.interval.as_secs(),
            "Scan scheduler started"
        );
        let _ = self.event_tx.send(ScanEvent::SchedulerStarted);

        let period = self.config.interval.max(Duration::from_millis(1));
        let mut ticks = interval_at(Instant::now() + self.config.warmup, period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Scan scheduler received shutdown signal");
                    break;
                }
                _ = ticks.tick() => {
                    // Overlapping ticks become skips in the coordinator.
                    let scheduler = self.clone();
                    let task = tokio::spawn(async move {
                        let _ = scheduler.trigger().await;
                    });
                    tokio::spawn(async move {
                        if let Err(e) = task.await {
                            error!(error = ?e, "Scan cycle task panicked");
                        }
                    });
                }
            }
        }

        let _ = self.event_tx.send(ScanEvent::SchedulerStopped);
        info!("Scan scheduler stopped");
    }

    fn publish(&self, result: &Result<ScanOutcome>) {
        let event = match result {
            Ok(ScanOutcome::Completed(report)) => ScanEvent::CycleCompleted(report.clone()),
            Ok(ScanOutcome::Skipped) => {
                debug!("Scan trigger skipped, cycle in flight");
                ScanEvent::CycleSkipped
            }
            Err(e) => {
                warn!(error = %e, "Scan cycle failed");
                ScanEvent::CycleFailed {
                    error: e.to_string(),
                }
            }
        };
        let _ = self.event_tx.send(event);
    }
}

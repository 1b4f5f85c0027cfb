//! Scan cycle: submit new media items and fold their outcomes into one status.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use fieldwatch_core::{
    defaults, AlertDetails, Category, CommitSource, DetectionClient, Error, JobPatch, MediaItem,
    Result, StatusKind,
};
use fieldwatch_store::{CommitOutcome, Stores};

/// Configuration for the scan coordinator.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Pause between two submissions within a cycle.
    pub item_delay: Duration,
    /// Upper bound on one detector call.
    pub detector_timeout: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            item_delay: Duration::from_millis(defaults::SCAN_ITEM_DELAY_MS),
            detector_timeout: Duration::from_secs(defaults::DETECTOR_TIMEOUT_SECS),
        }
    }
}

impl ScanConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `SCAN_ITEM_DELAY_MS` | `500` | Pause between submissions |
    /// | `DETECTOR_TIMEOUT_SECS` | `30` | Bound on one detector call |
    pub fn from_env() -> Self {
        let item_delay_ms = std::env::var("SCAN_ITEM_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::SCAN_ITEM_DELAY_MS);

        let timeout_secs = std::env::var(defaults::ENV_DETECTOR_TIMEOUT_SECS)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::DETECTOR_TIMEOUT_SECS);

        Self {
            item_delay: Duration::from_millis(item_delay_ms),
            detector_timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn with_item_delay(mut self, delay: Duration) -> Self {
        self.item_delay = delay;
        self
    }

    pub fn with_detector_timeout(mut self, timeout: Duration) -> Self {
        self.detector_timeout = timeout;
        self
    }
}

/// Classified result of one successfully detected item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemOutcome {
    pub job_id: String,
    pub category: Category,
    pub status: StatusKind,
}

/// Summary of a completed cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    /// Items handed to the detector this cycle.
    pub submitted: usize,
    /// Submissions that produced no outcome.
    pub failed: usize,
    /// Outcomes in processing order.
    pub outcomes: Vec<ItemOutcome>,
    /// Winner of the priority merge, if any item succeeded.
    pub final_status: Option<StatusKind>,
    pub final_job_id: Option<String>,
    /// The winner replaced the stored status.
    pub committed: bool,
    /// The winner was `normal` and an active alert was kept instead.
    pub preserved: bool,
    /// Alert appended for this cycle.
    pub alert_id: Option<Uuid>,
    pub duration_ms: u64,
}

/// What `run_cycle` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Another cycle was in flight; nothing was done.
    Skipped,
    Completed(CycleReport),
}

/// Fold outcomes into the winning one.
///
/// Higher [`StatusKind::priority`] wins; on a tie the later outcome replaces
/// the earlier one.
pub fn merge_outcomes(outcomes: &[ItemOutcome]) -> Option<&ItemOutcome> {
    outcomes.iter().fold(None, |best, candidate| match best {
        Some(current) if candidate.status.priority() < current.status.priority() => Some(current),
        _ => Some(candidate),
    })
}

/// Holds the single-flight flag for the lifetime of a cycle.
struct FlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> FlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Runs scan cycles against the shared stores.
#[derive(Clone)]
pub struct ScanCoordinator {
    stores: Stores,
    detector: Arc<dyn DetectionClient>,
    running: Arc<AtomicBool>,
    config: ScanConfig,
}

impl ScanCoordinator {
    pub fn new(stores: Stores, detector: Arc<dyn DetectionClient>, config: ScanConfig) -> Self {
        Self {
            stores,
            detector,
            running: Arc::new(AtomicBool::new(false)),
            config,
        }
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn detector(&self) -> &Arc<dyn DetectionClient> {
        &self.detector
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Whether a cycle is currently in flight.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run one scan cycle unless another is already in flight.
    ///
    /// Item-level detector failures are recorded on the job and never abort
    /// the cycle. An error here means a media source could not be listed.
    #[instrument(skip(self))]
    pub async fn run_cycle(&self) -> Result<ScanOutcome> {
        let Some(_guard) = FlightGuard::acquire(&self.running) else {
            debug!("Scan cycle already in flight, skipping");
            return Ok(ScanOutcome::Skipped);
        };

        let started = Instant::now();
        let mut report = CycleReport::default();

        // List every source before claiming any item.
        let mut sources = Vec::with_capacity(Category::SCAN_ORDER.len());
        for category in Category::SCAN_ORDER {
            sources.push(self.stores.library.list(category).await?);
        }

        for items in sources {
            for item in items {
                if !self.stores.processed.mark_processed(&item.key()).await {
                    continue;
                }
                if report.submitted > 0 && !self.config.item_delay.is_zero() {
                    sleep(self.config.item_delay).await;
                }
                report.submitted += 1;
                match self.process_item(&item).await {
                    Some(outcome) => report.outcomes.push(outcome),
                    None => report.failed += 1,
                }
            }
        }

        if let Some(winner) = merge_outcomes(&report.outcomes).cloned() {
            report.final_status = Some(winner.status);
            report.final_job_id = Some(winner.job_id.clone());

            match self
                .stores
                .status
                .commit(winner.status, winner.job_id.clone(), CommitSource::Scan)
                .await
            {
                CommitOutcome::Applied(status) => {
                    report.committed = true;
                    if status.status.is_alert() {
                        report.alert_id = self.record_alert(&winner).await;
                    }
                }
                CommitOutcome::Preserved(_) => report.preserved = true,
            }
        }

        report.duration_ms = started.elapsed().as_millis() as u64;
        if report.submitted > 0 {
            info!(
                submitted = report.submitted,
                failed = report.failed,
                status = ?report.final_status,
                job_id = ?report.final_job_id,
                preserved = report.preserved,
                duration_ms = report.duration_ms,
                "Scan cycle completed"
            );
        } else {
            debug!("Scan cycle found no new items");
        }
        Ok(ScanOutcome::Completed(report))
    }

    /// Submit one item and record its job. Returns `None` on failure.
    async fn process_item(&self, item: &MediaItem) -> Option<ItemOutcome> {
        let job_id = self.assign_job_id(item).await;
        self.stores
            .registry
            .put_job(&job_id, JobPatch::submitted(item))
            .await;
        debug!(job_id = %job_id, item = %item.path, "Submitting item for detection");

        let started = Instant::now();
        let result = match timeout(
            self.config.detector_timeout,
            self.detector.submit(item.category, &job_id, &item.file_path),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(Error::DetectorUnavailable(format!(
                "no answer within {}ms",
                self.config.detector_timeout.as_millis()
            ))),
        };

        let result = result.and_then(|r| {
            if r.category() == item.category {
                Ok(r)
            } else {
                Err(Error::Detector(format!(
                    "expected a {} result, got {}",
                    item.category,
                    r.category()
                )))
            }
        });

        match result {
            Ok(detection) => {
                let status = detection.classify();
                self.stores
                    .registry
                    .put_job(&job_id, JobPatch::completed(&detection, status))
                    .await;
                info!(
                    job_id = %job_id,
                    category = %item.category,
                    %status,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Detection completed"
                );
                Some(ItemOutcome {
                    job_id,
                    category: item.category,
                    status,
                })
            }
            Err(e) => {
                warn!(
                    job_id = %job_id,
                    item = %item.path,
                    detector = self.detector.name(),
                    error = %e,
                    "Detection failed"
                );
                self.stores
                    .registry
                    .put_job(&job_id, JobPatch::failed(e.to_string()))
                    .await;
                None
            }
        }
    }

    /// Derive the job id for `item`, suffixing it when another item
    /// already holds the base id.
    async fn assign_job_id(&self, item: &MediaItem) -> String {
        let base = item.base_job_id();
        if self.stores.registry.get_job(&base).await.is_none() {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}_{}", base, n);
            if self.stores.registry.get_job(&candidate).await.is_none() {
                debug!(base = %base, job_id = %candidate, item = %item.path, "Job id taken, disambiguated");
                return candidate;
            }
            n += 1;
        }
    }

    async fn record_alert(&self, winner: &ItemOutcome) -> Option<Uuid> {
        let job = self.stores.registry.get_job(&winner.job_id).await?;
        let record = self
            .stores
            .alerts
            .append(winner.status, AlertDetails::Detection { job })
            .await;
        Some(record.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(job_id: &str, status: StatusKind) -> ItemOutcome {
        let category = match status {
            StatusKind::IntrusionAlert => Category::Intrusion,
            _ => Category::Wildlife,
        };
        ItemOutcome {
            job_id: job_id.to_string(),
            category,
            status,
        }
    }

    #[test]
    fn test_merge_empty() {
        assert!(merge_outcomes(&[]).is_none());
    }

    #[test]
    fn test_merge_highest_priority_wins_in_any_order() {
        let a = [
            outcome("wildlife_1", StatusKind::WildlifeAlert),
            outcome("intrusion_1", StatusKind::IntrusionAlert),
        ];
        let b = [
            outcome("intrusion_1", StatusKind::IntrusionAlert),
            outcome("wildlife_1", StatusKind::WildlifeAlert),
        ];
        assert_eq!(merge_outcomes(&a).unwrap().job_id, "intrusion_1");
        assert_eq!(merge_outcomes(&b).unwrap().job_id, "intrusion_1");
    }

    #[test]
    fn test_merge_tie_goes_to_later() {
        let outcomes = [
            outcome("wildlife_1", StatusKind::Normal),
            outcome("wildlife_2", StatusKind::WildlifeAlert),
            outcome("wildlife_3", StatusKind::WildlifeAlert),
            outcome("wildlife_4", StatusKind::Normal),
        ];
        assert_eq!(merge_outcomes(&outcomes).unwrap().job_id, "wildlife_3");
    }

    #[test]
    fn test_merge_all_normal_picks_last() {
        let outcomes = [
            outcome("wildlife_1", StatusKind::Normal),
            outcome("intrusion_1", StatusKind::Normal),
        ];
        assert_eq!(merge_outcomes(&outcomes).unwrap().job_id, "intrusion_1");
    }

    #[test]
    fn test_flight_guard_releases_on_drop() {
        let flag = AtomicBool::new(false);
        {
            let guard = FlightGuard::acquire(&flag);
            assert!(guard.is_some());
            assert!(FlightGuard::acquire(&flag).is_none());
        }
        assert!(!flag.load(Ordering::Acquire));
        assert!(FlightGuard::acquire(&flag).is_some());
    }

    #[test]
    fn test_scan_config_builders() {
        let config = ScanConfig::default()
            .with_item_delay(Duration::ZERO)
            .with_detector_timeout(Duration::from_secs(2));
        assert!(config.item_delay.is_zero());
        assert_eq!(config.detector_timeout, Duration::from_secs(2));
        assert_eq!(
            ScanConfig::default().item_delay,
            Duration::from_millis(500)
        );
    }
}

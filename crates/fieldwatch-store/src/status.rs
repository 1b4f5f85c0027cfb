//! System status store with auto-reset timer.
//!
//! The current status, the previous one and the armed timer live behind a
//! single mutex, so a commit and the cancellation of a stale timer happen in
//! one critical section. Scan-originated commits additionally obey the
//! preservation rule: an active alert is never replaced by `normal` from a
//! scan, only by the timer or an explicit reset.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::AbortHandle;
use tracing::{debug, info};

use fieldwatch_core::{
    defaults, synthetic_job_id, CommitSource, JobKind, JobPatch, StatusKind, SystemStatus,
};

use crate::registry::JobRegistry;

/// Configuration for the status store.
#[derive(Debug, Clone)]
pub struct StatusConfig {
    /// Quiet period after which a non-normal status resets itself.
    pub reset_after: Duration,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            reset_after: Duration::from_secs(defaults::STATUS_RESET_SECS),
        }
    }
}

impl StatusConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `STATUS_RESET_SECS` | `60` | Auto-reset timeout for alert states |
    pub fn from_env() -> Self {
        let secs = std::env::var(defaults::ENV_STATUS_RESET_SECS)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::STATUS_RESET_SECS);
        Self {
            reset_after: Duration::from_secs(secs),
        }
    }

    pub fn with_reset_after(mut self, reset_after: Duration) -> Self {
        self.reset_after = reset_after;
        self
    }
}

/// Result of a commit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The new value was installed.
    Applied(SystemStatus),
    /// A scan tried to clear an active alert; the current value was kept.
    Preserved(SystemStatus),
}

impl CommitOutcome {
    /// The status in effect after the request.
    pub fn status(&self) -> &SystemStatus {
        match self {
            CommitOutcome::Applied(s) | CommitOutcome::Preserved(s) => s,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, CommitOutcome::Applied(_))
    }
}

/// Point-in-time view of the store for diagnostics.
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    pub current: SystemStatus,
    pub previous: Option<SystemStatus>,
    pub timer_armed: bool,
}

struct ArmedTimer {
    generation: u64,
    handle: AbortHandle,
}

struct StatusState {
    current: SystemStatus,
    previous: Option<SystemStatus>,
    timer: Option<ArmedTimer>,
}

/// Owner of the single system status.
#[derive(Clone)]
pub struct StatusStore {
    state: Arc<Mutex<StatusState>>,
    generation: Arc<AtomicU64>,
    registry: JobRegistry,
    config: StatusConfig,
}

impl StatusStore {
    /// Create a store holding the initial `normal` status.
    pub fn new(registry: JobRegistry, config: StatusConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(StatusState {
                current: SystemStatus::initial(),
                previous: None,
                timer: None,
            })),
            generation: Arc::new(AtomicU64::new(0)),
            registry,
            config,
        }
    }

    pub fn config(&self) -> &StatusConfig {
        &self.config
    }

    pub async fn read(&self) -> SystemStatus {
        self.state.lock().await.current.clone()
    }

    /// The value that was current before the last applied commit.
    pub async fn previous(&self) -> Option<SystemStatus> {
        self.state.lock().await.previous.clone()
    }

    pub async fn timer_armed(&self) -> bool {
        self.state.lock().await.timer.is_some()
    }

    pub async fn snapshot(&self) -> StatusSnapshot {
        let state = self.state.lock().await;
        StatusSnapshot {
            current: state.current.clone(),
            previous: state.previous.clone(),
            timer_armed: state.timer.is_some(),
        }
    }

    /// Install a new status and re-arm the auto-reset timer.
    ///
    /// Must be called from within a tokio runtime: alert states spawn the
    /// timer task.
    pub async fn commit(
        &self,
        status: StatusKind,
        job_id: impl Into<String>,
        source: CommitSource,
    ) -> CommitOutcome {
        let job_id = job_id.into();
        let mut state = self.state.lock().await;

        if source == CommitSource::Scan && state.current.status.is_alert() && !status.is_alert() {
            info!(
                current = %state.current.status,
                owner_job_id = %state.current.owner_job_id,
                job_id = %job_id,
                "Scan found nothing new; keeping active alert"
            );
            return CommitOutcome::Preserved(state.current.clone());
        }

        CommitOutcome::Applied(self.apply_locked(&mut state, status, job_id, source))
    }

    /// Cancel any timer and return to `normal` under a fresh `reset_` id.
    pub async fn reset_to_normal(&self, reason: &str) -> SystemStatus {
        let mut state = self.state.lock().await;
        self.reset_locked(&mut state, reason).await
    }

    async fn reset_locked(&self, state: &mut StatusState, reason: &str) -> SystemStatus {
        let job_id = synthetic_job_id("reset");
        self.registry
            .put_job(
                &job_id,
                JobPatch::synthetic(JobKind::Reset, StatusKind::Normal).with_reason(reason),
            )
            .await;
        info!(reason, job_id = %job_id, "Status reset to normal");
        self.apply_locked(state, StatusKind::Normal, job_id, CommitSource::Reset)
    }

    fn apply_locked(
        &self,
        state: &mut StatusState,
        status: StatusKind,
        job_id: String,
        source: CommitSource,
    ) -> SystemStatus {
        let next = SystemStatus::new(status, job_id);
        let previous = std::mem::replace(&mut state.current, next.clone());

        if let Some(timer) = state.timer.take() {
            timer.handle.abort();
            debug!(generation = timer.generation, "Auto-reset timer cancelled");
        }
        if status.is_alert() {
            state.timer = Some(self.arm_timer());
        }

        info!(
            status = %next.status,
            job_id = %next.owner_job_id,
            previous = %previous.status,
            ?source,
            "Status committed"
        );
        state.previous = Some(previous);
        next
    }

    fn arm_timer(&self) -> ArmedTimer {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let delay = self.config.reset_after;
        let store = self.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            store.fire_timer(generation).await;
        })
        .abort_handle();

        debug!(generation, delay_secs = delay.as_secs(), "Auto-reset timer armed");
        ArmedTimer { generation, handle }
    }

    async fn fire_timer(&self, generation: u64) {
        let mut state = self.state.lock().await;
        match state.timer.as_ref() {
            Some(timer) if timer.generation == generation => {}
            _ => {
                debug!(generation, "Superseded auto-reset timer ignored");
                return;
            }
        }
        // Disarm without aborting: this task is the timer.
        state.timer = None;
        self.reset_locked(&mut state, defaults::RESET_REASON_TIMEOUT)
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldwatch_core::JobState;

    fn store_with(reset_after: Duration) -> (StatusStore, JobRegistry) {
        let registry = JobRegistry::new();
        let store = StatusStore::new(
            registry.clone(),
            StatusConfig::default().with_reset_after(reset_after),
        );
        (store, registry)
    }

    async fn auto_resets(registry: &JobRegistry) -> usize {
        registry
            .list_recent(usize::MAX)
            .await
            .into_iter()
            .filter(|r| {
                r.kind == JobKind::Reset
                    && r.reason.as_deref() == Some(defaults::RESET_REASON_TIMEOUT)
            })
            .count()
    }

    #[tokio::test]
    async fn test_initial_status_is_normal_without_timer() {
        let (store, _) = store_with(Duration::from_secs(60));
        let status = store.read().await;
        assert_eq!(status.status, StatusKind::Normal);
        assert_eq!(status.owner_job_id, "init");
        assert!(!store.timer_armed().await);
    }

    #[tokio::test]
    async fn test_alert_commit_arms_timer_normal_disarms() {
        let (store, _) = store_with(Duration::from_secs(60));
        store
            .commit(StatusKind::WildlifeAlert, "wildlife_1", CommitSource::Scan)
            .await;
        assert!(store.timer_armed().await);

        store
            .commit(StatusKind::Normal, "manual_1", CommitSource::Manual)
            .await;
        assert!(!store.timer_armed().await);
        assert_eq!(store.read().await.owner_job_id, "manual_1");
        assert_eq!(
            store.previous().await.map(|p| p.status),
            Some(StatusKind::WildlifeAlert)
        );
    }

    #[tokio::test]
    async fn test_scan_commit_preserves_active_alert() {
        let (store, _) = store_with(Duration::from_secs(60));
        store
            .commit(StatusKind::WildlifeAlert, "wildlife_2", CommitSource::Scan)
            .await;

        let outcome = store
            .commit(StatusKind::Normal, "wildlife_3", CommitSource::Scan)
            .await;
        assert!(!outcome.is_applied());
        assert_eq!(outcome.status().status, StatusKind::WildlifeAlert);
        assert_eq!(store.read().await.owner_job_id, "wildlife_2");
        assert!(store.timer_armed().await);
    }

    #[tokio::test]
    async fn test_manual_commit_may_clear_alert() {
        let (store, _) = store_with(Duration::from_secs(60));
        store
            .commit(StatusKind::IntrusionAlert, "intrusion_1", CommitSource::Scan)
            .await;
        let outcome = store
            .commit(StatusKind::Normal, "manual_x", CommitSource::Manual)
            .await;
        assert!(outcome.is_applied());
        assert_eq!(store.read().await.status, StatusKind::Normal);
    }

    #[tokio::test]
    async fn test_reset_cancels_timer_and_records_job() {
        let (store, registry) = store_with(Duration::from_secs(60));
        store
            .commit(StatusKind::IntrusionAlert, "intrusion_1", CommitSource::Scan)
            .await;

        let status = store.reset_to_normal(defaults::RESET_REASON_MANUAL).await;
        assert_eq!(status.status, StatusKind::Normal);
        assert!(status.owner_job_id.starts_with("reset_"));
        assert!(!store.timer_armed().await);

        let job = registry.get_job(&status.owner_job_id).await.unwrap();
        assert_eq!(job.kind, JobKind::Reset);
        assert_eq!(job.lifecycle_state, JobState::Completed);
        assert_eq!(job.reason.as_deref(), Some("manual_request"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_timeout() {
        let (store, registry) = store_with(Duration::from_secs(60));
        store
            .commit(StatusKind::WildlifeAlert, "wildlife_4", CommitSource::Scan)
            .await;

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(store.read().await.status, StatusKind::WildlifeAlert);

        tokio::time::sleep(Duration::from_secs(2)).await;
        let status = store.read().await;
        assert_eq!(status.status, StatusKind::Normal);
        assert!(status.owner_job_id.starts_with("reset_"));
        assert!(!store.timer_armed().await);
        assert_eq!(auto_resets(&registry).await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recommit_replaces_timer() {
        let (store, registry) = store_with(Duration::from_secs(60));
        store
            .commit(StatusKind::WildlifeAlert, "wildlife_5", CommitSource::Scan)
            .await;
        tokio::time::sleep(Duration::from_secs(40)).await;
        store
            .commit(StatusKind::IntrusionAlert, "intrusion_5", CommitSource::Scan)
            .await;
        assert!(store.timer_armed().await);

        // The first timer would have fired at t=60; the second fires at t=100.
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(store.read().await.status, StatusKind::IntrusionAlert);
        assert_eq!(auto_resets(&registry).await, 0);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(store.read().await.status, StatusKind::Normal);
        assert_eq!(auto_resets(&registry).await, 1);

        // Nothing left to fire.
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(auto_resets(&registry).await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_before_timeout_prevents_auto_reset() {
        let (store, registry) = store_with(Duration::from_secs(60));
        store
            .commit(StatusKind::WeatherAlert, "manual_w", CommitSource::Manual)
            .await;
        store.reset_to_normal(defaults::RESET_REASON_MANUAL).await;

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(auto_resets(&registry).await, 0);
        assert!(!store.timer_armed().await);
    }
}

//! Shared handle bundling every store.

use crate::alert_log::AlertLog;
use crate::media::MediaLibrary;
use crate::registry::{JobRegistry, ProcessedSet};
use crate::status::{StatusConfig, StatusStore};

/// All in-memory state of one engine instance.
///
/// Cloning is cheap; clones see the same state. The status store shares the
/// job registry so resets are recorded next to detection jobs.
#[derive(Clone)]
pub struct Stores {
    /// Detection and synthetic job records.
    pub registry: JobRegistry,
    /// Item keys already submitted.
    pub processed: ProcessedSet,
    /// Recent alert history.
    pub alerts: AlertLog,
    /// Current system status and its auto-reset timer.
    pub status: StatusStore,
    /// Watched media sources.
    pub library: MediaLibrary,
}

impl Stores {
    pub fn new(library: MediaLibrary, status_config: StatusConfig, alerts: AlertLog) -> Self {
        let registry = JobRegistry::new();
        Self {
            status: StatusStore::new(registry.clone(), status_config),
            processed: ProcessedSet::new(),
            registry,
            alerts,
            library,
        }
    }

    /// Build every store from its environment configuration.
    pub fn from_env() -> Self {
        Self::new(
            MediaLibrary::from_env(),
            StatusConfig::from_env(),
            AlertLog::from_env(),
        )
    }
}

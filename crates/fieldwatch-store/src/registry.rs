//! Job registry and processed-item set.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use fieldwatch_core::{JobPatch, JobRecord};

#[derive(Default)]
struct Entries {
    jobs: HashMap<String, Entry>,
    /// Bumped on every upsert; orders records by last update.
    sequence: u64,
}

struct Entry {
    updated_seq: u64,
    record: JobRecord,
}

/// Keyed store of job records.
///
/// `put_job` is an upsert: fields present in the patch overwrite, absent
/// ones are retained. Terminal lifecycle states are never overwritten.
#[derive(Clone, Default)]
pub struct JobRegistry {
    inner: Arc<RwLock<Entries>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or merge a job record, returning the stored result.
    pub async fn put_job(&self, job_id: &str, patch: JobPatch) -> JobRecord {
        let now = Utc::now();
        let mut inner = self.inner.write().await;
        inner.sequence += 1;
        let seq = inner.sequence;

        match inner.jobs.get_mut(job_id) {
            Some(entry) => {
                let attempted = patch.lifecycle_state;
                if !entry.record.apply(patch, now) {
                    warn!(
                        job_id,
                        current = ?entry.record.lifecycle_state,
                        ?attempted,
                        "Ignoring state change on terminal job"
                    );
                }
                entry.updated_seq = seq;
                entry.record.clone()
            }
            None => {
                let record = JobRecord::from_patch(job_id, patch, now);
                debug!(job_id, kind = ?record.kind, "Job recorded");
                inner.jobs.insert(
                    job_id.to_string(),
                    Entry {
                        updated_seq: seq,
                        record: record.clone(),
                    },
                );
                record
            }
        }
    }

    pub async fn get_job(&self, job_id: &str) -> Option<JobRecord> {
        self.inner
            .read()
            .await
            .jobs
            .get(job_id)
            .map(|e| e.record.clone())
    }

    /// Up to `limit` records, most recently updated first.
    pub async fn list_recent(&self, limit: usize) -> Vec<JobRecord> {
        let inner = self.inner.read().await;
        let mut entries: Vec<&Entry> = inner.jobs.values().collect();
        entries.sort_by(|a, b| b.updated_seq.cmp(&a.updated_seq));
        entries
            .into_iter()
            .take(limit)
            .map(|e| e.record.clone())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.jobs.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Item keys already handed to the detector. Only ever grows.
#[derive(Clone, Default)]
pub struct ProcessedSet {
    keys: Arc<RwLock<HashSet<String>>>,
}

impl ProcessedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn has(&self, key: &str) -> bool {
        self.keys.read().await.contains(key)
    }

    /// Mark a key processed. Returns `true` if it was not already present.
    pub async fn mark_processed(&self, key: &str) -> bool {
        self.keys.write().await.insert(key.to_string())
    }

    pub async fn len(&self) -> usize {
        self.keys.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Sorted copy of every processed key.
    pub async fn snapshot(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.keys.read().await.iter().cloned().collect();
        keys.sort();
        keys
    }
}

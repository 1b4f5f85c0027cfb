//! Domain models: categories, statuses, job records, alerts, media items.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

// =============================================================================
// CATEGORY
// =============================================================================

/// Media source category. Each category is watched in its own directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[serde(alias = "animal", alias = "animals")]
    Wildlife,
    #[serde(alias = "human", alias = "face")]
    Intrusion,
}

impl Category {
    /// Fixed processing order of a scan cycle.
    pub const SCAN_ORDER: [Category; 2] = [Category::Wildlife, Category::Intrusion];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Wildlife => "wildlife",
            Category::Intrusion => "intrusion",
        }
    }

    /// Subdirectory of the media root holding this category's items.
    pub fn source_dir(&self) -> &'static str {
        match self {
            Category::Wildlife => "animals",
            Category::Intrusion => "face",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wildlife" | "animal" | "animals" => Ok(Category::Wildlife),
            "intrusion" | "human" | "face" => Ok(Category::Intrusion),
            other => Err(Error::InvalidInput(format!("unknown category '{}'", other))),
        }
    }
}

// =============================================================================
// STATUS
// =============================================================================

/// System-wide surveillance status observed by clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Normal,
    #[serde(alias = "animal_alert")]
    WildlifeAlert,
    #[serde(alias = "human_alert")]
    IntrusionAlert,
    WeatherAlert,
}

impl StatusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusKind::Normal => "normal",
            StatusKind::WildlifeAlert => "wildlife_alert",
            StatusKind::IntrusionAlert => "intrusion_alert",
            StatusKind::WeatherAlert => "weather_alert",
        }
    }

    pub fn is_alert(&self) -> bool {
        !matches!(self, StatusKind::Normal)
    }

    /// Merge priority within one scan cycle. Higher wins; ties go to the
    /// later outcome.
    pub fn priority(&self) -> u8 {
        match self {
            StatusKind::Normal => 0,
            StatusKind::WildlifeAlert => 1,
            StatusKind::WeatherAlert => 2,
            StatusKind::IntrusionAlert => 3,
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "normal" => Ok(StatusKind::Normal),
            "wildlife_alert" | "animal_alert" => Ok(StatusKind::WildlifeAlert),
            "intrusion_alert" | "human_alert" => Ok(StatusKind::IntrusionAlert),
            "weather_alert" => Ok(StatusKind::WeatherAlert),
            other => Err(Error::InvalidStatusValue(other.to_string())),
        }
    }
}

/// Who asked for a status commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitSource {
    Scan,
    Manual,
    Simulation,
    Reset,
}

/// The single global status value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub status: StatusKind,
    pub owner_job_id: String,
    pub updated_at: DateTime<Utc>,
}

impl SystemStatus {
    pub fn new(status: StatusKind, owner_job_id: impl Into<String>) -> Self {
        Self {
            status,
            owner_job_id: owner_job_id.into(),
            updated_at: Utc::now(),
        }
    }

    /// Status installed at process start.
    pub fn initial() -> Self {
        Self::new(StatusKind::Normal, crate::defaults::INIT_JOB_ID)
    }
}

/// Synthesize a job id for a transition that has no detection behind it.
///
/// Ids are `<prefix>_<uuidv7>`, so they sort by creation time and never
/// collide with detection ids.
pub fn synthetic_job_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::now_v7().simple())
}

// =============================================================================
// JOBS
// =============================================================================

/// What produced a job record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    #[default]
    Detection,
    Manual,
    Simulation,
    Reset,
}

/// Lifecycle of a job. Terminal states never change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    #[default]
    Submitted,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

/// A job record as stored in the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub job_id: String,
    pub kind: JobKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
    pub lifecycle_state: JobState,
    #[serde(default)]
    pub detected_labels: Vec<String>,
    /// Tri-state owner match; `None` means unknown or not applicable.
    pub is_owner: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<StatusKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    /// Build a fresh record from a patch.
    pub fn from_patch(job_id: impl Into<String>, patch: JobPatch, now: DateTime<Utc>) -> Self {
        let mut record = Self {
            job_id: job_id.into(),
            kind: JobKind::default(),
            category: None,
            item_id: None,
            source_path: None,
            lifecycle_state: JobState::Submitted,
            detected_labels: Vec::new(),
            is_owner: None,
            outcome: None,
            error: None,
            reason: None,
            created_at: now,
            completed_at: None,
            updated_at: now,
        };
        record.apply(patch, now);
        record
    }

    /// Merge a partial update: present fields overwrite, absent ones are kept.
    ///
    /// Returns `false` when the patch tried to move a terminal job to another
    /// state; every other field of the patch is still applied.
    pub fn apply(&mut self, patch: JobPatch, now: DateTime<Utc>) -> bool {
        let mut accepted = true;

        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(category) = patch.category {
            self.category = Some(category);
        }
        if let Some(item_id) = patch.item_id {
            self.item_id = Some(item_id);
        }
        if let Some(source_path) = patch.source_path {
            self.source_path = Some(source_path);
        }
        if let Some(labels) = patch.detected_labels {
            self.detected_labels = labels;
        }
        if let Some(is_owner) = patch.is_owner {
            self.is_owner = Some(is_owner);
        }
        if let Some(outcome) = patch.outcome {
            self.outcome = Some(outcome);
        }
        if let Some(error) = patch.error {
            self.error = Some(error);
        }
        if let Some(reason) = patch.reason {
            self.reason = Some(reason);
        }
        if let Some(state) = patch.lifecycle_state {
            if self.lifecycle_state.is_terminal() && state != self.lifecycle_state {
                accepted = false;
            } else if state != self.lifecycle_state {
                self.lifecycle_state = state;
                if state.is_terminal() {
                    self.completed_at = Some(now);
                }
            } else if state.is_terminal() && self.completed_at.is_none() {
                self.completed_at = Some(now);
            }
        }

        self.updated_at = now;
        accepted
    }
}

/// Partial update to a [`JobRecord`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobPatch {
    pub kind: Option<JobKind>,
    pub category: Option<Category>,
    pub item_id: Option<String>,
    pub source_path: Option<String>,
    pub lifecycle_state: Option<JobState>,
    pub detected_labels: Option<Vec<String>>,
    pub is_owner: Option<bool>,
    pub outcome: Option<StatusKind>,
    pub error: Option<String>,
    pub reason: Option<String>,
}

impl JobPatch {
    /// Patch recording a media item handed to the detector.
    pub fn submitted(item: &MediaItem) -> Self {
        Self {
            kind: Some(JobKind::Detection),
            category: Some(item.category),
            item_id: Some(item.item_id.clone()),
            source_path: Some(item.path.clone()),
            lifecycle_state: Some(JobState::Submitted),
            ..Default::default()
        }
    }

    /// Patch recording a classified detector answer.
    pub fn completed(result: &DetectionResult, outcome: StatusKind) -> Self {
        let mut patch = Self {
            lifecycle_state: Some(JobState::Completed),
            outcome: Some(outcome),
            ..Default::default()
        };
        match result {
            DetectionResult::Wildlife { labels } => patch.detected_labels = Some(labels.clone()),
            DetectionResult::Intrusion { is_owner } => patch.is_owner = *is_owner,
        }
        patch
    }

    /// Patch recording a detector failure.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            lifecycle_state: Some(JobState::Failed),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Terminal record for a transition that did not involve the detector.
    pub fn synthetic(kind: JobKind, outcome: StatusKind) -> Self {
        Self {
            kind: Some(kind),
            lifecycle_state: Some(JobState::Completed),
            outcome: Some(outcome),
            ..Default::default()
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.detected_labels = Some(labels);
        self
    }

    pub fn with_owner(mut self, is_owner: bool) -> Self {
        self.is_owner = Some(is_owner);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

// =============================================================================
// DETECTION
// =============================================================================

/// Structured answer of the remote detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "category")]
pub enum DetectionResult {
    /// Object labels found in a wildlife frame, in detection order.
    #[serde(rename = "wildlife")]
    Wildlife { labels: Vec<String> },
    /// Owner verification of a face frame. `None` when no face was found.
    #[serde(rename = "intrusion", rename_all = "camelCase")]
    Intrusion { is_owner: Option<bool> },
}

impl DetectionResult {
    pub fn category(&self) -> Category {
        match self {
            DetectionResult::Wildlife { .. } => Category::Wildlife,
            DetectionResult::Intrusion { .. } => Category::Intrusion,
        }
    }

    /// Classify this answer into the status it contributes to a cycle.
    pub fn classify(&self) -> StatusKind {
        match self {
            DetectionResult::Wildlife { labels } => {
                if crate::species::matching(labels).is_empty() {
                    StatusKind::Normal
                } else {
                    StatusKind::WildlifeAlert
                }
            }
            DetectionResult::Intrusion { is_owner } => match is_owner {
                Some(false) => StatusKind::IntrusionAlert,
                Some(true) | None => StatusKind::Normal,
            },
        }
    }
}

// =============================================================================
// ALERTS
// =============================================================================

/// Payload attached to an alert record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum AlertDetails {
    /// Raised by a scan cycle; carries the winning job.
    Detection { job: JobRecord },
    /// Raised by a manual status override.
    Manual {
        #[serde(rename = "jobId")]
        job_id: String,
    },
    /// Raised by a simulated event.
    Simulated {
        event: String,
        #[serde(rename = "jobId")]
        job_id: String,
    },
}

/// Immutable snapshot appended whenever the status becomes non-normal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: StatusKind,
    pub details: AlertDetails,
}

// =============================================================================
// MEDIA
// =============================================================================

/// One file in a watched media source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub category: Category,
    /// File name within the category directory.
    pub item_id: String,
    /// Path relative to the media root, e.g. `animals/1.jpg`.
    pub path: String,
    pub url: String,
    /// Number embedded in the file name, if any.
    pub ordinal: Option<u64>,
    #[serde(skip)]
    pub file_path: PathBuf,
}

impl MediaItem {
    /// Key used by the processed set.
    pub fn key(&self) -> String {
        item_key(self.category, &self.item_id)
    }

    /// Base job id for this item: `<category>_<ordinal>`, or the sanitized
    /// file stem when the name carries no number.
    pub fn base_job_id(&self) -> String {
        match self.ordinal {
            Some(ordinal) => format!("{}_{}", self.category, ordinal),
            None => {
                let stem = self
                    .item_id
                    .rsplit_once('.')
                    .map(|(stem, _)| stem)
                    .unwrap_or(&self.item_id);
                let sanitized: String = stem
                    .chars()
                    .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
                    .collect();
                format!("{}_{}", self.category, sanitized)
            }
        }
    }
}

/// Processed-set key for an item: `category/itemId`.
pub fn item_key(category: Category, item_id: &str) -> String {
    format!("{}/{}", category, item_id)
}

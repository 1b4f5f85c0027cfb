//! # fieldwatch-store
//!
//! In-memory state for the fieldwatch engine.
//!
//! This crate provides:
//! - [`JobRegistry`]: per-item detection job records with merge-on-upsert
//! - [`ProcessedSet`]: idempotence record of submitted media items
//! - [`AlertLog`]: bounded, newest-first alert history
//! - [`StatusStore`]: the single system status and its auto-reset timer
//! - [`MediaLibrary`]: ordinal-sorted listing of the watched media sources
//! - [`Stores`]: one handle over all of the above
//!
//! Every store is a cheap `Clone` handle over shared state, so the scan
//! coordinator and the HTTP layer hold the same instances.

pub mod alert_log;
pub mod media;
pub mod registry;
pub mod status;
pub mod stores;

// Re-export core types
pub use fieldwatch_core::*;

pub use alert_log::AlertLog;
pub use media::MediaLibrary;
pub use registry::{JobRegistry, ProcessedSet};
pub use status::{CommitOutcome, StatusConfig, StatusSnapshot, StatusStore};
pub use stores::Stores;

//! # fieldwatch-jobs
//!
//! Scan coordination for the fieldwatch engine.
//!
//! This crate provides:
//! - [`ScanCoordinator`]: one scan cycle over both media sources, with
//!   exactly-once submission and a priority merge of the outcomes
//! - [`Scheduler`]: warm-up delay plus fixed-interval cycles, single-flight
//! - Event notifications via broadcast channels
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use fieldwatch_jobs::{ScanConfig, ScanCoordinator, Scheduler, SchedulerConfig};
//! use fieldwatch_store::Stores;
//!
//! let coordinator = ScanCoordinator::new(Stores::from_env(), detector, ScanConfig::from_env());
//! let handle = Scheduler::new(coordinator, SchedulerConfig::from_env()).start();
//!
//! let mut events = handle.events();
//! while let Ok(event) = events.recv().await {
//!     println!("Event: {:?}", event);
//! }
//!
//! handle.shutdown().await?;
//! ```

pub mod coordinator;
pub mod scheduler;

// Re-export core types
pub use fieldwatch_core::*;

pub use coordinator::{
    merge_outcomes, CycleReport, ItemOutcome, ScanConfig, ScanCoordinator, ScanOutcome,
};
pub use scheduler::{ScanEvent, Scheduler, SchedulerConfig, SchedulerHandle};

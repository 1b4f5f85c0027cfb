//! # fieldwatch-core
//!
//! Core types, traits, and abstractions for the fieldwatch surveillance
//! status engine.
//!
//! This crate provides the data model shared by the stores, the scan
//! coordinator, the detector adapter and the HTTP API.

pub mod defaults;
pub mod error;
pub mod models;
pub mod species;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use species::{SpeciesInfo, WildlifeSighting, WILDLIFE_ROSTER};
pub use traits::DetectionClient;

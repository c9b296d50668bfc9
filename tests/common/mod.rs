#![allow(unused_imports)]
//! Shared test utilities for integration tests.
//!
//! # Modules
//!
//! - `repositories`: scripted repositories that record every tier query
//! - `transforms`: counting transformations and a manually drained worker queue
//! - `assertions`: assertion helpers with readable failure messages

pub mod assertions;
pub mod repositories;
pub mod transforms;

pub use assertions::{assert_error_contains, assert_ok};
pub use repositories::{
    coordinate, metadata, CallLog, ListScript, Scripted, ScriptedRepository, GROUP, NAME,
};
pub use transforms::{artifact_on_disk, lazy_artifact, CountingTransform, RecordingQueue};

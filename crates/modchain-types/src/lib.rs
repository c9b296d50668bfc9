//! Shared types for the modchain workspace.
//!
//! This crate provides the foundational values passed between the resolver and
//! the transform pipeline:
//!
//! - [`identifiers`]: requested coordinates, module and artifact identifiers
//! - [`metadata`]: resolved module metadata and its source handle
//! - [`attributes`]: immutable attribute sets describing artifact variants
//! - [`env_utils`]: environment variable helpers used by configuration

pub mod attributes;
pub mod env_utils;
pub mod identifiers;
pub mod metadata;

pub use attributes::AttributeSet;
pub use identifiers::{ArtifactId, ModuleId, ModuleVersionId, RequestedCoordinate};
pub use metadata::{ModuleMetadata, ModuleSource};

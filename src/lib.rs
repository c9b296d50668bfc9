//! Module dependency resolution and artifact transformation.
//!
//! - **Resolution**: find the best matching module version across an ordered
//!   chain of repositories, asking cheap local tiers before remote ones
//!   (see [`modchain_resolver`]).
//! - **Transformation**: reshape resolved artifacts through lazy, cached,
//!   at-most-once transform chains (see [`modchain_transform`]).
//!
//! [`DependencyResolutionService`] wires both together from a
//! [`PipelineConfig`].

pub mod config;
pub mod service;

pub use config::PipelineConfig;
pub use service::DependencyResolutionService;

pub use modchain_resolver as resolver;
pub use modchain_transform as transform;
pub use modchain_types as types;

//! Module version resolution across an ordered repository chain.
//!
//! This crate provides:
//! - [`engine`]: the two-phase (local, then remote) chain resolver
//! - [`state`]: per-repository search progress and version strategies
//! - [`oracle`]: pluggable version matching/ordering and its stock implementation
//! - [`repository`]: the access-tier seams repositories implement
//! - [`memory`]: an in-memory two-tier repository
//! - [`metrics`]: resolution counters
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use modchain_resolver::{DefaultVersionOracle, InMemoryRepository, RepositoryChainResolver};
//! use modchain_types::{ModuleMetadata, ModuleVersionId, RequestedCoordinate};
//!
//! let central = InMemoryRepository::new("central");
//! central.publish(ModuleMetadata::new(ModuleVersionId::new("org.example", "core", "1.4")));
//!
//! let mut resolver = RepositoryChainResolver::new(Arc::new(DefaultVersionOracle::new()));
//! resolver.add(Arc::new(central));
//!
//! let module = resolver
//!     .resolve(&RequestedCoordinate::new("org.example", "core", "1.+"))
//!     .unwrap();
//! assert_eq!(module.id.version, "1.4");
//! ```

pub mod engine;
pub mod errors;
pub mod memory;
pub mod metrics;
pub mod oracle;
pub mod outcome;
pub mod repository;
pub mod state;

pub use engine::{choose_best, RepositoryChainResolver, ResolvedModule, WinningResolution};
pub use errors::ResolveError;
pub use memory::InMemoryRepository;
pub use metrics::{MetricsSnapshot, ResolutionMetrics};
pub use oracle::{compare_versions, DefaultVersionOracle, VersionOracle, DEFAULT_STATUS_SCHEME};
pub use outcome::{ResolutionOutcome, ResolvedMetadata, VersionListing};
pub use repository::{ModuleRepository, RepositoryAccess};
pub use state::{AccessProgress, SearchState, VersionStrategy};

//! In-memory two-tier repository.
//!
//! The local tier is a cache: a hit is authoritative, a miss is `Unknown`
//! (the remote tier should be asked) and its listings are only
//! `ProbablyListed` because the cache may lag behind what is published.
//! The remote tier knows every published module and fills the local cache on
//! every descriptor it serves.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::anyhow;
use modchain_types::{ModuleId, ModuleMetadata, ModuleSource, ModuleVersionId};
use parking_lot::RwLock;

use crate::outcome::{ResolutionOutcome, ResolvedMetadata, VersionListing};
use crate::repository::{ModuleRepository, RepositoryAccess};

#[derive(Debug, Clone)]
struct StoredModule {
    metadata: ModuleMetadata,
    synthesized: bool,
}

#[derive(Debug, Default)]
struct ModuleStore {
    modules: RwLock<BTreeMap<ModuleVersionId, StoredModule>>,
}

impl ModuleStore {
    fn get(&self, id: &ModuleVersionId) -> Option<StoredModule> {
        self.modules.read().get(id).cloned()
    }

    fn put(&self, module: StoredModule) {
        self.modules.write().insert(module.metadata.id.clone(), module);
    }

    fn versions(&self, module: &ModuleId) -> Vec<String> {
        self.modules
            .read()
            .keys()
            .filter(|id| id.group == module.group && id.name == module.name)
            .map(|id| id.version.clone())
            .collect()
    }

    fn len(&self) -> usize {
        self.modules.read().len()
    }
}

fn found(repository: &str, tier: &str, module: StoredModule) -> ResolutionOutcome {
    let source = ModuleSource::new(repository, format!("{}:{}", tier, module.metadata.id));
    ResolutionOutcome::Resolved(ResolvedMetadata {
        metadata: module.metadata,
        source,
        synthesized: module.synthesized,
    })
}

struct CacheAccess {
    repository: String,
    cache: Arc<ModuleStore>,
}

impl RepositoryAccess for CacheAccess {
    fn resolve_metadata(&self, id: &ModuleVersionId) -> ResolutionOutcome {
        match self.cache.get(id) {
            Some(module) => found(&self.repository, "cache", module),
            None => ResolutionOutcome::Unknown,
        }
    }

    fn list_versions(&self, module: &ModuleId) -> VersionListing {
        VersionListing::ProbablyListed(self.cache.versions(module))
    }
}

struct RemoteAccess {
    repository: String,
    published: Arc<ModuleStore>,
    cache: Arc<ModuleStore>,
    failure: Arc<RwLock<Option<String>>>,
}

impl RemoteAccess {
    fn check_available(&self) -> Option<anyhow::Error> {
        self.failure
            .read()
            .as_ref()
            .map(|message| anyhow!("{}", message))
    }
}

impl RepositoryAccess for RemoteAccess {
    fn resolve_metadata(&self, id: &ModuleVersionId) -> ResolutionOutcome {
        if let Some(err) = self.check_available() {
            return ResolutionOutcome::Failed(err);
        }
        match self.published.get(id) {
            Some(module) => {
                self.cache.put(module.clone());
                found(&self.repository, "remote", module)
            }
            None => ResolutionOutcome::Missing,
        }
    }

    fn list_versions(&self, module: &ModuleId) -> VersionListing {
        if let Some(err) = self.check_available() {
            return VersionListing::Failed(err);
        }
        VersionListing::Listed(self.published.versions(module))
    }
}

/// A repository backed by in-memory maps for both access tiers.
pub struct InMemoryRepository {
    name: String,
    local: CacheAccess,
    remote: RemoteAccess,
}

impl InMemoryRepository {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let cache = Arc::new(ModuleStore::default());
        Self {
            local: CacheAccess {
                repository: name.clone(),
                cache: Arc::clone(&cache),
            },
            remote: RemoteAccess {
                repository: name.clone(),
                published: Arc::new(ModuleStore::default()),
                cache,
                failure: Arc::new(RwLock::new(None)),
            },
            name,
        }
    }

    /// Publish a module with an authoritative descriptor.
    pub fn publish(&self, metadata: ModuleMetadata) -> &Self {
        self.remote.published.put(StoredModule {
            metadata,
            synthesized: false,
        });
        self
    }

    /// Publish a module whose descriptor the repository has to synthesize.
    pub fn publish_synthesized(&self, metadata: ModuleMetadata) -> &Self {
        self.remote.published.put(StoredModule {
            metadata,
            synthesized: true,
        });
        self
    }

    /// Seed the local cache directly, as if it was fetched earlier.
    pub fn cache(&self, metadata: ModuleMetadata) -> &Self {
        self.remote.cache.put(StoredModule {
            metadata,
            synthesized: false,
        });
        self
    }

    /// Make every remote request fail with `message` until cleared.
    pub fn fail_remote(&self, message: Option<&str>) {
        *self.remote.failure.write() = message.map(str::to_string);
    }

    pub fn cached_count(&self) -> usize {
        self.remote.cache.len()
    }

    pub fn published_count(&self) -> usize {
        self.remote.published.len()
    }
}

impl ModuleRepository for InMemoryRepository {
    fn name(&self) -> &str {
        &self.name
    }

    fn local_access(&self) -> &dyn RepositoryAccess {
        &self.local
    }

    fn remote_access(&self) -> &dyn RepositoryAccess {
        &self.remote
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(version: &str) -> ModuleMetadata {
        ModuleMetadata::new(ModuleVersionId::new("org.example", "core", version))
    }

    #[test]
    fn test_cache_miss_is_unknown() {
        let repo = InMemoryRepository::new("central");
        repo.publish(meta("1.0"));
        let id = ModuleVersionId::new("org.example", "core", "1.0");
        assert!(matches!(
            repo.local_access().resolve_metadata(&id),
            ResolutionOutcome::Unknown
        ));
    }

    #[test]
    fn test_remote_hit_fills_cache() {
        let repo = InMemoryRepository::new("central");
        repo.publish(meta("1.0")).publish(meta("1.1"));
        let id = ModuleVersionId::new("org.example", "core", "1.0");

        assert!(repo.remote_access().resolve_metadata(&id).is_resolved());
        assert_eq!(repo.cached_count(), 1);
        match repo.local_access().resolve_metadata(&id) {
            ResolutionOutcome::Resolved(found) => {
                assert_eq!(found.source.location, "cache:org.example:core:1.0");
                assert!(!found.synthesized);
            }
            other => panic!("expected cache hit, got {}", other.label()),
        }
    }

    #[test]
    fn test_listings_by_tier() {
        let repo = InMemoryRepository::new("central");
        repo.publish(meta("1.0")).publish(meta("2.0")).cache(meta("1.0"));
        let module = ModuleId::new("org.example", "core");

        match repo.local_access().list_versions(&module) {
            VersionListing::ProbablyListed(versions) => assert_eq!(versions, vec!["1.0"]),
            other => panic!("unexpected listing {:?}", other),
        }
        match repo.remote_access().list_versions(&module) {
            VersionListing::Listed(versions) => assert_eq!(versions, vec!["1.0", "2.0"]),
            other => panic!("unexpected listing {:?}", other),
        }
    }

    #[test]
    fn test_remote_failure_toggle() {
        let repo = InMemoryRepository::new("flaky");
        repo.publish(meta("1.0"));
        repo.fail_remote(Some("connection refused"));
        let id = ModuleVersionId::new("org.example", "core", "1.0");
        match repo.remote_access().resolve_metadata(&id) {
            ResolutionOutcome::Failed(err) => assert_eq!(err.to_string(), "connection refused"),
            other => panic!("expected failure, got {}", other.label()),
        }
        repo.fail_remote(None);
        assert!(repo.remote_access().resolve_metadata(&id).is_resolved());
    }

    #[test]
    fn test_synthesized_flag_is_kept() {
        let repo = InMemoryRepository::new("flat");
        repo.publish_synthesized(meta("0.9"));
        let id = ModuleVersionId::new("org.example", "core", "0.9");
        match repo.remote_access().resolve_metadata(&id) {
            ResolutionOutcome::Resolved(found) => assert!(found.synthesized),
            other => panic!("expected resolution, got {}", other.label()),
        }
        assert_eq!(repo.published_count(), 1);
    }
}

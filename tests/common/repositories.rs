//! Scripted repositories.
//!
//! Each access tier answers from a per-version script and appends every query
//! to a shared [`CallLog`], so tests can assert the exact order in which the
//! chain visited repositories and tiers.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;
use modchain::resolver::{ModuleRepository, RepositoryAccess, ResolutionOutcome, VersionListing};
use modchain::types::{
    ModuleId, ModuleMetadata, ModuleSource, ModuleVersionId, RequestedCoordinate,
};
use parking_lot::Mutex;

pub const GROUP: &str = "org.example";
pub const NAME: &str = "core";

pub fn coordinate(version: &str) -> RequestedCoordinate {
    RequestedCoordinate::new(GROUP, NAME, version)
}

pub fn metadata(version: &str) -> ModuleMetadata {
    ModuleMetadata::new(ModuleVersionId::new(GROUP, NAME, version))
}

/// Queries in the order they were made, as `"<repo>/<tier> <what>"`.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, entry: String) {
        self.0.lock().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    /// Entries naming `repository`.
    pub fn for_repository(&self, repository: &str) -> Vec<String> {
        let prefix = format!("{}/", repository);
        self.entries()
            .into_iter()
            .filter(|entry| entry.starts_with(&prefix))
            .collect()
    }
}

/// What a tier answers for one version.
#[derive(Debug, Clone)]
pub enum Scripted {
    Resolved,
    ResolvedWithStatus(&'static str),
    Synthesized,
    Missing,
    ProbablyMissing,
    Unknown,
    Fail(&'static str),
}

/// What a tier answers when asked for a version listing.
#[derive(Debug, Clone)]
pub enum ListScript {
    Listed(Vec<&'static str>),
    ProbablyListed(Vec<&'static str>),
    Fail(&'static str),
}

struct ScriptedAccess {
    label: String,
    log: CallLog,
    outcomes: HashMap<String, Scripted>,
    default: Scripted,
    listing: ListScript,
}

impl ScriptedAccess {
    fn new(label: String, log: CallLog, default: Scripted) -> Self {
        Self {
            label,
            log,
            outcomes: HashMap::new(),
            default,
            listing: ListScript::Listed(Vec::new()),
        }
    }
}

impl RepositoryAccess for ScriptedAccess {
    fn resolve_metadata(&self, id: &ModuleVersionId) -> ResolutionOutcome {
        self.log.record(format!("{} resolve {}", self.label, id.version));
        let script = self.outcomes.get(&id.version).unwrap_or(&self.default);
        let source = ModuleSource::new(self.label.clone(), id.to_string());
        match script {
            Scripted::Resolved => ResolutionOutcome::resolved(metadata(&id.version), source),
            Scripted::ResolvedWithStatus(status) => ResolutionOutcome::resolved(
                metadata(&id.version).with_status(*status),
                source,
            ),
            Scripted::Synthesized => ResolutionOutcome::synthesized(metadata(&id.version), source),
            Scripted::Missing => ResolutionOutcome::Missing,
            Scripted::ProbablyMissing => ResolutionOutcome::ProbablyMissing,
            Scripted::Unknown => ResolutionOutcome::Unknown,
            Scripted::Fail(message) => ResolutionOutcome::Failed(anyhow!("{}", message)),
        }
    }

    fn list_versions(&self, _module: &ModuleId) -> VersionListing {
        self.log.record(format!("{} list", self.label));
        match &self.listing {
            ListScript::Listed(versions) => VersionListing::Listed(owned(versions)),
            ListScript::ProbablyListed(versions) => VersionListing::ProbablyListed(owned(versions)),
            ListScript::Fail(message) => VersionListing::Failed(anyhow!("{}", message)),
        }
    }
}

fn owned(versions: &[&str]) -> Vec<String> {
    versions.iter().map(|v| v.to_string()).collect()
}

/// A repository whose local tier defaults to `Unknown` and whose remote tier
/// defaults to `Missing`.
pub struct ScriptedRepository {
    name: String,
    local: ScriptedAccess,
    remote: ScriptedAccess,
}

impl ScriptedRepository {
    pub fn new(name: &str, log: &CallLog) -> Self {
        Self {
            name: name.to_string(),
            local: ScriptedAccess::new(format!("{}/local", name), log.clone(), Scripted::Unknown),
            remote: ScriptedAccess::new(format!("{}/remote", name), log.clone(), Scripted::Missing),
        }
    }

    pub fn local(mut self, version: &str, script: Scripted) -> Self {
        self.local.outcomes.insert(version.to_string(), script);
        self
    }

    pub fn remote(mut self, version: &str, script: Scripted) -> Self {
        self.remote.outcomes.insert(version.to_string(), script);
        self
    }

    pub fn local_default(mut self, script: Scripted) -> Self {
        self.local.default = script;
        self
    }

    pub fn remote_default(mut self, script: Scripted) -> Self {
        self.remote.default = script;
        self
    }

    pub fn local_listing(mut self, listing: ListScript) -> Self {
        self.local.listing = listing;
        self
    }

    pub fn remote_listing(mut self, listing: ListScript) -> Self {
        self.remote.listing = listing;
        self
    }

    pub fn shared(self) -> Arc<dyn ModuleRepository> {
        Arc::new(self)
    }
}

impl ModuleRepository for ScriptedRepository {
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

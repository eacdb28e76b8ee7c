//! Agent catalog
//!
//! Holds every executable agent known to the process:
//!
//! - **Core** agents, constructed at startup and registered as instances.
//! - **Lazily loaded** agents, registered as `name -> factory` and
//!   constructed on first resolution. Concurrent first resolutions collapse
//!   into a single factory call; failures are not memoized.
//! - **External** tool providers and peer agents, listed per caller
//!   identity by [`AgentDirectory`] sources. Listings are cached per
//!   identity (read-through) until [`refresh`](AgentCatalog::refresh) or
//!   [`evict`](AgentCatalog::evict); connections are made on first use.
//!
//! A failing directory only hides its own agents; the catalog never fails
//! as a whole.

use crate::config::CatalogParams;
use crate::ports::agent::{Agent, AgentError};
use crate::ports::directory::{AgentDirectory, DirectoryEntry};
use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use relay_domain::{AgentDescriptor, AgentOrigin, AgentStatus, Identity};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Constructor for a lazily loaded agent.
pub type AgentFactory =
    Arc<dyn Fn() -> BoxFuture<'static, Result<Arc<dyn Agent>, AgentError>> + Send + Sync>;

/// Wrap an async closure as an [`AgentFactory`].
pub fn agent_factory<F, Fut>(f: F) -> AgentFactory
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Arc<dyn Agent>, AgentError>> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

/// Resolution failures. Callers treat every variant as "not found".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Agent not found: {0}")]
    NotFound(String),

    #[error("Agent '{name}' failed to load: {message}")]
    LoadFailed { name: String, message: String },

    #[error("Agent '{0}' timed out while loading")]
    Timeout(String),
}

struct CatalogEntry {
    descriptor: AgentDescriptor,
    factory: Option<AgentFactory>,
    instance: OnceCell<Arc<dyn Agent>>,
}

struct OverlayEntry {
    directory: Arc<dyn AgentDirectory>,
    descriptor: AgentDescriptor,
    reachable: bool,
    instance: OnceCell<Arc<dyn Agent>>,
}

impl OverlayEntry {
    /// Descriptor as offered to the selector, or `None` when hidden.
    fn visible_descriptor(&self) -> Option<AgentDescriptor> {
        if self.descriptor.status == AgentStatus::Unavailable {
            return None;
        }
        match (self.descriptor.origin, self.reachable) {
            (_, true) => Some(self.descriptor.clone()),
            (AgentOrigin::ExternalPeer, false) => None,
            (_, false) => Some(self.descriptor.clone().with_status(AgentStatus::Degraded)),
        }
    }
}

/// Identity-scoped external agents.
struct Overlay {
    entries: Vec<OverlayEntry>,
}

impl Overlay {
    fn find(&self, name: &str) -> Option<&OverlayEntry> {
        self.entries.iter().find(|e| e.descriptor.name == name)
    }
}

/// Registry of executable agents, injected into the selector and router.
pub struct AgentCatalog {
    entries: RwLock<BTreeMap<String, Arc<CatalogEntry>>>,
    directories: Vec<Arc<dyn AgentDirectory>>,
    /// Per-identity cells; a listing runs outside the map lock.
    overlays: RwLock<HashMap<Identity, Arc<OnceCell<Arc<Overlay>>>>>,
    params: CatalogParams,
}

impl AgentCatalog {
    pub fn new(params: CatalogParams) -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            directories: Vec::new(),
            overlays: RwLock::new(HashMap::new()),
            params,
        }
    }

    pub fn with_directory(mut self, directory: Arc<dyn AgentDirectory>) -> Self {
        self.directories.push(directory);
        self
    }

    fn factory_timeout(&self) -> Duration {
        self.params.factory_timeout
    }

    // ==================== Registration ====================

    /// Register a lazily constructed agent. Last writer wins for a name.
    pub fn register(&self, descriptor: AgentDescriptor, factory: AgentFactory) {
        let name = descriptor.name.clone();
        let entry = CatalogEntry {
            descriptor,
            factory: Some(factory),
            instance: OnceCell::new(),
        };
        self.insert(name, entry);
    }

    /// Register an already constructed agent.
    pub fn register_instance(&self, agent: Arc<dyn Agent>) {
        let descriptor = agent.descriptor().clone();
        let name = descriptor.name.clone();
        let entry = CatalogEntry {
            descriptor,
            factory: None,
            instance: OnceCell::new_with(Some(agent)),
        };
        self.insert(name, entry);
    }

    fn insert(&self, name: String, entry: CatalogEntry) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.insert(name.clone(), Arc::new(entry)).is_some() {
            debug!(agent = %name, "Replaced catalog registration");
        }
    }

    fn entry(&self, name: &str) -> Option<Arc<CatalogEntry>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    // ==================== Lookup ====================

    pub fn contains(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    /// Descriptor of a registered (non-external) agent.
    pub fn descriptor(&self, name: &str) -> Option<AgentDescriptor> {
        self.entry(name).map(|e| e.descriptor.clone())
    }

    /// Descriptors of every registered (non-external) agent, name-sorted.
    pub fn registered(&self) -> Vec<AgentDescriptor> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|e| e.descriptor.clone())
            .collect()
    }

    /// Whether a lazy agent has been constructed yet.
    pub fn is_loaded(&self, name: &str) -> bool {
        self.entry(name).is_some_and(|e| e.instance.initialized())
    }

    /// Resolve a registered agent, constructing it on first use.
    pub async fn resolve(&self, name: &str) -> Result<Arc<dyn Agent>, CatalogError> {
        let entry = self
            .entry(name)
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))?;

        let timeout = self.factory_timeout();
        entry
            .instance
            .get_or_try_init(|| async {
                let Some(factory) = entry.factory.as_ref() else {
                    return Err(CatalogError::NotFound(name.to_string()));
                };
                info!(agent = %name, "Loading agent");
                match tokio::time::timeout(timeout, factory()).await {
                    Ok(Ok(agent)) => Ok(agent),
                    Ok(Err(e)) => {
                        warn!(agent = %name, error = %e, "Agent factory failed");
                        Err(CatalogError::LoadFailed {
                            name: name.to_string(),
                            message: e.to_string(),
                        })
                    }
                    Err(_) => {
                        warn!(agent = %name, "Agent factory timed out");
                        Err(CatalogError::Timeout(name.to_string()))
                    }
                }
            })
            .await
            .cloned()
    }

    /// Resolve `name` for a caller: registered agents first, then the
    /// caller's external agents.
    pub async fn resolve_for(
        &self,
        name: &str,
        identity: Option<&Identity>,
    ) -> Result<Arc<dyn Agent>, CatalogError> {
        if self.contains(name) {
            return self.resolve(name).await;
        }
        let Some(identity) = identity else {
            return Err(CatalogError::NotFound(name.to_string()));
        };

        let overlay = self.overlay(identity).await;
        let entry = overlay
            .find(name)
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))?;
        if entry.visible_descriptor().is_none() {
            return Err(CatalogError::NotFound(name.to_string()));
        }

        let timeout = self.factory_timeout();
        entry
            .instance
            .get_or_try_init(|| async {
                info!(agent = %name, identity = %identity, directory = entry.directory.id(), "Connecting external agent");
                match tokio::time::timeout(timeout, entry.directory.connect(identity, &entry.descriptor)).await {
                    Ok(Ok(agent)) => Ok(agent),
                    Ok(Err(e)) => {
                        warn!(agent = %name, error = %e, "External agent connect failed");
                        Err(CatalogError::LoadFailed {
                            name: name.to_string(),
                            message: e.to_string(),
                        })
                    }
                    Err(_) => Err(CatalogError::Timeout(name.to_string())),
                }
            })
            .await
            .cloned()
    }

    // ==================== Availability ====================

    /// Agents a caller may be routed to.
    ///
    /// Registered agents always; with an identity, also that identity's
    /// external agents. Unreachable peers are hidden, unreachable tools are
    /// reported as degraded, and external names never shadow registered ones.
    pub async fn available_for(&self, identity: Option<&Identity>) -> Vec<AgentDescriptor> {
        let mut available: Vec<AgentDescriptor> = self
            .registered()
            .into_iter()
            .filter(|d| d.is_selectable())
            .collect();

        if let Some(identity) = identity {
            let overlay = self.overlay(identity).await;
            for entry in &overlay.entries {
                if available.iter().any(|d| d.name == entry.descriptor.name) {
                    debug!(agent = %entry.descriptor.name, "External agent shadowed by registered agent");
                    continue;
                }
                if let Some(descriptor) = entry.visible_descriptor() {
                    available.push(descriptor);
                }
            }
        }

        available
    }

    /// Name-sorted listing of `name: description [tags] (origin)` lines.
    pub async fn capability_summary(&self, identity: Option<&Identity>) -> String {
        let mut available = self.available_for(identity).await;
        available.sort_by(|a, b| a.name.cmp(&b.name));
        available
            .iter()
            .map(|d| d.summary_line())
            .collect::<Vec<_>>()
            .join("\n")
    }

    // ==================== Identity overlays ====================

    async fn overlay(&self, identity: &Identity) -> Arc<Overlay> {
        let cell = self.overlay_cell(identity);
        cell.get_or_init(|| async { Arc::new(self.load_overlay(identity).await) })
            .await
            .clone()
    }

    fn overlay_cell(&self, identity: &Identity) -> Arc<OnceCell<Arc<Overlay>>> {
        if let Some(cell) = self
            .overlays
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identity)
        {
            return cell.clone();
        }
        self.overlays
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(identity.clone())
            .or_default()
            .clone()
    }

    async fn load_overlay(&self, identity: &Identity) -> Overlay {
        let timeout = self.factory_timeout();
        let listings = join_all(self.directories.iter().map(|directory| async move {
            let result = tokio::time::timeout(timeout, directory.list(identity)).await;
            (directory.clone(), result)
        }))
        .await;

        let mut entries = Vec::new();
        for (directory, result) in listings {
            let listed: Vec<DirectoryEntry> = match result {
                Ok(Ok(listed)) => listed,
                Ok(Err(e)) => {
                    warn!(directory = directory.id(), identity = %identity, error = %e, "Directory listing failed");
                    continue;
                }
                Err(_) => {
                    warn!(directory = directory.id(), identity = %identity, "Directory listing timed out");
                    continue;
                }
            };

            for item in listed {
                if !item.descriptor.origin.is_external() {
                    warn!(agent = %item.descriptor.name, directory = directory.id(), "Ignoring non-external directory entry");
                    continue;
                }
                if entries
                    .iter()
                    .any(|e: &OverlayEntry| e.descriptor.name == item.descriptor.name)
                {
                    debug!(agent = %item.descriptor.name, "Duplicate external agent; keeping first listing");
                    continue;
                }
                entries.push(OverlayEntry {
                    directory: directory.clone(),
                    descriptor: item.descriptor,
                    reachable: item.reachable,
                    instance: OnceCell::new(),
                });
            }
        }

        debug!(identity = %identity, count = entries.len(), "Loaded external agents");
        Overlay { entries }
    }

    /// Re-list the identity's external agents, replacing the cached overlay.
    pub async fn refresh(&self, identity: &Identity) {
        let overlay = Arc::new(self.load_overlay(identity).await);
        let cell = Arc::new(OnceCell::new_with(Some(overlay)));
        self.overlays
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identity.clone(), cell);
    }

    /// Drop the identity's cached external agents.
    pub async fn evict(&self, identity: &Identity) {
        let removed = self
            .overlays
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(identity);
        if removed.is_some() {
            debug!(identity = %identity, "Evicted external agents");
        }
    }
}

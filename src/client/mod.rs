//! Registry client.
//!
//! Mirrors a remote registry in memory and falls back to drafts held in a
//! local store when the remote is unreachable. Network failures never
//! surface as errors; they select a fallback or are logged.

pub mod local_store;
pub mod remote;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::ClientSettings;
use crate::domain::{Component, ComponentDraft, ComponentUpdate, LocationType, ProjectSummary};
use crate::search;

pub use local_store::{component_key, FileStore, LocalStore, MemoryStore, LAST_EDITED_KEY, PROJECTS_LIST_KEY};
pub use remote::{HttpRemote, RemoteRegistry};

/// Errors that can occur in the registry client
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Local store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which source populated the client's list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// The remote registry API
    Remote,
    /// Drafts from the local store
    LocalCache,
    /// Compiled-in defaults
    Builtin,
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::Remote => write!(f, "remote"),
            DataSource::LocalCache => write!(f, "local"),
            DataSource::Builtin => write!(f, "builtin"),
        }
    }
}

/// Location restriction for [`RegistryClient::filter_components`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationFilter {
    All,
    Only(LocationType),
}

impl LocationFilter {
    fn allows(&self, component: &Component) -> bool {
        match self {
            LocationFilter::All => true,
            LocationFilter::Only(location_type) => component.location_type == *location_type,
        }
    }
}

impl std::str::FromStr for LocationFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(LocationFilter::All);
        }
        Ok(LocationFilter::Only(s.parse()?))
    }
}

#[derive(Default)]
struct ClientState {
    components: Vec<Component>,
    source: Option<DataSource>,
}

/// Client-side mirror of the registry
pub struct RegistryClient {
    remote: Arc<dyn RemoteRegistry>,
    store: Arc<dyn LocalStore>,
    builtin: Vec<Component>,
    state: RwLock<ClientState>,
}

impl RegistryClient {
    pub fn new(remote: Arc<dyn RemoteRegistry>, store: Arc<dyn LocalStore>) -> Self {
        Self {
            remote,
            store,
            builtin: Vec::new(),
            state: RwLock::new(ClientState::default()),
        }
    }

    /// HTTP remote and file-backed store from settings
    pub fn from_settings(settings: &ClientSettings) -> Result<Self, ClientError> {
        let remote = HttpRemote::new(&settings.api_url, Duration::from_secs(settings.timeout_seconds))?;
        let store = FileStore::new(&settings.local_store);
        Ok(Self::new(Arc::new(remote), Arc::new(store)))
    }

    /// Components served when neither remote nor local store is usable
    pub fn with_builtin(mut self, components: Vec<Component>) -> Self {
        self.builtin = components;
        self
    }

    /// Source that populated the list, once initialized
    pub async fn data_source(&self) -> Option<DataSource> {
        self.state.read().await.source
    }

    /// Load the list from the first available source.
    ///
    /// Tries the remote, then local drafts, then built-in defaults. Later
    /// calls return the cached list.
    pub async fn initialize(&self) -> Vec<Component> {
        {
            let state = self.state.read().await;
            if state.source.is_some() {
                return state.components.clone();
            }
        }

        let mut state = self.state.write().await;
        if state.source.is_none() {
            let (components, source) = self.load().await;
            info!("Loaded {} components from {}", components.len(), source);
            state.components = components;
            state.source = Some(source);
        }
        state.components.clone()
    }

    async fn load(&self) -> (Vec<Component>, DataSource) {
        match self.remote.list().await {
            Ok(components) => return (components, DataSource::Remote),
            Err(e) => warn!("Error loading components from server, using local data: {}", e),
        }

        match self.load_projects().await {
            Ok(projects) => (
                projects.iter().map(ProjectSummary::to_component).collect(),
                DataSource::LocalCache,
            ),
            Err(e) => {
                warn!("Local store unreadable, using built-in components: {}", e);
                (self.builtin.clone(), DataSource::Builtin)
            }
        }
    }

    pub async fn get_all_components(&self) -> Vec<Component> {
        self.state.read().await.components.clone()
    }

    pub async fn get_component_by_id(&self, id: &str) -> Option<Component> {
        self.state
            .read()
            .await
            .components
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    pub async fn get_components_by_location(&self, location_type: LocationType) -> Vec<Component> {
        self.filter_components(LocationFilter::Only(location_type), "").await
    }

    /// Components matching every word of `query`
    pub async fn search_components(&self, query: &str) -> Vec<Component> {
        self.filter_components(LocationFilter::All, query).await
    }

    /// Components in `location` matching every word of `query`
    pub async fn filter_components(&self, location: LocationFilter, query: &str) -> Vec<Component> {
        let state = self.state.read().await;
        search::search(state.components.iter().filter(|c| location.allows(c)), query)
    }

    /// Update the mirror, then push the change to the remote.
    ///
    /// The mirror record is the one returned, whatever the remote answers.
    /// A remote failure is logged and the local change is kept.
    pub async fn register_component(&self, update: ComponentUpdate) -> Result<Component, ClientError> {
        let id = update
            .id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ClientError::Validation("Component ID is required".to_string()))?;

        let component = {
            let mut state = self.state.write().await;
            upsert(&mut state.components, &id, update.clone())
        };

        // The server's copy never replaces the mirror record or its location
        match self.remote.put(&id, &update).await {
            Ok(saved) => debug!("Saved component {} to server as {}", id, saved.location_type),
            Err(e) => warn!("Error saving component {} to server: {}", id, e),
        }

        Ok(component)
    }

    /// Delete a component.
    ///
    /// Local drafts are removed from the store without contacting the
    /// remote. Anything else is deleted remotely first; the mirror only
    /// changes if that succeeds.
    pub async fn delete_component(&self, id: &str) -> bool {
        let Some(component) = self.get_component_by_id(id).await else {
            warn!("Component not found: {}", id);
            return false;
        };

        if component.location_type == LocationType::Local {
            if let Err(e) = self.delete_draft(id).await {
                warn!("Error deleting local component {}: {}", id, e);
                return false;
            }
        } else if let Err(e) = self.remote.delete(id).await {
            warn!("Error deleting component {}: {}", id, e);
            return false;
        }

        let mut state = self.state.write().await;
        state.components.retain(|c| c.id != id);
        true
    }

    /// Save an editor draft to the local store and mirror it as a local
    /// component
    pub async fn save_local_draft(&self, draft: ComponentDraft) -> Result<Component, ClientError> {
        if draft.id.trim().is_empty() {
            return Err(ClientError::Validation("Component ID is required".to_string()));
        }

        self.store
            .set(&component_key(&draft.id), serde_json::to_string(&draft)?)
            .await?;
        self.store.set(LAST_EDITED_KEY, draft.id.clone()).await?;

        let summary = draft.summary();
        let mut projects = self.load_projects().await?;
        projects.retain(|p| p.id != draft.id);
        projects.push(summary.clone());
        projects.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        self.save_projects(&projects).await?;

        let component = summary.to_component();
        let mut state = self.state.write().await;
        match state.components.iter_mut().find(|c| c.id == draft.id) {
            Some(existing) if existing.location_type == LocationType::Local => *existing = component.clone(),
            Some(_) => {}
            None => state.components.push(component.clone()),
        }

        info!("Saved local draft {}", draft.id);
        Ok(component)
    }

    /// Read a saved draft
    pub async fn load_draft(&self, id: &str) -> Result<Option<ComponentDraft>, ClientError> {
        match self.store.get(&component_key(id)).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// The most recently saved draft, if it still exists
    pub async fn last_edited(&self) -> Result<Option<ComponentDraft>, ClientError> {
        match self.store.get(LAST_EDITED_KEY).await? {
            Some(id) => self.load_draft(&id).await,
            None => Ok(None),
        }
    }

    async fn delete_draft(&self, id: &str) -> Result<(), ClientError> {
        self.store.remove(&component_key(id)).await?;

        let mut projects = self.load_projects().await?;
        projects.retain(|p| p.id != id);
        self.save_projects(&projects).await?;

        if self.store.get(LAST_EDITED_KEY).await?.as_deref() == Some(id) {
            self.store.remove(LAST_EDITED_KEY).await?;
        }
        Ok(())
    }

    async fn load_projects(&self) -> Result<Vec<ProjectSummary>, ClientError> {
        match self.store.get(PROJECTS_LIST_KEY).await? {
            Some(json) if !json.trim().is_empty() => Ok(serde_json::from_str(&json)?),
            _ => Ok(Vec::new()),
        }
    }

    async fn save_projects(&self, projects: &[ProjectSummary]) -> Result<(), ClientError> {
        self.store
            .set(PROJECTS_LIST_KEY, serde_json::to_string(projects)?)
            .await
    }
}

fn upsert(components: &mut Vec<Component>, id: &str, update: ComponentUpdate) -> Component {
    match components.iter_mut().find(|c| c.id == id) {
        Some(existing) => {
            existing.apply(update);
            existing.clone()
        }
        None => {
            let component = Component::from_update(id, update);
            components.push(component.clone());
            component
        }
    }
}

//! Component registry.
//!
//! Provides a unified view of components across all locations (shared,
//! course-specific and development) merged with the metadata sidecar.
//!
//! # Sources of truth
//!
//! The filesystem decides which components exist; the metadata file decides
//! their descriptive fields. A scan therefore lists files first and overlays
//! metadata second, and a metadata entry without a file is never surfaced.
//!
//! # Storage Layout
//!
//! ```text
//! <root>/
//! ├── shared/components/*.html      # locationType = shared
//! ├── courses/<courseId>/*.html     # locationType = course
//! ├── dev/components/*.html         # locationType = development
//! └── docs/component-data.json      # metadata sidecar
//! ```

pub mod error;
pub mod lifecycle;
pub mod metadata;
pub mod scanner;
pub mod watcher;

use std::path::{Path, PathBuf};

use glob::Pattern;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::config::paths;
use crate::domain::{format_title, Component, ComponentKind, ComponentUpdate, LocationType, MetadataEntry};

pub use error::RegistryError;
pub use lifecycle::{CreateRequest, Placement, ValidationReport};
pub use metadata::MetadataStore;
pub use watcher::{ChangeFilter, RegistryWatcher, WatchHandle, WatcherError};

/// Settings a registry is constructed from
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Repository root containing shared/, courses/ and dev/
    pub root: PathBuf,
    /// Metadata sidecar file
    pub metadata_path: PathBuf,
    /// Site root used in generated URLs (may be empty)
    pub site_root: String,
    /// Glob matched against component file names
    pub component_pattern: String,
}

impl RegistryConfig {
    /// Default layout under `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            metadata_path: root.join(paths::METADATA_FILE),
            root,
            site_root: paths::DEFAULT_SITE_ROOT.to_string(),
            component_pattern: paths::COMPONENT_PATTERN.to_string(),
        }
    }

    pub fn with_site_root(mut self, site_root: impl Into<String>) -> Self {
        self.site_root = site_root.into();
        self
    }

    pub fn with_metadata_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.metadata_path = path.into();
        self
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    components: Vec<Component>,
    initialized: bool,
}

/// The canonical in-memory list of components.
///
/// Share it behind an `Arc`; every operation takes `&self`. Mutations hold
/// the state lock across their metadata write, so writers inside one
/// process are serialized.
#[derive(Debug)]
pub struct Registry {
    config: RegistryConfig,
    pattern: Pattern,
    metadata: MetadataStore,
    state: RwLock<RegistryState>,
}

impl Registry {
    /// Create an uninitialized registry
    pub fn new(config: RegistryConfig) -> Result<Self, RegistryError> {
        let pattern = Pattern::new(&config.component_pattern)?;
        let metadata = MetadataStore::new(config.metadata_path.clone());

        Ok(Self {
            config,
            pattern,
            metadata,
            state: RwLock::new(RegistryState::default()),
        })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    /// Compiled component file pattern
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub async fn is_initialized(&self) -> bool {
        self.state.read().await.initialized
    }

    /// Scan all locations once; later calls return the cached list
    pub async fn initialize(&self) -> Vec<Component> {
        {
            let state = self.state.read().await;
            if state.initialized {
                return state.components.clone();
            }
        }

        let mut state = self.state.write().await;
        if !state.initialized {
            state.components = self.scan().await;
            state.initialized = true;
        }
        state.components.clone()
    }

    /// Rebuild the list from disk regardless of initialization
    pub async fn rescan(&self) -> Vec<Component> {
        let mut state = self.state.write().await;
        state.components = self.scan().await;
        state.initialized = true;
        state.components.clone()
    }

    /// Clear the list and rebuild it from all locations
    pub async fn scan_all_locations(&self) -> Vec<Component> {
        let mut state = self.state.write().await;
        state.components.clear();
        state.components = self.scan().await;
        state.components.clone()
    }

    /// Scan filesystem then overlay metadata
    async fn scan(&self) -> Vec<Component> {
        let root = &self.config.root;
        let mut components = scanner::scan_location(
            root,
            Path::new(paths::SHARED_COMPONENTS_DIR),
            LocationType::Shared,
            None,
            &self.pattern,
        )
        .await;

        for course in scanner::list_courses(&root.join(paths::COURSES_DIR)).await {
            let found = scanner::scan_location(
                root,
                &paths::course_dir(&course),
                LocationType::Course,
                Some(&course),
                &self.pattern,
            )
            .await;
            components.extend(found);
        }

        components.extend(
            scanner::scan_location(
                root,
                Path::new(paths::DEV_COMPONENTS_DIR),
                LocationType::Development,
                None,
                &self.pattern,
            )
            .await,
        );

        let mut components = dedup_by_id(components);
        self.merge_metadata(&mut components).await;

        info!("Component registry initialized with {} components", components.len());
        components
    }

    /// Overlay metadata entries onto scanned records by id
    async fn merge_metadata(&self, components: &mut [Component]) {
        let entries = match self.metadata.load().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Error merging component data: {}", e);
                return;
            }
        };

        for component in components.iter_mut() {
            if let Some(entry) = entries.iter().find(|e| e.id == component.id) {
                if let Some(title) = entry.title.as_ref().filter(|t| !t.is_empty()) {
                    component.title = title.clone();
                }
                component.details.overlay(entry.details.clone());
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
        self.state
            .read()
            .await
            .components
            .iter()
            .filter(|c| c.location_type == location_type)
            .cloned()
            .collect()
    }

    /// Add or update a component.
    ///
    /// Only the fields present in `update` overwrite an existing record.
    /// Anything not in development is also written to the metadata file;
    /// the in-memory change stays even if that write fails.
    pub async fn register_component(&self, update: ComponentUpdate) -> Result<Component, RegistryError> {
        let id = update
            .id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| RegistryError::validation("Component ID is required"))?;

        let mut state = self.state.write().await;
        let index = match state.components.iter().position(|c| c.id == id) {
            Some(index) => {
                state.components[index].apply(update);
                index
            }
            None => {
                state.components.push(Component::from_update(&id, update));
                state.components.len() - 1
            }
        };

        let record = &mut state.components[index];
        if record.location_type != LocationType::Development {
            let entry = self.metadata_entry_for(record);
            record.title = entry.title.clone().unwrap_or_else(|| format_title(&record.id));
            record.details.overlay(entry.details.clone());

            let record = record.clone();
            self.metadata.upsert(entry).await?;
            info!("Registered component {} ({})", record.id, record.location_type);
            return Ok(record);
        }

        info!("Registered component {} ({})", record.id, record.location_type);
        Ok(record.clone())
    }

    /// Normalized metadata entry for a record
    fn metadata_entry_for(&self, component: &Component) -> MetadataEntry {
        let site_root = &self.config.site_root;
        let course = component.course_id.as_deref();

        let mut details = component.details.clone();
        details.category.get_or_insert_with(|| "general".to_string());
        details.description.get_or_insert_with(String::new);
        details.tags.get_or_insert_with(Vec::new);
        details.url = Some(paths::component_url(site_root, &component.id, course));
        details
            .documentation_url
            .get_or_insert_with(|| paths::documentation_url(site_root, &component.id, course));

        let title = if component.title.is_empty() {
            format_title(&component.id)
        } else {
            component.title.clone()
        };

        let mut entry = MetadataEntry::new(component.id.clone());
        entry.title = Some(title);
        entry.kind = Some(ComponentKind::for_course(course));
        entry.course_id = component.course_id.clone();
        entry.details = details;
        entry
    }

    /// In-memory removal only
    pub async fn remove_component(&self, id: &str) -> Option<Component> {
        let mut state = self.state.write().await;
        remove_by_id(&mut state.components, id)
    }

    /// Delete a component's file, record and metadata entry.
    ///
    /// Returns false for unknown ids and when the file cannot be deleted;
    /// the list is untouched in both cases.
    pub async fn delete_component(&self, id: &str) -> bool {
        let mut state = self.state.write().await;

        let Some(component) = state.components.iter().find(|c| c.id == id).cloned() else {
            warn!("Component not found: {}", id);
            return false;
        };

        if let Some(full_path) = &component.full_path {
            if let Err(e) = fs::remove_file(full_path).await {
                error!("Error deleting component {}: {}", id, e);
                return false;
            }
            info!("Deleted component file: {}", full_path.display());
        }

        remove_by_id(&mut state.components, id);

        if !matches!(
            component.location_type,
            LocationType::Development | LocationType::Local
        ) {
            match self.metadata.remove(id).await {
                Ok(true) => info!("Removed component {} from metadata", id),
                Ok(false) => {}
                Err(e) => warn!("Error removing component {} from metadata: {}", id, e),
            }
        }

        true
    }
}

fn remove_by_id(components: &mut Vec<Component>, id: &str) -> Option<Component> {
    let pos = components.iter().position(|c| c.id == id)?;
    Some(components.remove(pos))
}

/// Keep the first record for each id (shared, then courses, then dev)
fn dedup_by_id(components: Vec<Component>) -> Vec<Component> {
    let mut seen = std::collections::HashSet::new();
    components
        .into_iter()
        .filter(|c| {
            let fresh = seen.insert(c.id.clone());
            if !fresh {
                warn!(
                    "Duplicate component id {} in {}; keeping the first occurrence",
                    c.id,
                    c.path.as_deref().unwrap_or("?")
                );
            }
            fresh
        })
        .collect()
}

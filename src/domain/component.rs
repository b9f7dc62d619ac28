//! Component records and storage tiers.
//!
//! A component is a single interactive HTML snippet. Its identity comes from
//! the filesystem (`<id>.html`), its descriptive fields from the metadata
//! sidecar.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::metadata::ComponentDetails;

/// Storage tier of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationType {
    /// Cross-course component under `shared/components`
    Shared,

    /// Tied to one course under `courses/<courseId>`
    Course,

    /// Not yet promoted, under `dev/components`
    Development,

    /// Draft held only in the client's local store
    Local,
}

impl LocationType {
    /// Whether the filesystem is authoritative for this tier
    pub fn is_filesystem_backed(&self) -> bool {
        !matches!(self, LocationType::Local)
    }
}

impl std::fmt::Display for LocationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocationType::Shared => write!(f, "shared"),
            LocationType::Course => write!(f, "course"),
            LocationType::Development => write!(f, "development"),
            LocationType::Local => write!(f, "local"),
        }
    }
}

impl std::str::FromStr for LocationType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "shared" => Ok(LocationType::Shared),
            "course" | "course-specific" => Ok(LocationType::Course),
            "development" | "dev" => Ok(LocationType::Development),
            "local" => Ok(LocationType::Local),
            _ => anyhow::bail!("Unknown location type: {}", s),
        }
    }
}

/// A component as held in the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    /// Primary key, the file name without extension
    pub id: String,

    /// File name (`<id>.html`)
    pub name: String,

    /// Display title
    pub title: String,

    /// Location relative to the repository root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Absolute filesystem location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_path: Option<PathBuf>,

    /// Storage tier
    pub location_type: LocationType,

    /// Owning course (course components only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,

    /// File mtime, or the time of the last explicit write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,

    /// Descriptive fields merged from metadata
    #[serde(flatten)]
    pub details: ComponentDetails,
}

impl Component {
    /// Create a bare record with a derived name and title
    pub fn new(id: impl Into<String>, location_type: LocationType) -> Self {
        let id = id.into();
        Self {
            name: format!("{}.html", id),
            title: format_title(&id),
            id,
            path: None,
            full_path: None,
            location_type,
            course_id: None,
            last_modified: None,
            details: ComponentDetails::default(),
        }
    }

    /// Set the owning course
    pub fn with_course(mut self, course_id: impl Into<String>) -> Self {
        self.course_id = Some(course_id.into());
        self
    }

    /// Build a new record from an update payload.
    ///
    /// Records registered without a location are treated as shared, which
    /// means their metadata is persisted.
    pub fn from_update(id: &str, update: ComponentUpdate) -> Self {
        let mut component = Component::new(id, update.location_type.unwrap_or(LocationType::Shared));
        component.apply(update);
        component
    }

    /// Shallow-merge the fields present in `update` into this record
    pub fn apply(&mut self, update: ComponentUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(title) = update.title {
            self.title = title;
        }
        if update.path.is_some() {
            self.path = update.path;
        }
        if update.full_path.is_some() {
            self.full_path = update.full_path;
        }
        if let Some(location_type) = update.location_type {
            self.location_type = location_type;
        }
        if update.course_id.is_some() {
            self.course_id = update.course_id;
        }
        if update.last_modified.is_some() {
            self.last_modified = update.last_modified;
        }
        self.details.overlay(update.details);
    }

    /// All tags, or an empty slice
    pub fn tags(&self) -> &[String] {
        self.details.tags.as_deref().unwrap_or(&[])
    }
}

/// Partial component used by register operations.
///
/// Every field is optional so that only the provided keys overwrite an
/// existing record. `full_path` is never read from the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(skip)]
    pub full_path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_type: Option<LocationType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub details: ComponentDetails,
}

impl ComponentUpdate {
    /// Start an update for the given id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_location(mut self, location_type: LocationType) -> Self {
        self.location_type = Some(location_type);
        self
    }

    pub fn with_course(mut self, course_id: impl Into<String>) -> Self {
        self.course_id = Some(course_id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.details.description = Some(description.into());
        self
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.details.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }
}

impl From<Component> for ComponentUpdate {
    fn from(component: Component) -> Self {
        Self {
            id: Some(component.id),
            name: Some(component.name),
            title: Some(component.title),
            path: component.path,
            full_path: component.full_path,
            location_type: Some(component.location_type),
            course_id: component.course_id,
            last_modified: component.last_modified,
            details: component.details,
        }
    }
}

/// Turn a component id into a display title.
///
/// `"binary-search-tree"` becomes `"Binary Search Tree"`.
pub fn format_title(id: &str) -> String {
    id.split('-').map(capitalize).collect::<Vec<_>>().join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

//! Drafts authored in the editor and kept in the client's local store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::component::{format_title, Component, LocationType};

/// Full draft stored under `component_<id>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDraft {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub css: String,
    #[serde(default)]
    pub js: String,
    pub last_modified: DateTime<Utc>,
}

impl ComponentDraft {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: format!("{}.html", id),
            id,
            html: String::new(),
            css: String::new(),
            js: String::new(),
            last_modified: Utc::now(),
        }
    }

    pub fn summary(&self) -> ProjectSummary {
        ProjectSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            last_modified: self.last_modified,
        }
    }
}

/// Entry of the `projectsList` index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
    pub last_modified: DateTime<Utc>,
}

impl ProjectSummary {
    /// Registry record for a locally stored draft
    pub fn to_component(&self) -> Component {
        let mut component = Component::new(self.id.clone(), LocationType::Local);
        component.name = self.name.clone();
        component.title = format_title(&self.id);
        component.last_modified = Some(self.last_modified);
        component
    }
}

//! Descriptive metadata and the sidecar file schema.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Kind recorded in the metadata `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentKind {
    Shared,
    CourseSpecific,
    Development,
}

impl ComponentKind {
    /// Kind derived from whether a component belongs to a course
    pub fn for_course(course_id: Option<&str>) -> Self {
        if course_id.is_some() {
            ComponentKind::CourseSpecific
        } else {
            ComponentKind::Shared
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComponentKind::Shared => write!(f, "shared"),
            ComponentKind::CourseSpecific => write!(f, "course-specific"),
            ComponentKind::Development => write!(f, "development"),
        }
    }
}

/// Optional descriptive fields shared by records and metadata entries.
///
/// Absent keys mean "unknown", so overlaying one set onto another never
/// clears a field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_history: Option<Vec<VersionEntry>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub educational_context: Option<EducationalContext>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessibility: Option<Accessibility>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser_support: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<Author>>,
}

impl ComponentDetails {
    /// Overwrite the fields that `other` provides
    pub fn overlay(&mut self, other: ComponentDetails) {
        overlay(&mut self.description, other.description);
        overlay(&mut self.category, other.category);
        overlay(&mut self.subcategory, other.subcategory);
        overlay(&mut self.tags, other.tags.map(dedup_tags));
        overlay(&mut self.url, other.url);
        overlay(&mut self.documentation_url, other.documentation_url);
        overlay(&mut self.version, other.version);
        overlay(&mut self.release_date, other.release_date);
        overlay(&mut self.version_history, other.version_history);
        overlay(&mut self.educational_context, other.educational_context);
        overlay(&mut self.accessibility, other.accessibility);
        overlay(&mut self.browser_support, other.browser_support);
        overlay(&mut self.authors, other.authors);
    }
}

fn overlay<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// Drop duplicate tags, keeping first occurrence order
pub fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tags.into_iter().filter(|t| seen.insert(t.clone())).collect()
}

/// One release in a component's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEntry {
    pub version: String,

    /// Release date, `YYYY-MM-DD`
    pub date: String,

    #[serde(default)]
    pub changes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationalContext {
    #[serde(default)]
    pub learning_objectives: Vec<String>,

    #[serde(default)]
    pub educational_level: Vec<String>,

    #[serde(default)]
    pub subject_areas: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accessibility {
    /// WCAG conformance level (A, AA, AAA)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wcag: Option<String>,

    #[serde(default)]
    pub features: Vec<String>,

    #[serde(default)]
    pub limitations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// One entry of the metadata sidecar file.
///
/// Keys this crate does not model (e.g. `dependencies`, `sourceUrl`) are
/// kept in `extra` so a read-modify-write cycle does not drop them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataEntry {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ComponentKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,

    #[serde(flatten)]
    pub details: ComponentDetails,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl MetadataEntry {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            kind: None,
            course_id: None,
            details: ComponentDetails::default(),
            extra: serde_json::Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_only_present_fields() {
        let mut base = ComponentDetails {
            description: Some("old".to_string()),
            category: Some("math".to_string()),
            ..Default::default()
        };

        base.overlay(ComponentDetails {
            description: Some("new".to_string()),
            ..Default::default()
        });

        assert_eq!(base.description.as_deref(), Some("new"));
        assert_eq!(base.category.as_deref(), Some("math"));
    }

    #[test]
    fn test_overlay_dedups_tags() {
        let mut base = ComponentDetails::default();
        base.overlay(ComponentDetails {
            tags: Some(vec!["a".into(), "b".into(), "a".into()]),
            ..Default::default()
        });
        assert_eq!(base.tags, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_entry_parses_sidecar_schema() {
        let json = r#"{
            "id": "binary-search",
            "title": "Binary Search",
            "category": "algorithms",
            "type": "course-specific",
            "courseId": "cs-101",
            "description": "Step through a search",
            "url": "/blackboard-content-hub/courses/cs-101/binary-search.html",
            "documentationUrl": "/blackboard-content-hub/docs/courses/cs-101/binary-search.html",
            "tags": ["search", "algorithms"],
            "versionHistory": [{"version": "1.0.0", "date": "2024-01-02", "changes": ["Initial release"]}],
            "dependencies": [{"id": "core", "version": "1.0.0"}]
        }"#;

        let entry: MetadataEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.kind, Some(ComponentKind::CourseSpecific));
        assert_eq!(entry.course_id.as_deref(), Some("cs-101"));
        assert_eq!(entry.details.category.as_deref(), Some("algorithms"));
        assert_eq!(entry.details.version_history.as_ref().unwrap().len(), 1);
        assert!(entry.extra.contains_key("dependencies"));
        assert!(!entry.extra.contains_key("tags"));

        let back = serde_json::to_value(&entry).unwrap();
        assert_eq!(back["type"], "course-specific");
        assert_eq!(back["dependencies"][0]["id"], "core");
    }
}

//! Component lifecycle: create, promote, version and validate.
//!
//! These operations move files between locations and then go through
//! [`Registry::register_component`], so the metadata policy stays in one place.
//! Development records created or versioned here are also kept in the
//! metadata file as `development` entries, so the next process sees them
//! and promotion carries their details into production.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::info;

use super::scanner::relative_path;
use super::{Registry, RegistryError};
use crate::config::paths;
use crate::domain::{Component, ComponentKind, ComponentUpdate, LocationType, VersionEntry};

/// Where a component's file lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    Development,
    Shared,
    Course(String),
}

impl Placement {
    /// Directory relative to the repository root
    pub fn relative_dir(&self) -> PathBuf {
        match self {
            Placement::Development => PathBuf::from(paths::DEV_COMPONENTS_DIR),
            Placement::Shared => PathBuf::from(paths::SHARED_COMPONENTS_DIR),
            Placement::Course(course_id) => paths::course_dir(course_id),
        }
    }

    pub fn location_type(&self) -> LocationType {
        match self {
            Placement::Development => LocationType::Development,
            Placement::Shared => LocationType::Shared,
            Placement::Course(_) => LocationType::Course,
        }
    }

    pub fn course_id(&self) -> Option<&str> {
        match self {
            Placement::Course(course_id) => Some(course_id.as_str()),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), RegistryError> {
        match self {
            Placement::Course(course_id) if !is_valid_id(course_id) => Err(RegistryError::validation(
                format!("Invalid course ID: {:?}", course_id),
            )),
            _ => Ok(()),
        }
    }
}

/// Input for [`Registry::create_component`]
#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub id: String,
    pub placement: Placement,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub version: Option<String>,
    /// File contents; a minimal document is written when absent
    pub html: Option<String>,
}

impl CreateRequest {
    pub fn new(id: impl Into<String>, placement: Placement) -> Self {
        Self {
            id: id.into(),
            placement,
            title: None,
            description: None,
            category: None,
            tags: Vec::new(),
            version: None,
            html: None,
        }
    }
}

/// Outcome of [`Registry::validate_component`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub id: String,
    pub missing_fields: Vec<&'static str>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.missing_fields.is_empty() && self.errors.is_empty()
    }
}

const INITIAL_VERSION: &str = "1.0.0";
const WCAG_LEVELS: [&str; 3] = ["A", "AA", "AAA"];

impl Registry {
    /// Write a new component file and register it
    pub async fn create_component(&self, request: CreateRequest) -> Result<Component, RegistryError> {
        if !is_valid_id(&request.id) {
            return Err(RegistryError::validation(format!(
                "Component ID must be lowercase words separated by hyphens: {:?}",
                request.id
            )));
        }
        request.placement.validate()?;

        let version = request.version.clone().unwrap_or_else(|| INITIAL_VERSION.to_string());
        if !is_valid_version(&version) {
            return Err(RegistryError::validation(format!(
                "Version must be in format x.y.z: {:?}",
                version
            )));
        }

        self.initialize().await;
        if self.get_component_by_id(&request.id).await.is_some() {
            return Err(RegistryError::AlreadyExists(request.id));
        }

        let rel_dir = request.placement.relative_dir();
        let name = format!("{}.html", request.id);
        let dir = self.root().join(&rel_dir);
        let full_path = dir.join(&name);
        if full_path.exists() {
            return Err(RegistryError::AlreadyExists(request.id));
        }

        let title = request
            .title
            .clone()
            .unwrap_or_else(|| crate::domain::format_title(&request.id));
        let html = request.html.clone().unwrap_or_else(|| {
            default_document(&title, request.description.as_deref().unwrap_or(""), &version)
        });

        fs::create_dir_all(&dir).await?;
        fs::write(&full_path, html).await?;
        info!("Created component file: {}", full_path.display());

        let today = today();
        let mut update = ComponentUpdate::new(request.id.clone()).with_title(title);
        update.name = Some(name.clone());
        update.path = Some(relative_path(&rel_dir.join(&name)));
        update.last_modified = file_mtime(&full_path).await;
        update.full_path = Some(full_path);
        update.location_type = Some(request.placement.location_type());
        update.course_id = request.placement.course_id().map(str::to_owned);
        update.details.description = request.description;
        update.details.category = request.category;
        if !request.tags.is_empty() {
            update.details.tags = Some(request.tags);
        }
        update.details.version = Some(version.clone());
        update.details.release_date = Some(today.clone());
        update.details.version_history = Some(vec![VersionEntry {
            version,
            date: today,
            changes: vec!["Initial release".to_string()],
        }]);

        self.register_lifecycle(update).await
    }

    /// Move a development component into a shared or course location
    pub async fn promote_component(&self, id: &str, target: Placement) -> Result<Component, RegistryError> {
        if target == Placement::Development {
            return Err(RegistryError::validation("Promotion target must be shared or a course"));
        }
        target.validate()?;

        self.initialize().await;
        let component = self
            .get_component_by_id(id)
            .await
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;

        if component.location_type != LocationType::Development {
            return Err(RegistryError::InvalidTransition {
                id: id.to_string(),
                reason: format!("already in {}", component.location_type),
            });
        }

        let source = component
            .full_path
            .clone()
            .unwrap_or_else(|| self.root().join(paths::DEV_COMPONENTS_DIR).join(&component.name));

        let rel_dir = target.relative_dir();
        let dest_dir = self.root().join(&rel_dir);
        let dest = dest_dir.join(&component.name);
        if dest.exists() {
            return Err(RegistryError::AlreadyExists(dest.display().to_string()));
        }

        fs::create_dir_all(&dest_dir).await?;
        fs::copy(&source, &dest).await?;
        fs::remove_file(&source).await?;
        info!("Component file moved to: {}", dest.display());

        let site_root = &self.config().site_root;
        let course = target.course_id();
        let mut update = ComponentUpdate::new(id);
        update.path = Some(relative_path(&rel_dir.join(&component.name)));
        update.last_modified = file_mtime(&dest).await;
        update.full_path = Some(dest);
        update.location_type = Some(target.location_type());
        update.course_id = course.map(str::to_owned);
        update.details.url = Some(paths::component_url(site_root, id, course));
        update.details.documentation_url = Some(paths::documentation_url(site_root, id, course));

        self.register_component(update).await
    }

    /// Record a new release of a component
    pub async fn version_component(
        &self,
        id: &str,
        version: &str,
        changes: Vec<String>,
    ) -> Result<Component, RegistryError> {
        if !is_valid_version(version) {
            return Err(RegistryError::validation(format!(
                "Version must be in format x.y.z: {:?}",
                version
            )));
        }

        let changes: Vec<String> = changes
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        if changes.is_empty() {
            return Err(RegistryError::validation("Changes are required"));
        }

        self.initialize().await;
        let component = self
            .get_component_by_id(id)
            .await
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;

        let date = today();
        let mut history = component.details.version_history.clone().unwrap_or_default();
        history.push(VersionEntry {
            version: version.to_string(),
            date: date.clone(),
            changes,
        });

        let mut update = ComponentUpdate::new(id);
        if let Some(full_path) = component.full_path.as_deref().filter(|p| p.exists()) {
            let html = fs::read_to_string(full_path).await?;
            if let Some(updated) = rewrite_version_meta(&html, version) {
                fs::write(full_path, updated).await?;
                info!("Component HTML file updated with new version: {}", full_path.display());
                update.last_modified = file_mtime(full_path).await;
            }
        }

        update.details.version = Some(version.to_string());
        update.details.release_date = Some(date);
        update.details.version_history = Some(history);

        self.register_lifecycle(update).await
    }

    /// Register a change, then save development records as `development`
    /// metadata entries
    async fn register_lifecycle(&self, update: ComponentUpdate) -> Result<Component, RegistryError> {
        let component = self.register_component(update).await?;
        if component.location_type != LocationType::Development {
            return Ok(component);
        }

        let site_root = &self.config().site_root;
        let mut entry = self.metadata_entry_for(&component);
        entry.kind = Some(ComponentKind::Development);
        entry.course_id = None;
        entry.details.url = Some(paths::dev_component_url(site_root, &component.id));
        entry.details.documentation_url = Some(paths::dev_documentation_url(site_root, &component.id));

        self.metadata().upsert(entry).await?;
        info!("Saved development component {} to metadata", component.id);
        Ok(component)
    }

    /// Check a component's metadata for completeness and format
    pub async fn validate_component(&self, id: &str) -> Result<ValidationReport, RegistryError> {
        self.initialize().await;
        let component = self
            .get_component_by_id(id)
            .await
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;

        Ok(validate_record(&component))
    }
}

/// Validation rules applied to one record
pub fn validate_record(component: &Component) -> ValidationReport {
    let mut report = ValidationReport {
        id: component.id.clone(),
        ..Default::default()
    };
    let details = &component.details;

    let present = |value: Option<&String>| value.map(|v| !v.trim().is_empty()).unwrap_or(false);
    if component.title.trim().is_empty() {
        report.missing_fields.push("title");
    }
    if !present(details.description.as_ref()) {
        report.missing_fields.push("description");
    }
    if !present(details.category.as_ref()) {
        report.missing_fields.push("category");
    }
    if !present(details.version.as_ref()) {
        report.missing_fields.push("version");
    }

    if !is_valid_id(&component.id) {
        report
            .errors
            .push(format!("id: Value {:?} is not lowercase kebab-case", component.id));
    }
    if let Some(version) = details.version.as_deref().filter(|v| !v.is_empty()) {
        if !is_valid_version(version) {
            report
                .errors
                .push(format!("version: Value {:?} does not match x.y.z", version));
        }
    }
    if let Some(wcag) = details.accessibility.as_ref().and_then(|a| a.wcag.as_deref()) {
        if !WCAG_LEVELS.contains(&wcag) {
            report
                .errors
                .push(format!("accessibility.wcag: Value {:?} is not one of A, AA, AAA", wcag));
        }
    }

    if component.location_type == LocationType::Course && component.course_id.is_none() {
        report
            .warnings
            .push("Course-specific component is missing courseId".to_string());
    }
    if component.tags().is_empty() {
        report.warnings.push("Component has no tags".to_string());
    }

    report
}

/// Lowercase alphanumeric words joined by single hyphens
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .split('-')
            .all(|word| !word.is_empty() && word.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()))
}

/// Semantic version in `x.y.z` form
pub fn is_valid_version(version: &str) -> bool {
    let parts: Vec<&str> = version.split('.').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}

/// Replace the content of `<meta name="version" content="...">`.
/// Returns `None` when the tag is absent.
pub fn rewrite_version_meta(html: &str, version: &str) -> Option<String> {
    const TAG: &str = r#"<meta name="version" content=""#;
    let start = html.find(TAG)? + TAG.len();
    let end = start + html[start..].find('"')?;

    let mut updated = String::with_capacity(html.len() + version.len());
    updated.push_str(&html[..start]);
    updated.push_str(version);
    updated.push_str(&html[end..]);
    Some(updated)
}

fn default_document(title: &str, description: &str, version: &str) -> String {
    let title = escape_html(title);
    let description = escape_html(description);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{title}</title>
  <meta name="description" content="{description}">
  <meta name="version" content="{version}">
</head>
<body>
  <main class="component" aria-label="{title}"></main>
</body>
</html>
"#
    )
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

async fn file_mtime(path: &Path) -> Option<DateTime<Utc>> {
    fs::metadata(path)
        .await
        .ok()?
        .modified()
        .ok()
        .map(DateTime::<Utc>::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_id() {
        assert!(is_valid_id("binary-search"));
        assert!(is_valid_id("quiz2"));
        assert!(!is_valid_id("Binary-Search"));
        assert!(!is_valid_id("double--hyphen"));
        assert!(!is_valid_id("-leading"));
        assert!(!is_valid_id(""));
    }

    #[test]
    fn test_is_valid_version() {
        assert!(is_valid_version("1.0.0"));
        assert!(is_valid_version("10.20.30"));
        assert!(!is_valid_version("1.0"));
        assert!(!is_valid_version("1.0.x"));
        assert!(!is_valid_version("1..0"));
    }

    #[test]
    fn test_rewrite_version_meta() {
        let html = r#"<head><meta name="version" content="1.0.0"></head>"#;
        assert_eq!(
            rewrite_version_meta(html, "1.1.0").unwrap(),
            r#"<head><meta name="version" content="1.1.0"></head>"#
        );
        assert!(rewrite_version_meta("<head></head>", "1.1.0").is_none());
    }

    #[test]
    fn test_default_document_escapes() {
        let doc = default_document("A <b> & \"c\"", "", "1.0.0");
        assert!(doc.contains("<title>A &lt;b&gt; &amp; &quot;c&quot;</title>"));
        assert!(doc.contains(r#"<meta name="version" content="1.0.0">"#));
    }

    #[test]
    fn test_validate_record() {
        let mut component = Component::new("quiz", LocationType::Course);
        component.details.version = Some("1.0".to_string());

        let report = validate_record(&component);
        assert!(!report.is_valid());
        assert!(report.missing_fields.contains(&"description"));
        assert!(report.missing_fields.contains(&"category"));
        assert_eq!(report.errors.len(), 1);
        assert!(report.warnings.iter().any(|w| w.contains("courseId")));
    }

    #[test]
    fn test_placement_dirs() {
        assert_eq!(Placement::Shared.relative_dir(), PathBuf::from("shared/components"));
        assert_eq!(
            Placement::Course("cs-101".to_string()).relative_dir(),
            PathBuf::from("courses/cs-101")
        );
        assert_eq!(Placement::Development.location_type(), LocationType::Development);
    }
}

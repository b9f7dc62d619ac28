//! Directory scanning for component files.
//!
//! Every scan function fails soft: an unreadable directory is logged and
//! contributes nothing, so one broken location never aborts a full scan.

use std::path::Path;

use chrono::{DateTime, Utc};
use glob::Pattern;
use tokio::fs;
use tracing::{debug, warn};

use crate::domain::{Component, LocationType};

/// Scan one directory for component files
pub async fn scan_location(
    root: &Path,
    rel_dir: &Path,
    location_type: LocationType,
    course_id: Option<&str>,
    pattern: &Pattern,
) -> Vec<Component> {
    match read_location(root, rel_dir, location_type, course_id, pattern).await {
        Ok(components) => components,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Location {} does not exist", rel_dir.display());
            Vec::new()
        }
        Err(e) => {
            warn!("Error scanning directory {}: {}", rel_dir.display(), e);
            Vec::new()
        }
    }
}

async fn read_location(
    root: &Path,
    rel_dir: &Path,
    location_type: LocationType,
    course_id: Option<&str>,
    pattern: &Pattern,
) -> std::io::Result<Vec<Component>> {
    let dir = root.join(rel_dir);
    let mut entries = fs::read_dir(&dir).await?;
    let mut components = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        if !pattern.matches(&name) {
            continue;
        }

        // Follows symlinks; an entry that vanished mid-scan is skipped alone
        let metadata = match fs::metadata(entry.path()).await {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("Skipping {}: {}", entry.path().display(), e);
                continue;
            }
        };
        if !metadata.is_file() {
            continue;
        }

        let Some(id) = Path::new(&name)
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_owned)
        else {
            continue;
        };

        let last_modified = metadata.modified().ok().map(DateTime::<Utc>::from);

        let mut component = Component::new(id, location_type);
        component.path = Some(relative_path(&rel_dir.join(&name)));
        component.full_path = Some(dir.join(&name));
        component.name = name;
        component.course_id = course_id.map(str::to_owned);
        component.last_modified = last_modified;

        components.push(component);
    }

    components.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(components)
}

/// List course ids (subdirectories of the courses root), sorted
pub async fn list_courses(courses_root: &Path) -> Vec<String> {
    match read_courses(courses_root).await {
        Ok(courses) => courses,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(e) => {
            warn!("Error getting courses list: {}", e);
            Vec::new()
        }
    }
}

async fn read_courses(courses_root: &Path) -> std::io::Result<Vec<String>> {
    let mut entries = fs::read_dir(courses_root).await?;
    let mut courses = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        match entry.file_type().await {
            Ok(file_type) if file_type.is_dir() => {
                if let Some(name) = entry.file_name().to_str() {
                    courses.push(name.to_string());
                }
            }
            Ok(_) => {}
            Err(e) => warn!("Skipping {}: {}", entry.path().display(), e),
        }
    }

    courses.sort();
    Ok(courses)
}

/// Repository-relative path with forward slashes
pub fn relative_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

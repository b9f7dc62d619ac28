//! Canonical repository layout and URL templates.
//!
//! Single source of truth - import this instead of hardcoding paths.
//!
//! ## Layout
//!
//! ```text
//! <root>/
//! ├── shared/components/<id>.html      # shared
//! ├── courses/<courseId>/<id>.html     # course
//! ├── dev/components/<id>.html         # development
//! └── docs/component-data.json         # metadata sidecar
//! ```

use std::path::{Path, PathBuf};

/// Shared components directory (relative to the repository root)
pub const SHARED_COMPONENTS_DIR: &str = "shared/components";

/// Root of the per-course directories
pub const COURSES_DIR: &str = "courses";

/// Development components directory
pub const DEV_COMPONENTS_DIR: &str = "dev/components";

/// Metadata sidecar file
pub const METADATA_FILE: &str = "docs/component-data.json";

/// Default glob for component files
pub const COMPONENT_PATTERN: &str = "*.html";

/// Default URL prefix the site is published under
pub const DEFAULT_SITE_ROOT: &str = "blackboard-content-hub";

/// Per-user configuration directory name
pub const CONFIG_DIR: &str = ".content-hub";

/// Client local store file name (inside CONFIG_DIR)
pub const LOCAL_STORE_FILE: &str = "local-store.json";

/// Default HTTP bind address
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:3000";

/// Mount point of the component API
pub const API_PREFIX: &str = "/api/components";

/// Directory of a course, relative to the repository root
pub fn course_dir(course_id: &str) -> PathBuf {
    Path::new(COURSES_DIR).join(course_id)
}

/// Public URL of a component file
pub fn component_url(site_root: &str, id: &str, course_id: Option<&str>) -> String {
    match course_id {
        Some(course) => site_url(site_root, &format!("courses/{}/{}.html", course, id)),
        None => site_url(site_root, &format!("shared/components/{}.html", id)),
    }
}

/// Public URL of a component's documentation page
pub fn documentation_url(site_root: &str, id: &str, course_id: Option<&str>) -> String {
    match course_id {
        Some(course) => site_url(site_root, &format!("docs/courses/{}/{}.html", course, id)),
        None => site_url(site_root, &format!("examples/{}.html", id)),
    }
}

/// Public URL of a development component file
pub fn dev_component_url(site_root: &str, id: &str) -> String {
    site_url(site_root, &format!("{}/{}.html", DEV_COMPONENTS_DIR, id))
}

/// Documentation page of a development component
pub fn dev_documentation_url(site_root: &str, id: &str) -> String {
    site_url(site_root, &format!("docs/development-environment/components/{}.html", id))
}

/// Join a site-relative path onto the site root. An empty root yields a
/// root-relative URL.
fn site_url(site_root: &str, rest: &str) -> String {
    let root = site_root.trim_matches('/');
    if root.is_empty() {
        format!("/{}", rest)
    } else {
        format!("/{}/{}", root, rest)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_urls() {
        assert_eq!(
            component_url("blackboard-content-hub", "demo", None),
            "/blackboard-content-hub/shared/components/demo.html"
        );
        assert_eq!(
            documentation_url("blackboard-content-hub", "demo", None),
            "/blackboard-content-hub/examples/demo.html"
        );
    }

    #[test]
    fn test_course_urls() {
        assert_eq!(
            component_url("blackboard-content-hub", "graph", Some("math-a251")),
            "/blackboard-content-hub/courses/math-a251/graph.html"
        );
        assert_eq!(
            documentation_url("blackboard-content-hub", "graph", Some("math-a251")),
            "/blackboard-content-hub/docs/courses/math-a251/graph.html"
        );
    }

    #[test]
    fn test_development_urls() {
        assert_eq!(
            dev_component_url("blackboard-content-hub", "slider"),
            "/blackboard-content-hub/dev/components/slider.html"
        );
        assert_eq!(
            dev_documentation_url("", "slider"),
            "/docs/development-environment/components/slider.html"
        );
    }

    #[test]
    fn test_empty_site_root() {
        assert_eq!(component_url("", "demo", None), "/shared/components/demo.html");
        assert_eq!(component_url("/", "demo", None), "/shared/components/demo.html");
    }

    #[test]
    fn test_course_dir() {
        assert_eq!(course_dir("cs-101"), PathBuf::from("courses/cs-101"));
    }
}

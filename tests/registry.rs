//! Registry Integration Tests
//!
//! Scanning, metadata overlay and register/delete behavior against a real
//! directory tree.

use std::path::Path;
use std::time::{Duration, SystemTime};

use content_hub::domain::{ComponentKind, ComponentUpdate, LocationType, MetadataEntry};
use content_hub::{Registry, RegistryConfig};
use filetime::FileTime;
use tempfile::TempDir;
use tokio::fs;

async fn write_component(root: &Path, rel_dir: &str, id: &str) {
    let dir = root.join(rel_dir);
    fs::create_dir_all(&dir).await.unwrap();
    fs::write(dir.join(format!("{}.html", id)), format!("<p>{}</p>", id))
        .await
        .unwrap();
}

async fn write_metadata(root: &Path, json: &str) {
    let docs = root.join("docs");
    fs::create_dir_all(&docs).await.unwrap();
    fs::write(docs.join("component-data.json"), json).await.unwrap();
}

fn registry_at(root: &Path) -> Registry {
    Registry::new(RegistryConfig::new(root).with_site_root("")).unwrap()
}

#[tokio::test]
async fn test_scan_finds_every_location() {
    let temp = TempDir::new().unwrap();
    write_component(temp.path(), "shared/components", "binary-search").await;
    write_component(temp.path(), "courses/math-a251", "graph-plotter").await;
    write_component(temp.path(), "courses/cs-101", "quiz").await;
    write_component(temp.path(), "dev/components", "draft-widget").await;
    fs::write(temp.path().join("shared/components/readme.txt"), "x")
        .await
        .unwrap();

    let registry = registry_at(temp.path());
    let components = registry.initialize().await;

    let ids: Vec<_> = components.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["binary-search", "quiz", "graph-plotter", "draft-widget"]);

    let graph = registry.get_component_by_id("graph-plotter").await.unwrap();
    assert_eq!(graph.location_type, LocationType::Course);
    assert_eq!(graph.course_id.as_deref(), Some("math-a251"));
    assert_eq!(graph.path.as_deref(), Some("courses/math-a251/graph-plotter.html"));
    assert_eq!(graph.title, "Graph Plotter");

    assert_eq!(
        registry.get_components_by_location(LocationType::Development).await.len(),
        1
    );
}

#[tokio::test]
async fn test_last_modified_is_file_mtime() {
    let temp = TempDir::new().unwrap();
    write_component(temp.path(), "shared/components", "quiz").await;

    let mtime = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
    filetime::set_file_mtime(
        temp.path().join("shared/components/quiz.html"),
        FileTime::from_system_time(mtime),
    )
    .unwrap();

    let registry = registry_at(temp.path());
    registry.initialize().await;

    let quiz = registry.get_component_by_id("quiz").await.unwrap();
    assert_eq!(quiz.last_modified.unwrap().timestamp(), 1_700_000_000);
}

#[tokio::test]
async fn test_metadata_overlay_and_orphans() {
    let temp = TempDir::new().unwrap();
    write_component(temp.path(), "shared/components", "binary-search").await;
    write_metadata(
        temp.path(),
        r#"[
          {"id": "binary-search", "title": "Binary Search Visualizer",
           "description": "Step through a search", "tags": ["algorithms"], "version": "1.2.0"},
          {"id": "orphan", "title": "No File"}
        ]"#,
    )
    .await;

    let registry = registry_at(temp.path());
    let components = registry.initialize().await;

    assert_eq!(components.len(), 1);
    let component = &components[0];
    assert_eq!(component.title, "Binary Search Visualizer");
    assert_eq!(component.details.description.as_deref(), Some("Step through a search"));
    assert_eq!(component.tags(), ["algorithms".to_string()]);
    assert_eq!(component.details.version.as_deref(), Some("1.2.0"));
    assert!(registry.get_component_by_id("orphan").await.is_none());
}

#[tokio::test]
async fn test_corrupt_metadata_still_lists_files() {
    let temp = TempDir::new().unwrap();
    write_component(temp.path(), "shared/components", "quiz").await;
    write_metadata(temp.path(), "[{broken").await;

    let registry = registry_at(temp.path());
    let components = registry.initialize().await;

    assert_eq!(components.len(), 1);
    assert_eq!(components[0].title, "Quiz");
}

#[tokio::test]
async fn test_initialize_is_cached_until_rescan() {
    let temp = TempDir::new().unwrap();
    write_component(temp.path(), "shared/components", "first").await;

    let registry = registry_at(temp.path());
    assert!(!registry.is_initialized().await);
    assert_eq!(registry.initialize().await.len(), 1);

    write_component(temp.path(), "shared/components", "second").await;
    assert_eq!(registry.initialize().await.len(), 1);
    assert_eq!(registry.rescan().await.len(), 2);
    assert_eq!(registry.scan_all_locations().await.len(), 2);
}

#[tokio::test]
async fn test_register_is_idempotent() {
    let temp = TempDir::new().unwrap();
    write_component(temp.path(), "shared/components", "quiz").await;

    let registry = registry_at(temp.path());
    registry.initialize().await;

    let update = ComponentUpdate::new("quiz")
        .with_title("Pop Quiz")
        .with_tags(["assessment"]);
    let first = registry.register_component(update.clone()).await.unwrap();
    let second = registry.register_component(update).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(registry.get_all_components().await.len(), 1);

    let entries = registry.metadata().load().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].title.as_deref(), Some("Pop Quiz"));
}

#[tokio::test]
async fn test_register_preserves_unknown_metadata_keys() {
    let temp = TempDir::new().unwrap();
    write_component(temp.path(), "shared/components", "quiz").await;
    write_metadata(
        temp.path(),
        r#"[{"id": "quiz", "title": "Quiz", "dependencies": ["d3"]}]"#,
    )
    .await;

    let registry = registry_at(temp.path());
    registry.initialize().await;
    registry
        .register_component(ComponentUpdate::new("quiz").with_description("Updated"))
        .await
        .unwrap();

    let entry: MetadataEntry = registry.metadata().get("quiz").await.unwrap().unwrap();
    assert_eq!(entry.details.description.as_deref(), Some("Updated"));
    assert_eq!(entry.extra["dependencies"], serde_json::json!(["d3"]));
}

#[tokio::test]
async fn test_rescan_converges_after_register() {
    let temp = TempDir::new().unwrap();
    write_component(temp.path(), "shared/components", "quiz").await;

    let registry = registry_at(temp.path());
    registry.initialize().await;
    let registered = registry
        .register_component(
            ComponentUpdate::new("quiz")
                .with_title("Pop Quiz")
                .with_description("Five questions"),
        )
        .await
        .unwrap();

    registry.rescan().await;
    let rescanned = registry.get_component_by_id("quiz").await.unwrap();

    assert_eq!(rescanned.title, registered.title);
    assert_eq!(rescanned.details, registered.details);
}

#[tokio::test]
async fn test_delete_removes_file_record_and_metadata() {
    let temp = TempDir::new().unwrap();
    write_component(temp.path(), "shared/components", "quiz").await;

    let registry = registry_at(temp.path());
    registry.initialize().await;
    registry
        .register_component(ComponentUpdate::new("quiz"))
        .await
        .unwrap();

    assert!(registry.delete_component("quiz").await);
    assert!(!temp.path().join("shared/components/quiz.html").exists());
    assert!(registry.get_component_by_id("quiz").await.is_none());
    assert!(registry.metadata().get("quiz").await.unwrap().is_none());

    assert!(!registry.delete_component("quiz").await);
}

#[tokio::test]
async fn test_delete_failure_keeps_record() {
    let temp = TempDir::new().unwrap();
    write_component(temp.path(), "shared/components", "quiz").await;

    let registry = registry_at(temp.path());
    registry.initialize().await;
    fs::remove_file(temp.path().join("shared/components/quiz.html"))
        .await
        .unwrap();

    assert!(!registry.delete_component("quiz").await);
    assert!(registry.get_component_by_id("quiz").await.is_some());
}

#[tokio::test]
async fn test_register_then_delete_end_to_end() {
    let temp = TempDir::new().unwrap();
    write_component(temp.path(), "shared/components", "demo").await;

    let registry = registry_at(temp.path());
    registry.initialize().await;

    let demo = registry
        .register_component(
            ComponentUpdate::new("demo")
                .with_location(LocationType::Shared)
                .with_description("Demo component"),
        )
        .await
        .unwrap();
    assert_eq!(demo.details.url.as_deref(), Some("/shared/components/demo.html"));
    assert_eq!(demo.details.documentation_url.as_deref(), Some("/examples/demo.html"));

    let raw = fs::read_to_string(temp.path().join("docs/component-data.json"))
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json[0]["id"], "demo");
    assert_eq!(json[0]["type"], "shared");
    assert_eq!(json[0]["url"], "/shared/components/demo.html");

    assert!(registry.delete_component("demo").await);
    assert!(registry.metadata().load().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_register_without_file_then_delete() {
    let temp = TempDir::new().unwrap();
    for dir in ["shared/components", "courses", "dev/components"] {
        fs::create_dir_all(temp.path().join(dir)).await.unwrap();
    }
    write_metadata(temp.path(), "").await;

    let registry = registry_at(temp.path());
    assert!(registry.initialize().await.is_empty());

    let demo = registry
        .register_component(ComponentUpdate::new("demo").with_location(LocationType::Shared))
        .await
        .unwrap();
    assert!(demo.full_path.is_none());

    let entries = registry.metadata().load().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, Some(ComponentKind::Shared));
    assert_eq!(entries[0].details.url.as_deref(), Some("/shared/components/demo.html"));

    // No file to remove, so delete succeeds on the record alone
    assert!(registry.delete_component("demo").await);
    assert!(registry.metadata().load().await.unwrap().is_empty());
    assert!(registry.get_all_components().await.is_empty());
}

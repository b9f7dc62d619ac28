//! Command-line interface for the content hub.
//!
//! Provides commands for serving the registry API, browsing and searching
//! components, and moving components through their lifecycle.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use crate::api::{self, AppState};
use crate::client::{LocationFilter, RegistryClient};
use crate::config;
use crate::domain::{Component, LocationType};
use crate::registry::{CreateRequest, Placement, Registry, RegistryWatcher};
use crate::search::{self, SortOrder};

/// content-hub - Registry of interactive course components
#[derive(Parser, Debug)]
#[command(name = "content-hub")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the registry over HTTP
    Serve {
        /// Address to bind to (defaults to the configured address)
        #[arg(short, long)]
        address: Option<String>,

        /// Rescan when component files change
        #[arg(short, long)]
        watch: bool,
    },

    /// List components
    List {
        /// Only show one location (shared, course, development)
        #[arg(short, long)]
        location: Option<LocationType>,

        /// Sort order (title-asc, title-desc, date-asc, date-desc, version-asc, version-desc)
        #[arg(short, long, default_value = "title-asc")]
        sort: SortOrder,

        /// Maximum number of components to show
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Search components by id, title, description and tags
    Search {
        /// Search query (every word must match)
        query: String,

        /// Only search one location
        #[arg(short, long)]
        location: Option<LocationType>,

        /// Query the configured API (falling back to local drafts) instead of the filesystem
        #[arg(short, long)]
        remote: bool,
    },

    /// Show details of a component
    Info {
        /// Component ID
        id: String,

        /// Print the record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a new component
    Create {
        /// Component ID (lowercase, hyphen-separated)
        id: String,

        /// Where to create the component
        #[arg(short, long, value_enum, default_value = "dev")]
        location: Target,

        /// Course ID (required for course components)
        #[arg(short, long)]
        course: Option<String>,

        /// Display title (derived from the ID if not specified)
        #[arg(long)]
        title: Option<String>,

        /// Short description
        #[arg(short, long)]
        description: Option<String>,

        /// Category (e.g. algorithms, visualization)
        #[arg(long)]
        category: Option<String>,

        /// Tags to apply (comma-separated)
        #[arg(short, long)]
        tags: Option<String>,

        /// Initial version
        #[arg(long, default_value = "1.0.0")]
        version: String,
    },

    /// Promote a development component to shared or a course
    Promote {
        /// Component ID
        id: String,

        /// Target location
        #[arg(long, value_enum)]
        to: Target,

        /// Course ID (required when promoting to a course)
        #[arg(short, long)]
        course: Option<String>,
    },

    /// Record a new version of a component
    Version {
        /// Component ID
        id: String,

        /// New version (x.y.z)
        version: String,

        /// Changes in this version (comma-separated)
        #[arg(short, long)]
        changes: String,
    },

    /// Validate a component's metadata
    Validate {
        /// Component ID
        id: String,
    },

    /// Delete a component file and its metadata
    Delete {
        /// Component ID
        id: String,
    },

    /// Show resolved configuration (debug)
    Config,
}

/// Component location for lifecycle commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Target {
    /// dev/components
    Dev,

    /// shared/components
    Shared,

    /// courses/<course>
    Course,
}

impl Target {
    fn placement(self, course: Option<String>) -> Result<Placement> {
        match (self, course) {
            (Target::Dev, _) => Ok(Placement::Development),
            (Target::Shared, _) => Ok(Placement::Shared),
            (Target::Course, Some(course)) => Ok(Placement::Course(course)),
            (Target::Course, None) => anyhow::bail!("--course is required for course components"),
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Serve { address, watch } => serve(address, watch).await,
            Commands::List {
                location,
                sort,
                limit,
            } => list_components(location, sort, limit).await,
            Commands::Search {
                query,
                location,
                remote,
            } => {
                if remote {
                    search_remote(&query, location).await
                } else {
                    search_components(&query, location).await
                }
            }
            Commands::Info { id, json } => show_component(&id, json).await,
            Commands::Create {
                id,
                location,
                course,
                title,
                description,
                category,
                tags,
                version,
            } => {
                let request = CreateRequest {
                    id,
                    placement: location.placement(course)?,
                    title,
                    description,
                    category,
                    tags: tags.as_deref().map(split_list).unwrap_or_default(),
                    version: Some(version),
                    html: None,
                };
                create_component(request).await
            }
            Commands::Promote { id, to, course } => promote_component(&id, to.placement(course)?).await,
            Commands::Version {
                id,
                version,
                changes,
            } => version_component(&id, &version, split_list(&changes)).await,
            Commands::Validate { id } => validate_component(&id).await,
            Commands::Delete { id } => delete_component(&id).await,
            Commands::Config => show_config().await,
        }
    }
}

/// Registry for the configured repository, scanned
async fn open_registry() -> Result<Registry> {
    let cfg = config::config()?;
    let registry = Registry::new(cfg.registry_config()).context("Invalid registry configuration")?;
    registry.initialize().await;
    Ok(registry)
}

/// Start the HTTP API
async fn serve(address: Option<String>, watch: bool) -> Result<()> {
    let cfg = config::config()?;
    let address = address.unwrap_or_else(|| cfg.server.address.clone());

    let registry = Arc::new(open_registry().await?);

    let watcher = if watch {
        let debounce = Duration::from_millis(cfg.server.watch_debounce_ms);
        Some(
            RegistryWatcher::new(registry.clone(), debounce)
                .spawn()
                .context("Failed to start file watcher")?,
        )
    } else {
        None
    };

    let result = api::serve(&address, AppState::new(registry)).await;

    if let Some(handle) = watcher {
        handle.stop().await?;
    }
    result
}

/// List components in a table
async fn list_components(location: Option<LocationType>, sort: SortOrder, limit: Option<usize>) -> Result<()> {
    let registry = open_registry().await?;

    let mut components = match location {
        Some(location) => registry.get_components_by_location(location).await,
        None => registry.get_all_components().await,
    };
    search::sort_components(&mut components, sort);
    if let Some(limit) = limit {
        components.truncate(limit);
    }

    if components.is_empty() {
        println!("No components found");
        return Ok(());
    }

    print_table(&components);
    Ok(())
}

/// Search components
async fn search_components(query: &str, location: Option<LocationType>) -> Result<()> {
    let registry = open_registry().await?;

    let components = match location {
        Some(location) => registry.get_components_by_location(location).await,
        None => registry.get_all_components().await,
    };
    let results = search::search(&components, query);

    if results.is_empty() {
        println!("No results found for: {}", query);
        return Ok(());
    }

    println!("Found {} result(s) for \"{}\":\n", results.len(), query);
    print_table(&results);
    Ok(())
}

/// Search through the registry client
async fn search_remote(query: &str, location: Option<LocationType>) -> Result<()> {
    let cfg = config::config()?;
    let client = RegistryClient::from_settings(&cfg.client).context("Failed to create registry client")?;
    client.initialize().await;

    let filter = location.map(LocationFilter::Only).unwrap_or(LocationFilter::All);
    let results = client.filter_components(filter, query).await;
    let source = client
        .data_source()
        .await
        .map(|s| s.to_string())
        .unwrap_or_default();

    if results.is_empty() {
        println!("No results found for: {} (source: {})", query, source);
        return Ok(());
    }

    println!("Found {} result(s) for \"{}\" (source: {}):\n", results.len(), query, source);
    print_table(&results);
    Ok(())
}

fn print_table(components: &[Component]) {
    println!("{:<28} {:<12} {:<10} {:<40}", "ID", "LOCATION", "VERSION", "TITLE");
    println!("{}", "-".repeat(92));

    for component in components {
        let location = match &component.course_id {
            Some(course) => course.clone(),
            None => component.location_type.to_string(),
        };
        println!(
            "{:<28} {:<12} {:<10} {:<40}",
            component.id,
            location,
            component.details.version.as_deref().unwrap_or("-"),
            truncate(&component.title, 40)
        );
    }
}

/// Show details of a component
async fn show_component(id: &str, json: bool) -> Result<()> {
    let registry = open_registry().await?;
    let component = registry
        .get_component_by_id(id)
        .await
        .ok_or_else(|| anyhow::anyhow!("Component not found: {}", id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&component)?);
        return Ok(());
    }

    let details = &component.details;
    println!("{}", component.title);
    println!("  ID:       {}", component.id);
    println!("  Location: {}", component.location_type);
    if let Some(course) = &component.course_id {
        println!("  Course:   {}", course);
    }
    if let Some(path) = &component.path {
        println!("  Path:     {}", path);
    }
    if let Some(version) = &details.version {
        println!("  Version:  {}", version);
    }
    if let Some(category) = &details.category {
        println!("  Category: {}", category);
    }
    if let Some(url) = &details.url {
        println!("  URL:      {}", url);
    }
    if !component.tags().is_empty() {
        println!("  Tags:     {}", component.tags().join(", "));
    }
    if let Some(modified) = component.last_modified {
        println!("  Modified: {}", modified.format("%Y-%m-%d %H:%M:%S"));
    }
    if let Some(description) = details.description.as_deref().filter(|d| !d.is_empty()) {
        println!("\n{}", description);
    }
    if let Some(history) = &details.version_history {
        println!("\nVersion history:");
        for entry in history {
            println!("  {} ({}): {}", entry.version, entry.date, entry.changes.join("; "));
        }
    }

    Ok(())
}

async fn create_component(request: CreateRequest) -> Result<()> {
    let registry = open_registry().await?;
    let component = registry.create_component(request).await?;

    println!("Created {} ({})", component.id, component.location_type);
    if let Some(path) = &component.path {
        println!("  File: {}", path);
    }
    Ok(())
}

async fn promote_component(id: &str, target: Placement) -> Result<()> {
    let registry = open_registry().await?;
    let component = registry.promote_component(id, target).await?;

    println!("Promoted {} to {}", component.id, component.location_type);
    if let Some(url) = &component.details.url {
        println!("  URL: {}", url);
    }
    Ok(())
}

async fn version_component(id: &str, version: &str, changes: Vec<String>) -> Result<()> {
    let registry = open_registry().await?;
    let component = registry.version_component(id, version, changes).await?;

    println!(
        "{} is now at version {}",
        component.id,
        component.details.version.as_deref().unwrap_or(version)
    );
    Ok(())
}

async fn validate_component(id: &str) -> Result<()> {
    let registry = open_registry().await?;
    let report = registry.validate_component(id).await?;

    for field in &report.missing_fields {
        println!("  missing: {}", field);
    }
    for error in &report.errors {
        println!("  error:   {}", error);
    }
    for warning in &report.warnings {
        println!("  warning: {}", warning);
    }

    if report.is_valid() {
        println!("{} is valid", id);
        Ok(())
    } else {
        anyhow::bail!("{} failed validation", id)
    }
}

async fn delete_component(id: &str) -> Result<()> {
    let registry = open_registry().await?;
    if registry.delete_component(id).await {
        println!("Deleted {}", id);
        Ok(())
    } else {
        anyhow::bail!("Could not delete component: {}", id)
    }
}

/// Show resolved configuration
async fn show_config() -> Result<()> {
    let cfg = config::config()?;

    println!("Content Hub Configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Root:     {}", cfg.root.display());
    println!("  Metadata: {}", cfg.metadata_path.display());
    println!();
    println!("Site:");
    println!("  Root:    {:?}", cfg.site_root);
    println!("  Pattern: {}", cfg.component_pattern);
    println!();
    println!("Server:");
    println!("  Address:  {}", cfg.server.address);
    println!("  Debounce: {}ms", cfg.server.watch_debounce_ms);
    println!();
    println!("Client:");
    println!("  API URL:     {}", cfg.client.api_url);
    println!("  Timeout:     {}s", cfg.client.timeout_seconds);
    println!("  Local store: {}", cfg.client.local_store.display());

    Ok(())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() > width {
        let head: String = value.chars().take(width - 3).collect();
        format!("{}...", head)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("a, b,,c "), vec!["a", "b", "c"]);
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a much longer title", 10), "a much ...");
    }

    #[test]
    fn test_course_target_requires_course() {
        assert!(Target::Course.placement(None).is_err());
        assert_eq!(
            Target::Course.placement(Some("cs-101".into())).unwrap(),
            Placement::Course("cs-101".into())
        );
        assert_eq!(Target::Dev.placement(None).unwrap(), Placement::Development);
    }

    #[test]
    fn test_parse_commands() {
        let cli = Cli::try_parse_from(["content-hub", "list", "--sort", "version-desc", "-n", "5"]).unwrap();
        match cli.command {
            Commands::List { sort, limit, location } => {
                assert_eq!(sort, SortOrder::VersionDesc);
                assert_eq!(limit, Some(5));
                assert!(location.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::try_parse_from([
            "content-hub",
            "promote",
            "quiz",
            "--to",
            "course",
            "--course",
            "cs-101",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Promote { .. }));
    }
}

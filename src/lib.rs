//! content-hub - Registry of interactive course components
//!
//! Components are standalone HTML files organized by storage tier. The
//! registry scans them from disk, overlays descriptive metadata from a JSON
//! sidecar, and serves the merged list over HTTP.
//!
//! # Modules
//!
//! - `registry`: Scanning, metadata persistence and lifecycle operations
//! - `api`: REST facade over a registry
//! - `client`: Remote mirror with local-store fallback
//! - `search`: Query matching and sort orders
//! - `domain`: Data structures (Component, MetadataEntry, ComponentDraft)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Serve the API and rescan on file changes
//! content-hub serve --watch
//!
//! # Create, promote and version a component
//! content-hub create binary-search --description "Interactive search demo"
//! content-hub promote binary-search --to shared
//! content-hub version binary-search 1.1.0 --changes "Add step mode"
//! ```

pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod domain;
pub mod registry;
pub mod search;

// Re-export main types at crate root for convenience
pub use client::{DataSource, LocationFilter, RegistryClient};
pub use domain::{format_title, Component, ComponentUpdate, LocationType, MetadataEntry};
pub use registry::{Registry, RegistryConfig, RegistryError};

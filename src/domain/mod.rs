//! Domain types for the content hub.
//!
//! This module contains the core data structures:
//! - Component: a registry record and its storage tier
//! - Metadata: descriptive fields and the sidecar file schema
//! - Draft: client-side drafts held in the local store

pub mod component;
pub mod draft;
pub mod metadata;

// Re-export commonly used types
pub use component::{format_title, Component, ComponentUpdate, LocationType};
pub use draft::{ComponentDraft, ProjectSummary};
pub use metadata::{
    Accessibility, Author, ComponentDetails, ComponentKind, EducationalContext, MetadataEntry,
    VersionEntry,
};

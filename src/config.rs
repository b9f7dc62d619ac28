//! Configuration for the content hub.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (CONTENT_HUB_ROOT, CONTENT_HUB_METADATA,
//!    CONTENT_HUB_SITE_ROOT, CONTENT_HUB_ADDRESS, CONTENT_HUB_API_URL)
//! 2. Config file (.content-hub/config.yaml)
//! 3. Defaults (repository root = current directory)
//!
//! Config file discovery:
//! - Searches current directory and parents for .content-hub/config.yaml
//! - Paths in config file are relative to the project root (the directory
//!   containing .content-hub/)

pub mod paths;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::registry::RegistryConfig;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub site: Option<SiteConfig>,
    #[serde(default)]
    pub server: Option<ServerConfig>,
    #[serde(default)]
    pub client: Option<ClientConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Repository root (relative to the project root)
    pub root: Option<String>,
    /// Metadata sidecar (relative to the repository root)
    pub metadata: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// URL prefix the site is published under
    pub root: Option<String>,
    /// Glob matched against component file names
    pub component_pattern: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub address: Option<String>,
    pub watch_debounce_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub api_url: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub local_store: Option<String>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Repository root containing shared/, courses/ and dev/
    pub root: PathBuf,
    /// Metadata sidecar file
    pub metadata_path: PathBuf,
    /// Site root used in generated URLs (may be empty)
    pub site_root: String,
    /// Glob matched against component file names
    pub component_pattern: String,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// HTTP server settings
    pub server: ServerSettings,
    /// Registry client settings
    pub client: ClientSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub address: String,
    pub watch_debounce_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            address: paths::DEFAULT_ADDRESS.to_string(),
            watch_debounce_ms: 500,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub api_url: String,
    pub timeout_seconds: u64,
    pub local_store: PathBuf,
}

impl ResolvedConfig {
    /// Registry settings derived from this configuration
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            root: self.root.clone(),
            metadata_path: self.metadata_path.clone(),
            site_root: self.site_root.clone(),
            component_pattern: self.component_pattern.clone(),
        }
    }
}

/// Find config file by searching `start` and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(paths::CONFIG_DIR).join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to `base`
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Default location of the client's local store (~/.content-hub/local-store.json)
fn default_local_store(root: &Path) -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| root.to_path_buf())
        .join(paths::CONFIG_DIR)
        .join(paths::LOCAL_STORE_FILE)
}

/// Resolve configuration starting the file search at `cwd`, reading
/// overrides through `env`
fn resolve_config(cwd: &Path, env: impl Fn(&str) -> Option<String>) -> Result<ResolvedConfig> {
    let config_file = find_config_file(cwd);
    let parsed = match config_file {
        Some(ref path) => Some(load_config_file(path)?),
        None => None,
    };

    // Project root is the parent of .content-hub/
    let base_dir = config_file
        .as_ref()
        .and_then(|p| p.parent())
        .and_then(|p| p.parent())
        .unwrap_or(cwd)
        .to_path_buf();

    let root = if let Some(env_root) = env("CONTENT_HUB_ROOT") {
        PathBuf::from(env_root)
    } else if let Some(root) = parsed.as_ref().and_then(|c| c.paths.root.as_deref()) {
        resolve_path(&base_dir, root)
    } else {
        base_dir.clone()
    };

    let metadata_path = if let Some(env_meta) = env("CONTENT_HUB_METADATA") {
        PathBuf::from(env_meta)
    } else if let Some(meta) = parsed.as_ref().and_then(|c| c.paths.metadata.as_deref()) {
        resolve_path(&root, meta)
    } else {
        root.join(paths::METADATA_FILE)
    };

    let site = parsed.as_ref().and_then(|c| c.site.as_ref());
    let site_root = env("CONTENT_HUB_SITE_ROOT")
        .or_else(|| site.and_then(|s| s.root.clone()))
        .unwrap_or_else(|| paths::DEFAULT_SITE_ROOT.to_string());
    let component_pattern = site
        .and_then(|s| s.component_pattern.clone())
        .unwrap_or_else(|| paths::COMPONENT_PATTERN.to_string());

    let server_cfg = parsed.as_ref().and_then(|c| c.server.as_ref());
    let defaults = ServerSettings::default();
    let server = ServerSettings {
        address: env("CONTENT_HUB_ADDRESS")
            .or_else(|| server_cfg.and_then(|s| s.address.clone()))
            .unwrap_or(defaults.address),
        watch_debounce_ms: server_cfg
            .and_then(|s| s.watch_debounce_ms)
            .unwrap_or(defaults.watch_debounce_ms),
    };

    let client_cfg = parsed.as_ref().and_then(|c| c.client.as_ref());
    let client = ClientSettings {
        api_url: env("CONTENT_HUB_API_URL")
            .or_else(|| client_cfg.and_then(|c| c.api_url.clone()))
            .unwrap_or_else(|| format!("http://{}{}", server.address, paths::API_PREFIX)),
        timeout_seconds: client_cfg
            .and_then(|c| c.timeout_seconds)
            .unwrap_or(10),
        local_store: client_cfg
            .and_then(|c| c.local_store.as_deref())
            .map(|p| resolve_path(&base_dir, p))
            .unwrap_or_else(|| default_local_store(&root)),
    };

    Ok(ResolvedConfig {
        root,
        metadata_path,
        site_root,
        component_pattern,
        config_file,
        server,
        client,
    })
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    resolve_config(&cwd, |key| std::env::var(key).ok())
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

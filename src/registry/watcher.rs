//! Filesystem watcher that keeps a registry in sync with disk.
//!
//! Watches the component locations and the metadata file, and rescans the
//! registry after each debounced batch of relevant changes.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use glob::Pattern;
use notify::RecursiveMode;
use notify_debouncer_mini::new_debouncer;
use thiserror::Error;
use tokio::sync::mpsc;

use super::Registry;
use crate::config::paths;

/// Errors that can occur with the watcher
#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("Nothing to watch under {0}")]
    NothingToWatch(PathBuf),

    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),

    #[error("Watcher task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Rescans a registry when its files change
pub struct RegistryWatcher {
    registry: Arc<Registry>,
    debounce: Duration,
}

impl RegistryWatcher {
    pub fn new(registry: Arc<Registry>, debounce: Duration) -> Self {
        Self { registry, debounce }
    }

    /// Directories to watch, with their recursion mode. Only existing
    /// directories are returned.
    pub fn watch_targets(&self) -> Vec<(PathBuf, RecursiveMode)> {
        let config = self.registry.config();
        let mut targets = vec![
            (config.root.join(paths::SHARED_COMPONENTS_DIR), RecursiveMode::NonRecursive),
            (config.root.join(paths::COURSES_DIR), RecursiveMode::Recursive),
            (config.root.join(paths::DEV_COMPONENTS_DIR), RecursiveMode::NonRecursive),
        ];
        if let Some(parent) = config.metadata_path.parent() {
            targets.push((parent.to_path_buf(), RecursiveMode::NonRecursive));
        }

        targets.retain(|(dir, _)| dir.is_dir());
        targets
    }

    /// Start watching in a background task
    pub fn spawn(self) -> Result<WatchHandle, WatcherError> {
        let targets = self.watch_targets();
        if targets.is_empty() {
            return Err(WatcherError::NothingToWatch(self.registry.root().to_path_buf()));
        }

        let (tx, rx) = std::sync::mpsc::channel();
        let mut debouncer = new_debouncer(self.debounce, tx)?;
        for (dir, mode) in &targets {
            debouncer.watcher().watch(dir, *mode)?;
            tracing::info!("Watching {} for component changes", dir.display());
        }

        let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);
        let filter = ChangeFilter::for_registry(&self.registry);
        let registry = self.registry;

        let task = tokio::spawn(async move {
            // Dropping the debouncer stops the notify thread
            let _debouncer = debouncer;

            loop {
                if stop_rx.try_recv().is_ok() {
                    tracing::info!("Watcher stopping...");
                    break;
                }

                match rx.try_recv() {
                    Ok(Ok(events)) => {
                        let changed = events.iter().filter(|e| filter.is_relevant(&e.path)).count();
                        if changed > 0 {
                            tracing::debug!("{} component file(s) changed, rescanning", changed);
                            registry.rescan().await;
                        }
                    }
                    Ok(Err(e)) => {
                        tracing::warn!("Watcher error: {:?}", e);
                    }
                    Err(std::sync::mpsc::TryRecvError::Empty) => {}
                    Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                        tracing::error!("Watcher channel disconnected");
                        break;
                    }
                }

                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        });

        Ok(WatchHandle { stop_tx, task })
    }
}

/// Handle to control the watcher
pub struct WatchHandle {
    stop_tx: mpsc::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

impl WatchHandle {
    /// Stop the watcher and wait for its task
    pub async fn stop(self) -> Result<(), WatcherError> {
        let _ = self.stop_tx.send(()).await;
        self.task.await?;
        Ok(())
    }
}

/// Decides which changed paths can affect a registry
#[derive(Debug, Clone)]
pub struct ChangeFilter {
    metadata_path: PathBuf,
    roots: Vec<PathBuf>,
    pattern: Pattern,
}

impl ChangeFilter {
    pub fn new(metadata_path: PathBuf, roots: Vec<PathBuf>, pattern: Pattern) -> Self {
        Self {
            metadata_path,
            roots,
            pattern,
        }
    }

    /// Filter for the component roots and metadata file of `registry`
    pub fn for_registry(registry: &Registry) -> Self {
        let config = registry.config();
        let mut roots = Vec::new();
        for dir in [paths::SHARED_COMPONENTS_DIR, paths::COURSES_DIR, paths::DEV_COMPONENTS_DIR] {
            let root = config.root.join(dir);
            // Events may arrive with resolved paths
            if let Ok(canonical) = root.canonicalize() {
                if canonical != root {
                    roots.push(canonical);
                }
            }
            roots.push(root);
        }

        Self::new(config.metadata_path.clone(), roots, registry.pattern().clone())
    }

    /// The metadata file, or a component file under one of the roots
    pub fn is_relevant(&self, path: &Path) -> bool {
        if path == self.metadata_path {
            return true;
        }

        let matches_pattern = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| self.pattern.matches(n))
            .unwrap_or(false);
        matches_pattern && self.roots.iter().any(|root| path.starts_with(root))
    }
}

//! # Application State
//!
//! Shared state for the Axum application: the storage collaborator every
//! request resolves against, and the switches read from configuration.

use std::sync::Arc;

use staging_core::{execute, Address, Outcome, StageStore};
use staging_store::FsStageStore;

use crate::config::AppConfig;
use crate::error::AppError;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn StageStore>,
    pub metrics_enabled: bool,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("store", &"<dyn StageStore>")
            .field("metrics_enabled", &self.metrics_enabled)
            .finish()
    }
}

impl AppState {
    /// State over an arbitrary store, with metrics enabled.
    pub fn new(store: impl StageStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
            metrics_enabled: true,
        }
    }

    /// State over the filesystem store rooted at `config.staging_root`.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            store: Arc::new(FsStageStore::new(config.staging_root.clone())),
            metrics_enabled: config.metrics_enabled,
        }
    }

    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.metrics_enabled = enabled;
        self
    }

    /// Execute `address` on the blocking pool.
    ///
    /// Stage loading may touch the filesystem, so the whole pipeline runs
    /// off the async workers.
    pub async fn execute(&self, address: Address) -> Result<Outcome, AppError> {
        let store = Arc::clone(&self.store);
        let outcome = tokio::task::spawn_blocking(move || execute(store.as_ref(), &address)).await??;
        Ok(outcome)
    }

    /// Whether the store can currently enumerate stages.
    pub async fn store_ready(&self) -> bool {
        let store = Arc::clone(&self.store);
        match tokio::task::spawn_blocking(move || store.list_stage_identifiers()).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "stage listing failed during readiness check");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "readiness check task failed");
                false
            }
        }
    }
}

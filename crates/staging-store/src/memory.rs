//! # In-Memory Stage Store

use std::collections::HashMap;

use parking_lot::RwLock;
use staging_core::{Stage, StageStore, StoreError};

/// Stages held in a process-local map, keyed by identifier.
///
/// Every load returns an independent clone, so callers never observe each
/// other's resolution state.
#[derive(Debug, Default)]
pub struct MemoryStageStore {
    stages: RwLock<HashMap<String, Stage>>,
}

impl MemoryStageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `stage`, returning any stage it replaced.
    pub fn insert(&self, stage: Stage) -> Option<Stage> {
        self.stages.write().insert(stage.identifier.clone(), stage)
    }

    pub fn remove(&self, identifier: &str) -> Option<Stage> {
        self.stages.write().remove(identifier)
    }

    pub fn len(&self) -> usize {
        self.stages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.read().is_empty()
    }
}

impl FromIterator<Stage> for MemoryStageStore {
    fn from_iter<I: IntoIterator<Item = Stage>>(iter: I) -> Self {
        let stages = iter
            .into_iter()
            .map(|s| (s.identifier.clone(), s))
            .collect();
        Self {
            stages: RwLock::new(stages),
        }
    }
}

impl StageStore for MemoryStageStore {
    fn list_stage_identifiers(&self) -> Result<Vec<String>, StoreError> {
        let mut ids: Vec<String> = self.stages.read().keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    fn load_stage(&self, identifier: &str) -> Result<Stage, StoreError> {
        self.stages
            .read()
            .get(identifier)
            .cloned()
            .ok_or_else(|| StoreError::StageNotFound(identifier.to_string()))
    }
}

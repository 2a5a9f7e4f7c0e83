//! In-memory append-only interaction log, the default `InteractionLog`
//! backing for tests and the demo CLI. Production deployments implement
//! the trait over their own event store.

use std::sync::RwLock;

use recall_core::error::{EngineError, Result};
use recall_core::traits::InteractionLog;
use recall_core::types::InteractionRecord;

#[derive(Default)]
pub struct MemoryInteractionLog {
    records: RwLock<Vec<InteractionRecord>>,
}

impl MemoryInteractionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one interaction. Records are immutable once stored.
    pub fn record(&self, record: InteractionRecord) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| EngineError::Unavailable("interaction log lock poisoned".to_string()))?;
        records.push(record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl InteractionLog for MemoryInteractionLog {
    fn history(&self, user_id: &str) -> Result<Vec<InteractionRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| EngineError::Unavailable("interaction log lock poisoned".to_string()))?;
        let mut history: Vec<InteractionRecord> =
            records.iter().filter(|r| r.user_id == user_id).cloned().collect();
        history.sort_by_key(|r| r.timestamp);
        Ok(history)
    }
}

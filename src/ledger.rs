//! Record of messages already turned into reservations

use crate::error::Result;
use crate::types::MessageId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::debug;

/// Message IDs whose reservation was accepted, optionally backed by a file
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ProcessedLedger {
    #[serde(skip)]
    path: Option<PathBuf>,
    processed: BTreeSet<MessageId>,
}

impl ProcessedLedger {
    /// Ledger that is never written to disk
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the ledger file, starting empty if it does not exist yet
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut ledger = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => serde_json::from_str::<Self>(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), entries = ledger.processed.len(), "Loaded ledger");
        ledger.path = Some(path);
        Ok(ledger)
    }

    #[must_use]
    pub fn contains(&self, id: &MessageId) -> bool {
        self.processed.contains(id)
    }

    /// Returns `false` if the ID was already recorded
    pub fn record(&mut self, id: MessageId) -> bool {
        self.processed.insert(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.processed.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.processed.is_empty()
    }

    /// Write the ledger back to its file, if it has one
    pub async fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json).await?;
        debug!(path = %path.display(), entries = self.processed.len(), "Saved ledger");
        Ok(())
    }
}

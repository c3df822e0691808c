//! JSON seed for the in-memory stores.
//!
//! Lets a dev/demo deployment start from an exported ledger instead of an empty one.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use rodstock_inventory::{InventorySession, StockItem};

use crate::store::{InMemoryLedger, InMemorySessionStore};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse seed file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub items: Vec<StockItem>,
    #[serde(default)]
    pub sessions: Vec<InventorySession>,
}

impl Seed {
    pub fn load(path: &Path) -> Result<Self, SeedError> {
        let shown = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
            path: shown.clone(),
            source,
        })?;
        let seed: Seed = serde_json::from_str(&raw).map_err(|source| SeedError::Parse {
            path: shown.clone(),
            source,
        })?;
        tracing::info!(
            path = %shown,
            items = seed.items.len(),
            sessions = seed.sessions.len(),
            "seed loaded"
        );
        Ok(seed)
    }

    pub fn into_stores(self) -> (InMemoryLedger, InMemorySessionStore) {
        (
            InMemoryLedger::with_lots(self.items),
            InMemorySessionStore::with_sessions(self.sessions),
        )
    }
}

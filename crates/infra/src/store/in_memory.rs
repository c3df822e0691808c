use std::sync::RwLock;

use async_trait::async_trait;
use indexmap::IndexMap;

use rodstock_core::{LotId, SessionId};
use rodstock_inventory::{InventorySession, LotPatch, SessionPatch, StockItem};

use super::r#trait::{LedgerStore, SessionStore, StoreError};

fn poisoned() -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

/// In-memory stock ledger (insertion ordered).
///
/// Intended for tests/dev and for the seeded API. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    lots: RwLock<IndexMap<LotId, StockItem>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lots(items: impl IntoIterator<Item = StockItem>) -> Self {
        let lots = items.into_iter().map(|i| (i.id, i)).collect();
        Self {
            lots: RwLock::new(lots),
        }
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn list_lots(&self) -> Result<Vec<StockItem>, StoreError> {
        let lots = self.lots.read().map_err(|_| poisoned())?;
        Ok(lots.values().cloned().collect())
    }

    async fn get_lot(&self, id: LotId) -> Result<Option<StockItem>, StoreError> {
        let lots = self.lots.read().map_err(|_| poisoned())?;
        Ok(lots.get(&id).cloned())
    }

    async fn create_lot(&self, item: StockItem) -> Result<(), StoreError> {
        let mut lots = self.lots.write().map_err(|_| poisoned())?;
        if lots.contains_key(&item.id) {
            return Err(StoreError::Duplicate(format!("lot {}", item.id)));
        }
        tracing::debug!(lot_id = %item.id, internal_lot = %item.internal_lot, "lot created");
        lots.insert(item.id, item);
        Ok(())
    }

    async fn update_lot(&self, id: LotId, patch: LotPatch) -> Result<(), StoreError> {
        let mut lots = self.lots.write().map_err(|_| poisoned())?;
        let lot = lots
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("lot {id}")))?;
        patch.apply(lot)?;
        tracing::debug!(lot_id = %id, "lot updated");
        Ok(())
    }
}

/// In-memory session store (insertion ordered).
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<IndexMap<SessionId, InventorySession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sessions(sessions: impl IntoIterator<Item = InventorySession>) -> Self {
        let sessions = sessions.into_iter().map(|s| (s.id, s)).collect();
        Self {
            sessions: RwLock::new(sessions),
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn list_sessions(&self) -> Result<Vec<InventorySession>, StoreError> {
        let sessions = self.sessions.read().map_err(|_| poisoned())?;
        Ok(sessions.values().cloned().collect())
    }

    async fn get_session(&self, id: SessionId) -> Result<Option<InventorySession>, StoreError> {
        let sessions = self.sessions.read().map_err(|_| poisoned())?;
        Ok(sessions.get(&id).cloned())
    }

    async fn create_session(&self, session: InventorySession) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().map_err(|_| poisoned())?;
        if sessions.contains_key(&session.id) {
            return Err(StoreError::Duplicate(format!("session {}", session.id)));
        }
        sessions.insert(session.id, session);
        Ok(())
    }

    async fn update_session(&self, id: SessionId, patch: SessionPatch) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().map_err(|_| poisoned())?;
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("session {id}")))?;
        patch.apply(session);
        Ok(())
    }

    async fn delete_session(&self, id: SessionId) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().map_err(|_| poisoned())?;
        sessions
            .shift_remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("session {id}")))
    }
}

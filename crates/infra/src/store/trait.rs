use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use rodstock_core::{DomainError, LotId, SessionId};
use rodstock_inventory::{InventorySession, LotPatch, SessionPatch, StockItem};

/// Store operation error.
///
/// These are **infrastructure errors** (storage, missing records, rejected
/// writes) as opposed to workflow errors (validation, authorization).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("duplicate record: {0}")]
    Duplicate(String),

    /// The patch would break a record invariant (e.g. negative stock).
    #[error("rejected write: {0}")]
    Rejected(String),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl From<DomainError> for StoreError {
    fn from(value: DomainError) -> Self {
        StoreError::Rejected(value.to_string())
    }
}

/// Stock ledger: the mutable collection of lots.
///
/// ## Write semantics
///
/// - Every call is an independent write; nothing is atomic across calls
/// - `update_lot` applies a [`LotPatch`], which can only append history
/// - Lots are never deleted through this port
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn list_lots(&self) -> Result<Vec<StockItem>, StoreError>;

    async fn get_lot(&self, id: LotId) -> Result<Option<StockItem>, StoreError>;

    /// Insert a new lot. Fails with `Duplicate` if the id already exists.
    async fn create_lot(&self, item: StockItem) -> Result<(), StoreError>;

    /// Patch an existing lot. Fails with `NotFound` if the id is unknown.
    async fn update_lot(&self, id: LotId, patch: LotPatch) -> Result<(), StoreError>;
}

/// Persisted inventory sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn list_sessions(&self) -> Result<Vec<InventorySession>, StoreError>;

    async fn get_session(&self, id: SessionId) -> Result<Option<InventorySession>, StoreError>;

    async fn create_session(&self, session: InventorySession) -> Result<(), StoreError>;

    async fn update_session(&self, id: SessionId, patch: SessionPatch) -> Result<(), StoreError>;

    async fn delete_session(&self, id: SessionId) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    async fn list_lots(&self) -> Result<Vec<StockItem>, StoreError> {
        (**self).list_lots().await
    }

    async fn get_lot(&self, id: LotId) -> Result<Option<StockItem>, StoreError> {
        (**self).get_lot(id).await
    }

    async fn create_lot(&self, item: StockItem) -> Result<(), StoreError> {
        (**self).create_lot(item).await
    }

    async fn update_lot(&self, id: LotId, patch: LotPatch) -> Result<(), StoreError> {
        (**self).update_lot(id, patch).await
    }
}

#[async_trait]
impl<S> SessionStore for Arc<S>
where
    S: SessionStore + ?Sized,
{
    async fn list_sessions(&self) -> Result<Vec<InventorySession>, StoreError> {
        (**self).list_sessions().await
    }

    async fn get_session(&self, id: SessionId) -> Result<Option<InventorySession>, StoreError> {
        (**self).get_session(id).await
    }

    async fn create_session(&self, session: InventorySession) -> Result<(), StoreError> {
        (**self).create_session(session).await
    }

    async fn update_session(&self, id: SessionId, patch: SessionPatch) -> Result<(), StoreError> {
        (**self).update_session(id, patch).await
    }

    async fn delete_session(&self, id: SessionId) -> Result<(), StoreError> {
        (**self).delete_session(id).await
    }
}

//! Bulk start of an audit cycle across the whole yard.

use chrono::Utc;

use rodstock_infra::{LedgerStore, SessionStore};
use rodstock_inventory::{InventorySession, active_session, audit_pool, distinct_pairs, pair_state};

use crate::engine::{AuditEngine, to_u32};
use crate::error::AuditResult;

impl<L, S> AuditEngine<L, S>
where
    L: LedgerStore,
    S: SessionStore,
{
    /// Open a session for every auditable pair that has no active one.
    ///
    /// Pairs still locked by a completed session get their open session too; it
    /// starts taking counts once the completed session is deleted.
    pub async fn start_cycle(&self, operator: &str) -> AuditResult<Vec<InventorySession>> {
        let items = self.ledger.list_lots().await?;
        let mut sessions = self.sessions.list_sessions().await?;
        let now = Utc::now();
        let mut created = Vec::new();

        for pair in distinct_pairs(&items) {
            if active_session(&sessions, &pair).is_some() {
                tracing::debug!(pair = %pair, "pair already has an active session; skipped");
                continue;
            }
            if pair_state(&sessions, &pair).is_locked() {
                tracing::debug!(pair = %pair, "pair still locked by a completed session");
            }

            let pool_size = audit_pool(&items, &pair).len();
            let session = InventorySession::open(&pair, operator, to_u32(pool_size), now);
            self.sessions.create_session(session.clone()).await?;
            sessions.push(session.clone());
            created.push(session);
        }

        tracing::info!(operator, created = created.len(), "audit cycle started");
        Ok(created)
    }
}

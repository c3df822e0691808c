//! Service wiring for the audit API.
//!
//! Stores are the in-memory adapters (optionally seeded from JSON). Operators'
//! in-progress counts live in a registry keyed by (pair, operator); each entry
//! is the `AuditSession` value the engine works on.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::Mutex;

use rodstock_audit::{
    ApprovalGate, ApprovalReport, AuditEngine, AuditError, AuditResult, AuditSession,
    CountFeedback, FixedPrompt, QuickAddLot,
};
use rodstock_auth::{ApprovalSecret, Principal, PrincipalId};
use rodstock_core::{Kg, LotId, SessionId};
use rodstock_infra::{AppConfig, InMemoryLedger, InMemorySessionStore, Seed};
use rodstock_inventory::{InventorySession, PairKey};

pub type Ledger = Arc<InMemoryLedger>;
pub type Sessions = Arc<InMemorySessionStore>;
pub type Engine = AuditEngine<Ledger, Sessions>;
pub type Gate = ApprovalGate<Ledger, Sessions>;

type DraftKey = (PairKey, PrincipalId);

#[derive(Clone)]
pub struct AppServices {
    engine: Arc<Engine>,
    gate: Arc<Gate>,
    drafts: Arc<Mutex<HashMap<DraftKey, AuditSession>>>,
}

impl AppServices {
    pub fn new(ledger: InMemoryLedger, sessions: InMemorySessionStore, secret: ApprovalSecret) -> Self {
        let ledger = Arc::new(ledger);
        let sessions = Arc::new(sessions);
        Self {
            engine: Arc::new(AuditEngine::new(ledger.clone(), sessions.clone())),
            gate: Arc::new(ApprovalGate::new(ledger, sessions, secret)),
            drafts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Wire services from configuration, loading the seed file if one is set.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let (ledger, sessions) = match &config.seed_path {
            Some(path) => Seed::load(path)
                .with_context(|| format!("failed to seed stores from {}", path.display()))?
                .into_stores(),
            None => {
                tracing::info!("no seed configured; starting with an empty ledger");
                (InMemoryLedger::new(), InMemorySessionStore::new())
            }
        };
        Ok(Self::new(ledger, sessions, config.approval_secret.clone()))
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// The operator's current drafts for a pair, if any.
    pub async fn draft_snapshot(&self, pair: &PairKey, operator: PrincipalId) -> Option<AuditSession> {
        let drafts = self.drafts.lock().await;
        drafts.get(&(pair.clone(), operator)).cloned()
    }

    pub async fn record_count(
        &self,
        pair: PairKey,
        principal: &Principal,
        lot_id: LotId,
        physical_weight: Kg,
        observation: Option<String>,
    ) -> AuditResult<CountFeedback> {
        let mut drafts = self.drafts.lock().await;
        let audit = self.audit_session(&mut drafts, pair, principal).await?;
        self.engine
            .record_count(audit, lot_id, physical_weight, observation)
            .await
    }

    pub async fn quick_add(
        &self,
        pair: PairKey,
        principal: &Principal,
        lot: QuickAddLot,
    ) -> AuditResult<LotId> {
        let mut drafts = self.drafts.lock().await;
        let audit = self.audit_session(&mut drafts, pair, principal).await?;
        self.engine.quick_add(audit, lot).await
    }

    pub async fn finish(
        &self,
        pair: PairKey,
        principal: &Principal,
        confirm: bool,
    ) -> AuditResult<InventorySession> {
        let mut drafts = self.drafts.lock().await;
        let key = (pair.clone(), principal.principal_id);
        let audit = self.audit_session(&mut drafts, pair, principal).await?;
        let finished = self
            .engine
            .finish_session(audit, &FixedPrompt::confirming(confirm))
            .await?;
        drafts.remove(&key);
        Ok(finished)
    }

    pub async fn reopen(&self, id: SessionId) -> AuditResult<InventorySession> {
        let session = self.engine.reopen_session(id).await?;
        self.forget_pair(&session.pair()).await;
        Ok(session)
    }

    pub async fn delete(&self, id: SessionId) -> AuditResult<()> {
        let session = self.engine.session(id).await?;
        self.engine.delete_session(id).await?;
        self.forget_pair(&session.pair()).await;
        Ok(())
    }

    pub async fn approve(
        &self,
        principal: &Principal,
        id: SessionId,
        passphrase: String,
    ) -> AuditResult<ApprovalReport> {
        self.gate
            .approve(principal, id, &FixedPrompt::with_secret(passphrase))
            .await
    }

    /// Get the operator's audit session for a pair, opening it on first use.
    async fn audit_session<'a>(
        &self,
        drafts: &'a mut HashMap<DraftKey, AuditSession>,
        pair: PairKey,
        principal: &Principal,
    ) -> Result<&'a mut AuditSession, AuditError> {
        match drafts.entry((pair, principal.principal_id)) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => {
                let audit = self.engine.open_session(&e.key().0, &principal.name).await?;
                Ok(e.insert(audit))
            }
        }
    }

    /// Drop cached drafts so the next request re-reads the pair's session.
    async fn forget_pair(&self, pair: &PairKey) {
        let mut drafts = self.drafts.lock().await;
        drafts.retain(|(p, _), _| p != pair);
    }
}

//! Audit engine: counting sessions per (material, gauge) pair.
//!
//! The operator's in-progress work lives in an [`AuditSession`] value owned by
//! the caller (one per pair and operator). The engine only touches the session
//! store for the live counters and for the finished snapshot; the ledger is never
//! written here.
//!
//! Lock checks are advisory: they are evaluated against the store on every call
//! and are not held across the call. Concurrent operators counting the same
//! pair share the backing `checked_count` with last-write-wins semantics.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use chrono::Utc;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rodstock_core::{Kg, LotId, SessionId, within_tolerance};
use rodstock_infra::{LedgerStore, SessionStore};
use rodstock_inventory::{
    AuditedLotEntry, InventorySession, LotStatus, PairKey, PairState, SessionPatch, SessionStatus,
    StockItem, active_session, audit_pool, distinct_pairs, latest_session, pair_state,
};

use crate::error::{AuditError, AuditResult};
use crate::prompt::OperatorPrompt;

/// Size of the rolling counting feedback shown to the operator.
pub const RECENT_COUNTS: usize = 5;

/// Lot code used when a drafted lot can no longer be resolved.
pub const UNKNOWN_LOT: &str = "unknown";

/// One lot's draft count inside an [`AuditSession`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftCount {
    pub lot_id: LotId,
    pub system_weight: Kg,
    pub physical_weight: Kg,
    pub observation: Option<String>,
    /// Present for quick-add lots, which are not in the ledger yet.
    pub temp_lot: Option<StockItem>,
}

/// Feedback for one recorded count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountFeedback {
    pub internal_lot: String,
    /// `|physical - system| < 0.1`
    pub ok: bool,
    pub diff: Kg,
}

/// An operator's in-progress count of one pair.
#[derive(Debug, Clone)]
pub struct AuditSession {
    pair: PairKey,
    operator: String,
    drafts: IndexMap<LotId, DraftCount>,
    recent: VecDeque<CountFeedback>,
}

impl AuditSession {
    pub fn new(pair: PairKey, operator: impl Into<String>) -> Self {
        Self {
            pair,
            operator: operator.into(),
            drafts: IndexMap::new(),
            recent: VecDeque::with_capacity(RECENT_COUNTS),
        }
    }

    pub fn pair(&self) -> &PairKey {
        &self.pair
    }

    pub fn operator(&self) -> &str {
        &self.operator
    }

    /// Drafts in the order they were first recorded.
    pub fn drafts(&self) -> impl Iterator<Item = &DraftCount> {
        self.drafts.values()
    }

    pub fn draft(&self, lot_id: LotId) -> Option<&DraftCount> {
        self.drafts.get(&lot_id)
    }

    pub fn counted(&self) -> usize {
        self.drafts.len()
    }

    /// Latest counts, newest first.
    pub fn recent(&self) -> impl Iterator<Item = &CountFeedback> {
        self.recent.iter()
    }

    fn push_feedback(&mut self, feedback: CountFeedback) {
        self.recent.push_front(feedback);
        self.recent.truncate(RECENT_COUNTS);
    }

    fn seed_from(&mut self, entries: &[AuditedLotEntry]) {
        for e in entries {
            self.drafts.insert(
                e.lot_id,
                DraftCount {
                    lot_id: e.lot_id,
                    system_weight: e.system_weight,
                    physical_weight: e.physical_weight,
                    observation: e.observation.clone(),
                    temp_lot: e.temp_lot.clone(),
                },
            );
        }
    }

    fn clear(&mut self) {
        self.drafts.clear();
        self.recent.clear();
    }
}

/// Lot found in the yard but missing from the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickAddLot {
    pub internal_lot: String,
    pub physical_weight: Kg,
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default)]
    pub supplier_lot: Option<String>,
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub observation: Option<String>,
}

/// Progress of one pair for dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairOverview {
    pub pair: PairKey,
    pub pool_size: usize,
    pub state: PairState,
    pub items_count: Option<u32>,
    pub checked_count: Option<u32>,
    pub applied_to_stock: bool,
}

pub struct AuditEngine<L, S> {
    pub(crate) ledger: L,
    pub(crate) sessions: S,
}

impl<L, S> AuditEngine<L, S>
where
    L: LedgerStore,
    S: SessionStore,
{
    pub fn new(ledger: L, sessions: S) -> Self {
        Self { ledger, sessions }
    }

    /// Lots the pair's audit must account for, in natural lot order.
    pub async fn pool(&self, pair: &PairKey) -> AuditResult<Vec<StockItem>> {
        let items = self.ledger.list_lots().await?;
        Ok(audit_pool(&items, pair))
    }

    pub async fn pair_state(&self, pair: &PairKey) -> AuditResult<PairState> {
        let sessions = self.sessions.list_sessions().await?;
        Ok(pair_state(&sessions, pair))
    }

    pub async fn session(&self, id: SessionId) -> AuditResult<InventorySession> {
        self.sessions
            .get_session(id)
            .await?
            .ok_or_else(|| AuditError::not_found(format!("session {id}")))
    }

    pub async fn list_sessions(&self) -> AuditResult<Vec<InventorySession>> {
        Ok(self.sessions.list_sessions().await?)
    }

    /// Start (or resume) counting a pair.
    ///
    /// Creates the backing open session when the pair has none. A pair in
    /// re-audit resumes from its previous snapshot. A locked pair yields a
    /// session that rejects every count.
    pub async fn open_session(&self, pair: &PairKey, operator: &str) -> AuditResult<AuditSession> {
        let sessions = self.sessions.list_sessions().await?;
        let mut audit = AuditSession::new(pair.clone(), operator);

        match pair_state(&sessions, pair) {
            PairState::Locked(id) => {
                tracing::info!(pair = %pair, session_id = %id, "pair is locked; opened read-only");
            }
            PairState::ReAudit(id) => {
                if let Some(previous) = sessions.iter().find(|s| s.id == id) {
                    audit.seed_from(&previous.audited_lots);
                }
                tracing::info!(pair = %pair, session_id = %id, resumed = audit.counted(), "re-audit resumed");
            }
            PairState::Open(_) | PairState::Untouched => {
                let active = self.ensure_active_session(pair, operator, &sessions).await?;
                tracing::info!(pair = %pair, session_id = %active.id, operator, "audit session opened");
            }
        }

        Ok(audit)
    }

    /// Record the physical weight of a ledger lot.
    pub async fn record_count(
        &self,
        audit: &mut AuditSession,
        lot_id: LotId,
        physical_weight: Kg,
        observation: Option<String>,
    ) -> AuditResult<CountFeedback> {
        if physical_weight.is_sign_negative() && !physical_weight.is_zero() {
            return Err(AuditError::validation("physical weight cannot be negative"));
        }

        let sessions = self.sessions.list_sessions().await?;
        ensure_unlocked(&sessions, audit.pair())?;

        if audit.draft(lot_id).is_some_and(|d| d.temp_lot.is_some()) {
            return Err(AuditError::validation(
                "quick-add lots are weighed when they are added",
            ));
        }

        let lot = self
            .ledger
            .get_lot(lot_id)
            .await?
            .ok_or_else(|| AuditError::not_found(format!("lot {lot_id}")))?;

        if !audit.pair().matches(&lot.material_type, lot.gauge) {
            return Err(AuditError::validation(format!(
                "lot {} belongs to {}, not {}",
                lot.internal_lot,
                lot.pair(),
                audit.pair()
            )));
        }
        if !lot.is_auditable() {
            return Err(AuditError::validation(format!(
                "lot {} is {} and cannot be counted",
                lot.internal_lot, lot.status
            )));
        }

        if audit.draft(lot_id).is_none() {
            let active = self
                .ensure_active_session(audit.pair(), audit.operator(), &sessions)
                .await?;
            self.sessions
                .update_session(
                    active.id,
                    SessionPatch {
                        checked_count: Some(active.checked_count.saturating_add(1)),
                        ..SessionPatch::default()
                    },
                )
                .await?;
        }

        let system_weight = lot.remaining_quantity;
        audit.drafts.insert(
            lot_id,
            DraftCount {
                lot_id,
                system_weight,
                physical_weight,
                observation: clean_observation(observation),
                temp_lot: None,
            },
        );

        let feedback = CountFeedback {
            internal_lot: lot.internal_lot.clone(),
            ok: within_tolerance(physical_weight, system_weight),
            diff: physical_weight - system_weight,
        };
        audit.push_feedback(feedback.clone());

        tracing::info!(
            pair = %audit.pair(),
            lot = %lot.internal_lot,
            system = %system_weight,
            physical = %physical_weight,
            ok = feedback.ok,
            "count recorded"
        );
        Ok(feedback)
    }

    /// Register a lot found in the yard but absent from the ledger.
    ///
    /// The lot only exists as a draft until the audit is approved.
    pub async fn quick_add(&self, audit: &mut AuditSession, draft: QuickAddLot) -> AuditResult<LotId> {
        let internal_lot = draft.internal_lot.trim().to_string();
        if internal_lot.is_empty() {
            return Err(AuditError::validation("internal lot code is required"));
        }
        if draft.physical_weight <= Decimal::ZERO {
            return Err(AuditError::validation("physical weight must be positive"));
        }

        let sessions = self.sessions.list_sessions().await?;
        ensure_unlocked(&sessions, audit.pair())?;

        let items = self.ledger.list_lots().await?;
        let in_pool = audit_pool(&items, audit.pair())
            .iter()
            .any(|i| i.internal_lot.trim().eq_ignore_ascii_case(&internal_lot));
        let in_drafts = audit.drafts().any(|d| {
            d.temp_lot
                .as_ref()
                .is_some_and(|t| t.internal_lot.eq_ignore_ascii_case(&internal_lot))
        });
        if in_pool || in_drafts {
            return Err(AuditError::validation(format!(
                "lot {internal_lot} already exists for {}",
                audit.pair()
            )));
        }

        let now = Utc::now();
        let temp = StockItem {
            id: LotId::new(),
            material_type: audit.pair().material_type.clone(),
            gauge: audit.pair().gauge,
            internal_lot,
            supplier: draft.supplier,
            supplier_lot: draft.supplier_lot,
            invoice_number: draft.invoice_number,
            initial_quantity: draft.physical_weight,
            label_weight: Some(draft.physical_weight),
            remaining_quantity: draft.physical_weight,
            location: draft.location,
            status: LotStatus::Available,
            entry_date: now,
            last_audit_date: None,
            audit_observation: None,
            history: Vec::new(),
        };

        let active = self
            .ensure_active_session(audit.pair(), audit.operator(), &sessions)
            .await?;
        self.sessions
            .update_session(
                active.id,
                SessionPatch {
                    items_count: Some(active.items_count.saturating_add(1)),
                    checked_count: Some(active.checked_count.saturating_add(1)),
                    ..SessionPatch::default()
                },
            )
            .await?;

        let lot_id = temp.id;
        tracing::info!(pair = %audit.pair(), lot = %temp.internal_lot, weight = %draft.physical_weight, "quick-add lot drafted");
        audit.drafts.insert(
            lot_id,
            DraftCount {
                lot_id,
                system_weight: Decimal::ZERO,
                physical_weight: draft.physical_weight,
                observation: clean_observation(draft.observation),
                temp_lot: Some(temp),
            },
        );
        Ok(lot_id)
    }

    /// Freeze the operator's drafts into a completed session snapshot.
    ///
    /// Lots of the pool that were never counted still count towards
    /// `items_count`. Clears the drafts on success.
    pub async fn finish_session(
        &self,
        audit: &mut AuditSession,
        prompt: &dyn OperatorPrompt,
    ) -> AuditResult<InventorySession> {
        let question = format!(
            "Finish the audit of {} with {} counted lots? The pair is locked afterwards.",
            audit.pair(),
            audit.counted()
        );
        if !prompt.confirm(&question) {
            tracing::info!(pair = %audit.pair(), "finish declined by operator");
            return Err(AuditError::Cancelled);
        }

        let sessions = self.sessions.list_sessions().await?;
        ensure_unlocked(&sessions, audit.pair())?;

        let items = self.ledger.list_lots().await?;
        let by_id: HashMap<LotId, &StockItem> = items.iter().map(|i| (i.id, i)).collect();
        let pool_ids: HashSet<LotId> = audit_pool(&items, audit.pair())
            .iter()
            .map(|i| i.id)
            .collect();

        let entries: Vec<AuditedLotEntry> = audit
            .drafts()
            .map(|d| {
                let internal_lot = match (&d.temp_lot, by_id.get(&d.lot_id)) {
                    (Some(temp), _) => temp.internal_lot.clone(),
                    (None, Some(lot)) => lot.internal_lot.clone(),
                    (None, None) => {
                        tracing::warn!(lot_id = %d.lot_id, "drafted lot no longer in ledger");
                        UNKNOWN_LOT.to_string()
                    }
                };
                AuditedLotEntry {
                    lot_id: d.lot_id,
                    internal_lot,
                    system_weight: d.system_weight,
                    physical_weight: d.physical_weight,
                    observation: d.observation.clone(),
                    temp_lot: d.temp_lot.clone(),
                }
            })
            .collect();

        let counted_in_pool = entries.iter().filter(|e| pool_ids.contains(&e.lot_id)).count();
        let uncounted = pool_ids.len().saturating_sub(counted_in_pool);
        let items_count = to_u32(entries.len() + uncounted);
        let checked_count = to_u32(entries.len());
        let now = Utc::now();

        let finished = match active_session(&sessions, audit.pair()) {
            Some(active) => {
                let patch = SessionPatch {
                    status: Some(SessionStatus::Completed),
                    end_date: Some(Some(now)),
                    operator: Some(audit.operator().to_string()),
                    items_count: Some(items_count),
                    checked_count: Some(checked_count),
                    audited_lots: Some(entries),
                    ..SessionPatch::default()
                };
                self.sessions.update_session(active.id, patch.clone()).await?;
                let mut session = active.clone();
                patch.apply(&mut session);
                session
            }
            None => {
                let mut session =
                    InventorySession::open(audit.pair(), audit.operator(), items_count, now);
                session.status = SessionStatus::Completed;
                session.end_date = Some(now);
                session.checked_count = checked_count;
                session.audited_lots = entries;
                self.sessions.create_session(session.clone()).await?;
                session
            }
        };

        audit.clear();
        tracing::info!(
            pair = %finished.pair(),
            session_id = %finished.id,
            items = finished.items_count,
            checked = finished.checked_count,
            "audit session finished"
        );
        Ok(finished)
    }

    /// Move a completed, not yet applied session back to re-audit.
    pub async fn reopen_session(&self, id: SessionId) -> AuditResult<InventorySession> {
        let mut session = self.session(id).await?;
        if session.status != SessionStatus::Completed {
            return Err(AuditError::validation(format!(
                "only completed sessions can be reopened (session {id} is {:?})",
                session.status
            )));
        }
        if session.applied_to_stock {
            return Err(AuditError::AlreadyApplied(id));
        }

        let sessions = self.sessions.list_sessions().await?;
        if let Some(active) = active_session(&sessions, &session.pair()) {
            return Err(AuditError::validation(format!(
                "{} already has an active session ({})",
                session.pair(),
                active.id
            )));
        }

        let patch = SessionPatch {
            status: Some(SessionStatus::ReAudit),
            end_date: Some(None),
            ..SessionPatch::default()
        };
        self.sessions.update_session(id, patch.clone()).await?;
        patch.apply(&mut session);

        tracing::info!(pair = %session.pair(), session_id = %id, "session reopened for re-audit");
        Ok(session)
    }

    /// Remove a session record, e.g. to clear the previous cycle's locks.
    pub async fn delete_session(&self, id: SessionId) -> AuditResult<()> {
        let session = self.session(id).await?;
        self.sessions.delete_session(id).await?;
        tracing::info!(
            pair = %session.pair(),
            session_id = %id,
            status = ?session.status,
            applied = session.applied_to_stock,
            "session deleted"
        );
        Ok(())
    }

    /// Counting progress for every pair in the yard or in the session store.
    pub async fn overview(&self) -> AuditResult<Vec<PairOverview>> {
        let items = self.ledger.list_lots().await?;
        let sessions = self.sessions.list_sessions().await?;

        let mut pairs: BTreeSet<PairKey> = distinct_pairs(&items).into_iter().collect();
        pairs.extend(sessions.iter().map(InventorySession::pair));

        Ok(pairs
            .into_iter()
            .map(|pair| {
                let latest = latest_session(&sessions, &pair);
                PairOverview {
                    pool_size: audit_pool(&items, &pair).len(),
                    state: pair_state(&sessions, &pair),
                    items_count: latest.map(|s| s.items_count),
                    checked_count: latest.map(|s| s.checked_count),
                    applied_to_stock: latest.is_some_and(|s| s.applied_to_stock),
                    pair,
                }
            })
            .collect())
    }

    /// The pair's open/re-audit session, creating an open one if none exists.
    async fn ensure_active_session(
        &self,
        pair: &PairKey,
        operator: &str,
        sessions: &[InventorySession],
    ) -> AuditResult<InventorySession> {
        if let Some(active) = active_session(sessions, pair) {
            return Ok(active.clone());
        }

        let pool_size = self.pool(pair).await?.len();
        let session = InventorySession::open(pair, operator, to_u32(pool_size), Utc::now());
        self.sessions.create_session(session.clone()).await?;
        tracing::info!(pair = %pair, session_id = %session.id, items = session.items_count, "session created");
        Ok(session)
    }
}

fn ensure_unlocked(sessions: &[InventorySession], pair: &PairKey) -> AuditResult<()> {
    match pair_state(sessions, pair) {
        PairState::Locked(id) => Err(AuditError::validation(format!(
            "{pair} is locked: audit {id} is already completed"
        ))),
        _ => Ok(()),
    }
}

fn clean_observation(observation: Option<String>) -> Option<String> {
    observation
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
}

pub(crate) fn to_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::FixedPrompt;
    use crate::testing::{ca60, engine_with, kg, lot};
    use rodstock_inventory::Gauge;

    #[tokio::test]
    async fn partial_count_finishes_with_uncounted_lots_in_denominator() {
        let (l1, l2, l3) = (lot("1", 100), lot("2", 200), lot("3", 300));
        let (engine, _ledger, sessions) = engine_with(vec![l1.clone(), l2.clone(), l3]);

        let mut audit = engine.open_session(&ca60(), "Joana").await.unwrap();
        engine.record_count(&mut audit, l1.id, kg(100), Some(String::new())).await.unwrap();
        engine
            .record_count(&mut audit, l2.id, kg(205), Some("off by 5".to_string()))
            .await
            .unwrap();

        let finished = engine
            .finish_session(&mut audit, &FixedPrompt::confirming(true))
            .await
            .unwrap();

        assert_eq!(finished.audited_lots.len(), 2);
        assert_eq!(finished.items_count, 3);
        assert_eq!(finished.checked_count, 2);
        assert_eq!(finished.status, SessionStatus::Completed);
        assert!(finished.end_date.is_some());
        assert_eq!(finished.audited_lots[0].observation, None);
        assert_eq!(finished.audited_lots[1].observation.as_deref(), Some("off by 5"));
        assert_eq!(audit.counted(), 0);

        let stored = sessions.get_session(finished.id).await.unwrap().unwrap();
        assert_eq!(stored, finished);
    }

    #[tokio::test]
    async fn counting_a_locked_pair_fails_and_leaves_ledger_untouched() {
        let l1 = lot("1", 100);
        let (engine, ledger, _sessions) = engine_with(vec![l1.clone()]);

        let mut first = engine.open_session(&ca60(), "Joana").await.unwrap();
        engine.record_count(&mut first, l1.id, kg(100), None).await.unwrap();
        engine
            .finish_session(&mut first, &FixedPrompt::confirming(true))
            .await
            .unwrap();

        let before = ledger.list_lots().await.unwrap();
        let mut late = engine.open_session(&ca60(), "Caio").await.unwrap();
        let err = engine
            .record_count(&mut late, l1.id, kg(90), None)
            .await
            .unwrap_err();

        assert!(matches!(err, AuditError::Validation(msg) if msg.contains("locked")));
        assert_eq!(ledger.list_lots().await.unwrap(), before);
        assert_eq!(late.counted(), 0);
    }

    #[tokio::test]
    async fn checked_count_is_live_and_not_double_counted() {
        let (l1, l2) = (lot("1", 100), lot("2", 200));
        let (engine, _ledger, sessions) = engine_with(vec![l1.clone(), l2.clone()]);

        let mut audit = engine.open_session(&ca60(), "Joana").await.unwrap();
        engine.record_count(&mut audit, l1.id, kg(100), None).await.unwrap();
        engine.record_count(&mut audit, l1.id, kg(101), None).await.unwrap();

        let live = sessions.list_sessions().await.unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].checked_count, 1);
        assert_eq!(live[0].items_count, 2);
        assert_eq!(live[0].status, SessionStatus::Open);
        assert_eq!(audit.draft(l1.id).unwrap().physical_weight, kg(101));
    }

    #[tokio::test]
    async fn feedback_history_keeps_last_five_newest_first() {
        let lots: Vec<_> = (1..=7).map(|n| lot(&n.to_string(), 100)).collect();
        let (engine, _ledger, _sessions) = engine_with(lots.clone());
        let mut audit = engine.open_session(&ca60(), "Joana").await.unwrap();

        for l in &lots {
            engine.record_count(&mut audit, l.id, kg(100), None).await.unwrap();
        }
        let fb = engine
            .record_count(&mut audit, lots[0].id, Decimal::new(1005, 1), None)
            .await
            .unwrap();
        assert!(!fb.ok);
        assert_eq!(fb.diff, Decimal::new(5, 1));

        let recent: Vec<_> = audit.recent().map(|f| f.internal_lot.as_str()).collect();
        assert_eq!(recent, vec!["1", "7", "6", "5", "4"]);
    }

    #[tokio::test]
    async fn count_rejects_foreign_lots_and_negative_weights() {
        let mut other = lot("9", 100);
        other.gauge = Gauge::from_hundredths(800);
        let l1 = lot("1", 100);
        let (engine, _ledger, _sessions) = engine_with(vec![l1.clone(), other.clone()]);
        let mut audit = engine.open_session(&ca60(), "Joana").await.unwrap();

        let err = engine.record_count(&mut audit, other.id, kg(100), None).await.unwrap_err();
        assert!(matches!(err, AuditError::Validation(_)));

        let err = engine.record_count(&mut audit, l1.id, kg(-1), None).await.unwrap_err();
        assert!(matches!(err, AuditError::Validation(_)));

        let err = engine
            .record_count(&mut audit, LotId::new(), kg(1), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AuditError::NotFound(_)));
    }

    #[tokio::test]
    async fn quick_add_drafts_lot_without_touching_ledger() {
        let l1 = lot("1", 100);
        let (engine, ledger, sessions) = engine_with(vec![l1.clone()]);
        let mut audit = engine.open_session(&ca60(), "Joana").await.unwrap();

        let id = engine
            .quick_add(
                &mut audit,
                QuickAddLot {
                    internal_lot: "9999".to_string(),
                    physical_weight: kg(50),
                    supplier: None,
                    supplier_lot: None,
                    invoice_number: None,
                    location: Some("B-03".to_string()),
                    observation: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(ledger.list_lots().await.unwrap().len(), 1);
        let live = &sessions.list_sessions().await.unwrap()[0];
        assert_eq!(live.items_count, 2);
        assert_eq!(live.checked_count, 1);

        let finished = engine
            .finish_session(&mut audit, &FixedPrompt::confirming(true))
            .await
            .unwrap();
        let entry = &finished.audited_lots[0];
        assert_eq!(entry.lot_id, id);
        assert_eq!(entry.internal_lot, "9999");
        assert_eq!(entry.system_weight, Decimal::ZERO);
        assert!(entry.temp_lot.is_some());
        // the uncounted ledger lot plus the quick-add lot
        assert_eq!(finished.items_count, 2);
        assert_eq!(finished.checked_count, 1);
    }

    #[tokio::test]
    async fn quick_add_validates_input() {
        let l1 = lot("L-10", 100);
        let (engine, _ledger, _sessions) = engine_with(vec![l1]);
        let mut audit = engine.open_session(&ca60(), "Joana").await.unwrap();

        let draft = |code: &str, weight: i64| QuickAddLot {
            internal_lot: code.to_string(),
            physical_weight: kg(weight),
            supplier: None,
            supplier_lot: None,
            invoice_number: None,
            location: None,
            observation: None,
        };

        for bad in [draft("  ", 10), draft("N-1", 0), draft("l-10", 10)] {
            let err = engine.quick_add(&mut audit, bad).await.unwrap_err();
            assert!(matches!(err, AuditError::Validation(_)));
        }

        engine.quick_add(&mut audit, draft("N-1", 10)).await.unwrap();
        let err = engine.quick_add(&mut audit, draft("n-1", 12)).await.unwrap_err();
        assert!(matches!(err, AuditError::Validation(_)));
        assert_eq!(audit.counted(), 1);
    }

    #[tokio::test]
    async fn declined_finish_writes_nothing() {
        let l1 = lot("1", 100);
        let (engine, _ledger, sessions) = engine_with(vec![l1.clone()]);
        let mut audit = engine.open_session(&ca60(), "Joana").await.unwrap();
        engine.record_count(&mut audit, l1.id, kg(100), None).await.unwrap();

        let err = engine
            .finish_session(&mut audit, &FixedPrompt::confirming(false))
            .await
            .unwrap_err();
        assert_eq!(err, AuditError::Cancelled);
        assert_eq!(audit.counted(), 1);
        let live = &sessions.list_sessions().await.unwrap()[0];
        assert_eq!(live.status, SessionStatus::Open);
    }

    #[tokio::test]
    async fn refinishing_a_re_audit_keeps_id_and_start_date() {
        let (l1, l2) = (lot("1", 100), lot("2", 200));
        let (engine, _ledger, _sessions) = engine_with(vec![l1.clone(), l2.clone()]);

        let mut audit = engine.open_session(&ca60(), "Joana").await.unwrap();
        engine.record_count(&mut audit, l1.id, kg(90), None).await.unwrap();
        let first = engine
            .finish_session(&mut audit, &FixedPrompt::confirming(true))
            .await
            .unwrap();

        let reopened = engine.reopen_session(first.id).await.unwrap();
        assert_eq!(reopened.status, SessionStatus::ReAudit);
        assert_eq!(reopened.end_date, None);

        let mut again = engine.open_session(&ca60(), "Caio").await.unwrap();
        assert_eq!(again.counted(), 1);
        engine.record_count(&mut again, l1.id, kg(100), None).await.unwrap();
        engine.record_count(&mut again, l2.id, kg(200), None).await.unwrap();
        let second = engine
            .finish_session(&mut again, &FixedPrompt::confirming(true))
            .await
            .unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.start_date, first.start_date);
        assert_eq!(second.checked_count, 2);
        assert_eq!(second.audited_lots[0].physical_weight, kg(100));
        assert_eq!(second.operator, "Caio");
    }

    #[tokio::test]
    async fn reopen_rejects_open_and_applied_sessions() {
        let l1 = lot("1", 100);
        let (engine, _ledger, sessions) = engine_with(vec![l1.clone()]);
        engine.open_session(&ca60(), "Joana").await.unwrap();
        let open = sessions.list_sessions().await.unwrap().remove(0);

        let err = engine.reopen_session(open.id).await.unwrap_err();
        assert!(matches!(err, AuditError::Validation(_)));

        sessions
            .update_session(
                open.id,
                SessionPatch {
                    status: Some(SessionStatus::Completed),
                    applied_to_stock: Some(true),
                    ..SessionPatch::default()
                },
            )
            .await
            .unwrap();
        let err = engine.reopen_session(open.id).await.unwrap_err();
        assert_eq!(err, AuditError::AlreadyApplied(open.id));

        let err = engine.reopen_session(SessionId::new()).await.unwrap_err();
        assert!(matches!(err, AuditError::NotFound(_)));
    }

    #[tokio::test]
    async fn unresolvable_draft_falls_back_to_placeholder() {
        let l1 = lot("1", 100);
        let (engine, _ledger, _sessions) = engine_with(vec![l1]);
        let mut audit = engine.open_session(&ca60(), "Joana").await.unwrap();
        let ghost = LotId::new();
        audit.drafts.insert(
            ghost,
            DraftCount {
                lot_id: ghost,
                system_weight: kg(10),
                physical_weight: kg(10),
                observation: None,
                temp_lot: None,
            },
        );

        let finished = engine
            .finish_session(&mut audit, &FixedPrompt::confirming(true))
            .await
            .unwrap();
        assert_eq!(finished.audited_lots[0].internal_lot, UNKNOWN_LOT);
    }

    #[tokio::test]
    async fn deleting_the_completed_session_unlocks_the_pair() {
        let l1 = lot("1", 100);
        let (engine, _ledger, _sessions) = engine_with(vec![l1.clone()]);
        let mut audit = engine.open_session(&ca60(), "Joana").await.unwrap();
        engine.record_count(&mut audit, l1.id, kg(100), None).await.unwrap();
        let done = engine
            .finish_session(&mut audit, &FixedPrompt::confirming(true))
            .await
            .unwrap();
        assert!(engine.pair_state(&ca60()).await.unwrap().is_locked());

        engine.delete_session(done.id).await.unwrap();
        assert_eq!(engine.pair_state(&ca60()).await.unwrap(), PairState::Untouched);
    }

    #[tokio::test]
    async fn overview_reports_progress_per_pair() {
        let l1 = lot("1", 100);
        let mut wire = lot("W1", 900);
        wire.material_type = "Fio Máquina".to_string();
        let (engine, _ledger, _sessions) = engine_with(vec![l1.clone(), wire]);

        let mut audit = engine.open_session(&ca60(), "Joana").await.unwrap();
        engine.record_count(&mut audit, l1.id, kg(100), None).await.unwrap();

        let overview = engine.overview().await.unwrap();
        assert_eq!(overview.len(), 2);
        let ca = &overview[0];
        assert_eq!(ca.pair, ca60());
        assert_eq!(ca.pool_size, 1);
        assert_eq!(ca.checked_count, Some(1));
        assert!(matches!(ca.state, PairState::Open(_)));
        assert_eq!(overview[1].state, PairState::Untouched);
        assert_eq!(overview[1].checked_count, None);
    }
}

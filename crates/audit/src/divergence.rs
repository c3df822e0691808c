//! Read-only divergence predicates and reports over finished audits.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use rodstock_core::{Kg, LotId, SessionId, exceeds_tolerance, within_tolerance};
use rodstock_events::Event;
use rodstock_infra::{LedgerStore, SessionStore};
use rodstock_inventory::{
    AuditedLotEntry, InventorySession, PairKey, SessionStatus, StockItem, natural_cmp,
};

use crate::engine::{AuditEngine, to_u32};
use crate::error::AuditResult;

/// An entry diverges when the weights differ by more than 0.1 kg or the
/// operator left an observation.
pub fn is_divergent(entry: &AuditedLotEntry) -> bool {
    exceeds_tolerance(entry.physical_weight, entry.system_weight) || entry.observation.is_some()
}

pub fn session_is_divergent(session: &InventorySession) -> bool {
    session.audited_lots.iter().any(is_divergent)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportLine {
    pub lot_id: LotId,
    pub internal_lot: String,
    pub system_weight: Kg,
    pub physical_weight: Kg,
    pub diff: Kg,
    pub observation: Option<String>,
    pub new_lot: bool,
    /// Same flag the operator saw when counting, and no observation.
    pub ok: bool,
    pub divergent: bool,
}

/// Summary of one session's snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    pub session_id: SessionId,
    pub pair: PairKey,
    pub status: SessionStatus,
    pub applied_to_stock: bool,
    pub counted: u32,
    pub ok: u32,
    pub diverged: u32,
    /// Off by exactly the tolerance: neither ok nor divergent.
    pub at_tolerance: u32,
    pub new_lots: u32,
    /// Expected lots that were never counted.
    pub uncounted: u32,
    pub system_total: Kg,
    pub physical_total: Kg,
    pub net_diff: Kg,
    pub lines: Vec<ReportLine>,
}

pub fn session_report(session: &InventorySession) -> SessionReport {
    let lines: Vec<ReportLine> = session
        .audited_lots
        .iter()
        .map(|e| ReportLine {
            lot_id: e.lot_id,
            internal_lot: e.internal_lot.clone(),
            system_weight: e.system_weight,
            physical_weight: e.physical_weight,
            diff: e.diff(),
            observation: e.observation.clone(),
            new_lot: e.is_new_lot(),
            ok: within_tolerance(e.physical_weight, e.system_weight) && e.observation.is_none(),
            divergent: is_divergent(e),
        })
        .collect();

    let counted = to_u32(lines.len());
    let ok = to_u32(lines.iter().filter(|l| l.ok).count());
    let diverged = to_u32(lines.iter().filter(|l| l.divergent).count());
    let system_total: Decimal = lines.iter().map(|l| l.system_weight).sum();
    let physical_total: Decimal = lines.iter().map(|l| l.physical_weight).sum();

    SessionReport {
        session_id: session.id,
        pair: session.pair(),
        status: session.status,
        applied_to_stock: session.applied_to_stock,
        counted,
        ok,
        diverged,
        at_tolerance: counted - ok - diverged,
        new_lots: to_u32(lines.iter().filter(|l| l.new_lot).count()),
        uncounted: session.items_count.saturating_sub(counted),
        system_total,
        physical_total,
        net_diff: physical_total - system_total,
        lines,
    }
}

/// A ledger lot whose last audit needs attention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CriticalItem {
    pub lot_id: LotId,
    pub internal_lot: String,
    pub pair: PairKey,
    pub remaining_quantity: Kg,
    pub last_audit_date: Option<DateTime<Utc>>,
    /// Session whose snapshot flagged the lot, if any.
    pub session_id: Option<SessionId>,
    pub system_weight: Option<Kg>,
    pub physical_weight: Option<Kg>,
    pub diff: Option<Kg>,
    pub observation: Option<String>,
    /// Type of the lot's latest history entry, e.g. "inventory-approved".
    pub last_event: Option<String>,
    pub last_event_at: Option<DateTime<Utc>>,
}

/// Lots that were audited and came out divergent, in natural lot order.
///
/// A lot counts as audited when it carries a `last_audit_date` or appears in a
/// session snapshot; the most recent snapshot entry wins. It is critical when
/// that entry diverges or the ledger carries an audit observation.
pub fn critical_items(items: &[StockItem], sessions: &[InventorySession]) -> Vec<CriticalItem> {
    let mut critical: Vec<CriticalItem> = items
        .iter()
        .filter_map(|item| {
            let last = latest_entry(sessions, item.id);
            if item.last_audit_date.is_none() && last.is_none() {
                return None;
            }

            let entry_divergent = last.is_some_and(|(_, e)| is_divergent(e));
            if !entry_divergent && item.audit_observation.is_none() {
                return None;
            }

            Some(CriticalItem {
                lot_id: item.id,
                internal_lot: item.internal_lot.clone(),
                pair: item.pair(),
                remaining_quantity: item.remaining_quantity,
                last_audit_date: item.last_audit_date,
                session_id: last.map(|(s, _)| s.id),
                system_weight: last.map(|(_, e)| e.system_weight),
                physical_weight: last.map(|(_, e)| e.physical_weight),
                diff: last.map(|(_, e)| e.diff()),
                observation: last
                    .and_then(|(_, e)| e.observation.clone())
                    .or_else(|| item.audit_observation.clone()),
                last_event: item.last_event().map(|h| h.event_type().to_string()),
                last_event_at: item.last_event().map(|h| h.occurred_at()),
            })
        })
        .collect();

    critical.sort_by(|a, b| natural_cmp(&a.internal_lot, &b.internal_lot));
    critical
}

impl<L, S> AuditEngine<L, S>
where
    L: LedgerStore,
    S: SessionStore,
{
    /// [`critical_items`] over the current ledger and session store.
    pub async fn critical(&self) -> AuditResult<Vec<CriticalItem>> {
        let items = self.ledger.list_lots().await?;
        let sessions = self.sessions.list_sessions().await?;
        Ok(critical_items(&items, &sessions))
    }
}

fn latest_entry(
    sessions: &[InventorySession],
    lot_id: LotId,
) -> Option<(&InventorySession, &AuditedLotEntry)> {
    sessions
        .iter()
        .filter_map(|s| {
            s.audited_lots
                .iter()
                .find(|e| e.lot_id == lot_id)
                .map(|e| (s, e))
        })
        .max_by_key(|(s, _)| s.end_date.unwrap_or(s.start_date))
}

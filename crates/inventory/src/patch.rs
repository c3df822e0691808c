//! Partial updates issued against the ledger and the session store.
//!
//! Stores apply these with [`LotPatch::apply`] / [`SessionPatch::apply`], so the
//! ledger invariants live here rather than in every backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rodstock_core::{DomainError, DomainResult, Kg};

use crate::session::{AuditedLotEntry, InventorySession, SessionStatus};
use crate::stock::{HistoryEntry, StockItem};

/// Partial lot update. History can only be appended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotPatch {
    pub remaining_quantity: Option<Kg>,
    pub last_audit_date: Option<DateTime<Utc>>,
    /// `Some(None)` clears the observation.
    pub audit_observation: Option<Option<String>>,
    pub append_history: Vec<HistoryEntry>,
}

impl LotPatch {
    pub fn apply(&self, item: &mut StockItem) -> DomainResult<()> {
        if let Some(q) = self.remaining_quantity {
            if q.is_sign_negative() && !q.is_zero() {
                return Err(DomainError::invariant(format!(
                    "remaining quantity of lot {} cannot go negative ({q})",
                    item.internal_lot
                )));
            }
            item.remaining_quantity = q;
        }
        if let Some(at) = self.last_audit_date {
            item.last_audit_date = Some(at);
        }
        if let Some(obs) = &self.audit_observation {
            item.audit_observation = obs.clone();
        }
        item.history.extend(self.append_history.iter().cloned());
        Ok(())
    }
}

/// Partial session update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPatch {
    pub status: Option<SessionStatus>,
    /// `Some(None)` clears the end date (reopen).
    pub end_date: Option<Option<DateTime<Utc>>>,
    pub operator: Option<String>,
    pub items_count: Option<u32>,
    pub checked_count: Option<u32>,
    pub audited_lots: Option<Vec<AuditedLotEntry>>,
    pub applied_to_stock: Option<bool>,
    pub applied_at: Option<DateTime<Utc>>,
    pub applied_by: Option<String>,
}

impl SessionPatch {
    pub fn apply(&self, session: &mut InventorySession) {
        if let Some(status) = self.status {
            session.status = status;
        }
        if let Some(end) = self.end_date {
            session.end_date = end;
        }
        if let Some(op) = &self.operator {
            session.operator = op.clone();
        }
        if let Some(n) = self.items_count {
            session.items_count = n;
        }
        if let Some(n) = self.checked_count {
            session.checked_count = n;
        }
        if let Some(lots) = &self.audited_lots {
            session.audited_lots = lots.clone();
        }
        if let Some(applied) = self.applied_to_stock {
            session.applied_to_stock = applied;
        }
        if let Some(at) = self.applied_at {
            session.applied_at = Some(at);
        }
        if let Some(by) = &self.applied_by {
            session.applied_by = Some(by.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gauge::Gauge;
    use crate::session::PairKey;
    use crate::stock::{HistoryKind, LotStatus};
    use rodstock_core::LotId;

    fn item() -> StockItem {
        StockItem {
            id: LotId::new(),
            material_type: "CA-60".to_string(),
            gauge: Gauge::from_hundredths(500),
            internal_lot: "L1".to_string(),
            supplier: None,
            supplier_lot: None,
            invoice_number: None,
            initial_quantity: Kg::new(100, 0),
            label_weight: None,
            remaining_quantity: Kg::new(100, 0),
            location: None,
            status: LotStatus::Available,
            entry_date: Utc::now(),
            last_audit_date: None,
            audit_observation: Some("old note".to_string()),
            history: vec![HistoryEntry::new(
                Utc::now(),
                HistoryKind::Received {
                    quantity: Kg::new(100, 0),
                },
            )],
        }
    }

    #[test]
    fn lot_patch_appends_history_and_clears_observation() {
        let mut lot = item();
        let patch = LotPatch {
            remaining_quantity: Some(Kg::new(95, 0)),
            last_audit_date: Some(Utc::now()),
            audit_observation: Some(None),
            append_history: vec![HistoryEntry::new(
                Utc::now(),
                HistoryKind::Relocated {
                    from: None,
                    to: Some("A-01".to_string()),
                },
            )],
        };
        patch.apply(&mut lot).unwrap();

        assert_eq!(lot.remaining_quantity, Kg::new(95, 0));
        assert!(lot.last_audit_date.is_some());
        assert_eq!(lot.audit_observation, None);
        assert_eq!(lot.history.len(), 2);
    }

    #[test]
    fn lot_patch_rejects_negative_quantity_without_mutating() {
        let mut lot = item();
        let before = lot.clone();
        let patch = LotPatch {
            remaining_quantity: Some(Kg::new(-1, 0)),
            ..LotPatch::default()
        };
        assert!(matches!(
            patch.apply(&mut lot),
            Err(DomainError::InvariantViolation(_))
        ));
        assert_eq!(lot, before);
    }

    #[test]
    fn session_patch_reopens() {
        let pair = PairKey::new("CA-60", Gauge::from_hundredths(500));
        let mut s = InventorySession::open(&pair, "Joana", 2, Utc::now());
        s.status = SessionStatus::Completed;
        s.end_date = Some(Utc::now());

        SessionPatch {
            status: Some(SessionStatus::ReAudit),
            end_date: Some(None),
            ..SessionPatch::default()
        }
        .apply(&mut s);

        assert_eq!(s.status, SessionStatus::ReAudit);
        assert_eq!(s.end_date, None);
    }
}

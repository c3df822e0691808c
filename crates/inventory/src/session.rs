//! Inventory audit sessions and the per-pair lifecycle rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rodstock_core::{Kg, LotId, SessionId};

use crate::gauge::Gauge;
use crate::stock::StockItem;

/// Normalized (material, gauge) pair: the unit of counting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairKey {
    pub material_type: String,
    pub gauge: Gauge,
}

impl PairKey {
    pub fn new(material_type: &str, gauge: Gauge) -> Self {
        Self {
            material_type: material_type.trim().to_string(),
            gauge,
        }
    }

    pub fn matches(&self, material_type: &str, gauge: Gauge) -> bool {
        self.gauge == gauge && self.material_type == material_type.trim()
    }
}

impl core::fmt::Display for PairKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {}", self.material_type, self.gauge)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    Open,
    ReAudit,
    Completed,
}

impl SessionStatus {
    /// Open and re-audit sessions still accept counts.
    pub fn is_active(self) -> bool {
        matches!(self, SessionStatus::Open | SessionStatus::ReAudit)
    }
}

/// One audit cycle for a (material, gauge) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySession {
    pub id: SessionId,
    pub material_type: String,
    pub gauge: Gauge,
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub operator: String,
    /// Expected number of lots.
    pub items_count: u32,
    /// Lots counted so far.
    pub checked_count: u32,
    #[serde(default)]
    pub applied_to_stock: bool,
    #[serde(default)]
    pub applied_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub applied_by: Option<String>,
    /// Snapshot written at finish; empty while the session is open.
    #[serde(default)]
    pub audited_lots: Vec<AuditedLotEntry>,
}

impl InventorySession {
    /// A fresh open session with no counts.
    pub fn open(pair: &PairKey, operator: impl Into<String>, items_count: u32, now: DateTime<Utc>) -> Self {
        Self {
            id: SessionId::new(),
            material_type: pair.material_type.clone(),
            gauge: pair.gauge,
            start_date: now,
            end_date: None,
            status: SessionStatus::Open,
            operator: operator.into(),
            items_count,
            checked_count: 0,
            applied_to_stock: false,
            applied_at: None,
            applied_by: None,
            audited_lots: Vec::new(),
        }
    }

    pub fn pair(&self) -> PairKey {
        PairKey::new(&self.material_type, self.gauge)
    }

    pub fn belongs_to(&self, pair: &PairKey) -> bool {
        pair.matches(&self.material_type, self.gauge)
    }
}

/// One lot's result inside a finished session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditedLotEntry {
    pub lot_id: LotId,
    pub internal_lot: String,
    /// Ledger weight at audit time (zero for quick-add lots).
    pub system_weight: Kg,
    pub physical_weight: Kg,
    #[serde(default)]
    pub observation: Option<String>,
    /// Draft lot found in the yard but absent from the ledger.
    #[serde(default)]
    pub temp_lot: Option<StockItem>,
}

impl AuditedLotEntry {
    pub fn is_new_lot(&self) -> bool {
        self.temp_lot.is_some()
    }

    pub fn diff(&self) -> Kg {
        self.physical_weight - self.system_weight
    }
}

/// Counting state of a pair, derived from the session store.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "session_id", rename_all = "kebab-case")]
pub enum PairState {
    /// No session exists for the pair.
    Untouched,
    Open(SessionId),
    ReAudit(SessionId),
    /// A completed session exists; no further counting.
    Locked(SessionId),
}

impl PairState {
    pub fn is_locked(&self) -> bool {
        matches!(self, PairState::Locked(_))
    }
}

/// Derive the pair state.
///
/// Locked iff any session for the pair is completed; otherwise re-audit wins
/// over open. Among several candidates the most recently started one is reported.
pub fn pair_state(sessions: &[InventorySession], pair: &PairKey) -> PairState {
    let latest_with = |status: SessionStatus| {
        sessions
            .iter()
            .filter(|s| s.belongs_to(pair) && s.status == status)
            .max_by_key(|s| s.start_date)
            .map(|s| s.id)
    };

    if let Some(id) = latest_with(SessionStatus::Completed) {
        PairState::Locked(id)
    } else if let Some(id) = latest_with(SessionStatus::ReAudit) {
        PairState::ReAudit(id)
    } else if let Some(id) = latest_with(SessionStatus::Open) {
        PairState::Open(id)
    } else {
        PairState::Untouched
    }
}

/// The open or re-audit session that counts for this pair go to, if any.
pub fn active_session<'a>(
    sessions: &'a [InventorySession],
    pair: &PairKey,
) -> Option<&'a InventorySession> {
    sessions
        .iter()
        .filter(|s| s.belongs_to(pair) && s.status.is_active())
        .max_by_key(|s| (s.status == SessionStatus::ReAudit, s.start_date))
}

/// Session shown for progress display: re-audit first, then most recently started.
pub fn latest_session<'a>(
    sessions: &'a [InventorySession],
    pair: &PairKey,
) -> Option<&'a InventorySession> {
    sessions
        .iter()
        .filter(|s| s.belongs_to(pair))
        .max_by_key(|s| (s.status == SessionStatus::ReAudit, s.start_date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn pair() -> PairKey {
        PairKey::new("CA-60", Gauge::from_hundredths(500))
    }

    fn session(status: SessionStatus, started_minutes_ago: i64) -> InventorySession {
        let mut s = InventorySession::open(&pair(), "Joana", 3, Utc::now() - Duration::minutes(started_minutes_ago));
        s.status = status;
        s
    }

    #[test]
    fn untouched_without_sessions() {
        assert_eq!(pair_state(&[], &pair()), PairState::Untouched);
    }

    #[test]
    fn any_completed_session_locks_the_pair() {
        let open = session(SessionStatus::Open, 1);
        let done = session(SessionStatus::Completed, 10);
        let state = pair_state(&[open, done.clone()], &pair());
        assert_eq!(state, PairState::Locked(done.id));
        assert!(state.is_locked());
    }

    #[test]
    fn re_audit_takes_precedence_over_open() {
        let open = session(SessionStatus::Open, 1);
        let re = session(SessionStatus::ReAudit, 30);
        let sessions = vec![open, re.clone()];
        assert_eq!(pair_state(&sessions, &pair()), PairState::ReAudit(re.id));
        assert_eq!(active_session(&sessions, &pair()).map(|s| s.id), Some(re.id));
    }

    #[test]
    fn most_recent_open_session_wins_among_duplicates() {
        let old = session(SessionStatus::Open, 60);
        let new = session(SessionStatus::Open, 5);
        let sessions = vec![old, new.clone()];
        assert_eq!(latest_session(&sessions, &pair()).map(|s| s.id), Some(new.id));
    }

    #[test]
    fn sessions_of_other_pairs_are_ignored() {
        let mut other = session(SessionStatus::Completed, 1);
        other.gauge = Gauge::from_hundredths(600);
        assert_eq!(pair_state(&[other], &pair()), PairState::Untouched);
    }

    #[test]
    fn material_comparison_ignores_surrounding_whitespace() {
        let p = PairKey::new(" CA-60 ", Gauge::from_hundredths(500));
        assert!(p.matches("CA-60", Gauge::from_hundredths(500)));
        assert!(!p.matches("Fio Máquina", Gauge::from_hundredths(500)));
    }
}

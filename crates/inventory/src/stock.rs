use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rodstock_core::{Kg, LotId, SessionId};
use rodstock_events::Event;

use crate::gauge::Gauge;
use crate::session::PairKey;

/// A physical lot of wire rod or CA-60 held in the stock ledger.
///
/// Lots are never physically deleted; they leave the audit pool by moving to
/// a `transferred` or consumed status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockItem {
    pub id: LotId,
    pub material_type: String,
    pub gauge: Gauge,
    /// Operator-facing lot code printed on the label.
    pub internal_lot: String,
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default)]
    pub supplier_lot: Option<String>,
    #[serde(default)]
    pub invoice_number: Option<String>,
    pub initial_quantity: Kg,
    #[serde(default)]
    pub label_weight: Option<Kg>,
    pub remaining_quantity: Kg,
    /// Slot address in the storage yard.
    #[serde(default)]
    pub location: Option<String>,
    pub status: LotStatus,
    pub entry_date: DateTime<Utc>,
    #[serde(default)]
    pub last_audit_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub audit_observation: Option<String>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl StockItem {
    pub fn pair(&self) -> PairKey {
        PairKey::new(&self.material_type, self.gauge)
    }

    /// Lots that are still physically in the yard and can be counted.
    pub fn is_auditable(&self) -> bool {
        self.status.is_auditable()
    }

    /// Most recent history entry written by approving `session_id`.
    pub fn last_approval_from(&self, session_id: SessionId) -> Option<&HistoryEntry> {
        self.history
            .iter()
            .rev()
            .find(|h| h.kind.session_id() == Some(session_id))
    }

    /// Latest history entry, the lot's last recorded movement.
    pub fn last_event(&self) -> Option<&HistoryEntry> {
        self.history.iter().max_by_key(|h| h.occurred_at())
    }
}

/// Lot lifecycle status.
///
/// Collaborators may write statuses this system does not model; those are kept
/// verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LotStatus {
    Available,
    InProduction,
    Transferred,
    Consumed,
    PartiallyConsumed,
    Other(String),
}

impl LotStatus {
    pub fn as_str(&self) -> &str {
        match self {
            LotStatus::Available => "available",
            LotStatus::InProduction => "in-production",
            LotStatus::Transferred => "transferred",
            LotStatus::Consumed => "consumed",
            LotStatus::PartiallyConsumed => "partially-consumed",
            LotStatus::Other(s) => s,
        }
    }

    /// Excludes transferred lots and anything whose status mentions "consumed"
    /// (case-insensitive).
    pub fn is_auditable(&self) -> bool {
        match self {
            LotStatus::Transferred => false,
            other => !other.as_str().to_lowercase().contains("consumed"),
        }
    }
}

impl From<String> for LotStatus {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "available" => LotStatus::Available,
            "in-production" => LotStatus::InProduction,
            "transferred" => LotStatus::Transferred,
            "consumed" => LotStatus::Consumed,
            "partially-consumed" => LotStatus::PartiallyConsumed,
            _ => LotStatus::Other(value),
        }
    }
}

impl From<LotStatus> for String {
    fn from(value: LotStatus) -> Self {
        value.as_str().to_string()
    }
}

impl core::fmt::Display for LotStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a lot's append-only history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: HistoryKind,
}

impl HistoryEntry {
    pub fn new(at: DateTime<Utc>, kind: HistoryKind) -> Self {
        Self { at, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HistoryKind {
    /// Lot registered at receiving/conferencing.
    Received { quantity: Kg },
    /// Lot moved between yard slots.
    Relocated {
        from: Option<String>,
        to: Option<String>,
    },
    /// Material drawn by a production order.
    Consumed {
        quantity: Kg,
        production_order: Option<String>,
    },
    /// Audit applied to an existing lot.
    InventoryApproved {
        session_id: SessionId,
        previous_weight: Kg,
        new_weight: Kg,
        diff: Kg,
        approved_by: String,
        observation: Option<String>,
    },
    /// Lot created from a quick-add audit entry.
    InventoryEntryApproved {
        session_id: SessionId,
        draft_id: LotId,
        weight: Kg,
        approved_by: String,
    },
}

impl HistoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryKind::Received { .. } => "received",
            HistoryKind::Relocated { .. } => "relocated",
            HistoryKind::Consumed { .. } => "consumed",
            HistoryKind::InventoryApproved { .. } => "inventory-approved",
            HistoryKind::InventoryEntryApproved { .. } => "inventory-entry-approved",
        }
    }

    /// `true` when this is an approval that set the lot to `weight` with `observation`.
    pub fn approved_as(&self, weight: Kg, observation: Option<&str>) -> bool {
        match self {
            HistoryKind::InventoryApproved {
                new_weight,
                observation: noted,
                ..
            } => *new_weight == weight && noted.as_deref() == observation,
            _ => false,
        }
    }

    pub fn session_id(&self) -> Option<SessionId> {
        match self {
            HistoryKind::InventoryApproved { session_id, .. }
            | HistoryKind::InventoryEntryApproved { session_id, .. } => Some(*session_id),
            _ => None,
        }
    }
}

impl Event for HistoryEntry {
    fn event_type(&self) -> &str {
        self.kind.as_str()
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.at
    }
}

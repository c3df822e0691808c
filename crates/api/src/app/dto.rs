use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};

use rodstock_audit::{AuditSession, session_is_divergent, session_report};
use rodstock_core::{LotId, SessionId};
use rodstock_inventory::{Gauge, InventorySession, PairKey, PairState, StockItem};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RecordCountRequest {
    pub lot_id: String,
    pub physical_weight: Decimal,
    #[serde(default)]
    pub observation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FinishRequest {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    pub passphrase: String,
}

// -------------------------
// Path parsing
// -------------------------

pub fn parse_pair(material: &str, gauge: &str) -> Result<PairKey, axum::response::Response> {
    if material.trim().is_empty() {
        return Err(errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_pair",
            "material type is required",
        ));
    }
    let gauge = Gauge::parse(gauge)
        .map_err(|e| errors::json_error(StatusCode::BAD_REQUEST, "invalid_gauge", e.to_string()))?;
    Ok(PairKey::new(material, gauge))
}

pub fn parse_session_id(raw: &str) -> Result<SessionId, axum::response::Response> {
    raw.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid session id"))
}

pub fn parse_lot_id(raw: &str) -> Result<LotId, axum::response::Response> {
    raw.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid lot id"))
}

// -------------------------
// Response mapping
// -------------------------

pub fn pool_to_json(
    pair: &PairKey,
    state: PairState,
    lots: &[StockItem],
    drafts: Option<&AuditSession>,
) -> Value {
    let counted: Vec<Value> = drafts
        .map(|a| {
            a.drafts()
                .map(|d| {
                    json!({
                        "lot_id": d.lot_id,
                        "physical_weight": d.physical_weight,
                        "system_weight": d.system_weight,
                        "observation": d.observation,
                        "quick_add": d.temp_lot.is_some(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    let recent: Vec<Value> = drafts
        .map(|a| a.recent().map(|f| json!(f)).collect())
        .unwrap_or_default();

    json!({
        "pair": pair,
        "state": state,
        "lots": lots,
        "counted": counted,
        "recent": recent,
    })
}

pub fn session_summary_json(session: &InventorySession) -> Value {
    json!({
        "id": session.id,
        "material_type": session.material_type,
        "gauge": session.gauge,
        "status": session.status,
        "operator": session.operator,
        "start_date": session.start_date,
        "end_date": session.end_date,
        "items_count": session.items_count,
        "checked_count": session.checked_count,
        "applied_to_stock": session.applied_to_stock,
        "divergent": session_is_divergent(session),
    })
}

pub fn session_detail_json(session: &InventorySession) -> Value {
    json!({
        "session": session,
        "report": session_report(session),
    })
}

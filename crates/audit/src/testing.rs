//! Shared fixtures for the workflow tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;

use rodstock_core::{Kg, LotId};
use rodstock_infra::{InMemoryLedger, InMemorySessionStore, LedgerStore, StoreError};
use rodstock_inventory::{Gauge, LotPatch, LotStatus, PairKey, StockItem};

use crate::engine::AuditEngine;

pub type TestEngine = AuditEngine<Arc<InMemoryLedger>, Arc<InMemorySessionStore>>;

pub fn kg(n: i64) -> Kg {
    Decimal::from(n)
}

pub fn ca60() -> PairKey {
    PairKey::new("CA-60", Gauge::from_hundredths(500))
}

/// Available CA-60 5.00 lot with the given code and ledger weight.
pub fn lot(code: &str, weight: i64) -> StockItem {
    StockItem {
        id: LotId::new(),
        material_type: "CA-60".to_string(),
        gauge: Gauge::from_hundredths(500),
        internal_lot: code.to_string(),
        supplier: Some("Gerdau".to_string()),
        supplier_lot: None,
        invoice_number: None,
        initial_quantity: kg(weight),
        label_weight: None,
        remaining_quantity: kg(weight),
        location: None,
        status: LotStatus::Available,
        entry_date: Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap(),
        last_audit_date: None,
        audit_observation: None,
        history: Vec::new(),
    }
}

pub fn engine_with(
    lots: Vec<StockItem>,
) -> (TestEngine, Arc<InMemoryLedger>, Arc<InMemorySessionStore>) {
    let ledger = Arc::new(InMemoryLedger::with_lots(lots));
    let sessions = Arc::new(InMemorySessionStore::new());
    (
        AuditEngine::new(ledger.clone(), sessions.clone()),
        ledger,
        sessions,
    )
}

/// One ledger write as seen by [`FlakyLedger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteAttempt {
    pub internal_lot: String,
    pub ok: bool,
}

impl WriteAttempt {
    pub fn ok(internal_lot: &str) -> Self {
        Self {
            internal_lot: internal_lot.to_string(),
            ok: true,
        }
    }

    pub fn refused(internal_lot: &str) -> Self {
        Self {
            internal_lot: internal_lot.to_string(),
            ok: false,
        }
    }
}

/// Ledger double that records every write attempt and fails writes for chosen lots.
#[derive(Debug, Default)]
pub struct FlakyLedger {
    inner: InMemoryLedger,
    failing: Mutex<HashSet<String>>,
    attempts: Mutex<Vec<WriteAttempt>>,
}

impl FlakyLedger {
    pub fn with_lots(lots: Vec<StockItem>) -> Self {
        Self {
            inner: InMemoryLedger::with_lots(lots),
            ..Self::default()
        }
    }

    /// Fail every write touching this internal lot code.
    pub fn fail_on(&self, internal_lot: &str) {
        self.failing.lock().unwrap().insert(internal_lot.to_string());
    }

    pub fn heal(&self) {
        self.failing.lock().unwrap().clear();
    }

    /// Every write attempt, failed ones included, in call order.
    pub fn attempts(&self) -> Vec<WriteAttempt> {
        self.attempts.lock().unwrap().clone()
    }

    /// Internal lot codes of successful writes, in call order.
    pub fn writes(&self) -> Vec<String> {
        self.attempts()
            .into_iter()
            .filter(|a| a.ok)
            .map(|a| a.internal_lot)
            .collect()
    }

    fn guard(&self, internal_lot: &str) -> Result<(), StoreError> {
        if self.failing.lock().unwrap().contains(internal_lot) {
            return Err(StoreError::Backend(format!("write to {internal_lot} refused")));
        }
        Ok(())
    }

    fn record(&self, internal_lot: String, result: &Result<(), StoreError>) {
        self.attempts.lock().unwrap().push(WriteAttempt {
            internal_lot,
            ok: result.is_ok(),
        });
    }
}

#[async_trait]
impl LedgerStore for FlakyLedger {
    async fn list_lots(&self) -> Result<Vec<StockItem>, StoreError> {
        self.inner.list_lots().await
    }

    async fn get_lot(&self, id: LotId) -> Result<Option<StockItem>, StoreError> {
        self.inner.get_lot(id).await
    }

    async fn create_lot(&self, item: StockItem) -> Result<(), StoreError> {
        let code = item.internal_lot.clone();
        let result = match self.guard(&code) {
            Ok(()) => self.inner.create_lot(item).await,
            Err(err) => Err(err),
        };
        self.record(code, &result);
        result
    }

    async fn update_lot(&self, id: LotId, patch: LotPatch) -> Result<(), StoreError> {
        let code = self
            .inner
            .get_lot(id)
            .await?
            .map(|l| l.internal_lot)
            .unwrap_or_default();
        let result = match self.guard(&code) {
            Ok(()) => self.inner.update_lot(id, patch).await,
            Err(err) => Err(err),
        };
        self.record(code, &result);
        result
    }
}

//! Approval gate: applies a finished audit to the stock ledger.
//!
//! The replay is a saga: one ledger write per snapshot entry, in snapshot order,
//! with no rollback. Every entry is attempted even after a failure, and the
//! session is only marked `applied_to_stock` when every step succeeded. A retry
//! skips the steps whose history entry is already on the ledger with the same
//! weight and observation; a lot recounted after a reopen is written again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rodstock_auth::{ApprovalSecret, Permission, Principal, authorize};
use rodstock_core::{LotId, SessionId};
use rodstock_events::{SagaOutcome, SagaReport, StepStatus};
use rodstock_infra::{LedgerStore, SessionStore, StoreError};
use rodstock_inventory::{
    AuditedLotEntry, HistoryEntry, HistoryKind, InventorySession, LotPatch, SessionPatch,
    SessionStatus, StockItem,
};

use crate::error::{AuditError, AuditResult};
use crate::prompt::OperatorPrompt;

/// Identifies one replay step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayKey {
    /// Snapshot lot id (the draft id for quick-add lots).
    pub lot_id: LotId,
    pub internal_lot: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalReport {
    pub session_id: SessionId,
    pub applied_to_stock: bool,
    pub outcome: SagaOutcome,
    pub steps: SagaReport<ReplayKey>,
}

impl ApprovalReport {
    pub fn is_success(&self) -> bool {
        self.outcome == SagaOutcome::Success
    }
}

pub struct ApprovalGate<L, S> {
    ledger: L,
    sessions: S,
    secret: ApprovalSecret,
}

impl<L, S> ApprovalGate<L, S>
where
    L: LedgerStore,
    S: SessionStore,
{
    pub fn new(ledger: L, sessions: S, secret: ApprovalSecret) -> Self {
        Self {
            ledger,
            sessions,
            secret,
        }
    }

    /// Replay a completed session onto the ledger.
    ///
    /// Every precondition failure returns before the first write. Step failures
    /// do not abort the run; they show up in the returned report.
    pub async fn approve(
        &self,
        principal: &Principal,
        session_id: SessionId,
        prompt: &dyn OperatorPrompt,
    ) -> AuditResult<ApprovalReport> {
        authorize(principal, &Permission::AUDIT_APPROVE)?;

        let session = self
            .sessions
            .get_session(session_id)
            .await?
            .ok_or_else(|| AuditError::not_found(format!("session {session_id}")))?;

        if session.status != SessionStatus::Completed {
            return Err(AuditError::validation(format!(
                "session {session_id} is not completed ({:?})",
                session.status
            )));
        }
        if session.applied_to_stock {
            return Err(AuditError::AlreadyApplied(session_id));
        }

        let question = format!(
            "Apply the audit of {} ({} lots) to stock? Enter the approval passphrase.",
            session.pair(),
            session.audited_lots.len()
        );
        match prompt.request_secret(&question) {
            Some(candidate) if self.secret.verify(&candidate) => {}
            Some(_) => {
                tracing::warn!(
                    session_id = %session_id,
                    principal = %principal.principal_id,
                    "approval passphrase mismatch"
                );
                return Err(AuditError::Authorization(
                    "approval passphrase does not match".to_string(),
                ));
            }
            None => return Err(AuditError::Cancelled),
        }

        let now = Utc::now();
        let lots = self.ledger.list_lots().await?;
        let mut steps = SagaReport::new();

        for entry in &session.audited_lots {
            let status = match self
                .replay_entry(&session, entry, &lots, &principal.name, now)
                .await
            {
                Ok(status) => status,
                Err(err) => {
                    tracing::warn!(
                        session_id = %session_id,
                        lot = %entry.internal_lot,
                        error = %err,
                        "replay step failed"
                    );
                    StepStatus::Failed {
                        reason: err.to_string(),
                    }
                }
            };
            steps.record(
                ReplayKey {
                    lot_id: entry.lot_id,
                    internal_lot: entry.internal_lot.clone(),
                },
                status,
            );
        }

        let outcome = steps.outcome();
        let applied_to_stock = steps.is_success();
        if applied_to_stock {
            self.sessions
                .update_session(
                    session_id,
                    SessionPatch {
                        applied_to_stock: Some(true),
                        applied_at: Some(now),
                        applied_by: Some(principal.name.clone()),
                        ..SessionPatch::default()
                    },
                )
                .await?;
            tracing::info!(
                session_id = %session_id,
                pair = %session.pair(),
                approver = %principal.name,
                steps = steps.steps().len(),
                "audit applied to stock"
            );
        } else {
            tracing::warn!(
                session_id = %session_id,
                outcome = ?outcome,
                "audit partially applied; session left pending for retry"
            );
        }

        Ok(ApprovalReport {
            session_id,
            applied_to_stock,
            outcome,
            steps,
        })
    }

    async fn replay_entry(
        &self,
        session: &InventorySession,
        entry: &AuditedLotEntry,
        lots: &[StockItem],
        approver: &str,
        now: DateTime<Utc>,
    ) -> Result<StepStatus, StoreError> {
        match &entry.temp_lot {
            Some(temp) => {
                let done = lots.iter().any(|l| {
                    l.history.iter().any(|h| {
                        matches!(
                            &h.kind,
                            HistoryKind::InventoryEntryApproved { session_id, draft_id, .. }
                                if *session_id == session.id && *draft_id == entry.lot_id
                        )
                    })
                });
                if done {
                    return Ok(StepStatus::AlreadyApplied);
                }

                let mut item = temp.clone();
                item.id = LotId::new();
                item.remaining_quantity = entry.physical_weight;
                item.initial_quantity = entry.physical_weight;
                item.label_weight = Some(entry.physical_weight);
                item.last_audit_date = Some(now);
                item.history.push(HistoryEntry::new(
                    now,
                    HistoryKind::InventoryEntryApproved {
                        session_id: session.id,
                        draft_id: entry.lot_id,
                        weight: entry.physical_weight,
                        approved_by: approver.to_string(),
                    },
                ));
                self.ledger.create_lot(item).await?;
            }
            None => {
                let current = lots
                    .iter()
                    .find(|l| l.id == entry.lot_id)
                    .ok_or_else(|| StoreError::NotFound(format!("lot {}", entry.lot_id)))?;
                if let Some(previous) = current.last_approval_from(session.id) {
                    if previous
                        .kind
                        .approved_as(entry.physical_weight, entry.observation.as_deref())
                    {
                        return Ok(StepStatus::AlreadyApplied);
                    }
                    // Snapshot was recounted after an earlier partial approval.
                    tracing::info!(
                        session_id = %session.id,
                        lot = %entry.internal_lot,
                        previous_at = %previous.at,
                        new_weight = %entry.physical_weight,
                        "re-applying recounted lot"
                    );
                }

                let patch = LotPatch {
                    remaining_quantity: Some(entry.physical_weight),
                    last_audit_date: Some(now),
                    audit_observation: Some(entry.observation.clone()),
                    append_history: vec![HistoryEntry::new(
                        now,
                        HistoryKind::InventoryApproved {
                            session_id: session.id,
                            previous_weight: entry.system_weight,
                            new_weight: entry.physical_weight,
                            diff: entry.diff(),
                            approved_by: approver.to_string(),
                            observation: entry.observation.clone(),
                        },
                    )],
                };
                self.ledger.update_lot(entry.lot_id, patch).await?;
            }
        }
        Ok(StepStatus::Applied)
    }
}

//! Admin-mediated conversion between external money and coins

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    Error,
    domain::{DepositRequestId, Money, UserId},
    error::conflicting_state,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DepositKind {
    Deposit,
    Withdrawal,
}

closed_enum!(DepositKind, "deposit kind", {
    Deposit => "DEPOSIT",
    Withdrawal => "WITHDRAWAL",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DepositStatus {
    Pending,
    Approved,
    Rejected,
}

closed_enum!(DepositStatus, "deposit status", {
    Pending => "PENDING",
    Approved => "APPROVED",
    Rejected => "REJECTED",
});

/// The admin's verdict on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DepositDecision {
    Approved,
    Rejected,
}

closed_enum!(DepositDecision, "decision", {
    Approved => "APPROVED",
    Rejected => "REJECTED",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepositRequest {
    id: DepositRequestId,
    user: UserId,
    amount: Money,
    kind: DepositKind,
    status: DepositStatus,
    /// UPI id for withdrawals, external transaction id for deposits
    external_reference: String,
    admin_message: Option<String>,
    created_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
}

impl DepositRequest {
    pub(crate) fn new(
        id: DepositRequestId,
        user: UserId,
        amount: Money,
        kind: DepositKind,
        external_reference: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user,
            amount,
            kind,
            status: DepositStatus::Pending,
            external_reference,
            admin_message: None,
            created_at,
            resolved_at: None,
        }
    }

    pub fn id(&self) -> DepositRequestId {
        self.id
    }

    pub fn user(&self) -> UserId {
        self.user
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn kind(&self) -> DepositKind {
        self.kind
    }

    pub fn status(&self) -> DepositStatus {
        self.status
    }

    pub fn external_reference(&self) -> &str {
        &self.external_reference
    }

    pub fn admin_message(&self) -> Option<&str> {
        self.admin_message.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.resolved_at
    }

    pub(crate) fn ensure_pending(&self) -> Result<(), Error> {
        if self.status == DepositStatus::Pending {
            Ok(())
        } else {
            Err(conflicting_state(
                "deposit request",
                self.id,
                self.status,
                "already resolved",
            ))
        }
    }

    pub(crate) fn resolve(
        &mut self,
        decision: DepositDecision,
        admin_message: Option<String>,
        resolved_at: DateTime<Utc>,
    ) -> Result<(), Error> {
        self.ensure_pending()?;
        self.status = match decision {
            DepositDecision::Approved => DepositStatus::Approved,
            DepositDecision::Rejected => DepositStatus::Rejected,
        };
        self.admin_message = admin_message;
        self.resolved_at = Some(resolved_at);
        Ok(())
    }
}

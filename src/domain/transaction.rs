//! Module defining the ledger entries: one immutable row per balance change

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{BookingId, ComplaintId, DepositRequestId, ItemId, Money, TransactionId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    RentPayment,
    Purchase,
    Refund,
    Fine,
    Deposit,
    Withdrawal,
}

closed_enum!(TransactionKind, "transaction kind", {
    RentPayment => "RENT_PAYMENT",
    Purchase => "PURCHASE",
    Refund => "REFUND",
    Fine => "FINE",
    Deposit => "DEPOSIT",
    Withdrawal => "WITHDRAWAL",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Completed,
}

closed_enum!(TransactionStatus, "transaction status", {
    Completed => "COMPLETED",
});

/// What caused a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Reference {
    /// Balance seeded at registration
    Opening,
    Booking(BookingId),
    Complaint(ComplaintId),
    DepositRequest(DepositRequestId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub(crate) id: TransactionId,
    /// The user whose balance this entry documents
    pub(crate) account: UserId,
    pub(crate) amount: Money,
    pub(crate) kind: TransactionKind,
    /// `None` is the system
    pub(crate) source: Option<UserId>,
    /// `None` is the system
    pub(crate) destination: Option<UserId>,
    pub(crate) item: Option<ItemId>,
    pub(crate) reference: Reference,
    pub(crate) fee: Money,
    pub(crate) balance_after: Money,
    pub(crate) status: TransactionStatus,
    pub(crate) created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn account(&self) -> UserId {
        self.account
    }

    /// Signed: negative for debits.
    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn source(&self) -> Option<UserId> {
        self.source
    }

    pub fn destination(&self) -> Option<UserId> {
        self.destination
    }

    pub fn item(&self) -> Option<ItemId> {
        self.item
    }

    pub fn reference(&self) -> Reference {
        self.reference
    }

    /// Platform spread withheld from the seller. Metadata only, never transferred.
    pub fn fee(&self) -> Money {
        self.fee
    }

    pub fn balance_after(&self) -> Money {
        self.balance_after
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_debit(&self) -> bool {
        self.amount < Decimal::ZERO
    }
}

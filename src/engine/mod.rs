//! Module for the core logic of the engine: every money-moving operation and the booking
//! lifecycle, each executed as one unit of work against the [`Store`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    Error,
    domain::{
        Booking, BookingId, Complaint, ComplaintId, DepositRequest, DepositRequestId, Item, ItemId,
        Money, Transaction, User, UserId,
    },
    error::forbidden,
    sinks::{AuditLog, Notifier, Outbox, TracingAuditLog, TracingNotifier},
    store::{MemoryStore, Store, Tables},
};

mod admin;
mod booking;
mod dispute;
mod ledger;
mod purchase;
mod reconciliation;
mod sweep;


pub use sweep::SweepReport;

/// Balance a renter must still hold on top of the rent when a rental is accepted.
pub const RENT_RESERVE: Money = Decimal::from_parts(500, 0, 0, false, 0);

/// Outcome of an admin rollback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollbackSummary {
    pub booking: BookingId,
    /// Credited back to the borrower
    pub coins_refunded: Money,
    /// Recovered from the owner, bounded by what the owner still holds
    pub owner_debited: Money,
    pub complaints_resolved: Vec<ComplaintId>,
}

/// Outcome of an admin fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FineSummary {
    pub complaint: ComplaintId,
    pub offender: UserId,
    pub beneficiary: UserId,
    /// Actually moved from the offender to the beneficiary
    pub actual_deduction: Money,
    /// The part of this fine the offender could not cover
    pub shortfall: Money,
    /// The offender's total outstanding fine after this one
    pub pending_fine: Money,
}

/// The marketplace core. Opened once per process and shared by reference between request
/// handlers; all serialization between concurrent requests comes from the store.
pub struct Marketplace<S: Store = MemoryStore> {
    store: S,
    notifier: Arc<dyn Notifier>,
    audit_log: Arc<dyn AuditLog>,
}

impl Default for Marketplace<MemoryStore> {
    fn default() -> Self {
        Self::new(MemoryStore::default())
    }
}

impl<S: Store> Marketplace<S> {
    /// Creates a marketplace over `store` whose notifications and admin actions go to the log.
    pub fn new(store: S) -> Self {
        Self {
            store,
            notifier: Arc::new(TracingNotifier),
            audit_log: Arc::new(TracingAuditLog),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_audit_log(mut self, audit_log: Arc<dyn AuditLog>) -> Self {
        self.audit_log = audit_log;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs `work` as one unit of work and delivers the collected side effects once it has
    /// committed. Nothing is delivered for a unit that failed.
    fn execute<T>(
        &self,
        work: impl FnOnce(&mut Tables, &mut Outbox, DateTime<Utc>) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let now = Utc::now();
        let mut outbox = Outbox::default();
        let value = self
            .store
            .transact(|tables| work(tables, &mut outbox, now))?;
        outbox.deliver(self.notifier.as_ref(), self.audit_log.as_ref());
        Ok(value)
    }

    pub fn wallet(&self, user: UserId) -> Result<User, Error> {
        self.store.read(|tables| tables.user(user).cloned())?
    }

    pub fn item(&self, item: ItemId) -> Result<Item, Error> {
        self.store.read(|tables| tables.item(item).cloned())?
    }

    pub fn booking(&self, booking: BookingId) -> Result<Booking, Error> {
        self.store.read(|tables| tables.booking(booking).cloned())?
    }

    pub fn complaint(&self, complaint: ComplaintId) -> Result<Complaint, Error> {
        self.store
            .read(|tables| tables.complaint(complaint).cloned())?
    }

    pub fn deposit_request(&self, request: DepositRequestId) -> Result<DepositRequest, Error> {
        self.store
            .read(|tables| tables.deposit_request(request).cloned())?
    }

    /// All wallets, ordered by user id.
    pub fn wallets(&self) -> Result<Vec<User>, Error> {
        self.store.read(|tables| {
            let mut users: Vec<User> = tables.users().cloned().collect();
            users.sort_by_key(User::id);
            users
        })
    }

    /// Ledger entries documenting the user's balance, oldest first.
    pub fn transactions_for(&self, user: UserId) -> Result<Vec<Transaction>, Error> {
        self.store.read(|tables| {
            tables.user(user)?;
            Ok(tables.transactions_for(user).cloned().collect())
        })?
    }

    /// Checks that the user's ledger entries add up to their balance and returns the balance.
    pub fn reconcile(&self, user: UserId) -> Result<Money, Error> {
        self.store.read(|tables| ledger::reconcile(tables, user))?
    }
}

/// Resolves the caller of an operation. An unknown caller has no valid session.
fn authenticate(tables: &Tables, caller: UserId) -> Result<&User, Error> {
    tables
        .user(caller)
        .map_err(|_| Error::Unauthorized(format!("unknown caller {caller}")))
}

/// Resolves a caller who is about to move money; blocked users may not.
fn authenticate_active(tables: &Tables, caller: UserId) -> Result<&User, Error> {
    let user = authenticate(tables, caller)?;
    if user.is_blocked() {
        return Err(forbidden(caller, "blocked users cannot move money"));
    }
    Ok(user)
}

fn authenticate_admin(tables: &Tables, caller: UserId) -> Result<&User, Error> {
    let user = authenticate(tables, caller)?;
    if !user.is_admin() {
        return Err(forbidden(caller, "admin role required"));
    }
    Ok(user)
}

//! The ledger primitive and the balance guard. Every balance change in the crate goes through
//! [`post`], which appends exactly one ledger entry recording the balance it produced.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use crate::{
    Error,
    domain::{ItemId, Money, Reference, Transaction, TransactionKind, TransactionStatus, UserId},
    error::{insufficient_funds, validation_error},
    store::Tables,
};

/// One signed balance change for one user.
#[derive(Debug, Clone, Copy)]
pub(super) struct Posting {
    pub(super) account: UserId,
    pub(super) amount: Money,
    pub(super) kind: TransactionKind,
    pub(super) source: Option<UserId>,
    pub(super) destination: Option<UserId>,
    pub(super) item: Option<ItemId>,
    pub(super) reference: Reference,
    pub(super) fee: Money,
}

impl Posting {
    /// Money entering the platform for `account`.
    pub(super) fn credit_from_system(
        account: UserId,
        amount: Money,
        kind: TransactionKind,
        reference: Reference,
    ) -> Self {
        Self {
            account,
            amount,
            kind,
            source: None,
            destination: Some(account),
            item: None,
            reference,
            fee: Decimal::ZERO,
        }
    }

    /// Money leaving the platform from `account`.
    pub(super) fn debit_to_system(
        account: UserId,
        amount: Money,
        kind: TransactionKind,
        reference: Reference,
    ) -> Self {
        Self {
            account,
            amount: -amount,
            kind,
            source: Some(account),
            destination: None,
            item: None,
            reference,
            fee: Decimal::ZERO,
        }
    }
}

/// A two-party movement. The debit and the credit may differ only by the recorded fee.
#[derive(Debug, Clone, Copy)]
pub(super) struct Transfer {
    pub(super) from: UserId,
    pub(super) to: UserId,
    pub(super) debit: Money,
    pub(super) fee: Money,
    pub(super) kind: TransactionKind,
    pub(super) item: Option<ItemId>,
    pub(super) reference: Reference,
}

impl Transfer {
    pub(super) fn credit(&self) -> Money {
        self.debit - self.fee
    }

    fn leg(&self, account: UserId, amount: Money) -> Posting {
        Posting {
            account,
            amount,
            kind: self.kind,
            source: Some(self.from),
            destination: Some(self.to),
            item: self.item,
            reference: self.reference,
            fee: self.fee,
        }
    }
}

/// Applies the posting to the user's balance and appends its ledger entry. Refuses any delta that
/// would drive the balance negative.
pub(super) fn post(
    tables: &mut Tables,
    posting: Posting,
    now: DateTime<Utc>,
) -> Result<Transaction, Error> {
    let user = tables.user_mut(posting.account)?;
    if user.balance().checked_add(posting.amount).is_none() {
        return Err(validation_error(format!(
            "posting {} to user {} is out of range",
            posting.amount, posting.account
        )));
    }
    let balance_after = user
        .apply_delta(posting.amount)
        .map_err(|available| insufficient_funds(posting.account, -posting.amount, available))?;

    let entry = tables.append_transaction(|id| Transaction {
        id,
        account: posting.account,
        amount: posting.amount,
        kind: posting.kind,
        source: posting.source,
        destination: posting.destination,
        item: posting.item,
        reference: posting.reference,
        fee: posting.fee,
        balance_after,
        status: TransactionStatus::Completed,
        created_at: now,
    });
    debug!(
        tx = %entry.id(),
        user = %posting.account,
        kind = %posting.kind,
        amount = %posting.amount,
        balance_after = %balance_after,
        "ledger posting"
    );
    Ok(entry.clone())
}

/// Debits `from` and credits `to`. Returns the debit entry and the credit entry.
pub(super) fn transfer(
    tables: &mut Tables,
    transfer: Transfer,
    now: DateTime<Utc>,
) -> Result<(Transaction, Transaction), Error> {
    if transfer.fee < Decimal::ZERO || transfer.fee > transfer.debit {
        return Err(validation_error(format!(
            "a fee of {} cannot be withheld from a transfer of {}",
            transfer.fee, transfer.debit
        )));
    }
    let debit = post(tables, transfer.leg(transfer.from, -transfer.debit), now)?;
    let credit = post(tables, transfer.leg(transfer.to, transfer.credit()), now)?;
    Ok((debit, credit))
}

/// Balance guard: fails with the shortfall unless `user` holds at least `required`.
pub(super) fn ensure_funds(tables: &Tables, user: UserId, required: Money) -> Result<(), Error> {
    let available = tables.user(user)?.balance();
    if available < required {
        return Err(insufficient_funds(user, required, available));
    }
    Ok(())
}

/// Sums the user's ledger entries and compares them with the balance. Every wallet starts at zero.
pub(super) fn reconcile(tables: &Tables, user: UserId) -> Result<Money, Error> {
    let balance = tables.user(user)?.balance();
    let total: Money = tables.transactions_for(user).map(Transaction::amount).sum();
    if total != balance {
        return Err(Error::Storage(format!(
            "ledger of user {user} sums to {total} but the balance is {balance}"
        )));
    }
    Ok(balance)
}

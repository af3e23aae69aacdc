//! Deposit and withdrawal requests, converted to and from coins by an admin.

use rust_decimal::Decimal;
use tracing::info;

use crate::{
    Error,
    domain::{
        DepositDecision, DepositKind, DepositRequest, DepositRequestId, Money, Reference,
        TransactionKind, UserId,
    },
    engine::{
        Marketplace, authenticate_active, authenticate_admin,
        ledger::{self, Posting},
    },
    error::validation_error,
    sinks::AdminActionKind,
    store::Store,
};

impl<S: Store> Marketplace<S> {
    /// Asks for `amount` coins against an external payment identified by `external_tx_id`.
    pub fn create_deposit_request(
        &self,
        user: UserId,
        amount: Money,
        external_tx_id: &str,
    ) -> Result<DepositRequest, Error> {
        self.create_request(user, amount, DepositKind::Deposit, external_tx_id)
    }

    /// Asks for `amount` coins to be paid out to `upi_id`. The balance is checked here as a
    /// courtesy; the binding check happens at approval.
    pub fn create_withdrawal_request(
        &self,
        user: UserId,
        amount: Money,
        upi_id: &str,
    ) -> Result<DepositRequest, Error> {
        self.create_request(user, amount, DepositKind::Withdrawal, upi_id)
    }

    fn create_request(
        &self,
        user: UserId,
        amount: Money,
        kind: DepositKind,
        external_reference: &str,
    ) -> Result<DepositRequest, Error> {
        self.execute(|tables, outbox, now| {
            authenticate_active(tables, user)?;
            if amount <= Decimal::ZERO {
                return Err(validation_error(format!(
                    "{} amount must be positive, got {amount}",
                    kind.as_str().to_lowercase()
                )));
            }
            let external_reference = external_reference.trim();
            if external_reference.is_empty() {
                return Err(validation_error(match kind {
                    DepositKind::Deposit => "a deposit needs the external transaction id",
                    DepositKind::Withdrawal => "a withdrawal needs the UPI id to pay out to",
                }));
            }
            if kind == DepositKind::Withdrawal {
                ledger::ensure_funds(tables, user, amount)?;
            }

            let id = tables.insert_deposit_request(|id| {
                DepositRequest::new(id, user, amount, kind, external_reference.to_string(), now)
            });
            outbox.notify(
                user,
                format!("Your {kind} request {id} for {amount} coins awaits admin approval"),
            );
            info!(request = %id, user = %user, kind = %kind, amount = %amount, "request created");
            Ok(tables.deposit_request(id)?.clone())
        })
    }

    /// Approves or rejects a PENDING request. Approving a withdrawal re-checks the balance as it
    /// is now and fails without any change if it no longer covers the amount.
    pub fn resolve_deposit_request(
        &self,
        request_id: DepositRequestId,
        decision: DepositDecision,
        admin_message: Option<&str>,
        admin: UserId,
    ) -> Result<DepositRequest, Error> {
        self.execute(|tables, outbox, now| {
            authenticate_admin(tables, admin)?;
            let request = tables.deposit_request(request_id)?.clone();
            request.ensure_pending()?;
            let (user, amount, kind) = (request.user(), request.amount(), request.kind());
            let reference = Reference::DepositRequest(request_id);

            if decision == DepositDecision::Approved {
                match kind {
                    DepositKind::Deposit => {
                        ledger::post(
                            tables,
                            Posting::credit_from_system(
                                user,
                                amount,
                                TransactionKind::Deposit,
                                reference,
                            ),
                            now,
                        )?;
                    }
                    DepositKind::Withdrawal => {
                        ledger::ensure_funds(tables, user, amount)?;
                        ledger::post(
                            tables,
                            Posting::debit_to_system(
                                user,
                                amount,
                                TransactionKind::Withdrawal,
                                reference,
                            ),
                            now,
                        )?;
                    }
                }
            }

            let resolved = tables.deposit_request_mut(request_id)?;
            resolved.resolve(decision, admin_message.map(str::to_string), now)?;
            let resolved = resolved.clone();

            let action = match (kind, decision) {
                (DepositKind::Deposit, DepositDecision::Approved) => {
                    AdminActionKind::ApproveDeposit
                }
                (DepositKind::Deposit, DepositDecision::Rejected) => AdminActionKind::RejectDeposit,
                (DepositKind::Withdrawal, DepositDecision::Approved) => {
                    AdminActionKind::ApproveWithdrawal
                }
                (DepositKind::Withdrawal, DepositDecision::Rejected) => {
                    AdminActionKind::RejectWithdrawal
                }
            };
            outbox.admin_action(
                admin,
                action,
                Some(user),
                format!(
                    "{kind} request {request_id} for {amount} coins {decision}: {}",
                    admin_message.unwrap_or("-")
                ),
            );
            let verdict = match decision {
                DepositDecision::Approved => "approved".to_string(),
                DepositDecision::Rejected => format!(
                    "rejected: {}",
                    admin_message.unwrap_or("no reason given")
                ),
            };
            outbox.notify(
                user,
                format!("Your {kind} request {request_id} for {amount} coins was {verdict}"),
            );
            info!(request = %request_id, kind = %kind, decision = %decision, "request resolved");
            Ok(resolved)
        })
    }
}

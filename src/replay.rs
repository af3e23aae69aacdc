//! Module mapping replayed commands onto engine operations

use crate::{
    Error, Marketplace, OutcomeRecord,
    domain::{Booking, Complaint, DepositRequest},
    input::Command,
    store::Store,
};

pub(crate) fn execute<S: Store>(
    market: &Marketplace<S>,
    command: Command,
) -> Result<OutcomeRecord, Error> {
    let outcome = match command {
        Command::Register {
            user,
            role,
            opening_balance,
        } => {
            let user = market.register_user(user, role, opening_balance)?;
            OutcomeRecord::Registered {
                user: user.id().into(),
                balance: user.balance(),
            }
        }
        Command::List {
            owner,
            item,
            price,
            listing,
        } => OutcomeRecord::Listed {
            item: market.list_item(item, owner, price, listing)?.id().into(),
        },
        Command::Request {
            borrower,
            item,
            start,
            end,
        } => booking(market.request_booking(item, borrower, start, end)?),
        Command::Accept { owner, booking: id } => booking(market.accept_booking(id, owner)?),
        Command::Reject { owner, booking: id } => booking(market.reject_booking(id, owner)?),
        Command::Pay { borrower, booking: id } => booking(market.pay_booking(id, borrower)?),
        Command::Buy { buyer, item } => {
            let tx = market.buy_item(item, buyer)?;
            OutcomeRecord::Purchased {
                item: item.into(),
                transaction: tx.id().into(),
                price: -tx.amount(),
                fee: tx.fee(),
            }
        }
        Command::Handover { borrower, booking: id } => {
            booking(market.confirm_handover(id, borrower)?)
        }
        Command::StartReturn { caller, booking: id } => booking(market.start_return(id, caller)?),
        Command::Return { borrower, booking: id } => booking(market.confirm_return(id, borrower)?),
        Command::Receipt { owner, booking: id } => booking(market.confirm_receipt(id, owner)?),
        Command::Complain {
            complainer,
            booking: id,
            description,
        } => complaint(market.create_complaint(id, complainer, &description)?),
        Command::Verify { admin, complaint: id } => complaint(market.verify_complaint(id, admin)?),
        Command::Dismiss {
            admin,
            complaint: id,
            notes,
        } => complaint(market.reject_complaint(id, notes.as_deref(), admin)?),
        Command::Fine {
            admin,
            complaint,
            amount,
        } => {
            let summary = market.fine_complaint(complaint, amount, admin)?;
            OutcomeRecord::Fined {
                complaint: summary.complaint.into(),
                actual_deduction: summary.actual_deduction,
                pending_fine: summary.pending_fine,
            }
        }
        Command::Rollback { admin, booking } => {
            let summary = market.rollback_booking(booking, admin)?;
            OutcomeRecord::RolledBack {
                booking: summary.booking.into(),
                coins_refunded: summary.coins_refunded,
            }
        }
        Command::Deposit {
            user,
            amount,
            external_tx_id,
        } => request(market.create_deposit_request(user, amount, &external_tx_id)?),
        Command::Withdraw {
            user,
            amount,
            upi_id,
        } => request(market.create_withdrawal_request(user, amount, &upi_id)?),
        Command::Resolve {
            admin,
            request: id,
            decision,
            message,
        } => request(market.resolve_deposit_request(id, decision, message.as_deref(), admin)?),
        Command::Block {
            admin,
            user,
            blocked,
        } => {
            let user = market.set_user_blocked(user, blocked, admin)?;
            OutcomeRecord::Moderated {
                user: user.id().into(),
                blocked: user.is_blocked(),
            }
        }
        Command::Sweep { today } => {
            let report = market.expire_overdue(today)?;
            OutcomeRecord::Swept {
                expired: report.expired.len(),
                completed: report.completed.len(),
            }
        }
    };
    Ok(outcome)
}

fn booking(booking: Booking) -> OutcomeRecord {
    OutcomeRecord::Booking {
        booking: booking.id().into(),
        status: booking.status(),
    }
}

fn complaint(complaint: Complaint) -> OutcomeRecord {
    OutcomeRecord::Complaint {
        complaint: complaint.id().into(),
        status: complaint.status(),
    }
}

fn request(request: DepositRequest) -> OutcomeRecord {
    OutcomeRecord::Request {
        request: request.id().into(),
        status: request.status(),
    }
}

//! Complaints, fines and rollbacks.

use rust_decimal::Decimal;
use tracing::info;

use crate::{
    Error,
    domain::{
        BookingId, BookingStatus, Complaint, ComplaintId, ItemStatus, Money, Reference,
        ResolutionAction, TransactionKind, UserId,
    },
    engine::{
        FineSummary, Marketplace, RollbackSummary, authenticate, authenticate_admin,
        ledger::{self, Posting, Transfer},
    },
    error::{conflicting_state, forbidden, validation_error},
    sinks::AdminActionKind,
    store::Store,
};

impl<S: Store> Marketplace<S> {
    /// A participant of an ACCEPTED or COMPLETED booking files a complaint. One per participant
    /// and booking.
    pub fn create_complaint(
        &self,
        booking_id: BookingId,
        complainer: UserId,
        description: &str,
    ) -> Result<Complaint, Error> {
        self.execute(|tables, outbox, now| {
            authenticate(tables, complainer)?;
            let description = description.trim();
            if description.is_empty() {
                return Err(validation_error("a complaint needs a description"));
            }
            let booking = tables.booking(booking_id)?.clone();
            if !booking.is_participant(complainer) {
                return Err(forbidden(
                    complainer,
                    format!("not a participant of booking {booking_id}"),
                ));
            }
            booking.ensure_status(
                &[BookingStatus::Accepted, BookingStatus::Completed],
                "file a complaint",
            )?;
            if let Some(existing) = tables
                .complaints()
                .find(|c| c.booking() == booking_id && c.complainer() == complainer)
            {
                return Err(conflicting_state(
                    "complaint",
                    existing.id(),
                    existing.status(),
                    format!("already filed by user {complainer} for booking {booking_id}"),
                ));
            }

            let id = tables.insert_complaint(|id| {
                Complaint::new(id, booking_id, complainer, description.to_string(), now)
            });
            outbox.notify(
                complainer,
                format!("Your complaint {id} about booking {booking_id} was received"),
            );
            info!(
                complaint = %id,
                booking = %booking_id,
                complainer = %complainer,
                "complaint filed"
            );
            Ok(tables.complaint(id)?.clone())
        })
    }

    /// Moves an OPEN complaint under review.
    pub fn verify_complaint(
        &self,
        complaint_id: ComplaintId,
        admin: UserId,
    ) -> Result<Complaint, Error> {
        self.execute(|tables, outbox, _| {
            authenticate_admin(tables, admin)?;
            let complaint = tables.complaint_mut(complaint_id)?;
            complaint.verify()?;
            let complaint = complaint.clone();

            outbox.admin_action(
                admin,
                AdminActionKind::VerifyComplaint,
                Some(complaint.complainer()),
                format!("complaint {complaint_id} under review"),
            );
            outbox.notify(
                complaint.complainer(),
                format!("Your complaint {complaint_id} is under review"),
            );
            Ok(complaint)
        })
    }

    /// Closes an open complaint without action.
    pub fn reject_complaint(
        &self,
        complaint_id: ComplaintId,
        notes: Option<&str>,
        admin: UserId,
    ) -> Result<Complaint, Error> {
        self.execute(|tables, outbox, _| {
            authenticate_admin(tables, admin)?;
            let complaint = tables.complaint_mut(complaint_id)?;
            complaint.reject(notes.map(str::to_string))?;
            let complaint = complaint.clone();

            outbox.admin_action(
                admin,
                AdminActionKind::RejectComplaint,
                Some(complaint.complainer()),
                format!(
                    "complaint {complaint_id} rejected: {}",
                    notes.unwrap_or("no notes")
                ),
            );
            outbox.notify(
                complaint.complainer(),
                format!(
                    "Your complaint {complaint_id} was rejected: {}",
                    notes.unwrap_or("no further details")
                ),
            );
            Ok(complaint)
        })
    }

    /// Fines the borrower of the complaint's booking in favour of the owner. Only what the
    /// borrower holds is moved; the rest is added to their pending fine.
    pub fn fine_complaint(
        &self,
        complaint_id: ComplaintId,
        fine_coins: Money,
        admin: UserId,
    ) -> Result<FineSummary, Error> {
        self.execute(|tables, outbox, now| {
            authenticate_admin(tables, admin)?;
            if fine_coins <= Decimal::ZERO {
                return Err(validation_error(format!(
                    "a fine must be positive, got {fine_coins}"
                )));
            }
            let booking_id = {
                let complaint = tables.complaint_mut(complaint_id)?;
                complaint.resolve_with(ResolutionAction::Fine)?;
                complaint.booking()
            };
            let booking = tables.booking(booking_id)?.clone();
            let offender = booking.borrower();
            let beneficiary = booking.owner();

            let actual_deduction = tables.user(offender)?.balance().min(fine_coins);
            let shortfall = fine_coins - actual_deduction;
            if actual_deduction > Decimal::ZERO {
                ledger::transfer(
                    tables,
                    Transfer {
                        from: offender,
                        to: beneficiary,
                        debit: actual_deduction,
                        fee: Decimal::ZERO,
                        kind: TransactionKind::Fine,
                        item: Some(booking.item()),
                        reference: Reference::Complaint(complaint_id),
                    },
                    now,
                )?;
            }
            let offender_wallet = tables.user_mut(offender)?;
            if shortfall > Decimal::ZERO {
                offender_wallet.add_pending_fine(shortfall);
            }
            let pending_fine = offender_wallet.pending_fine();

            outbox.admin_action(
                admin,
                AdminActionKind::Fine,
                Some(offender),
                format!(
                    "complaint {complaint_id}: fined {fine_coins}, deducted {actual_deduction}, pending {shortfall}"
                ),
            );
            outbox.notify(
                offender,
                format!(
                    "You were fined {fine_coins} coins over booking {}: {actual_deduction} deducted, {shortfall} added to your pending fine",
                    booking.id()
                ),
            );
            outbox.notify(
                beneficiary,
                format!(
                    "You received {actual_deduction} coins from a fine over booking {}",
                    booking.id()
                ),
            );
            info!(
                complaint = %complaint_id,
                offender = %offender,
                fine = %fine_coins,
                deducted = %actual_deduction,
                pending = %pending_fine,
                "complaint fined"
            );
            Ok(FineSummary {
                complaint: complaint_id,
                offender,
                beneficiary,
                actual_deduction,
                shortfall,
                pending_fine,
            })
        })
    }

    /// Reverses the payment of an ACCEPTED or COMPLETED booking, cancels it and puts the item back
    /// on the market. The borrower gets back everything they paid; the owner gives back what they
    /// were credited, but never more than they still hold.
    pub fn rollback_booking(
        &self,
        booking_id: BookingId,
        admin: UserId,
    ) -> Result<RollbackSummary, Error> {
        self.execute(|tables, outbox, now| {
            authenticate_admin(tables, admin)?;
            let booking = tables.booking_mut(booking_id)?;
            booking.cancel()?;
            let booking = booking.clone();
            let (owner, borrower) = (booking.owner(), booking.borrower());

            let coins_refunded = booking.amount_paid();
            let owner_debited = tables.user(owner)?.balance().min(booking.owner_payout());
            let refund_leg = |account: UserId, amount: Money| Posting {
                account,
                amount,
                kind: TransactionKind::Refund,
                source: Some(owner),
                destination: Some(borrower),
                item: Some(booking.item()),
                reference: Reference::Booking(booking_id),
                fee: Decimal::ZERO,
            };
            if owner_debited > Decimal::ZERO {
                ledger::post(tables, refund_leg(owner, -owner_debited), now)?;
            }
            if coins_refunded > Decimal::ZERO {
                ledger::post(tables, refund_leg(borrower, coins_refunded), now)?;
            }
            tables
                .item_mut(booking.item())?
                .set_status(ItemStatus::Available);

            let mut complaints_resolved = Vec::new();
            for complaint in tables
                .complaints_mut()
                .filter(|c| c.booking() == booking_id && c.is_open())
            {
                complaint.resolve_with(ResolutionAction::Rollback)?;
                complaints_resolved.push(complaint.id());
            }

            outbox.admin_action(
                admin,
                AdminActionKind::Rollback,
                Some(borrower),
                format!(
                    "booking {booking_id} rolled back: refunded {coins_refunded}, recovered {owner_debited} from user {owner}"
                ),
            );
            outbox.notify(
                borrower,
                format!("Booking {booking_id} was cancelled and {coins_refunded} coins refunded"),
            );
            outbox.notify(
                owner,
                format!(
                    "Booking {booking_id} was cancelled by an admin and {owner_debited} coins reversed"
                ),
            );
            info!(
                booking = %booking_id,
                refunded = %coins_refunded,
                owner_debited = %owner_debited,
                "booking rolled back"
            );
            Ok(RollbackSummary {
                booking: booking_id,
                coins_refunded,
                owner_debited,
                complaints_resolved,
            })
        })
    }
}

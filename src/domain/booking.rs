//! The booking lifecycle.
//!
//! ```text
//! PENDING ──accept──> ACCEPTED ──pay / sweep──> COMPLETED ──handover──> RECEIVED ──> return flow
//!    │                   │                          │
//!    ├─reject─> REJECTED ├─rollback─> CANCELLED <───┘
//!    └─sweep──> EXPIRED  └─sweep (unpaid)─> EXPIRED
//! ```
//!
//! Inside the return flow the status is always derived from the two confirmation flags, see
//! [`derive_return_status`].

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    Error,
    domain::{BookingId, Item, ItemId, ListingType, Money, UserId},
    error::conflicting_state,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
    Received,
    ReturnFlow,
    PendingOwnerConfirmation,
    PendingBorrowerConfirmation,
    Successful,
    Cancelled,
    Expired,
}

closed_enum!(BookingStatus, "booking status", {
    Pending => "PENDING",
    Accepted => "ACCEPTED",
    Rejected => "REJECTED",
    Completed => "COMPLETED",
    Received => "RECEIVED",
    ReturnFlow => "RETURN_FLOW",
    PendingOwnerConfirmation => "PENDING_OWNER_CONFIRMATION",
    PendingBorrowerConfirmation => "PENDING_BORROWER_CONFIRMATION",
    Successful => "SUCCESSFUL",
    Cancelled => "CANCELLED",
    Expired => "EXPIRED",
});

const RETURN_PHASE: &[BookingStatus] = &[
    BookingStatus::Received,
    BookingStatus::ReturnFlow,
    BookingStatus::PendingOwnerConfirmation,
    BookingStatus::PendingBorrowerConfirmation,
];

impl BookingStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Rejected
                | BookingStatus::Cancelled
                | BookingStatus::Expired
                | BookingStatus::Successful
        )
    }

    /// Whether a booking in this status governs its item (keeps it BOOKED or SOLD).
    pub fn holds_item(&self) -> bool {
        matches!(self, BookingStatus::Accepted | BookingStatus::Completed)
            || RETURN_PHASE.contains(self)
    }
}

/// Derives the return-flow status from the borrower's `returned` and the owner's `received` flag.
pub fn derive_return_status(returned: bool, received: bool) -> BookingStatus {
    match (returned, received) {
        (true, true) => BookingStatus::Successful,
        (true, false) => BookingStatus::PendingOwnerConfirmation,
        (false, true) => BookingStatus::PendingBorrowerConfirmation,
        (false, false) => BookingStatus::ReturnFlow,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Booking {
    id: BookingId,
    item: ItemId,
    owner: UserId,
    borrower: UserId,
    listing: ListingType,
    status: BookingStatus,
    returned: bool,
    received: bool,
    start_date: NaiveDate,
    end_date: NaiveDate,
    amount_paid: Money,
    owner_payout: Money,
    service_charge: Money,
    created_at: DateTime<Utc>,
}

impl Booking {
    pub(crate) fn request(
        id: BookingId,
        item: &Item,
        borrower: UserId,
        start_date: NaiveDate,
        end_date: NaiveDate,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            item: item.id(),
            owner: item.owner(),
            borrower,
            listing: item.listing(),
            status: BookingStatus::Pending,
            returned: false,
            received: false,
            start_date,
            end_date,
            amount_paid: Decimal::ZERO,
            owner_payout: Decimal::ZERO,
            service_charge: Decimal::ZERO,
            created_at,
        }
    }

    /// A booking recording an immediate purchase, created already paid.
    pub(crate) fn purchase(
        id: BookingId,
        item: &Item,
        buyer: UserId,
        owner_payout: Money,
        created_at: DateTime<Utc>,
    ) -> Self {
        let today = created_at.date_naive();
        let mut booking = Self::request(id, item, buyer, today, today, created_at);
        booking.record_payment(item.price(), owner_payout);
        booking.service_charge = item.price() - owner_payout;
        booking.status = BookingStatus::Completed;
        booking
    }

    pub fn id(&self) -> BookingId {
        self.id
    }

    pub fn item(&self) -> ItemId {
        self.item
    }

    pub fn owner(&self) -> UserId {
        self.owner
    }

    pub fn borrower(&self) -> UserId {
        self.borrower
    }

    pub fn listing(&self) -> ListingType {
        self.listing
    }

    pub fn status(&self) -> BookingStatus {
        self.status
    }

    pub fn is_returned(&self) -> bool {
        self.returned
    }

    pub fn is_received(&self) -> bool {
        self.received
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    /// Coins debited from the borrower for this booking.
    pub fn amount_paid(&self) -> Money {
        self.amount_paid
    }

    /// Coins credited to the owner for this booking (the amount paid minus any withheld fee).
    pub fn owner_payout(&self) -> Money {
        self.owner_payout
    }

    /// Platform service charge on this booking. Withheld from the payout on a purchase, only
    /// reported on a rental.
    pub fn service_charge(&self) -> Money {
        self.service_charge
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Number of rented days, both ends inclusive.
    pub fn rental_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    pub fn is_paid(&self) -> bool {
        self.amount_paid > Decimal::ZERO
    }

    /// A booking is overdue once its start date lies strictly before `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.start_date < today
    }

    pub fn is_participant(&self, user: UserId) -> bool {
        self.owner == user || self.borrower == user
    }

    pub(crate) fn record_payment(&mut self, amount_paid: Money, owner_payout: Money) {
        self.amount_paid = amount_paid;
        self.owner_payout = owner_payout;
    }

    pub(crate) fn report_service_charge(&mut self, charge: Money) {
        self.service_charge = charge;
    }

    pub(crate) fn ensure_status(
        &self,
        allowed: &[BookingStatus],
        operation: &str,
    ) -> Result<(), Error> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(conflicting_state(
                "booking",
                self.id,
                self.status,
                format!("cannot {operation}"),
            ))
        }
    }

    fn transition(
        &mut self,
        allowed: &[BookingStatus],
        next: BookingStatus,
        operation: &str,
    ) -> Result<(), Error> {
        self.ensure_status(allowed, operation)?;
        self.status = next;
        Ok(())
    }

    pub(crate) fn accept(&mut self) -> Result<(), Error> {
        self.transition(&[BookingStatus::Pending], BookingStatus::Accepted, "accept")
    }

    pub(crate) fn reject(&mut self) -> Result<(), Error> {
        self.transition(&[BookingStatus::Pending], BookingStatus::Rejected, "reject")
    }

    pub(crate) fn complete(&mut self) -> Result<(), Error> {
        self.transition(&[BookingStatus::Accepted], BookingStatus::Completed, "complete")
    }

    pub(crate) fn confirm_handover(&mut self) -> Result<(), Error> {
        self.transition(
            &[BookingStatus::Completed],
            BookingStatus::Received,
            "confirm handover",
        )
    }

    pub(crate) fn start_return(&mut self) -> Result<(), Error> {
        self.ensure_rental("start the return")?;
        self.transition(
            &[BookingStatus::Received],
            BookingStatus::ReturnFlow,
            "start the return",
        )
    }

    /// Borrower's half of the return. Returns the derived status.
    pub(crate) fn confirm_return(&mut self) -> Result<BookingStatus, Error> {
        self.ensure_rental("confirm the return")?;
        self.ensure_status(RETURN_PHASE, "confirm the return")?;
        if self.returned {
            return Err(conflicting_state(
                "booking",
                self.id,
                self.status,
                "return already confirmed by the borrower",
            ));
        }
        self.returned = true;
        self.status = derive_return_status(self.returned, self.received);
        Ok(self.status)
    }

    /// Owner's half of the return. Returns the derived status.
    pub(crate) fn confirm_receipt(&mut self) -> Result<BookingStatus, Error> {
        self.ensure_rental("confirm receipt")?;
        self.ensure_status(RETURN_PHASE, "confirm receipt")?;
        if self.received {
            return Err(conflicting_state(
                "booking",
                self.id,
                self.status,
                "receipt already confirmed by the owner",
            ));
        }
        self.received = true;
        self.status = derive_return_status(self.returned, self.received);
        Ok(self.status)
    }

    pub(crate) fn cancel(&mut self) -> Result<(), Error> {
        self.transition(
            &[BookingStatus::Accepted, BookingStatus::Completed],
            BookingStatus::Cancelled,
            "roll back",
        )
    }

    pub(crate) fn expire(&mut self) -> Result<(), Error> {
        self.transition(
            &[BookingStatus::Pending, BookingStatus::Accepted],
            BookingStatus::Expired,
            "expire",
        )
    }

    fn ensure_rental(&self, operation: &str) -> Result<(), Error> {
        if self.listing == ListingType::Rent {
            Ok(())
        } else {
            Err(conflicting_state(
                "booking",
                self.id,
                self.status,
                format!("cannot {operation} of a {} booking", self.listing),
            ))
        }
    }
}

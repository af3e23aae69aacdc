//! Expiration sweep over bookings whose start date has passed.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::{
    Error,
    domain::{BookingId, BookingStatus, ItemStatus},
    engine::Marketplace,
    store::Store,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub expired: Vec<BookingId>,
    pub completed: Vec<BookingId>,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.expired.is_empty() && self.completed.is_empty()
    }
}

impl<S: Store> Marketplace<S> {
    /// Moves every booking that started before `today` out of PENDING or ACCEPTED: pending
    /// requests expire, paid rentals complete, and unpaid sales expire and free their item.
    /// Touches no balance; running it again on the same day changes nothing.
    pub fn expire_overdue(&self, today: NaiveDate) -> Result<SweepReport, Error> {
        self.execute(|tables, outbox, _| {
            let mut report = SweepReport::default();
            let mut released = Vec::new();

            for booking in tables.bookings_mut().filter(|b| b.is_overdue(today)) {
                match booking.status() {
                    BookingStatus::Pending => {
                        booking.expire()?;
                        report.expired.push(booking.id());
                    }
                    BookingStatus::Accepted if booking.is_paid() => {
                        booking.complete()?;
                        report.completed.push(booking.id());
                    }
                    BookingStatus::Accepted => {
                        booking.expire()?;
                        report.expired.push(booking.id());
                        released.push(booking.item());
                    }
                    _ => continue,
                }
                outbox.notify(
                    booking.borrower(),
                    format!("Booking {} is now {}", booking.id(), booking.status()),
                );
            }

            for item in released {
                let item = tables.item_mut(item)?;
                if item.status() == ItemStatus::Booked {
                    item.set_status(ItemStatus::Available);
                }
            }

            if !report.is_empty() {
                info!(
                    today = %today,
                    expired = report.expired.len(),
                    completed = report.completed.len(),
                    "expiration sweep"
                );
            }
            Ok(report)
        })
    }
}

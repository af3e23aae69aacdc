//! Booking lifecycle operations. Each re-reads the booking inside its unit of work, so the status
//! check and the transition it guards cannot be split by a concurrent request.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use crate::{
    Error,
    domain::{
        Booking, BookingId, BookingStatus, ItemId, ItemStatus, ListingType, Reference,
        TransactionKind, UserId,
    },
    engine::{
        Marketplace, RENT_RESERVE, authenticate, authenticate_active,
        ledger::{self, Transfer},
    },
    error::{conflicting_state, forbidden, validation_error},
    store::{Store, Tables},
};

impl<S: Store> Marketplace<S> {
    /// Creates a PENDING booking of `item` for `borrower` covering `start_date..=end_date`.
    pub fn request_booking(
        &self,
        item_id: ItemId,
        borrower: UserId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Booking, Error> {
        self.execute(|tables, outbox, now| {
            authenticate_active(tables, borrower)?;
            if end_date < start_date {
                return Err(validation_error(format!(
                    "booking ends on {end_date}, before it starts on {start_date}"
                )));
            }
            let item = tables.item(item_id)?.clone();
            if item.owner() == borrower {
                return Err(forbidden(borrower, format!("cannot book own item {item_id}")));
            }
            if item.status() != ItemStatus::Available {
                return Err(conflicting_state(
                    "item",
                    item_id,
                    item.status(),
                    "not open for bookings",
                ));
            }

            let id = tables.insert_booking(|id| {
                Booking::request(id, &item, borrower, start_date, end_date, now)
            });
            outbox.notify(
                item.owner(),
                format!(
                    "New booking request {id} for item {item_id} from {start_date} to {end_date}"
                ),
            );
            info!(booking = %id, item = %item_id, borrower = %borrower, "booking requested");
            Ok(tables.booking(id)?.clone())
        })
    }

    /// Owner accepts a PENDING booking. A rental is paid here: the borrower must hold the rent
    /// plus [`RENT_RESERVE`], and the rent moves to the owner. A sale only reserves the item.
    pub fn accept_booking(&self, booking_id: BookingId, caller: UserId) -> Result<Booking, Error> {
        self.execute(|tables, outbox, now| {
            authenticate_active(tables, caller)?;
            let booking = tables.booking(booking_id)?.clone();
            let item = tables.item(booking.item())?.clone();
            if item.owner() != caller {
                return Err(forbidden(
                    caller,
                    format!("only the owner of item {} may accept booking {booking_id}", item.id()),
                ));
            }
            booking.ensure_status(&[BookingStatus::Pending], "accept")?;
            if item.status() != ItemStatus::Available {
                return Err(conflicting_state(
                    "item",
                    item.id(),
                    item.status(),
                    "already held by another booking",
                ));
            }

            if booking.listing() == ListingType::Rent {
                let rent = item
                    .price()
                    .checked_mul(Decimal::from(booking.rental_days()))
                    .ok_or_else(|| {
                        validation_error(format!(
                            "rent of item {} over {} days is out of range",
                            item.id(),
                            booking.rental_days()
                        ))
                    })?;
                let required = rent.checked_add(RENT_RESERVE).ok_or_else(|| {
                    validation_error(format!("rent of {rent} plus the reserve is out of range"))
                })?;
                let service_charge = tables.settings()?.rent_fee(rent);
                ledger::ensure_funds(tables, booking.borrower(), required)?;
                ledger::transfer(
                    tables,
                    Transfer {
                        from: booking.borrower(),
                        to: item.owner(),
                        debit: rent,
                        fee: Decimal::ZERO,
                        kind: TransactionKind::RentPayment,
                        item: Some(item.id()),
                        reference: Reference::Booking(booking_id),
                    },
                    now,
                )?;
                let paid = tables.booking_mut(booking_id)?;
                paid.record_payment(rent, rent);
                paid.report_service_charge(service_charge);
            }

            let accepted = tables.booking_mut(booking_id)?;
            accepted.accept()?;
            let accepted = accepted.clone();
            tables.item_mut(item.id())?.set_status(ItemStatus::Booked);

            outbox.notify(
                accepted.borrower(),
                match accepted.listing() {
                    ListingType::Rent => format!(
                        "Your booking {booking_id} was accepted and {} coins were paid",
                        accepted.amount_paid()
                    ),
                    ListingType::Sell => format!(
                        "Your booking {booking_id} was accepted, pay {} coins to complete it",
                        item.price()
                    ),
                },
            );
            info!(
                booking = %booking_id,
                item = %item.id(),
                paid = %accepted.amount_paid(),
                service_charge = %accepted.service_charge(),
                "booking accepted"
            );
            Ok(accepted)
        })
    }

    pub fn reject_booking(&self, booking_id: BookingId, caller: UserId) -> Result<Booking, Error> {
        self.execute(|tables, outbox, _| {
            authenticate(tables, caller)?;
            let booking = owned_booking(tables, booking_id, caller, "reject")?;
            booking.reject()?;
            let booking = booking.clone();

            outbox.notify(
                booking.borrower(),
                format!("Your booking {booking_id} was rejected"),
            );
            info!(booking = %booking_id, "booking rejected");
            Ok(booking)
        })
    }

    /// Borrower settles an ACCEPTED sale booking. Rentals are settled at acceptance already.
    pub fn pay_booking(&self, booking_id: BookingId, caller: UserId) -> Result<Booking, Error> {
        self.execute(|tables, outbox, now| {
            authenticate_active(tables, caller)?;
            let booking = borrowed_booking(tables, booking_id, caller, "pay for")?.clone();
            booking.ensure_status(&[BookingStatus::Accepted], "pay")?;
            if booking.listing() == ListingType::Rent {
                return Err(conflicting_state(
                    "booking",
                    booking_id,
                    booking.status(),
                    "rent is settled when the booking is accepted",
                ));
            }
            let item = tables.item(booking.item())?.clone();
            let price = item.price();
            ledger::ensure_funds(tables, caller, price)?;
            ledger::transfer(
                tables,
                Transfer {
                    from: caller,
                    to: item.owner(),
                    debit: price,
                    fee: Decimal::ZERO,
                    kind: TransactionKind::Purchase,
                    item: Some(item.id()),
                    reference: Reference::Booking(booking_id),
                },
                now,
            )?;

            let paid = tables.booking_mut(booking_id)?;
            paid.record_payment(price, price);
            paid.complete()?;
            let paid = paid.clone();
            tables.item_mut(item.id())?.set_status(ItemStatus::Sold);

            outbox.notify(
                item.owner(),
                format!("Booking {booking_id} was paid: you received {price} coins"),
            );
            info!(booking = %booking_id, item = %item.id(), price = %price, "booking paid");
            Ok(paid)
        })
    }

    /// Borrower confirms they have the item in hand.
    pub fn confirm_handover(
        &self,
        booking_id: BookingId,
        caller: UserId,
    ) -> Result<Booking, Error> {
        self.execute(|tables, outbox, _| {
            authenticate(tables, caller)?;
            let booking = borrowed_booking(tables, booking_id, caller, "confirm handover of")?;
            booking.confirm_handover()?;
            let booking = booking.clone();

            outbox.notify(
                booking.owner(),
                format!("The borrower received the item of booking {booking_id}"),
            );
            info!(booking = %booking_id, "handover confirmed");
            Ok(booking)
        })
    }

    /// Either party opens the return of a received rental.
    pub fn start_return(&self, booking_id: BookingId, caller: UserId) -> Result<Booking, Error> {
        self.execute(|tables, outbox, _| {
            authenticate(tables, caller)?;
            let booking = tables.booking_mut(booking_id)?;
            if !booking.is_participant(caller) {
                return Err(forbidden(
                    caller,
                    format!("not a participant of booking {booking_id}"),
                ));
            }
            booking.start_return()?;
            let booking = booking.clone();

            let other = if caller == booking.owner() {
                booking.borrower()
            } else {
                booking.owner()
            };
            outbox.notify(other, format!("The return of booking {booking_id} has started"));
            info!(booking = %booking_id, "return started");
            Ok(booking)
        })
    }

    /// Borrower's half of the return.
    pub fn confirm_return(&self, booking_id: BookingId, caller: UserId) -> Result<Booking, Error> {
        self.execute(|tables, outbox, _| {
            authenticate(tables, caller)?;
            let booking = borrowed_booking(tables, booking_id, caller, "confirm the return of")?;
            let status = booking.confirm_return()?;
            let booking = booking.clone();
            release_if_successful(tables, &booking)?;

            outbox.notify(
                booking.owner(),
                format!("The borrower returned the item of booking {booking_id} ({status})"),
            );
            info!(booking = %booking_id, status = %status, "return confirmed");
            Ok(booking)
        })
    }

    /// Owner's half of the return.
    pub fn confirm_receipt(&self, booking_id: BookingId, caller: UserId) -> Result<Booking, Error> {
        self.execute(|tables, outbox, _| {
            authenticate(tables, caller)?;
            let booking = owned_booking(tables, booking_id, caller, "confirm receipt of")?;
            let status = booking.confirm_receipt()?;
            let booking = booking.clone();
            release_if_successful(tables, &booking)?;

            outbox.notify(
                booking.borrower(),
                format!("The owner got the item of booking {booking_id} back ({status})"),
            );
            info!(booking = %booking_id, status = %status, "receipt confirmed");
            Ok(booking)
        })
    }
}

fn owned_booking<'a>(
    tables: &'a mut Tables,
    booking_id: BookingId,
    caller: UserId,
    operation: &str,
) -> Result<&'a mut Booking, Error> {
    let booking = tables.booking_mut(booking_id)?;
    if booking.owner() != caller {
        return Err(forbidden(
            caller,
            format!("only the owner may {operation} booking {booking_id}"),
        ));
    }
    Ok(booking)
}

fn borrowed_booking<'a>(
    tables: &'a mut Tables,
    booking_id: BookingId,
    caller: UserId,
    operation: &str,
) -> Result<&'a mut Booking, Error> {
    let booking = tables.booking_mut(booking_id)?;
    if booking.borrower() != caller {
        return Err(forbidden(
            caller,
            format!("only the borrower may {operation} booking {booking_id}"),
        ));
    }
    Ok(booking)
}

// A completed rental puts the item back on the market.
fn release_if_successful(tables: &mut Tables, booking: &Booking) -> Result<(), Error> {
    if booking.status() == BookingStatus::Successful && booking.listing() == ListingType::Rent {
        tables.item_mut(booking.item())?.set_status(ItemStatus::Available);
    }
    Ok(())
}

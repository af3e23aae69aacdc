//! Integration tests for handover and the two-sided return of rentals

use campus_wallet::{Booking, BookingStatus, Error, ItemStatus, Marketplace};
use claims::{assert_err, assert_matches, assert_ok};
use rust_decimal_macros::dec;

use crate::support::{
    BORROWER, OWNER, RENT_ITEM, SELL_ITEM, accepted_rental, balance, listed_market, paid_sale,
};

/// An accepted rental that was completed by the sweep and handed over.
fn received_rental(market: &Marketplace) -> Booking {
    let booking = accepted_rental(market);
    hand_over(market, &booking)
}

fn hand_over(market: &Marketplace, booking: &Booking) -> Booking {
    market.expire_overdue(crate::support::day(21)).unwrap();
    market.confirm_handover(booking.id(), BORROWER).unwrap()
}

#[test]
fn handover_requires_a_completed_booking() {
    let market = listed_market(dec!(1000), dec!(100), dec!(300));
    let booking = accepted_rental(&market);

    assert_matches!(
        market.confirm_handover(booking.id(), BORROWER),
        Err(Error::ConflictingState { status, .. }) if status == "ACCEPTED"
    );

    let received = hand_over(&market, &booking);
    assert_eq!(received.status(), BookingStatus::Received);
}

#[test]
fn return_completes_borrower_first() {
    let market = listed_market(dec!(1000), dec!(100), dec!(300));
    let booking = received_rental(&market);

    let started = assert_ok!(market.start_return(booking.id(), OWNER));
    assert_eq!(started.status(), BookingStatus::ReturnFlow);

    let returned = assert_ok!(market.confirm_return(booking.id(), BORROWER));
    assert_eq!(returned.status(), BookingStatus::PendingOwnerConfirmation);
    assert_eq!(market.item(RENT_ITEM).unwrap().status(), ItemStatus::Booked);

    let done = assert_ok!(market.confirm_receipt(booking.id(), OWNER));
    assert_eq!(done.status(), BookingStatus::Successful);
    assert!(done.is_returned() && done.is_received());
    assert_eq!(market.item(RENT_ITEM).unwrap().status(), ItemStatus::Available);
}

#[test]
fn return_completes_owner_first_without_starting_it() {
    let market = listed_market(dec!(1000), dec!(100), dec!(300));
    let booking = received_rental(&market);

    let received = assert_ok!(market.confirm_receipt(booking.id(), OWNER));
    assert_eq!(received.status(), BookingStatus::PendingBorrowerConfirmation);

    let done = assert_ok!(market.confirm_return(booking.id(), BORROWER));
    assert_eq!(done.status(), BookingStatus::Successful);
}

#[test]
fn confirmations_are_one_shot_and_side_bound() {
    let market = listed_market(dec!(1000), dec!(100), dec!(300));
    let booking = received_rental(&market);

    assert_matches!(
        market.confirm_return(booking.id(), OWNER),
        Err(Error::Forbidden { .. })
    );
    assert_matches!(
        market.confirm_receipt(booking.id(), BORROWER),
        Err(Error::Forbidden { .. })
    );

    market.confirm_return(booking.id(), BORROWER).unwrap();
    assert_matches!(
        market.confirm_return(booking.id(), BORROWER),
        Err(Error::ConflictingState { .. })
    );
    assert_eq!(
        market.booking(booking.id()).unwrap().status(),
        BookingStatus::PendingOwnerConfirmation
    );
}

#[test]
fn successful_rental_is_closed() {
    let market = listed_market(dec!(1000), dec!(100), dec!(300));
    let booking = received_rental(&market);
    market.confirm_return(booking.id(), BORROWER).unwrap();
    market.confirm_receipt(booking.id(), OWNER).unwrap();

    assert_err!(market.confirm_receipt(booking.id(), OWNER));
    assert_err!(market.start_return(booking.id(), BORROWER));
    assert_err!(market.rollback_booking(booking.id(), crate::support::ADMIN));
    // the return flow itself never moves coins
    assert_eq!(balance(&market, BORROWER), dec!(900));
    assert_eq!(balance(&market, OWNER), dec!(100));
}

#[test]
fn sales_end_at_handover() {
    let market = listed_market(dec!(1000), dec!(100), dec!(300));
    let booking = paid_sale(&market);

    let received = assert_ok!(market.confirm_handover(booking.id(), BORROWER));
    assert_eq!(received.status(), BookingStatus::Received);

    assert_matches!(
        market.start_return(booking.id(), BORROWER),
        Err(Error::ConflictingState { .. })
    );
    assert_eq!(market.item(SELL_ITEM).unwrap().status(), ItemStatus::Sold);
}

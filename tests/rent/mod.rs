//! Integration tests for requesting and accepting rentals

use campus_wallet::{
    BookingStatus, Error, ItemId, ItemStatus, ListingType, RENT_RESERVE, Settings,
    TransactionKind,
};
use claims::{assert_err, assert_matches, assert_ok};
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::support::{
    ADMIN, BORROWER, OWNER, RENT_ITEM, balance, day, entries_of, listed_market, total_coins,
};

#[test]
fn accepting_a_rental_pays_the_rent_for_every_day() {
    // Arrange
    let market = listed_market(dec!(1000), dec!(100), dec!(300));
    let booking = market
        .request_booking(RENT_ITEM, BORROWER, day(20), day(24))
        .unwrap();
    assert_eq!(booking.status(), BookingStatus::Pending);

    // Act
    let accepted = assert_ok!(market.accept_booking(booking.id(), OWNER));

    // Assert
    assert_eq!(accepted.status(), BookingStatus::Accepted);
    assert_eq!(accepted.amount_paid(), dec!(500));
    assert_eq!(balance(&market, BORROWER), dec!(500));
    assert_eq!(balance(&market, OWNER), dec!(500));
    assert_eq!(market.item(RENT_ITEM).unwrap().status(), ItemStatus::Booked);

    assert_eq!(
        entries_of(&market, BORROWER, TransactionKind::RentPayment, booking.id()),
        vec![dec!(-500)]
    );
    assert_eq!(
        entries_of(&market, OWNER, TransactionKind::RentPayment, booking.id()),
        vec![dec!(500)]
    );
    assert_eq!(total_coins(&market), dec!(1000));
}

#[test]
fn accepting_requires_the_reserve_on_top_of_the_rent() {
    let market = listed_market(dec!(500), dec!(100), dec!(300));
    let booking = market
        .request_booking(RENT_ITEM, BORROWER, day(20), day(24))
        .unwrap();

    let err = assert_err!(market.accept_booking(booking.id(), OWNER));

    assert_matches!(
        err,
        Error::InsufficientFunds { user, required, available, shortfall }
            if user == BORROWER
                && required == dec!(500) + RENT_RESERVE
                && available == dec!(500)
                && shortfall == dec!(500)
    );
    // nothing moved and the booking is still waiting
    assert_eq!(balance(&market, BORROWER), dec!(500));
    assert_eq!(balance(&market, OWNER), dec!(0));
    assert_eq!(
        market.booking(booking.id()).unwrap().status(),
        BookingStatus::Pending
    );
    assert_eq!(market.item(RENT_ITEM).unwrap().status(), ItemStatus::Available);
    assert!(market.transactions_for(OWNER).unwrap().is_empty());
}

#[test]
fn rent_service_charge_is_reported_but_not_withheld() {
    let market = listed_market(dec!(1000), dec!(100), dec!(300));
    market
        .update_settings(Settings::new(dec!(5), dec!(2.5)).unwrap(), ADMIN)
        .unwrap();
    let booking = market
        .request_booking(RENT_ITEM, BORROWER, day(20), day(21))
        .unwrap();

    let accepted = assert_ok!(market.accept_booking(booking.id(), OWNER));

    assert_eq!(accepted.amount_paid(), dec!(200));
    assert_eq!(accepted.owner_payout(), dec!(200));
    assert_eq!(accepted.service_charge(), dec!(5));
    assert_eq!(balance(&market, OWNER), dec!(200));
    let owner_entries = market.transactions_for(OWNER).unwrap();
    assert_eq!(owner_entries.len(), 1);
    assert_eq!(owner_entries[0].fee(), dec!(0));
}

#[rstest]
#[case::rent_overflows(day(20), day(21))]
#[case::reserve_overflows(day(20), day(20))]
fn rent_out_of_range_is_refused(
    #[case] start: chrono::NaiveDate,
    #[case] end: chrono::NaiveDate,
) {
    let market = listed_market(dec!(1000), dec!(100), dec!(300));
    let priceless = ItemId::new(30);
    market
        .list_item(priceless, OWNER, Decimal::MAX, ListingType::Rent)
        .unwrap();
    let booking = market
        .request_booking(priceless, BORROWER, start, end)
        .unwrap();

    assert_matches!(
        market.accept_booking(booking.id(), OWNER),
        Err(Error::Validation(_))
    );
    assert_eq!(balance(&market, BORROWER), dec!(1000));
    assert_eq!(
        market.booking(booking.id()).unwrap().status(),
        BookingStatus::Pending
    );
}

#[test]
fn accepting_twice_is_a_conflict_and_charges_once() {
    let market = listed_market(dec!(2000), dec!(100), dec!(300));
    let booking = market
        .request_booking(RENT_ITEM, BORROWER, day(20), day(21))
        .unwrap();
    market.accept_booking(booking.id(), OWNER).unwrap();

    let err = assert_err!(market.accept_booking(booking.id(), OWNER));

    assert_matches!(err, Error::ConflictingState { entity: "booking", .. });
    assert_eq!(balance(&market, BORROWER), dec!(1800));
    assert_eq!(
        entries_of(&market, BORROWER, TransactionKind::RentPayment, booking.id()).len(),
        1
    );
}

#[test]
fn only_the_owner_may_accept() {
    let market = listed_market(dec!(2000), dec!(100), dec!(300));
    let booking = market
        .request_booking(RENT_ITEM, BORROWER, day(20), day(20))
        .unwrap();

    assert_matches!(
        market.accept_booking(booking.id(), BORROWER),
        Err(Error::Forbidden { .. })
    );
    assert_matches!(
        market.accept_booking(booking.id(), campus_wallet::UserId::new(404)),
        Err(Error::Unauthorized(_))
    );
}

#[test]
fn a_second_request_cannot_be_accepted_while_the_item_is_booked() {
    let market = listed_market(dec!(2000), dec!(100), dec!(300));
    let first = market
        .request_booking(RENT_ITEM, BORROWER, day(20), day(20))
        .unwrap();
    let second = market
        .request_booking(RENT_ITEM, BORROWER, day(22), day(22))
        .unwrap();
    market.accept_booking(first.id(), OWNER).unwrap();

    assert_matches!(
        market.accept_booking(second.id(), OWNER),
        Err(Error::ConflictingState { entity: "item", .. })
    );
    assert_eq!(balance(&market, BORROWER), dec!(1900));
}

#[test]
fn rejected_request_moves_no_money() {
    let market = listed_market(dec!(2000), dec!(100), dec!(300));
    let booking = market
        .request_booking(RENT_ITEM, BORROWER, day(20), day(20))
        .unwrap();

    let rejected = assert_ok!(market.reject_booking(booking.id(), OWNER));

    assert_eq!(rejected.status(), BookingStatus::Rejected);
    assert_err!(market.accept_booking(booking.id(), OWNER));
    assert_eq!(balance(&market, BORROWER), dec!(2000));
}

#[test]
fn invalid_requests_are_refused() {
    let market = listed_market(dec!(2000), dec!(100), dec!(300));

    assert_matches!(
        market.request_booking(RENT_ITEM, BORROWER, day(22), day(20)),
        Err(Error::Validation(_))
    );
    assert_matches!(
        market.request_booking(RENT_ITEM, OWNER, day(20), day(20)),
        Err(Error::Forbidden { .. })
    );
    assert_matches!(
        market.request_booking(campus_wallet::ItemId::new(77), BORROWER, day(20), day(20)),
        Err(Error::NotFound { entity: "item", id: 77 })
    );
}

#[test]
fn blocked_borrower_cannot_book() {
    let market = listed_market(dec!(2000), dec!(100), dec!(300));
    market
        .set_user_blocked(BORROWER, true, crate::support::ADMIN)
        .unwrap();

    assert_matches!(
        market.request_booking(RENT_ITEM, BORROWER, day(20), day(20)),
        Err(Error::Forbidden { .. })
    );
}

#[test]
fn deactivated_item_takes_no_requests() {
    let market = listed_market(dec!(2000), dec!(100), dec!(300));
    let item = assert_ok!(market.deactivate_item(RENT_ITEM, OWNER));
    assert_eq!(item.status(), ItemStatus::Inactive);

    assert_matches!(
        market.request_booking(RENT_ITEM, BORROWER, day(20), day(20)),
        Err(Error::ConflictingState { entity: "item", .. })
    );
}

#[test]
fn booked_item_cannot_be_deactivated() {
    let market = listed_market(dec!(2000), dec!(100), dec!(300));
    crate::support::accepted_rental(&market);

    assert_matches!(
        market.deactivate_item(RENT_ITEM, OWNER),
        Err(Error::ConflictingState { .. })
    );
}

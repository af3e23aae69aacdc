//! Integration tests for the expiration sweep

use campus_wallet::{BookingStatus, ItemStatus};
use claims::assert_ok;
use rust_decimal_macros::dec;

use crate::support::{
    BORROWER, OWNER, RENT_ITEM, SELL_ITEM, accepted_rental, accepted_sale, balance, day,
    listed_market, total_coins,
};

#[test]
fn sweep_settles_every_overdue_booking() {
    // Arrange: one paid rental, one unpaid sale, one untouched request, all starting on the 20th
    let market = listed_market(dec!(1000), dec!(100), dec!(300));
    let rental = accepted_rental(&market);
    let sale = accepted_sale(&market);
    let request = market
        .request_booking(RENT_ITEM, BORROWER, day(20), day(20))
        .unwrap();
    let coins_before = total_coins(&market);

    // Act
    let report = assert_ok!(market.expire_overdue(day(21)));

    // Assert
    assert_eq!(report.completed, vec![rental.id()]);
    assert_eq!(report.expired, vec![sale.id(), request.id()]);

    assert_eq!(
        market.booking(rental.id()).unwrap().status(),
        BookingStatus::Completed
    );
    assert_eq!(
        market.booking(sale.id()).unwrap().status(),
        BookingStatus::Expired
    );
    assert_eq!(
        market.booking(request.id()).unwrap().status(),
        BookingStatus::Expired
    );
    // the paid rental keeps its item, the unpaid sale gives it back
    assert_eq!(market.item(RENT_ITEM).unwrap().status(), ItemStatus::Booked);
    assert_eq!(market.item(SELL_ITEM).unwrap().status(), ItemStatus::Available);

    assert_eq!(total_coins(&market), coins_before);
    assert_eq!(balance(&market, BORROWER), dec!(900));
    assert_eq!(balance(&market, OWNER), dec!(100));
}

#[test]
fn sweep_leaves_bookings_starting_today_alone() {
    let market = listed_market(dec!(1000), dec!(100), dec!(300));
    let request = market
        .request_booking(RENT_ITEM, BORROWER, day(20), day(20))
        .unwrap();

    let report = assert_ok!(market.expire_overdue(day(20)));

    assert!(report.is_empty());
    assert_eq!(
        market.booking(request.id()).unwrap().status(),
        BookingStatus::Pending
    );
}

#[test]
fn sweep_is_idempotent() {
    let market = listed_market(dec!(1000), dec!(100), dec!(300));
    accepted_rental(&market);
    accepted_sale(&market);
    assert!(!market.expire_overdue(day(25)).unwrap().is_empty());
    let wallets = market.wallets().unwrap();

    let again = assert_ok!(market.expire_overdue(day(25)));

    assert!(again.is_empty());
    assert_eq!(market.wallets().unwrap(), wallets);
}

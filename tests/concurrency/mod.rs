//! Integration tests racing operations against one shared marketplace

use std::sync::Barrier;
use std::thread;

use campus_wallet::{DepositDecision, Error, ItemId, ListingType, TransactionKind, UserId};
use rust_decimal_macros::dec;

use crate::support::{
    ADMIN, BORROWER, OWNER, RENT_ITEM, accepted_sale, balance, day, entries_of, listed_market,
    market_with, total_coins,
};

#[test]
fn racing_accepts_charge_rent_once() {
    let market = listed_market(dec!(2000), dec!(100), dec!(300));
    let booking = market
        .request_booking(RENT_ITEM, BORROWER, day(20), day(21))
        .unwrap();
    let barrier = Barrier::new(2);

    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..2)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    market.accept_booking(booking.id(), OWNER)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(Error::ConflictingState { .. })))
        .count();
    assert_eq!((successes, conflicts), (1, 1));

    assert_eq!(balance(&market, BORROWER), dec!(1800));
    assert_eq!(balance(&market, OWNER), dec!(200));
    assert_eq!(
        entries_of(&market, BORROWER, TransactionKind::RentPayment, booking.id()),
        vec![dec!(-200)]
    );
    assert_eq!(
        entries_of(&market, OWNER, TransactionKind::RentPayment, booking.id()),
        vec![dec!(200)]
    );
}

#[test]
fn racing_payments_charge_exactly_once() {
    let market = listed_market(dec!(1000), dec!(50), dec!(300));
    let booking = accepted_sale(&market);
    let barrier = Barrier::new(2);

    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..2)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    market.pay_booking(booking.id(), BORROWER)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(Error::ConflictingState { .. })))
        .count();
    assert_eq!((successes, conflicts), (1, 1));

    assert_eq!(balance(&market, BORROWER), dec!(700));
    assert_eq!(balance(&market, OWNER), dec!(300));
    assert_eq!(
        entries_of(&market, BORROWER, TransactionKind::Purchase, booking.id()).len(),
        1
    );
    assert_eq!(
        entries_of(&market, OWNER, TransactionKind::Purchase, booking.id()).len(),
        1
    );
}

#[test]
fn racing_buyers_never_overspend_a_wallet() {
    // one wallet, ten purchases of 30 each, only enough for three
    let buyer = UserId::new(3);
    let market = market_with(&[(OWNER, dec!(0)), (buyer, dec!(100))]);
    for id in 1..=10 {
        market
            .list_item(ItemId::new(id), OWNER, dec!(30), ListingType::Sell)
            .unwrap();
    }

    let bought = thread::scope(|s| {
        let handles: Vec<_> = (1..=10)
            .map(|id| {
                let market = &market;
                s.spawn(move || market.buy_item(ItemId::new(id), buyer).is_ok())
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count()
    });

    assert_eq!(bought, 3);
    assert_eq!(balance(&market, buyer), dec!(10));
    market.reconcile(buyer).unwrap();
    market.reconcile(OWNER).unwrap();
}

#[test]
fn racing_approvals_of_one_request_credit_once() {
    let market = market_with(&[(BORROWER, dec!(0))]);
    let request = market
        .create_deposit_request(BORROWER, dec!(75), "UTR-9")
        .unwrap();
    let barrier = Barrier::new(4);

    let approved = thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    market
                        .resolve_deposit_request(
                            request.id(),
                            DepositDecision::Approved,
                            None,
                            ADMIN,
                        )
                        .is_ok()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count()
    });

    assert_eq!(approved, 1);
    assert_eq!(balance(&market, BORROWER), dec!(75));
    assert_eq!(total_coins(&market), dec!(75));
}

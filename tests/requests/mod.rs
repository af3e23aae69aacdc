//! Integration tests for deposit and withdrawal requests

use campus_wallet::{
    AdminActionKind, DepositDecision, DepositKind, DepositStatus, Error, Reference,
    TransactionKind,
};
use claims::{assert_err, assert_matches, assert_ok};
use rust_decimal_macros::dec;

use crate::support::{ADMIN, BORROWER, OWNER, balance, market_with, recording};

#[test]
fn approved_deposit_credits_the_wallet() {
    let (market, notifier, audit_log) = recording(market_with(&[(BORROWER, dec!(0))]));

    let request = assert_ok!(market.create_deposit_request(BORROWER, dec!(250), "UTR-4411"));
    assert_eq!(request.status(), DepositStatus::Pending);
    assert_eq!(request.kind(), DepositKind::Deposit);
    assert_eq!(balance(&market, BORROWER), dec!(0));

    let resolved = assert_ok!(market.resolve_deposit_request(
        request.id(),
        DepositDecision::Approved,
        Some("matched bank statement"),
        ADMIN,
    ));

    assert_eq!(resolved.status(), DepositStatus::Approved);
    assert_eq!(resolved.admin_message(), Some("matched bank statement"));
    assert!(resolved.resolved_at().is_some());
    assert_eq!(balance(&market, BORROWER), dec!(250));

    let entries = market.transactions_for(BORROWER).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind(), TransactionKind::Deposit);
    assert_eq!(entries[0].reference(), Reference::DepositRequest(request.id()));
    assert_eq!(entries[0].source(), None);

    assert_eq!(
        audit_log.actions.lock().unwrap()[0].kind,
        AdminActionKind::ApproveDeposit
    );
    assert!(
        notifier
            .messages_for(BORROWER)
            .iter()
            .any(|m| m.contains("approved"))
    );
}

#[test]
fn rejected_deposit_moves_nothing() {
    let market = market_with(&[(BORROWER, dec!(0))]);
    let request = market
        .create_deposit_request(BORROWER, dec!(250), "UTR-4411")
        .unwrap();

    let resolved = assert_ok!(market.resolve_deposit_request(
        request.id(),
        DepositDecision::Rejected,
        Some("no such payment"),
        ADMIN,
    ));

    assert_eq!(resolved.status(), DepositStatus::Rejected);
    assert_eq!(balance(&market, BORROWER), dec!(0));
    assert!(market.transactions_for(BORROWER).unwrap().is_empty());
}

#[test]
fn withdrawal_is_rechecked_when_approved() {
    // Arrange: 150 coins are enough when the request is made
    let market = market_with(&[(BORROWER, dec!(150)), (OWNER, dec!(0))]);
    let request = assert_ok!(market.create_withdrawal_request(BORROWER, dec!(100), "student@upi"));

    // ...but 100 of them are spent before the admin gets to it
    market
        .list_item(
            campus_wallet::ItemId::new(5),
            OWNER,
            dec!(100),
            campus_wallet::ListingType::Sell,
        )
        .unwrap();
    market
        .buy_item(campus_wallet::ItemId::new(5), BORROWER)
        .unwrap();
    assert_eq!(balance(&market, BORROWER), dec!(50));

    // Act
    let err = assert_err!(market.resolve_deposit_request(
        request.id(),
        DepositDecision::Approved,
        None,
        ADMIN,
    ));

    // Assert
    assert_matches!(
        err,
        Error::InsufficientFunds { required, available, .. }
            if required == dec!(100) && available == dec!(50)
    );
    assert_eq!(balance(&market, BORROWER), dec!(50));
    assert_eq!(
        market.deposit_request(request.id()).unwrap().status(),
        DepositStatus::Pending
    );
}

#[test]
fn approved_withdrawal_debits_the_wallet() {
    let market = market_with(&[(BORROWER, dec!(150))]);
    let request = market
        .create_withdrawal_request(BORROWER, dec!(100), "student@upi")
        .unwrap();

    assert_ok!(market.resolve_deposit_request(
        request.id(),
        DepositDecision::Approved,
        None,
        ADMIN,
    ));

    assert_eq!(balance(&market, BORROWER), dec!(50));
    let last = market.transactions_for(BORROWER).unwrap().pop().unwrap();
    assert_eq!(last.kind(), TransactionKind::Withdrawal);
    assert_eq!(last.amount(), dec!(-100));
    assert_eq!(last.destination(), None);
}

#[test]
fn a_request_is_processed_once() {
    let market = market_with(&[(BORROWER, dec!(0))]);
    let request = market
        .create_deposit_request(BORROWER, dec!(40), "UTR-1")
        .unwrap();
    market
        .resolve_deposit_request(request.id(), DepositDecision::Approved, None, ADMIN)
        .unwrap();

    for decision in [DepositDecision::Approved, DepositDecision::Rejected] {
        assert_matches!(
            market.resolve_deposit_request(request.id(), decision, None, ADMIN),
            Err(Error::ConflictingState { status, .. }) if status == "APPROVED"
        );
    }
    assert_eq!(balance(&market, BORROWER), dec!(40));
}

#[test]
fn invalid_requests_are_refused() {
    let market = market_with(&[(BORROWER, dec!(20))]);

    assert_matches!(
        market.create_deposit_request(BORROWER, dec!(0), "UTR-1"),
        Err(Error::Validation(_))
    );
    assert_matches!(
        market.create_deposit_request(BORROWER, dec!(10), " "),
        Err(Error::Validation(_))
    );
    assert_matches!(
        market.create_withdrawal_request(BORROWER, dec!(21), "student@upi"),
        Err(Error::InsufficientFunds { .. })
    );
    assert_matches!(
        market.resolve_deposit_request(
            campus_wallet::DepositRequestId::new(1),
            DepositDecision::Approved,
            None,
            BORROWER
        ),
        Err(Error::Forbidden { .. })
    );
}

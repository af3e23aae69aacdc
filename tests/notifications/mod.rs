//! Integration tests for notifications and the admin audit log

use std::sync::Arc;

use campus_wallet::{AdminActionKind, BookingStatus, ComplaintStatus};
use claims::assert_ok;
use rust_decimal_macros::dec;

use crate::support::{
    ADMIN, BORROWER, FailingAuditLog, FailingNotifier, OWNER, RENT_ITEM, accepted_rental, balance,
    day, listed_market, recording,
};

#[test]
fn a_broken_notification_channel_does_not_fail_the_operation() {
    let market = listed_market(dec!(1000), dec!(100), dec!(300))
        .with_notifier(Arc::new(FailingNotifier))
        .with_audit_log(Arc::new(FailingAuditLog));
    let booking = market
        .request_booking(RENT_ITEM, BORROWER, day(20), day(20))
        .unwrap();

    let accepted = assert_ok!(market.accept_booking(booking.id(), OWNER));
    assert_eq!(accepted.status(), BookingStatus::Accepted);
    assert_eq!(balance(&market, BORROWER), dec!(900));

    let summary = assert_ok!(market.rollback_booking(booking.id(), ADMIN));
    assert_eq!(summary.coins_refunded, dec!(100));
    assert_eq!(balance(&market, BORROWER), dec!(1000));
}

#[test]
fn participants_hear_about_their_booking() {
    let (market, notifier, _) = recording(listed_market(dec!(1000), dec!(100), dec!(300)));

    accepted_rental(&market);

    let to_owner = notifier.messages_for(OWNER);
    assert_eq!(to_owner.len(), 1);
    assert!(to_owner[0].contains("New booking request"), "{to_owner:?}");
    let to_borrower = notifier.messages_for(BORROWER);
    assert_eq!(to_borrower.len(), 1);
    assert!(to_borrower[0].contains("100 coins were paid"), "{to_borrower:?}");
}

#[test]
fn failed_operations_notify_nobody() {
    let (market, notifier, audit_log) = recording(listed_market(dec!(100), dec!(100), dec!(300)));
    let booking = market
        .request_booking(RENT_ITEM, BORROWER, day(20), day(20))
        .unwrap();
    notifier.notices.lock().unwrap().clear();

    // 100 coins cannot cover the rent plus the reserve
    assert!(market.accept_booking(booking.id(), OWNER).is_err());
    assert!(market.rollback_booking(booking.id(), ADMIN).is_err());

    assert!(notifier.notices.lock().unwrap().is_empty());
    assert!(audit_log.actions.lock().unwrap().is_empty());
}

#[test]
fn admin_actions_are_audited_with_their_target() {
    let (market, _, audit_log) = recording(listed_market(dec!(1000), dec!(100), dec!(300)));
    let booking = accepted_rental(&market);
    let complaint = market
        .create_complaint(booking.id(), OWNER, "returned late")
        .unwrap();

    market.verify_complaint(complaint.id(), ADMIN).unwrap();
    market.fine_complaint(complaint.id(), dec!(5), ADMIN).unwrap();
    market.set_user_blocked(BORROWER, true, ADMIN).unwrap();

    assert_eq!(
        market.complaint(complaint.id()).unwrap().status(),
        ComplaintStatus::ActionTaken
    );
    let actions = audit_log.actions.lock().unwrap();
    let kinds: Vec<_> = actions.iter().map(|a| a.kind).collect();
    assert_eq!(
        kinds,
        vec![
            AdminActionKind::VerifyComplaint,
            AdminActionKind::Fine,
            AdminActionKind::BlockUser
        ]
    );
    assert!(actions.iter().all(|a| a.admin == ADMIN));
    assert_eq!(actions[1].target_user, Some(BORROWER));
    assert!(actions[1].to_string().starts_with("FINE by admin 99 on user 2"));
}

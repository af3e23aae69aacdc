#[macro_use]
mod domain;

mod config;
mod engine;
mod error;
mod input;
mod output;
mod replay;
mod sinks;
mod store;
mod telemetry;

pub use config::Config;
pub use domain::{
    Booking, BookingId, BookingStatus, Complaint, ComplaintId, ComplaintStatus, DepositDecision,
    DepositKind, DepositRequest, DepositRequestId, DepositStatus, Item, ItemId, ItemStatus,
    ListingType, Money, Reference, ResolutionAction, Role, Settings, Transaction, TransactionId,
    TransactionKind, TransactionStatus, User, UserId, derive_return_status,
};
pub use engine::{FineSummary, Marketplace, RENT_RESERVE, RollbackSummary, SweepReport};
pub use error::Error;
pub use output::{OutcomeRecord, WalletRecord};
pub use sinks::{AdminAction, AdminActionKind, AuditLog, Notifier, TracingAuditLog, TracingNotifier};
pub use store::{MemoryStore, Store, Tables};
pub use telemetry::setup_logging;

/// Replays a CSV command log against a fresh in-memory marketplace and returns the final wallets,
/// ordered by user id.
///
/// Each row is one operation issued by the user in its `actor` column (see the `input` module for
/// the columns). Bookings, complaints and deposit requests get ids 1, 2, 3, ... per kind in the
/// order they are created, which is how later rows refer to them.
///
/// # Error handling
///
/// A command log is expected to contain rejected operations: malformed rows, but also perfectly
/// valid requests the engine refuses (a payment without funds, a second rollback). Each rejection
/// is reported to `on_error` and the replay continues; the failed operation leaves no trace in the
/// wallets. Every applied command is reported to `on_success`.
///
/// The outer `Result` only fails if the store itself fails.
///
/// # Example
///
/// ```no_run
/// use std::fs::File;
/// use campus_wallet::{replay, Error, OutcomeRecord, Settings};
///
/// let reader = File::open("commands.csv").unwrap();
///
/// let mut wtr = csv::Writer::from_writer(std::io::stdout());
/// let wallets = replay(
///     reader,
///     Settings::default(),
///     |e: Error| eprintln!("rejected: {e}"),
///     |_: OutcomeRecord| {},
/// )
/// .unwrap();
/// for record in wallets {
///     wtr.serialize(&record).unwrap();
/// }
/// wtr.flush().unwrap();
/// ```
pub fn replay(
    reader: impl std::io::Read,
    settings: Settings,
    mut on_error: impl FnMut(Error),
    mut on_success: impl FnMut(OutcomeRecord),
) -> Result<impl Iterator<Item = WalletRecord>, Error> {
    let market = Marketplace::new(MemoryStore::new(settings));

    for result in input::parse_commands(reader) {
        match result.and_then(|command| replay::execute(&market, command)) {
            Ok(outcome) => on_success(outcome),
            Err(err) => on_error(err),
        }
    }

    Ok(output::to_wallet_records(market.wallets()?))
}

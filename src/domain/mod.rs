//! Module for the types defining the marketplace domain: wallets, listings, bookings, disputes and the ledger.

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

/// Coins are tracked as exact decimals.
pub type Money = Decimal;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            pub const fn new(id: u32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u32 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Id of a wallet holder, issued by the identity provider.
    UserId
);
entity_id!(
    /// Id of a listed item, issued by the catalog.
    ItemId
);
entity_id!(
    /// Id of a rental or sale booking.
    BookingId
);
entity_id!(
    /// Id of a complaint raised against a booking.
    ComplaintId
);
entity_id!(
    /// Id of a deposit or withdrawal request.
    DepositRequestId
);
entity_id!(
    /// Id of a ledger entry.
    TransactionId
);

/// Parses a closed enumeration from its canonical upper-case spelling, accepting any casing.
/// Legacy rows spell statuses both `pending` and `PENDING`.
pub(crate) fn parse_variant<T: Copy>(
    raw: &str,
    variants: &[(&'static str, T)],
    what: &'static str,
) -> Result<T, String> {
    let normalized = raw.trim().replace(['-', ' '], "_");
    variants
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(&normalized))
        .map(|(_, variant)| *variant)
        .ok_or_else(|| format!("unknown {what}: {raw}"))
}

macro_rules! closed_enum {
    ($name:ident, $what:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            const VARIANTS: &'static [(&'static str, $name)] = &[$(($text, $name::$variant)),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                crate::domain::parse_variant(s, Self::VARIANTS, $what)
            }
        }
    };
}

mod booking;
mod complaint;
mod deposit;
mod item;
mod settings;
mod transaction;
mod user;


pub use booking::{Booking, BookingStatus, derive_return_status};
pub use complaint::{Complaint, ComplaintStatus, ResolutionAction};
pub use deposit::{DepositDecision, DepositKind, DepositRequest, DepositStatus};
pub use item::{Item, ItemStatus, ListingType};
pub use settings::Settings;
pub use transaction::{Reference, Transaction, TransactionKind, TransactionStatus};
pub use user::{Role, User};

use std::fmt;

use serde::Serialize;

use crate::domain::{BookingStatus, ComplaintStatus, DepositStatus, Money, User};


pub(crate) fn to_wallet_records(users: Vec<User>) -> impl Iterator<Item = WalletRecord> {
    users.into_iter().map(|user| WalletRecord::new(&user))
}

/// Final state of one wallet.
#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct WalletRecord {
    pub user: u32,
    pub balance: Money,
    pub pending_fine: Money,
    pub blocked: bool,
}

impl WalletRecord {
    fn new(user: &User) -> Self {
        Self {
            user: user.id().into(),
            balance: user.balance(),
            pending_fine: user.pending_fine(),
            blocked: user.is_blocked(),
        }
    }
}

/// Public DTO representing a successfully replayed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeRecord {
    Registered {
        user: u32,
        balance: Money,
    },
    Listed {
        item: u32,
    },
    Booking {
        booking: u32,
        status: BookingStatus,
    },
    Purchased {
        item: u32,
        transaction: u32,
        price: Money,
        fee: Money,
    },
    Complaint {
        complaint: u32,
        status: ComplaintStatus,
    },
    Fined {
        complaint: u32,
        actual_deduction: Money,
        pending_fine: Money,
    },
    RolledBack {
        booking: u32,
        coins_refunded: Money,
    },
    Request {
        request: u32,
        status: DepositStatus,
    },
    Moderated {
        user: u32,
        blocked: bool,
    },
    Swept {
        expired: usize,
        completed: usize,
    },
}

impl fmt::Display for OutcomeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeRecord::Registered { user, balance } => {
                write!(f, "Registered {{ user: {user}, balance: {balance} }}")
            }
            OutcomeRecord::Listed { item } => write!(f, "Listed {{ item: {item} }}"),
            OutcomeRecord::Booking { booking, status } => {
                write!(f, "Booking {{ booking: {booking}, status: {status} }}")
            }
            OutcomeRecord::Purchased {
                item,
                transaction,
                price,
                fee,
            } => write!(
                f,
                "Purchased {{ item: {item}, tx: {transaction}, price: {price}, fee: {fee} }}"
            ),
            OutcomeRecord::Complaint { complaint, status } => {
                write!(f, "Complaint {{ complaint: {complaint}, status: {status} }}")
            }
            OutcomeRecord::Fined {
                complaint,
                actual_deduction,
                pending_fine,
            } => write!(
                f,
                "Fined {{ complaint: {complaint}, deducted: {actual_deduction}, pending: {pending_fine} }}"
            ),
            OutcomeRecord::RolledBack {
                booking,
                coins_refunded,
            } => write!(
                f,
                "RolledBack {{ booking: {booking}, refunded: {coins_refunded} }}"
            ),
            OutcomeRecord::Request { request, status } => {
                write!(f, "Request {{ request: {request}, status: {status} }}")
            }
            OutcomeRecord::Moderated { user, blocked } => {
                write!(f, "Moderated {{ user: {user}, blocked: {blocked} }}")
            }
            OutcomeRecord::Swept { expired, completed } => {
                write!(f, "Swept {{ expired: {expired}, completed: {completed} }}")
            }
        }
    }
}

//! Wallet holders

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{Money, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Member,
    Admin,
}

closed_enum!(Role, "role", {
    Member => "MEMBER",
    Admin => "ADMIN",
});

/// A wallet holder. The balance is only ever changed through the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    id: UserId,
    role: Role,
    balance: Money,
    pending_fine: Money,
    blocked: bool,
}

impl User {
    pub(crate) fn new(id: UserId, role: Role) -> Self {
        Self {
            id,
            role,
            balance: Decimal::ZERO,
            pending_fine: Decimal::ZERO,
            blocked: false,
        }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn balance(&self) -> Money {
        self.balance
    }

    pub fn pending_fine(&self) -> Money {
        self.pending_fine
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Applies a signed delta and returns the resulting balance. A delta that would drive the
    /// balance negative is refused and leaves the balance untouched.
    pub(crate) fn apply_delta(&mut self, delta: Money) -> Result<Money, Money> {
        let next = self.balance + delta;
        if next < Decimal::ZERO {
            return Err(self.balance);
        }
        self.balance = next;
        Ok(next)
    }

    pub(crate) fn add_pending_fine(&mut self, amount: Money) {
        self.pending_fine += amount;
    }

    pub(crate) fn set_blocked(&mut self, blocked: bool) {
        self.blocked = blocked;
    }
}

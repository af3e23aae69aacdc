//! Wallet registration, listings and admin moderation of users and settings.

use rust_decimal::Decimal;
use tracing::info;

use crate::{
    Error,
    domain::{
        Item, ItemId, ItemStatus, ListingType, Money, Reference, Role, Settings, TransactionKind,
        User, UserId,
    },
    engine::{
        Marketplace, authenticate, authenticate_admin,
        ledger::{self, Posting},
    },
    error::{conflicting_state, forbidden, validation_error},
    sinks::AdminActionKind,
    store::Store,
};

impl<S: Store> Marketplace<S> {
    /// Opens a wallet for a user issued by the identity provider. A non-zero opening balance is
    /// booked as a deposit so that the ledger always explains the balance.
    pub fn register_user(
        &self,
        id: UserId,
        role: Role,
        opening_balance: Money,
    ) -> Result<User, Error> {
        self.execute(|tables, _, now| {
            if opening_balance < Decimal::ZERO {
                return Err(validation_error(format!(
                    "opening balance cannot be negative, got {opening_balance}"
                )));
            }
            tables.insert_user(User::new(id, role))?;
            if opening_balance > Decimal::ZERO {
                ledger::post(
                    tables,
                    Posting::credit_from_system(
                        id,
                        opening_balance,
                        TransactionKind::Deposit,
                        Reference::Opening,
                    ),
                    now,
                )?;
            }
            info!(user = %id, role = %role, balance = %opening_balance, "user registered");
            Ok(tables.user(id)?.clone())
        })
    }

    /// Lists an item. For rentals `price` is per day.
    pub fn list_item(
        &self,
        id: ItemId,
        owner: UserId,
        price: Money,
        listing: ListingType,
    ) -> Result<Item, Error> {
        self.execute(|tables, _, _| {
            authenticate(tables, owner)?;
            if price <= Decimal::ZERO {
                return Err(validation_error(format!(
                    "price must be positive, got {price}"
                )));
            }
            tables.insert_item(Item::new(id, owner, price, listing))?;
            info!(item = %id, owner = %owner, price = %price, listing = %listing, "item listed");
            Ok(tables.item(id)?.clone())
        })
    }

    /// Takes an item off the market. Not possible while a booking holds it or once it is sold.
    pub fn deactivate_item(&self, id: ItemId, owner: UserId) -> Result<Item, Error> {
        self.execute(|tables, _, _| {
            authenticate(tables, owner)?;
            let item = tables.item(id)?;
            if item.owner() != owner {
                return Err(forbidden(owner, format!("not the owner of item {id}")));
            }
            if let Some(holder) = tables
                .bookings()
                .find(|b| b.item() == id && b.status().holds_item())
            {
                return Err(conflicting_state(
                    "item",
                    id,
                    item.status(),
                    format!("held by booking {} ({})", holder.id(), holder.status()),
                ));
            }
            if matches!(item.status(), ItemStatus::Sold | ItemStatus::Inactive) {
                return Err(conflicting_state("item", id, item.status(), "cannot deactivate"));
            }

            let item = tables.item_mut(id)?;
            item.set_status(ItemStatus::Inactive);
            info!(item = %id, "item deactivated");
            Ok(item.clone())
        })
    }

    /// Blocks or unblocks a user. Blocked users keep receiving money but cannot move it.
    pub fn set_user_blocked(
        &self,
        user: UserId,
        blocked: bool,
        admin: UserId,
    ) -> Result<User, Error> {
        self.execute(|tables, outbox, _| {
            authenticate_admin(tables, admin)?;
            let wallet = tables.user_mut(user)?;
            wallet.set_blocked(blocked);
            let wallet = wallet.clone();

            let (kind, verb) = if blocked {
                (AdminActionKind::BlockUser, "blocked")
            } else {
                (AdminActionKind::UnblockUser, "unblocked")
            };
            outbox.admin_action(admin, kind, Some(user), format!("user {user} {verb}"));
            outbox.notify(user, format!("Your account was {verb} by an admin"));
            Ok(wallet)
        })
    }

    pub fn update_settings(&self, settings: Settings, admin: UserId) -> Result<Settings, Error> {
        self.execute(|tables, outbox, _| {
            authenticate_admin(tables, admin)?;
            settings.validate()?;
            tables.set_settings(settings.clone());

            outbox.admin_action(
                admin,
                AdminActionKind::UpdateSettings,
                None,
                format!(
                    "sell service charge {}%, rent service charge {}%",
                    settings.sell_service_charge_percent(),
                    settings.rent_service_charge_percent()
                ),
            );
            Ok(settings)
        })
    }
}

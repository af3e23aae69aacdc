//! Immediate purchase of a sale listing.

use tracing::info;

use crate::{
    Error,
    domain::{
        Booking, ItemId, ItemStatus, ListingType, Reference, Transaction, TransactionKind, UserId,
    },
    engine::{
        Marketplace, authenticate_active,
        ledger::{self, Transfer},
    },
    error::{conflicting_state, forbidden},
    store::Store,
};

impl<S: Store> Marketplace<S> {
    /// Buys an AVAILABLE sale listing outright. The buyer pays the full price; the seller is
    /// credited the price minus the sell service charge, which is recorded on both ledger entries
    /// and not transferred anywhere. Returns the buyer's ledger entry.
    pub fn buy_item(&self, item_id: ItemId, buyer: UserId) -> Result<Transaction, Error> {
        self.execute(|tables, outbox, now| {
            authenticate_active(tables, buyer)?;
            let item = tables.item(item_id)?.clone();
            if item.owner() == buyer {
                return Err(forbidden(buyer, format!("cannot buy own item {item_id}")));
            }
            if item.listing() != ListingType::Sell {
                return Err(conflicting_state(
                    "item",
                    item_id,
                    item.status(),
                    format!("listed for {}, not for sale", item.listing()),
                ));
            }
            if item.status() != ItemStatus::Available {
                return Err(conflicting_state(
                    "item",
                    item_id,
                    item.status(),
                    "not available for purchase",
                ));
            }

            let price = item.price();
            let fee = tables.settings()?.sell_fee(price);
            ledger::ensure_funds(tables, buyer, price)?;

            let booking_id =
                tables.insert_booking(|id| Booking::purchase(id, &item, buyer, price - fee, now));
            let (debit, credit) = ledger::transfer(
                tables,
                Transfer {
                    from: buyer,
                    to: item.owner(),
                    debit: price,
                    fee,
                    kind: TransactionKind::Purchase,
                    item: Some(item_id),
                    reference: Reference::Booking(booking_id),
                },
                now,
            )?;
            tables.item_mut(item_id)?.set_status(ItemStatus::Sold);

            outbox.notify(
                item.owner(),
                format!(
                    "Item {item_id} was sold for {price} coins; {} credited after a {fee} coin service charge",
                    credit.amount()
                ),
            );
            outbox.notify(buyer, format!("You bought item {item_id} for {price} coins"));
            info!(
                item = %item_id,
                booking = %booking_id,
                buyer = %buyer,
                price = %price,
                fee = %fee,
                "item bought"
            );
            Ok(debit)
        })
    }
}

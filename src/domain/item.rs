//! Listed items

use serde::Serialize;

use crate::domain::{ItemId, Money, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListingType {
    Rent,
    Sell,
}

closed_enum!(ListingType, "listing type", {
    Rent => "RENT",
    Sell => "SELL",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    Available,
    Booked,
    Sold,
    Expired,
    Inactive,
}

closed_enum!(ItemStatus, "item status", {
    Available => "AVAILABLE",
    Booked => "BOOKED",
    Sold => "SOLD",
    Expired => "EXPIRED",
    Inactive => "INACTIVE",
});

/// An item listed by its owner. For rent listings the price is per day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    id: ItemId,
    owner: UserId,
    price: Money,
    listing: ListingType,
    status: ItemStatus,
}

impl Item {
    pub(crate) fn new(id: ItemId, owner: UserId, price: Money, listing: ListingType) -> Self {
        Self {
            id,
            owner,
            price,
            listing,
            status: ItemStatus::Available,
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn owner(&self) -> UserId {
        self.owner
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn listing(&self) -> ListingType {
        self.listing
    }

    pub fn status(&self) -> ItemStatus {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: ItemStatus) {
        self.status = status;
    }
}

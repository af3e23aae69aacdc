//! System-wide settings record

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::{Error, domain::Money, error::validation_error};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    sell_service_charge_percent: Decimal,
    rent_service_charge_percent: Decimal,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sell_service_charge_percent: Decimal::from(5),
            rent_service_charge_percent: Decimal::ZERO,
        }
    }
}

impl Settings {
    /// The single settings row lives under this id.
    pub const GLOBAL_ID: u32 = 1;

    pub fn new(
        sell_service_charge_percent: Decimal,
        rent_service_charge_percent: Decimal,
    ) -> Result<Self, Error> {
        let settings = Self {
            sell_service_charge_percent,
            rent_service_charge_percent,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        for (name, percent) in [
            ("sell service charge", self.sell_service_charge_percent),
            ("rent service charge", self.rent_service_charge_percent),
        ] {
            if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
                return Err(validation_error(format!(
                    "{name} must be between 0 and 100 percent, got {percent}"
                )));
            }
        }
        Ok(())
    }

    /// Percentage of a sale price withheld from the seller's payout.
    pub fn sell_service_charge_percent(&self) -> Decimal {
        self.sell_service_charge_percent
    }

    /// Percentage of the rent reported on a rental. Nothing is withheld from the owner.
    pub fn rent_service_charge_percent(&self) -> Decimal {
        self.rent_service_charge_percent
    }

    /// The platform spread on a sale, rounded to cents.
    pub fn sell_fee(&self, price: Money) -> Money {
        charge(price, self.sell_service_charge_percent)
    }

    /// The service charge reported for a rental costing `rent`, rounded to cents.
    pub fn rent_fee(&self, rent: Money) -> Money {
        charge(rent, self.rent_service_charge_percent)
    }
}

// The rate is at most one, so the product never exceeds `amount`.
fn charge(amount: Money, percent: Decimal) -> Money {
    (percent / Decimal::ONE_HUNDRED * amount)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

//! Module for process configuration read from the environment

use anyhow::{Context, Result};
use rust_decimal::Decimal;

use crate::domain::Settings;

const SELL_CHARGE_VAR: &str = "SELL_SERVICE_CHARGE_PERCENT";
const RENT_CHARGE_VAR: &str = "RENT_SERVICE_CHARGE_PERCENT";

/// Startup configuration. Seeds the settings record of a fresh store; afterwards the record is
/// the source of truth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub settings: Settings,
}

impl Config {
    /// Reads `SELL_SERVICE_CHARGE_PERCENT` and `RENT_SERVICE_CHARGE_PERCENT`, falling back to the
    /// default settings for unset variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Settings::default();
        let sell = percent(
            &lookup,
            SELL_CHARGE_VAR,
            defaults.sell_service_charge_percent(),
        )?;
        let rent = percent(
            &lookup,
            RENT_CHARGE_VAR,
            defaults.rent_service_charge_percent(),
        )?;
        let settings = Settings::new(sell, rent)?;
        Ok(Self { settings })
    }
}

fn percent(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Decimal,
) -> Result<Decimal> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<Decimal>()
            .with_context(|| format!("{key} is not a decimal: {raw}")),
        None => Ok(default),
    }
}

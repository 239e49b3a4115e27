//! Shipping price calculator.
//!
//! Two quoting modes: by weight (tiered somoni rate per kilogram) and by
//! volume (flat dollar rate per cubic meter). The rates mirror the published
//! tariff card shown on the info screen; keep the two in sync when prices
//! change.

use serde::{Deserialize, Serialize};

/// Weight at or below which the base per-kilogram rate applies
pub const WEIGHT_TIER_LIMIT_KG: f64 = 30.0;
/// Somoni per kilogram up to the tier limit
pub const WEIGHT_RATE_BASE: f64 = 30.0;
/// Somoni per kilogram above the tier limit
pub const WEIGHT_RATE_BULK: f64 = 28.0;
/// Dollars per cubic meter
pub const VOLUME_RATE: f64 = 280.0;

/// Calculator mode a user has selected
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalcMode {
    ByWeight,
    ByVolume,
}

/// A priced quote for a given amount
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quote {
    pub amount: f64,
    pub unit_price: f64,
    pub total: f64,
}

/// Price an amount in the given mode
pub fn quote(mode: CalcMode, amount: f64) -> Quote {
    let unit_price = match mode {
        CalcMode::ByWeight if amount <= WEIGHT_TIER_LIMIT_KG => WEIGHT_RATE_BASE,
        CalcMode::ByWeight => WEIGHT_RATE_BULK,
        CalcMode::ByVolume => VOLUME_RATE,
    };
    Quote {
        amount,
        unit_price,
        total: amount * unit_price,
    }
}

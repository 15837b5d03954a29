// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Engine configuration.
//!
//! Every field has a default, so a partial JSON document (or an empty one)
//! is a valid configuration:
//!
//! ```json
//! {
//!   "silver_discount_pct": 5,
//!   "gold_discount_pct": 10,
//!   "loyalty": { "earn_rate": 10, "redemption_rate": 100,
//!                "silver_threshold": 1000, "gold_threshold": 5000 },
//!   "receipt_footer": "Thank you for staying with us!"
//! }
//! ```
//!
//! The same fields can be overridden through `RESERVATION_*` environment
//! variables, see [`EngineConfig::from_env`].

use crate::ReservationError;
use crate::pricing::DiscountSchedule;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Points earned and redeemed per currency unit, and tier thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoyaltyPolicy {
    /// Points earned per unit spent.
    pub earn_rate: u64,
    /// Points worth one unit of currency on redemption.
    pub redemption_rate: u64,
    pub silver_threshold: u64,
    pub gold_threshold: u64,
}

impl Default for LoyaltyPolicy {
    fn default() -> Self {
        Self {
            earn_rate: 10,
            redemption_rate: 100,
            silver_threshold: 1000,
            gold_threshold: 5000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub silver_discount_pct: u8,
    pub gold_discount_pct: u8,
    pub loyalty: LoyaltyPolicy,
    /// Closing line printed at the bottom of every receipt.
    pub receipt_footer: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            silver_discount_pct: 5,
            gold_discount_pct: 10,
            loyalty: LoyaltyPolicy::default(),
            receipt_footer: None,
        }
    }
}

impl EngineConfig {
    /// Parses and validates a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, ReservationError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ReservationError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `RESERVATION_SILVER_DISCOUNT_PCT`,
    /// `RESERVATION_GOLD_DISCOUNT_PCT`, `RESERVATION_EARN_RATE`,
    /// `RESERVATION_REDEMPTION_RATE`, `RESERVATION_SILVER_THRESHOLD`,
    /// `RESERVATION_GOLD_THRESHOLD` and `RESERVATION_RECEIPT_FOOTER`.
    pub fn from_env() -> Result<Self, ReservationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ReservationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        override_from(&lookup, "RESERVATION_SILVER_DISCOUNT_PCT", &mut config.silver_discount_pct)?;
        override_from(&lookup, "RESERVATION_GOLD_DISCOUNT_PCT", &mut config.gold_discount_pct)?;
        override_from(&lookup, "RESERVATION_EARN_RATE", &mut config.loyalty.earn_rate)?;
        override_from(&lookup, "RESERVATION_REDEMPTION_RATE", &mut config.loyalty.redemption_rate)?;
        override_from(&lookup, "RESERVATION_SILVER_THRESHOLD", &mut config.loyalty.silver_threshold)?;
        override_from(&lookup, "RESERVATION_GOLD_THRESHOLD", &mut config.loyalty.gold_threshold)?;
        if let Some(footer) = lookup("RESERVATION_RECEIPT_FOOTER") {
            config.receipt_footer = Some(footer);
        }
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// - [`ReservationError::InvalidDiscount`] - a discount is above 100%.
    /// - [`ReservationError::InvalidConfig`] - zero redemption rate, or the Silver
    ///   threshold is not below the Gold threshold.
    pub fn validate(&self) -> Result<(), ReservationError> {
        self.discounts()?;
        if self.loyalty.redemption_rate == 0 {
            return Err(ReservationError::InvalidConfig(
                "redemption_rate must be positive".into(),
            ));
        }
        if self.loyalty.silver_threshold >= self.loyalty.gold_threshold {
            return Err(ReservationError::InvalidConfig(format!(
                "silver_threshold {} must be below gold_threshold {}",
                self.loyalty.silver_threshold, self.loyalty.gold_threshold
            )));
        }
        Ok(())
    }

    pub fn discounts(&self) -> Result<DiscountSchedule, ReservationError> {
        DiscountSchedule::new(
            Decimal::from(self.silver_discount_pct),
            Decimal::from(self.gold_discount_pct),
        )
    }
}

fn override_from<F, T>(lookup: &F, key: &str, target: &mut T) -> Result<(), ReservationError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(raw) = lookup(key) {
        *target = raw
            .trim()
            .parse()
            .map_err(|_| ReservationError::InvalidConfig(format!("{key}: cannot parse {raw:?}")))?;
    }
    Ok(())
}

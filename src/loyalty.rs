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

//! Loyalty points ledger.
//!
//! The membership tier is never stored independently of the balance: it is
//! recomputed from the balance after every credit and debit.
//!
//! ```text
//!  Bronze [0, 1000) ──► Silver [1000, 5000) ──► Gold [5000, ∞)
//! ```
//!
//! # Example
//!
//! ```
//! use reservation_ledger_rs::{GuestId, LoyaltyAccount, LoyaltyPolicy, Tier};
//! use rust_decimal_macros::dec;
//!
//! let account = LoyaltyAccount::new(GuestId(1), LoyaltyPolicy::default());
//! assert_eq!(account.earn_points(dec!(100)).unwrap(), 1000);
//! assert_eq!(account.tier(), Tier::Silver);
//! ```

use crate::ReservationError;
use crate::base::GuestId;
use crate::config::LoyaltyPolicy;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
}

impl Tier {
    /// Tier for a balance. Pure: depends on nothing but its arguments.
    pub fn for_points(points: u64, policy: &LoyaltyPolicy) -> Self {
        if points >= policy.gold_threshold {
            Tier::Gold
        } else if points >= policy.silver_threshold {
            Tier::Silver
        } else {
            Tier::Bronze
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::Bronze => "Bronze",
            Tier::Silver => "Silver",
            Tier::Gold => "Gold",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
struct LoyaltyData {
    guest_id: GuestId,
    points: u64,
    tier: Tier,
}

impl LoyaltyData {
    fn new(guest_id: GuestId, policy: &LoyaltyPolicy) -> Self {
        Self {
            guest_id,
            points: 0,
            tier: Tier::for_points(0, policy),
        }
    }

    fn assert_invariants(&self, policy: &LoyaltyPolicy) {
        debug_assert_eq!(
            self.tier,
            Tier::for_points(self.points, policy),
            "Invariant violated: tier {} does not match balance {}",
            self.tier,
            self.points
        );
    }

    fn credit(&mut self, points: u64, policy: &LoyaltyPolicy) -> Result<(), ReservationError> {
        self.points = self
            .points
            .checked_add(points)
            .ok_or(ReservationError::InvalidAmount(Decimal::from(points)))?;
        self.tier = Tier::for_points(self.points, policy);
        self.assert_invariants(policy);
        Ok(())
    }

    fn debit(&mut self, points: u64, policy: &LoyaltyPolicy) -> Result<(), ReservationError> {
        if points > self.points {
            return Err(ReservationError::InsufficientPoints {
                requested: points,
                available: self.points,
            });
        }
        self.points -= points;
        self.tier = Tier::for_points(self.points, policy);
        self.assert_invariants(policy);
        Ok(())
    }
}

/// A guest's loyalty account.
///
/// All mutation goes through the inner lock, so concurrent earn/redeem calls
/// on the same account are serialized.
#[derive(Debug)]
pub struct LoyaltyAccount {
    policy: LoyaltyPolicy,
    inner: Mutex<LoyaltyData>,
}

impl LoyaltyAccount {
    pub fn new(guest_id: GuestId, policy: LoyaltyPolicy) -> Self {
        Self {
            inner: Mutex::new(LoyaltyData::new(guest_id, &policy)),
            policy,
        }
    }

    pub fn guest_id(&self) -> GuestId {
        self.inner.lock().guest_id
    }

    pub fn points(&self) -> u64 {
        self.inner.lock().points
    }

    pub fn tier(&self) -> Tier {
        self.inner.lock().tier
    }

    /// Balance and tier read under one lock.
    pub fn snapshot(&self) -> (u64, Tier) {
        let data = self.inner.lock();
        (data.points, data.tier)
    }

    /// Credits `floor(amount × earn_rate)` points and returns how many were earned.
    ///
    /// # Errors
    ///
    /// [`ReservationError::InvalidAmount`] if `amount` is negative or the
    /// balance would overflow.
    pub fn earn_points(&self, amount: Decimal) -> Result<u64, ReservationError> {
        if amount < Decimal::ZERO {
            return Err(ReservationError::InvalidAmount(amount));
        }
        let earned = amount
            .checked_mul(Decimal::from(self.policy.earn_rate))
            .and_then(|points| points.floor().to_u64())
            .ok_or(ReservationError::InvalidAmount(amount))?;

        self.inner.lock().credit(earned, &self.policy)?;
        Ok(earned)
    }

    /// Debits `points` and returns their currency value
    /// (`points / redemption_rate`, 100 points = 1 unit by default).
    ///
    /// # Errors
    ///
    /// [`ReservationError::InsufficientPoints`] if `points` exceeds the balance;
    /// the balance is left unchanged.
    pub fn redeem_points(&self, points: u64) -> Result<Decimal, ReservationError> {
        let value = Decimal::from(points)
            .checked_div(Decimal::from(self.policy.redemption_rate))
            .ok_or_else(|| {
                ReservationError::InvalidConfig("redemption_rate must be positive".into())
            })?;
        self.inner.lock().debit(points, &self.policy)?;
        Ok(value)
    }
}

impl Serialize for LoyaltyAccount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let data = self.inner.lock();
        let mut state = serializer.serialize_struct("LoyaltyAccount", 3)?;
        state.serialize_field("guest", &data.guest_id)?;
        state.serialize_field("points", &data.points)?;
        state.serialize_field("tier", &data.tier)?;
        state.end()
    }
}

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

//! Invoice computation and loyalty discounts.
//!
//! ```text
//! base     = nights × nightly rate
//! total    = base + Σ service charges
//! final    = total − total × discount / 100   (rounded to cents, half away from zero)
//! ```
//!
//! # Example
//!
//! ```
//! use reservation_ledger_rs::{BookingId, DiscountSchedule, Invoice, Tier};
//! use rust_decimal_macros::dec;
//!
//! let schedule = DiscountSchedule::default();
//! let discount = schedule.for_tier(Some(Tier::Gold));
//! let invoice = Invoice::for_stay(BookingId::new(), 3, dec!(100), dec!(75), discount).unwrap();
//! assert_eq!(invoice.total(), dec!(375));
//! assert_eq!(invoice.final_amount(), dec!(337.50));
//! ```

use crate::ReservationError;
use crate::base::{BookingId, InvoiceId};
use crate::loyalty::Tier;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

const HUNDRED: Decimal = dec!(100);

fn check_discount(discount_pct: Decimal) -> Result<(), ReservationError> {
    if discount_pct < Decimal::ZERO || discount_pct > HUNDRED {
        return Err(ReservationError::InvalidDiscount(discount_pct));
    }
    Ok(())
}

/// Discount percentage granted per loyalty tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscountSchedule {
    silver: Decimal,
    gold: Decimal,
}

impl DiscountSchedule {
    /// # Errors
    ///
    /// [`ReservationError::InvalidDiscount`] if either percentage is outside 0-100.
    pub fn new(silver: Decimal, gold: Decimal) -> Result<Self, ReservationError> {
        check_discount(silver)?;
        check_discount(gold)?;
        Ok(Self { silver, gold })
    }

    /// Guests that are not enrolled, and Bronze members, pay full price.
    pub fn for_tier(&self, tier: Option<Tier>) -> Decimal {
        match tier {
            Some(Tier::Gold) => self.gold,
            Some(Tier::Silver) => self.silver,
            Some(Tier::Bronze) | None => Decimal::ZERO,
        }
    }
}

impl Default for DiscountSchedule {
    fn default() -> Self {
        Self {
            silver: dec!(5),
            gold: dec!(10),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum InvoiceStatus {
    Pending,
    Paid,
}

//  Pending ──settled by a Completed payment──► Paid
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invoice {
    id: InvoiceId,
    booking_id: BookingId,
    total: Decimal,
    discount_pct: Decimal,
    final_amount: Decimal,
    status: InvoiceStatus,
}

impl Invoice {
    /// Amounts are rounded to this many decimal places.
    pub const CURRENCY_SCALE: u32 = 2;

    /// A pending, undiscounted invoice.
    pub fn new(booking_id: BookingId, total: Decimal) -> Self {
        Self {
            id: InvoiceId::from(booking_id),
            booking_id,
            total,
            discount_pct: Decimal::ZERO,
            final_amount: Self::round(total),
            status: InvoiceStatus::Pending,
        }
    }

    /// Prices a stay and applies the discount.
    ///
    /// # Errors
    ///
    /// - [`ReservationError::InvalidAmount`] - the total does not fit in a `Decimal`.
    /// - [`ReservationError::InvalidDiscount`] - `discount_pct` is outside 0-100.
    pub fn for_stay(
        booking_id: BookingId,
        nights: i64,
        rate: Decimal,
        service_charges: Decimal,
        discount_pct: Decimal,
    ) -> Result<Self, ReservationError> {
        let total = Decimal::from(nights)
            .checked_mul(rate)
            .and_then(|base| base.checked_add(service_charges))
            .ok_or(ReservationError::InvalidAmount(rate))?;
        let mut invoice = Self::new(booking_id, total);
        invoice.apply_discount(discount_pct)?;
        Ok(invoice)
    }

    /// Replaces the discount and recomputes the final amount.
    ///
    /// # Errors
    ///
    /// - [`ReservationError::InvalidDiscount`] - `discount_pct` is outside 0-100.
    /// - [`ReservationError::InvalidAmount`] - the discount overflows on this total.
    ///
    /// On error the invoice is left unchanged.
    pub fn apply_discount(&mut self, discount_pct: Decimal) -> Result<(), ReservationError> {
        check_discount(discount_pct)?;
        let discounted = self
            .total
            .checked_mul(discount_pct)
            .and_then(|scaled| scaled.checked_div(HUNDRED))
            .and_then(|discount| self.total.checked_sub(discount))
            .ok_or(ReservationError::InvalidAmount(self.total))?;
        self.discount_pct = discount_pct;
        self.final_amount = Self::round(discounted);
        debug_assert!(
            self.final_amount <= Self::round(self.total),
            "Invariant violated: final amount {} exceeds total {}",
            self.final_amount,
            self.total
        );
        Ok(())
    }

    pub fn id(&self) -> InvoiceId {
        self.id
    }

    pub fn booking_id(&self) -> BookingId {
        self.booking_id
    }

    /// Pre-discount total.
    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn discount_pct(&self) -> Decimal {
        self.discount_pct
    }

    pub fn final_amount(&self) -> Decimal {
        self.final_amount
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn is_paid(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }

    /// Pending → Paid. Returns `false` if already paid.
    pub(crate) fn mark_paid(&mut self) -> bool {
        if self.is_paid() {
            return false;
        }
        self.status = InvoiceStatus::Paid;
        true
    }

    fn round(amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(Self::CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero)
    }
}

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

//! Per-room availability calendar.
//!
//! Every range is half-open: `[check_in, check_out)`. The check-out date is
//! never claimed, so a stay ending on the 5th and one starting on the 5th do
//! not conflict.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use reservation_ledger_rs::AvailabilityCalendar;
//!
//! let day = |d| NaiveDate::from_ymd_opt(2025, 1, d).unwrap();
//! let mut calendar = AvailabilityCalendar::new();
//! calendar.reserve(day(3), day(5)).unwrap();
//! assert!(!calendar.is_available(day(4), day(6)).unwrap());
//! assert!(calendar.is_available(day(5), day(7)).unwrap());
//! ```

use crate::ReservationError;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Rejects empty and inverted ranges.
pub(crate) fn validate_range(
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> Result<(), ReservationError> {
    if check_out <= check_in {
        return Err(ReservationError::InvalidRange {
            check_in,
            check_out,
        });
    }
    Ok(())
}

/// Yields every night in `[check_in, check_out)`, stepping one calendar day at a time.
fn nights(check_in: NaiveDate, check_out: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    check_in.iter_days().take_while(move |day| *day < check_out)
}

/// Mapping of date to free (`true`) or occupied (`false`).
///
/// Dates without an entry are free.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailabilityCalendar {
    days: HashMap<NaiveDate, bool>,
}

impl AvailabilityCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` iff at least one night in the range is occupied.
    ///
    /// # Errors
    ///
    /// [`ReservationError::InvalidRange`] if `check_out <= check_in`.
    pub fn is_available(
        &self,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<bool, ReservationError> {
        validate_range(check_in, check_out)?;
        Ok(nights(check_in, check_out).all(|day| self.is_free_on(day)))
    }

    /// Returns whether a single night is free.
    pub fn is_free_on(&self, day: NaiveDate) -> bool {
        self.days.get(&day).copied().unwrap_or(true)
    }

    /// Marks every night in the range occupied. Already occupied nights stay occupied.
    pub fn reserve(
        &mut self,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<(), ReservationError> {
        self.mark(check_in, check_out, false)
    }

    /// Marks every night in the range free. Already free nights stay free.
    pub fn release(
        &mut self,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<(), ReservationError> {
        self.mark(check_in, check_out, true)
    }

    /// Occupied nights in ascending order.
    pub fn occupied_dates(&self) -> Vec<NaiveDate> {
        let mut occupied: Vec<NaiveDate> = self
            .days
            .iter()
            .filter(|(_, free)| !**free)
            .map(|(day, _)| *day)
            .collect();
        occupied.sort_unstable();
        occupied
    }

    fn mark(
        &mut self,
        check_in: NaiveDate,
        check_out: NaiveDate,
        free: bool,
    ) -> Result<(), ReservationError> {
        validate_range(check_in, check_out)?;
        for day in nights(check_in, check_out) {
            self.days.insert(day, free);
        }
        Ok(())
    }
}

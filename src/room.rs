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

//! Rooms and their categories.
//!
//! Shared attributes (number, nightly rate, amenities, calendar) live on
//! [`Room`]; category-specific ones live on the [`RoomCategory`] variant.
//!
//! # Example
//!
//! ```
//! use reservation_ledger_rs::{Room, RoomCategory, RoomNumber, SuiteTier};
//! use rust_decimal_macros::dec;
//!
//! let room = Room::new(
//!     RoomNumber(501),
//!     RoomCategory::Suite { tier: SuiteTier::Executive },
//!     dec!(420.00),
//! )
//! .unwrap();
//! assert_eq!(room.upgrades().len(), 2);
//! ```

use crate::ReservationError;
use crate::base::RoomNumber;
use crate::calendar::AvailabilityCalendar;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BedType {
    Twin,
    Full,
    Queen,
    King,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuiteTier {
    Junior,
    Executive,
    Presidential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomCategory {
    Single {
        bed_type: BedType,
    },
    /// `extra_bed_requested` flips once, and only when the room offers an extra bed.
    Double {
        extra_bed_option: bool,
        extra_bed_requested: bool,
    },
    Suite {
        tier: SuiteTier,
    },
}

impl RoomCategory {
    /// A double room with no extra bed requested yet.
    pub fn double(extra_bed_option: bool) -> Self {
        Self::Double {
            extra_bed_option,
            extra_bed_requested: false,
        }
    }
}

impl fmt::Display for RoomCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single { .. } => write!(f, "Single"),
            Self::Double { .. } => write!(f, "Double"),
            Self::Suite { .. } => write!(f, "Suite"),
        }
    }
}

/// Priced add-on offered by a suite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Upgrade {
    pub name: &'static str,
    pub price: Decimal,
}

#[derive(Debug, Clone)]
pub struct Room {
    number: RoomNumber,
    category: RoomCategory,
    rate: Decimal,
    amenities: Vec<String>,
    calendar: AvailabilityCalendar,
}

impl Room {
    /// Creates a room with an empty calendar.
    ///
    /// # Errors
    ///
    /// [`ReservationError::InvalidAmount`] if the nightly rate is negative.
    pub fn new(
        number: RoomNumber,
        category: RoomCategory,
        rate: Decimal,
    ) -> Result<Self, ReservationError> {
        if rate < Decimal::ZERO {
            return Err(ReservationError::InvalidAmount(rate));
        }
        Ok(Self {
            number,
            category,
            rate,
            amenities: Vec::new(),
            calendar: AvailabilityCalendar::new(),
        })
    }

    pub fn with_amenities<I, S>(mut self, amenities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.amenities.extend(amenities.into_iter().map(Into::into));
        self
    }

    pub fn number(&self) -> RoomNumber {
        self.number
    }

    pub fn category(&self) -> RoomCategory {
        self.category
    }

    pub fn rate(&self) -> Decimal {
        self.rate
    }

    pub fn amenities(&self) -> &[String] {
        &self.amenities
    }

    pub fn calendar(&self) -> &AvailabilityCalendar {
        &self.calendar
    }

    pub fn set_rate(&mut self, rate: Decimal) -> Result<(), ReservationError> {
        if rate < Decimal::ZERO {
            return Err(ReservationError::InvalidAmount(rate));
        }
        self.rate = rate;
        Ok(())
    }

    /// Requests the extra bed of a double room.
    ///
    /// Returns `true` only for the first request on a room that offers one.
    pub fn request_extra_bed(&mut self) -> bool {
        match &mut self.category {
            RoomCategory::Double {
                extra_bed_option: true,
                extra_bed_requested,
            } if !*extra_bed_requested => {
                *extra_bed_requested = true;
                true
            }
            _ => false,
        }
    }

    /// Upgrade catalog. Empty for anything but suites.
    pub fn upgrades(&self) -> Vec<Upgrade> {
        match self.category {
            RoomCategory::Suite {
                tier: SuiteTier::Executive,
            } => vec![
                Upgrade {
                    name: "Business Services",
                    price: dec!(100.00),
                },
                Upgrade {
                    name: "Airport Transfer",
                    price: dec!(80.00),
                },
            ],
            RoomCategory::Suite { .. } => vec![Upgrade {
                name: "Premium Service",
                price: dec!(150.00),
            }],
            _ => Vec::new(),
        }
    }

    /// Check-then-reserve. The caller holds exclusive access to the room, which
    /// makes the pair atomic with respect to other admissions and cancellations.
    pub(crate) fn admit(
        &mut self,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<(), ReservationError> {
        if !self.calendar.is_available(check_in, check_out)? {
            return Err(ReservationError::RoomUnavailable(self.number));
        }
        self.calendar.reserve(check_in, check_out)
    }

    pub(crate) fn release(
        &mut self,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<(), ReservationError> {
        self.calendar.release(check_in, check_out)
    }
}

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

//! Error types for reservation processing.
//!
//! Payment rejections (insufficient amount, unknown method) are not errors:
//! they are recorded as a failed [`PaymentStatus`](crate::PaymentStatus).

use crate::base::{BookingId, GuestId, InvoiceId, PaymentId, RoomNumber, ServiceId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Reservation processing errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReservationError {
    /// Check-out is not strictly after check-in
    #[error("check-out {check_out} must be after check-in {check_in}")]
    InvalidRange {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },

    /// At least one requested night is already occupied
    #[error("room {0} is not available for the requested dates")]
    RoomUnavailable(RoomNumber),

    /// Operation is not allowed on a cancelled booking
    #[error("booking {0} is cancelled")]
    InvalidState(BookingId),

    /// Discount percentage outside 0-100
    #[error("discount must be between 0 and 100 percent, got {0}")]
    InvalidDiscount(Decimal),

    /// Redemption exceeds the points balance
    #[error("insufficient points: requested {requested}, available {available}")]
    InsufficientPoints { requested: u64, available: u64 },

    /// Amount is negative or out of range
    #[error("invalid amount {0}")]
    InvalidAmount(Decimal),

    #[error("room {0} not found")]
    RoomNotFound(RoomNumber),

    #[error("room {0} already exists")]
    DuplicateRoom(RoomNumber),

    #[error("guest {0} not found")]
    GuestNotFound(GuestId),

    /// Guest has no loyalty account
    #[error("guest {0} is not enrolled in the loyalty program")]
    NotEnrolled(GuestId),

    #[error("booking {0} not found")]
    BookingNotFound(BookingId),

    #[error("service {0} not found")]
    ServiceNotFound(ServiceId),

    /// Invoice has not been generated for the booking
    #[error("invoice {0} not found")]
    InvoiceNotFound(InvoiceId),

    #[error("payment {0} not found")]
    PaymentNotFound(PaymentId),

    /// Configuration could not be parsed or is inconsistent
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

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

//! Core identifier types for guests, rooms, bookings, services, invoices and payments.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a guest, assigned by the surrounding guest directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct GuestId(pub u32);

impl fmt::Display for GuestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Room number within the property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RoomNumber(pub u16);

impl fmt::Display for RoomNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generates a fresh random (v4) identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a booking.
    BookingId
);

uuid_id!(
    /// Unique identifier for a service request attached to a booking.
    ServiceId
);

uuid_id!(
    /// Unique identifier for a payment attempt.
    PaymentId
);

/// Invoice identifier.
///
/// A booking has at most one invoice, so the invoice id is derived from the
/// booking id and renders as `INV-<booking id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct InvoiceId(pub BookingId);

impl InvoiceId {
    pub fn booking_id(&self) -> BookingId {
        self.0
    }
}

impl From<BookingId> for InvoiceId {
    fn from(booking_id: BookingId) -> Self {
        Self(booking_id)
    }
}

impl fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "INV-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(BookingId::new(), BookingId::new());
        assert_ne!(PaymentId::new(), PaymentId::new());
    }

    #[test]
    fn invoice_id_is_derived_from_booking_id() {
        let booking_id = BookingId(Uuid::nil());
        let invoice_id = InvoiceId::from(booking_id);
        assert_eq!(invoice_id.booking_id(), booking_id);
        assert_eq!(
            invoice_id.to_string(),
            "INV-00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn numeric_ids_display_plainly() {
        assert_eq!(GuestId(7).to_string(), "7");
        assert_eq!(RoomNumber(101).to_string(), "101");
    }
}

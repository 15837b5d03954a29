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

//! Domain events emitted by the engine.
//!
//! The engine keeps no durable state. Every state transition is published as a
//! [`LedgerEvent`] so the surrounding application can persist it.

use crate::base::{BookingId, GuestId, InvoiceId, PaymentId, RoomNumber, ServiceId};
use crate::loyalty::Tier;
use crate::payment::PaymentStatus;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    BookingConfirmed {
        booking_id: BookingId,
        guest_id: GuestId,
        room_number: RoomNumber,
        check_in: NaiveDate,
        check_out: NaiveDate,
    },
    BookingCancelled {
        booking_id: BookingId,
        room_number: RoomNumber,
    },
    ServiceAdded {
        booking_id: BookingId,
        service_id: ServiceId,
        charge: Decimal,
    },
    ServiceCompleted {
        booking_id: BookingId,
        service_id: ServiceId,
    },
    InvoiceIssued {
        invoice_id: InvoiceId,
        total: Decimal,
        discount_pct: Decimal,
        final_amount: Decimal,
    },
    PaymentRecorded {
        payment_id: PaymentId,
        invoice_id: InvoiceId,
        amount: Decimal,
        status: PaymentStatus,
    },
    PointsEarned {
        guest_id: GuestId,
        points: u64,
        balance: u64,
        tier: Tier,
    },
    PointsRedeemed {
        guest_id: GuestId,
        points: u64,
        balance: u64,
        tier: Tier,
    },
}

impl LedgerEvent {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BookingConfirmed { .. } => "booking_confirmed",
            Self::BookingCancelled { .. } => "booking_cancelled",
            Self::ServiceAdded { .. } => "service_added",
            Self::ServiceCompleted { .. } => "service_completed",
            Self::InvoiceIssued { .. } => "invoice_issued",
            Self::PaymentRecorded { .. } => "payment_recorded",
            Self::PointsEarned { .. } => "points_earned",
            Self::PointsRedeemed { .. } => "points_redeemed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let event = LedgerEvent::BookingCancelled {
            booking_id: BookingId(uuid::Uuid::nil()),
            room_number: RoomNumber(12),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "booking_cancelled");
        assert_eq!(json["room_number"], 12);
        assert_eq!(json["type"], event.kind());
    }
}

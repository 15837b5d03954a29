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

//! The engine's view of a guest: loyalty enrollment and booking history.
//! Profile data (name, contact details) belongs to the guest directory.

use crate::base::{BookingId, GuestId};
use crate::config::LoyaltyPolicy;
use crate::loyalty::LoyaltyAccount;
use std::sync::Arc;

#[derive(Debug)]
pub struct Guest {
    id: GuestId,
    loyalty: Option<Arc<LoyaltyAccount>>,
    bookings: Vec<BookingId>,
}

impl Guest {
    pub fn new(id: GuestId) -> Self {
        Self {
            id,
            loyalty: None,
            bookings: Vec::new(),
        }
    }

    pub fn id(&self) -> GuestId {
        self.id
    }

    /// Booking ids in creation order.
    pub fn bookings(&self) -> &[BookingId] {
        &self.bookings
    }

    pub fn loyalty(&self) -> Option<&Arc<LoyaltyAccount>> {
        self.loyalty.as_ref()
    }

    pub fn is_enrolled(&self) -> bool {
        self.loyalty.is_some()
    }

    /// Opens a loyalty account. Returns `false` if one already exists.
    pub(crate) fn enroll(&mut self, policy: LoyaltyPolicy) -> bool {
        if self.loyalty.is_some() {
            return false;
        }
        self.loyalty = Some(Arc::new(LoyaltyAccount::new(self.id, policy)));
        true
    }

    pub(crate) fn record_booking(&mut self, booking_id: BookingId) {
        self.bookings.push(booking_id);
    }
}

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

//! Bookings and the services attached to them.
//!
//! ```text
//!  Booking:  Confirmed ──cancel──► Cancelled (terminal)
//!  Service:  Requested ──complete──► Completed (terminal)
//! ```
//!
//! A booking refers to its guest and room by identifier only; the engine owns
//! the guest → bookings index.

use crate::ReservationError;
use crate::base::{BookingId, GuestId, RoomNumber, ServiceId};
use crate::calendar::validate_range;
use crate::pricing::Invoice;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ServiceStatus {
    Requested,
    Completed,
}

/// Extra service (room service, spa, laundry...) charged to a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceRequest {
    id: ServiceId,
    service_type: String,
    description: String,
    charge: Decimal,
    status: ServiceStatus,
    requested_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl ServiceRequest {
    /// # Errors
    ///
    /// [`ReservationError::InvalidAmount`] if `charge` is negative.
    pub fn new(
        service_type: impl Into<String>,
        description: impl Into<String>,
        charge: Decimal,
        requested_at: DateTime<Utc>,
    ) -> Result<Self, ReservationError> {
        if charge < Decimal::ZERO {
            return Err(ReservationError::InvalidAmount(charge));
        }
        Ok(Self {
            id: ServiceId::new(),
            service_type: service_type.into(),
            description: description.into(),
            charge,
            status: ServiceStatus::Requested,
            requested_at,
            completed_at: None,
        })
    }

    pub fn id(&self) -> ServiceId {
        self.id
    }

    pub fn service_type(&self) -> &str {
        &self.service_type
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn charge(&self) -> Decimal {
        self.charge
    }

    pub fn status(&self) -> ServiceStatus {
        self.status
    }

    pub fn requested_at(&self) -> DateTime<Utc> {
        self.requested_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Requested → Completed. Returns `false` if already completed.
    pub fn complete(&mut self, at: DateTime<Utc>) -> bool {
        if self.status == ServiceStatus::Completed {
            return false;
        }
        self.status = ServiceStatus::Completed;
        self.completed_at = Some(at);
        true
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Booking {
    id: BookingId,
    guest_id: GuestId,
    room_number: RoomNumber,
    check_in: NaiveDate,
    check_out: NaiveDate,
    status: BookingStatus,
    services: Vec<ServiceRequest>,
    /// Generated once, then pinned.
    invoice: Option<Invoice>,
}

impl Booking {
    /// A confirmed booking with no services and no invoice.
    ///
    /// # Errors
    ///
    /// [`ReservationError::InvalidRange`] if `check_out <= check_in`.
    pub fn new(
        id: BookingId,
        guest_id: GuestId,
        room_number: RoomNumber,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<Self, ReservationError> {
        validate_range(check_in, check_out)?;
        Ok(Self {
            id,
            guest_id,
            room_number,
            check_in,
            check_out,
            status: BookingStatus::Confirmed,
            services: Vec::new(),
            invoice: None,
        })
    }

    pub fn id(&self) -> BookingId {
        self.id
    }

    pub fn guest_id(&self) -> GuestId {
        self.guest_id
    }

    pub fn room_number(&self) -> RoomNumber {
        self.room_number
    }

    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    pub fn status(&self) -> BookingStatus {
        self.status
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == BookingStatus::Cancelled
    }

    pub fn services(&self) -> &[ServiceRequest] {
        &self.services
    }

    pub fn invoice(&self) -> Option<&Invoice> {
        self.invoice.as_ref()
    }

    /// Whole nights between check-in and check-out. Always at least 1.
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    /// Sum of every service charge, completed or not.
    ///
    /// # Errors
    ///
    /// [`ReservationError::InvalidAmount`] if the sum does not fit in a `Decimal`.
    pub fn service_charges(&self) -> Result<Decimal, ReservationError> {
        self.services.iter().try_fold(Decimal::ZERO, |sum, service| {
            sum.checked_add(service.charge())
                .ok_or(ReservationError::InvalidAmount(service.charge()))
        })
    }

    pub(crate) fn add_service(
        &mut self,
        service: ServiceRequest,
    ) -> Result<ServiceId, ReservationError> {
        if self.is_cancelled() {
            return Err(ReservationError::InvalidState(self.id));
        }
        let id = service.id();
        self.services.push(service);
        Ok(id)
    }

    pub(crate) fn complete_service(
        &mut self,
        service_id: ServiceId,
        at: DateTime<Utc>,
    ) -> Result<bool, ReservationError> {
        self.services
            .iter_mut()
            .find(|service| service.id() == service_id)
            .map(|service| service.complete(at))
            .ok_or(ReservationError::ServiceNotFound(service_id))
    }

    /// Confirmed → Cancelled. Returns `false` if already cancelled.
    pub(crate) fn cancel(&mut self) -> bool {
        if self.is_cancelled() {
            return false;
        }
        self.status = BookingStatus::Cancelled;
        true
    }

    /// Returns the pinned invoice, generating it on first call.
    ///
    /// The flag is `true` when the invoice was generated by this call.
    pub(crate) fn issue_invoice(
        &mut self,
        rate: Decimal,
        discount_pct: Decimal,
    ) -> Result<(Invoice, bool), ReservationError> {
        if let Some(invoice) = &self.invoice {
            return Ok((invoice.clone(), false));
        }
        let invoice = Invoice::for_stay(
            self.id,
            self.nights(),
            rate,
            self.service_charges()?,
            discount_pct,
        )?;
        self.invoice = Some(invoice.clone());
        Ok((invoice, true))
    }

    pub(crate) fn invoice_mut(&mut self) -> Option<&mut Invoice> {
        self.invoice.as_mut()
    }
}

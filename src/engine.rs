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

//! Reservation engine.
//!
//! The [`Engine`] is the in-process entry point: it owns the room, guest,
//! booking and payment registries and runs the booking lifecycle.
//!
//! # Lifecycle
//!
//! - **Admission**: check the room calendar and reserve the nights, atomically per room.
//! - **Services**: attach charges to a confirmed booking.
//! - **Invoicing**: price the stay once, discounted by the guest's loyalty tier.
//! - **Payment**: settle the invoice, then credit loyalty points.
//! - **Cancellation**: free the booked nights. Invoices, payments and points stay.
//!
//! # Thread Safety
//!
//! Registries are [`DashMap`]s, so work on different rooms, bookings and
//! guests proceeds in parallel. A room's calendar is only touched while its
//! entry is held exclusively, which makes check-then-reserve atomic. The
//! engine never holds two registry guards at the same time.

use crate::ReservationError;
use crate::base::{BookingId, GuestId, InvoiceId, PaymentId, RoomNumber, ServiceId};
use crate::booking::{Booking, ServiceRequest};
use crate::clock::{Clock, SystemClock};
use crate::config::{EngineConfig, LoyaltyPolicy};
use crate::event::LedgerEvent;
use crate::event_queue::EventQueue;
use crate::guest::Guest;
use crate::loyalty::{LoyaltyAccount, Tier};
use crate::payment::{Payment, PaymentStatus};
use crate::pricing::{DiscountSchedule, Invoice};
use crate::room::{Room, Upgrade};
use chrono::NaiveDate;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use dashmap::mapref::one::Ref;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of [`Engine::process_payment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentResult {
    pub payment: Payment,
    pub receipt: String,
    /// Points credited to the guest; `None` unless the payment completed
    /// and the guest is enrolled.
    pub points_earned: Option<u64>,
}

impl PaymentResult {
    pub fn status(&self) -> PaymentStatus {
        self.payment.status()
    }
}

/// Reservation engine managing rooms, guests, bookings and payments.
///
/// # Invariants
///
/// - No two confirmed bookings of a room share a night.
/// - Check-out is strictly after check-in.
/// - A booking's invoice is generated once and never recomputed.
/// - An invoice is settled by at most one payment.
/// - A loyalty tier always matches its points balance.
pub struct Engine {
    rooms: DashMap<RoomNumber, Room>,
    guests: DashMap<GuestId, Guest>,
    bookings: DashMap<BookingId, Booking>,
    payments: DashMap<PaymentId, Payment>,
    events: EventQueue,
    discounts: DiscountSchedule,
    loyalty_policy: LoyaltyPolicy,
    receipt_footer: Option<String>,
    clock: Arc<dyn Clock>,
}

impl Engine {
    /// Creates an engine with the default configuration.
    pub fn new() -> Self {
        Self::build(
            &EngineConfig::default(),
            DiscountSchedule::default(),
            Arc::new(SystemClock),
        )
    }

    /// # Errors
    ///
    /// Returns the validation error of an inconsistent configuration.
    pub fn with_config(config: EngineConfig) -> Result<Self, ReservationError> {
        config.validate()?;
        let discounts = config.discounts()?;
        Ok(Self::build(&config, discounts, Arc::new(SystemClock)))
    }

    /// Replaces the time source used for payment and service timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn build(config: &EngineConfig, discounts: DiscountSchedule, clock: Arc<dyn Clock>) -> Self {
        Engine {
            rooms: DashMap::new(),
            guests: DashMap::new(),
            bookings: DashMap::new(),
            payments: DashMap::new(),
            events: EventQueue::new(),
            discounts,
            loyalty_policy: config.loyalty,
            receipt_footer: config.receipt_footer.clone(),
            clock,
        }
    }

    // === Rooms ===

    /// # Errors
    ///
    /// [`ReservationError::DuplicateRoom`] if the room number is taken.
    pub fn add_room(&self, room: Room) -> Result<(), ReservationError> {
        let number = room.number();
        match self.rooms.entry(number) {
            Entry::Occupied(_) => Err(ReservationError::DuplicateRoom(number)),
            Entry::Vacant(entry) => {
                info!(room = %number, category = %room.category(), rate = %room.rate(), "room added");
                entry.insert(room);
                Ok(())
            }
        }
    }

    pub fn room(&self, number: RoomNumber) -> Option<Ref<'_, RoomNumber, Room>> {
        self.rooms.get(&number)
    }

    pub fn set_room_rate(&self, number: RoomNumber, rate: Decimal) -> Result<(), ReservationError> {
        self.room_mut(number)?.set_rate(rate)
    }

    /// Requests the extra bed of a double room. See [`Room::request_extra_bed`].
    pub fn request_extra_bed(&self, number: RoomNumber) -> Result<bool, ReservationError> {
        Ok(self.room_mut(number)?.request_extra_bed())
    }

    pub fn room_upgrades(&self, number: RoomNumber) -> Result<Vec<Upgrade>, ReservationError> {
        let room = self
            .rooms
            .get(&number)
            .ok_or(ReservationError::RoomNotFound(number))?;
        Ok(room.upgrades())
    }

    pub fn is_room_available(
        &self,
        number: RoomNumber,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<bool, ReservationError> {
        let room = self
            .rooms
            .get(&number)
            .ok_or(ReservationError::RoomNotFound(number))?;
        room.calendar().is_available(check_in, check_out)
    }

    fn room_mut(
        &self,
        number: RoomNumber,
    ) -> Result<dashmap::mapref::one::RefMut<'_, RoomNumber, Room>, ReservationError> {
        self.rooms
            .get_mut(&number)
            .ok_or(ReservationError::RoomNotFound(number))
    }

    // === Guests ===

    /// Makes a guest known to the engine. Returns `false` if already registered.
    pub fn register_guest(&self, guest_id: GuestId) -> bool {
        match self.guests.entry(guest_id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(Guest::new(guest_id));
                true
            }
        }
    }

    pub fn guest(&self, guest_id: GuestId) -> Option<Ref<'_, GuestId, Guest>> {
        self.guests.get(&guest_id)
    }

    /// Opens a loyalty account. Returns `false` if the guest is already enrolled.
    pub fn enroll_loyalty(&self, guest_id: GuestId) -> Result<bool, ReservationError> {
        let mut guest = self
            .guests
            .get_mut(&guest_id)
            .ok_or(ReservationError::GuestNotFound(guest_id))?;
        let enrolled = guest.enroll(self.loyalty_policy);
        if enrolled {
            info!(guest = %guest_id, "guest enrolled in loyalty program");
        }
        Ok(enrolled)
    }

    /// Handle to the guest's loyalty account.
    ///
    /// # Errors
    ///
    /// - [`ReservationError::GuestNotFound`] - unknown guest.
    /// - [`ReservationError::NotEnrolled`] - guest has no loyalty account.
    pub fn loyalty_account(&self, guest_id: GuestId) -> Result<Arc<LoyaltyAccount>, ReservationError> {
        let guest = self
            .guests
            .get(&guest_id)
            .ok_or(ReservationError::GuestNotFound(guest_id))?;
        guest
            .loyalty()
            .cloned()
            .ok_or(ReservationError::NotEnrolled(guest_id))
    }

    /// Booking ids of a guest, oldest first.
    pub fn guest_history(&self, guest_id: GuestId) -> Result<Vec<BookingId>, ReservationError> {
        let guest = self
            .guests
            .get(&guest_id)
            .ok_or(ReservationError::GuestNotFound(guest_id))?;
        Ok(guest.bookings().to_vec())
    }

    /// Current tier, `None` when the guest is unknown or not enrolled.
    fn loyalty_tier(&self, guest_id: GuestId) -> Option<Tier> {
        let account = self.guests.get(&guest_id)?.loyalty().cloned()?;
        Some(account.tier())
    }

    // === Loyalty ===

    /// Credits points for `amount` spent. See [`LoyaltyAccount::earn_points`].
    pub fn earn_points(&self, guest_id: GuestId, amount: Decimal) -> Result<u64, ReservationError> {
        let account = self.loyalty_account(guest_id)?;
        let before = account.tier();
        let earned = account.earn_points(amount)?;
        let (balance, tier) = account.snapshot();

        if tier != before {
            info!(guest = %guest_id, from = %before, to = %tier, "loyalty tier changed");
        }
        debug!(guest = %guest_id, earned, balance, "points earned");
        self.events.push(LedgerEvent::PointsEarned {
            guest_id,
            points: earned,
            balance,
            tier,
        });
        Ok(earned)
    }

    /// Redeems points for a currency discount. See [`LoyaltyAccount::redeem_points`].
    pub fn redeem_points(&self, guest_id: GuestId, points: u64) -> Result<Decimal, ReservationError> {
        let account = self.loyalty_account(guest_id)?;
        let before = account.tier();
        let value = account.redeem_points(points)?;
        let (balance, tier) = account.snapshot();

        if tier != before {
            info!(guest = %guest_id, from = %before, to = %tier, "loyalty tier changed");
        }
        info!(guest = %guest_id, points, %value, balance, "points redeemed");
        self.events.push(LedgerEvent::PointsRedeemed {
            guest_id,
            points,
            balance,
            tier,
        });
        Ok(value)
    }

    // === Bookings ===

    /// Admits a booking if every night in `[check_in, check_out)` is free.
    ///
    /// # Errors
    ///
    /// - [`ReservationError::InvalidRange`] - check-out is not after check-in.
    /// - [`ReservationError::GuestNotFound`] / [`ReservationError::RoomNotFound`] - unknown ids.
    /// - [`ReservationError::RoomUnavailable`] - a night is already taken.
    pub fn create_booking(
        &self,
        guest_id: GuestId,
        room_number: RoomNumber,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<BookingId, ReservationError> {
        let booking = Booking::new(BookingId::new(), guest_id, room_number, check_in, check_out)?;
        if !self.guests.contains_key(&guest_id) {
            return Err(ReservationError::GuestNotFound(guest_id));
        }

        // Admission: check and reserve under the room's exclusive guard.
        {
            let mut room = self.room_mut(room_number)?;
            if let Err(e) = room.admit(check_in, check_out) {
                debug!(room = %room_number, %check_in, %check_out, error = %e, "admission rejected");
                return Err(e);
            }
        }

        // Confirm before the booking becomes visible, so no event about it
        // can be queued ahead of this one.
        let booking_id = booking.id();
        info!(booking = %booking_id, guest = %guest_id, room = %room_number, %check_in, %check_out, "booking confirmed");
        self.events.push(LedgerEvent::BookingConfirmed {
            booking_id,
            guest_id,
            room_number,
            check_in,
            check_out,
        });

        self.bookings.insert(booking_id, booking);
        if let Some(mut guest) = self.guests.get_mut(&guest_id) {
            guest.record_booking(booking_id);
        }
        Ok(booking_id)
    }

    /// Cancels a confirmed booking and frees its nights.
    ///
    /// Returns `false`, changing nothing, if the booking is already cancelled.
    pub fn cancel_booking(&self, booking_id: BookingId) -> Result<bool, ReservationError> {
        let (room_number, check_in, check_out) = {
            let mut booking = self.booking_mut(booking_id)?;
            if !booking.cancel() {
                debug!(booking = %booking_id, "booking already cancelled");
                return Ok(false);
            }
            (booking.room_number(), booking.check_in(), booking.check_out())
        };

        // The nights stay occupied until released here, so no other booking
        // can have claimed them in between.
        self.room_mut(room_number)?.release(check_in, check_out)?;

        info!(booking = %booking_id, room = %room_number, %check_in, %check_out, "booking cancelled");
        self.events.push(LedgerEvent::BookingCancelled {
            booking_id,
            room_number,
        });
        Ok(true)
    }

    pub fn booking(&self, booking_id: BookingId) -> Option<Ref<'_, BookingId, Booking>> {
        self.bookings.get(&booking_id)
    }

    /// Number of nights booked.
    pub fn stay_duration(&self, booking_id: BookingId) -> Result<i64, ReservationError> {
        let booking = self
            .bookings
            .get(&booking_id)
            .ok_or(ReservationError::BookingNotFound(booking_id))?;
        Ok(booking.nights())
    }

    fn booking_mut(
        &self,
        booking_id: BookingId,
    ) -> Result<dashmap::mapref::one::RefMut<'_, BookingId, Booking>, ReservationError> {
        self.bookings
            .get_mut(&booking_id)
            .ok_or(ReservationError::BookingNotFound(booking_id))
    }

    // === Services ===

    /// Attaches a service charge to a booking.
    ///
    /// # Errors
    ///
    /// - [`ReservationError::InvalidState`] - the booking is cancelled.
    /// - [`ReservationError::InvalidAmount`] - the charge is negative.
    pub fn add_service(
        &self,
        booking_id: BookingId,
        service_type: &str,
        description: &str,
        charge: Decimal,
    ) -> Result<ServiceId, ReservationError> {
        let service = ServiceRequest::new(service_type, description, charge, self.clock.now())?;
        let service_id = self.booking_mut(booking_id)?.add_service(service)?;

        debug!(booking = %booking_id, service = %service_id, service_type, %charge, "service added");
        self.events.push(LedgerEvent::ServiceAdded {
            booking_id,
            service_id,
            charge,
        });
        Ok(service_id)
    }

    /// Marks a service completed. Returns `false` if it already was.
    pub fn complete_service(
        &self,
        booking_id: BookingId,
        service_id: ServiceId,
    ) -> Result<bool, ReservationError> {
        let completed = self
            .booking_mut(booking_id)?
            .complete_service(service_id, self.clock.now())?;
        if completed {
            self.events.push(LedgerEvent::ServiceCompleted {
                booking_id,
                service_id,
            });
        }
        Ok(completed)
    }

    // === Invoicing ===

    /// Returns the booking's invoice, generating it on the first call.
    ///
    /// The discount comes from the guest's tier at generation time. Later
    /// calls return the pinned invoice even if services, rates or tiers changed.
    pub fn generate_invoice(&self, booking_id: BookingId) -> Result<Invoice, ReservationError> {
        let (guest_id, room_number) = {
            let booking = self
                .bookings
                .get(&booking_id)
                .ok_or(ReservationError::BookingNotFound(booking_id))?;
            if let Some(invoice) = booking.invoice() {
                return Ok(invoice.clone());
            }
            (booking.guest_id(), booking.room_number())
        };

        let rate = self
            .rooms
            .get(&room_number)
            .ok_or(ReservationError::RoomNotFound(room_number))?
            .rate();
        let tier = self.loyalty_tier(guest_id);
        let discount_pct = self.discounts.for_tier(tier);

        // Another thread may have issued the invoice meanwhile; issue_invoice
        // then hands back that one.
        let (invoice, issued) = self.booking_mut(booking_id)?.issue_invoice(rate, discount_pct)?;
        if issued {
            info!(
                invoice = %invoice.id(),
                total = %invoice.total(),
                discount_pct = %invoice.discount_pct(),
                final_amount = %invoice.final_amount(),
                "invoice issued"
            );
            self.events.push(LedgerEvent::InvoiceIssued {
                invoice_id: invoice.id(),
                total: invoice.total(),
                discount_pct: invoice.discount_pct(),
                final_amount: invoice.final_amount(),
            });
        }
        Ok(invoice)
    }

    /// Current state of a generated invoice.
    pub fn invoice(&self, invoice_id: InvoiceId) -> Result<Invoice, ReservationError> {
        self.bookings
            .get(&invoice_id.booking_id())
            .and_then(|booking| booking.invoice().cloned())
            .ok_or(ReservationError::InvoiceNotFound(invoice_id))
    }

    // === Payments ===

    /// Evaluates a payment against an invoice.
    ///
    /// A rejected payment is returned as `Ok` with a failed status. When the
    /// payment completes and the guest is enrolled, points are earned on the
    /// invoice's final amount.
    ///
    /// # Errors
    ///
    /// - [`ReservationError::InvoiceNotFound`] - no such invoice was generated.
    /// - [`ReservationError::InvalidAmount`] - negative tendered amount.
    ///
    /// Points that cannot be credited are logged and reported as `None`; the
    /// settlement stands.
    pub fn process_payment(
        &self,
        invoice_id: InvoiceId,
        amount: Decimal,
        method: &str,
    ) -> Result<PaymentResult, ReservationError> {
        let mut payment = Payment::new(invoice_id, amount, method, self.clock.now())?;

        // The booking guard serializes every payment against this invoice.
        let (status, guest_id, final_amount) = {
            let mut booking = self
                .bookings
                .get_mut(&invoice_id.booking_id())
                .ok_or(ReservationError::InvoiceNotFound(invoice_id))?;
            let guest_id = booking.guest_id();
            let invoice = booking
                .invoice_mut()
                .ok_or(ReservationError::InvoiceNotFound(invoice_id))?;
            let status = payment.process(invoice);
            (status, guest_id, invoice.final_amount())
        };

        match status {
            PaymentStatus::Completed => {
                info!(payment = %payment.id(), invoice = %invoice_id, %amount, method, "payment completed")
            }
            _ => {
                warn!(payment = %payment.id(), invoice = %invoice_id, %amount, method, %status, "payment rejected")
            }
        }
        self.payments.insert(payment.id(), payment.clone());
        self.events.push(LedgerEvent::PaymentRecorded {
            payment_id: payment.id(),
            invoice_id,
            amount,
            status,
        });

        let enrolled = self
            .guests
            .get(&guest_id)
            .is_some_and(|guest| guest.is_enrolled());
        // The invoice is already settled, so a failed credit must not turn
        // the payment into an error.
        let points_earned = if status == PaymentStatus::Completed && enrolled {
            match self.earn_points(guest_id, final_amount) {
                Ok(points) => Some(points),
                Err(e) => {
                    warn!(guest = %guest_id, invoice = %invoice_id, error = %e, "points not credited");
                    None
                }
            }
        } else {
            None
        };

        let receipt = payment.receipt(self.receipt_footer.as_deref());
        Ok(PaymentResult {
            payment,
            receipt,
            points_earned,
        })
    }

    pub fn payment(&self, payment_id: PaymentId) -> Option<Ref<'_, PaymentId, Payment>> {
        self.payments.get(&payment_id)
    }

    /// Receipt text of a recorded payment.
    pub fn generate_receipt(&self, payment_id: PaymentId) -> Result<String, ReservationError> {
        let payment = self
            .payments
            .get(&payment_id)
            .ok_or(ReservationError::PaymentNotFound(payment_id))?;
        Ok(payment.receipt(self.receipt_footer.as_deref()))
    }

    // === Events ===

    /// Removes and returns every event emitted so far, oldest first.
    pub fn drain_events(&self) -> Vec<LedgerEvent> {
        self.events.drain()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

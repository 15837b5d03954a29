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

//! # Reservation Ledger
//!
//! This library provides the core of a hotel reservation system: room
//! availability, the booking lifecycle, invoicing with loyalty discounts,
//! payment settlement and the loyalty points ledger.
//!
//! ## Core Components
//!
//! - [`Engine`]: Central processor owning rooms, guests, bookings and payments
//! - [`AvailabilityCalendar`]: Per-room night occupancy
//! - [`Invoice`]: Priced stay with a tier discount
//! - [`Payment`]: Settlement attempt against an invoice
//! - [`LoyaltyAccount`]: Points balance and tier of an enrolled guest
//! - [`ReservationError`]: Error types for reservation processing failures
//!
//! ## Example
//!
//! ```
//! use reservation_ledger_rs::{Engine, GuestId, PaymentStatus, Room, RoomCategory, RoomNumber, SuiteTier};
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//!
//! let engine = Engine::new();
//! let suite = RoomCategory::Suite { tier: SuiteTier::Junior };
//! engine.add_room(Room::new(RoomNumber(101), suite, dec!(250)).unwrap()).unwrap();
//! engine.register_guest(GuestId(1));
//!
//! let check_in = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//! let check_out = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
//! let booking = engine.create_booking(GuestId(1), RoomNumber(101), check_in, check_out).unwrap();
//!
//! let invoice = engine.generate_invoice(booking).unwrap();
//! assert_eq!(invoice.final_amount(), dec!(750));
//!
//! let result = engine.process_payment(invoice.id(), dec!(750), "Cash").unwrap();
//! assert_eq!(result.status(), PaymentStatus::Completed);
//! ```
//!
//! ## Thread Safety
//!
//! The engine handles concurrent access to rooms, bookings and guests. Two
//! overlapping bookings of the same room can never both be admitted, no
//! matter how their requests interleave.

mod base;
pub mod booking;
pub mod calendar;
pub mod clock;
pub mod config;
mod engine;
pub mod error;
pub mod event;
mod event_queue;
mod guest;
pub mod loyalty;
pub mod payment;
pub mod pricing;
pub mod room;

pub use base::{BookingId, GuestId, InvoiceId, PaymentId, RoomNumber, ServiceId};
pub use booking::{Booking, BookingStatus, ServiceRequest, ServiceStatus};
pub use calendar::AvailabilityCalendar;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{EngineConfig, LoyaltyPolicy};
pub use engine::{Engine, PaymentResult};
pub use error::ReservationError;
pub use event::LedgerEvent;
pub use event_queue::EventQueue;
pub use guest::Guest;
pub use loyalty::{LoyaltyAccount, Tier};
pub use payment::{Payment, PaymentFailure, PaymentMethod, PaymentStatus};
pub use pricing::{DiscountSchedule, Invoice, InvoiceStatus};
pub use room::{BedType, Room, RoomCategory, SuiteTier, Upgrade};

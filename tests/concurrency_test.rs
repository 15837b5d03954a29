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

//! Concurrency tests against the engine.
//!
//! Admission races must never double-book a room, settlement races must never
//! pay an invoice twice, and the locking patterns must never deadlock. The
//! parking_lot deadlock detector runs in the background while the engine is
//! hammered from many threads.

use chrono::{Days, NaiveDate};
use parking_lot::deadlock;
use reservation_ledger_rs::{
    BookingId, Engine, GuestId, LedgerEvent, PaymentFailure, PaymentStatus, ReservationError,
    Room, RoomCategory, RoomNumber, Tier,
};
use rust_decimal_macros::dec;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

// === Helper Functions ===

fn date(offset: u64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .checked_add_days(Days::new(offset))
        .unwrap()
}

fn engine_with_rooms(rooms: u16, guests: u32) -> Arc<Engine> {
    let engine = Engine::new();
    for number in 0..rooms {
        let room = Room::new(RoomNumber(number), RoomCategory::double(false), dec!(100)).unwrap();
        engine.add_room(room).unwrap();
    }
    for guest in 0..guests {
        engine.register_guest(GuestId(guest));
    }
    Arc::new(engine)
}

/// Starts a background thread that checks for deadlocks.
/// Returns a handle to stop the detector.
fn start_deadlock_detector() -> Arc<AtomicBool> {
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();

    thread::spawn(move || {
        while running_clone.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(100));
            let deadlocks = deadlock::check_deadlock();
            if !deadlocks.is_empty() {
                eprintln!("\n=== DEADLOCK DETECTED ===");
                for (i, threads) in deadlocks.iter().enumerate() {
                    eprintln!("\nDeadlock #{}", i + 1);
                    for t in threads {
                        eprintln!("Thread ID: {:?}", t.thread_id());
                        eprintln!("Backtrace:\n{:#?}", t.backtrace());
                    }
                }
                panic!("Deadlock detected! See output above for details.");
            }
        }
    });

    running
}

/// Stops the deadlock detector.
fn stop_deadlock_detector(running: Arc<AtomicBool>) {
    running.store(false, Ordering::SeqCst);
    thread::sleep(Duration::from_millis(150)); // Let detector thread exit
}

// === Admission Races ===

/// Identical ranges requested at the same instant: exactly one wins.
#[test]
fn identical_requests_admit_exactly_one() {
    const NUM_THREADS: u32 = 32;
    let engine = engine_with_rooms(1, NUM_THREADS);
    let barrier = Arc::new(Barrier::new(NUM_THREADS as usize));

    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|guest| {
            let engine = engine.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                engine.create_booking(GuestId(guest), RoomNumber(0), date(10), date(13))
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("Thread panicked"))
        .collect();

    let admitted = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(admitted, 1);
    for result in results.iter().filter(|result| result.is_err()) {
        assert_eq!(
            result,
            &Err(ReservationError::RoomUnavailable(RoomNumber(0)))
        );
    }

    let room = engine.room(RoomNumber(0)).unwrap();
    assert_eq!(
        room.calendar().occupied_dates(),
        vec![date(10), date(11), date(12)]
    );
}

/// Sliding, partially overlapping windows: admitted bookings never share a night.
#[test]
fn overlapping_windows_never_double_book() {
    const NUM_THREADS: u32 = 40;
    let engine = engine_with_rooms(1, NUM_THREADS);
    let barrier = Arc::new(Barrier::new(NUM_THREADS as usize));

    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|guest| {
            let engine = engine.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                let start = u64::from(guest % 20);
                barrier.wait();
                engine
                    .create_booking(GuestId(guest), RoomNumber(0), date(start), date(start + 3))
                    .ok()
            })
        })
        .collect();

    let admitted: Vec<BookingId> = handles
        .into_iter()
        .filter_map(|handle| handle.join().expect("Thread panicked"))
        .collect();
    assert!(!admitted.is_empty());

    let mut claimed = HashSet::new();
    for id in &admitted {
        let booking = engine.booking(*id).unwrap();
        for night in booking.check_in().iter_days().take_while(|d| *d < booking.check_out()) {
            assert!(claimed.insert(night), "night {night} booked twice");
        }
    }

    let occupied: HashSet<_> = engine
        .room(RoomNumber(0))
        .unwrap()
        .calendar()
        .occupied_dates()
        .into_iter()
        .collect();
    assert_eq!(occupied, claimed);
}

/// Cancellations and re-bookings of the same nights interleave safely.
#[test]
fn cancel_and_rebook_race() {
    const NUM_THREADS: u32 = 16;
    const ROUNDS: usize = 50;
    let engine = engine_with_rooms(1, NUM_THREADS);

    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|guest| {
            let engine = engine.clone();
            thread::spawn(move || {
                for _ in 0..ROUNDS {
                    if let Ok(id) =
                        engine.create_booking(GuestId(guest), RoomNumber(0), date(0), date(2))
                    {
                        // Nobody else may hold these nights while we do
                        assert_eq!(
                            engine.is_room_available(RoomNumber(0), date(0), date(2)),
                            Ok(false)
                        );
                        assert_eq!(engine.cancel_booking(id), Ok(true));
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    let room = engine.room(RoomNumber(0)).unwrap();
    assert!(room.calendar().occupied_dates().is_empty());
}

/// A booking cancelled as soon as it becomes visible is still announced
/// before its cancellation.
#[test]
fn confirmation_precedes_cancellation() {
    const BOOKINGS: u64 = 200;
    let engine = engine_with_rooms(1, 1);
    let done = Arc::new(AtomicBool::new(false));

    let creator = {
        let engine = engine.clone();
        let done = done.clone();
        thread::spawn(move || {
            for i in 0..BOOKINGS {
                engine
                    .create_booking(GuestId(0), RoomNumber(0), date(i), date(i + 1))
                    .unwrap();
            }
            done.store(true, Ordering::SeqCst);
        })
    };

    let canceller = {
        let engine = engine.clone();
        thread::spawn(move || {
            let mut cancelled = HashSet::new();
            loop {
                let finished = done.load(Ordering::SeqCst);
                for id in engine.guest_history(GuestId(0)).unwrap() {
                    if cancelled.insert(id) {
                        assert_eq!(engine.cancel_booking(id), Ok(true));
                    }
                }
                if finished {
                    break cancelled.len();
                }
                thread::yield_now();
            }
        })
    };

    creator.join().expect("Thread panicked");
    assert_eq!(canceller.join().expect("Thread panicked"), BOOKINGS as usize);

    let mut confirmed = HashSet::new();
    let mut cancels = 0;
    for event in engine.drain_events() {
        match event {
            LedgerEvent::BookingConfirmed { booking_id, .. } => {
                confirmed.insert(booking_id);
            }
            LedgerEvent::BookingCancelled { booking_id, .. } => {
                assert!(
                    confirmed.contains(&booking_id),
                    "{booking_id} cancelled before it was confirmed"
                );
                cancels += 1;
            }
            _ => {}
        }
    }
    assert_eq!(cancels, BOOKINGS);
}

// === Settlement Races ===

#[test]
fn concurrent_payments_settle_once() {
    const NUM_THREADS: usize = 24;
    let engine = engine_with_rooms(1, 1);
    engine.enroll_loyalty(GuestId(0)).unwrap();
    let booking = engine
        .create_booking(GuestId(0), RoomNumber(0), date(0), date(2))
        .unwrap();
    let invoice = engine.generate_invoice(booking).unwrap();
    let barrier = Arc::new(Barrier::new(NUM_THREADS));

    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|_| {
            let engine = engine.clone();
            let barrier = barrier.clone();
            let invoice_id = invoice.id();
            thread::spawn(move || {
                barrier.wait();
                engine.process_payment(invoice_id, dec!(200), "Cash").unwrap()
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("Thread panicked"))
        .collect();

    let completed = results
        .iter()
        .filter(|result| result.status() == PaymentStatus::Completed)
        .count();
    assert_eq!(completed, 1);
    assert!(results.iter().all(|result| {
        result.status() == PaymentStatus::Completed
            || result.status() == PaymentStatus::Failed(PaymentFailure::AlreadyPaid)
    }));

    // Points credited once
    assert_eq!(engine.loyalty_account(GuestId(0)).unwrap().points(), 2000);
}

#[test]
fn concurrent_invoice_generation_issues_once() {
    const NUM_THREADS: usize = 16;
    let engine = engine_with_rooms(1, 1);
    let booking = engine
        .create_booking(GuestId(0), RoomNumber(0), date(0), date(3))
        .unwrap();
    engine.drain_events();
    let barrier = Arc::new(Barrier::new(NUM_THREADS));

    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|_| {
            let engine = engine.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                engine.generate_invoice(booking).unwrap()
            })
        })
        .collect();

    let invoices: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("Thread panicked"))
        .collect();
    assert!(invoices.windows(2).all(|pair| pair[0] == pair[1]));

    let issued = engine
        .drain_events()
        .iter()
        .filter(|event| matches!(event, LedgerEvent::InvoiceIssued { .. }))
        .count();
    assert_eq!(issued, 1);
}

// === Deadlock Detection ===

/// Full lifecycles on many rooms, all guests sharing one loyalty account
/// hot spot, with readers walking the same entities.
#[test]
fn no_deadlock_mixed_lifecycle() {
    let detector = start_deadlock_detector();

    const NUM_ROOMS: u16 = 16;
    const OPS_PER_THREAD: u64 = 40;
    let engine = engine_with_rooms(NUM_ROOMS, 1);
    engine.enroll_loyalty(GuestId(0)).unwrap();

    let mut handles = Vec::new();

    for room in 0..NUM_ROOMS {
        let engine = engine.clone();
        handles.push(thread::spawn(move || {
            for i in 0..OPS_PER_THREAD {
                let check_in = date(i * 2);
                let booking = engine
                    .create_booking(GuestId(0), RoomNumber(room), check_in, date(i * 2 + 1))
                    .unwrap();
                engine.add_service(booking, "Minibar", "Water", dec!(5)).unwrap();
                let invoice = engine.generate_invoice(booking).unwrap();
                let paid = engine
                    .process_payment(invoice.id(), invoice.final_amount(), "Credit Card")
                    .unwrap();
                assert_eq!(paid.status(), PaymentStatus::Completed);
                if i % 4 == 0 {
                    assert_eq!(engine.cancel_booking(booking), Ok(true));
                }
            }
        }));
    }

    // Readers
    for room in 0..4 {
        let engine = engine.clone();
        handles.push(thread::spawn(move || {
            for i in 0..OPS_PER_THREAD * 5 {
                let _ = engine.is_room_available(RoomNumber(room), date(i), date(i + 1));
                let _ = engine.guest_history(GuestId(0));
                if let Ok(account) = engine.loyalty_account(GuestId(0)) {
                    let (points, tier) = account.snapshot();
                    assert_eq!(tier, Tier::for_points(points, &Default::default()));
                }
            }
        }));
    }

    // Redeemer competing for the hot account
    {
        let engine = engine.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..OPS_PER_THREAD * 2 {
                match engine.redeem_points(GuestId(0), 50) {
                    Ok(_) | Err(ReservationError::InsufficientPoints { .. }) => {}
                    Err(other) => panic!("unexpected error: {other}"),
                }
                thread::yield_now();
            }
        }));
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    stop_deadlock_detector(detector);

    let history = engine.guest_history(GuestId(0)).unwrap();
    assert_eq!(history.len(), NUM_ROOMS as usize * OPS_PER_THREAD as usize);
    let cancelled = history
        .iter()
        .filter(|id| engine.booking(**id).unwrap().is_cancelled())
        .count();
    assert_eq!(cancelled, NUM_ROOMS as usize * (OPS_PER_THREAD as usize / 4));
}

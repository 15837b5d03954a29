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

//! Benchmarks for the reservation engine.
//!
//! Run with: cargo bench
//!
//! Benchmarks include:
//! - Single-threaded booking admission and the full stay lifecycle
//! - Multi-threaded bookings on distinct rooms and on one contended room
//! - Loyalty updates on a shared account

use chrono::{Days, NaiveDate};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rayon::prelude::*;
use reservation_ledger_rs::{Engine, GuestId, Room, RoomCategory, RoomNumber, SuiteTier};
use rust_decimal::Decimal;
use std::sync::Arc;

// =============================================================================
// Helper Functions
// =============================================================================

fn night(offset: u64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .checked_add_days(Days::new(offset))
        .unwrap()
}

fn engine_with_rooms(rooms: u16) -> Engine {
    let engine = Engine::new();
    let category = RoomCategory::Suite {
        tier: SuiteTier::Junior,
    };
    for number in 0..rooms {
        let room = Room::new(RoomNumber(number), category, Decimal::new(18_000, 2)).unwrap();
        engine.add_room(room).unwrap();
    }
    engine.register_guest(GuestId(1));
    engine.enroll_loyalty(GuestId(1)).unwrap();
    engine
}

/// Books, invoices and pays a one-night stay.
fn full_stay(engine: &Engine, room: u16, offset: u64) {
    let booking = engine
        .create_booking(GuestId(1), RoomNumber(room), night(offset), night(offset + 1))
        .unwrap();
    engine
        .add_service(booking, "Room Service", "Breakfast", Decimal::new(2_500, 2))
        .unwrap();
    let invoice = engine.generate_invoice(booking).unwrap();
    engine
        .process_payment(invoice.id(), invoice.final_amount(), "CreditCard")
        .unwrap();
}

// =============================================================================
// Single-Threaded Benchmarks
// =============================================================================

fn bench_single_booking(c: &mut Criterion) {
    c.bench_function("single_booking", |b| {
        let engine = engine_with_rooms(1);
        let mut offset = 0u64;
        b.iter(|| {
            let booking = engine
                .create_booking(GuestId(1), RoomNumber(0), night(offset), night(offset + 1))
                .unwrap();
            offset += 1;
            black_box(booking);
        })
    });
}

fn bench_rejected_booking(c: &mut Criterion) {
    c.bench_function("rejected_booking", |b| {
        let engine = engine_with_rooms(1);
        engine
            .create_booking(GuestId(1), RoomNumber(0), night(0), night(14))
            .unwrap();
        b.iter(|| {
            let result =
                engine.create_booking(GuestId(1), RoomNumber(0), night(7), night(10));
            black_box(result.is_err());
        })
    });
}

fn bench_stay_lifecycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("stay_lifecycle");

    for count in [100u64, 1_000, 10_000].iter() {
        group.throughput(Throughput::Elements(*count));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            b.iter(|| {
                let engine = engine_with_rooms(1);
                for i in 0..count {
                    full_stay(&engine, 0, i);
                }
                black_box(engine.drain_events().len());
            })
        });
    }
    group.finish();
}

fn bench_book_and_cancel(c: &mut Criterion) {
    c.bench_function("book_and_cancel", |b| {
        let engine = engine_with_rooms(1);
        b.iter(|| {
            let booking = engine
                .create_booking(GuestId(1), RoomNumber(0), night(0), night(7))
                .unwrap();
            black_box(engine.cancel_booking(booking).unwrap());
        })
    });
}

// =============================================================================
// Multi-Threaded Benchmarks
// =============================================================================

fn bench_parallel_stays_different_rooms(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_stays_different_rooms");

    for rooms in [10u16, 100, 1_000].iter() {
        let stays_per_room = 20u64;
        group.throughput(Throughput::Elements(u64::from(*rooms) * stays_per_room));
        group.bench_with_input(BenchmarkId::from_parameter(rooms), rooms, |b, &rooms| {
            b.iter(|| {
                let engine = Arc::new(engine_with_rooms(rooms));
                (0..rooms).into_par_iter().for_each(|room| {
                    for i in 0..stays_per_room {
                        full_stay(&engine, room, i);
                    }
                });
                black_box(&engine);
            })
        });
    }
    group.finish();
}

fn bench_contended_room(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended_room");

    for count in [1_000u64, 10_000].iter() {
        group.throughput(Throughput::Elements(*count));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            b.iter(|| {
                let engine = Arc::new(engine_with_rooms(1));
                // Every request overlaps with its neighbours
                (0..count).into_par_iter().for_each(|i| {
                    let start = i % 365;
                    let _ = engine.create_booking(
                        GuestId(1),
                        RoomNumber(0),
                        night(start),
                        night(start + 2),
                    );
                });
                black_box(&engine);
            })
        });
    }
    group.finish();
}

fn bench_parallel_loyalty_same_guest(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_loyalty_same_guest");

    for count in [1_000u64, 10_000, 100_000].iter() {
        group.throughput(Throughput::Elements(*count));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            b.iter(|| {
                let engine = Arc::new(engine_with_rooms(0));
                (0..count).into_par_iter().for_each(|i| {
                    if i % 4 == 0 {
                        let _ = engine.redeem_points(GuestId(1), 5);
                    } else {
                        engine.earn_points(GuestId(1), Decimal::ONE).unwrap();
                    }
                });
                black_box(&engine);
            })
        });
    }
    group.finish();
}

criterion_group!(
    single_threaded,
    bench_single_booking,
    bench_rejected_booking,
    bench_stay_lifecycle,
    bench_book_and_cancel,
);

criterion_group!(
    multi_threaded,
    bench_parallel_stays_different_rooms,
    bench_contended_room,
    bench_parallel_loyalty_same_guest,
);

criterion_main!(single_threaded, multi_threaded);

//! Library, seat and time slot step definitions

use cucumber::{given, then, when};

use seatdesk::models::SeatQuery;

use crate::common::{SeatFixtures, TestApp};
use crate::features::support::TestWorld;

#[given(expr = "a library {string}")]
async fn library_exists(world: &mut TestWorld, name: String) {
    let app = TestApp::new().await;
    world.library = Some(app.create_library(&name).await);
    world.app = Some(app);
}

#[given(expr = "a daily seat {string}")]
async fn daily_seat_exists(world: &mut TestWorld, number: String) {
    let seat = world
        .app()
        .state
        .seats
        .create_seat(world.library_id(), &SeatFixtures::daily(&number))
        .await
        .expect("Failed to create seat");
    world.seats.insert(number, seat);
}

#[given(expr = "a monthly seat {string}")]
async fn monthly_seat_exists(world: &mut TestWorld, number: String) {
    let seat = world
        .app()
        .state
        .seats
        .create_seat(world.library_id(), &SeatFixtures::monthly(&number))
        .await
        .expect("Failed to create seat");
    world.seats.insert(number, seat);
}

#[given(expr = "a time slot from {string} to {string} priced {int}")]
async fn slot_exists(world: &mut TestWorld, start: String, end: String, price: u32) {
    let slot = world
        .app()
        .state
        .time_slots
        .create_time_slot(world.library_id(), &start, &end, f64::from(price))
        .await
        .expect("Failed to create time slot");
    world.slot = Some(slot);
}

#[given(expr = "a time slot from {string} to {string} priced {int} with seat {string}")]
async fn slot_with_seat_exists(
    world: &mut TestWorld,
    start: String,
    end: String,
    price: u32,
    number: String,
) {
    slot_exists(world, start, end, price).await;
    let slot = world
        .app()
        .state
        .time_slots
        .assign_seats(world.library_id(), world.slot_id(), &[world.seat_id(&number)])
        .await
        .expect("Failed to assign seat");
    world.slot = Some(slot);
}

#[when(expr = "the librarian creates a time slot from {string} to {string} priced {int}")]
async fn create_slot(world: &mut TestWorld, start: String, end: String, price: u32) {
    let result = world
        .app()
        .state
        .time_slots
        .create_time_slot(world.library_id(), &start, &end, f64::from(price))
        .await;
    if let Some(slot) = world.record(result) {
        world.slot = Some(slot);
    }
}

#[when(expr = "the librarian assigns seat {string} to the slot")]
async fn assign_seat(world: &mut TestWorld, number: String) {
    let result = world
        .app()
        .state
        .time_slots
        .assign_seats(world.library_id(), world.slot_id(), &[world.seat_id(&number)])
        .await;
    if let Some(slot) = world.record(result) {
        world.slot = Some(slot);
    }
}

#[when(expr = "the librarian creates daily seats {string}")]
async fn create_seats(world: &mut TestWorld, numbers: String) {
    let specs: Vec<_> = numbers
        .split(',')
        .map(|n| SeatFixtures::daily(n.trim()))
        .collect();
    let result = world
        .app()
        .state
        .seats
        .bulk_create_seats(world.library_id(), &specs)
        .await;
    if let Some(seats) = world.record(result) {
        for seat in seats {
            world.seats.insert(seat.seat_number.clone(), seat);
        }
    }
}

#[then(expr = "the library has {int} seat(s)")]
async fn seat_count(world: &mut TestWorld, expected: usize) {
    let seats = world
        .app()
        .state
        .seats
        .list_seats(world.library_id(), &SeatQuery::default())
        .await
        .expect("Failed to list seats");
    assert_eq!(seats.len(), expected);
}

#[then(expr = "seat {string} is available in the slot on {string}")]
async fn seat_available(world: &mut TestWorld, number: String, date: String) {
    assert!(is_available(world, &number, &date).await, "seat {} is taken", number);
}

#[then(expr = "seat {string} is not available in the slot on {string}")]
async fn seat_not_available(world: &mut TestWorld, number: String, date: String) {
    assert!(!is_available(world, &number, &date).await, "seat {} is free", number);
}

async fn is_available(world: &TestWorld, number: &str, date: &str) -> bool {
    let seat_id = world.seat_id(number);
    world
        .app()
        .state
        .time_slots
        .available_seats(world.library_id(), world.slot_id(), crate::common::date(date))
        .await
        .expect("Failed to list available seats")
        .iter()
        .any(|seat| seat.id == seat_id)
}

//! Booking step definitions

use cucumber::{given, then, when};

use crate::common::date;
use crate::features::support::TestWorld;

async fn book_daily(world: &mut TestWorld, name: &str, number: &str, on: &str) {
    let ctx = world.member(name);
    let result = world
        .app()
        .state
        .ledger
        .create_daily_booking(ctx, world.seat_id(number), world.slot_id(), date(on))
        .await;
    world.record_booking(name, result);
}

async fn book_monthly(world: &mut TestWorld, name: &str, number: &str, start: &str, end: &str) {
    let ctx = world.member(name);
    let result = world
        .app()
        .state
        .ledger
        .create_monthly_booking(ctx, world.seat_id(number), date(start), date(end), None)
        .await;
    world.record_booking(name, result);
}

#[given(expr = "{string} has booked seat {string} in the slot on {string}")]
async fn has_daily_booking(world: &mut TestWorld, name: String, number: String, on: String) {
    book_daily(world, &name, &number, &on).await;
    assert!(world.last_error.is_none(), "{:?}", world.last_error);
}

#[when(expr = "{string} books seat {string} in the slot on {string}")]
async fn books_daily(world: &mut TestWorld, name: String, number: String, on: String) {
    book_daily(world, &name, &number, &on).await;
}

#[given(expr = "{string} has booked seat {string} from {string} to {string}")]
async fn has_monthly_booking(
    world: &mut TestWorld,
    name: String,
    number: String,
    start: String,
    end: String,
) {
    book_monthly(world, &name, &number, &start, &end).await;
    assert!(world.last_error.is_none(), "{:?}", world.last_error);
}

#[when(expr = "{string} books seat {string} from {string} to {string}")]
async fn books_monthly(world: &mut TestWorld, name: String, number: String, start: String, end: String) {
    book_monthly(world, &name, &number, &start, &end).await;
}

#[when(expr = "the booking of {string} is cancelled")]
async fn cancel(world: &mut TestWorld, name: String) {
    let id = world.booking_of(&name).id;
    let result = world.app().state.ledger.cancel(world.library_id(), id).await;
    world.record_booking(&name, result);
}

#[when(regex = r#"^the librarian (confirms|rejects|checks in|checks out) the booking of "([^"]*)"$"#)]
async fn librarian_acts(world: &mut TestWorld, action: String, name: String) {
    let id = world.booking_of(&name).id;
    let library_id = world.library_id();
    let ledger = &world.app().state.ledger;
    let result = match action.as_str() {
        "confirms" => ledger.confirm(library_id, id).await,
        "rejects" => ledger.reject(library_id, id).await,
        "checks in" => ledger.check_in(library_id, id).await,
        _ => ledger.check_out(library_id, id).await,
    };
    world.record_booking(&name, result);
}

#[then(expr = "the booking succeeds with status {string}")]
async fn booking_succeeds(world: &mut TestWorld, status: String) {
    assert!(world.last_error.is_none(), "{:?}", world.last_error);
    let booking = world.last_booking.as_ref().expect("No booking was made");
    assert_eq!(booking.status.as_str(), status);
}

#[then(expr = "the booking amount is {int}")]
async fn booking_amount(world: &mut TestWorld, amount: u32) {
    let booking = world.last_booking.as_ref().expect("No booking was made");
    assert_eq!(booking.amount, f64::from(amount));
}

#[then(expr = "the booking of {string} has status {string}")]
async fn booking_has_status(world: &mut TestWorld, name: String, status: String) {
    let id = world.booking_of(&name).id;
    let booking = world
        .app()
        .state
        .ledger
        .get(world.library_id(), id)
        .await
        .expect("Failed to load booking");
    assert_eq!(booking.status.as_str(), status);
}

#[then(expr = "the request fails with {string}")]
async fn request_fails(world: &mut TestWorld, code: String) {
    let err = world
        .last_error
        .as_ref()
        .expect("Expected the last step to fail");
    assert_eq!(err.code(), code, "{}", err);
}

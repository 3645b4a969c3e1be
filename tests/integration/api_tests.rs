//! API integration tests
//!
//! Tests the API endpoints with real HTTP requests against a test server.

use serde_json::json;
use uuid::Uuid;

use crate::common::{TestApp, TestResponse};

/// Create a daily seat and a morning slot over HTTP, returning their ids
async fn seat_in_slot(app: &TestApp, token: &str) -> (String, String) {
    let seat: serde_json::Value = app
        .post_as(
            "/api/v1/seats",
            json!({ "seat_number": "A1", "seat_name": "Window desk", "seat_for": "daily-booking" }),
            token,
        )
        .await
        .assert_created()
        .json();
    let slot: serde_json::Value = app
        .post_as(
            "/api/v1/time-slots",
            json!({ "start_time": "09:00", "end_time": "11:00", "price": 50.0 }),
            token,
        )
        .await
        .assert_created()
        .json();

    let seat_id = seat["id"].as_str().unwrap().to_string();
    let slot_id = slot["id"].as_str().unwrap().to_string();
    app.post_as(
        &format!("/api/v1/time-slots/{}/seats", slot_id),
        json!({ "seat_ids": [seat_id] }),
        token,
    )
    .await
    .assert_ok();

    (seat_id, slot_id)
}

async fn book_daily(app: &TestApp, seat_id: &str, slot_id: &str, token: &str) -> TestResponse {
    app.post_as(
        "/api/v1/bookings/daily",
        json!({ "seat_id": seat_id, "time_slot_id": slot_id, "booking_date": "2025-01-10" }),
        token,
    )
    .await
}

#[tokio::test]
async fn test_health_endpoint_returns_ok() {
    let app = TestApp::new().await;
    let response = app.get("/api/v1/health").await;

    response.assert_ok();

    let json: serde_json::Value = response.json();
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_liveness_probe() {
    let app = TestApp::new().await;
    app.get("/api/v1/health/live").await.assert_ok();
}

#[tokio::test]
async fn test_readiness_probe() {
    let app = TestApp::new().await;
    app.get("/api/v1/health/ready").await.assert_ok();
}

#[tokio::test]
async fn test_protected_endpoint_without_token() {
    let app = TestApp::new().await;
    app.get("/api/v1/seats").await.assert_unauthorized();
}

#[tokio::test]
async fn test_protected_endpoint_with_invalid_token() {
    let app = TestApp::new().await;
    app.get_as("/api/v1/seats", "not-a-jwt")
        .await
        .assert_unauthorized();
}

#[tokio::test]
async fn test_member_cannot_manage_seats() {
    let app = TestApp::new().await;
    let library = app.create_library("Central Library").await;
    let token = app.member_token(Uuid::new_v4(), library.id);

    app.post_as(
        "/api/v1/seats",
        json!({ "seat_number": "A1", "seat_name": "Window desk", "seat_for": "daily-booking" }),
        &token,
    )
    .await
    .assert_forbidden();

    // Reading is open to members
    app.get_as("/api/v1/seats", &token).await.assert_ok();
}

#[tokio::test]
async fn test_admin_registers_library() {
    let app = TestApp::new().await;
    let admin = app.admin_token();

    let library: serde_json::Value = app
        .post_as(
            "/api/v1/libraries",
            json!({ "name": "Harbour Library", "monthly_fee": 300.0 }),
            &admin,
        )
        .await
        .assert_created()
        .json();
    assert_eq!(library["name"], "Harbour Library");
    assert_eq!(library["is_active"], true);

    let other = app.create_library("Central Library").await;
    app.post_as(
        "/api/v1/libraries",
        json!({ "name": "Rogue Library" }),
        &app.librarian_token(other.id),
    )
    .await
    .assert_forbidden();
}

#[tokio::test]
async fn test_librarian_manages_library_profile() {
    let app = TestApp::new().await;
    let library = app.create_library("Central Library").await;
    let token = app.librarian_token(library.id);

    let updated: serde_json::Value = app
        .put_as("/api/v1/library", json!({ "monthly_fee": 150.0 }), &token)
        .await
        .assert_ok()
        .json();
    assert_eq!(updated["monthly_fee"], 150.0);

    app.put_as("/api/v1/library", json!({ "monthly_fee": 0.0 }), &token)
        .await
        .assert_invalid_code("INVALID_PRICE");
}

#[tokio::test]
async fn test_invalid_time_slot_range_is_rejected() {
    let app = TestApp::new().await;
    let library = app.create_library("Central Library").await;
    let token = app.librarian_token(library.id);

    app.post_as(
        "/api/v1/time-slots",
        json!({ "start_time": "10:00", "end_time": "09:00", "price": 20.0 }),
        &token,
    )
    .await
    .assert_invalid_code("INVALID_TIME_RANGE");
}

#[tokio::test]
async fn test_bulk_seat_creation_over_http() {
    let app = TestApp::new().await;
    let library = app.create_library("Central Library").await;
    let token = app.librarian_token(library.id);

    let seats: Vec<serde_json::Value> = app
        .post_as(
            "/api/v1/seats/bulk",
            json!({ "seats": [
                { "seat_number": "A1", "seat_name": "Desk 1", "seat_for": "daily-booking" },
                { "seat_number": "A2", "seat_name": "Desk 2", "seat_for": "monthly-booking" }
            ]}),
            &token,
        )
        .await
        .assert_created()
        .json();
    assert_eq!(seats.len(), 2);

    app.post_as(
        "/api/v1/seats/bulk",
        json!({ "seats": [
            { "seat_number": "A3", "seat_name": "Desk 3", "seat_for": "daily-booking" },
            { "seat_number": "A1", "seat_name": "Desk 1", "seat_for": "daily-booking" }
        ]}),
        &token,
    )
    .await
    .assert_invalid_code("DUPLICATE_SEAT_NUMBER");

    let listed: Vec<serde_json::Value> = app
        .get_as("/api/v1/seats", &token)
        .await
        .assert_ok()
        .json();
    assert_eq!(listed.len(), 2);
}

#[tokio::test]
async fn test_daily_booking_conflict_over_http() {
    let app = TestApp::new().await;
    let library = app.create_library("Central Library").await;
    let librarian = app.librarian_token(library.id);
    let (seat_id, slot_id) = seat_in_slot(&app, &librarian).await;

    let alice = app.member_token(Uuid::new_v4(), library.id);
    let bob = app.member_token(Uuid::new_v4(), library.id);

    let booking: serde_json::Value = book_daily(&app, &seat_id, &slot_id, &alice)
        .await
        .assert_created()
        .json();
    assert_eq!(booking["status"], "pending");
    assert_eq!(booking["kind"], "daily");
    assert_eq!(booking["amount"], 50.0);

    book_daily(&app, &seat_id, &slot_id, &bob)
        .await
        .assert_conflict_code("SEAT_UNAVAILABLE");

    let available: Vec<serde_json::Value> = app
        .get_as(
            &format!("/api/v1/time-slots/{}/availability?date=2025-01-10", slot_id),
            &bob,
        )
        .await
        .assert_ok()
        .json();
    assert!(available.is_empty());
}

#[tokio::test]
async fn test_booking_lifecycle_over_http() {
    let app = TestApp::new().await;
    let library = app.create_library("Central Library").await;
    let librarian = app.librarian_token(library.id);
    let (seat_id, slot_id) = seat_in_slot(&app, &librarian).await;

    let member = app.member_token(Uuid::new_v4(), library.id);
    let booking: serde_json::Value = book_daily(&app, &seat_id, &slot_id, &member)
        .await
        .assert_created()
        .json();
    let id = booking["id"].as_str().unwrap();

    // Members cannot confirm their own bookings
    app.post_as(&format!("/api/v1/bookings/{}/confirm", id), json!({}), &member)
        .await
        .assert_forbidden();

    for (action, status) in [
        ("confirm", "confirmed"),
        ("check-in", "checked-in"),
        ("check-out", "completed"),
    ] {
        let updated: serde_json::Value = app
            .post_as(&format!("/api/v1/bookings/{}/{}", id, action), json!({}), &librarian)
            .await
            .assert_ok()
            .json();
        assert_eq!(updated["status"], status);
    }

    app.post_as(&format!("/api/v1/bookings/{}/cancel", id), json!({}), &member)
        .await
        .assert_conflict_code("ILLEGAL_TRANSITION");

    let paid: serde_json::Value = app
        .put_as(
            &format!("/api/v1/bookings/{}/payment", id),
            json!({ "payment_status": "paid" }),
            &librarian,
        )
        .await
        .assert_ok()
        .json();
    assert_eq!(paid["payment_status"], "paid");
    assert_eq!(paid["status"], "completed");
}

#[tokio::test]
async fn test_members_only_see_their_own_bookings() {
    let app = TestApp::new().await;
    let library = app.create_library("Central Library").await;
    let librarian = app.librarian_token(library.id);
    let (seat_id, slot_id) = seat_in_slot(&app, &librarian).await;

    let alice = app.member_token(Uuid::new_v4(), library.id);
    let bob = app.member_token(Uuid::new_v4(), library.id);

    let booking: serde_json::Value = book_daily(&app, &seat_id, &slot_id, &alice)
        .await
        .assert_created()
        .json();
    let id = booking["id"].as_str().unwrap();

    let mine: Vec<serde_json::Value> = app
        .get_as("/api/v1/bookings", &alice)
        .await
        .assert_ok()
        .json();
    assert_eq!(mine.len(), 1);

    let theirs: Vec<serde_json::Value> = app
        .get_as("/api/v1/bookings", &bob)
        .await
        .assert_ok()
        .json();
    assert!(theirs.is_empty());

    app.get_as(&format!("/api/v1/bookings/{}", id), &bob)
        .await
        .assert_not_found();
    app.post_as(&format!("/api/v1/bookings/{}/cancel", id), json!({}), &bob)
        .await
        .assert_not_found();

    let all: Vec<serde_json::Value> = app
        .get_as("/api/v1/bookings", &librarian)
        .await
        .assert_ok()
        .json();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn test_member_cannot_book_on_behalf_of_others() {
    let app = TestApp::new().await;
    let library = app.create_library("Central Library").await;
    let librarian = app.librarian_token(library.id);
    let (seat_id, slot_id) = seat_in_slot(&app, &librarian).await;
    let member = app.member_token(Uuid::new_v4(), library.id);

    app.post_as(
        "/api/v1/bookings/daily",
        json!({
            "seat_id": seat_id,
            "time_slot_id": slot_id,
            "booking_date": "2025-01-10",
            "user_id": Uuid::new_v4(),
        }),
        &member,
    )
    .await
    .assert_forbidden();

    let walk_in = Uuid::new_v4();
    let booking: serde_json::Value = app
        .post_as(
            "/api/v1/bookings/daily",
            json!({
                "seat_id": seat_id,
                "time_slot_id": slot_id,
                "booking_date": "2025-01-10",
                "user_id": walk_in,
            }),
            &librarian,
        )
        .await
        .assert_created()
        .json();
    assert_eq!(booking["user_id"], walk_in.to_string());
}

#[tokio::test]
async fn test_monthly_booking_and_availability_over_http() {
    let app = TestApp::new().await;
    let library = app.create_library("Central Library").await;
    let librarian = app.librarian_token(library.id);
    let member = app.member_token(Uuid::new_v4(), library.id);

    let seat: serde_json::Value = app
        .post_as(
            "/api/v1/seats",
            json!({ "seat_number": "M1", "seat_name": "Carrel", "seat_for": "monthly-booking" }),
            &librarian,
        )
        .await
        .assert_created()
        .json();
    let seat_id = seat["id"].as_str().unwrap();

    let booking: serde_json::Value = app
        .post_as(
            "/api/v1/bookings/monthly",
            json!({ "seat_id": seat_id, "start_date": "2025-02-01", "end_date": "2025-02-28" }),
            &member,
        )
        .await
        .assert_created()
        .json();
    assert_eq!(booking["kind"], "monthly");
    assert_eq!(booking["amount"], 120.0);

    let availability: serde_json::Value = app
        .get_as(
            &format!(
                "/api/v1/bookings/monthly/availability?seat_id={}&start_date=2025-02-15&end_date=2025-03-15",
                seat_id
            ),
            &member,
        )
        .await
        .assert_ok()
        .json();
    assert_eq!(availability["available"], false);

    app.post_as(
        "/api/v1/bookings/monthly",
        json!({ "seat_id": seat_id, "start_date": "2025-03-31", "end_date": "2025-03-01" }),
        &member,
    )
    .await
    .assert_invalid_code("INVALID_DATE_RANGE");
}

#[tokio::test]
async fn test_statistics_require_librarian() {
    let app = TestApp::new().await;
    let library = app.create_library("Central Library").await;
    let librarian = app.librarian_token(library.id);
    let (seat_id, slot_id) = seat_in_slot(&app, &librarian).await;
    let member = app.member_token(Uuid::new_v4(), library.id);

    book_daily(&app, &seat_id, &slot_id, &member)
        .await
        .assert_created();

    app.get_as("/api/v1/statistics", &member)
        .await
        .assert_forbidden();

    let stats: serde_json::Value = app
        .get_as("/api/v1/statistics", &librarian)
        .await
        .assert_ok()
        .json();
    assert_eq!(stats["total_bookings"], 1);
    assert_eq!(stats["by_status"]["pending"], 1);
}

#[tokio::test]
async fn test_unknown_booking_returns_not_found() {
    let app = TestApp::new().await;
    let library = app.create_library("Central Library").await;
    let librarian = app.librarian_token(library.id);

    app.get_as(&format!("/api/v1/bookings/{}", Uuid::new_v4()), &librarian)
        .await
        .assert_not_found();
}

#[tokio::test]
async fn test_blank_seat_number_fails_validation() {
    let app = TestApp::new().await;
    let library = app.create_library("Central Library").await;
    let librarian = app.librarian_token(library.id);

    let response = app
        .post_as(
            "/api/v1/seats",
            json!({ "seat_number": "", "seat_name": "Window desk", "seat_for": "daily-booking" }),
            &librarian,
        )
        .await;
    response.assert_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY);

    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "validation_error");
    assert!(body["details"].get("seat_number").is_some());

    app.post_as(
        "/api/v1/seats",
        json!({ "seat_number": "   ", "seat_name": "Window desk", "seat_for": "daily-booking" }),
        &librarian,
    )
    .await
    .assert_error(axum::http::StatusCode::UNPROCESSABLE_ENTITY, "INVALID_SEAT_NUMBER");
}

#[tokio::test]
async fn test_seat_deletion_over_http() {
    let app = TestApp::new().await;
    let library = app.create_library("Central Library").await;
    let librarian = app.librarian_token(library.id);
    let (seat_id, slot_id) = seat_in_slot(&app, &librarian).await;

    let member = app.member_token(Uuid::new_v4(), library.id);
    book_daily(&app, &seat_id, &slot_id, &member)
        .await
        .assert_created();

    app.delete_as(&format!("/api/v1/seats/{}", seat_id), &librarian)
        .await
        .assert_conflict_code("SEAT_HAS_BOOKINGS");

    let spare: serde_json::Value = app
        .post_as(
            "/api/v1/seats",
            json!({ "seat_number": "B2", "seat_name": "Corner desk", "seat_for": "daily-booking" }),
            &librarian,
        )
        .await
        .assert_created()
        .json();
    app.delete_as(&format!("/api/v1/seats/{}", spare["id"].as_str().unwrap()), &librarian)
        .await
        .assert_status(axum::http::StatusCode::NO_CONTENT);
}

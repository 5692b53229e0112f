//! Integration tests for the hotel and booking HTTP services.

mod support;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::RoomType;
use serde_json::json;
use tower::ServiceExt;

use support::{BookingHarness, HotelHarness, as_user, booking_body, get, json_request, send, stay};

#[tokio::test]
async fn test_health_check() {
    let h = HotelHarness::new();

    let (status, json) = send(&h.app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let h = BookingHarness::new();

    let response = h.app.clone().oneshot(get("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn test_correlation_id_is_echoed_or_generated() {
    let h = HotelHarness::new();

    let response = h
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-correlation-id", "corr-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["x-correlation-id"], "corr-42");

    let response = h.app.clone().oneshot(get("/health")).await.unwrap();
    let generated = response.headers()["x-correlation-id"].to_str().unwrap();
    assert!(!generated.is_empty());
}

// -- Hotel service --

#[tokio::test]
async fn test_create_and_get_room() {
    let h = HotelHarness::new();

    let (status, created) = send(
        &h.app,
        json_request(
            "POST",
            "/api/v1/rooms",
            json!({
                "hotel_id": 7,
                "room_number": "305",
                "room_type": "SUITE",
                "price_cents": 32_000
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["times_booked"], 0);
    assert_eq!(created["available"], true);

    let id = created["id"].as_i64().unwrap();
    let (status, room) = send(&h.app, get(&format!("/api/v1/rooms/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(room["room_number"], "305");
    assert_eq!(room["room_type"], "SUITE");
}

#[tokio::test]
async fn test_duplicate_room_number_is_rejected() {
    let h = HotelHarness::new();
    let body = json!({
        "hotel_id": 1,
        "room_number": "101",
        "room_type": "SINGLE",
        "price_cents": 9_000
    });

    let (status, _) = send(&h.app, json_request("POST", "/api/v1/rooms", body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&h.app, json_request("POST", "/api/v1/rooms", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_room_error_body() {
    let h = HotelHarness::new();

    let response = h
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/rooms/999")
                .header("x-correlation-id", "trace-me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let (status, json) = support::read_json(response).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["status"], 404);
    assert_eq!(json["error"], "Not Found");
    assert_eq!(json["message"], "Room not found with id: 999");
    assert_eq!(json["trace_id"], "trace-me");
}

#[tokio::test]
async fn test_confirm_replay_and_release() {
    let h = HotelHarness::new();
    let room_id = h.add_room("101", RoomType::Double).await;
    let uri = format!("/api/v1/rooms/{room_id}/confirm-availability");
    let body = json!({
        "request_id": "req-1",
        "start_date": "2025-05-01",
        "end_date": "2025-05-03"
    });

    let (status, first) = send(&h.app, json_request("POST", &uri, body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["confirmed"], true);
    assert_eq!(first["room_id"], room_id.as_i64());

    let (_, replay) = send(&h.app, json_request("POST", &uri, body)).await;
    assert_eq!(replay, first);
    assert_eq!(h.times_booked(room_id).await, 1);

    let (status, released) = send(
        &h.app,
        json_request(
            "POST",
            &format!("/api/v1/rooms/{room_id}/release?request_id=req-1"),
            json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(released["times_booked"], 0);
}

#[tokio::test]
async fn test_confirm_closed_room_is_denied() {
    let h = HotelHarness::new();
    let room_id = h.add_room("101", RoomType::Double).await;

    let (status, _) = send(
        &h.app,
        json_request(
            "PUT",
            &format!("/api/v1/rooms/{room_id}"),
            json!({
                "room_number": "101",
                "room_type": "DOUBLE",
                "price_cents": 15_000,
                "available": false
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, outcome) = send(
        &h.app,
        json_request(
            "POST",
            &format!("/api/v1/rooms/{room_id}/confirm-availability"),
            json!({
                "request_id": "req-closed",
                "start_date": "2025-05-01",
                "end_date": "2025-05-03"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["confirmed"], false);
    assert_eq!(h.times_booked(room_id).await, 0);
}

#[tokio::test]
async fn test_update_room_keeps_load_counter() {
    let h = HotelHarness::new();
    let room_id = h.add_room("101", RoomType::Double).await;
    send(
        &h.app,
        json_request(
            "POST",
            &format!("/api/v1/rooms/{room_id}/confirm-availability"),
            json!({
                "request_id": "req-1",
                "start_date": "2025-05-01",
                "end_date": "2025-05-03"
            }),
        ),
    )
    .await;

    let (status, updated) = send(
        &h.app,
        json_request(
            "PUT",
            &format!("/api/v1/rooms/{room_id}"),
            json!({
                "room_number": "101A",
                "room_type": "DELUXE",
                "price_cents": 21_000,
                "available": true
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["room_number"], "101A");
    assert_eq!(updated["room_type"], "DELUXE");
    assert_eq!(updated["times_booked"], 1);
}

#[tokio::test]
async fn test_select_and_recommend() {
    let h = HotelHarness::new();
    let busy = h.add_room("101", RoomType::Suite).await;
    let quiet = h.add_room("102", RoomType::Suite).await;
    h.add_room("103", RoomType::Single).await;
    send(
        &h.app,
        json_request(
            "POST",
            &format!("/api/v1/rooms/{busy}/confirm-availability"),
            json!({
                "request_id": "req-1",
                "start_date": "2025-05-01",
                "end_date": "2025-05-03"
            }),
        ),
    )
    .await;

    let (status, selected) = send(
        &h.app,
        get("/api/v1/rooms/select?hotel_id=1&room_type=suite"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(selected["id"], quiet.as_i64());

    let (status, recommended) = send(&h.app, get("/api/v1/rooms/recommend")).await;
    assert_eq!(status, StatusCode::OK);
    let recommended = recommended.as_array().unwrap();
    assert_eq!(recommended.len(), 3);
    assert_eq!(recommended.last().unwrap()["id"], busy.as_i64());

    let (status, _) = send(
        &h.app,
        get("/api/v1/rooms/select?hotel_id=1&room_type=castle"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &h.app,
        get("/api/v1/rooms/select?hotel_id=1&room_type=FAMILY"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// -- Booking service --

#[tokio::test]
async fn test_create_booking_requires_user() {
    let h = BookingHarness::new();
    let room_id = h.add_room("101", RoomType::Double, 0).await;

    let (status, json) = send(
        &h.app,
        json_request("POST", "/api/v1/bookings", booking_body(room_id)),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["status"], 401);
    assert_eq!(h.rooms.confirm_calls(), 0);
}

#[tokio::test]
async fn test_create_and_get_booking() {
    let h = BookingHarness::new();
    let room_id = h.add_room("101", RoomType::Double, 2).await;

    let (status, created) = send(
        &h.app,
        as_user(1, "POST", "/api/v1/bookings", Some(booking_body(room_id))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "CONFIRMED");
    assert_eq!(created["room_id"], room_id.as_i64());
    assert_eq!(created["start_date"], "2025-05-01");
    assert_eq!(h.times_booked(room_id).await, 3);

    let id = created["id"].as_i64().unwrap();
    let (status, fetched) = send(
        &h.app,
        as_user(1, "GET", &format!("/api/v1/bookings/{id}"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, _) = send(
        &h.app,
        as_user(2, "GET", &format!("/api/v1/bookings/{id}"), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_booking_with_auto_selection() {
    let h = BookingHarness::new();
    h.add_room("101", RoomType::Family, 4).await;
    let quiet = h.add_room("102", RoomType::Family, 1).await;

    let mut body = stay();
    body["hotel_id"] = json!(1);
    body["room_type"] = json!("FAMILY");
    let (status, created) = send(&h.app, as_user(1, "POST", "/api/v1/bookings", Some(body))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["room_id"], quiet.as_i64());
}

#[tokio::test]
async fn test_create_booking_without_room_choice_is_bad_request() {
    let h = BookingHarness::new();

    let (status, json) = send(&h.app, as_user(1, "POST", "/api/v1/bookings", Some(stay()))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["message"],
        "Either room_id or hotel_id and room_type must be provided"
    );
}

#[tokio::test]
async fn test_invalid_dates_are_bad_request() {
    let h = BookingHarness::new();
    let room_id = h.add_room("101", RoomType::Double, 0).await;
    let body = json!({
        "room_id": room_id.as_i64(),
        "start_date": "2025-05-04",
        "end_date": "2025-05-01"
    });

    let (status, json) = send(&h.app, as_user(1, "POST", "/api/v1/bookings", Some(body))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "End date must be after start date");
    assert_eq!(h.bookings.booking_count().await, 0);
}

#[tokio::test]
async fn test_idempotency_key_replays_booking() {
    let h = BookingHarness::new();
    let room_id = h.add_room("101", RoomType::Double, 0).await;
    let request = || {
        Request::builder()
            .method("POST")
            .uri("/api/v1/bookings")
            .header("x-user-id", "1")
            .header("idempotency-key", "checkout-77")
            .header("content-type", "application/json")
            .body(Body::from(booking_body(room_id).to_string()))
            .unwrap()
    };

    let (status, first) = send(&h.app, request()).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, second) = send(&h.app, request()).await;
    assert_eq!(status, StatusCode::CREATED);

    assert_eq!(first["id"], second["id"]);
    assert_eq!(first["request_id"], "checkout-77");
    assert_eq!(h.times_booked(room_id).await, 1);
}

#[tokio::test]
async fn test_cancel_booking() {
    let h = BookingHarness::new();
    let room_id = h.add_room("101", RoomType::Double, 0).await;
    let (_, created) = send(
        &h.app,
        as_user(1, "POST", "/api/v1/bookings", Some(booking_body(room_id))),
    )
    .await;
    let uri = format!("/api/v1/bookings/{}", created["id"]);

    let (status, cancelled) = send(&h.app, as_user(1, "DELETE", &uri, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "CANCELLED");
    assert_eq!(h.times_booked(room_id).await, 0);

    let (status, json) = send(&h.app, as_user(1, "DELETE", &uri, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Booking is already cancelled");

    let (status, _) = send(&h.app, as_user(1, "DELETE", "/api/v1/bookings/999", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_bookings_pages() {
    let h = BookingHarness::new();
    let room_id = h.add_room("101", RoomType::Double, 0).await;
    for _ in 0..3 {
        send(
            &h.app,
            as_user(1, "POST", "/api/v1/bookings", Some(booking_body(room_id))),
        )
        .await;
    }
    send(
        &h.app,
        as_user(2, "POST", "/api/v1/bookings", Some(booking_body(room_id))),
    )
    .await;

    let (status, all) = send(&h.app, as_user(1, "GET", "/api/v1/bookings", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 3);

    let (_, page) = send(
        &h.app,
        as_user(1, "GET", "/api/v1/bookings?limit=2&offset=2", None),
    )
    .await;
    assert_eq!(page.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_hotel_outage_is_service_unavailable() {
    let h = BookingHarness::new();
    let room_id = h.add_room("101", RoomType::Double, 0).await;
    h.rooms.set_fail_on_confirm(true);

    let (status, json) = send(
        &h.app,
        as_user(1, "POST", "/api/v1/bookings", Some(booking_body(room_id))),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["status"], 503);
    assert_eq!(h.bookings.booking_count().await, 0);
    assert_eq!(h.times_booked(room_id).await, 0);
}

#[tokio::test]
async fn test_persist_failure_is_internal_error_and_compensated() {
    let h = BookingHarness::new();
    let room_id = h.add_room("101", RoomType::Double, 5).await;
    h.bookings.set_fail_on_insert(true);

    let (status, _) = send(
        &h.app,
        as_user(1, "POST", "/api/v1/bookings", Some(booking_body(room_id))),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(h.rooms.release_calls(), 1);
    assert_eq!(h.times_booked(room_id).await, 5);
}

// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode as HttpStatusCode},
};
use hemolink::{ChangeEvent, DonationStore};
use hemolink_api::LiveEvent;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tower::ServiceExt;

/// Helper to create test app state with in-memory persistence.
fn create_test_app_state() -> AppState {
    let store: SqliteStore = SqliteStore::in_memory().expect("Failed to create in-memory store");
    AppState::new(store, LedgerConfig::default())
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request: Request<Body> = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

async fn read_json<T: DeserializeOwned>(response: Response) -> T {
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body_bytes).unwrap()
}

async fn put_profile(app: &Router, profile: Value) {
    let response: Response = send(app, "PUT", "/profiles", Some(profile)).await;
    assert_eq!(response.status(), HttpStatusCode::OK);
}

/// Seeds an available O- donor, an A+ recipient and an open A+ request.
async fn seed(app: &Router, quantity: i64) -> RequestInfo {
    put_profile(
        app,
        json!({
            "user_id": "donor-1",
            "display_name": "Dana Donor",
            "role": "donor",
            "blood_type": "O-",
            "is_available": true,
            "affiliation": "City College",
        }),
    )
    .await;
    put_profile(
        app,
        json!({
            "user_id": "patient",
            "display_name": "Pat Patient",
            "role": "recipient",
            "blood_type": "A+",
        }),
    )
    .await;

    let response: Response = send(
        app,
        "POST",
        "/requests",
        Some(json!({
            "recipient_id": "patient",
            "blood_type": "A+",
            "quantity": quantity,
            "urgency": "critical",
            "reason": "Surgery",
            "required_date": "2026-03-10",
        })),
    )
    .await;
    assert_eq!(response.status(), HttpStatusCode::OK);
    read_json(response).await
}

#[tokio::test]
async fn test_compatibility_lists_donor_types() {
    let app: Router = build_router(create_test_app_state());

    let response: Response = send(&app, "GET", "/compatibility/A-", None).await;

    assert_eq!(response.status(), HttpStatusCode::OK);
    let body: CompatibilityResponse = read_json(response).await;
    assert_eq!(body.recipient_type, "A-");
    assert_eq!(body.donor_types, vec!["O-", "A-"]);
    assert_eq!(body.recipient_types, vec!["A-", "A+", "AB-", "AB+"]);
}

#[tokio::test]
async fn test_compatibility_rejects_unknown_type() {
    let app: Router = build_router(create_test_app_state());

    let response: Response = send(&app, "GET", "/compatibility/C+", None).await;

    assert_eq!(response.status(), HttpStatusCode::BAD_REQUEST);
    let error_response: ErrorResponse = read_json(response).await;
    assert!(error_response.error);
    assert!(error_response.message.contains("blood_type"));
}

#[tokio::test]
async fn test_donors_for_recipient() {
    let app: Router = build_router(create_test_app_state());
    seed(&app, 2).await;

    let response: Response = send(&app, "GET", "/donors?recipient_id=patient", None).await;

    assert_eq!(response.status(), HttpStatusCode::OK);
    let body: DonorListResponse = read_json(response).await;
    assert_eq!(body.status, "ready");
    assert_eq!(body.recipient_type.as_deref(), Some("A+"));
    assert_eq!(body.donors.len(), 1);
    assert_eq!(body.donors[0].user_id, "donor-1");
}

#[tokio::test]
async fn test_donors_search_filters_listing() {
    let app: Router = build_router(create_test_app_state());
    seed(&app, 2).await;

    let response: Response = send(
        &app,
        "GET",
        "/donors?recipient_id=patient&search=university",
        None,
    )
    .await;

    let body: DonorListResponse = read_json(response).await;
    assert!(body.donors.is_empty());
}

#[tokio::test]
async fn test_donors_requires_recipient_or_type() {
    let app: Router = build_router(create_test_app_state());

    let response: Response = send(&app, "GET", "/donors", None).await;

    assert_eq!(response.status(), HttpStatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_offer_matches_request_and_closes_listing() {
    let app: Router = build_router(create_test_app_state());
    let request: RequestInfo = seed(&app, 2).await;

    let open: ListOpenRequestsResponse =
        read_json(send(&app, "GET", "/requests/open", None).await).await;
    assert_eq!(open.requests.len(), 1);
    assert_eq!(open.requests[0].recipient_name, "Pat Patient");

    let response: Response = send(
        &app,
        "POST",
        "/donations",
        Some(json!({
            "donor_id": "donor-1",
            "request_id": request.request_id,
            "units": 2,
        })),
    )
    .await;

    assert_eq!(response.status(), HttpStatusCode::OK);
    let offer: OfferDonationResponse = read_json(response).await;
    assert_eq!(offer.remaining_quantity, Some(0));
    assert_eq!(offer.request_status.as_deref(), Some("matched"));
    assert_eq!(offer.donation.blood_type.as_deref(), Some("O-"));

    let open: ListOpenRequestsResponse =
        read_json(send(&app, "GET", "/requests/open", None).await).await;
    assert!(open.requests.is_empty());
}

#[tokio::test]
async fn test_offer_against_missing_request_still_records() {
    let app: Router = build_router(create_test_app_state());
    seed(&app, 2).await;

    let response: Response = send(
        &app,
        "POST",
        "/donations",
        Some(json!({ "donor_id": "donor-1", "request_id": 999, "units": 1 })),
    )
    .await;

    assert_eq!(response.status(), HttpStatusCode::OK);
    let offer: OfferDonationResponse = read_json(response).await;
    assert_eq!(offer.remaining_quantity, None);
    assert_eq!(offer.notices.len(), 2);

    let history: DonationHistoryResponse =
        read_json(send(&app, "GET", "/donations?donor_id=donor-1", None).await).await;
    assert_eq!(history.donations.len(), 1);
    assert_eq!(history.donations[0].request_id, 999);
}

#[tokio::test]
async fn test_offer_rejects_zero_units() {
    let app: Router = build_router(create_test_app_state());
    let request: RequestInfo = seed(&app, 2).await;

    let response: Response = send(
        &app,
        "POST",
        "/donations",
        Some(json!({
            "donor_id": "donor-1",
            "request_id": request.request_id,
            "units": 0,
        })),
    )
    .await;

    assert_eq!(response.status(), HttpStatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_offer_on_closed_request_warns() {
    let app: Router = build_router(create_test_app_state());
    let request: RequestInfo = seed(&app, 2).await;
    let uri: String = format!("/requests/{}/close", request.request_id);
    let closed: Response = send(&app, "POST", &uri, Some(json!({ "status": "cancelled" }))).await;
    assert_eq!(closed.status(), HttpStatusCode::OK);

    let response: Response = send(
        &app,
        "POST",
        "/donations",
        Some(json!({
            "donor_id": "donor-1",
            "request_id": request.request_id,
            "units": 1,
        })),
    )
    .await;

    assert_eq!(response.status(), HttpStatusCode::OK);
    let offer: OfferDonationResponse = read_json(response).await;
    assert_eq!(offer.remaining_quantity, None);
    assert_eq!(offer.notices.len(), 2);
    assert!(offer.notices[1].message.contains("already cancelled"));
}

#[tokio::test]
async fn test_update_donation_status() {
    let app: Router = build_router(create_test_app_state());
    let request: RequestInfo = seed(&app, 3).await;
    let offer: OfferDonationResponse = read_json(
        send(
            &app,
            "POST",
            "/donations",
            Some(json!({
                "donor_id": "donor-1",
                "request_id": request.request_id,
                "units": 1,
            })),
        )
        .await,
    )
    .await;
    let uri: String = format!("/donations/{}/status", offer.donation.donation_id);

    let confirmed: Response =
        send(&app, "POST", &uri, Some(json!({ "status": "confirmed" }))).await;
    assert_eq!(confirmed.status(), HttpStatusCode::OK);
    let info: DonationInfo = read_json(confirmed).await;
    assert_eq!(info.status, "confirmed");

    let backwards: Response = send(&app, "POST", &uri, Some(json!({ "status": "offered" }))).await;
    assert_eq!(backwards.status(), HttpStatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_update_missing_donation_is_not_found() {
    let app: Router = build_router(create_test_app_state());

    let response: Response = send(
        &app,
        "POST",
        "/donations/77/status",
        Some(json!({ "status": "rejected" })),
    )
    .await;

    assert_eq!(response.status(), HttpStatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_close_request_rejects_open_status() {
    let app: Router = build_router(create_test_app_state());
    let request: RequestInfo = seed(&app, 2).await;
    let uri: String = format!("/requests/{}/close", request.request_id);

    let response: Response = send(&app, "POST", &uri, Some(json!({ "status": "open" }))).await;

    assert_eq!(response.status(), HttpStatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_close_request_cancels() {
    let app: Router = build_router(create_test_app_state());
    let request: RequestInfo = seed(&app, 2).await;
    let uri: String = format!("/requests/{}/close", request.request_id);

    let response: Response = send(&app, "POST", &uri, Some(json!({ "status": "cancelled" }))).await;

    assert_eq!(response.status(), HttpStatusCode::OK);
    let closed: RequestInfo = read_json(response).await;
    assert_eq!(closed.status, "cancelled");
}

#[tokio::test]
async fn test_set_availability_hides_donor() {
    let app: Router = build_router(create_test_app_state());
    seed(&app, 2).await;

    let response: Response = send(
        &app,
        "POST",
        "/profiles/donor-1/availability",
        Some(json!({ "is_available": false })),
    )
    .await;
    assert_eq!(response.status(), HttpStatusCode::OK);

    let body: DonorListResponse =
        read_json(send(&app, "GET", "/donors?recipient_id=patient", None).await).await;
    assert!(body.donors.is_empty());
}

#[tokio::test]
async fn test_set_availability_unknown_profile() {
    let app: Router = build_router(create_test_app_state());

    let response: Response = send(
        &app,
        "POST",
        "/profiles/nobody/availability",
        Some(json!({ "is_available": true })),
    )
    .await;

    assert_eq!(response.status(), HttpStatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_request_rejects_bad_quantity() {
    let app: Router = build_router(create_test_app_state());

    let response: Response = send(
        &app,
        "POST",
        "/requests",
        Some(json!({
            "recipient_id": "patient",
            "blood_type": "A+",
            "quantity": -1,
            "urgency": "low",
            "required_date": "2026-03-10",
        })),
    )
    .await;

    assert_eq!(response.status(), HttpStatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_dashboard_stats() {
    let app: Router = build_router(create_test_app_state());
    seed(&app, 2).await;

    let response: Response = send(&app, "GET", "/stats", None).await;

    assert_eq!(response.status(), HttpStatusCode::OK);
    let stats: DashboardStatsResponse = read_json(response).await;
    assert_eq!(stats.total_donors, 1);
    assert_eq!(stats.total_recipients, 1);
    assert_eq!(stats.total_requests, 1);
    assert_eq!(stats.fulfilled_requests, 0);
    assert_eq!(stats.blood_type_distribution.get("O-"), Some(&1));
}

#[tokio::test]
async fn test_live_requires_websocket_upgrade() {
    let app: Router = build_router(create_test_app_state());

    let response: Response = send(&app, "GET", "/live", None).await;

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_writes_reach_change_feed() {
    let app_state: AppState = create_test_app_state();
    let mut changes: broadcast::Receiver<ChangeEvent> = app_state.services.store.changes();
    let app: Router = build_router(app_state);

    put_profile(
        &app,
        json!({
            "user_id": "donor-2",
            "display_name": "Second Donor",
            "role": "donor",
            "blood_type": "B+",
            "is_available": true,
        }),
    )
    .await;

    let event: LiveEvent = LiveEvent::from(&changes.try_recv().unwrap());
    assert_eq!(
        event,
        LiveEvent::ProfileChanged {
            user_id: String::from("donor-2"),
        }
    );
}

#[test]
fn test_connected_event_encoding() {
    let json: String = live::encode_event(&LiveEvent::Connected {
        message: String::from(live::CONNECTED_MESSAGE),
    })
    .unwrap();

    let value: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["type"], "connected");
    assert_eq!(value["message"], live::CONNECTED_MESSAGE);
}

#[test]
fn test_api_errors_map_to_status_codes() {
    let cases: Vec<(ApiError, HttpStatusCode)> = vec![
        (
            ApiError::Conflict {
                message: String::from("busy"),
            },
            HttpStatusCode::CONFLICT,
        ),
        (
            ApiError::Unavailable {
                message: String::from("locked"),
            },
            HttpStatusCode::SERVICE_UNAVAILABLE,
        ),
        (
            ApiError::Internal {
                message: String::from("boom"),
            },
            HttpStatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];

    for (err, expected) in cases {
        let http: HttpError = HttpError::from(err);
        assert_eq!(http.status, expected);
    }
}

// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod live;

#[cfg(test)]
mod tests;

use axum::{
    Json, Router,
    extract::{Path, Query, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use clap::Parser;
use hemolink::{DEFAULT_MAX_UPDATE_ATTEMPTS, LedgerConfig};
use hemolink_api::{
    ApiError, CloseRequestRequest, CompatibilityResponse, CreateRequestRequest,
    DashboardStatsResponse, DonationHistoryResponse, DonationInfo, DonorListResponse, DonorQuery,
    ListOpenRequestsResponse, OfferDonationRequest, OfferDonationResponse, RequestInfo, Services,
    SetAvailabilityRequest, SetAvailabilityResponse, UpdateDonationStatusRequest,
    UpsertProfileRequest, UpsertProfileResponse, close_request, compatible_types,
    create_request, dashboard_stats, donation_history, list_donors, list_open_requests,
    offer_donation, set_availability, update_donation_status, upsert_profile,
};
use hemolink_persistence::SqliteStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{error, info, warn};

/// Hemolink Server - HTTP server for blood donation matching
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long)]
    database: Option<String>,

    /// Address to bind the server to
    #[arg(short, long, default_value = "127.0.0.1")]
    bind: String,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Compare-and-update attempts before a request update gives up
    #[arg(long, default_value_t = DEFAULT_MAX_UPDATE_ATTEMPTS)]
    max_update_attempts: u32,
}

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    /// Engine components over the `SQLite` store.
    services: Arc<Services<SqliteStore>>,
}

impl AppState {
    fn new(store: SqliteStore, config: LedgerConfig) -> Self {
        Self {
            services: Arc::new(Services::new(Arc::new(store), config)),
        }
    }
}

/// Query for a donor's donation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DonationHistoryQuery {
    donor_id: String,
}

/// Error response type.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    /// Error indicator.
    error: bool,
    /// Error message.
    message: String,
}

/// HTTP error wrapper that implements `IntoResponse`.
struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    /// The error message.
    message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let status: StatusCode = match &err {
            ApiError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            ApiError::DomainRuleViolation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %err, "Request failed");
        } else {
            warn!(error = %err, "Request rejected");
        }
        Self {
            status,
            message: err.to_string(),
        }
    }
}

/// Handler for GET `/compatibility/{blood_type}`.
async fn handle_compatibility(
    Path(blood_type): Path<String>,
) -> Result<Json<CompatibilityResponse>, HttpError> {
    Ok(Json(compatible_types(&blood_type)?))
}

/// Handler for GET `/donors`.
///
/// Lists available donors compatible with a recipient.
async fn handle_list_donors(
    AxumState(app_state): AxumState<AppState>,
    Query(query): Query<DonorQuery>,
) -> Result<Json<DonorListResponse>, HttpError> {
    info!(
        recipient_id = ?query.recipient_id,
        blood_type = ?query.blood_type,
        "Handling list_donors request"
    );
    Ok(Json(list_donors(&app_state.services, &query).await?))
}

/// Handler for GET `/requests/open`.
async fn handle_list_open_requests(
    AxumState(app_state): AxumState<AppState>,
) -> Result<Json<ListOpenRequestsResponse>, HttpError> {
    Ok(Json(list_open_requests(&app_state.services).await?))
}

/// Handler for POST `/donations`.
///
/// Records a donation offer against an open request.
async fn handle_offer_donation(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<OfferDonationRequest>,
) -> Result<Json<OfferDonationResponse>, HttpError> {
    info!(
        donor_id = %req.donor_id,
        request_id = req.request_id,
        units = req.units,
        "Handling offer_donation request"
    );
    let response: OfferDonationResponse =
        offer_donation(&app_state.services, &req, OffsetDateTime::now_utc()).await?;
    Ok(Json(response))
}

/// Handler for GET `/donations`.
async fn handle_donation_history(
    AxumState(app_state): AxumState<AppState>,
    Query(query): Query<DonationHistoryQuery>,
) -> Result<Json<DonationHistoryResponse>, HttpError> {
    Ok(Json(
        donation_history(&app_state.services, &query.donor_id).await?,
    ))
}

/// Handler for POST `/donations/{donation_id}/status`.
async fn handle_update_donation_status(
    AxumState(app_state): AxumState<AppState>,
    Path(donation_id): Path<i64>,
    Json(req): Json<UpdateDonationStatusRequest>,
) -> Result<Json<DonationInfo>, HttpError> {
    info!(donation_id, status = %req.status, "Handling update_donation_status request");
    let donation: DonationInfo = update_donation_status(
        &app_state.services,
        donation_id,
        &req,
        OffsetDateTime::now_utc(),
    )
    .await?;
    Ok(Json(donation))
}

/// Handler for POST `/requests`.
async fn handle_create_request(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<CreateRequestRequest>,
) -> Result<Json<RequestInfo>, HttpError> {
    info!(
        recipient_id = %req.recipient_id,
        blood_type = %req.blood_type,
        quantity = req.quantity,
        "Handling create_request request"
    );
    let request: RequestInfo =
        create_request(&app_state.services, &req, OffsetDateTime::now_utc()).await?;
    Ok(Json(request))
}

/// Handler for POST `/requests/{request_id}/close`.
async fn handle_close_request(
    AxumState(app_state): AxumState<AppState>,
    Path(request_id): Path<i64>,
    Json(req): Json<CloseRequestRequest>,
) -> Result<Json<RequestInfo>, HttpError> {
    info!(request_id, status = %req.status, "Handling close_request request");
    let request: RequestInfo = close_request(
        &app_state.services,
        request_id,
        &req,
        OffsetDateTime::now_utc(),
    )
    .await?;
    Ok(Json(request))
}

/// Handler for PUT `/profiles`.
async fn handle_upsert_profile(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<UpsertProfileRequest>,
) -> Result<Json<UpsertProfileResponse>, HttpError> {
    info!(user_id = %req.user_id, role = %req.role, "Handling upsert_profile request");
    Ok(Json(upsert_profile(&app_state.services, &req).await?))
}

/// Handler for POST `/profiles/{user_id}/availability`.
async fn handle_set_availability(
    AxumState(app_state): AxumState<AppState>,
    Path(user_id): Path<String>,
    Json(req): Json<SetAvailabilityRequest>,
) -> Result<Json<SetAvailabilityResponse>, HttpError> {
    info!(%user_id, is_available = req.is_available, "Handling set_availability request");
    Ok(Json(
        set_availability(&app_state.services, &user_id, &req).await?,
    ))
}

/// Handler for GET `/stats`.
async fn handle_dashboard_stats(
    AxumState(app_state): AxumState<AppState>,
) -> Result<Json<DashboardStatsResponse>, HttpError> {
    Ok(Json(dashboard_stats(&app_state.services).await?))
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/compatibility/{blood_type}", get(handle_compatibility))
        .route("/donors", get(handle_list_donors))
        .route("/requests", post(handle_create_request))
        .route("/requests/open", get(handle_list_open_requests))
        .route("/requests/{request_id}/close", post(handle_close_request))
        .route("/donations", post(handle_offer_donation))
        .route("/donations", get(handle_donation_history))
        .route(
            "/donations/{donation_id}/status",
            post(handle_update_donation_status),
        )
        .route("/profiles", put(handle_upsert_profile))
        .route(
            "/profiles/{user_id}/availability",
            post(handle_set_availability),
        )
        .route("/stats", get(handle_dashboard_stats))
        .route("/live", get(live::live_events_handler))
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing Hemolink Server");

    let store: SqliteStore = if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path);
        SqliteStore::open(db_path)?
    } else {
        info!("Using in-memory database");
        SqliteStore::in_memory()?
    };

    let config: LedgerConfig = LedgerConfig {
        max_update_attempts: args.max_update_attempts,
    };
    let app: Router = build_router(AppState::new(store, config));

    let listener: tokio::net::TcpListener =
        tokio::net::TcpListener::bind((args.bind.as_str(), args.port)).await?;
    info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

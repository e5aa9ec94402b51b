// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API boundary for the Hemolink donation system.
//!
//! Handlers take string-typed DTOs, parse them into domain values, call
//! the engine and return DTOs plus user-facing notices. Engine errors are
//! translated into [`ApiError`] explicitly so internal types never leak.

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

mod error;
mod handlers;
mod input;
mod notice;
mod request_response;
mod services;

#[cfg(test)]
mod tests;

pub use error::{ApiError, translate_core_error, translate_domain_error};
pub use handlers::{
    close_request, compatible_types, create_request, dashboard_stats, donation_history,
    list_donors, list_open_requests, offer_donation, set_availability, update_donation_status,
    upsert_profile,
};
pub use input::InputError;
pub use notice::{Notice, NoticeLevel, offer_notices};
pub use request_response::{
    CloseRequestRequest, CompatibilityResponse, CreateRequestRequest, DashboardStatsResponse,
    DonationHistoryResponse, DonationInfo, DonorInfo, DonorListResponse, DonorQuery, LiveEvent,
    ListOpenRequestsResponse, MonthlyRequestInfo, OfferDonationRequest, OfferDonationResponse,
    OpenRequestInfo, RequestInfo, SetAvailabilityRequest, SetAvailabilityResponse,
    UpdateDonationStatusRequest, UpsertProfileRequest, UpsertProfileResponse,
};
pub use services::Services;

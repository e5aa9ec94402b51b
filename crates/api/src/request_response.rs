// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.
//!
//! Timestamps are RFC 3339 strings and dates ISO calendar dates.

use hemolink::ChangeEvent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::notice::Notice;

/// API response listing blood type compatibility in both directions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityResponse {
    /// The recipient blood type.
    pub recipient_type: String,
    /// Donor blood types that may give to the recipient, in canonical order.
    pub donor_types: Vec<String>,
    /// Recipient types a donor of the same type may give to, in canonical order.
    pub recipient_types: Vec<String>,
}

/// A donor as shown in a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonorInfo {
    /// Donor identity.
    pub user_id: String,
    /// Donor display name.
    pub display_name: String,
    /// Donor blood type.
    pub blood_type: Option<String>,
    /// College or organisation.
    pub affiliation: Option<String>,
    /// Contact phone number.
    pub phone_number: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Donations offered so far.
    pub total_donations: u32,
    /// When the donor last offered, if ever.
    pub last_donation_date: Option<String>,
}

/// API response for a donor directory query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonorListResponse {
    /// The recipient blood type the listing was computed for.
    pub recipient_type: Option<String>,
    /// `ready`, `profile_unavailable` or `store_unavailable`.
    pub status: String,
    /// Explanation when the listing is not ready.
    pub message: Option<String>,
    /// Matching donors.
    pub donors: Vec<DonorInfo>,
}

/// Query for a donor directory listing.
///
/// With `blood_type` the listing is computed for that type and
/// `recipient_id`, if given, is only excluded. Without it the listing uses
/// the recipient's own profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonorQuery {
    /// The recipient the listing is for.
    #[serde(default)]
    pub recipient_id: Option<String>,
    /// Explicit recipient blood type.
    #[serde(default)]
    pub blood_type: Option<String>,
    /// Case-insensitive filter on name, blood type or affiliation.
    #[serde(default)]
    pub search: Option<String>,
}

/// A blood request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestInfo {
    /// Request identifier.
    pub request_id: i64,
    /// Recipient identity.
    pub recipient_id: String,
    /// Requested blood type.
    pub blood_type: String,
    /// Units still needed.
    pub quantity: u32,
    /// Urgency level.
    pub urgency: String,
    /// Lifecycle state.
    pub status: String,
    /// Donors that have offered.
    pub matched_donors: Vec<String>,
    /// Free-text reason.
    pub reason: Option<String>,
    /// Date by which the blood is needed.
    pub required_date: String,
    /// Creation time.
    pub created_at: String,
    /// Last modification time.
    pub updated_at: String,
}

/// An open request with its recipient's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenRequestInfo {
    /// The request.
    #[serde(flatten)]
    pub request: RequestInfo,
    /// Recipient display name, or `Unknown`.
    pub recipient_name: String,
}

/// API response listing open requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOpenRequestsResponse {
    /// Open requests, newest first.
    pub requests: Vec<OpenRequestInfo>,
}

/// API request to create a blood request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRequestRequest {
    /// Recipient identity.
    pub recipient_id: String,
    /// Requested blood type.
    pub blood_type: String,
    /// Units needed.
    pub quantity: i64,
    /// Urgency level.
    pub urgency: String,
    /// Free-text reason.
    #[serde(default)]
    pub reason: Option<String>,
    /// Date by which the blood is needed (`YYYY-MM-DD`).
    pub required_date: String,
}

/// API request to close a blood request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseRequestRequest {
    /// `completed` or `cancelled`.
    pub status: String,
}

/// API request to offer a donation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferDonationRequest {
    /// The donor making the offer.
    pub donor_id: String,
    /// The request offered against.
    pub request_id: i64,
    /// Units offered.
    pub units: i64,
}

/// A donation record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationInfo {
    /// Donation identifier.
    pub donation_id: i64,
    /// Donor identity.
    pub donor_id: String,
    /// Request offered against.
    pub request_id: i64,
    /// Units offered.
    pub units: u32,
    /// Donor blood type at the time of the offer.
    pub blood_type: Option<String>,
    /// Lifecycle state.
    pub status: String,
    /// When the offer was made.
    pub offered_at: String,
    /// Last modification time.
    pub updated_at: String,
}

/// API response for an offer.
///
/// An offer that returns this response has committed its donation record.
/// Degraded side effects are reported in `notices`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferDonationResponse {
    /// The committed record.
    pub donation: DonationInfo,
    /// Remaining quantity, when the request was updated.
    pub remaining_quantity: Option<u32>,
    /// Request status, when the request was updated.
    pub request_status: Option<String>,
    /// Success notice followed by any warnings.
    pub notices: Vec<Notice>,
}

/// API response listing a donor's donations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationHistoryResponse {
    /// Donor identity.
    pub donor_id: String,
    /// Donations, newest first.
    pub donations: Vec<DonationInfo>,
}

/// API request to move a donation through its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDonationStatusRequest {
    /// `confirmed`, `completed` or `rejected`.
    pub status: String,
}

/// API request to create or replace a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertProfileRequest {
    /// User identity.
    pub user_id: String,
    /// Display name.
    pub display_name: String,
    /// `donor` or `recipient`.
    pub role: String,
    /// Blood type, if known.
    #[serde(default)]
    pub blood_type: Option<String>,
    /// Whether a donor is available.
    #[serde(default)]
    pub is_available: bool,
    /// College or organisation.
    #[serde(default)]
    pub affiliation: Option<String>,
    /// Contact phone number.
    #[serde(default)]
    pub phone_number: Option<String>,
    /// Contact email.
    #[serde(default)]
    pub email: Option<String>,
}

/// API response for a profile write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertProfileResponse {
    /// User identity.
    pub user_id: String,
    /// A success message.
    pub message: String,
}

/// API request to toggle donor availability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetAvailabilityRequest {
    /// New availability.
    pub is_available: bool,
}

/// API response for an availability change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetAvailabilityResponse {
    /// Donor identity.
    pub user_id: String,
    /// Availability as written.
    pub is_available: bool,
}

/// Request counts for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyRequestInfo {
    /// Short label such as `Mar 2026`.
    pub label: String,
    /// Requests created in the month.
    pub requests: u32,
    /// Of those, how many are matched or completed.
    pub fulfilled: u32,
}

/// API response for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStatsResponse {
    /// Donor profiles.
    pub total_donors: u32,
    /// Recipient profiles.
    pub total_recipients: u32,
    /// Requests of any status.
    pub total_requests: u32,
    /// Requests that are matched or completed.
    pub fulfilled_requests: u32,
    /// Percentage of requests fulfilled.
    pub success_rate: f64,
    /// Donors per blood type, every type present.
    pub blood_type_distribution: BTreeMap<String, u32>,
    /// Donors whose blood type is unknown.
    pub donors_without_blood_type: u32,
    /// Per-month request counts, oldest first.
    pub monthly_requests: Vec<MonthlyRequestInfo>,
}

/// An event pushed over the live stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveEvent {
    /// Sent once when a client connects.
    Connected {
        /// A welcome message.
        message: String,
    },
    /// A profile was written.
    ProfileChanged {
        /// The profile's identity.
        user_id: String,
    },
    /// A request was created or updated.
    RequestChanged {
        /// The request.
        request_id: i64,
    },
    /// A donation record was appended.
    DonationRecorded {
        /// The new record.
        donation_id: i64,
        /// The donor.
        donor_id: String,
        /// The request offered against.
        request_id: i64,
    },
    /// A donation record's status changed.
    DonationUpdated {
        /// The record.
        donation_id: i64,
        /// The donor.
        donor_id: String,
    },
}

impl From<&ChangeEvent> for LiveEvent {
    fn from(event: &ChangeEvent) -> Self {
        match event {
            ChangeEvent::ProfileChanged { user_id } => Self::ProfileChanged {
                user_id: user_id.to_string(),
            },
            ChangeEvent::RequestChanged { request_id } => Self::RequestChanged {
                request_id: request_id.value(),
            },
            ChangeEvent::DonationRecorded {
                donation_id,
                donor_id,
                request_id,
            } => Self::DonationRecorded {
                donation_id: donation_id.value(),
                donor_id: donor_id.to_string(),
                request_id: request_id.value(),
            },
            ChangeEvent::DonationUpdated {
                donation_id,
                donor_id,
            } => Self::DonationUpdated {
                donation_id: donation_id.value(),
                donor_id: donor_id.to_string(),
            },
        }
    }
}

// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API handlers.
//!
//! Each handler parses its request DTO, calls the engine and maps the
//! result into a response DTO. Identities are always explicit arguments.

use hemolink::{
    CatalogEntry, CoreError, DashboardStats, DirectoryStatus, DonationStore, DonorListing,
    OfferOutcome, RequestOutcome, filter_donors,
};
use hemolink_domain::{
    BloodRequest, BloodType, DomainError, DonationId, DonationRecord, DonationStatus,
    NewBloodRequest, RequestId, RequestStatus, Role, UserId, UserProfile, compatible_donor_types,
    compatible_recipient_types, validate_new_request, validate_profile_fields,
};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use tracing::{info, warn};

use crate::error::{ApiError, translate_core_error, translate_domain_error};
use crate::input::{
    optional_text, parse_blood_type, parse_closing_status, parse_date, parse_donation_status,
    parse_optional_blood_type, parse_role, parse_urgency, parse_user_id,
};
use crate::notice::offer_notices;
use crate::request_response::{
    CloseRequestRequest, CompatibilityResponse, CreateRequestRequest, DashboardStatsResponse,
    DonationHistoryResponse, DonationInfo, DonorInfo, DonorListResponse, DonorQuery,
    ListOpenRequestsResponse, MonthlyRequestInfo, OfferDonationRequest, OfferDonationResponse,
    OpenRequestInfo, RequestInfo, SetAvailabilityRequest, SetAvailabilityResponse,
    UpdateDonationStatusRequest, UpsertProfileRequest, UpsertProfileResponse,
};
use crate::services::Services;

fn format_timestamp(value: OffsetDateTime) -> Result<String, ApiError> {
    value.format(&Rfc3339).map_err(|e| ApiError::Internal {
        message: format!("Failed to format timestamp: {e}"),
    })
}

fn format_date(value: Date) -> Result<String, ApiError> {
    value
        .format(format_description!("[year]-[month]-[day]"))
        .map_err(|e| ApiError::Internal {
            message: format!("Failed to format date: {e}"),
        })
}

fn donor_info(profile: &UserProfile) -> Result<DonorInfo, ApiError> {
    Ok(DonorInfo {
        user_id: profile.user_id.to_string(),
        display_name: profile.display_name.clone(),
        blood_type: profile.blood_type.map(|bt| bt.to_string()),
        affiliation: profile.affiliation.clone(),
        phone_number: profile.phone_number.clone(),
        email: profile.email.clone(),
        total_donations: profile.total_donations,
        last_donation_date: profile.last_donation_date.map(format_timestamp).transpose()?,
    })
}

fn request_info(request: &BloodRequest) -> Result<RequestInfo, ApiError> {
    Ok(RequestInfo {
        request_id: request.request_id.value(),
        recipient_id: request.recipient_id.to_string(),
        blood_type: request.blood_type.to_string(),
        quantity: request.quantity,
        urgency: request.urgency.to_string(),
        status: request.status.to_string(),
        matched_donors: request.matched_donors.iter().map(ToString::to_string).collect(),
        reason: request.reason.clone(),
        required_date: format_date(request.required_date)?,
        created_at: format_timestamp(request.created_at)?,
        updated_at: format_timestamp(request.updated_at)?,
    })
}

fn donation_info(record: &DonationRecord) -> Result<DonationInfo, ApiError> {
    Ok(DonationInfo {
        donation_id: record.donation_id.value(),
        donor_id: record.donor_id.to_string(),
        request_id: record.request_id.value(),
        units: record.units,
        blood_type: record.blood_type.map(|bt| bt.to_string()),
        status: record.status.to_string(),
        offered_at: format_timestamp(record.offered_at)?,
        updated_at: format_timestamp(record.updated_at)?,
    })
}

fn donor_list_response(
    listing: &DonorListing,
    search: Option<&str>,
) -> Result<DonorListResponse, ApiError> {
    let donors: Vec<UserProfile> = match search.map(str::trim) {
        Some(term) if !term.is_empty() => filter_donors(&listing.donors, term),
        _ => listing.donors.clone(),
    };
    let (status, message): (&str, Option<String>) = match &listing.status {
        DirectoryStatus::Ready => ("ready", None),
        DirectoryStatus::ProfileUnavailable => (
            "profile_unavailable",
            Some(String::from(
                "Your profile has no blood type; compatible donors cannot be listed",
            )),
        ),
        DirectoryStatus::StoreUnavailable(reason) => (
            "store_unavailable",
            Some(format!("Donors could not be loaded: {reason}")),
        ),
    };

    Ok(DonorListResponse {
        recipient_type: listing.recipient_type.map(|bt| bt.to_string()),
        status: status.to_string(),
        message,
        donors: donors.iter().map(donor_info).collect::<Result<_, _>>()?,
    })
}

/// Lists the blood types compatible with a type, as recipient and as donor.
///
/// # Arguments
///
/// * `blood_type` - The recipient blood type label
///
/// # Errors
///
/// Returns an error if the label is not a blood type.
pub fn compatible_types(blood_type: &str) -> Result<CompatibilityResponse, ApiError> {
    let recipient_type: BloodType = parse_blood_type("blood_type", blood_type)?;
    Ok(CompatibilityResponse {
        recipient_type: recipient_type.to_string(),
        donor_types: compatible_donor_types(recipient_type)
            .into_iter()
            .map(|bt| bt.to_string())
            .collect(),
        recipient_types: compatible_recipient_types(recipient_type)
            .into_iter()
            .map(|bt| bt.to_string())
            .collect(),
    })
}

/// Lists available donors compatible with a recipient.
///
/// A missing recipient profile or unknown blood type yields an empty
/// listing with an explanatory status, not an error.
///
/// # Errors
///
/// Returns an error if the query names neither a recipient nor a blood
/// type, or a field does not parse.
pub async fn list_donors<S: DonationStore>(
    services: &Services<S>,
    query: &DonorQuery,
) -> Result<DonorListResponse, ApiError> {
    let recipient_id: Option<UserId> = query
        .recipient_id
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .map(|v| parse_user_id("recipient_id", v))
        .transpose()?;
    let blood_type: Option<BloodType> =
        parse_optional_blood_type("blood_type", query.blood_type.as_deref())?;

    let listing: DonorListing = match (blood_type, &recipient_id) {
        (Some(bt), exclude) => {
            services
                .directory
                .compatible_donors(bt, exclude.as_ref())
                .await
        }
        (None, Some(recipient)) => services.directory.donors_for_recipient(recipient).await,
        (None, None) => {
            return Err(ApiError::InvalidInput {
                field: String::from("recipient_id"),
                message: String::from("Either recipient_id or blood_type is required"),
            });
        }
    };

    donor_list_response(&listing, query.search.as_deref())
}

/// Lists every open request with its recipient's name, newest first.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub async fn list_open_requests<S: DonationStore>(
    services: &Services<S>,
) -> Result<ListOpenRequestsResponse, ApiError> {
    let entries: Vec<CatalogEntry> = services
        .catalog
        .open_requests()
        .await
        .map_err(translate_core_error)?;

    let requests: Vec<OpenRequestInfo> = entries
        .iter()
        .map(|entry| {
            Ok(OpenRequestInfo {
                request: request_info(&entry.request)?,
                recipient_name: entry.recipient_name.clone(),
            })
        })
        .collect::<Result<_, ApiError>>()?;

    Ok(ListOpenRequestsResponse { requests })
}

/// Offers a donation against a request.
///
/// A response means the donation record committed. Degraded steps are
/// reported as warning notices.
///
/// # Errors
///
/// Returns an error if the input is invalid or the record cannot be written.
pub async fn offer_donation<S: DonationStore>(
    services: &Services<S>,
    request: &OfferDonationRequest,
    at: OffsetDateTime,
) -> Result<OfferDonationResponse, ApiError> {
    let donor_id: UserId = parse_user_id("donor_id", &request.donor_id)?;
    let request_id: RequestId = RequestId::new(request.request_id);

    let outcome: OfferOutcome = services
        .ledger
        .offer(&donor_id, request_id, request.units, at)
        .await
        .map_err(translate_core_error)?;

    let (remaining_quantity, request_status): (Option<u32>, Option<String>) =
        match &outcome.request {
            RequestOutcome::Applied {
                new_quantity,
                status,
                ..
            } => (Some(*new_quantity), Some(status.to_string())),
            RequestOutcome::NotFound
            | RequestOutcome::Closed { .. }
            | RequestOutcome::Failed { .. } => (None, None),
        };

    if !outcome.is_clean() {
        warn!(
            donation_id = %outcome.donation_id(),
            warnings = outcome.warnings().len(),
            "Offer committed with warnings"
        );
    }

    Ok(OfferDonationResponse {
        donation: donation_info(&outcome.donation)?,
        remaining_quantity,
        request_status,
        notices: offer_notices(&outcome),
    })
}

/// Lists a donor's donations, newest first.
///
/// # Errors
///
/// Returns an error if the identity is blank or the store cannot be read.
pub async fn donation_history<S: DonationStore>(
    services: &Services<S>,
    donor_id: &str,
) -> Result<DonationHistoryResponse, ApiError> {
    let donor_id: UserId = parse_user_id("donor_id", donor_id)?;
    let records: Vec<DonationRecord> = services
        .ledger
        .donation_history(&donor_id)
        .await
        .map_err(translate_core_error)?;

    Ok(DonationHistoryResponse {
        donor_id: donor_id.to_string(),
        donations: records.iter().map(donation_info).collect::<Result<_, _>>()?,
    })
}

/// Moves a donation through its lifecycle.
///
/// # Errors
///
/// Returns an error if the status is unknown, the move is not permitted, or
/// the donation does not exist.
pub async fn update_donation_status<S: DonationStore>(
    services: &Services<S>,
    donation_id: i64,
    request: &UpdateDonationStatusRequest,
    at: OffsetDateTime,
) -> Result<DonationInfo, ApiError> {
    let status: DonationStatus = parse_donation_status(&request.status)?;
    let record: DonationRecord = services
        .ledger
        .advance_donation(DonationId::new(donation_id), status, at)
        .await
        .map_err(translate_core_error)?;

    donation_info(&record)
}

/// Creates an open blood request.
///
/// # Errors
///
/// Returns an error if a field is invalid or the store fails.
pub async fn create_request<S: DonationStore>(
    services: &Services<S>,
    request: &CreateRequestRequest,
    at: OffsetDateTime,
) -> Result<RequestInfo, ApiError> {
    let quantity: u32 = u32::try_from(request.quantity)
        .ok()
        .filter(|q| *q > 0)
        .ok_or_else(|| {
            translate_domain_error(DomainError::InvalidQuantity {
                quantity: request.quantity,
            })
        })?;
    let new_request: NewBloodRequest = NewBloodRequest {
        recipient_id: parse_user_id("recipient_id", &request.recipient_id)?,
        blood_type: parse_blood_type("blood_type", &request.blood_type)?,
        quantity,
        urgency: parse_urgency(&request.urgency)?,
        reason: optional_text(request.reason.as_deref()),
        required_date: parse_date("required_date", &request.required_date)?,
    };
    validate_new_request(&new_request).map_err(translate_domain_error)?;

    let created: BloodRequest = services
        .store
        .create_request(&new_request, at)
        .await
        .map_err(|e| translate_core_error(e.into()))?;

    info!(request_id = %created.request_id, "Request created via API");
    request_info(&created)
}

/// Closes a request as completed or cancelled.
///
/// # Errors
///
/// Returns an error if the status is not terminal, the lifecycle forbids
/// the move, or the request does not exist.
pub async fn close_request<S: DonationStore>(
    services: &Services<S>,
    request_id: i64,
    request: &CloseRequestRequest,
    at: OffsetDateTime,
) -> Result<RequestInfo, ApiError> {
    let status: RequestStatus = parse_closing_status(&request.status)?;
    let closed: BloodRequest = services
        .ledger
        .close_request(RequestId::new(request_id), status, at)
        .await
        .map_err(translate_core_error)?;

    request_info(&closed)
}

/// Creates or replaces a profile.
///
/// Donation counters of an existing profile are kept.
///
/// # Errors
///
/// Returns an error if a field is invalid or the store fails.
pub async fn upsert_profile<S: DonationStore>(
    services: &Services<S>,
    request: &UpsertProfileRequest,
) -> Result<UpsertProfileResponse, ApiError> {
    let role: Role = parse_role(&request.role)?;
    let mut profile: UserProfile = UserProfile::new(
        parse_user_id("user_id", &request.user_id)?,
        request.display_name.trim().to_string(),
        role,
        parse_optional_blood_type("blood_type", request.blood_type.as_deref())?,
        role == Role::Donor && request.is_available,
    );
    profile.affiliation = optional_text(request.affiliation.as_deref());
    profile.phone_number = optional_text(request.phone_number.as_deref());
    profile.email = optional_text(request.email.as_deref());
    validate_profile_fields(&profile).map_err(translate_domain_error)?;

    services
        .store
        .upsert_profile(&profile)
        .await
        .map_err(|e| translate_core_error(e.into()))?;

    Ok(UpsertProfileResponse {
        user_id: profile.user_id.to_string(),
        message: format!("Profile for '{}' saved", profile.display_name),
    })
}

/// Sets whether a donor is available to give.
///
/// # Errors
///
/// Returns an error if the profile does not exist or the store fails.
pub async fn set_availability<S: DonationStore>(
    services: &Services<S>,
    user_id: &str,
    request: &SetAvailabilityRequest,
) -> Result<SetAvailabilityResponse, ApiError> {
    let user_id: UserId = parse_user_id("user_id", user_id)?;
    let found: bool = services
        .store
        .set_donor_availability(&user_id, request.is_available)
        .await
        .map_err(|e| translate_core_error(e.into()))?;

    if !found {
        return Err(translate_core_error(CoreError::ProfileNotFound(user_id)));
    }

    Ok(SetAvailabilityResponse {
        user_id: user_id.to_string(),
        is_available: request.is_available,
    })
}

/// Computes the dashboard statistics.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub async fn dashboard_stats<S: DonationStore>(
    services: &Services<S>,
) -> Result<DashboardStatsResponse, ApiError> {
    let stats: DashboardStats = hemolink::dashboard_stats(services.store.as_ref())
        .await
        .map_err(translate_core_error)?;

    Ok(DashboardStatsResponse {
        total_donors: stats.total_donors,
        total_recipients: stats.total_recipients,
        total_requests: stats.total_requests,
        fulfilled_requests: stats.fulfilled_requests,
        success_rate: stats.success_rate,
        blood_type_distribution: stats
            .blood_type_distribution
            .iter()
            .map(|(bt, count)| (bt.to_string(), *count))
            .collect(),
        donors_without_blood_type: stats.donors_without_blood_type,
        monthly_requests: stats
            .monthly_requests
            .iter()
            .map(|m| MonthlyRequestInfo {
                label: m.label(),
                requests: m.requests,
                fulfilled: m.fulfilled,
            })
            .collect(),
    })
}

// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Row types and conversions between stored text and domain values.
//!
//! Timestamps are stored as RFC 3339 text and dates as ISO calendar dates.
//! Blood types that no longer parse are read back as unknown.

use diesel::prelude::*;
use hemolink_domain::{
    BloodRequest, BloodType, DonationId, DonationRecord, DonationStatus, RequestId,
    RequestStatus, Role, Urgency, UserId, UserProfile, parse_iso_date,
};
use std::str::FromStr;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use tracing::warn;

use crate::diesel_schema::{blood_requests, donations, user_profiles};
use crate::error::PersistenceError;

/// Formats a timestamp for storage.
///
/// # Errors
///
/// Returns an error if the timestamp cannot be represented in RFC 3339.
pub fn format_timestamp(value: OffsetDateTime) -> Result<String, PersistenceError> {
    value
        .format(&Rfc3339)
        .map_err(|e| PersistenceError::SerializationError(e.to_string()))
}

/// Formats a calendar date for storage.
///
/// # Errors
///
/// Returns an error if the date cannot be formatted.
pub fn format_date(value: Date) -> Result<String, PersistenceError> {
    value
        .format(format_description!("[year]-[month]-[day]"))
        .map_err(|e| PersistenceError::SerializationError(e.to_string()))
}

fn parse_timestamp(table: &'static str, value: &str) -> Result<OffsetDateTime, PersistenceError> {
    OffsetDateTime::parse(value, &Rfc3339).map_err(|e| PersistenceError::CorruptRow {
        table,
        reason: format!("invalid timestamp '{value}': {e}"),
    })
}

fn corrupt(table: &'static str) -> impl Fn(hemolink_domain::DomainError) -> PersistenceError {
    move |e| PersistenceError::CorruptRow {
        table,
        reason: e.to_string(),
    }
}

fn to_u32(table: &'static str, column: &str, value: i32) -> Result<u32, PersistenceError> {
    u32::try_from(value).map_err(|_| PersistenceError::CorruptRow {
        table,
        reason: format!("negative {column}: {value}"),
    })
}

/// Parses a stored blood type, treating unrecognised values as unknown.
fn read_blood_type(owner: &str, value: Option<&str>) -> Option<BloodType> {
    let raw: &str = value?;
    match BloodType::from_str(raw) {
        Ok(bt) => Some(bt),
        Err(e) => {
            warn!(owner, value = raw, error = %e, "Ignoring invalid stored blood type");
            None
        }
    }
}

/// Serializes a donor list for the `matched_donors_json` column.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode_donors(donors: &[UserId]) -> Result<String, PersistenceError> {
    Ok(serde_json::to_string(donors)?)
}

/// Stored user profile.
#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = user_profiles)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProfileRow {
    pub user_id: String,
    pub display_name: String,
    pub role: String,
    pub blood_type: Option<String>,
    pub is_available: i32,
    pub total_donations: i32,
    pub last_donation_date: Option<String>,
    pub affiliation: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
}

impl ProfileRow {
    /// Converts the row into a domain profile.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::CorruptRow` if a required column is invalid.
    pub fn into_profile(self) -> Result<UserProfile, PersistenceError> {
        const TABLE: &str = "user_profiles";
        let user_id: UserId = UserId::new(&self.user_id).map_err(corrupt(TABLE))?;
        let role: Role = Role::from_str(&self.role).map_err(corrupt(TABLE))?;
        let blood_type: Option<BloodType> =
            read_blood_type(user_id.as_str(), self.blood_type.as_deref());
        let last_donation_date: Option<OffsetDateTime> = self
            .last_donation_date
            .as_deref()
            .map(|v| parse_timestamp(TABLE, v))
            .transpose()?;

        Ok(UserProfile {
            user_id,
            display_name: self.display_name,
            role,
            blood_type,
            is_available: self.is_available != 0,
            total_donations: to_u32(TABLE, "total_donations", self.total_donations)?,
            last_donation_date,
            affiliation: self.affiliation,
            phone_number: self.phone_number,
            email: self.email,
        })
    }
}

/// Stored blood request.
#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = blood_requests)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RequestRow {
    pub request_id: i64,
    pub recipient_id: String,
    pub blood_type: String,
    pub quantity: i32,
    pub urgency: String,
    pub status: String,
    pub matched_donors_json: String,
    pub reason: Option<String>,
    pub required_date: String,
    pub revision: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl RequestRow {
    /// Converts the row into a domain request.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::CorruptRow` if a column is invalid.
    pub fn into_request(self) -> Result<BloodRequest, PersistenceError> {
        const TABLE: &str = "blood_requests";
        let matched_donors: Vec<UserId> =
            serde_json::from_str(&self.matched_donors_json).map_err(|e| {
                PersistenceError::CorruptRow {
                    table: TABLE,
                    reason: format!("invalid matched_donors_json: {e}"),
                }
            })?;

        Ok(BloodRequest {
            request_id: RequestId::new(self.request_id),
            recipient_id: UserId::new(&self.recipient_id).map_err(corrupt(TABLE))?,
            blood_type: BloodType::from_str(&self.blood_type).map_err(corrupt(TABLE))?,
            quantity: to_u32(TABLE, "quantity", self.quantity)?,
            urgency: Urgency::from_str(&self.urgency).map_err(corrupt(TABLE))?,
            status: RequestStatus::from_str(&self.status).map_err(corrupt(TABLE))?,
            matched_donors,
            reason: self.reason,
            required_date: parse_iso_date(&self.required_date).map_err(corrupt(TABLE))?,
            revision: self.revision,
            created_at: parse_timestamp(TABLE, &self.created_at)?,
            updated_at: parse_timestamp(TABLE, &self.updated_at)?,
        })
    }
}

/// Stored donation record.
#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = donations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DonationRow {
    pub donation_id: i64,
    pub donor_id: String,
    pub request_id: i64,
    pub units: i32,
    pub blood_type: Option<String>,
    pub status: String,
    pub offered_at: String,
    pub created_at: String,
    pub updated_at: String,
}

impl DonationRow {
    /// Converts the row into a domain donation record.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::CorruptRow` if a required column is invalid.
    pub fn into_donation(self) -> Result<DonationRecord, PersistenceError> {
        const TABLE: &str = "donations";
        let donor_id: UserId = UserId::new(&self.donor_id).map_err(corrupt(TABLE))?;
        let blood_type: Option<BloodType> =
            read_blood_type(donor_id.as_str(), self.blood_type.as_deref());

        Ok(DonationRecord {
            donation_id: DonationId::new(self.donation_id),
            donor_id,
            request_id: RequestId::new(self.request_id),
            units: to_u32(TABLE, "units", self.units)?,
            blood_type,
            status: DonationStatus::from_str(&self.status).map_err(corrupt(TABLE))?,
            offered_at: parse_timestamp(TABLE, &self.offered_at)?,
            created_at: parse_timestamp(TABLE, &self.created_at)?,
            updated_at: parse_timestamp(TABLE, &self.updated_at)?,
        })
    }
}

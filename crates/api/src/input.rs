// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Parsing of raw request fields into domain values.

use hemolink_domain::{
    BloodType, DonationStatus, RequestStatus, Role, Urgency, UserId, parse_iso_date,
};
use std::str::FromStr;
use thiserror::Error;
use time::Date;

/// A request field that could not be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    /// The field was empty.
    #[error("{field} is required")]
    Missing { field: &'static str },

    /// The field held a value the domain rejects.
    #[error("{reason}")]
    Invalid { field: &'static str, reason: String },

    /// Closing a request only accepts terminal statuses.
    #[error("A request can only be closed as completed or cancelled, not {status}")]
    NotAClosingStatus { status: RequestStatus },
}

impl InputError {
    /// Returns the name of the offending field.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Missing { field } | Self::Invalid { field, .. } => field,
            Self::NotAClosingStatus { .. } => "status",
        }
    }
}

fn parse_field<T>(field: &'static str, value: &str) -> Result<T, InputError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let trimmed: &str = value.trim();
    if trimmed.is_empty() {
        return Err(InputError::Missing { field });
    }
    T::from_str(trimmed).map_err(|e| InputError::Invalid {
        field,
        reason: e.to_string(),
    })
}

/// Parses a user identity.
///
/// # Errors
///
/// Returns an error if the identity is blank.
pub fn parse_user_id(field: &'static str, value: &str) -> Result<UserId, InputError> {
    if value.trim().is_empty() {
        return Err(InputError::Missing { field });
    }
    UserId::new(value).map_err(|e| InputError::Invalid {
        field,
        reason: e.to_string(),
    })
}

/// Parses a blood type label such as `AB+`.
///
/// # Errors
///
/// Returns an error if the label is blank or not one of the eight types.
pub fn parse_blood_type(field: &'static str, value: &str) -> Result<BloodType, InputError> {
    parse_field(field, value)
}

/// Parses an optional blood type. Blank values read as unknown.
///
/// # Errors
///
/// Returns an error if a non-blank value is not a blood type.
pub fn parse_optional_blood_type(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<BloodType>, InputError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(label) => parse_blood_type(field, label).map(Some),
    }
}

/// Parses a profile role.
///
/// # Errors
///
/// Returns an error if the role is not recognised.
pub fn parse_role(value: &str) -> Result<Role, InputError> {
    parse_field("role", value)
}

/// Parses a request urgency.
///
/// # Errors
///
/// Returns an error if the urgency is not recognised.
pub fn parse_urgency(value: &str) -> Result<Urgency, InputError> {
    parse_field("urgency", value)
}

/// Parses a donation status.
///
/// # Errors
///
/// Returns an error if the status is not recognised.
pub fn parse_donation_status(value: &str) -> Result<DonationStatus, InputError> {
    parse_field("status", value)
}

/// Parses the status a request is being closed with.
///
/// # Errors
///
/// Returns an error if the status is not recognised or is not terminal.
pub fn parse_closing_status(value: &str) -> Result<RequestStatus, InputError> {
    let status: RequestStatus = parse_field("status", value)?;
    if !status.is_terminal() {
        return Err(InputError::NotAClosingStatus { status });
    }
    Ok(status)
}

/// Parses an ISO calendar date.
///
/// # Errors
///
/// Returns an error if the date is blank or malformed.
pub fn parse_date(field: &'static str, value: &str) -> Result<Date, InputError> {
    if value.trim().is_empty() {
        return Err(InputError::Missing { field });
    }
    parse_iso_date(value.trim()).map_err(|e| InputError::Invalid {
        field,
        reason: e.to_string(),
    })
}

/// Normalises an optional free-text field. Blank values read as absent.
#[must_use]
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

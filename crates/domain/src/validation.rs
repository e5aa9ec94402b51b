// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::types::{NewBloodRequest, UserProfile};
use time::Date;
use time::macros::format_description;

/// Validates an offered unit count and narrows it to `u32`.
///
/// # Arguments
///
/// * `units` - The unit count as supplied by the caller
///
/// # Errors
///
/// Returns `DomainError::InvalidUnits` if `units` is zero, negative, or
/// does not fit in a `u32`.
pub fn validate_units(units: i64) -> Result<u32, DomainError> {
    if units <= 0 {
        return Err(DomainError::InvalidUnits { units });
    }
    u32::try_from(units).map_err(|_| DomainError::InvalidUnits { units })
}

/// Validates that a profile's basic field constraints are met.
///
/// # Errors
///
/// Returns `DomainError::InvalidDisplayName` if the display name is blank.
pub fn validate_profile_fields(profile: &UserProfile) -> Result<(), DomainError> {
    if profile.display_name.trim().is_empty() {
        return Err(DomainError::InvalidDisplayName(String::from(
            "Display name cannot be empty",
        )));
    }
    Ok(())
}

/// Validates a new blood request before it is persisted.
///
/// # Errors
///
/// Returns `DomainError::InvalidQuantity` if no units are requested.
pub fn validate_new_request(request: &NewBloodRequest) -> Result<(), DomainError> {
    if request.quantity == 0 {
        return Err(DomainError::InvalidQuantity { quantity: 0 });
    }
    Ok(())
}

/// Parses an ISO 8601 calendar date (`YYYY-MM-DD`).
///
/// # Errors
///
/// Returns `DomainError::DateParseError` if the string is not a valid date.
pub fn parse_iso_date(value: &str) -> Result<Date, DomainError> {
    Date::parse(value, format_description!("[year]-[month]-[day]")).map_err(|e| {
        DomainError::DateParseError {
            date_string: value.to_string(),
            error: e.to_string(),
        }
    })
}

// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use hemolink::CoreError;
use hemolink_domain::DomainError;

use crate::input::InputError;

/// API-level errors.
///
/// These are distinct from domain/core errors and represent the API contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// A domain rule was violated.
    DomainRuleViolation {
        /// The rule that was violated.
        rule: String,
        /// A human-readable description of the violation.
        message: String,
    },
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// A requested resource was not found.
    ResourceNotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// A concurrent writer kept winning. The caller may retry.
    Conflict {
        /// A human-readable description of the conflict.
        message: String,
    },
    /// The backing store is temporarily unavailable. The caller may retry.
    Unavailable {
        /// A human-readable description of the outage.
        message: String,
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
}

impl ApiError {
    /// Returns true if repeating the call may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. } | Self::Unavailable { .. })
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DomainRuleViolation { rule, message } => {
                write!(f, "Domain rule violation ({rule}): {message}")
            }
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::ResourceNotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::Conflict { message } => write!(f, "Conflict: {message}"),
            Self::Unavailable { message } => write!(f, "Service unavailable: {message}"),
            Self::Internal { message } => write!(f, "Internal error: {message}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<InputError> for ApiError {
    fn from(err: InputError) -> Self {
        Self::InvalidInput {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

/// Translates a domain error into an API error.
///
/// This translation is explicit and ensures domain errors are not leaked directly.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    let message: String = err.to_string();
    match err {
        DomainError::InvalidBloodType(_) => ApiError::InvalidInput {
            field: String::from("blood_type"),
            message,
        },
        DomainError::InvalidRole(_) => ApiError::InvalidInput {
            field: String::from("role"),
            message,
        },
        DomainError::InvalidUrgency(_) => ApiError::InvalidInput {
            field: String::from("urgency"),
            message,
        },
        DomainError::InvalidRequestStatus(_) | DomainError::InvalidDonationStatus(_) => {
            ApiError::InvalidInput {
                field: String::from("status"),
                message,
            }
        }
        DomainError::InvalidUnits { .. } => ApiError::InvalidInput {
            field: String::from("units"),
            message,
        },
        DomainError::InvalidQuantity { .. } => ApiError::InvalidInput {
            field: String::from("quantity"),
            message,
        },
        DomainError::InvalidUserId(_) => ApiError::InvalidInput {
            field: String::from("user_id"),
            message,
        },
        DomainError::InvalidDisplayName(_) => ApiError::InvalidInput {
            field: String::from("display_name"),
            message,
        },
        DomainError::DateParseError { .. } => ApiError::InvalidInput {
            field: String::from("required_date"),
            message,
        },
        DomainError::RequestNotOpen { .. } => ApiError::DomainRuleViolation {
            rule: String::from("request_accepts_offers"),
            message,
        },
        DomainError::InvalidRequestTransition { .. } => ApiError::DomainRuleViolation {
            rule: String::from("request_lifecycle"),
            message,
        },
        DomainError::InvalidDonationTransition { .. } => ApiError::DomainRuleViolation {
            rule: String::from("donation_lifecycle"),
            message,
        },
    }
}

/// Translates a core error into an API error.
///
/// This translation is explicit and ensures core errors are not leaked directly.
#[must_use]
pub fn translate_core_error(err: CoreError) -> ApiError {
    let retryable: bool = err.is_retryable();
    let message: String = err.to_string();
    match err {
        CoreError::DomainViolation(domain_err) => translate_domain_error(domain_err),
        CoreError::Store(_) if retryable => ApiError::Unavailable { message },
        CoreError::Store(_) => ApiError::Internal { message },
        CoreError::DonationNotFound(_) => ApiError::ResourceNotFound {
            resource_type: String::from("Donation"),
            message,
        },
        CoreError::RequestNotFound(_) => ApiError::ResourceNotFound {
            resource_type: String::from("Request"),
            message,
        },
        CoreError::ProfileNotFound(_) => ApiError::ResourceNotFound {
            resource_type: String::from("Profile"),
            message,
        },
        CoreError::ConcurrentConflict { .. } => ApiError::Conflict { message },
    }
}

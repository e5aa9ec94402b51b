// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::status::{DonationStatus, RequestStatus};
use crate::types::RequestId;

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The blood type string is not one of the eight recognised types.
    InvalidBloodType(String),
    /// The role string is not `donor` or `recipient`.
    InvalidRole(String),
    /// The urgency string is not a recognised urgency level.
    InvalidUrgency(String),
    /// The request status string is not a recognised status.
    InvalidRequestStatus(String),
    /// The donation status string is not a recognised status.
    InvalidDonationStatus(String),
    /// Offered units must be strictly positive.
    InvalidUnits {
        /// The rejected unit count.
        units: i64,
    },
    /// A new request must ask for at least one unit.
    InvalidQuantity {
        /// The rejected quantity.
        quantity: i64,
    },
    /// A user identity is empty.
    InvalidUserId(String),
    /// A display name is empty.
    InvalidDisplayName(String),
    /// The request no longer accepts offers.
    RequestNotOpen {
        /// The request identifier.
        request_id: RequestId,
        /// The status the request was found in.
        status: RequestStatus,
    },
    /// A request status transition is not permitted.
    InvalidRequestTransition {
        /// The current status.
        from: RequestStatus,
        /// The requested status.
        to: RequestStatus,
    },
    /// A donation status transition is not permitted.
    InvalidDonationTransition {
        /// The current status.
        from: DonationStatus,
        /// The requested status.
        to: DonationStatus,
    },
    /// Failed to parse a date or timestamp.
    DateParseError {
        /// The invalid date string.
        date_string: String,
        /// The parsing error message.
        error: String,
    },
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBloodType(value) => write!(
                f,
                "Invalid blood type '{value}'. Must be one of O-, O+, A-, A+, B-, B+, AB-, AB+"
            ),
            Self::InvalidRole(value) => {
                write!(f, "Invalid role '{value}'. Must be 'donor' or 'recipient'")
            }
            Self::InvalidUrgency(value) => write!(
                f,
                "Invalid urgency '{value}'. Must be one of low, medium, high, critical"
            ),
            Self::InvalidRequestStatus(value) => write!(f, "Invalid request status '{value}'"),
            Self::InvalidDonationStatus(value) => write!(f, "Invalid donation status '{value}'"),
            Self::InvalidUnits { units } => {
                write!(f, "Invalid units: {units}. Must be greater than 0")
            }
            Self::InvalidQuantity { quantity } => {
                write!(f, "Invalid quantity: {quantity}. Must be greater than 0")
            }
            Self::InvalidUserId(msg) => write!(f, "Invalid user id: {msg}"),
            Self::InvalidDisplayName(msg) => write!(f, "Invalid display name: {msg}"),
            Self::RequestNotOpen { request_id, status } => {
                write!(
                    f,
                    "Request {request_id} is {status} and no longer accepts offers"
                )
            }
            Self::InvalidRequestTransition { from, to } => {
                write!(f, "Request cannot move from {from} to {to}")
            }
            Self::InvalidDonationTransition { from, to } => {
                write!(f, "Donation cannot move from {from} to {to}")
            }
            Self::DateParseError { date_string, error } => {
                write!(f, "Failed to parse date '{date_string}': {error}")
            }
        }
    }
}

impl std::error::Error for DomainError {}

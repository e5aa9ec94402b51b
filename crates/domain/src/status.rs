// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Request and donation status lifecycles.
//!
//! Both lifecycles only move forward. Requests go open → matched →
//! completed, or open/matched → cancelled. Donations go offered →
//! confirmed → completed, or offered/confirmed → rejected.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Lifecycle state of a blood request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Accepting offers.
    #[default]
    Open,
    /// Remaining quantity reached zero. No further offers.
    Matched,
    /// The recipient confirmed the request was fulfilled.
    Completed,
    /// The recipient withdrew the request.
    Cancelled,
}

impl RequestStatus {
    /// Returns the string representation used for persistence and the API.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Matched => "matched",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns true if no transition leaves this status.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Returns true if a request in this status accepts donation offers.
    #[must_use]
    pub const fn accepts_offers(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns true if the request counts as fulfilled for reporting.
    #[must_use]
    pub const fn is_fulfilled(&self) -> bool {
        matches!(self, Self::Matched | Self::Completed)
    }

    /// Checks if a transition from this status to `target` is valid.
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Open, Self::Matched)
                | (Self::Matched, Self::Completed)
                | (Self::Open | Self::Matched, Self::Cancelled)
        )
    }

    /// Validates a transition from this status to `target`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidRequestTransition` if the lifecycle
    /// does not permit the move.
    pub const fn validate_transition(&self, target: Self) -> Result<(), DomainError> {
        if self.can_transition_to(target) {
            Ok(())
        } else {
            Err(DomainError::InvalidRequestTransition {
                from: *self,
                to: target,
            })
        }
    }
}

impl FromStr for RequestStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "matched" => Ok(Self::Matched),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(DomainError::InvalidRequestStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle state of a donation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DonationStatus {
    /// The donor offered units against a request.
    #[default]
    Offered,
    /// The recipient side accepted the offer.
    Confirmed,
    /// The donation took place.
    Completed,
    /// The offer was declined.
    Rejected,
}

impl DonationStatus {
    /// Returns the string representation used for persistence and the API.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Offered => "offered",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
        }
    }

    /// Returns true if no transition leaves this status.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }

    /// Checks if a transition from this status to `target` is valid.
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Offered, Self::Confirmed)
                | (Self::Confirmed, Self::Completed)
                | (Self::Offered | Self::Confirmed, Self::Rejected)
        )
    }

    /// Validates a transition from this status to `target`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidDonationTransition` if the lifecycle
    /// does not permit the move.
    pub const fn validate_transition(&self, target: Self) -> Result<(), DomainError> {
        if self.can_transition_to(target) {
            Ok(())
        } else {
            Err(DomainError::InvalidDonationTransition {
                from: *self,
                to: target,
            })
        }
    }
}

impl FromStr for DonationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "offered" => Ok(Self::Offered),
            "confirmed" => Ok(Self::Confirmed),
            "completed" => Ok(Self::Completed),
            "rejected" => Ok(Self::Rejected),
            _ => Err(DomainError::InvalidDonationStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::blood_type::BloodType;
use crate::error::DomainError;
use crate::status::{DonationStatus, RequestStatus};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::{Date, OffsetDateTime};

/// Opaque identity supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a user identity, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidUserId` if the identity is empty.
    pub fn new(value: &str) -> Result<Self, DomainError> {
        let trimmed: &str = value.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidUserId(String::from(
                "User id cannot be empty",
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Store-assigned identifier of a blood request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(i64);

impl RequestId {
    /// Wraps a raw store identifier.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw store identifier.
    #[must_use]
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Store-assigned identifier of a donation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DonationId(i64);

impl DonationId {
    /// Wraps a raw store identifier.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw store identifier.
    #[must_use]
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for DonationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The part a user plays in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Gives blood.
    Donor,
    /// Requests blood.
    Recipient,
}

impl Role {
    /// Returns the string representation used for persistence and the API.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Donor => "donor",
            Self::Recipient => "recipient",
        }
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "donor" => Ok(Self::Donor),
            "recipient" => Ok(Self::Recipient),
            _ => Err(DomainError::InvalidRole(s.to_string())),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How pressing a request is. Informational only; never affects matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    /// Low priority.
    Low,
    /// Medium priority.
    Medium,
    /// High priority.
    High,
    /// Critical priority.
    Critical,
}

impl Urgency {
    /// Returns the string representation used for persistence and the API.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl FromStr for Urgency {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(DomainError::InvalidUrgency(s.to_string())),
        }
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user profile as owned by the identity subsystem.
///
/// `blood_type` is `None` when the stored value is absent or unrecognised.
/// Such profiles never match a compatibility query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    /// The user's identity.
    pub user_id: UserId,
    /// Name shown to other users.
    pub display_name: String,
    /// Donor or recipient.
    pub role: Role,
    /// The user's blood type, if known.
    pub blood_type: Option<BloodType>,
    /// Whether a donor is currently available to give.
    pub is_available: bool,
    /// Number of donations offered so far. Never decreases.
    pub total_donations: u32,
    /// When the donor last offered a donation.
    pub last_donation_date: Option<OffsetDateTime>,
    /// College or organisation the user belongs to.
    pub affiliation: Option<String>,
    /// Contact phone number.
    pub phone_number: Option<String>,
    /// Contact email address.
    pub email: Option<String>,
}

impl UserProfile {
    /// Creates a profile with no donation history and no contact details.
    #[must_use]
    pub const fn new(
        user_id: UserId,
        display_name: String,
        role: Role,
        blood_type: Option<BloodType>,
        is_available: bool,
    ) -> Self {
        Self {
            user_id,
            display_name,
            role,
            blood_type,
            is_available,
            total_donations: 0,
            last_donation_date: None,
            affiliation: None,
            phone_number: None,
            email: None,
        }
    }

    /// Returns whether this profile is an available donor of one of `types`.
    #[must_use]
    pub fn is_eligible_donor_for(&self, types: &std::collections::BTreeSet<BloodType>) -> bool {
        self.role == Role::Donor
            && self.is_available
            && self.blood_type.is_some_and(|bt| types.contains(&bt))
    }
}

/// A persisted blood request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BloodRequest {
    /// Store-assigned identifier.
    pub request_id: RequestId,
    /// The recipient who raised the request. Weak reference.
    pub recipient_id: UserId,
    /// Requested blood type.
    pub blood_type: BloodType,
    /// Units still needed.
    pub quantity: u32,
    /// How pressing the request is.
    pub urgency: Urgency,
    /// Current lifecycle state.
    pub status: RequestStatus,
    /// Donors that have offered, in offer order, without repeats.
    pub matched_donors: Vec<UserId>,
    /// Free-text reason supplied by the recipient.
    pub reason: Option<String>,
    /// Date by which the blood is needed.
    pub required_date: Date,
    /// Store revision used for compare-and-update. Bumped on every write.
    pub revision: i64,
    /// Creation time.
    pub created_at: OffsetDateTime,
    /// Last modification time.
    pub updated_at: OffsetDateTime,
}

/// Data needed to create a blood request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBloodRequest {
    /// The recipient raising the request.
    pub recipient_id: UserId,
    /// Requested blood type.
    pub blood_type: BloodType,
    /// Units needed. Must be positive.
    pub quantity: u32,
    /// How pressing the request is.
    pub urgency: Urgency,
    /// Free-text reason.
    pub reason: Option<String>,
    /// Date by which the blood is needed.
    pub required_date: Date,
}

/// An append-only record of one donation offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonationRecord {
    /// Store-assigned identifier.
    pub donation_id: DonationId,
    /// The donor who offered.
    pub donor_id: UserId,
    /// The request offered against. Weak reference.
    pub request_id: RequestId,
    /// Units offered. Always positive.
    pub units: u32,
    /// The donor's blood type at the time of the offer, resolved server-side.
    pub blood_type: Option<BloodType>,
    /// Current lifecycle state. The only mutable field.
    pub status: DonationStatus,
    /// When the offer was made.
    pub offered_at: OffsetDateTime,
    /// Creation time.
    pub created_at: OffsetDateTime,
    /// Last modification time.
    pub updated_at: OffsetDateTime,
}

/// Data needed to append a donation record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDonation {
    /// The donor who offered.
    pub donor_id: UserId,
    /// The request offered against.
    pub request_id: RequestId,
    /// Units offered.
    pub units: u32,
    /// The donor's resolved blood type, if known.
    pub blood_type: Option<BloodType>,
    /// When the offer was made.
    pub offered_at: OffsetDateTime,
}

// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Two-phase offer outcomes.
//!
//! Once the donation record is committed an offer cannot fail as a whole.
//! The remaining steps each report their own outcome, and any degraded step
//! surfaces as an [`OfferWarning`].

use hemolink_domain::{BloodType, DonationId, DonationRecord, RequestStatus};

/// How the donor's blood type was resolved for the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enrichment {
    /// The donor profile carried a valid blood type.
    Resolved(BloodType),
    /// No profile exists for the donor.
    DonorNotFound,
    /// The donor profile has no usable blood type.
    BloodTypeUnknown,
    /// The profile lookup failed. The record was still written.
    LookupFailed {
        /// Human-readable cause.
        reason: String,
    },
}

impl Enrichment {
    /// Returns the resolved blood type, if any.
    #[must_use]
    pub const fn blood_type(&self) -> Option<BloodType> {
        match self {
            Self::Resolved(bt) => Some(*bt),
            Self::DonorNotFound | Self::BloodTypeUnknown | Self::LookupFailed { .. } => None,
        }
    }
}

/// Outcome of applying the offer to the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The request was updated.
    Applied {
        /// Quantity read at transaction time.
        previous_quantity: u32,
        /// Quantity written.
        new_quantity: u32,
        /// Status written.
        status: RequestStatus,
        /// Offered units beyond the remaining need.
        surplus_units: u32,
        /// Compare-and-update attempts used.
        attempts: u32,
    },
    /// The request does not exist. The record is kept.
    NotFound,
    /// The request stopped accepting offers. The record is kept.
    Closed {
        /// Status found at transaction time.
        status: RequestStatus,
    },
    /// The update could not be applied.
    Failed {
        /// Human-readable cause.
        reason: String,
        /// True if repeating the offer's request step may succeed.
        retryable: bool,
    },
}

/// Outcome of the best-effort donor statistics update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DonorStatsOutcome {
    /// Counters were incremented and the donor marked unavailable.
    Updated,
    /// The donor profile does not exist.
    Skipped,
    /// The update failed. Not rolled back.
    Failed {
        /// Human-readable cause.
        reason: String,
    },
}

/// A degraded step of an otherwise committed offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OfferWarning {
    /// No donor profile was found.
    DonorNotFound,
    /// The donor profile has no usable blood type.
    DonorBloodTypeUnknown,
    /// The donor profile could not be read.
    DonorLookupFailed(String),
    /// The request does not exist.
    RequestNotFound,
    /// The request no longer accepts offers.
    RequestClosed(RequestStatus),
    /// The request could not be updated.
    RequestUpdateFailed(String),
    /// Donor statistics could not be updated.
    DonorStatsFailed(String),
}

impl std::fmt::Display for OfferWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DonorNotFound => write!(
                f,
                "Donor profile not found; the donation was recorded without a blood type"
            ),
            Self::DonorBloodTypeUnknown => write!(
                f,
                "Donor blood type is unknown; the donation was recorded without it"
            ),
            Self::DonorLookupFailed(reason) => write!(
                f,
                "Donor profile could not be read ({reason}); the donation was recorded without a blood type"
            ),
            Self::RequestNotFound => write!(
                f,
                "Request not found; the donation was recorded but no request was updated"
            ),
            Self::RequestClosed(status) => write!(
                f,
                "Request is already {status}; the donation was recorded but the request was not updated"
            ),
            Self::RequestUpdateFailed(reason) => write!(
                f,
                "Request could not be updated ({reason}); the donation was recorded"
            ),
            Self::DonorStatsFailed(reason) => write!(
                f,
                "Donor statistics could not be updated ({reason})"
            ),
        }
    }
}

/// Result of a committed offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferOutcome {
    /// The committed record.
    pub donation: DonationRecord,
    /// Blood type resolution.
    pub enrichment: Enrichment,
    /// Request step.
    pub request: RequestOutcome,
    /// Donor statistics step.
    pub donor_stats: DonorStatsOutcome,
}

impl OfferOutcome {
    /// Returns the identity of the committed record.
    #[must_use]
    pub const fn donation_id(&self) -> DonationId {
        self.donation.donation_id
    }

    /// Collects the warnings of every degraded step, in pipeline order.
    #[must_use]
    pub fn warnings(&self) -> Vec<OfferWarning> {
        let mut warnings: Vec<OfferWarning> = Vec::new();

        match &self.enrichment {
            Enrichment::Resolved(_) => {}
            Enrichment::DonorNotFound => warnings.push(OfferWarning::DonorNotFound),
            Enrichment::BloodTypeUnknown => warnings.push(OfferWarning::DonorBloodTypeUnknown),
            Enrichment::LookupFailed { reason } => {
                warnings.push(OfferWarning::DonorLookupFailed(reason.clone()));
            }
        }

        match &self.request {
            RequestOutcome::Applied { .. } => {}
            RequestOutcome::NotFound => warnings.push(OfferWarning::RequestNotFound),
            RequestOutcome::Closed { status } => {
                warnings.push(OfferWarning::RequestClosed(*status));
            }
            RequestOutcome::Failed { reason, .. } => {
                warnings.push(OfferWarning::RequestUpdateFailed(reason.clone()));
            }
        }

        if let DonorStatsOutcome::Failed { reason } = &self.donor_stats {
            warnings.push(OfferWarning::DonorStatsFailed(reason.clone()));
        }

        warnings
    }

    /// Returns true if every step succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings().is_empty()
    }
}

// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! User-facing notices.
//!
//! Every outcome of an operation is reduced to a list of notices so a
//! client can show them without interpreting engine types.

use hemolink::{OfferOutcome, OfferWarning, RequestOutcome};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// The operation did what was asked.
    Success,
    /// The operation committed but a side effect was degraded.
    Warning,
    /// The operation failed.
    Error,
}

/// A single human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Message text.
    pub message: String,
}

impl Notice {
    /// Creates a success notice.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    /// Creates a warning notice.
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    /// Creates an error notice for a failed call.
    #[must_use]
    pub fn from_error(err: &ApiError) -> Self {
        let message: String = if err.is_retryable() {
            format!("{err}. Please try again.")
        } else {
            err.to_string()
        };
        Self {
            level: NoticeLevel::Error,
            message,
        }
    }
}

impl From<&OfferWarning> for Notice {
    fn from(warning: &OfferWarning) -> Self {
        Self::warning(warning.to_string())
    }
}

/// Builds the notices for a committed offer.
///
/// The first notice always reports the recorded donation. Each degraded
/// step adds one warning.
#[must_use]
pub fn offer_notices(outcome: &OfferOutcome) -> Vec<Notice> {
    let units: u32 = outcome.donation.units;
    let plural: &str = if units == 1 { "unit" } else { "units" };
    let headline: String = match &outcome.request {
        RequestOutcome::Applied {
            new_quantity: 0, ..
        } => format!("Donation of {units} {plural} recorded. The request is now fully matched"),
        RequestOutcome::Applied { new_quantity, .. } => format!(
            "Donation of {units} {plural} recorded. {new_quantity} still needed"
        ),
        RequestOutcome::NotFound
        | RequestOutcome::Closed { .. }
        | RequestOutcome::Failed { .. } => format!("Donation of {units} {plural} recorded"),
    };

    let mut notices: Vec<Notice> = vec![Notice::success(headline)];
    notices.extend(outcome.warnings().iter().map(Notice::from));
    notices
}

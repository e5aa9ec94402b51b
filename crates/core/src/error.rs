// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::store::StoreError;
use hemolink_domain::{DomainError, DonationId, RequestId, UserId};

/// Errors that can occur in the matching and fulfillment engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A domain rule was violated. Raised before any write.
    DomainViolation(DomainError),
    /// The store failed.
    Store(StoreError),
    /// The donation record does not exist.
    DonationNotFound(DonationId),
    /// The blood request does not exist.
    RequestNotFound(RequestId),
    /// The user profile does not exist.
    ProfileNotFound(UserId),
    /// Every compare-and-update attempt on the request lost to a concurrent writer.
    ConcurrentConflict {
        /// The contended request.
        request_id: RequestId,
        /// How many attempts were made.
        attempts: u32,
    },
}

impl CoreError {
    /// Returns true if repeating the whole operation may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Store(err) => err.is_transient(),
            Self::ConcurrentConflict { .. } => true,
            Self::DomainViolation(_)
            | Self::DonationNotFound(_)
            | Self::RequestNotFound(_)
            | Self::ProfileNotFound(_) => false,
        }
    }
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DomainViolation(err) => write!(f, "Domain violation: {err}"),
            Self::Store(err) => write!(f, "Store failure: {err}"),
            Self::DonationNotFound(id) => write!(f, "Donation {id} not found"),
            Self::RequestNotFound(id) => write!(f, "Request {id} not found"),
            Self::ProfileNotFound(id) => write!(f, "Profile '{id}' not found"),
            Self::ConcurrentConflict {
                request_id,
                attempts,
            } => write!(
                f,
                "Request {request_id} was modified concurrently; gave up after {attempts} attempts"
            ),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        Self::DomainViolation(err)
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

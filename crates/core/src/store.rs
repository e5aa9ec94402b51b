// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The document store port.
//!
//! The engine never talks to a database directly. Every read and write goes
//! through [`DonationStore`], and each method call is one round trip: callers
//! must not assume two calls are observed atomically by anyone else. The only
//! atomic multi-field write is [`DonationStore::compare_and_update_request`].

use crate::live::ChangeEvent;
use async_trait::async_trait;
use hemolink_domain::{
    BloodRequest, BloodType, DonationId, DonationRecord, DonationStatus, Fulfillment,
    NewBloodRequest, NewDonation, RequestId, RequestStatus, UserId, UserProfile,
};
use std::collections::BTreeSet;
use time::OffsetDateTime;
use tokio::sync::broadcast;

/// Errors reported by a store implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store was unreachable, busy, or timed out. Retrying may succeed.
    Unavailable(String),
    /// The store rejected the operation or returned unusable data.
    Backend(String),
}

impl StoreError {
    /// Returns true if the failure is transient.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(msg) => write!(f, "store unavailable: {msg}"),
            Self::Backend(msg) => write!(f, "store error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// A conditional write of the mutable request fields.
///
/// The store applies it only if the request's revision still equals
/// `expected_revision`, and bumps the revision when it does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestUpdate {
    /// The request to update.
    pub request_id: RequestId,
    /// The revision the update was computed from.
    pub expected_revision: i64,
    /// New remaining quantity.
    pub quantity: u32,
    /// New status.
    pub status: RequestStatus,
    /// New donor list.
    pub matched_donors: Vec<UserId>,
    /// Modification time.
    pub updated_at: OffsetDateTime,
}

impl RequestUpdate {
    /// Builds the update that records `fulfillment` against `request`.
    #[must_use]
    pub fn from_fulfillment(
        request: &BloodRequest,
        fulfillment: &Fulfillment,
        at: OffsetDateTime,
    ) -> Self {
        Self {
            request_id: request.request_id,
            expected_revision: request.revision,
            quantity: fulfillment.new_quantity,
            status: fulfillment.new_status,
            matched_donors: fulfillment.matched_donors.clone(),
            updated_at: at,
        }
    }

    /// Builds an update that only changes the status of `request`.
    #[must_use]
    pub fn status_change(
        request: &BloodRequest,
        status: RequestStatus,
        at: OffsetDateTime,
    ) -> Self {
        Self {
            request_id: request.request_id,
            expected_revision: request.revision,
            quantity: request.quantity,
            status,
            matched_donors: request.matched_donors.clone(),
            updated_at: at,
        }
    }
}

/// Result of a compare-and-update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateResult {
    /// The update was applied. Carries the request as written.
    Applied(BloodRequest),
    /// The revision moved on. Nothing was written.
    Conflict,
    /// The request does not exist.
    NotFound,
}

/// Point reads, filtered queries, a compare-and-update primitive for
/// requests, and a change feed.
#[async_trait]
pub trait DonationStore: Send + Sync + 'static {
    /// Reads one profile.
    async fn get_profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, StoreError>;

    /// Lists every profile.
    async fn list_profiles(&self) -> Result<Vec<UserProfile>, StoreError>;

    /// Lists available donors whose blood type is in `blood_types`.
    async fn list_available_donors(
        &self,
        blood_types: &BTreeSet<BloodType>,
    ) -> Result<Vec<UserProfile>, StoreError>;

    /// Inserts or replaces a profile, keeping its donation counters.
    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), StoreError>;

    /// Increments `total_donations`, sets `last_donation_date` and marks the
    /// donor unavailable. Returns false if the profile does not exist.
    async fn record_donor_donation(
        &self,
        donor_id: &UserId,
        at: OffsetDateTime,
    ) -> Result<bool, StoreError>;

    /// Sets a donor's availability. Returns false if the profile does not exist.
    async fn set_donor_availability(
        &self,
        donor_id: &UserId,
        available: bool,
    ) -> Result<bool, StoreError>;

    /// Creates a request in the `open` status.
    async fn create_request(
        &self,
        request: &NewBloodRequest,
        at: OffsetDateTime,
    ) -> Result<BloodRequest, StoreError>;

    /// Reads one request at its current revision.
    async fn get_request(&self, request_id: RequestId) -> Result<Option<BloodRequest>, StoreError>;

    /// Lists requests, optionally restricted to one status.
    async fn list_requests(
        &self,
        status: Option<RequestStatus>,
    ) -> Result<Vec<BloodRequest>, StoreError>;

    /// Atomically applies `update` if the request is still at the expected revision.
    async fn compare_and_update_request(
        &self,
        update: &RequestUpdate,
    ) -> Result<UpdateResult, StoreError>;

    /// Appends a donation record with status `offered`.
    async fn insert_donation(&self, donation: &NewDonation)
    -> Result<DonationRecord, StoreError>;

    /// Reads one donation record.
    async fn get_donation(
        &self,
        donation_id: DonationId,
    ) -> Result<Option<DonationRecord>, StoreError>;

    /// Sets the status of a donation record.
    async fn update_donation_status(
        &self,
        donation_id: DonationId,
        status: DonationStatus,
        at: OffsetDateTime,
    ) -> Result<Option<DonationRecord>, StoreError>;

    /// Lists a donor's donation records.
    async fn list_donations_for_donor(
        &self,
        donor_id: &UserId,
    ) -> Result<Vec<DonationRecord>, StoreError>;

    /// Subscribes to committed changes.
    fn changes(&self) -> broadcast::Receiver<ChangeEvent>;
}

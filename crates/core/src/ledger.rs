// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The fulfillment ledger.
//!
//! Owns every write that follows from a donation offer. An offer runs as a
//! pipeline of store round trips:
//!
//! 1. Resolve the donor's blood type (never blocks the offer)
//! 2. Append the donation record
//! 3. Apply the offer to the request with compare-and-update, retrying on conflict
//! 4. Update donor statistics (best effort)
//!
//! Nothing before step 2 writes. Nothing after step 2 is rolled back.

use crate::error::CoreError;
use crate::live::{ChangeEvent, LiveQueryRegistry, Subscription, spawn_live_query};
use crate::outcome::{DonorStatsOutcome, Enrichment, OfferOutcome, RequestOutcome};
use crate::store::{DonationStore, RequestUpdate, UpdateResult};
use hemolink_domain::{
    BloodRequest, DomainError, DonationId, DonationRecord, DonationStatus, Fulfillment,
    NewDonation, RequestId, RequestStatus, UserId, apply_offer, validate_units,
};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

/// Default compare-and-update budget for one request mutation.
pub const DEFAULT_MAX_UPDATE_ATTEMPTS: u32 = 8;

/// Result type delivered by a donation history subscription.
pub type DonationHistory = Result<Vec<DonationRecord>, CoreError>;

/// Ledger tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Compare-and-update attempts before a request mutation gives up.
    pub max_update_attempts: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_update_attempts: DEFAULT_MAX_UPDATE_ATTEMPTS,
        }
    }
}

/// Applies donation offers and the request and donation lifecycles.
pub struct FulfillmentLedger<S: DonationStore> {
    store: Arc<S>,
    config: LedgerConfig,
    history: LiveQueryRegistry<UserId, DonationHistory>,
}

impl<S: DonationStore> FulfillmentLedger<S> {
    /// Creates a ledger over `store`.
    #[must_use]
    pub fn new(store: Arc<S>, config: LedgerConfig) -> Self {
        Self {
            store,
            config,
            history: LiveQueryRegistry::new(),
        }
    }

    /// Returns the ledger configuration.
    #[must_use]
    pub const fn config(&self) -> LedgerConfig {
        self.config
    }

    /// Records a donation offer and applies it to the request.
    ///
    /// # Arguments
    ///
    /// * `donor_id` - The offering donor
    /// * `request_id` - The request offered against
    /// * `units` - Units offered, as supplied by the caller
    /// * `at` - Offer time, used for the record and donor statistics
    ///
    /// # Returns
    ///
    /// The committed record with the outcome of every later step. Degraded
    /// steps are reported through [`OfferOutcome::warnings`].
    ///
    /// # Errors
    ///
    /// Returns an error only when nothing was committed:
    /// - `CoreError::DomainViolation` if `units` is not positive
    /// - `CoreError::Store` if the donation record could not be written
    pub async fn offer(
        &self,
        donor_id: &UserId,
        request_id: RequestId,
        units: i64,
        at: OffsetDateTime,
    ) -> Result<OfferOutcome, CoreError> {
        let units: u32 = validate_units(units)?;

        let enrichment: Enrichment = self.resolve_donor(donor_id).await;

        let new_donation: NewDonation = NewDonation {
            donor_id: donor_id.clone(),
            request_id,
            units,
            blood_type: enrichment.blood_type(),
            offered_at: at,
        };
        let donation: DonationRecord = self
            .store
            .insert_donation(&new_donation)
            .await
            .map_err(|err| {
                error!(%donor_id, %request_id, error = %err, "Failed to record donation");
                CoreError::Store(err)
            })?;
        info!(
            donation_id = %donation.donation_id,
            %donor_id,
            %request_id,
            units,
            "Recorded donation offer"
        );

        let request: RequestOutcome = self
            .apply_to_request(donor_id, request_id, units, at)
            .await;

        let donor_stats: DonorStatsOutcome = if enrichment == Enrichment::DonorNotFound {
            DonorStatsOutcome::Skipped
        } else {
            self.update_donor_stats(donor_id, at).await
        };

        Ok(OfferOutcome {
            donation,
            enrichment,
            request,
            donor_stats,
        })
    }

    async fn resolve_donor(&self, donor_id: &UserId) -> Enrichment {
        match self.store.get_profile(donor_id).await {
            Ok(Some(profile)) => profile.blood_type.map_or_else(
                || {
                    warn!(%donor_id, "Donor has no usable blood type");
                    Enrichment::BloodTypeUnknown
                },
                Enrichment::Resolved,
            ),
            Ok(None) => {
                warn!(%donor_id, "Donor profile not found");
                Enrichment::DonorNotFound
            }
            Err(err) => {
                warn!(%donor_id, error = %err, "Donor lookup failed");
                Enrichment::LookupFailed {
                    reason: err.to_string(),
                }
            }
        }
    }

    async fn apply_to_request(
        &self,
        donor_id: &UserId,
        request_id: RequestId,
        units: u32,
        at: OffsetDateTime,
    ) -> RequestOutcome {
        let max_attempts: u32 = self.config.max_update_attempts.max(1);

        for attempt in 1..=max_attempts {
            let request: BloodRequest = match self.store.get_request(request_id).await {
                Ok(Some(request)) => request,
                Ok(None) => {
                    warn!(%request_id, "Request not found; donation kept");
                    return RequestOutcome::NotFound;
                }
                Err(err) => {
                    error!(%request_id, error = %err, "Failed to read request");
                    return RequestOutcome::Failed {
                        reason: err.to_string(),
                        retryable: err.is_transient(),
                    };
                }
            };

            let fulfillment: Fulfillment = match apply_offer(&request, donor_id, units) {
                Ok(fulfillment) => fulfillment,
                Err(err) => {
                    warn!(
                        %request_id,
                        status = %request.status,
                        error = %err,
                        "Request closed; donation kept"
                    );
                    return RequestOutcome::Closed {
                        status: request.status,
                    };
                }
            };

            let update: RequestUpdate = RequestUpdate::from_fulfillment(&request, &fulfillment, at);
            match self.store.compare_and_update_request(&update).await {
                Ok(UpdateResult::Applied(written)) => {
                    info!(
                        %request_id,
                        previous_quantity = fulfillment.previous_quantity,
                        new_quantity = written.quantity,
                        status = %written.status,
                        attempt,
                        "Applied offer to request"
                    );
                    return RequestOutcome::Applied {
                        previous_quantity: fulfillment.previous_quantity,
                        new_quantity: written.quantity,
                        status: written.status,
                        surplus_units: fulfillment.surplus_units,
                        attempts: attempt,
                    };
                }
                Ok(UpdateResult::Conflict) => {
                    warn!(%request_id, attempt, "Request modified concurrently; retrying");
                    tokio::task::yield_now().await;
                }
                Ok(UpdateResult::NotFound) => {
                    warn!(%request_id, "Request disappeared during update; donation kept");
                    return RequestOutcome::NotFound;
                }
                Err(err) => {
                    error!(%request_id, error = %err, "Failed to update request");
                    return RequestOutcome::Failed {
                        reason: err.to_string(),
                        retryable: err.is_transient(),
                    };
                }
            }
        }

        let exhausted: CoreError = CoreError::ConcurrentConflict {
            request_id,
            attempts: max_attempts,
        };
        error!(%request_id, attempts = max_attempts, "Gave up updating request");
        RequestOutcome::Failed {
            reason: exhausted.to_string(),
            retryable: exhausted.is_retryable(),
        }
    }

    async fn update_donor_stats(&self, donor_id: &UserId, at: OffsetDateTime) -> DonorStatsOutcome {
        match self.store.record_donor_donation(donor_id, at).await {
            Ok(true) => {
                debug!(%donor_id, "Updated donor statistics");
                DonorStatsOutcome::Updated
            }
            Ok(false) => {
                warn!(%donor_id, "Donor vanished before statistics update");
                DonorStatsOutcome::Skipped
            }
            Err(err) => {
                warn!(%donor_id, error = %err, "Failed to update donor statistics");
                DonorStatsOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }

    /// Lists a donor's donation records, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Store` if the records cannot be read.
    pub async fn donation_history(&self, donor_id: &UserId) -> DonationHistory {
        load_history(self.store.as_ref(), donor_id).await
    }

    /// Subscribes to a donor's donation history.
    ///
    /// Subscriptions for the same donor share one live query.
    pub async fn subscribe_donation_history(
        &self,
        donor_id: &UserId,
    ) -> Subscription<DonationHistory> {
        let watched: UserId = donor_id.clone();
        let queried: UserId = donor_id.clone();
        let store: Arc<S> = Arc::clone(&self.store);
        self.history
            .get_or_start(donor_id.clone(), || {
                spawn_live_query(
                    self.store.changes(),
                    move |event: &ChangeEvent| match event {
                        ChangeEvent::DonationRecorded { donor_id, .. }
                        | ChangeEvent::DonationUpdated { donor_id, .. } => *donor_id == watched,
                        ChangeEvent::ProfileChanged { .. } | ChangeEvent::RequestChanged { .. } => {
                            false
                        }
                    },
                    move || {
                        let store: Arc<S> = Arc::clone(&store);
                        let donor_id: UserId = queried.clone();
                        async move { load_history(store.as_ref(), &donor_id).await }
                    },
                )
            })
            .await
    }

    /// Moves a donation record along its lifecycle.
    ///
    /// # Errors
    ///
    /// - `CoreError::DonationNotFound` if the record does not exist
    /// - `CoreError::DomainViolation` if the lifecycle forbids the move
    /// - `CoreError::Store` if the store fails
    pub async fn advance_donation(
        &self,
        donation_id: DonationId,
        status: DonationStatus,
        at: OffsetDateTime,
    ) -> Result<DonationRecord, CoreError> {
        let current: DonationRecord = self
            .store
            .get_donation(donation_id)
            .await?
            .ok_or(CoreError::DonationNotFound(donation_id))?;

        current.status.validate_transition(status)?;

        let updated: DonationRecord = self
            .store
            .update_donation_status(donation_id, status, at)
            .await?
            .ok_or(CoreError::DonationNotFound(donation_id))?;

        info!(%donation_id, from = %current.status, to = %status, "Advanced donation");
        Ok(updated)
    }

    /// Closes a request as completed or cancelled.
    ///
    /// # Errors
    ///
    /// - `CoreError::RequestNotFound` if the request does not exist
    /// - `CoreError::DomainViolation` if `status` is not terminal or the
    ///   lifecycle forbids the move
    /// - `CoreError::ConcurrentConflict` if every attempt lost a race
    /// - `CoreError::Store` if the store fails
    pub async fn close_request(
        &self,
        request_id: RequestId,
        status: RequestStatus,
        at: OffsetDateTime,
    ) -> Result<BloodRequest, CoreError> {
        let max_attempts: u32 = self.config.max_update_attempts.max(1);

        for attempt in 1..=max_attempts {
            let request: BloodRequest = self
                .store
                .get_request(request_id)
                .await?
                .ok_or(CoreError::RequestNotFound(request_id))?;

            if !status.is_terminal() {
                return Err(CoreError::DomainViolation(
                    DomainError::InvalidRequestTransition {
                        from: request.status,
                        to: status,
                    },
                ));
            }
            request.status.validate_transition(status)?;

            let update: RequestUpdate = RequestUpdate::status_change(&request, status, at);
            match self.store.compare_and_update_request(&update).await? {
                UpdateResult::Applied(written) => {
                    info!(%request_id, from = %request.status, to = %status, "Closed request");
                    return Ok(written);
                }
                UpdateResult::Conflict => {
                    warn!(%request_id, attempt, "Request modified concurrently; retrying close");
                    tokio::task::yield_now().await;
                }
                UpdateResult::NotFound => return Err(CoreError::RequestNotFound(request_id)),
            }
        }

        Err(CoreError::ConcurrentConflict {
            request_id,
            attempts: max_attempts,
        })
    }
}

async fn load_history<S: DonationStore>(store: &S, donor_id: &UserId) -> DonationHistory {
    let mut records: Vec<DonationRecord> = store.list_donations_for_donor(donor_id).await?;
    records.sort_by(|a, b| {
        b.offered_at
            .cmp(&a.offered_at)
            .then_with(|| b.donation_id.cmp(&a.donation_id))
    });
    Ok(records)
}

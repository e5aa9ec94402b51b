// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Async `DonationStore` over [`Persistence`].
//!
//! Each trait call takes the connection lock for exactly one round trip and
//! releases it before returning. Change events are published only after the
//! write has committed.

use async_trait::async_trait;
use hemolink::{ChangeEvent, ChangeFeed, DonationStore, RequestUpdate, StoreError, UpdateResult};
use hemolink_domain::{
    BloodRequest, BloodType, DonationId, DonationRecord, DonationStatus, NewBloodRequest,
    NewDonation, RequestId, RequestStatus, UserId, UserProfile,
};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::{Mutex, broadcast};
use tracing::error;

use crate::{Persistence, PersistenceError};

/// Shared, async handle on a `SQLite` database.
#[derive(Clone)]
pub struct SqliteStore {
    persistence: Arc<Mutex<Persistence>>,
    feed: ChangeFeed,
}

impl SqliteStore {
    /// Wraps an open persistence adapter.
    #[must_use]
    pub fn new(persistence: Persistence) -> Self {
        Self {
            persistence: Arc::new(Mutex::new(persistence)),
            feed: ChangeFeed::new(),
        }
    }

    /// Opens a fresh in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> Result<Self, PersistenceError> {
        Ok(Self::new(Persistence::new_in_memory()?))
    }

    /// Opens a file-backed database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        Ok(Self::new(Persistence::new_with_file(path)?))
    }

    /// Returns the feed change events are published on.
    #[must_use]
    pub const fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    async fn run<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut Persistence) -> Result<T, PersistenceError> + Send,
    ) -> Result<T, StoreError> {
        let mut persistence = self.persistence.lock().await;
        f(&mut persistence).map_err(|err| {
            error!(operation, error = %err, "Store operation failed");
            StoreError::from(err)
        })
    }
}

#[async_trait]
impl DonationStore for SqliteStore {
    async fn get_profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, StoreError> {
        self.run("get_profile", |p| p.get_profile(user_id)).await
    }

    async fn list_profiles(&self) -> Result<Vec<UserProfile>, StoreError> {
        self.run("list_profiles", Persistence::list_profiles).await
    }

    async fn list_available_donors(
        &self,
        blood_types: &BTreeSet<BloodType>,
    ) -> Result<Vec<UserProfile>, StoreError> {
        self.run("list_available_donors", |p| {
            p.list_available_donors(blood_types)
        })
        .await
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
        self.run("upsert_profile", |p| p.upsert_profile(profile))
            .await?;
        self.feed.publish(ChangeEvent::ProfileChanged {
            user_id: profile.user_id.clone(),
        });
        Ok(())
    }

    async fn record_donor_donation(
        &self,
        donor_id: &UserId,
        at: OffsetDateTime,
    ) -> Result<bool, StoreError> {
        let found: bool = self
            .run("record_donor_donation", |p| {
                p.record_donor_donation(donor_id, at)
            })
            .await?;
        if found {
            self.feed.publish(ChangeEvent::ProfileChanged {
                user_id: donor_id.clone(),
            });
        }
        Ok(found)
    }

    async fn set_donor_availability(
        &self,
        donor_id: &UserId,
        available: bool,
    ) -> Result<bool, StoreError> {
        let found: bool = self
            .run("set_donor_availability", |p| {
                p.set_donor_availability(donor_id, available)
            })
            .await?;
        if found {
            self.feed.publish(ChangeEvent::ProfileChanged {
                user_id: donor_id.clone(),
            });
        }
        Ok(found)
    }

    async fn create_request(
        &self,
        request: &NewBloodRequest,
        at: OffsetDateTime,
    ) -> Result<BloodRequest, StoreError> {
        let created: BloodRequest = self
            .run("create_request", |p| p.create_request(request, at))
            .await?;
        self.feed.publish(ChangeEvent::RequestChanged {
            request_id: created.request_id,
        });
        Ok(created)
    }

    async fn get_request(&self, request_id: RequestId) -> Result<Option<BloodRequest>, StoreError> {
        self.run("get_request", |p| p.get_request(request_id)).await
    }

    async fn list_requests(
        &self,
        status: Option<RequestStatus>,
    ) -> Result<Vec<BloodRequest>, StoreError> {
        self.run("list_requests", |p| p.list_requests(status)).await
    }

    async fn compare_and_update_request(
        &self,
        update: &RequestUpdate,
    ) -> Result<UpdateResult, StoreError> {
        let result: UpdateResult = self
            .run("compare_and_update_request", |p| {
                p.compare_and_update_request(update)
            })
            .await?;
        if matches!(result, UpdateResult::Applied(_)) {
            self.feed.publish(ChangeEvent::RequestChanged {
                request_id: update.request_id,
            });
        }
        Ok(result)
    }

    async fn insert_donation(
        &self,
        donation: &NewDonation,
    ) -> Result<DonationRecord, StoreError> {
        let record: DonationRecord = self
            .run("insert_donation", |p| p.insert_donation(donation))
            .await?;
        self.feed.publish(ChangeEvent::DonationRecorded {
            donation_id: record.donation_id,
            donor_id: record.donor_id.clone(),
            request_id: record.request_id,
        });
        Ok(record)
    }

    async fn get_donation(
        &self,
        donation_id: DonationId,
    ) -> Result<Option<DonationRecord>, StoreError> {
        self.run("get_donation", |p| p.get_donation(donation_id))
            .await
    }

    async fn update_donation_status(
        &self,
        donation_id: DonationId,
        status: DonationStatus,
        at: OffsetDateTime,
    ) -> Result<Option<DonationRecord>, StoreError> {
        let updated: Option<DonationRecord> = self
            .run("update_donation_status", |p| {
                p.update_donation_status(donation_id, status, at)
            })
            .await?;
        if let Some(record) = &updated {
            self.feed.publish(ChangeEvent::DonationUpdated {
                donation_id,
                donor_id: record.donor_id.clone(),
            });
        }
        Ok(updated)
    }

    async fn list_donations_for_donor(
        &self,
        donor_id: &UserId,
    ) -> Result<Vec<DonationRecord>, StoreError> {
        self.run("list_donations_for_donor", |p| {
            p.list_donations_for_donor(donor_id)
        })
        .await
    }

    fn changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.feed.subscribe()
    }
}

// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{
    ChangeEvent, ChangeFeed, DonationStore, RequestUpdate, StoreError, Subscription, UpdateResult,
};
use async_trait::async_trait;
use hemolink_domain::{
    BloodRequest, BloodType, DonationId, DonationRecord, DonationStatus, NewBloodRequest,
    NewDonation, RequestId, RequestStatus, Role, Urgency, UserId, UserProfile,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use time::OffsetDateTime;
use time::macros::{date, datetime};
use tokio::sync::broadcast;

pub fn test_time() -> OffsetDateTime {
    datetime!(2026-03-01 09:00 UTC)
}

pub fn user(id: &str) -> UserId {
    UserId::new(id).unwrap()
}

pub fn create_test_donor(id: &str, blood_type: BloodType) -> UserProfile {
    let mut profile: UserProfile = UserProfile::new(
        user(id),
        format!("Donor {id}"),
        Role::Donor,
        Some(blood_type),
        true,
    );
    profile.affiliation = Some(String::from("City College"));
    profile
}

pub fn create_test_recipient(id: &str, blood_type: Option<BloodType>) -> UserProfile {
    UserProfile::new(
        user(id),
        format!("Recipient {id}"),
        Role::Recipient,
        blood_type,
        false,
    )
}

pub fn create_test_new_request(
    recipient: &str,
    blood_type: BloodType,
    quantity: u32,
) -> NewBloodRequest {
    NewBloodRequest {
        recipient_id: user(recipient),
        blood_type,
        quantity,
        urgency: Urgency::High,
        reason: Some(String::from("Surgery")),
        required_date: date!(2026 - 03 - 10),
    }
}

/// Waits until the subscription's current value satisfies `predicate`.
pub async fn wait_for<T: Clone>(
    subscription: &mut Subscription<T>,
    predicate: impl Fn(&T) -> bool,
) -> T {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let current: T = subscription.current();
            if predicate(&current) {
                return current;
            }
            assert!(subscription.changed().await, "live query stopped");
        }
    })
    .await
    .expect("timed out waiting for live query")
}

#[derive(Default)]
struct StoreState {
    profiles: BTreeMap<UserId, UserProfile>,
    requests: BTreeMap<RequestId, BloodRequest>,
    donations: BTreeMap<DonationId, DonationRecord>,
    next_request_id: i64,
    next_donation_id: i64,
}

/// A store kept in memory that yields before every round trip so that
/// concurrent callers interleave between reads and writes.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
    feed: ChangeFeed,
    pub fail_profile_reads: AtomicBool,
    pub fail_insert_donation: AtomicBool,
    pub fail_request_update: AtomicBool,
    pub fail_donor_stats: AtomicBool,
    pub forced_conflicts: AtomicU32,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut StoreState) -> R) -> R {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    pub fn insert_profile(&self, profile: UserProfile) {
        self.with_state(|s| {
            s.profiles.insert(profile.user_id.clone(), profile);
        });
    }

    pub fn profile(&self, id: &str) -> Option<UserProfile> {
        self.with_state(|s| s.profiles.get(&user(id)).cloned())
    }

    pub fn request(&self, id: RequestId) -> Option<BloodRequest> {
        self.with_state(|s| s.requests.get(&id).cloned())
    }

    pub fn donation_count(&self) -> usize {
        self.with_state(|s| s.donations.len())
    }

    fn unavailable(flag: &AtomicBool, what: &str) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("{what} timed out")));
        }
        Ok(())
    }
}

#[async_trait]
impl DonationStore for InMemoryStore {
    async fn get_profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, StoreError> {
        tokio::task::yield_now().await;
        Self::unavailable(&self.fail_profile_reads, "profile read")?;
        Ok(self.with_state(|s| s.profiles.get(user_id).cloned()))
    }

    async fn list_profiles(&self) -> Result<Vec<UserProfile>, StoreError> {
        tokio::task::yield_now().await;
        Ok(self.with_state(|s| s.profiles.values().cloned().collect()))
    }

    async fn list_available_donors(
        &self,
        blood_types: &BTreeSet<BloodType>,
    ) -> Result<Vec<UserProfile>, StoreError> {
        tokio::task::yield_now().await;
        Self::unavailable(&self.fail_profile_reads, "donor query")?;
        Ok(self.with_state(|s| {
            s.profiles
                .values()
                .filter(|p| p.is_eligible_donor_for(blood_types))
                .cloned()
                .collect()
        }))
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
        tokio::task::yield_now().await;
        self.with_state(|s| {
            let mut stored: UserProfile = profile.clone();
            if let Some(existing) = s.profiles.get(&profile.user_id) {
                stored.total_donations = existing.total_donations;
                stored.last_donation_date = existing.last_donation_date;
            }
            s.profiles.insert(stored.user_id.clone(), stored);
        });
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
        tokio::task::yield_now().await;
        Self::unavailable(&self.fail_donor_stats, "donor update")?;
        let found: bool = self.with_state(|s| {
            s.profiles.get_mut(donor_id).is_some_and(|p| {
                p.total_donations += 1;
                p.last_donation_date = Some(at);
                p.is_available = false;
                true
            })
        });
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
        tokio::task::yield_now().await;
        let found: bool = self.with_state(|s| {
            s.profiles.get_mut(donor_id).is_some_and(|p| {
                p.is_available = available;
                true
            })
        });
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
        tokio::task::yield_now().await;
        let created: BloodRequest = self.with_state(|s| {
            s.next_request_id += 1;
            let created: BloodRequest = BloodRequest {
                request_id: RequestId::new(s.next_request_id),
                recipient_id: request.recipient_id.clone(),
                blood_type: request.blood_type,
                quantity: request.quantity,
                urgency: request.urgency,
                status: RequestStatus::Open,
                matched_donors: Vec::new(),
                reason: request.reason.clone(),
                required_date: request.required_date,
                revision: 0,
                created_at: at,
                updated_at: at,
            };
            s.requests.insert(created.request_id, created.clone());
            created
        });
        self.feed.publish(ChangeEvent::RequestChanged {
            request_id: created.request_id,
        });
        Ok(created)
    }

    async fn get_request(&self, request_id: RequestId) -> Result<Option<BloodRequest>, StoreError> {
        tokio::task::yield_now().await;
        Ok(self.with_state(|s| s.requests.get(&request_id).cloned()))
    }

    async fn list_requests(
        &self,
        status: Option<RequestStatus>,
    ) -> Result<Vec<BloodRequest>, StoreError> {
        tokio::task::yield_now().await;
        Ok(self.with_state(|s| {
            s.requests
                .values()
                .filter(|r| status.is_none_or(|st| r.status == st))
                .cloned()
                .collect()
        }))
    }

    async fn compare_and_update_request(
        &self,
        update: &RequestUpdate,
    ) -> Result<UpdateResult, StoreError> {
        tokio::task::yield_now().await;
        Self::unavailable(&self.fail_request_update, "request update")?;
        if self
            .forced_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Ok(UpdateResult::Conflict);
        }

        let result: UpdateResult = self.with_state(|s| match s.requests.get_mut(&update.request_id) {
            None => UpdateResult::NotFound,
            Some(current) if current.revision != update.expected_revision => UpdateResult::Conflict,
            Some(current) => {
                current.quantity = update.quantity;
                current.status = update.status;
                current.matched_donors.clone_from(&update.matched_donors);
                current.updated_at = update.updated_at;
                current.revision += 1;
                UpdateResult::Applied(current.clone())
            }
        });
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
        tokio::task::yield_now().await;
        Self::unavailable(&self.fail_insert_donation, "donation insert")?;
        let record: DonationRecord = self.with_state(|s| {
            s.next_donation_id += 1;
            let record: DonationRecord = DonationRecord {
                donation_id: DonationId::new(s.next_donation_id),
                donor_id: donation.donor_id.clone(),
                request_id: donation.request_id,
                units: donation.units,
                blood_type: donation.blood_type,
                status: DonationStatus::Offered,
                offered_at: donation.offered_at,
                created_at: donation.offered_at,
                updated_at: donation.offered_at,
            };
            s.donations.insert(record.donation_id, record.clone());
            record
        });
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
        tokio::task::yield_now().await;
        Ok(self.with_state(|s| s.donations.get(&donation_id).cloned()))
    }

    async fn update_donation_status(
        &self,
        donation_id: DonationId,
        status: DonationStatus,
        at: OffsetDateTime,
    ) -> Result<Option<DonationRecord>, StoreError> {
        tokio::task::yield_now().await;
        let updated: Option<DonationRecord> = self.with_state(|s| {
            s.donations.get_mut(&donation_id).map(|d| {
                d.status = status;
                d.updated_at = at;
                d.clone()
            })
        });
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
        tokio::task::yield_now().await;
        Ok(self.with_state(|s| {
            s.donations
                .values()
                .filter(|d| d.donor_id == *donor_id)
                .cloned()
                .collect()
        }))
    }

    fn changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.feed.subscribe()
    }
}

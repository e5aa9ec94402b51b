// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Donor discovery.
//!
//! The directory lists available donors whose blood type a recipient can
//! receive. It is read-only and never fails a subscription: unresolvable
//! recipients and store failures are reported through [`DirectoryStatus`].

use crate::live::{ChangeEvent, LiveQueryRegistry, Subscription, spawn_live_query};
use crate::store::DonationStore;
use hemolink_domain::{BloodType, UserId, UserProfile, compatible_donor_types};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Why a listing may be incomplete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryStatus {
    /// The listing is authoritative.
    Ready,
    /// The recipient profile or its blood type could not be resolved.
    ProfileUnavailable,
    /// The store could not be read.
    StoreUnavailable(String),
}

/// A donor listing for one recipient blood type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonorListing {
    /// The recipient blood type the listing was computed for.
    pub recipient_type: Option<BloodType>,
    /// Eligible donors ordered by identity.
    pub donors: Vec<UserProfile>,
    /// Listing status.
    pub status: DirectoryStatus,
}

impl DonorListing {
    const fn empty(recipient_type: Option<BloodType>, status: DirectoryStatus) -> Self {
        Self {
            recipient_type,
            donors: Vec::new(),
            status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum DirectoryKey {
    ForType {
        blood_type: BloodType,
        exclude: Option<UserId>,
    },
    ForRecipient(UserId),
}

/// Lists and subscribes to compatible available donors.
pub struct DonorDirectory<S: DonationStore> {
    store: Arc<S>,
    live: LiveQueryRegistry<DirectoryKey, DonorListing>,
}

impl<S: DonationStore> DonorDirectory<S> {
    /// Creates a directory over `store`.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            live: LiveQueryRegistry::new(),
        }
    }

    /// Lists donors compatible with `recipient_type`, excluding `exclude`.
    pub async fn compatible_donors(
        &self,
        recipient_type: BloodType,
        exclude: Option<&UserId>,
    ) -> DonorListing {
        load_for_type(self.store.as_ref(), recipient_type, exclude).await
    }

    /// Lists donors compatible with the recipient's own blood type,
    /// excluding the recipient.
    pub async fn donors_for_recipient(&self, recipient_id: &UserId) -> DonorListing {
        load_for_recipient(self.store.as_ref(), recipient_id).await
    }

    /// Subscribes to donors compatible with `recipient_type`.
    ///
    /// Subscriptions with the same type and exclusion share one live query.
    pub async fn subscribe_donors(
        &self,
        recipient_type: BloodType,
        exclude: Option<&UserId>,
    ) -> Subscription<DonorListing> {
        self.subscribe(DirectoryKey::ForType {
            blood_type: recipient_type,
            exclude: exclude.cloned(),
        })
        .await
    }

    /// Subscribes to donors compatible with a recipient's profile.
    ///
    /// The listing follows changes to the recipient profile too.
    pub async fn subscribe_for_recipient(
        &self,
        recipient_id: &UserId,
    ) -> Subscription<DonorListing> {
        self.subscribe(DirectoryKey::ForRecipient(recipient_id.clone()))
            .await
    }

    /// Returns the number of distinct live donor queries.
    #[must_use]
    pub fn active_queries(&self) -> usize {
        self.live.active_count()
    }

    async fn subscribe(&self, key: DirectoryKey) -> Subscription<DonorListing> {
        let store: Arc<S> = Arc::clone(&self.store);
        let query_key: DirectoryKey = key.clone();
        self.live
            .get_or_start(key, || {
                debug!(key = ?query_key, "Starting live donor query");
                spawn_live_query(
                    self.store.changes(),
                    |event: &ChangeEvent| matches!(event, ChangeEvent::ProfileChanged { .. }),
                    move || {
                        let store: Arc<S> = Arc::clone(&store);
                        let key: DirectoryKey = query_key.clone();
                        async move { load(store.as_ref(), &key).await }
                    },
                )
            })
            .await
    }
}

async fn load<S: DonationStore>(store: &S, key: &DirectoryKey) -> DonorListing {
    match key {
        DirectoryKey::ForType {
            blood_type,
            exclude,
        } => load_for_type(store, *blood_type, exclude.as_ref()).await,
        DirectoryKey::ForRecipient(recipient_id) => load_for_recipient(store, recipient_id).await,
    }
}

async fn load_for_recipient<S: DonationStore>(store: &S, recipient_id: &UserId) -> DonorListing {
    match store.get_profile(recipient_id).await {
        Ok(Some(profile)) => match profile.blood_type {
            Some(blood_type) => load_for_type(store, blood_type, Some(recipient_id)).await,
            None => {
                warn!(%recipient_id, "Recipient has no usable blood type");
                DonorListing::empty(None, DirectoryStatus::ProfileUnavailable)
            }
        },
        Ok(None) => {
            warn!(%recipient_id, "Recipient profile not found");
            DonorListing::empty(None, DirectoryStatus::ProfileUnavailable)
        }
        Err(err) => {
            warn!(%recipient_id, error = %err, "Recipient lookup failed");
            DonorListing::empty(None, DirectoryStatus::StoreUnavailable(err.to_string()))
        }
    }
}

async fn load_for_type<S: DonationStore>(
    store: &S,
    recipient_type: BloodType,
    exclude: Option<&UserId>,
) -> DonorListing {
    let types: BTreeSet<BloodType> = compatible_donor_types(recipient_type);

    match store.list_available_donors(&types).await {
        Ok(candidates) => {
            let mut donors: Vec<UserProfile> = candidates
                .into_iter()
                .filter(|p| p.is_eligible_donor_for(&types))
                .filter(|p| exclude != Some(&p.user_id))
                .collect();
            donors.sort_by(|a, b| a.user_id.cmp(&b.user_id));
            debug!(%recipient_type, count = donors.len(), "Listed compatible donors");
            DonorListing {
                recipient_type: Some(recipient_type),
                donors,
                status: DirectoryStatus::Ready,
            }
        }
        Err(err) => {
            warn!(%recipient_type, error = %err, "Donor query failed");
            DonorListing::empty(
                Some(recipient_type),
                DirectoryStatus::StoreUnavailable(err.to_string()),
            )
        }
    }
}

/// Filters donors by a case-insensitive substring of their display name,
/// blood type or affiliation. A blank term keeps every donor.
#[must_use]
pub fn filter_donors(donors: &[UserProfile], term: &str) -> Vec<UserProfile> {
    let needle: String = term.trim().to_lowercase();
    if needle.is_empty() {
        return donors.to_vec();
    }

    donors
        .iter()
        .filter(|p| {
            p.display_name.to_lowercase().contains(&needle)
                || p.blood_type
                    .is_some_and(|bt| bt.as_str().to_lowercase().contains(&needle))
                || p.affiliation
                    .as_deref()
                    .is_some_and(|a| a.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}

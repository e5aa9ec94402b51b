// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Open request listing with recipient names.

use crate::error::CoreError;
use crate::ledger::FulfillmentLedger;
use crate::live::{ChangeEvent, LiveQueryRegistry, Subscription, spawn_live_query};
use crate::outcome::{OfferOutcome, RequestOutcome};
use crate::store::DonationStore;
use hemolink_domain::{BloodRequest, RequestId, RequestStatus, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{debug, warn};

/// Name shown when a recipient cannot be resolved.
pub const UNKNOWN_RECIPIENT: &str = "Unknown";

/// An open request annotated with its recipient's display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// The request.
    pub request: BloodRequest,
    /// Recipient display name, or [`UNKNOWN_RECIPIENT`].
    pub recipient_name: String,
}

/// One authoritative push of the open request listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogSnapshot {
    /// Open requests, newest first.
    pub entries: Vec<CatalogEntry>,
    /// Set when the listing could not be refreshed.
    pub error: Option<CoreError>,
}

/// Lists open requests and forwards offers to the ledger.
pub struct RequestCatalog<S: DonationStore> {
    store: Arc<S>,
    ledger: Arc<FulfillmentLedger<S>>,
    live: LiveQueryRegistry<(), CatalogSnapshot>,
}

impl<S: DonationStore> RequestCatalog<S> {
    /// Creates a catalog reading from `store` and offering through `ledger`.
    #[must_use]
    pub fn new(store: Arc<S>, ledger: Arc<FulfillmentLedger<S>>) -> Self {
        Self {
            store,
            ledger,
            live: LiveQueryRegistry::new(),
        }
    }

    /// Lists every open request, newest first.
    ///
    /// A missing recipient never fails the listing.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Store` if the requests cannot be read.
    pub async fn open_requests(&self) -> Result<Vec<CatalogEntry>, CoreError> {
        load_open_requests(self.store.as_ref()).await
    }

    /// Subscribes to the open request listing.
    ///
    /// All subscribers share one live query.
    pub async fn subscribe_open_requests(&self) -> Subscription<CatalogSnapshot> {
        let store: Arc<S> = Arc::clone(&self.store);
        self.live
            .get_or_start((), || {
                spawn_live_query(
                    self.store.changes(),
                    |event: &ChangeEvent| {
                        matches!(
                            event,
                            ChangeEvent::RequestChanged { .. } | ChangeEvent::ProfileChanged { .. }
                        )
                    },
                    move || {
                        let store: Arc<S> = Arc::clone(&store);
                        async move { snapshot(store.as_ref()).await }
                    },
                )
            })
            .await
    }

    /// Offers a donation and optimistically lowers the quantity shown in `view`.
    ///
    /// `view` only changes when the offer reached the request. The optimistic
    /// value lasts until the next snapshot is applied to `view`.
    ///
    /// # Errors
    ///
    /// Propagates the ledger's errors. `view` is untouched on error.
    pub async fn offer(
        &self,
        view: &mut CatalogView,
        donor_id: &UserId,
        request_id: RequestId,
        units: i64,
        at: OffsetDateTime,
    ) -> Result<OfferOutcome, CoreError> {
        let outcome: OfferOutcome = self.ledger.offer(donor_id, request_id, units, at).await?;
        if matches!(outcome.request, RequestOutcome::Applied { .. }) {
            view.record_offer(request_id, outcome.donation.units);
        }
        Ok(outcome)
    }
}

async fn snapshot<S: DonationStore>(store: &S) -> CatalogSnapshot {
    match load_open_requests(store).await {
        Ok(entries) => CatalogSnapshot {
            entries,
            error: None,
        },
        Err(err) => CatalogSnapshot {
            entries: Vec::new(),
            error: Some(err),
        },
    }
}

async fn load_open_requests<S: DonationStore>(store: &S) -> Result<Vec<CatalogEntry>, CoreError> {
    let mut requests: Vec<BloodRequest> = store.list_requests(Some(RequestStatus::Open)).await?;
    requests.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.request_id.cmp(&a.request_id))
    });

    let mut names: HashMap<UserId, String> = HashMap::new();
    let mut entries: Vec<CatalogEntry> = Vec::with_capacity(requests.len());
    for request in requests {
        let recipient_name: String = match names.get(&request.recipient_id) {
            Some(name) => name.clone(),
            None => {
                let name: String = resolve_recipient_name(store, &request.recipient_id).await;
                names.insert(request.recipient_id.clone(), name.clone());
                name
            }
        };
        entries.push(CatalogEntry {
            request,
            recipient_name,
        });
    }

    debug!(count = entries.len(), "Listed open requests");
    Ok(entries)
}

async fn resolve_recipient_name<S: DonationStore>(store: &S, recipient_id: &UserId) -> String {
    match store.get_profile(recipient_id).await {
        Ok(Some(profile)) if !profile.display_name.trim().is_empty() => profile.display_name,
        Ok(_) => String::from(UNKNOWN_RECIPIENT),
        Err(err) => {
            warn!(%recipient_id, error = %err, "Recipient lookup failed");
            String::from(UNKNOWN_RECIPIENT)
        }
    }
}

/// A client-side view of the catalog.
///
/// Holds the last authoritative snapshot plus units offered locally since.
/// The displayed quantity is the authoritative one minus pending units,
/// clamped at zero.
#[derive(Debug, Clone, Default)]
pub struct CatalogView {
    snapshot: CatalogSnapshot,
    pending: HashMap<RequestId, u32>,
}

impl CatalogView {
    /// Creates a view from an authoritative snapshot.
    #[must_use]
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self {
            snapshot,
            pending: HashMap::new(),
        }
    }

    /// Replaces the authoritative data and drops every optimistic value.
    pub fn apply_snapshot(&mut self, snapshot: CatalogSnapshot) {
        self.snapshot = snapshot;
        self.pending.clear();
    }

    /// Records units offered locally against `request_id`.
    pub fn record_offer(&mut self, request_id: RequestId, units: u32) {
        let pending: &mut u32 = self.pending.entry(request_id).or_insert(0);
        *pending = pending.saturating_add(units);
    }

    /// Returns the quantity currently displayed for `request_id`.
    #[must_use]
    pub fn displayed_quantity(&self, request_id: RequestId) -> Option<u32> {
        self.snapshot
            .entries
            .iter()
            .find(|e| e.request.request_id == request_id)
            .map(|e| self.project(e.request.request_id, e.request.quantity))
    }

    /// Returns the entries with optimistic quantities applied.
    #[must_use]
    pub fn entries(&self) -> Vec<CatalogEntry> {
        self.snapshot
            .entries
            .iter()
            .map(|e| {
                let mut entry: CatalogEntry = e.clone();
                entry.request.quantity = self.project(e.request.request_id, e.request.quantity);
                entry
            })
            .collect()
    }

    /// Returns the error of the last snapshot, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&CoreError> {
        self.snapshot.error.as_ref()
    }

    fn project(&self, request_id: RequestId, quantity: u32) -> u32 {
        self.pending
            .get(&request_id)
            .map_or(quantity, |units| quantity.saturating_sub(*units))
    }
}

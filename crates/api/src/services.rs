// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use hemolink::{DonationStore, DonorDirectory, FulfillmentLedger, LedgerConfig, RequestCatalog};
use std::sync::Arc;

/// The engine components the handlers operate on, built over one store.
pub struct Services<S: DonationStore> {
    /// The backing store.
    pub store: Arc<S>,
    /// Offer pipeline and lifecycle transitions.
    pub ledger: Arc<FulfillmentLedger<S>>,
    /// Compatible donor listings.
    pub directory: DonorDirectory<S>,
    /// Open request listings.
    pub catalog: RequestCatalog<S>,
}

impl<S: DonationStore> Services<S> {
    /// Builds every component over `store`.
    #[must_use]
    pub fn new(store: Arc<S>, config: LedgerConfig) -> Self {
        let ledger: Arc<FulfillmentLedger<S>> =
            Arc::new(FulfillmentLedger::new(Arc::clone(&store), config));
        Self {
            directory: DonorDirectory::new(Arc::clone(&store)),
            catalog: RequestCatalog::new(Arc::clone(&store), Arc::clone(&ledger)),
            ledger,
            store,
        }
    }
}

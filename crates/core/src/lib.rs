// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

//! Matching and fulfillment engine.
//!
//! Everything here talks to storage through the [`DonationStore`] port:
//!
//! - [`DonorDirectory`] finds compatible available donors
//! - [`FulfillmentLedger`] records offers and reconciles request quantities
//! - [`RequestCatalog`] lists open requests with recipient names
//! - [`dashboard_stats`] aggregates the dashboard read model

mod catalog;
mod directory;
mod error;
mod ledger;
mod live;
mod outcome;
mod stats;
mod store;

#[cfg(test)]
mod tests;

pub use catalog::{CatalogEntry, CatalogSnapshot, CatalogView, RequestCatalog, UNKNOWN_RECIPIENT};
pub use directory::{DirectoryStatus, DonorDirectory, DonorListing, filter_donors};
pub use error::CoreError;
pub use ledger::{DEFAULT_MAX_UPDATE_ATTEMPTS, DonationHistory, FulfillmentLedger, LedgerConfig};
pub use live::{ChangeEvent, ChangeFeed, LiveQueryRegistry, Subscription, spawn_live_query};
pub use outcome::{DonorStatsOutcome, Enrichment, OfferOutcome, OfferWarning, RequestOutcome};
pub use stats::{DashboardStats, MonthlyRequests, compute_dashboard_stats, dashboard_stats};
pub use store::{DonationStore, RequestUpdate, StoreError, UpdateResult};

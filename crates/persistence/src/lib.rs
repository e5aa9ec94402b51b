// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for the Hemolink donation system.
//!
//! Profiles, blood requests and donation records live in `SQLite`, accessed
//! through Diesel. [`Persistence`] is the synchronous adapter;
//! [`SqliteStore`] wraps it as an async `DonationStore` with a change feed.
//!
//! ## Databases
//!
//! - File-backed databases run in WAL mode
//! - In-memory databases use a unique shared-cache name per instance so
//!   tests stay isolated
//!
//! Migrations are embedded and applied on open.
//!
//! ## Weak references
//!
//! Requests and donations reference profiles and each other by identity
//! only. A donation record survives a missing request, so the schema
//! declares no foreign keys between these tables.

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
#![allow(clippy::multiple_crate_versions)]

use diesel::SqliteConnection;
use hemolink::{RequestUpdate, UpdateResult};
use hemolink_domain::{
    BloodRequest, BloodType, DonationId, DonationRecord, DonationStatus, NewBloodRequest,
    NewDonation, RequestId, RequestStatus, UserId, UserProfile,
};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use time::OffsetDateTime;

/// Atomic counter for generating unique in-memory database names.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

mod connection;
mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod queries;
mod store;

#[cfg(test)]
mod tests;

pub use error::PersistenceError;
pub use store::SqliteStore;

/// Synchronous persistence adapter over a single `SQLite` connection.
pub struct Persistence {
    conn: SqliteConnection,
}

impl Persistence {
    /// Creates a new persistence adapter with an in-memory `SQLite` database.
    ///
    /// Each call receives a unique database instance via atomic counter.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id: u64 = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let shared_memory_url: String =
            format!("file:memdb_hemolink_{db_id}?mode=memory&cache=shared");

        let mut conn: SqliteConnection = connection::open(&shared_memory_url)?;
        connection::verify_foreign_keys(&mut conn)?;

        Ok(Self { conn })
    }

    /// Creates a new persistence adapter with a file-based `SQLite` database.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the `SQLite` database file
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path: &Path = path.as_ref();
        let database_url: &str = path.to_str().ok_or_else(|| {
            PersistenceError::DatabaseConnectionFailed(format!(
                "database path {} is not valid UTF-8",
                path.display()
            ))
        })?;

        let mut conn: SqliteConnection = connection::open(database_url)?;
        connection::enable_wal(&mut conn)?;
        connection::verify_foreign_keys(&mut conn)?;

        Ok(Self { conn })
    }

    /// Verifies that foreign key enforcement is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if foreign key enforcement is not enabled.
    pub fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        connection::verify_foreign_keys(&mut self.conn)
    }

    // ========================================================================
    // Profiles
    // ========================================================================

    /// Retrieves a profile by identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_profile(
        &mut self,
        user_id: &UserId,
    ) -> Result<Option<UserProfile>, PersistenceError> {
        queries::profiles::get_profile(&mut self.conn, user_id)
    }

    /// Lists every profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_profiles(&mut self) -> Result<Vec<UserProfile>, PersistenceError> {
        queries::profiles::list_profiles(&mut self.conn)
    }

    /// Lists available donors whose blood type is in `blood_types`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_available_donors(
        &mut self,
        blood_types: &BTreeSet<BloodType>,
    ) -> Result<Vec<UserProfile>, PersistenceError> {
        queries::profiles::list_available_donors(&mut self.conn, blood_types)
    }

    /// Inserts or replaces a profile, keeping its donation counters.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn upsert_profile(&mut self, profile: &UserProfile) -> Result<(), PersistenceError> {
        mutations::profiles::upsert_profile(&mut self.conn, profile)
    }

    /// Records a donation against a donor profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn record_donor_donation(
        &mut self,
        donor_id: &UserId,
        at: OffsetDateTime,
    ) -> Result<bool, PersistenceError> {
        mutations::profiles::record_donor_donation(&mut self.conn, donor_id, at)
    }

    /// Sets a donor's availability flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn set_donor_availability(
        &mut self,
        donor_id: &UserId,
        available: bool,
    ) -> Result<bool, PersistenceError> {
        mutations::profiles::set_donor_availability(&mut self.conn, donor_id, available)
    }

    // ========================================================================
    // Requests
    // ========================================================================

    /// Creates an open request.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn create_request(
        &mut self,
        request: &NewBloodRequest,
        at: OffsetDateTime,
    ) -> Result<BloodRequest, PersistenceError> {
        mutations::requests::create_request(&mut self.conn, request, at)
    }

    /// Retrieves a request.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_request(
        &mut self,
        request_id: RequestId,
    ) -> Result<Option<BloodRequest>, PersistenceError> {
        queries::requests::get_request(&mut self.conn, request_id)
    }

    /// Lists requests, optionally restricted to one status.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_requests(
        &mut self,
        status: Option<RequestStatus>,
    ) -> Result<Vec<BloodRequest>, PersistenceError> {
        queries::requests::list_requests(&mut self.conn, status)
    }

    /// Applies a conditional request update.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn compare_and_update_request(
        &mut self,
        update: &RequestUpdate,
    ) -> Result<UpdateResult, PersistenceError> {
        mutations::requests::compare_and_update_request(&mut self.conn, update)
    }

    // ========================================================================
    // Donations
    // ========================================================================

    /// Appends a donation record.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn insert_donation(
        &mut self,
        donation: &NewDonation,
    ) -> Result<DonationRecord, PersistenceError> {
        mutations::donations::insert_donation(&mut self.conn, donation)
    }

    /// Retrieves a donation record.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_donation(
        &mut self,
        donation_id: DonationId,
    ) -> Result<Option<DonationRecord>, PersistenceError> {
        queries::donations::get_donation(&mut self.conn, donation_id)
    }

    /// Sets the status of a donation record.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn update_donation_status(
        &mut self,
        donation_id: DonationId,
        status: DonationStatus,
        at: OffsetDateTime,
    ) -> Result<Option<DonationRecord>, PersistenceError> {
        mutations::donations::update_donation_status(&mut self.conn, donation_id, status, at)
    }

    /// Lists a donor's donation records.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_donations_for_donor(
        &mut self,
        donor_id: &UserId,
    ) -> Result<Vec<DonationRecord>, PersistenceError> {
        queries::donations::list_donations_for_donor(&mut self.conn, donor_id)
    }
}

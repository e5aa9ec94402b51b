// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use hemolink_domain::{BloodType, Role, UserId, UserProfile};
use std::collections::BTreeSet;
use tracing::debug;

use crate::data_models::ProfileRow;
use crate::diesel_schema::user_profiles;
use crate::error::PersistenceError;

/// Retrieves a profile by identity.
///
/// # Errors
///
/// Returns an error if the query fails or the row is corrupt.
/// Returns `Ok(None)` if the profile does not exist.
pub fn get_profile(
    conn: &mut SqliteConnection,
    user_id: &UserId,
) -> Result<Option<UserProfile>, PersistenceError> {
    debug!(%user_id, "Looking up profile");

    user_profiles::table
        .filter(user_profiles::user_id.eq(user_id.as_str()))
        .select(ProfileRow::as_select())
        .first(conn)
        .optional()?
        .map(ProfileRow::into_profile)
        .transpose()
}

/// Lists every profile ordered by identity.
///
/// # Errors
///
/// Returns an error if the query fails or a row is corrupt.
pub fn list_profiles(conn: &mut SqliteConnection) -> Result<Vec<UserProfile>, PersistenceError> {
    let rows: Vec<ProfileRow> = user_profiles::table
        .order(user_profiles::user_id.asc())
        .select(ProfileRow::as_select())
        .load(conn)?;

    rows.into_iter().map(ProfileRow::into_profile).collect()
}

/// Lists available donors whose stored blood type is one of `blood_types`.
///
/// The filter runs in SQL as a set-membership test on the stored text.
///
/// # Errors
///
/// Returns an error if the query fails or a row is corrupt.
pub fn list_available_donors(
    conn: &mut SqliteConnection,
    blood_types: &BTreeSet<BloodType>,
) -> Result<Vec<UserProfile>, PersistenceError> {
    let labels: Vec<&'static str> = blood_types.iter().map(BloodType::as_str).collect();

    let rows: Vec<ProfileRow> = user_profiles::table
        .filter(user_profiles::role.eq(Role::Donor.as_str()))
        .filter(user_profiles::is_available.eq(1))
        .filter(user_profiles::blood_type.eq_any(labels))
        .order(user_profiles::user_id.asc())
        .select(ProfileRow::as_select())
        .load(conn)?;

    debug!(count = rows.len(), "Loaded donor candidates");
    rows.into_iter().map(ProfileRow::into_profile).collect()
}

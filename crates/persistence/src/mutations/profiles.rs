// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use diesel::upsert::excluded;
use hemolink_domain::{UserId, UserProfile};
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::data_models::format_timestamp;
use crate::diesel_schema::user_profiles;
use crate::error::PersistenceError;

/// Inserts a profile or replaces its identity-owned fields.
///
/// `total_donations` and `last_donation_date` are only written on insert;
/// an existing profile keeps its counters.
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn upsert_profile(
    conn: &mut SqliteConnection,
    profile: &UserProfile,
) -> Result<(), PersistenceError> {
    let last_donation_date: Option<String> =
        profile.last_donation_date.map(format_timestamp).transpose()?;
    let total_donations: i32 = i32::try_from(profile.total_donations).unwrap_or(i32::MAX);

    diesel::insert_into(user_profiles::table)
        .values((
            user_profiles::user_id.eq(profile.user_id.as_str()),
            user_profiles::display_name.eq(&profile.display_name),
            user_profiles::role.eq(profile.role.as_str()),
            user_profiles::blood_type.eq(profile.blood_type.map(|bt| bt.as_str())),
            user_profiles::is_available.eq(i32::from(profile.is_available)),
            user_profiles::total_donations.eq(total_donations),
            user_profiles::last_donation_date.eq(last_donation_date),
            user_profiles::affiliation.eq(&profile.affiliation),
            user_profiles::phone_number.eq(&profile.phone_number),
            user_profiles::email.eq(&profile.email),
        ))
        .on_conflict(user_profiles::user_id)
        .do_update()
        .set((
            user_profiles::display_name.eq(excluded(user_profiles::display_name)),
            user_profiles::role.eq(excluded(user_profiles::role)),
            user_profiles::blood_type.eq(excluded(user_profiles::blood_type)),
            user_profiles::is_available.eq(excluded(user_profiles::is_available)),
            user_profiles::affiliation.eq(excluded(user_profiles::affiliation)),
            user_profiles::phone_number.eq(excluded(user_profiles::phone_number)),
            user_profiles::email.eq(excluded(user_profiles::email)),
        ))
        .execute(conn)?;

    info!(user_id = %profile.user_id, role = %profile.role, "Upserted profile");
    Ok(())
}

/// Records a donation against a donor profile.
///
/// Increments `total_donations`, sets `last_donation_date` and marks the
/// donor unavailable in one statement.
///
/// # Errors
///
/// Returns an error if the write fails.
/// Returns `Ok(false)` if the profile does not exist.
pub fn record_donor_donation(
    conn: &mut SqliteConnection,
    donor_id: &UserId,
    at: OffsetDateTime,
) -> Result<bool, PersistenceError> {
    let at: String = format_timestamp(at)?;

    let affected: usize = diesel::update(user_profiles::table)
        .filter(user_profiles::user_id.eq(donor_id.as_str()))
        .set((
            user_profiles::total_donations.eq(user_profiles::total_donations + 1),
            user_profiles::last_donation_date.eq(Some(at)),
            user_profiles::is_available.eq(0),
        ))
        .execute(conn)?;

    debug!(%donor_id, affected, "Recorded donor donation");
    Ok(affected > 0)
}

/// Sets a donor's availability flag.
///
/// # Errors
///
/// Returns an error if the write fails.
/// Returns `Ok(false)` if the profile does not exist.
pub fn set_donor_availability(
    conn: &mut SqliteConnection,
    donor_id: &UserId,
    available: bool,
) -> Result<bool, PersistenceError> {
    let affected: usize = diesel::update(user_profiles::table)
        .filter(user_profiles::user_id.eq(donor_id.as_str()))
        .set(user_profiles::is_available.eq(i32::from(available)))
        .execute(conn)?;

    info!(%donor_id, available, "Set donor availability");
    Ok(affected > 0)
}

// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use hemolink_domain::{DonationId, DonationRecord, UserId};

use crate::data_models::DonationRow;
use crate::diesel_schema::donations;
use crate::error::PersistenceError;

/// Retrieves a donation record.
///
/// # Errors
///
/// Returns an error if the query fails or the row is corrupt.
/// Returns `Ok(None)` if the record does not exist.
pub fn get_donation(
    conn: &mut SqliteConnection,
    donation_id: DonationId,
) -> Result<Option<DonationRecord>, PersistenceError> {
    donations::table
        .filter(donations::donation_id.eq(donation_id.value()))
        .select(DonationRow::as_select())
        .first(conn)
        .optional()?
        .map(DonationRow::into_donation)
        .transpose()
}

/// Lists a donor's donation records in insertion order.
///
/// # Errors
///
/// Returns an error if the query fails or a row is corrupt.
pub fn list_donations_for_donor(
    conn: &mut SqliteConnection,
    donor_id: &UserId,
) -> Result<Vec<DonationRecord>, PersistenceError> {
    let rows: Vec<DonationRow> = donations::table
        .filter(donations::donor_id.eq(donor_id.as_str()))
        .order(donations::donation_id.asc())
        .select(DonationRow::as_select())
        .load(conn)?;

    rows.into_iter().map(DonationRow::into_donation).collect()
}

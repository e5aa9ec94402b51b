// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use hemolink_domain::{DonationId, DonationRecord, DonationStatus, NewDonation};
use time::OffsetDateTime;
use tracing::info;

use crate::data_models::format_timestamp;
use crate::diesel_schema::donations;
use crate::error::PersistenceError;
use crate::queries::donations::get_donation;

/// Appends a donation record with status `offered`.
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn insert_donation(
    conn: &mut SqliteConnection,
    donation: &NewDonation,
) -> Result<DonationRecord, PersistenceError> {
    let units: i32 = i32::try_from(donation.units).map_err(|_| {
        PersistenceError::SerializationError(format!("units {} out of range", donation.units))
    })?;
    let offered_at: String = format_timestamp(donation.offered_at)?;

    conn.immediate_transaction(|conn| {
        let donation_id: DonationId = diesel::insert_into(donations::table)
            .values((
                donations::donor_id.eq(donation.donor_id.as_str()),
                donations::request_id.eq(donation.request_id.value()),
                donations::units.eq(units),
                donations::blood_type.eq(donation.blood_type.map(|bt| bt.as_str())),
                donations::status.eq(DonationStatus::Offered.as_str()),
                donations::offered_at.eq(&offered_at),
                donations::created_at.eq(&offered_at),
                donations::updated_at.eq(&offered_at),
            ))
            .returning(donations::donation_id)
            .get_result::<i64>(conn)
            .map(DonationId::new)?;
        info!(%donation_id, donor_id = %donation.donor_id, units, "Inserted donation");

        get_donation(conn, donation_id)?.ok_or_else(|| {
            PersistenceError::NotFound(format!("donation {donation_id} vanished after insert"))
        })
    })
}

/// Sets the status of a donation record.
///
/// # Errors
///
/// Returns an error if the write fails.
/// Returns `Ok(None)` if the record does not exist.
pub fn update_donation_status(
    conn: &mut SqliteConnection,
    donation_id: DonationId,
    status: DonationStatus,
    at: OffsetDateTime,
) -> Result<Option<DonationRecord>, PersistenceError> {
    let at: String = format_timestamp(at)?;

    conn.immediate_transaction(|conn| {
        let affected: usize = diesel::update(donations::table)
            .filter(donations::donation_id.eq(donation_id.value()))
            .set((
                donations::status.eq(status.as_str()),
                donations::updated_at.eq(&at),
            ))
            .execute(conn)?;

        if affected == 0 {
            return Ok(None);
        }
        info!(%donation_id, %status, "Updated donation status");
        get_donation(conn, donation_id)
    })
}

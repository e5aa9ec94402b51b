// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use hemolink::{RequestUpdate, UpdateResult};
use hemolink_domain::{BloodRequest, NewBloodRequest, RequestId, RequestStatus};
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::data_models::{encode_donors, format_date, format_timestamp};
use crate::diesel_schema::blood_requests;
use crate::error::PersistenceError;
use crate::queries::requests::get_request;

/// Creates a request in the `open` status at revision 0.
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn create_request(
    conn: &mut SqliteConnection,
    request: &NewBloodRequest,
    at: OffsetDateTime,
) -> Result<BloodRequest, PersistenceError> {
    let quantity: i32 = i32::try_from(request.quantity).map_err(|_| {
        PersistenceError::SerializationError(format!("quantity {} out of range", request.quantity))
    })?;
    let required_date: String = format_date(request.required_date)?;
    let at: String = format_timestamp(at)?;

    conn.immediate_transaction(|conn| {
        let request_id: RequestId = diesel::insert_into(blood_requests::table)
            .values((
                blood_requests::recipient_id.eq(request.recipient_id.as_str()),
                blood_requests::blood_type.eq(request.blood_type.as_str()),
                blood_requests::quantity.eq(quantity),
                blood_requests::urgency.eq(request.urgency.as_str()),
                blood_requests::status.eq(RequestStatus::Open.as_str()),
                blood_requests::matched_donors_json.eq("[]"),
                blood_requests::reason.eq(&request.reason),
                blood_requests::required_date.eq(&required_date),
                blood_requests::revision.eq(0_i64),
                blood_requests::created_at.eq(&at),
                blood_requests::updated_at.eq(&at),
            ))
            .returning(blood_requests::request_id)
            .get_result::<i64>(conn)
            .map(RequestId::new)?;
        info!(%request_id, recipient_id = %request.recipient_id, quantity, "Created request");

        get_request(conn, request_id)?.ok_or_else(|| {
            PersistenceError::NotFound(format!("request {request_id} vanished after insert"))
        })
    })
}

/// Applies `update` only if the request is still at the expected revision.
///
/// The revision is bumped on success. A missing row and a stale revision
/// are told apart by a follow-up read in the same transaction.
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn compare_and_update_request(
    conn: &mut SqliteConnection,
    update: &RequestUpdate,
) -> Result<UpdateResult, PersistenceError> {
    let quantity: i32 = i32::try_from(update.quantity).map_err(|_| {
        PersistenceError::SerializationError(format!("quantity {} out of range", update.quantity))
    })?;
    let matched_donors_json: String = encode_donors(&update.matched_donors)?;
    let updated_at: String = format_timestamp(update.updated_at)?;

    conn.immediate_transaction(|conn| {
        let affected: usize = diesel::update(blood_requests::table)
            .filter(blood_requests::request_id.eq(update.request_id.value()))
            .filter(blood_requests::revision.eq(update.expected_revision))
            .set((
                blood_requests::quantity.eq(quantity),
                blood_requests::status.eq(update.status.as_str()),
                blood_requests::matched_donors_json.eq(&matched_donors_json),
                blood_requests::updated_at.eq(&updated_at),
                blood_requests::revision.eq(blood_requests::revision + 1),
            ))
            .execute(conn)?;

        let current: Option<BloodRequest> = get_request(conn, update.request_id)?;
        let result: UpdateResult = match (affected, current) {
            (_, None) => UpdateResult::NotFound,
            (0, Some(_)) => UpdateResult::Conflict,
            (_, Some(written)) => UpdateResult::Applied(written),
        };

        debug!(
            request_id = %update.request_id,
            expected_revision = update.expected_revision,
            applied = matches!(result, UpdateResult::Applied(_)),
            "Compare-and-update on request"
        );
        Ok(result)
    })
}

// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use hemolink_domain::{BloodRequest, RequestId, RequestStatus};

use crate::data_models::RequestRow;
use crate::diesel_schema::blood_requests;
use crate::error::PersistenceError;

/// Retrieves a request at its current revision.
///
/// # Errors
///
/// Returns an error if the query fails or the row is corrupt.
/// Returns `Ok(None)` if the request does not exist.
pub fn get_request(
    conn: &mut SqliteConnection,
    request_id: RequestId,
) -> Result<Option<BloodRequest>, PersistenceError> {
    blood_requests::table
        .filter(blood_requests::request_id.eq(request_id.value()))
        .select(RequestRow::as_select())
        .first(conn)
        .optional()?
        .map(RequestRow::into_request)
        .transpose()
}

/// Lists requests ordered by identity, optionally restricted to one status.
///
/// # Errors
///
/// Returns an error if the query fails or a row is corrupt.
pub fn list_requests(
    conn: &mut SqliteConnection,
    status: Option<RequestStatus>,
) -> Result<Vec<BloodRequest>, PersistenceError> {
    let mut query = blood_requests::table
        .select(RequestRow::as_select())
        .order(blood_requests::request_id.asc())
        .into_boxed::<diesel::sqlite::Sqlite>();
    if let Some(status) = status {
        query = query.filter(blood_requests::status.eq(status.as_str()));
    }

    let rows: Vec<RequestRow> = query.load(conn)?;
    rows.into_iter().map(RequestRow::into_request).collect()
}

// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and fixtures.

use hemolink::LedgerConfig;
use hemolink_persistence::SqliteStore;
use std::sync::Arc;
use time::OffsetDateTime;
use time::macros::datetime;

use crate::{
    CreateRequestRequest, RequestInfo, Services, UpsertProfileRequest, create_request,
    upsert_profile,
};

pub fn test_time() -> OffsetDateTime {
    datetime!(2026-03-01 09:00 UTC)
}

pub fn create_test_services() -> Services<SqliteStore> {
    let store: SqliteStore = SqliteStore::in_memory().expect("in-memory store");
    Services::new(Arc::new(store), LedgerConfig::default())
}

pub fn create_donor_request(user_id: &str, blood_type: &str) -> UpsertProfileRequest {
    UpsertProfileRequest {
        user_id: user_id.to_string(),
        display_name: format!("Donor {user_id}"),
        role: String::from("donor"),
        blood_type: Some(blood_type.to_string()),
        is_available: true,
        affiliation: Some(String::from("City College")),
        phone_number: None,
        email: Some(format!("{user_id}@example.org")),
    }
}

pub fn create_recipient_request(user_id: &str, blood_type: Option<&str>) -> UpsertProfileRequest {
    UpsertProfileRequest {
        user_id: user_id.to_string(),
        display_name: format!("Recipient {user_id}"),
        role: String::from("recipient"),
        blood_type: blood_type.map(String::from),
        is_available: false,
        affiliation: None,
        phone_number: None,
        email: None,
    }
}

pub fn create_blood_request(
    recipient_id: &str,
    blood_type: &str,
    quantity: i64,
) -> CreateRequestRequest {
    CreateRequestRequest {
        recipient_id: recipient_id.to_string(),
        blood_type: blood_type.to_string(),
        quantity,
        urgency: String::from("high"),
        reason: Some(String::from("Surgery")),
        required_date: String::from("2026-03-10"),
    }
}

pub async fn seed_profile(services: &Services<SqliteStore>, request: &UpsertProfileRequest) {
    upsert_profile(services, request).await.unwrap();
}

/// Seeds a recipient with blood type A+ and an open request for it.
pub async fn seed_open_request(services: &Services<SqliteStore>, quantity: i64) -> RequestInfo {
    seed_profile(services, &create_recipient_request("patient", Some("A+"))).await;
    create_request(
        services,
        &create_blood_request("patient", "A+", quantity),
        test_time(),
    )
    .await
    .unwrap()
}

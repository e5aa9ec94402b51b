// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod profile_tests;
mod store_tests;

use crate::Persistence;
use hemolink_domain::{
    BloodRequest, BloodType, NewBloodRequest, NewDonation, RequestId, Role, Urgency, UserId,
    UserProfile,
};
use time::OffsetDateTime;
use time::macros::{date, datetime};

pub fn test_time() -> OffsetDateTime {
    datetime!(2026-03-01 09:00 UTC)
}

pub fn user(id: &str) -> UserId {
    UserId::new(id).unwrap()
}

pub fn create_test_persistence() -> Persistence {
    Persistence::new_in_memory().expect("in-memory database")
}

pub fn create_test_donor(id: &str, blood_type: BloodType) -> UserProfile {
    let mut profile: UserProfile = UserProfile::new(
        user(id),
        format!("Donor {id}"),
        Role::Donor,
        Some(blood_type),
        true,
    );
    profile.affiliation = Some(String::from("City College"));
    profile.email = Some(format!("{id}@example.org"));
    profile
}

pub fn create_test_recipient(id: &str, blood_type: Option<BloodType>) -> UserProfile {
    UserProfile::new(
        user(id),
        format!("Recipient {id}"),
        Role::Recipient,
        blood_type,
        false,
    )
}

pub fn create_test_new_request(
    recipient: &str,
    blood_type: BloodType,
    quantity: u32,
) -> NewBloodRequest {
    NewBloodRequest {
        recipient_id: user(recipient),
        blood_type,
        quantity,
        urgency: Urgency::Critical,
        reason: Some(String::from("Trauma")),
        required_date: date!(2026 - 03 - 05),
    }
}

pub fn create_test_new_donation(donor: &str, request_id: RequestId, units: u32) -> NewDonation {
    NewDonation {
        donor_id: user(donor),
        request_id,
        units,
        blood_type: Some(BloodType::ONegative),
        offered_at: test_time(),
    }
}

/// Creates a recipient and an open request for `quantity` units of A+.
pub fn seed_request(persistence: &mut Persistence, quantity: u32) -> BloodRequest {
    persistence
        .upsert_profile(&create_test_recipient("recipient-1", Some(BloodType::APositive)))
        .unwrap();
    persistence
        .create_request(
            &create_test_new_request("recipient-1", BloodType::APositive, quantity),
            test_time(),
        )
        .unwrap()
}

// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::Persistence;
use crate::tests::{
    create_test_donor, create_test_persistence, create_test_recipient, test_time, user,
};
use diesel::RunQueryDsl;
use hemolink_domain::{BloodType, UserProfile, compatible_donor_types};
use std::collections::BTreeSet;
use time::Duration;

#[test]
fn test_upsert_and_get_profile() {
    let mut persistence: Persistence = create_test_persistence();
    let donor: UserProfile = create_test_donor("donor-1", BloodType::ONegative);

    persistence.upsert_profile(&donor).unwrap();

    let stored: UserProfile = persistence.get_profile(&user("donor-1")).unwrap().unwrap();
    assert_eq!(stored, donor);
}

#[test]
fn test_get_missing_profile_returns_none() {
    let mut persistence: Persistence = create_test_persistence();
    assert!(persistence.get_profile(&user("ghost")).unwrap().is_none());
}

#[test]
fn test_upsert_replaces_fields_but_keeps_counters() {
    let mut persistence: Persistence = create_test_persistence();
    persistence
        .upsert_profile(&create_test_donor("donor-1", BloodType::ONegative))
        .unwrap();
    assert!(
        persistence
            .record_donor_donation(&user("donor-1"), test_time())
            .unwrap()
    );

    let mut edited: UserProfile = create_test_donor("donor-1", BloodType::ONegative);
    edited.display_name = String::from("Renamed");
    edited.is_available = true;
    persistence.upsert_profile(&edited).unwrap();

    let stored: UserProfile = persistence.get_profile(&user("donor-1")).unwrap().unwrap();
    assert_eq!(stored.display_name, "Renamed");
    assert!(stored.is_available);
    assert_eq!(stored.total_donations, 1);
    assert_eq!(stored.last_donation_date, Some(test_time()));
}

#[test]
fn test_record_donor_donation_updates_statistics() {
    let mut persistence: Persistence = create_test_persistence();
    persistence
        .upsert_profile(&create_test_donor("donor-1", BloodType::APositive))
        .unwrap();
    let later = test_time() + Duration::days(60);

    persistence
        .record_donor_donation(&user("donor-1"), test_time())
        .unwrap();
    persistence
        .record_donor_donation(&user("donor-1"), later)
        .unwrap();

    let stored: UserProfile = persistence.get_profile(&user("donor-1")).unwrap().unwrap();
    assert_eq!(stored.total_donations, 2);
    assert_eq!(stored.last_donation_date, Some(later));
    assert!(!stored.is_available);
}

#[test]
fn test_record_donor_donation_for_missing_profile() {
    let mut persistence: Persistence = create_test_persistence();
    assert!(
        !persistence
            .record_donor_donation(&user("ghost"), test_time())
            .unwrap()
    );
}

#[test]
fn test_set_donor_availability() {
    let mut persistence: Persistence = create_test_persistence();
    persistence
        .upsert_profile(&create_test_donor("donor-1", BloodType::APositive))
        .unwrap();

    assert!(
        persistence
            .set_donor_availability(&user("donor-1"), false)
            .unwrap()
    );
    assert!(
        !persistence
            .get_profile(&user("donor-1"))
            .unwrap()
            .unwrap()
            .is_available
    );
    assert!(!persistence.set_donor_availability(&user("ghost"), true).unwrap());
}

#[test]
fn test_list_available_donors_filters_role_availability_and_type() {
    let mut persistence: Persistence = create_test_persistence();
    let mut busy: UserProfile = create_test_donor("busy", BloodType::ONegative);
    busy.is_available = false;
    for profile in [
        create_test_donor("o-neg", BloodType::ONegative),
        create_test_donor("a-neg", BloodType::ANegative),
        create_test_donor("b-pos", BloodType::BPositive),
        busy,
        create_test_recipient("patient", Some(BloodType::ONegative)),
    ] {
        persistence.upsert_profile(&profile).unwrap();
    }

    let types: BTreeSet<BloodType> = compatible_donor_types(BloodType::ANegative);
    let donors: Vec<UserProfile> = persistence.list_available_donors(&types).unwrap();

    let mut ids: Vec<&str> = donors.iter().map(|p| p.user_id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["a-neg", "o-neg"]);
}

#[test]
fn test_list_available_donors_with_empty_type_set() {
    let mut persistence: Persistence = create_test_persistence();
    persistence
        .upsert_profile(&create_test_donor("o-neg", BloodType::ONegative))
        .unwrap();

    assert!(
        persistence
            .list_available_donors(&BTreeSet::new())
            .unwrap()
            .is_empty()
    );
}

#[test]
fn test_invalid_stored_blood_type_reads_as_unknown() {
    let mut persistence: Persistence = create_test_persistence();
    persistence
        .upsert_profile(&create_test_donor("donor-1", BloodType::OPositive))
        .unwrap();
    diesel::sql_query("UPDATE user_profiles SET blood_type = 'Z+' WHERE user_id = 'donor-1'")
        .execute(&mut persistence.conn)
        .unwrap();

    let stored: UserProfile = persistence.get_profile(&user("donor-1")).unwrap().unwrap();
    assert_eq!(stored.blood_type, None);

    let all_types: BTreeSet<BloodType> = BloodType::ALL.into_iter().collect();
    assert!(
        persistence
            .list_available_donors(&all_types)
            .unwrap()
            .is_empty()
    );
}

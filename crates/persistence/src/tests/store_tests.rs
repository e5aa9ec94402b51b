// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::SqliteStore;
use crate::tests::{
    create_test_donor, create_test_new_request, create_test_recipient, test_time, user,
};
use hemolink::{
    CatalogEntry, ChangeEvent, DirectoryStatus, DonationStore, DonorDirectory, DonorListing,
    FulfillmentLedger, LedgerConfig, OfferOutcome, RequestCatalog, RequestOutcome,
};
use hemolink_domain::{
    BloodRequest, BloodType, DonationRecord, DonationStatus, RequestId, RequestStatus,
    UserProfile,
};
use std::sync::Arc;
use tokio::sync::broadcast;

async fn create_test_store() -> Arc<SqliteStore> {
    let store: Arc<SqliteStore> = Arc::new(SqliteStore::in_memory().unwrap());
    store
        .upsert_profile(&create_test_recipient("patient", Some(BloodType::APositive)))
        .await
        .unwrap();
    store
        .upsert_profile(&create_test_donor("donor-1", BloodType::APositive))
        .await
        .unwrap();
    store
        .upsert_profile(&create_test_donor("donor-2", BloodType::ONegative))
        .await
        .unwrap();
    store
}

async fn seed_request(store: &SqliteStore, quantity: u32) -> RequestId {
    store
        .create_request(
            &create_test_new_request("patient", BloodType::APositive, quantity),
            test_time(),
        )
        .await
        .unwrap()
        .request_id
}

#[tokio::test]
async fn test_offer_end_to_end_on_sqlite() {
    let store: Arc<SqliteStore> = create_test_store().await;
    let request_id: RequestId = seed_request(&store, 3).await;
    let ledger: FulfillmentLedger<SqliteStore> =
        FulfillmentLedger::new(Arc::clone(&store), LedgerConfig::default());

    let outcome: OfferOutcome = ledger
        .offer(&user("donor-2"), request_id, 2, test_time())
        .await
        .unwrap();

    assert!(outcome.is_clean());
    assert_eq!(outcome.donation.blood_type, Some(BloodType::ONegative));

    let request: BloodRequest = store.get_request(request_id).await.unwrap().unwrap();
    assert_eq!(request.quantity, 1);
    assert_eq!(request.revision, 1);
    assert_eq!(request.matched_donors, vec![user("donor-2")]);

    let donor: UserProfile = store.get_profile(&user("donor-2")).await.unwrap().unwrap();
    assert_eq!(donor.total_donations, 1);
    assert!(!donor.is_available);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_offers_on_sqlite_are_not_lost() {
    let store: Arc<SqliteStore> = create_test_store().await;
    let ledger: Arc<FulfillmentLedger<SqliteStore>> = Arc::new(FulfillmentLedger::new(
        Arc::clone(&store),
        LedgerConfig::default(),
    ));

    for _ in 0..10 {
        let request_id: RequestId = seed_request(&store, 3).await;

        let handles: Vec<_> = ["donor-1", "donor-2"]
            .into_iter()
            .map(|donor| {
                let ledger: Arc<FulfillmentLedger<SqliteStore>> = Arc::clone(&ledger);
                tokio::spawn(async move {
                    ledger.offer(&user(donor), request_id, 2, test_time()).await
                })
            })
            .collect();

        for handle in handles {
            let outcome: OfferOutcome = handle.await.unwrap().unwrap();
            assert!(matches!(outcome.request, RequestOutcome::Applied { .. }));
        }

        let request: BloodRequest = store.get_request(request_id).await.unwrap().unwrap();
        assert_eq!(request.quantity, 0);
        assert_eq!(request.status, RequestStatus::Matched);
        assert_eq!(request.matched_donors.len(), 2);
        assert_eq!(request.revision, 2);
    }
}

#[tokio::test]
async fn test_writes_publish_change_events() {
    let store: Arc<SqliteStore> = create_test_store().await;
    let mut changes: broadcast::Receiver<ChangeEvent> = store.changes();

    let request_id: RequestId = seed_request(&store, 1).await;
    assert_eq!(
        changes.recv().await.unwrap(),
        ChangeEvent::RequestChanged { request_id }
    );

    let ledger: FulfillmentLedger<SqliteStore> =
        FulfillmentLedger::new(Arc::clone(&store), LedgerConfig::default());
    let outcome: OfferOutcome = ledger
        .offer(&user("donor-1"), request_id, 1, test_time())
        .await
        .unwrap();

    assert_eq!(
        changes.recv().await.unwrap(),
        ChangeEvent::DonationRecorded {
            donation_id: outcome.donation_id(),
            donor_id: user("donor-1"),
            request_id,
        }
    );
    assert_eq!(
        changes.recv().await.unwrap(),
        ChangeEvent::RequestChanged { request_id }
    );
    assert_eq!(
        changes.recv().await.unwrap(),
        ChangeEvent::ProfileChanged {
            user_id: user("donor-1")
        }
    );
}

#[tokio::test]
async fn test_missed_update_publishes_nothing() {
    let store: Arc<SqliteStore> = create_test_store().await;
    let mut changes: broadcast::Receiver<ChangeEvent> = store.changes();

    let found: bool = store
        .set_donor_availability(&user("ghost"), true)
        .await
        .unwrap();

    assert!(!found);
    assert!(matches!(
        changes.try_recv(),
        Err(broadcast::error::TryRecvError::Empty)
    ));
}

#[tokio::test]
async fn test_advance_donation_on_sqlite() {
    let store: Arc<SqliteStore> = create_test_store().await;
    let request_id: RequestId = seed_request(&store, 2).await;
    let ledger: FulfillmentLedger<SqliteStore> =
        FulfillmentLedger::new(Arc::clone(&store), LedgerConfig::default());
    let outcome: OfferOutcome = ledger
        .offer(&user("donor-1"), request_id, 1, test_time())
        .await
        .unwrap();

    let confirmed: DonationRecord = ledger
        .advance_donation(outcome.donation_id(), DonationStatus::Confirmed, test_time())
        .await
        .unwrap();

    assert_eq!(confirmed.status, DonationStatus::Confirmed);
    assert!(
        ledger
            .advance_donation(outcome.donation_id(), DonationStatus::Offered, test_time())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_directory_and_catalog_on_sqlite() {
    let store: Arc<SqliteStore> = create_test_store().await;
    let request_id: RequestId = seed_request(&store, 2).await;
    let ledger: Arc<FulfillmentLedger<SqliteStore>> = Arc::new(FulfillmentLedger::new(
        Arc::clone(&store),
        LedgerConfig::default(),
    ));

    let directory: DonorDirectory<SqliteStore> = DonorDirectory::new(Arc::clone(&store));
    let listing: DonorListing = directory.donors_for_recipient(&user("patient")).await;
    assert_eq!(listing.status, DirectoryStatus::Ready);
    assert_eq!(listing.recipient_type, Some(BloodType::APositive));
    let mut ids: Vec<&str> = listing.donors.iter().map(|d| d.user_id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["donor-1", "donor-2"]);

    let catalog: RequestCatalog<SqliteStore> = RequestCatalog::new(Arc::clone(&store), ledger);
    let entries: Vec<CatalogEntry> = catalog.open_requests().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].request.request_id, request_id);
    assert_eq!(entries[0].recipient_name, "Recipient patient");
}

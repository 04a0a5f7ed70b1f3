//! End-to-end tests for the cancellation handshake, including the
//! concurrency guarantee the conditional repository operations exist for:
//! one confirmation is consumed by exactly one poller.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};

use parkd::db::repositories::LocalRepository;
use parkd::db::repository::{FullRepository, PassRepository, ReservationRepository};
use parkd::models::{NewPass, NewReservation, SpotType};
use parkd::services::cancellation::{
    check_confirmation, confirm_scan, request_cancellation, CancelOutcome, PollResult, ScanResult,
};
use parkd::services::qr::PayloadRenderer;

fn reservation(spot_id: &str, email: &str, password: &str) -> NewReservation {
    NewReservation {
        spot_id: spot_id.to_string(),
        spot_type: SpotType::Bike,
        name: "Ana".to_string(),
        email: email.to_string(),
        password: password.to_string(),
        start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
        duration_hours: 2.0,
    }
}

#[tokio::test]
async fn handshake_runs_request_scan_poll_in_order() {
    let repo = LocalRepository::new();
    repo.create_reservation(reservation("A12", "a@x.com", "p1"))
        .await
        .unwrap();

    let outcome = request_cancellation(&repo, &PayloadRenderer, "A12", "a@x.com", "p1")
        .await
        .unwrap();
    let artifact = match outcome {
        CancelOutcome::ConfirmationRequired(artifact) => artifact,
        other => panic!("expected an artifact, got {:?}", other),
    };

    // The scanning device presents the artifact payload, not the request data.
    assert_eq!(
        confirm_scan(&repo, &artifact.payload).await.unwrap(),
        ScanResult::Confirmed
    );
    assert_eq!(
        check_confirmation(&repo, &artifact.payload).await.unwrap(),
        PollResult::Confirmed
    );
    assert_eq!(repo.reservation_count(), 0);
}

#[tokio::test]
async fn concurrent_polls_consume_one_confirmation_exactly_once() {
    let repo = Arc::new(LocalRepository::new());
    repo.create_reservation(reservation("A12", "a@x.com", "p1"))
        .await
        .unwrap();
    confirm_scan(repo.as_ref(), "A12").await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let repo = Arc::clone(&repo);
        handles.push(tokio::spawn(async move {
            check_confirmation(repo.as_ref() as &dyn FullRepository, "A12")
                .await
                .unwrap()
        }));
    }

    let mut confirmed = 0;
    for handle in handles {
        if handle.await.unwrap() == PollResult::Confirmed {
            confirmed += 1;
        }
    }
    assert_eq!(confirmed, 1);
    assert_eq!(repo.reservation_count(), 0);
}

#[tokio::test]
async fn pass_holder_cancellation_never_touches_the_scan_path() {
    let repo = LocalRepository::new();
    repo.create_monthly_pass(NewPass {
        name: "Ana".to_string(),
        email: "a@x.com".to_string(),
        age: 30,
        vehicle_number: "B-1234-XY".to_string(),
        start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
        start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
    })
    .await
    .unwrap();
    repo.create_reservation(reservation("A12", "a@x.com", "p1"))
        .await
        .unwrap();

    let outcome = request_cancellation(&repo, &PayloadRenderer, "A12", "a@x.com", "p1")
        .await
        .unwrap();
    assert!(matches!(outcome, CancelOutcome::Cancelled));

    // The handshake endpoints stay quiet for the already-deleted row.
    assert_eq!(
        confirm_scan(&repo, "A12").await.unwrap(),
        ScanResult::AlreadyOrMissing
    );
    assert_eq!(
        check_confirmation(&repo, "A12").await.unwrap(),
        PollResult::Pending
    );
}

#[tokio::test]
async fn two_spots_cancel_independently() {
    let repo = LocalRepository::new();
    repo.create_reservation(reservation("A12", "a@x.com", "p1"))
        .await
        .unwrap();
    repo.create_reservation(reservation("B7", "b@x.com", "p2"))
        .await
        .unwrap();

    confirm_scan(&repo, "A12").await.unwrap();

    // The scan for A12 is invisible to B7's poller.
    assert_eq!(
        check_confirmation(&repo, "B7").await.unwrap(),
        PollResult::Pending
    );
    assert_eq!(
        check_confirmation(&repo, "A12").await.unwrap(),
        PollResult::Confirmed
    );
    assert_eq!(repo.reservation_count(), 1);
}

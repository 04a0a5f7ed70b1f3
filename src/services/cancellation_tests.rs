//! Cancellation coordinator tests against the in-memory backend.

use chrono::{NaiveDate, NaiveTime};

use crate::db::repositories::LocalRepository;
use crate::db::repository::{PassRepository, ReservationRepository};
use crate::models::{NewPass, NewReservation, SpotType};
use crate::services::cancellation::{
    check_confirmation, confirm_scan, request_cancellation, CancelOutcome, CancellationError,
    PollResult, ScanResult,
};
use crate::services::qr::PayloadRenderer;

fn reservation(spot_id: &str, email: &str, password: &str) -> NewReservation {
    NewReservation {
        spot_id: spot_id.to_string(),
        spot_type: SpotType::Car,
        name: "Ana".to_string(),
        email: email.to_string(),
        password: password.to_string(),
        start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
        duration_hours: 2.0,
    }
}

fn pass(email: &str) -> NewPass {
    NewPass {
        name: "Ana".to_string(),
        email: email.to_string(),
        age: 30,
        vehicle_number: "B-1234-XY".to_string(),
        start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
        start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
    }
}

#[tokio::test]
async fn full_handshake_cancels_the_reservation() {
    let repo = LocalRepository::new();
    let renderer = PayloadRenderer;
    repo.create_reservation(reservation("A12", "a@x.com", "p1"))
        .await
        .unwrap();

    let outcome = request_cancellation(&repo, &renderer, "A12", "a@x.com", "p1")
        .await
        .unwrap();
    let artifact = match outcome {
        CancelOutcome::ConfirmationRequired(artifact) => artifact,
        other => panic!("expected confirmation artifact, got {:?}", other),
    };
    assert_eq!(artifact.payload, "A12");
    // Nothing is mutated until the scan happens.
    assert_eq!(repo.reservation_count(), 1);

    assert_eq!(confirm_scan(&repo, "A12").await.unwrap(), ScanResult::Confirmed);
    assert_eq!(
        check_confirmation(&repo, "A12").await.unwrap(),
        PollResult::Confirmed
    );
    assert_eq!(repo.reservation_count(), 0);
}

#[tokio::test]
async fn confirmation_is_consumed_by_the_first_poll() {
    let repo = LocalRepository::new();
    repo.create_reservation(reservation("A12", "a@x.com", "p1"))
        .await
        .unwrap();
    confirm_scan(&repo, "A12").await.unwrap();

    assert_eq!(
        check_confirmation(&repo, "A12").await.unwrap(),
        PollResult::Confirmed
    );
    // A second tab polling the same spot sees Pending, not a double success.
    assert_eq!(
        check_confirmation(&repo, "A12").await.unwrap(),
        PollResult::Pending
    );
}

#[tokio::test]
async fn repeated_scans_are_idempotent() {
    let repo = LocalRepository::new();
    repo.create_reservation(reservation("A12", "a@x.com", "p1"))
        .await
        .unwrap();

    assert_eq!(confirm_scan(&repo, "A12").await.unwrap(), ScanResult::Confirmed);
    assert_eq!(
        confirm_scan(&repo, "A12").await.unwrap(),
        ScanResult::AlreadyOrMissing
    );
}

#[tokio::test]
async fn poll_before_any_scan_is_pending() {
    let repo = LocalRepository::new();
    repo.create_reservation(reservation("A12", "a@x.com", "p1"))
        .await
        .unwrap();

    assert_eq!(
        check_confirmation(&repo, "A12").await.unwrap(),
        PollResult::Pending
    );
    assert_eq!(repo.reservation_count(), 1);
}

#[tokio::test]
async fn monthly_pass_holder_skips_the_scan() {
    let repo = LocalRepository::new();
    repo.create_monthly_pass(pass("a@x.com")).await.unwrap();
    repo.create_reservation(reservation("A12", "a@x.com", "p1"))
        .await
        .unwrap();

    let outcome = request_cancellation(&repo, &PayloadRenderer, "A12", "a@x.com", "p1")
        .await
        .unwrap();
    assert!(matches!(outcome, CancelOutcome::Cancelled));
    assert_eq!(repo.reservation_count(), 0);

    // The row is gone, so a stray scan for the spot is a no-op.
    assert_eq!(
        confirm_scan(&repo, "A12").await.unwrap(),
        ScanResult::AlreadyOrMissing
    );
}

#[tokio::test]
async fn yearly_pass_holder_skips_the_scan() {
    let repo = LocalRepository::new();
    repo.create_yearly_pass(pass("a@x.com")).await.unwrap();
    repo.create_reservation(reservation("A12", "a@x.com", "p1"))
        .await
        .unwrap();

    let outcome = request_cancellation(&repo, &PayloadRenderer, "A12", "a@x.com", "p1")
        .await
        .unwrap();
    assert!(matches!(outcome, CancelOutcome::Cancelled));
    assert_eq!(repo.reservation_count(), 0);
}

#[tokio::test]
async fn wrong_password_is_unauthorized_and_leaves_the_row_alone() {
    let repo = LocalRepository::new();
    repo.create_reservation(reservation("A12", "a@x.com", "p1"))
        .await
        .unwrap();

    let err = request_cancellation(&repo, &PayloadRenderer, "A12", "a@x.com", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, CancellationError::Unauthorized));
    assert_eq!(repo.reservation_count(), 1);
}

#[tokio::test]
async fn unknown_spot_or_email_is_not_found() {
    let repo = LocalRepository::new();
    repo.create_reservation(reservation("A12", "a@x.com", "p1"))
        .await
        .unwrap();

    let err = request_cancellation(&repo, &PayloadRenderer, "B7", "a@x.com", "p1")
        .await
        .unwrap_err();
    assert!(matches!(err, CancellationError::NotFound));

    let err = request_cancellation(&repo, &PayloadRenderer, "A12", "other@x.com", "p1")
        .await
        .unwrap_err();
    assert!(matches!(err, CancellationError::NotFound));
}

#[tokio::test]
async fn blank_fields_are_rejected_before_any_lookup() {
    let repo = LocalRepository::new();

    for (spot, email, password) in [
        ("", "a@x.com", "p1"),
        ("A12", "", "p1"),
        ("A12", "a@x.com", ""),
        ("  ", " ", "p1"),
    ] {
        let err = request_cancellation(&repo, &PayloadRenderer, spot, email, password)
            .await
            .unwrap_err();
        assert!(matches!(err, CancellationError::Validation));
    }
}

#[tokio::test]
async fn email_lookup_is_case_insensitive() {
    let repo = LocalRepository::new();
    repo.create_reservation(reservation("A12", "Ana@X.com", "p1"))
        .await
        .unwrap();

    let outcome = request_cancellation(&repo, &PayloadRenderer, "A12", "ANA@x.COM", "p1")
        .await
        .unwrap();
    assert!(matches!(outcome, CancelOutcome::ConfirmationRequired(_)));
}

#[tokio::test]
async fn scan_confirms_the_most_recent_reservation_for_the_spot() {
    let repo = LocalRepository::new();
    let first = repo
        .create_reservation(reservation("A12", "a@x.com", "p1"))
        .await
        .unwrap();
    let second = repo
        .create_reservation(reservation("A12", "b@x.com", "p2"))
        .await
        .unwrap();

    confirm_scan(&repo, "A12").await.unwrap();

    let consumed = repo.take_confirmed("A12").await.unwrap().unwrap();
    assert_eq!(consumed.id, second.id);

    // The older reservation is still there, still unconfirmed.
    let remaining = repo.find_by_spot_and_email("A12", "a@x.com").await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, first.id);
    assert!(!remaining[0].confirmed);
}

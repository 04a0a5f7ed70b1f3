//! Face verification chain tests with stub classifiers.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::db::repositories::LocalRepository;
use crate::db::repository::EmployeeRepository;
use crate::models::NewEmployee;
use crate::services::face::{
    ClassifierFailure, ClassifierMatch, FaceClassifier, FaceConfig, FaceVerifier, FaceVerifyError,
};

/// Always matches the given identity.
struct MatchStub(String);

#[async_trait]
impl FaceClassifier for MatchStub {
    async fn classify(
        &self,
        _probe: &Path,
        _reference_dir: &Path,
    ) -> Result<Option<ClassifierMatch>, ClassifierFailure> {
        Ok(Some(ClassifierMatch {
            identity: self.0.clone(),
        }))
    }
}

/// Definite "no match" verdict.
struct NoMatchStub;

#[async_trait]
impl FaceClassifier for NoMatchStub {
    async fn classify(
        &self,
        _probe: &Path,
        _reference_dir: &Path,
    ) -> Result<Option<ClassifierMatch>, ClassifierFailure> {
        Ok(None)
    }
}

/// Strategy that fails outright (simulated worker timeout).
struct FailingStub;

#[async_trait]
impl FaceClassifier for FailingStub {
    async fn classify(
        &self,
        _probe: &Path,
        _reference_dir: &Path,
    ) -> Result<Option<ClassifierMatch>, ClassifierFailure> {
        Err(ClassifierFailure::Timeout(Duration::from_secs(1)))
    }
}

fn employee(email: &str, face_reference: Option<&str>) -> NewEmployee {
    NewEmployee {
        name: "Ana".to_string(),
        email: email.to_string(),
        phone: "600123456".to_string(),
        employee_id: format!("badge-{}", email),
        age: 30,
        vehicle_number: "B-1234-XY".to_string(),
        face_reference: face_reference.map(str::to_string),
    }
}

fn config(faces_dir: &Path, temp_dir: &Path) -> FaceConfig {
    FaceConfig {
        worker_cmd: vec!["unused".to_string()],
        faces_dir: faces_dir.to_path_buf(),
        temp_dir: temp_dir.to_path_buf(),
        timeout: Duration::from_secs(1),
    }
}

#[tokio::test]
async fn recognized_probe_resolves_to_the_enrolled_employee() {
    let faces = tempfile::tempdir().unwrap();
    let temp = tempfile::tempdir().unwrap();
    let repo = LocalRepository::new();
    repo.upsert_employee(employee("ana@x.com", Some("media/employee_faces/ana.jpg")))
        .await
        .unwrap();

    let verifier = FaceVerifier::with_strategies(
        Box::new(MatchStub("media/employee_faces/ana.jpg".to_string())),
        Box::new(FailingStub),
        config(faces.path(), temp.path()),
    );

    let found = verifier.verify(&repo, b"probe", "selfie.jpg").await.unwrap();
    assert_eq!(found.email, "ana@x.com");
}

#[tokio::test]
async fn fallback_engages_when_the_primary_strategy_fails() {
    let faces = tempfile::tempdir().unwrap();
    let temp = tempfile::tempdir().unwrap();
    let repo = LocalRepository::new();
    repo.upsert_employee(employee("ana@x.com", Some("media/employee_faces/ana.jpg")))
        .await
        .unwrap();

    let verifier = FaceVerifier::with_strategies(
        Box::new(FailingStub),
        Box::new(MatchStub("ana.jpg".to_string())),
        config(faces.path(), temp.path()),
    );

    let found = verifier.verify(&repo, b"probe", "selfie.jpg").await.unwrap();
    assert_eq!(found.email, "ana@x.com");
}

#[tokio::test]
async fn definite_no_match_does_not_consult_the_fallback() {
    let faces = tempfile::tempdir().unwrap();
    let temp = tempfile::tempdir().unwrap();
    let repo = LocalRepository::new();

    let verifier = FaceVerifier::with_strategies(
        Box::new(NoMatchStub),
        // Would match if consulted; a no-match verdict must be final.
        Box::new(MatchStub("ana.jpg".to_string())),
        config(faces.path(), temp.path()),
    );

    let err = verifier
        .verify(&repo, b"probe", "selfie.jpg")
        .await
        .unwrap_err();
    assert!(matches!(err, FaceVerifyError::NotRecognized));
}

#[tokio::test]
async fn both_strategies_failing_reads_as_not_recognized() {
    let faces = tempfile::tempdir().unwrap();
    let temp = tempfile::tempdir().unwrap();
    let repo = LocalRepository::new();

    let verifier = FaceVerifier::with_strategies(
        Box::new(FailingStub),
        Box::new(FailingStub),
        config(faces.path(), temp.path()),
    );

    let err = verifier
        .verify(&repo, b"probe", "selfie.jpg")
        .await
        .unwrap_err();
    assert!(matches!(err, FaceVerifyError::NotRecognized));
}

#[tokio::test]
async fn unknown_identity_is_not_recognized() {
    let faces = tempfile::tempdir().unwrap();
    let temp = tempfile::tempdir().unwrap();
    let repo = LocalRepository::new();

    let verifier = FaceVerifier::with_strategies(
        Box::new(MatchStub("media/employee_faces/ghost.jpg".to_string())),
        Box::new(FailingStub),
        config(faces.path(), temp.path()),
    );

    let err = verifier
        .verify(&repo, b"probe", "selfie.jpg")
        .await
        .unwrap_err();
    assert!(matches!(err, FaceVerifyError::NotRecognized));
}

#[tokio::test]
async fn missing_reference_set_is_reported() {
    let temp = tempfile::tempdir().unwrap();
    let repo = LocalRepository::new();

    let verifier = FaceVerifier::with_strategies(
        Box::new(MatchStub("ana.jpg".to_string())),
        Box::new(FailingStub),
        config(Path::new("/nonexistent/face_db"), temp.path()),
    );

    let err = verifier
        .verify(&repo, b"probe", "selfie.jpg")
        .await
        .unwrap_err();
    assert!(matches!(err, FaceVerifyError::NoReferenceSet));
}

#[tokio::test]
async fn empty_probe_is_rejected() {
    let faces = tempfile::tempdir().unwrap();
    let temp = tempfile::tempdir().unwrap();
    let repo = LocalRepository::new();

    let verifier = FaceVerifier::with_strategies(
        Box::new(MatchStub("ana.jpg".to_string())),
        Box::new(FailingStub),
        config(faces.path(), temp.path()),
    );

    let err = verifier.verify(&repo, b"", "selfie.jpg").await.unwrap_err();
    assert!(matches!(err, FaceVerifyError::NoImage));
}

#[tokio::test]
async fn probe_file_is_removed_on_every_exit_path() {
    let faces = tempfile::tempdir().unwrap();
    let temp = tempfile::tempdir().unwrap();
    let repo = LocalRepository::new();
    repo.upsert_employee(employee("ana@x.com", Some("media/employee_faces/ana.jpg")))
        .await
        .unwrap();

    let verifier = FaceVerifier::with_strategies(
        Box::new(MatchStub("ana.jpg".to_string())),
        Box::new(FailingStub),
        config(faces.path(), temp.path()),
    );
    verifier.verify(&repo, b"probe", "selfie.jpg").await.unwrap();
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);

    let failing = FaceVerifier::with_strategies(
        Box::new(NoMatchStub),
        Box::new(FailingStub),
        config(faces.path(), temp.path()),
    );
    let _ = failing.verify(&repo, b"probe", "selfie.jpg").await;
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
}

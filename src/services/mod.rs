//! Business logic on top of the repository layer.
//!
//! The cancellation coordinator is the heart of the crate; face
//! verification and employee enrollment support the secondary employee
//! flow. All services take `&dyn FullRepository` so tests run against the
//! in-memory backend.

pub mod cancellation;
pub mod employees;
pub mod face;
pub mod qr;

pub use cancellation::{
    check_confirmation, confirm_scan, request_cancellation, CancelOutcome, CancellationError,
    PollResult, ScanResult,
};
pub use employees::{enroll_employee, EnrollError};
pub use face::{FaceConfig, FaceVerifier, FaceVerifyError};
pub use qr::{PayloadRenderer, QrArtifact, QrRenderer};

#[cfg(test)]
#[path = "cancellation_tests.rs"]
mod cancellation_tests;

#[cfg(test)]
#[path = "face_tests.rs"]
mod face_tests;

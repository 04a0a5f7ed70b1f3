//! Data Transfer Objects for the HTTP API.
//!
//! The core models already derive Serialize/Deserialize, so request bodies
//! for the create endpoints are the `New*` payload types re-exported here.
//! The handful of response shapes specific to the wire protocol live in
//! this module.

use serde::{Deserialize, Serialize};

pub use crate::db::repository::Upsert;
pub use crate::models::{Employee, NewEmployee, NewPass, NewReservation, Reservation};
pub use crate::services::qr::QrArtifact;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

/// Request body for cancelling a reservation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelRequest {
    pub spot_id: String,
    pub email: String,
    pub password: String,
}

/// Response for a cancellation request.
///
/// `qr` is null for pass holders (the reservation is already gone) and
/// carries the confirmation artifact for everyone else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelResponse {
    pub success: String,
    pub qr: Option<QrArtifact>,
}

/// Response for the scan status poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanStatusResponse {
    pub is_scanned: bool,
}

/// Response for employee enrollment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeResponse {
    pub status: Upsert,
    pub employee: Employee,
}

/// Response for a successful face verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyFaceResponse {
    pub success: String,
    pub employee: Employee,
}

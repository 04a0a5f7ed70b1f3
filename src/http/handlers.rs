//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! service layer for business logic.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Html,
    Json,
};

use super::dto::{
    CancelRequest, CancelResponse, EmployeeResponse, HealthResponse, ScanStatusResponse,
    VerifyFaceResponse,
};
use super::error::AppError;
use super::state::AppState;
use crate::db::repository::Upsert;
use crate::models::{
    Employee, MonthlyPass, NewEmployee, NewPass, NewReservation, Reservation, YearlyPass,
};
use crate::services::cancellation::{
    check_confirmation, confirm_scan, request_cancellation, CancelOutcome, PollResult, ScanResult,
};
use crate::services::employees::enroll_employee;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and the database
/// is accessible.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match state.repository.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Bookings
// =============================================================================

/// POST /v1/reservations
///
/// Book a parking spot. The reservation starts unconfirmed; the confirmed
/// flag belongs to the cancellation handshake, not to booking.
pub async fn create_reservation(
    State(state): State<AppState>,
    Json(request): Json<NewReservation>,
) -> Result<(StatusCode, Json<Reservation>), AppError> {
    if request.spot_id.trim().is_empty() || request.email.trim().is_empty() {
        return Err(AppError::BadRequest("All fields are required".to_string()));
    }

    let reservation = state.repository.create_reservation(request).await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

/// POST /v1/passes/monthly
pub async fn create_monthly_pass(
    State(state): State<AppState>,
    Json(request): Json<NewPass>,
) -> Result<(StatusCode, Json<MonthlyPass>), AppError> {
    if request.email.trim().is_empty() {
        return Err(AppError::BadRequest("All fields are required".to_string()));
    }

    let pass = state.repository.create_monthly_pass(request).await?;
    Ok((StatusCode::CREATED, Json(pass)))
}

/// POST /v1/passes/yearly
pub async fn create_yearly_pass(
    State(state): State<AppState>,
    Json(request): Json<NewPass>,
) -> Result<(StatusCode, Json<YearlyPass>), AppError> {
    if request.email.trim().is_empty() {
        return Err(AppError::BadRequest("All fields are required".to_string()));
    }

    let pass = state.repository.create_yearly_pass(request).await?;
    Ok((StatusCode::CREATED, Json(pass)))
}

// =============================================================================
// Cancellation Handshake
// =============================================================================

/// POST /v1/cancel-reservation
///
/// Step 1 of the handshake. Pass holders get the reservation deleted
/// immediately (`qr` is null); everyone else receives a confirmation
/// artifact to display for the scanning device.
pub async fn cancel_reservation(
    State(state): State<AppState>,
    Json(request): Json<CancelRequest>,
) -> HandlerResult<CancelResponse> {
    let outcome = request_cancellation(
        state.repository.as_ref(),
        state.renderer.as_ref(),
        &request.spot_id,
        &request.email,
        &request.password,
    )
    .await?;

    let response = match outcome {
        CancelOutcome::Cancelled => CancelResponse {
            success: "Reservation cancelled successfully".to_string(),
            qr: None,
        },
        CancelOutcome::ConfirmationRequired(artifact) => CancelResponse {
            success: "Scan the code to confirm the cancellation".to_string(),
            qr: Some(artifact),
        },
    };
    Ok(Json(response))
}

/// GET /v1/mark-as-scanned/{spot_id}
///
/// Step 2, hit by the scanning device's browser. Always responds 200 with
/// a plain HTML page so repeated scans stay harmless, but the message
/// tells a successful confirmation apart from a no-op.
pub async fn mark_as_scanned(
    State(state): State<AppState>,
    Path(spot_id): Path<String>,
) -> Result<Html<&'static str>, AppError> {
    let body = match confirm_scan(state.repository.as_ref(), &spot_id).await? {
        ScanResult::Confirmed => {
            "<html><body><h1>Scan success</h1>\
             <p>Reservation marked for cancellation.</p></body></html>"
        }
        ScanResult::AlreadyOrMissing => {
            "<html><body><h1>Nothing to confirm</h1>\
             <p>Already scanned or no active reservation found.</p></body></html>"
        }
    };
    Ok(Html(body))
}

/// GET /v1/check-scan-status/{spot_id}
///
/// Step 3, polled by the frontend. The first poll that observes the
/// confirmation finalizes the cancellation; later polls read as pending.
pub async fn check_scan_status(
    State(state): State<AppState>,
    Path(spot_id): Path<String>,
) -> HandlerResult<ScanStatusResponse> {
    let result = check_confirmation(state.repository.as_ref(), &spot_id).await?;
    Ok(Json(ScanStatusResponse {
        is_scanned: result == PollResult::Confirmed,
    }))
}

// =============================================================================
// Employees
// =============================================================================

/// POST /v1/employees
///
/// Enroll an employee. Responds 201 when a new row was created and 200
/// when an existing row (matched by email or badge id) was updated.
pub async fn create_employee(
    State(state): State<AppState>,
    Json(request): Json<NewEmployee>,
) -> Result<(StatusCode, Json<EmployeeResponse>), AppError> {
    let (employee, outcome) = enroll_employee(state.repository.as_ref(), request).await?;

    let status = match outcome {
        Upsert::Created => StatusCode::CREATED,
        Upsert::Updated => StatusCode::OK,
    };
    Ok((
        status,
        Json(EmployeeResponse {
            status: outcome,
            employee,
        }),
    ))
}

/// GET /v1/employees
pub async fn list_employees(State(state): State<AppState>) -> HandlerResult<Vec<Employee>> {
    Ok(Json(state.repository.list_employees().await?))
}

/// POST /v1/verify-face
///
/// Identify an employee from an uploaded probe image (multipart field
/// `image`). Responds 401 when no enrolled face matches and 404 when the
/// reference set is missing entirely.
pub async fn verify_face(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> HandlerResult<VerifyFaceResponse> {
    let mut image: Option<(Vec<u8>, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some("image") {
            let filename = field.file_name().unwrap_or("probe.jpg").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read image: {}", e)))?;
            image = Some((bytes.to_vec(), filename));
            break;
        }
    }

    let (bytes, filename) =
        image.ok_or_else(|| AppError::BadRequest("No image provided".to_string()))?;

    let employee = state
        .verifier
        .verify(state.repository.as_ref(), &bytes, &filename)
        .await?;

    Ok(Json(VerifyFaceResponse {
        success: "Face verified".to_string(),
        employee,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::ReservationRepository;
    use crate::models::SpotType;
    use chrono::NaiveTime;
    use std::sync::Arc;

    async fn state_with_reservation(spot_id: &str) -> AppState {
        let repo = Arc::new(LocalRepository::new());
        repo.create_reservation(NewReservation {
            spot_id: spot_id.to_string(),
            spot_type: SpotType::Car,
            name: "Ana".to_string(),
            email: "a@x.com".to_string(),
            password: "p1".to_string(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            duration_hours: 2.0,
        })
        .await
        .unwrap();
        AppState::new(repo as Arc<dyn crate::db::repository::FullRepository>)
    }

    #[tokio::test]
    async fn scan_page_tells_a_flip_apart_from_a_noop() {
        let state = state_with_reservation("A12").await;

        // First scan flips the reservation; the second has nothing to do.
        let flip = mark_as_scanned(State(state.clone()), Path("A12".to_string()))
            .await
            .unwrap();
        let noop = mark_as_scanned(State(state), Path("A12".to_string()))
            .await
            .unwrap();

        assert_ne!(flip.0, noop.0);
        assert!(flip.0.contains("marked for cancellation"));
        assert!(noop.0.contains("Already scanned or no active reservation"));
    }

    #[tokio::test]
    async fn scan_page_for_an_unknown_spot_reads_as_a_noop() {
        let state = state_with_reservation("A12").await;

        let page = mark_as_scanned(State(state), Path("B7".to_string()))
            .await
            .unwrap();
        assert!(page.0.contains("Already scanned or no active reservation"));
    }
}

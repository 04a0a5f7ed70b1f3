//! Cancellation coordinator.
//!
//! Orchestrates the three-step cancellation handshake between the web
//! client, the QR-scanning device, and the polling frontend:
//!
//! 1. [`request_cancellation`] validates ownership and either deletes the
//!    reservation outright (pass holders) or issues a confirmation artifact
//!    for the client to display.
//! 2. [`confirm_scan`] is hit by the scanning device and flips the matching
//!    reservation to confirmed.
//! 3. [`check_confirmation`] is polled by the frontend; the first poll that
//!    observes the confirmed row deletes it and reports success
//!    (consume-on-read). Every later poll sees `Pending`.
//!
//! There is no session token or channel between the three parties; the
//! reservation row itself is the shared state, which is why steps 2 and 3
//! lean on the repository's atomic conditional operations.

use tracing::{debug, info};

use crate::db::repository::{FullRepository, RepositoryError};
use crate::services::qr::{QrArtifact, QrRenderer, RenderError};

/// Errors surfaced by the cancellation coordinator.
#[derive(Debug, thiserror::Error)]
pub enum CancellationError {
    /// A required field was empty (user-correctable).
    #[error("All fields are required")]
    Validation,

    /// No reservation matches the spot/email pair. Deliberately distinct
    /// from `Unauthorized` so a caller can tell a wrong spot or email apart
    /// from a wrong password.
    #[error("No reservation found")]
    NotFound,

    /// Reservations match the spot/email but none has this password.
    #[error("Incorrect password")]
    Unauthorized,

    /// Artifact rendering failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Persistence layer error.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Outcome of a cancellation request.
#[derive(Debug)]
pub enum CancelOutcome {
    /// Pass holder: reservation deleted immediately, no artifact issued.
    Cancelled,
    /// Normal user: confirmation artifact must be scanned to proceed.
    ConfirmationRequired(QrArtifact),
}

/// Outcome of a scan by the secondary device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanResult {
    /// One unconfirmed reservation was flipped to confirmed.
    Confirmed,
    /// Nothing to flip: already scanned, or no active reservation for the
    /// spot. Idempotent no-op, not an error.
    AlreadyOrMissing,
}

/// Outcome of a confirmation poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollResult {
    /// This poll observed the confirmation and finalized the cancellation.
    Confirmed,
    /// No confirmed row: not yet scanned, or an earlier poll already
    /// consumed it. Indistinguishable to the caller by design.
    Pending,
}

/// Step 1: request cancellation of a reservation.
///
/// Looks up rows matching the spot and email (case-insensitive), then
/// requires an exact password match among them. Pass holders bypass the
/// scan handshake and get the row deleted immediately; everyone else
/// receives a confirmation artifact and nothing is mutated yet.
///
/// When several rows match spot, email, and password the store's first
/// match is targeted; the protocol leaves the tie-break unspecified beyond
/// that.
pub async fn request_cancellation(
    repo: &dyn FullRepository,
    renderer: &dyn QrRenderer,
    spot_id: &str,
    email: &str,
    password: &str,
) -> Result<CancelOutcome, CancellationError> {
    let spot_id = spot_id.trim();
    let email = email.trim().to_lowercase();

    if spot_id.is_empty() || email.is_empty() || password.is_empty() {
        return Err(CancellationError::Validation);
    }

    let matches = repo.find_by_spot_and_email(spot_id, &email).await?;
    if matches.is_empty() {
        debug!(spot_id, "cancellation requested for unknown spot/email pair");
        return Err(CancellationError::NotFound);
    }

    // The email-match set can be non-empty while no row has this password.
    let target = matches
        .iter()
        .find(|r| r.password == password)
        .ok_or(CancellationError::Unauthorized)?;

    if is_pass_holder(repo, &email).await? {
        repo.delete_reservation(target.id).await?;
        info!(spot_id, reservation_id = %target.id, "pass holder cancellation, deleted directly");
        return Ok(CancelOutcome::Cancelled);
    }

    // Token payload is the bare spot id; the scan endpoint will act on the
    // latest unconfirmed row for that spot, not on this specific row.
    let artifact = renderer.render(spot_id)?;
    info!(spot_id, "confirmation artifact issued, awaiting scan");
    Ok(CancelOutcome::ConfirmationRequired(artifact))
}

/// Step 2: the scanning device presents the token payload.
///
/// Flips the most recently created unconfirmed reservation for the spot to
/// confirmed. Safe to call repeatedly; a second scan finds nothing to flip.
pub async fn confirm_scan(
    repo: &dyn FullRepository,
    spot_id: &str,
) -> Result<ScanResult, CancellationError> {
    match repo.mark_confirmed(spot_id).await? {
        Some(reservation) => {
            info!(spot_id, reservation_id = %reservation.id, "scan confirmed reservation");
            Ok(ScanResult::Confirmed)
        }
        None => {
            debug!(spot_id, "scan found nothing to confirm");
            Ok(ScanResult::AlreadyOrMissing)
        }
    }
}

/// Step 3: the frontend polls for the confirmation.
///
/// The first poll that observes a confirmed row deletes it as part of
/// reporting success; observation is finalization. Later polls (or a
/// second browser tab) get `Pending` even though the cancellation already
/// completed.
pub async fn check_confirmation(
    repo: &dyn FullRepository,
    spot_id: &str,
) -> Result<PollResult, CancellationError> {
    match repo.take_confirmed(spot_id).await? {
        Some(reservation) => {
            info!(spot_id, reservation_id = %reservation.id, "confirmation consumed, reservation deleted");
            Ok(PollResult::Confirmed)
        }
        None => Ok(PollResult::Pending),
    }
}

/// Whether the email belongs to a monthly or yearly pass holder.
///
/// Existence check only; the pass validity window is not consulted, so a
/// lapsed pass still grants the scan bypass (current behavior).
pub async fn is_pass_holder(
    repo: &dyn FullRepository,
    email: &str,
) -> Result<bool, CancellationError> {
    Ok(repo.has_pass_for_email(email).await?)
}

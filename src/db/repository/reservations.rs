//! Reservation repository trait.
//!
//! Besides plain CRUD, this trait carries the two conditional operations
//! the cancellation handshake depends on. Both are specified as single
//! atomic steps: implementations must not decompose them into separate
//! read-then-write calls, otherwise two concurrent requests for the same
//! spot could both observe the intermediate state (e.g. two status polls
//! double-reporting one confirmation).

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::ReservationId;
use crate::models::{NewReservation, Reservation};

/// Repository trait for reservation storage.
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Insert a new reservation with `confirmed = false`.
    async fn create_reservation(&self, new: NewReservation) -> RepositoryResult<Reservation>;

    /// Fetch all reservations matching a spot and owner email.
    ///
    /// The email comparison is case-insensitive; the spot comparison is
    /// exact. Rows are returned in insertion order.
    async fn find_by_spot_and_email(
        &self,
        spot_id: &str,
        email: &str,
    ) -> RepositoryResult<Vec<Reservation>>;

    /// Atomically flip the most recently created unconfirmed reservation
    /// for `spot_id` to `confirmed = true`.
    ///
    /// Last-inserted wins when several unconfirmed rows share the spot.
    /// Returns the updated row, or `None` when no unconfirmed row exists
    /// (already confirmed, or no active reservation). The no-match case is
    /// not an error; the scan endpoint treats it as an idempotent no-op.
    async fn mark_confirmed(&self, spot_id: &str) -> RepositoryResult<Option<Reservation>>;

    /// Atomically delete one reservation for `spot_id` with
    /// `confirmed = true` and return it.
    ///
    /// This is the consume-on-read step: at most one caller can receive
    /// `Some` for a given confirmed row. Returns `None` when no confirmed
    /// row exists (not yet scanned, or already consumed by an earlier
    /// poll).
    async fn take_confirmed(&self, spot_id: &str) -> RepositoryResult<Option<Reservation>>;

    /// Delete a reservation by id. Returns whether a row was removed.
    async fn delete_reservation(&self, id: ReservationId) -> RepositoryResult<bool>;
}

//! Repository trait definitions.
//!
//! The traits here describe the store operations each domain area needs.
//! `FullRepository` is the composition the application works against, so a
//! single backend instance can be shared behind `Arc<dyn FullRepository>`.

mod employees;
mod error;
mod passes;
mod reservations;

pub use employees::{EmployeeRepository, Upsert};
pub use error::{ErrorContext, RepositoryError, RepositoryResult};
pub use passes::PassRepository;
pub use reservations::ReservationRepository;

use async_trait::async_trait;

/// Composite repository trait covering all persisted entities.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait FullRepository:
    ReservationRepository + PassRepository + EmployeeRepository + Send + Sync
{
    /// Check that the backing store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;
}

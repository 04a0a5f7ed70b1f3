//! Pass repository trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{MonthlyPass, NewPass, YearlyPass};

/// Repository trait for monthly and yearly pass storage.
///
/// Pass rows are created once and are read-only from the cancellation
/// coordinator's perspective.
#[async_trait]
pub trait PassRepository: Send + Sync {
    /// Insert a monthly pass.
    async fn create_monthly_pass(&self, new: NewPass) -> RepositoryResult<MonthlyPass>;

    /// Insert a yearly pass.
    async fn create_yearly_pass(&self, new: NewPass) -> RepositoryResult<YearlyPass>;

    /// Whether a monthly OR yearly pass row exists for this email.
    ///
    /// Case-insensitive on the email. Deliberately ignores the validity
    /// window: a lapsed pass still counts (current behavior, see DESIGN.md).
    async fn has_pass_for_email(&self, email: &str) -> RepositoryResult<bool>;
}

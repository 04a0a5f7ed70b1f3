//! Employee enrollment.

use tracing::info;

use crate::db::repository::{FullRepository, RepositoryError, Upsert};
use crate::models::{Employee, NewEmployee};

/// Errors surfaced by employee enrollment.
#[derive(Debug, thiserror::Error)]
pub enum EnrollError {
    #[error("Missing required field: {0}")]
    Validation(&'static str),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Enroll an employee, updating the existing row when the email or badge
/// id is already registered.
///
/// The email is lowercased before storage so the upsert key matches the
/// case-insensitive lookup used everywhere else.
pub async fn enroll_employee(
    repo: &dyn FullRepository,
    mut new: NewEmployee,
) -> Result<(Employee, Upsert), EnrollError> {
    new.name = new.name.trim().to_string();
    new.email = new.email.trim().to_lowercase();
    new.employee_id = new.employee_id.trim().to_string();

    if new.name.is_empty() {
        return Err(EnrollError::Validation("name"));
    }
    if new.email.is_empty() {
        return Err(EnrollError::Validation("email"));
    }
    if new.phone.trim().is_empty() {
        return Err(EnrollError::Validation("phone"));
    }
    if new.employee_id.is_empty() {
        return Err(EnrollError::Validation("employee_id"));
    }
    if new.vehicle_number.trim().is_empty() {
        return Err(EnrollError::Validation("vehicle_number"));
    }

    let (employee, outcome) = repo.upsert_employee(new).await?;
    info!(employee_id = %employee.id, ?outcome, "employee enrolled");
    Ok((employee, outcome))
}

//! Employee repository trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::RepositoryResult;
use crate::models::{Employee, NewEmployee};

/// Outcome of an employee upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Upsert {
    Created,
    Updated,
}

/// Repository trait for employee storage.
#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    /// Create an employee, or update the existing row when the email or
    /// badge `employee_id` is already taken.
    ///
    /// Both alternate keys are checked (email first); a conflict on either
    /// updates that row in place rather than rejecting the request.
    async fn upsert_employee(&self, new: NewEmployee)
        -> RepositoryResult<(Employee, Upsert)>;

    /// All employees, used as the classifier reference set.
    async fn list_employees(&self) -> RepositoryResult<Vec<Employee>>;

    /// Find the employee whose enrollment image path ends with `filename`.
    async fn find_by_face_reference(
        &self,
        filename: &str,
    ) -> RepositoryResult<Option<Employee>>;
}

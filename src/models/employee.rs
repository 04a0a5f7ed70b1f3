//! Employee entity used by the face-identification endpoint.

use serde::{Deserialize, Serialize};

use crate::api::EmployeeId;

/// An employee record.
///
/// `email` and `employee_id` are both unique keys; enrollment resolves
/// conflicts on either key by updating the existing row in place.
/// `face_reference` points at the enrollment image the classifier uses as
/// ground truth (a path under the face database directory), or is None for
/// employees without an enrolled face.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub employee_id: String,
    pub age: i32,
    pub vehicle_number: String,
    pub face_reference: Option<String>,
}

/// Payload for enrolling or updating an employee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEmployee {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub employee_id: String,
    pub age: i32,
    pub vehicle_number: String,
    #[serde(default)]
    pub face_reference: Option<String>,
}

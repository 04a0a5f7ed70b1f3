//! Public API surface for the parking backend.
//!
//! This file consolidates the identifier newtypes shared across the
//! repository, service, and HTTP layers. All types derive
//! Serialize/Deserialize for JSON serialization.

use serde::{Deserialize, Serialize};

/// Reservation identifier (database primary key).
///
/// Distinct from the human-assigned `spot_id`, which is not unique:
/// a spot may accumulate a history of reservation rows over time.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReservationId(pub i64);

/// Monthly pass identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonthlyPassId(pub i64);

/// Yearly pass identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct YearlyPassId(pub i64);

/// Employee identifier (database primary key, distinct from the
/// human-assigned `employee_id` badge string).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmployeeId(pub i64);

impl ReservationId {
    pub fn new(value: i64) -> Self {
        ReservationId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl MonthlyPassId {
    pub fn new(value: i64) -> Self {
        MonthlyPassId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl YearlyPassId {
    pub fn new(value: i64) -> Self {
        YearlyPassId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl EmployeeId {
    pub fn new(value: i64) -> Self {
        EmployeeId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for ReservationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::fmt::Display for MonthlyPassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::fmt::Display for YearlyPassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ReservationId> for i64 {
    fn from(id: ReservationId) -> Self {
        id.0
    }
}

impl From<EmployeeId> for i64 {
    fn from(id: EmployeeId) -> Self {
        id.0
    }
}

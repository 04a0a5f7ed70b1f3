//! Long-term pass entities.
//!
//! Monthly and yearly passes share the same shape and differ only in the
//! table they live in. Pass membership is an existence check on the email;
//! the validity window is stored but not consulted by the cancellation
//! coordinator (current behavior, kept deliberately).

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{MonthlyPassId, YearlyPassId};

/// A monthly parking pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyPass {
    pub id: MonthlyPassId,
    pub name: String,
    pub email: String,
    pub age: i32,
    pub vehicle_number: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// A yearly parking pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearlyPass {
    pub id: YearlyPassId,
    pub name: String,
    pub email: String,
    pub age: i32,
    pub vehicle_number: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating either kind of pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPass {
    pub name: String,
    pub email: String,
    pub age: i32,
    pub vehicle_number: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

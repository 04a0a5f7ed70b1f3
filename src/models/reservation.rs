//! Reservation entity and the cancellation-relevant state it carries.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::ReservationId;

/// Kind of parking spot a reservation occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpotType {
    Car,
    Bike,
}

impl SpotType {
    /// Database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SpotType::Car => "car",
            SpotType::Bike => "bike",
        }
    }

    /// Parse from the database string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "car" => Some(SpotType::Car),
            "bike" => Some(SpotType::Bike),
            _ => None,
        }
    }
}

impl std::fmt::Display for SpotType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parking reservation.
///
/// `spot_id` is not unique; the cancellation coordinator always operates on
/// a filtered subset of rows. `password` is a casual ownership check shared
/// with the booking party, not a security boundary. `confirmed` is written
/// exclusively by the cancellation coordinator: it starts false, flips to
/// true exactly once when the scanning device presents the confirmation
/// token, and the row is deleted by the first status poll that observes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub spot_id: String,
    pub spot_type: SpotType,
    pub name: String,
    pub email: String,
    pub password: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub duration_hours: f64,
    pub confirmed: bool,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a reservation; the store assigns id, `confirmed`
/// (false) and `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReservation {
    pub spot_id: String,
    pub spot_type: SpotType,
    pub name: String,
    pub email: String,
    pub password: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub duration_hours: f64,
}

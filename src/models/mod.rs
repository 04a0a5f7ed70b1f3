//! Domain models for the parking backend.
//!
//! These are the persisted entities: reservations, long-term passes, and
//! employees. The repository layer stores and retrieves them; the service
//! layer owns every state transition.

pub mod employee;
pub mod pass;
pub mod reservation;

pub use employee::{Employee, NewEmployee};
pub use pass::{MonthlyPass, NewPass, YearlyPass};
pub use reservation::{NewReservation, Reservation, SpotType};

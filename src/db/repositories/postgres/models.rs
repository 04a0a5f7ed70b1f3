use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use diesel::prelude::*;

use super::schema::{employees, monthly_passes, reservations, yearly_passes};
use crate::api::{EmployeeId, MonthlyPassId, ReservationId, YearlyPassId};
use crate::db::repository::{RepositoryError, RepositoryResult};
use crate::models::{
    Employee, MonthlyPass, NewEmployee, NewPass, NewReservation, Reservation, SpotType,
    YearlyPass,
};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = reservations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ReservationRow {
    pub id: i64,
    pub spot_id: String,
    pub spot_type: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub duration_hours: f64,
    pub confirmed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = reservations)]
pub struct NewReservationRow {
    pub spot_id: String,
    pub spot_type: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub duration_hours: f64,
}

impl From<NewReservation> for NewReservationRow {
    fn from(new: NewReservation) -> Self {
        Self {
            spot_id: new.spot_id,
            spot_type: new.spot_type.as_str().to_string(),
            name: new.name,
            email: new.email,
            password: new.password,
            start_time: new.start_time,
            end_time: new.end_time,
            duration_hours: new.duration_hours,
        }
    }
}

pub fn row_to_reservation(row: ReservationRow) -> RepositoryResult<Reservation> {
    let spot_type = SpotType::parse(&row.spot_type).ok_or_else(|| {
        RepositoryError::internal(format!("Unknown spot_type in store: {}", row.spot_type))
    })?;

    Ok(Reservation {
        id: ReservationId::new(row.id),
        spot_id: row.spot_id,
        spot_type,
        name: row.name,
        email: row.email,
        password: row.password,
        start_time: row.start_time,
        end_time: row.end_time,
        duration_hours: row.duration_hours,
        confirmed: row.confirmed,
        created_at: row.created_at,
    })
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = monthly_passes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MonthlyPassRow {
    pub id: i64,
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

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = yearly_passes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct YearlyPassRow {
    pub id: i64,
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

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = monthly_passes)]
pub struct NewMonthlyPassRow {
    pub name: String,
    pub email: String,
    pub age: i32,
    pub vehicle_number: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = yearly_passes)]
pub struct NewYearlyPassRow {
    pub name: String,
    pub email: String,
    pub age: i32,
    pub vehicle_number: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl From<NewPass> for NewMonthlyPassRow {
    fn from(new: NewPass) -> Self {
        Self {
            name: new.name,
            email: new.email,
            age: new.age,
            vehicle_number: new.vehicle_number,
            start_time: new.start_time,
            end_time: new.end_time,
            start_date: new.start_date,
            end_date: new.end_date,
        }
    }
}

impl From<NewPass> for NewYearlyPassRow {
    fn from(new: NewPass) -> Self {
        Self {
            name: new.name,
            email: new.email,
            age: new.age,
            vehicle_number: new.vehicle_number,
            start_time: new.start_time,
            end_time: new.end_time,
            start_date: new.start_date,
            end_date: new.end_date,
        }
    }
}

impl From<MonthlyPassRow> for MonthlyPass {
    fn from(row: MonthlyPassRow) -> Self {
        Self {
            id: MonthlyPassId::new(row.id),
            name: row.name,
            email: row.email,
            age: row.age,
            vehicle_number: row.vehicle_number,
            start_time: row.start_time,
            end_time: row.end_time,
            start_date: row.start_date,
            end_date: row.end_date,
            created_at: row.created_at,
        }
    }
}

impl From<YearlyPassRow> for YearlyPass {
    fn from(row: YearlyPassRow) -> Self {
        Self {
            id: YearlyPassId::new(row.id),
            name: row.name,
            email: row.email,
            age: row.age,
            vehicle_number: row.vehicle_number,
            start_time: row.start_time,
            end_time: row.end_time,
            start_date: row.start_date,
            end_date: row.end_date,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = employees)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EmployeeRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub employee_id: String,
    pub age: i32,
    pub vehicle_number: String,
    pub face_reference: Option<String>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = employees)]
pub struct NewEmployeeRow {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub employee_id: String,
    pub age: i32,
    pub vehicle_number: String,
    pub face_reference: Option<String>,
}

impl From<NewEmployee> for NewEmployeeRow {
    fn from(new: NewEmployee) -> Self {
        Self {
            name: new.name,
            email: new.email,
            phone: new.phone,
            employee_id: new.employee_id,
            age: new.age,
            vehicle_number: new.vehicle_number,
            face_reference: new.face_reference,
        }
    }
}

impl From<EmployeeRow> for Employee {
    fn from(row: EmployeeRow) -> Self {
        Self {
            id: EmployeeId::new(row.id),
            name: row.name,
            email: row.email,
            phone: row.phone,
            employee_id: row.employee_id,
            age: row.age,
            vehicle_number: row.vehicle_number,
            face_reference: row.face_reference,
        }
    }
}

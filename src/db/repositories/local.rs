//! In-memory repository implementation.
//!
//! Used for unit testing and local development. Each table is a `Vec`
//! behind a `parking_lot::RwLock`; the conditional operations of the
//! cancellation handshake (`mark_confirmed`, `take_confirmed`) run entirely
//! inside one write-lock critical section, which gives them the same
//! atomicity the Postgres backend gets from transactions.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::api::{EmployeeId, MonthlyPassId, ReservationId, YearlyPassId};
use crate::db::repository::{
    EmployeeRepository, FullRepository, PassRepository, RepositoryResult,
    ReservationRepository, Upsert,
};
use crate::models::{
    Employee, MonthlyPass, NewEmployee, NewPass, NewReservation, Reservation, YearlyPass,
};

/// In-memory repository backed by locked vectors.
#[derive(Default)]
pub struct LocalRepository {
    reservations: RwLock<Vec<Reservation>>,
    monthly_passes: RwLock<Vec<MonthlyPass>>,
    yearly_passes: RwLock<Vec<YearlyPass>>,
    employees: RwLock<Vec<Employee>>,
    next_id: AtomicI64,
}

impl LocalRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            ..Default::default()
        }
    }

    fn alloc_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Number of reservation rows currently stored (test helper).
    pub fn reservation_count(&self) -> usize {
        self.reservations.read().len()
    }
}

#[async_trait]
impl ReservationRepository for LocalRepository {
    async fn create_reservation(&self, new: NewReservation) -> RepositoryResult<Reservation> {
        let reservation = Reservation {
            id: ReservationId::new(self.alloc_id()),
            spot_id: new.spot_id,
            spot_type: new.spot_type,
            name: new.name,
            email: new.email,
            password: new.password,
            start_time: new.start_time,
            end_time: new.end_time,
            duration_hours: new.duration_hours,
            confirmed: false,
            created_at: Utc::now(),
        };
        self.reservations.write().push(reservation.clone());
        Ok(reservation)
    }

    async fn find_by_spot_and_email(
        &self,
        spot_id: &str,
        email: &str,
    ) -> RepositoryResult<Vec<Reservation>> {
        let email_lower = email.to_lowercase();
        Ok(self
            .reservations
            .read()
            .iter()
            .filter(|r| r.spot_id == spot_id && r.email.to_lowercase() == email_lower)
            .cloned()
            .collect())
    }

    async fn mark_confirmed(&self, spot_id: &str) -> RepositoryResult<Option<Reservation>> {
        let mut reservations = self.reservations.write();
        // Last-inserted wins: rows are appended in creation order, so the
        // rightmost unconfirmed match is the most recent one.
        let target = reservations
            .iter_mut()
            .rev()
            .find(|r| r.spot_id == spot_id && !r.confirmed);

        Ok(target.map(|r| {
            r.confirmed = true;
            r.clone()
        }))
    }

    async fn take_confirmed(&self, spot_id: &str) -> RepositoryResult<Option<Reservation>> {
        let mut reservations = self.reservations.write();
        let pos = reservations
            .iter()
            .position(|r| r.spot_id == spot_id && r.confirmed);

        Ok(pos.map(|i| reservations.remove(i)))
    }

    async fn delete_reservation(&self, id: ReservationId) -> RepositoryResult<bool> {
        let mut reservations = self.reservations.write();
        let before = reservations.len();
        reservations.retain(|r| r.id != id);
        Ok(reservations.len() < before)
    }
}

#[async_trait]
impl PassRepository for LocalRepository {
    async fn create_monthly_pass(&self, new: NewPass) -> RepositoryResult<MonthlyPass> {
        let pass = MonthlyPass {
            id: MonthlyPassId::new(self.alloc_id()),
            name: new.name,
            email: new.email,
            age: new.age,
            vehicle_number: new.vehicle_number,
            start_time: new.start_time,
            end_time: new.end_time,
            start_date: new.start_date,
            end_date: new.end_date,
            created_at: Utc::now(),
        };
        self.monthly_passes.write().push(pass.clone());
        Ok(pass)
    }

    async fn create_yearly_pass(&self, new: NewPass) -> RepositoryResult<YearlyPass> {
        let pass = YearlyPass {
            id: YearlyPassId::new(self.alloc_id()),
            name: new.name,
            email: new.email,
            age: new.age,
            vehicle_number: new.vehicle_number,
            start_time: new.start_time,
            end_time: new.end_time,
            start_date: new.start_date,
            end_date: new.end_date,
            created_at: Utc::now(),
        };
        self.yearly_passes.write().push(pass.clone());
        Ok(pass)
    }

    async fn has_pass_for_email(&self, email: &str) -> RepositoryResult<bool> {
        let email_lower = email.to_lowercase();
        let monthly = self
            .monthly_passes
            .read()
            .iter()
            .any(|p| p.email.to_lowercase() == email_lower);
        if monthly {
            return Ok(true);
        }
        Ok(self
            .yearly_passes
            .read()
            .iter()
            .any(|p| p.email.to_lowercase() == email_lower))
    }
}

#[async_trait]
impl EmployeeRepository for LocalRepository {
    async fn upsert_employee(
        &self,
        new: NewEmployee,
    ) -> RepositoryResult<(Employee, Upsert)> {
        let mut employees = self.employees.write();
        let email_lower = new.email.to_lowercase();

        // Email is the primary conflict key, badge id the secondary one.
        let existing = employees.iter_mut().find(|e| {
            e.email.to_lowercase() == email_lower || e.employee_id == new.employee_id
        });

        if let Some(employee) = existing {
            employee.name = new.name;
            employee.email = new.email;
            employee.phone = new.phone;
            employee.employee_id = new.employee_id;
            employee.age = new.age;
            employee.vehicle_number = new.vehicle_number;
            if new.face_reference.is_some() {
                employee.face_reference = new.face_reference;
            }
            return Ok((employee.clone(), Upsert::Updated));
        }

        let employee = Employee {
            id: EmployeeId::new(self.alloc_id()),
            name: new.name,
            email: new.email,
            phone: new.phone,
            employee_id: new.employee_id,
            age: new.age,
            vehicle_number: new.vehicle_number,
            face_reference: new.face_reference,
        };
        employees.push(employee.clone());
        Ok((employee, Upsert::Created))
    }

    async fn list_employees(&self) -> RepositoryResult<Vec<Employee>> {
        Ok(self.employees.read().clone())
    }

    async fn find_by_face_reference(
        &self,
        filename: &str,
    ) -> RepositoryResult<Option<Employee>> {
        Ok(self
            .employees
            .read()
            .iter()
            .find(|e| {
                e.face_reference
                    .as_deref()
                    .is_some_and(|path| path.ends_with(filename))
            })
            .cloned())
    }
}

#[async_trait]
impl FullRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(true)
    }
}

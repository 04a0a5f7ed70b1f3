//! Postgres repository implementation using Diesel.
//!
//! This module implements the repository traits against a Postgres
//! database. The two conditional operations of the cancellation handshake
//! (`mark_confirmed`, `take_confirmed`) run inside transactions so the
//! flag flip and the consume-on-read delete stay atomic under concurrent
//! requests for the same spot.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Automatic migration execution
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use diesel::dsl::{exists, select};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task;

use crate::api::ReservationId;
use crate::db::repository::{
    EmployeeRepository, ErrorContext, FullRepository, PassRepository, RepositoryError,
    RepositoryResult, ReservationRepository, Upsert,
};
use crate::models::{
    Employee, MonthlyPass, NewEmployee, NewPass, NewReservation, Reservation, YearlyPass,
};

mod models;
mod schema;

use models::*;

diesel::define_sql_function! {
    /// Case folding for the case-insensitive email comparisons.
    fn lower(x: diesel::sql_types::Text) -> diesel::sql_types::Text;
}

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    ///
    /// See the module docs for the variable list.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let max_pool_size = std::env::var("PG_POOL_MAX")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);

        let min_pool_size = std::env::var("PG_POOL_MIN")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(1);

        let connection_timeout_sec = std::env::var("PG_CONN_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        let idle_timeout_sec = std::env::var("PG_IDLE_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(600);

        let max_retries = std::env::var("PG_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(3);

        let retry_delay_ms = std::env::var("PG_RETRY_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(100);

        Ok(Self {
            database_url,
            max_pool_size,
            min_pool_size,
            connection_timeout_sec,
            idle_timeout_sec,
            max_retries,
            retry_delay_ms,
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub connections_in_use: u32,
    /// Number of idle connections
    pub idle_connections: u32,
    /// Total number of connections in the pool
    pub total_connections: u32,
    /// Maximum pool size
    pub max_size: u32,
    /// Total successful queries executed
    pub total_queries: u64,
    /// Total failed queries
    pub failed_queries: u64,
    /// Total retried operations
    pub retried_operations: u64,
}

/// Diesel-backed repository for Postgres.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    // Metrics counters
    total_queries: std::sync::Arc<AtomicU64>,
    failed_queries: std::sync::Arc<AtomicU64>,
    retried_operations: std::sync::Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true) // Validate connections before use
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        // Run migrations once during initialization
        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self {
            pool,
            config,
            total_queries: std::sync::Arc::new(AtomicU64::new(0)),
            failed_queries: std::sync::Arc::new(AtomicU64::new(0)),
            retried_operations: std::sync::Arc::new(AtomicU64::new(0)),
        })
    }

    /// Run pending database migrations.
    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Execute a database operation with automatic retry for transient failures.
    ///
    /// Retries up to `max_retries` times when a retryable error occurs
    /// (connection errors, serialization failures).
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;
        let total_queries = self.total_queries.clone();
        let failed_queries = self.failed_queries.clone();
        let retried_operations = self.retried_operations.clone();

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    retried_operations.fetch_add(1, Ordering::Relaxed);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2; // Exponential backoff
                }

                // Get connection
                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1))
                                .retryable(),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(err);
                    }
                };

                // Execute the operation
                total_queries.fetch_add(1, Ordering::Relaxed);
                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => {
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(e);
                    }
                }
            }

            failed_queries.fetch_add(1, Ordering::Relaxed);
            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }

    /// Get pool health statistics.
    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            retried_operations: self.retried_operations.load(Ordering::Relaxed),
        }
    }
}

#[async_trait]
impl ReservationRepository for PostgresRepository {
    async fn create_reservation(&self, new: NewReservation) -> RepositoryResult<Reservation> {
        let row: NewReservationRow = new.into();
        self.with_conn(move |conn| {
            use schema::reservations::dsl::reservations;

            let inserted: ReservationRow = diesel::insert_into(reservations)
                .values(&row)
                .get_result(conn)
                .map_err(|e| {
                    RepositoryError::from(e).with_operation("create_reservation")
                })?;
            row_to_reservation(inserted)
        })
        .await
    }

    async fn find_by_spot_and_email(
        &self,
        spot_id: &str,
        email: &str,
    ) -> RepositoryResult<Vec<Reservation>> {
        let spot = spot_id.to_string();
        let email_lower = email.to_lowercase();
        self.with_conn(move |conn| {
            use schema::reservations::dsl;

            let rows: Vec<ReservationRow> = dsl::reservations
                .filter(dsl::spot_id.eq(&spot))
                .filter(lower(dsl::email).eq(&email_lower))
                .order(dsl::id.asc())
                .load(conn)
                .map_err(|e| {
                    RepositoryError::from(e).with_operation("find_by_spot_and_email")
                })?;
            rows.into_iter().map(row_to_reservation).collect()
        })
        .await
    }

    async fn mark_confirmed(&self, spot_id: &str) -> RepositoryResult<Option<Reservation>> {
        let spot = spot_id.to_string();
        self.with_conn(move |conn| {
            use schema::reservations::dsl;

            // Transaction keeps the pick-latest + conditional-update pair
            // atomic; the update re-checks `confirmed = false` so a
            // concurrent scan cannot flip the same row twice.
            let updated: Option<ReservationRow> =
                conn.transaction::<_, RepositoryError, _>(|conn| {
                    let target: Option<i64> = dsl::reservations
                        .filter(dsl::spot_id.eq(&spot))
                        .filter(dsl::confirmed.eq(false))
                        .order(dsl::id.desc())
                        .select(dsl::id)
                        .first(conn)
                        .optional()
                        .map_err(RepositoryError::from)?;

                    let Some(target_id) = target else {
                        return Ok(None);
                    };

                    diesel::update(
                        dsl::reservations
                            .filter(dsl::id.eq(target_id))
                            .filter(dsl::confirmed.eq(false)),
                    )
                    .set(dsl::confirmed.eq(true))
                    .get_result(conn)
                    .optional()
                    .map_err(RepositoryError::from)
                })
                .map_err(|e| e.with_operation("mark_confirmed"))?;

            updated.map(row_to_reservation).transpose()
        })
        .await
    }

    async fn take_confirmed(&self, spot_id: &str) -> RepositoryResult<Option<Reservation>> {
        let spot = spot_id.to_string();
        self.with_conn(move |conn| {
            use schema::reservations::dsl;

            // Compare-and-delete in one transaction: the delete re-checks
            // the confirmed flag, so only one poller can consume the row.
            let taken: Option<ReservationRow> =
                conn.transaction::<_, RepositoryError, _>(|conn| {
                    let target: Option<i64> = dsl::reservations
                        .filter(dsl::spot_id.eq(&spot))
                        .filter(dsl::confirmed.eq(true))
                        .order(dsl::id.asc())
                        .select(dsl::id)
                        .first(conn)
                        .optional()
                        .map_err(RepositoryError::from)?;

                    let Some(target_id) = target else {
                        return Ok(None);
                    };

                    diesel::delete(
                        dsl::reservations
                            .filter(dsl::id.eq(target_id))
                            .filter(dsl::confirmed.eq(true)),
                    )
                    .get_result(conn)
                    .optional()
                    .map_err(RepositoryError::from)
                })
                .map_err(|e| e.with_operation("take_confirmed"))?;

            taken.map(row_to_reservation).transpose()
        })
        .await
    }

    async fn delete_reservation(&self, id: ReservationId) -> RepositoryResult<bool> {
        let raw_id = id.value();
        self.with_conn(move |conn| {
            use schema::reservations::dsl;

            let deleted = diesel::delete(dsl::reservations.filter(dsl::id.eq(raw_id)))
                .execute(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("delete_reservation"))?;
            Ok(deleted > 0)
        })
        .await
    }
}

#[async_trait]
impl PassRepository for PostgresRepository {
    async fn create_monthly_pass(&self, new: NewPass) -> RepositoryResult<MonthlyPass> {
        let row: NewMonthlyPassRow = new.into();
        self.with_conn(move |conn| {
            use schema::monthly_passes::dsl::monthly_passes;

            let inserted: MonthlyPassRow = diesel::insert_into(monthly_passes)
                .values(&row)
                .get_result(conn)
                .map_err(|e| {
                    RepositoryError::from(e).with_operation("create_monthly_pass")
                })?;
            Ok(inserted.into())
        })
        .await
    }

    async fn create_yearly_pass(&self, new: NewPass) -> RepositoryResult<YearlyPass> {
        let row: NewYearlyPassRow = new.into();
        self.with_conn(move |conn| {
            use schema::yearly_passes::dsl::yearly_passes;

            let inserted: YearlyPassRow = diesel::insert_into(yearly_passes)
                .values(&row)
                .get_result(conn)
                .map_err(|e| {
                    RepositoryError::from(e).with_operation("create_yearly_pass")
                })?;
            Ok(inserted.into())
        })
        .await
    }

    async fn has_pass_for_email(&self, email: &str) -> RepositoryResult<bool> {
        let email_lower = email.to_lowercase();
        self.with_conn(move |conn| {
            use schema::monthly_passes::dsl as monthly;
            use schema::yearly_passes::dsl as yearly;

            let has_monthly: bool = select(exists(
                monthly::monthly_passes.filter(lower(monthly::email).eq(&email_lower)),
            ))
            .get_result(conn)
            .map_err(|e| RepositoryError::from(e).with_operation("has_pass_for_email"))?;

            if has_monthly {
                return Ok(true);
            }

            select(exists(
                yearly::yearly_passes.filter(lower(yearly::email).eq(&email_lower)),
            ))
            .get_result(conn)
            .map_err(|e| RepositoryError::from(e).with_operation("has_pass_for_email"))
        })
        .await
    }
}

#[async_trait]
impl EmployeeRepository for PostgresRepository {
    async fn upsert_employee(
        &self,
        new: NewEmployee,
    ) -> RepositoryResult<(Employee, Upsert)> {
        self.with_conn(move |conn| {
            use schema::employees::dsl;

            let email_lower = new.email.to_lowercase();
            let result = conn.transaction::<_, RepositoryError, _>(|conn| {
                // Two alternate keys: email wins when both match different rows.
                let existing: Option<EmployeeRow> = dsl::employees
                    .filter(
                        lower(dsl::email)
                            .eq(&email_lower)
                            .or(dsl::employee_id.eq(&new.employee_id)),
                    )
                    .order(dsl::id.asc())
                    .first(conn)
                    .optional()
                    .map_err(RepositoryError::from)?;

                if let Some(row) = existing {
                    let updated: EmployeeRow =
                        diesel::update(dsl::employees.filter(dsl::id.eq(row.id)))
                            .set((
                                dsl::name.eq(&new.name),
                                dsl::email.eq(&new.email),
                                dsl::phone.eq(&new.phone),
                                dsl::employee_id.eq(&new.employee_id),
                                dsl::age.eq(new.age),
                                dsl::vehicle_number.eq(&new.vehicle_number),
                            ))
                            .get_result(conn)
                            .map_err(RepositoryError::from)?;

                    // A fresh enrollment image replaces the old reference;
                    // absence leaves the stored one alone.
                    let updated: EmployeeRow = if let Some(ref face) = new.face_reference {
                        diesel::update(dsl::employees.filter(dsl::id.eq(updated.id)))
                            .set(dsl::face_reference.eq(face))
                            .get_result(conn)
                            .map_err(RepositoryError::from)?
                    } else {
                        updated
                    };

                    return Ok((updated.into(), Upsert::Updated));
                }

                let row: NewEmployeeRow = new.clone().into();
                let inserted: EmployeeRow = diesel::insert_into(dsl::employees)
                    .values(&row)
                    .get_result(conn)
                    .map_err(RepositoryError::from)?;
                Ok((inserted.into(), Upsert::Created))
            });

            result.map_err(|e| e.with_operation("upsert_employee"))
        })
        .await
    }

    async fn list_employees(&self) -> RepositoryResult<Vec<Employee>> {
        self.with_conn(move |conn| {
            use schema::employees::dsl;

            let rows: Vec<EmployeeRow> = dsl::employees
                .order(dsl::id.asc())
                .load(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("list_employees"))?;
            Ok(rows.into_iter().map(Employee::from).collect())
        })
        .await
    }

    async fn find_by_face_reference(
        &self,
        filename: &str,
    ) -> RepositoryResult<Option<Employee>> {
        let pattern = format!("%{}", filename);
        self.with_conn(move |conn| {
            use schema::employees::dsl;

            let row: Option<EmployeeRow> = dsl::employees
                .filter(dsl::face_reference.like(&pattern))
                .first(conn)
                .optional()
                .map_err(|e| {
                    RepositoryError::from(e).with_operation("find_by_face_reference")
                })?;
            Ok(row.map(Employee::from))
        })
        .await
    }
}

#[async_trait]
impl FullRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(move |conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("health_check"))?;
            Ok(true)
        })
        .await
    }
}

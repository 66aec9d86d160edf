//! Shared `PostgreSQL` pool construction and schema setup.

use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use std::time::Duration;
use thiserror::Error;

/// Connection pool shared by the `PostgreSQL` adapters.
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Schema for projects and tasks.
pub const SCHEMA_SQL: &str =
    include_str!("../migrations/2026-10-14-000000_create_projects_and_tasks/up.sql");

/// Errors raised while connecting to or preparing the database.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A pooled connection could not be established.
    #[error("database connection failed: {0}")]
    Pool(#[from] PoolError),

    /// Applying the schema failed.
    #[error("failed to apply schema: {0}")]
    Schema(#[from] diesel::result::Error),
}

/// Builds a connection pool for `database_url`.
///
/// Checking out a connection waits at most `checkout_timeout`. This blocks
/// while the pool opens its initial connections.
///
/// # Errors
///
/// Returns [`DatabaseError::Pool`] when no connection can be established.
pub fn build_pool(
    database_url: &str,
    max_size: u32,
    checkout_timeout: Duration,
) -> Result<PgPool, DatabaseError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Ok(Pool::builder()
        .max_size(max_size)
        .connection_timeout(checkout_timeout)
        .build(manager)?)
}

/// Creates the project and task tables if they do not exist.
///
/// # Errors
///
/// Returns [`DatabaseError`] when a connection cannot be checked out or the
/// schema statements fail.
pub fn apply_schema(pool: &PgPool) -> Result<(), DatabaseError> {
    let mut connection = pool.get()?;
    connection.batch_execute(SCHEMA_SQL)?;
    Ok(())
}

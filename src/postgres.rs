//! Shared `PostgreSQL` plumbing for the Diesel adapters.
//!
//! Diesel connections are synchronous, so every adapter runs its queries on
//! the blocking thread pool through [`run_blocking`].

use crate::config::DatabaseConfig;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use thiserror::Error;
use tokio::task::JoinError;

/// `PostgreSQL` connection pool shared by every adapter.
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Failures raised before an adapter's query closure runs to completion.
#[derive(Debug, Error)]
pub enum BlockingError {
    /// No connection could be checked out of the pool.
    #[error("connection pool error: {0}")]
    Pool(#[from] PoolError),

    /// The blocking task panicked or was cancelled.
    #[error("blocking task failed: {0}")]
    Join(#[from] JoinError),
}

/// Builds a connection pool from configuration.
///
/// # Errors
///
/// Returns [`PoolError`] when the initial connections cannot be opened.
pub fn build_pool(config: &DatabaseConfig) -> Result<PgPool, PoolError> {
    Pool::builder()
        .max_size(config.pool_max_size)
        .build(ConnectionManager::<PgConnection>::new(&config.url))
}

/// Runs `f` with a pooled connection on the blocking thread pool.
///
/// Pool and join failures are converted with `wrap`.
pub(crate) async fn run_blocking<F, T, E, W>(pool: &PgPool, wrap: W, f: F) -> Result<T, E>
where
    F: FnOnce(&mut PgConnection) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
    W: Fn(BlockingError) -> E + Send + Clone + 'static,
{
    let shared_pool = pool.clone();
    let wrap_in_task = wrap.clone();
    tokio::task::spawn_blocking(move || {
        let mut connection = shared_pool
            .get()
            .map_err(|err| wrap_in_task(BlockingError::from(err)))?;
        f(&mut connection)
    })
    .await
    .map_err(|err| wrap(BlockingError::from(err)))?
}

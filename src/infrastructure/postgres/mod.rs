//! PostgreSQL persistence module.
//!
//! Opens the process-wide connection pool and verifies liveness at startup.

pub mod pool;

pub use pool::{PoolInitError, PoolSettings, PostgresPool};

//! Infrastructure layer modules
//!
//! - `postgres`: PostgreSQL connection pool initialization
pub mod postgres;

// Infrastructure layer (shared components)
pub mod infrastructure;

pub use infrastructure::postgres;

// Core
pub mod config;
pub mod error;
pub mod mailer;
pub mod metrics;
pub mod template;

// Application layer
pub mod api;
pub mod server;

// Supporting modules
pub mod shutdown;
pub mod telemetry;

//! PostgreSQL connection pool opened once at startup.

use std::future::Future;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::Connection;
use thiserror::Error;

use crate::config::{parse_duration, DatabaseConfig};

/// Errors that can occur while opening the pool.
#[derive(Debug, Error)]
pub enum PoolInitError {
    #[error("Invalid database configuration: {0}")]
    Config(String),

    #[error("Database unreachable: {0}")]
    Unreachable(#[source] sqlx::Error),

    #[error("Database liveness check timed out after {0:?}")]
    Timeout(Duration),

    #[error("Database initialization cancelled by shutdown")]
    Cancelled,
}

/// Validated pool parameters. Building this never touches the network.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    connect_options: PgConnectOptions,
    max_open: u32,
    max_idle: u32,
    max_idle_time: Option<Duration>,
    ping_timeout: Duration,
}

impl PoolSettings {
    pub fn from_config(config: &DatabaseConfig) -> Result<Self, PoolInitError> {
        if config.max_open_conns < 1 {
            return Err(PoolInitError::Config(
                "max_open_conns must be at least 1".to_string(),
            ));
        }

        let connect_options = PgConnectOptions::from_str(&config.dsn)
            .map_err(|e| PoolInitError::Config(format!("dsn: {}", e)))?;

        let max_idle_time = parse_duration(&config.max_idle_time)
            .map_err(|e| PoolInitError::Config(format!("max_idle_time: {}", e)))?
            .positive();

        let max_idle = if config.max_idle_conns > config.max_open_conns {
            tracing::warn!(
                max_idle_conns = config.max_idle_conns,
                max_open_conns = config.max_open_conns,
                "max_idle_conns exceeds max_open_conns, clamping"
            );
            config.max_open_conns
        } else {
            config.max_idle_conns
        };

        Ok(Self {
            connect_options,
            max_open: config.max_open_conns,
            max_idle,
            max_idle_time,
            ping_timeout: config.ping_timeout(),
        })
    }

    pub fn max_open(&self) -> u32 {
        self.max_open
    }

    pub fn max_idle(&self) -> u32 {
        self.max_idle
    }

    pub fn max_idle_time(&self) -> Option<Duration> {
        self.max_idle_time
    }

    pub fn ping_timeout(&self) -> Duration {
        self.ping_timeout
    }

    /// Build a lazy pool. No connection is attempted until first use.
    fn build(&self) -> (PgPool, IdleLimit) {
        let idle_limit = IdleLimit::default();

        let mut options = PgPoolOptions::new()
            .max_connections(self.max_open)
            .min_connections(0)
            .acquire_timeout(self.ping_timeout)
            .idle_timeout(self.max_idle_time);

        if self.max_idle < self.max_open {
            let limit = idle_limit.clone();
            let max_idle = self.max_idle;
            options = options.after_release(move |_conn, _meta| {
                let keep = limit.allows_another_idle(max_idle);
                Box::pin(async move { Ok(keep) })
            });
        }

        let pool = options.connect_lazy_with(self.connect_options.clone());
        idle_limit.attach(&pool);
        (pool, idle_limit)
    }
}

/// Caps how many released connections stay idle.
///
/// Holds a clone of the pool it belongs to, so it must be detached on close.
#[derive(Clone, Default)]
struct IdleLimit {
    pool: Arc<Mutex<Option<PgPool>>>,
}

impl IdleLimit {
    fn attach(&self, pool: &PgPool) {
        if let Ok(mut slot) = self.pool.lock() {
            *slot = Some(pool.clone());
        }
    }

    fn detach(&self) {
        if let Ok(mut slot) = self.pool.lock() {
            slot.take();
        }
    }

    fn allows_another_idle(&self, max_idle: u32) -> bool {
        match self.pool.lock() {
            Ok(slot) => slot
                .as_ref()
                .map_or(false, |pool| (pool.num_idle() as u32) < max_idle),
            Err(_) => false,
        }
    }
}

/// Process-wide PostgreSQL pool handle.
///
/// Cloning is cheap and shares the same pool. `close` must be called once on
/// the shutdown path, after every consumer is done.
#[derive(Clone)]
pub struct PostgresPool {
    pool: PgPool,
    idle_limit: IdleLimit,
    database_url: String,
}

impl PostgresPool {
    /// Open the pool and verify liveness within the configured deadline.
    pub async fn open(config: &DatabaseConfig) -> Result<Self, PoolInitError> {
        Self::open_with_shutdown(config, std::future::pending()).await
    }

    /// Like [`PostgresPool::open`], but gives up early when `shutdown` resolves.
    #[tracing::instrument(
        name = "postgres.open",
        skip_all,
        fields(dsn = %config.dsn_masked())
    )]
    pub async fn open_with_shutdown<S>(
        config: &DatabaseConfig,
        shutdown: S,
    ) -> Result<Self, PoolInitError>
    where
        S: Future<Output = ()>,
    {
        let settings = PoolSettings::from_config(config)?;
        let (pool, idle_limit) = settings.build();
        let deadline = settings.ping_timeout();

        let outcome = tokio::select! {
            biased;
            _ = shutdown => Err(PoolInitError::Cancelled),
            result = tokio::time::timeout(deadline, ping(&pool)) => match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(PoolInitError::Unreachable(e)),
                Err(_) => Err(PoolInitError::Timeout(deadline)),
            },
        };

        if let Err(e) = outcome {
            idle_limit.detach();
            pool.close().await;
            tracing::error!(error = %e, "PostgreSQL connection pool initialization failed");
            return Err(e);
        }

        tracing::info!(
            max_open_conns = settings.max_open(),
            max_idle_conns = settings.max_idle(),
            max_idle_time = ?settings.max_idle_time(),
            "PostgreSQL connection pool established"
        );

        Ok(Self {
            pool,
            idle_limit,
            database_url: config.dsn_masked(),
        })
    }

    /// Build the pool without verifying liveness. Configuration is still
    /// validated; connections are opened on first use.
    pub fn lazy(config: &DatabaseConfig) -> Result<Self, PoolInitError> {
        let settings = PoolSettings::from_config(config)?;
        let (pool, idle_limit) = settings.build();
        Ok(Self {
            pool,
            idle_limit,
            database_url: config.dsn_masked(),
        })
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Bounded liveness check used by health reporting.
    pub async fn ping(&self, deadline: Duration) -> Result<(), PoolInitError> {
        match tokio::time::timeout(deadline, ping(&self.pool)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(PoolInitError::Unreachable(e)),
            Err(_) => Err(PoolInitError::Timeout(deadline)),
        }
    }

    pub fn size(&self) -> u32 {
        self.pool.size()
    }

    pub fn num_idle(&self) -> usize {
        self.pool.num_idle()
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Database URL with the password masked.
    pub fn database_url_masked(&self) -> &str {
        &self.database_url
    }

    /// Close the pool gracefully.
    pub async fn close(&self) {
        self.idle_limit.detach();
        self.pool.close().await;
        tracing::info!("PostgreSQL connection pool closed");
    }
}

async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut conn = pool.acquire().await?;
    conn.ping().await
}

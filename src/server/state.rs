use std::sync::Arc;
use std::time::Instant;

use crate::config::Settings;
use crate::mailer::BackgroundMailer;
use crate::postgres::PostgresPool;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub postgres_pool: PostgresPool,
    pub mailer: BackgroundMailer,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(settings: Settings, postgres_pool: PostgresPool, mailer: BackgroundMailer) -> Self {
        Self {
            settings: Arc::new(settings),
            postgres_pool,
            mailer,
            start_time: Instant::now(),
        }
    }
}

//! Shared application state for all routes.

use crate::auth::TokenService;
use crate::config::Settings;
use crate::mail::{LogMailer, Mailer};
use crate::model::{primary_model, Model};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// Territory (Portuguese) schema. Same pool as `pool` when no separate database is configured.
    pub territory_pool: PgPool,
    pub settings: Arc<Settings>,
    pub model: Arc<Model>,
    pub tokens: Arc<TokenService>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(pool: PgPool, territory_pool: PgPool, settings: Settings) -> Self {
        let tokens = TokenService::from_settings(&settings);
        AppState {
            pool,
            territory_pool,
            settings: Arc::new(settings),
            model: Arc::new(primary_model()),
            tokens: Arc::new(tokens),
            mailer: Arc::new(LogMailer::default()),
        }
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }
}

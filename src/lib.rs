//! EcoSolo: environmental monitoring REST backend. Users, soil analyses,
//! occurrences and alerts over PostgreSQL, plus the Portuguese territory API.

pub mod auth;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod mail;
pub mod migration;
pub mod model;
pub mod response;
pub mod routes;
pub mod seed;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;
pub mod territory;

pub use config::{Settings, API_PREFIX};
pub use error::{AppError, ConfigError};
pub use migration::apply_migrations;
pub use routes::build_router;
pub use seed::seed_database;
pub use state::AppState;
pub use store::{connect_pool, ensure_database_exists};

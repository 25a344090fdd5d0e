//! HTTP handlers for the primary API (accounts, users, entity CRUD, alerts)
//! and the territory API.

pub mod accounts;
pub mod alerts;
pub mod entity;
pub mod territories;
pub mod territory_auth;
pub mod territory_occurrences;
pub mod users;

pub use entity::EntityPath;

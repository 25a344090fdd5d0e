//! The territory schema: Portuguese tables and enumerations in a second
//! database, accessed with hand-written SQL.

mod occurrences;
pub mod schema;
mod territories;
mod types;
mod users;

pub use occurrences::{OccurrenceStats, OccurrenceStore, TerritoryOccurrence};
pub use schema::ensure_schema;
pub use territories::{Territory, TerritoryStore};
pub use types::*;
pub use users::{TerritoryUser, TerritoryUserStore};

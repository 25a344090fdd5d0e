mod auth;

pub use auth::{bearer_token, CurrentUser, TerritoryCaller};

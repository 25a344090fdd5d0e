//! CrudService: generic CRUD using safe SQL builder. UserStore: typed user rows.

mod crud;
mod users;
mod validation;
pub use crud::{row_id, row_owner, CrudService};
pub use users::{normalize_email, NewUser, ProfileUpdate, User, UserFilter, UserResponse, UserStore};
pub use validation::{is_valid_email, parse_timestamp, RequestValidator};

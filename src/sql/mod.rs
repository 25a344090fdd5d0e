//! Safe SQL builder: identifiers from the static model only, values as parameters.

mod builder;
pub mod params;
pub use builder::*;
pub use params::*;

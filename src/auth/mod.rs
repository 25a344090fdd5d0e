//! Password hashing and signed bearer tokens.

pub mod password;
mod token;

pub use token::{
    AccessClaims, IssuedToken, ResetClaims, TerritoryClaims, TokenService, PRIMARY_AUDIENCE, TERRITORY_AUDIENCE,
};

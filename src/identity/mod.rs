//! Identity primitives: bearer tokens and password hashing.

pub mod password;
mod token;

pub use password::{hash_password, verify_password};
pub use token::{TokenService, TOKEN_TTL};

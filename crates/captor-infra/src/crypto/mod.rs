//! Cryptographic operations for Captor.
//!
//! - `password`: Argon2id password hashing
//! - `token`: HS256 JSON Web Tokens

pub mod password;
pub mod token;

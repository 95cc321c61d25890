//! Infrastructure layer for Captor.
//!
//! Contains implementations of the repository traits defined in `captor-core`:
//! SQLite storage, Argon2id password hashing, HS256 JWT bearer tokens, and
//! configuration loading.

pub mod config;
pub mod crypto;
pub mod sqlite;

//! Business logic and repository trait definitions for Captor.
//!
//! This crate defines the "ports" (repository traits) that the infrastructure
//! layer implements, and the services that hold every business rule: agent
//! lifecycle, session resolution, conversation appends, users, and auth.
//! It depends only on `captor-types` -- never on `captor-infra` or any
//! database/IO crate.

pub mod chat;
pub mod repository;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

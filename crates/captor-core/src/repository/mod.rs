//! Repository trait definitions (ports).
//!
//! These traits define the storage interface that the infrastructure layer
//! (captor-infra) implements. The core crate never depends on any
//! specific storage technology.

pub mod agent;
pub mod customer;
pub mod schema;
pub mod user;

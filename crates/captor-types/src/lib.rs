//! Shared domain types for Captor.
//!
//! This crate contains the domain types used across the Captor platform:
//! users, agents with their data-collection schemas, customers, chat
//! sessions, messages, collected answers, and their error types.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod agent;
pub mod chat;
pub mod config;
pub mod customer;
pub mod error;
pub mod page;
pub mod user;

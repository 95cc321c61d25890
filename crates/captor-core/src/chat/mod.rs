//! Chat subsystem for Captor.
//!
//! This module defines the `ChatRepository` trait that the infrastructure
//! layer implements, the `SessionResolver` that finds-or-creates a customer
//! and session for the public chat widget, and the `ConversationService`
//! that appends messages and collected answers to an existing session.

pub mod repository;
pub mod resolver;
pub mod service;

//! HTTP request handlers for the REST API.

pub mod agent;
pub mod auth;
pub mod chat;
pub mod user;

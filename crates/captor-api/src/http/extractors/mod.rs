//! Request extractors: bearer-token authentication and list query parameters.

pub mod auth;
pub mod query;

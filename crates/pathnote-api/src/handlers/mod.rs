//! HTTP handlers for pathnote-api.

pub mod health;
pub mod notes;
pub mod summary;

//! Archival migration pipeline for hierarchical content records.
//!
//! Moves each in-scope container's "original" asset from the primary backend
//! into archive storage, rewrites the container to carry the archived URL,
//! and deletes the stale local metadata. A companion recovery operation
//! reconstructs a working local copy from an archived container.

pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

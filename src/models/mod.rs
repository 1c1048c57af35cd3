//! Core data models for the archival migration pipeline.
//!
//! These entities represent the hierarchical content records and their
//! binary-bearing metadata. They map cleanly to database tables via
//! `sqlx::FromRow` and serialize naturally as JSON via `serde`.

pub mod asset;
pub mod candidate;
pub mod container;
pub mod file;

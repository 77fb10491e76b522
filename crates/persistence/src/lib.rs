//! Persistence layer for the Comparte Ride backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations with the atomic multi-row transactions the
//!   membership and ride state machines require

pub mod db;
pub mod entities;
pub mod error;
pub mod metrics;
pub mod repositories;

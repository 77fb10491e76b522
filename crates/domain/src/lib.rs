//! Domain layer for the Comparte Ride backend.
//!
//! This crate contains:
//! - Domain models (User, Circle, Membership, Invitation, Ride, Rating)
//! - The domain error taxonomy
//! - Domain services (clock, notifications)

pub mod error;
pub mod models;
pub mod services;

pub use error::DomainError;

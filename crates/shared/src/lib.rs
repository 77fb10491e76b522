//! Shared utilities for the Comparte Ride backend.
//!
//! This crate provides common functionality used across all other crates:
//! - JWT access token generation and validation
//! - Password hashing with Argon2id
//! - Offset pagination helpers

pub mod jwt;
pub mod pagination;
pub mod password;

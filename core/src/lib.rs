//! Shared core for the SunnyDays services.
//!
//! This crate defines:
//! - The weather domain model and the seasonal synthetic generator
//! - The rule-based activity advice engine
//! - Password hashing and session-token utilities
//! - The structured API error body

pub mod advice;
pub mod auth;
pub mod error;
pub mod weather;

//! Core types for Grow
//!
//! This module holds the error taxonomy shared by every layer of the
//! resolution chain:
//! - [`GrowError`] - Enumerated error types covering all Grow failure modes
//! - [`ErrorContext`] - User-friendly error wrapper with suggestions and details
//! - [`user_friendly_error`] - Convert any error to user-friendly format

pub mod error;

pub use error::{ErrorContext, GrowError, user_friendly_error};

//! Integration test suite for Grow
//!
//! End-to-end tests of the public API and the `grow` binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **resolution**: Canonical documents, fetch-once caching, deep resolution, cycles
//! - **routing**: Routes manifest loading and request matching
//! - **rendering**: The full render pipeline over an on-disk pod
//! - **cli**: The `grow` binary

mod cli;
mod rendering;
mod resolution;
mod routing;

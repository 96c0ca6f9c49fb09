//! Shared utilities.
//!
//! Digest helpers and test fixtures.

pub mod hash;

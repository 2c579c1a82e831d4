//! Shared helpers for unit tests.

pub mod factories;

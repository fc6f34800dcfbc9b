//! Test utilities for ASESystem crates.
//!
//! Provides session-token minting, bearer headers and the contract fixture loader.
//! Import from dev-dependencies only; never from production code.

pub mod auth;
pub mod fixture;

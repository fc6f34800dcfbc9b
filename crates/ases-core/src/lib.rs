//! Service plumbing shared by ASESystem HTTP services: environment config
//! helpers, tracing setup, request-id middleware and health probes.

pub mod config;
pub mod health;
pub mod middleware;
pub mod tracing;

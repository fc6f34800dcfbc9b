//! Headless client for the ASESystem auth service.
//!
//! [`SessionController`](controller::SessionController) drives registration,
//! one-time-passcode verification and login against an [`AuthApi`](api::AuthApi),
//! and keeps the resulting session in a [`SessionStore`](store::SessionStore).

pub mod api;
pub mod controller;
pub mod error;
pub mod store;
pub mod token;

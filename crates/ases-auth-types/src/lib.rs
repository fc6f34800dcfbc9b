//! Auth types shared across ASESystem services.
//!
//! Provides session-token claims and validation, and the `SessionIdentity`
//! bearer-token extractor.

pub mod identity;
pub mod token;

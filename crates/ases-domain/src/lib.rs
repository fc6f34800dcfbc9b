//! Domain types shared by the ASESystem auth service and its clients.
//!
//! This crate contains only pure types with no framework dependencies.
//! Import in `usecase/` and `domain/` layers and in client code; never in `infra/`.

pub mod account;
pub mod id;

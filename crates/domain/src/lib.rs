//! Domain layer for the SubTrack backend.
//!
//! This crate contains:
//! - Domain models (features, plans, entitlements, accounts, usage counters)
//! - The entitlement resolution and authorization services
//! - Domain error types

pub mod context;
pub mod errors;
pub mod models;
pub mod services;

pub use context::RequestContext;
pub use errors::EntitlementError;

//! Domain models for the entitlement core.

pub mod account;
pub mod entitlement;
pub mod feature;
pub mod plan;
pub mod usage;

pub use account::Account;
pub use entitlement::EffectiveEntitlement;
pub use feature::{Feature, FeatureCatalog, FeatureId, FeatureType};
pub use plan::{Grant, PlanEntitlement, PlanEntitlementTable, PlanId, QuotaLimit};
pub use usage::UsageCounter;

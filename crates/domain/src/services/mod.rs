//! Domain services for the entitlement core.
//!
//! Services contain the business logic that operates on domain models.

pub mod accounts;
pub mod authorization;
pub mod resolver;
pub mod usage_projection;
pub mod usage_store;

pub use accounts::{AccountProvider, MockAccountProvider};
pub use authorization::{can, AuthorizationFacade, OwnedResource, Permission, PermissionCheck};
pub use resolver::EntitlementResolver;
pub use usage_projection::UsageProjection;
pub use usage_store::{MockUsageStore, UsageStore};

//! Authorization facade consumed by command handlers.
//!
//! Combines the ownership check ("may this caller act on this resource?")
//! with the entitlement check ("is the caller within plan limits?"). A
//! create-entity handler uses it as:
//!
//! 1. resolve the authenticated account,
//! 2. `can(account, Permission::Write).on(&entity)`,
//! 3. idempotency/conflict handling against existing state,
//! 4. `ensure_quota(ctx, feature, 1)`,
//! 5. validate and persist.
//!
//! The facade never mutates usage counters; the persistence layer increments
//! on successful insert and decrements on delete, inside the same
//! transaction as the entity write.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::RequestContext;
use crate::errors::EntitlementError;
use crate::models::account::Account;
use crate::models::feature::FeatureId;
use crate::services::accounts::AccountProvider;
use crate::services::resolver::EntitlementResolver;

/// What the caller wants to do with a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Read,
    Write,
    Delete,
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Permission::Read => write!(f, "read"),
            Permission::Write => write!(f, "write"),
            Permission::Delete => write!(f, "delete"),
        }
    }
}

/// Anything owned by a single user account.
pub trait OwnedResource {
    fn owner_id(&self) -> Uuid;
}

/// Pending ownership check, bound to an account and a permission.
#[derive(Debug, Clone)]
pub struct PermissionCheck {
    account: Account,
    permission: Permission,
}

impl PermissionCheck {
    /// Run the check against a concrete resource. Pure policy; no quota.
    pub fn on(&self, resource: &dyn OwnedResource) -> Result<(), EntitlementError> {
        if resource.owner_id() == self.account.user_id {
            return Ok(());
        }
        tracing::warn!(
            user_id = %self.account.user_id,
            owner_id = %resource.owner_id(),
            permission = %self.permission,
            "ownership check denied"
        );
        Err(EntitlementError::Forbidden(format!(
            "{} denied: resource belongs to another user",
            self.permission
        )))
    }
}

/// Build an ownership check for an already resolved account.
pub fn can(account: Account, permission: Permission) -> PermissionCheck {
    PermissionCheck {
        account,
        permission,
    }
}

/// The two predicates command handlers consume.
#[derive(Clone)]
pub struct AuthorizationFacade {
    accounts: Arc<dyn AccountProvider>,
    resolver: Arc<EntitlementResolver>,
}

impl AuthorizationFacade {
    pub fn new(accounts: Arc<dyn AccountProvider>, resolver: Arc<EntitlementResolver>) -> Self {
        Self { accounts, resolver }
    }

    /// Ownership predicate: resolves the connected account and binds it to a
    /// permission; finish with [`PermissionCheck::on`].
    pub async fn can(
        &self,
        ctx: &RequestContext,
        permission: Permission,
    ) -> Result<PermissionCheck, EntitlementError> {
        let account = self.accounts.must_get_connected_account(ctx).await?;
        Ok(can(account, permission))
    }

    /// Entitlement predicate: fail with `QuotaExceeded` unless the connected
    /// account can consume `needed` more units of `feature_id`.
    ///
    /// The error carries the entitlement snapshot so handlers can report
    /// "used X of Y" without another resolution.
    pub async fn ensure_quota(
        &self,
        ctx: &RequestContext,
        feature_id: FeatureId,
        needed: i64,
    ) -> Result<(), EntitlementError> {
        let (allowed, entitlement) = self.resolver.check_quota(ctx, feature_id, needed).await?;
        if allowed {
            return Ok(());
        }
        let used = entitlement.used.unwrap_or(0);
        tracing::warn!(
            feature = %feature_id,
            limit = ?entitlement.limit,
            used,
            "quota exceeded"
        );
        Err(EntitlementError::QuotaExceeded {
            feature: feature_id,
            limit: entitlement.limit,
            used,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::plan::PlanId;
    use crate::services::accounts::MockAccountProvider;
    use crate::services::usage_store::MockUsageStore;

    struct Label {
        owner: Uuid,
    }

    impl OwnedResource for Label {
        fn owner_id(&self) -> Uuid {
            self.owner
        }
    }

    fn facade(account: Account, store: MockUsageStore) -> AuthorizationFacade {
        let accounts = Arc::new(MockAccountProvider::returning(account));
        let resolver = Arc::new(EntitlementResolver::standard(
            Arc::new(store),
            accounts.clone(),
        ));
        AuthorizationFacade::new(accounts, resolver)
    }

    #[tokio::test]
    async fn test_can_allows_owner() {
        let account = Account::new(Uuid::new_v4(), PlanId::Free);
        let facade = facade(account, MockUsageStore::new());

        let check = facade
            .can(&RequestContext::new(), Permission::Write)
            .await
            .unwrap();
        let label = Label {
            owner: account.user_id,
        };
        assert!(check.on(&label).is_ok());
    }

    #[tokio::test]
    async fn test_can_denies_non_owner() {
        let account = Account::new(Uuid::new_v4(), PlanId::Free);
        let facade = facade(account, MockUsageStore::new());

        let check = facade
            .can(&RequestContext::new(), Permission::Delete)
            .await
            .unwrap();
        let label = Label {
            owner: Uuid::new_v4(),
        };
        let err = check.on(&label).unwrap_err();
        assert!(matches!(err, EntitlementError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_ensure_quota_passes_under_limit() {
        let account = Account::new(Uuid::new_v4(), PlanId::Free);
        let store = MockUsageStore::new().with_usage(
            account.user_id,
            FeatureId::ActiveSubscriptionsCount,
            2,
        );
        let facade = facade(account, store);

        assert!(facade
            .ensure_quota(
                &RequestContext::new(),
                FeatureId::ActiveSubscriptionsCount,
                1
            )
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_ensure_quota_maps_denial_with_snapshot() {
        let account = Account::new(Uuid::new_v4(), PlanId::Free);
        let store = MockUsageStore::new().with_usage(
            account.user_id,
            FeatureId::ActiveSubscriptionsCount,
            10,
        );
        let facade = facade(account, store);

        let err = facade
            .ensure_quota(
                &RequestContext::new(),
                FeatureId::ActiveSubscriptionsCount,
                1,
            )
            .await
            .unwrap_err();
        match err {
            EntitlementError::QuotaExceeded {
                feature,
                limit,
                used,
            } => {
                assert_eq!(feature, FeatureId::ActiveSubscriptionsCount);
                assert_eq!(limit, Some(10));
                assert_eq!(used, 10);
            }
            other => panic!("expected QuotaExceeded, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ensure_quota_on_gated_off_feature() {
        // Free denies the custom_providers gate, so the count is disabled
        // outright and the error carries no numeric limit.
        let account = Account::new(Uuid::new_v4(), PlanId::Free);
        let facade = facade(account, MockUsageStore::new());

        let err = facade
            .ensure_quota(&RequestContext::new(), FeatureId::CustomProvidersCount, 1)
            .await
            .unwrap_err();
        match err {
            EntitlementError::QuotaExceeded { limit, used, .. } => {
                assert_eq!(limit, None);
                assert_eq!(used, 0);
            }
            other => panic!("expected QuotaExceeded, got {other:?}"),
        }
    }
}

//! Entitlement resolution engine.
//!
//! Resolves the effective entitlement for `(account, feature)` at a moment
//! in time, applying gate dependencies and quota arithmetic. The resolver is
//! stateless: every call is a pure function of the injected catalog and plan
//! table plus the usage counter observed at the moment of read.
//!
//! The snapshot is best-effort. The check-then-act gap between a resolution
//! and the write it authorizes is closed by the persistence layer, which
//! increments the counter with an atomic limit guard inside the same
//! transaction as the entity insert.

use std::sync::Arc;

use crate::context::RequestContext;
use crate::errors::EntitlementError;
use crate::models::account::Account;
use crate::models::entitlement::EffectiveEntitlement;
use crate::models::feature::{FeatureCatalog, FeatureId, FeatureType, STANDARD_CATALOG};
use crate::models::plan::{PlanEntitlementTable, PlanId, QuotaLimit, STANDARD_PLANS};
use crate::services::accounts::AccountProvider;
use crate::services::usage_store::UsageStore;

/// How a feature resolves before usage is consulted.
enum Resolution {
    Boolean { enabled: bool },
    GateClosed,
    Quota { limit: QuotaLimit },
}

/// Resolves effective entitlements against injected catalogs and a usage
/// store.
#[derive(Clone)]
pub struct EntitlementResolver {
    catalog: Arc<FeatureCatalog>,
    plans: Arc<PlanEntitlementTable>,
    store: Arc<dyn UsageStore>,
    accounts: Arc<dyn AccountProvider>,
}

impl EntitlementResolver {
    /// Create a resolver over tailored tables. Tests build a table per case;
    /// production uses [`Self::standard`].
    pub fn new(
        catalog: Arc<FeatureCatalog>,
        plans: Arc<PlanEntitlementTable>,
        store: Arc<dyn UsageStore>,
        accounts: Arc<dyn AccountProvider>,
    ) -> Self {
        Self {
            catalog,
            plans,
            store,
            accounts,
        }
    }

    /// Create a resolver over the production catalog and plan table.
    pub fn standard(store: Arc<dyn UsageStore>, accounts: Arc<dyn AccountProvider>) -> Self {
        Self::new(
            Arc::new(STANDARD_CATALOG.clone()),
            Arc::new(STANDARD_PLANS.clone()),
            store,
            accounts,
        )
    }

    pub(crate) fn catalog(&self) -> &FeatureCatalog {
        &self.catalog
    }

    pub(crate) fn plans(&self) -> &PlanEntitlementTable {
        &self.plans
    }

    pub(crate) fn store(&self) -> &dyn UsageStore {
        self.store.as_ref()
    }

    /// Resolve the effective entitlement for one feature on one account.
    ///
    /// Sentinel ids fail with `FeatureNotFound`/`PlanNotFound`. Absence of a
    /// plan table entry is not an error: it reads as "not granted" for
    /// boolean features and as a zero cap for quota features.
    pub async fn resolve(
        &self,
        ctx: &RequestContext,
        account: &Account,
        feature_id: FeatureId,
    ) -> Result<EffectiveEntitlement, EntitlementError> {
        ctx.ensure_active()?;

        match self.classify(account, feature_id)? {
            Resolution::Boolean { enabled } => {
                Ok(EffectiveEntitlement::boolean(feature_id, enabled))
            }
            Resolution::GateClosed => Ok(EffectiveEntitlement::gate_closed(feature_id)),
            Resolution::Quota { limit } => {
                // The only suspension point; honor cancellation across it.
                let counter = tokio::select! {
                    biased;
                    _ = ctx.cancellation().cancelled() => {
                        return Err(EntitlementError::Cancelled);
                    }
                    result = self.store.get(account.user_id, feature_id) => result?,
                };
                let used = counter.map(|c| c.used).unwrap_or(0);
                Ok(EffectiveEntitlement::quota(feature_id, limit, used))
            }
        }
    }

    /// Resolve with a pre-fetched usage value instead of a store read.
    ///
    /// Used by the usage projection, which loads all counters for the user
    /// in one round-trip and then walks the plan row.
    pub(crate) fn resolve_prefetched(
        &self,
        account: &Account,
        feature_id: FeatureId,
        used: i64,
    ) -> Result<EffectiveEntitlement, EntitlementError> {
        match self.classify(account, feature_id)? {
            Resolution::Boolean { enabled } => {
                Ok(EffectiveEntitlement::boolean(feature_id, enabled))
            }
            Resolution::GateClosed => Ok(EffectiveEntitlement::gate_closed(feature_id)),
            Resolution::Quota { limit } => {
                Ok(EffectiveEntitlement::quota(feature_id, limit, used))
            }
        }
    }

    /// Whether a boolean feature is enabled on the account's plan.
    pub async fn check_boolean(
        &self,
        ctx: &RequestContext,
        account: &Account,
        feature_id: FeatureId,
    ) -> Result<bool, EntitlementError> {
        let entitlement = self.resolve(ctx, account, feature_id).await?;
        if entitlement.feature_type != FeatureType::Boolean {
            return Err(EntitlementError::InvalidFeatureType(feature_id));
        }
        Ok(entitlement.enabled)
    }

    /// Whether the account can consume `needed` more units of a quota
    /// feature, alongside the entitlement snapshot that decided it.
    ///
    /// `needed <= 0` is normalized to 1: callers that omit a count get
    /// "would a single unit pass?" semantics.
    pub async fn check_quota_for_account(
        &self,
        ctx: &RequestContext,
        account: &Account,
        feature_id: FeatureId,
        needed: i64,
    ) -> Result<(bool, EffectiveEntitlement), EntitlementError> {
        let needed = needed.max(1);

        let entitlement = self.resolve(ctx, account, feature_id).await?;
        if entitlement.feature_type != FeatureType::Quota {
            return Err(EntitlementError::InvalidFeatureType(feature_id));
        }

        if !entitlement.enabled {
            return Ok((false, entitlement));
        }
        let allowed = match entitlement.remaining {
            // Unlimited: enabled with no remaining count means no cap.
            None => true,
            Some(remaining) => remaining >= needed,
        };
        Ok((allowed, entitlement))
    }

    /// [`Self::check_quota_for_account`] for callers that have not yet
    /// resolved the account; asks the account provider once.
    pub async fn check_quota(
        &self,
        ctx: &RequestContext,
        feature_id: FeatureId,
        needed: i64,
    ) -> Result<(bool, EffectiveEntitlement), EntitlementError> {
        let account = self.accounts.must_get_connected_account(ctx).await?;
        self.check_quota_for_account(ctx, &account, feature_id, needed)
            .await
    }

    /// Steps 1-5 of resolution: sentinel checks, table lookup, gate
    /// evaluation, and dispatch on the feature type.
    fn classify(
        &self,
        account: &Account,
        feature_id: FeatureId,
    ) -> Result<Resolution, EntitlementError> {
        if feature_id == FeatureId::Unknown {
            return Err(EntitlementError::FeatureNotFound(feature_id));
        }
        let plan = account.plan_id;
        if plan == PlanId::Unknown {
            return Err(EntitlementError::PlanNotFound(plan));
        }

        let entry = self.plans.lookup(plan, feature_id);
        let feature = self
            .catalog
            .lookup(feature_id)
            .ok_or(EntitlementError::FeatureNotFound(feature_id))?;

        let gate_allowed = match feature.gated_by {
            Some(gate) => self.gate_allowed(plan, gate)?,
            None => true,
        };

        match feature.feature_type {
            FeatureType::Boolean => {
                let granted = entry.map(|e| e.is_granted()).unwrap_or(false);
                Ok(Resolution::Boolean {
                    enabled: granted && gate_allowed,
                })
            }
            FeatureType::Quota => {
                if !gate_allowed {
                    tracing::debug!(
                        user_id = %account.user_id,
                        plan = %plan,
                        feature = %feature_id,
                        "quota feature disabled by closed gate"
                    );
                    return Ok(Resolution::GateClosed);
                }
                // A plan that grants nothing for a quota feature caps it at
                // zero; only an explicit entry can lift the cap.
                let limit = match entry {
                    Some(e) => e.limit,
                    None => QuotaLimit::Capped(0),
                };
                Ok(Resolution::Quota { limit })
            }
        }
    }

    /// Evaluate a gate feature's grant on the same plan.
    ///
    /// A correctly configured plan mentions its gates explicitly; a missing
    /// gate entry is a misconfigured plan, not a sparse-table default.
    fn gate_allowed(&self, plan: PlanId, gate: FeatureId) -> Result<bool, EntitlementError> {
        let entry = self
            .plans
            .lookup(plan, gate)
            .ok_or(EntitlementError::PlanNotFound(plan))?;
        Ok(entry.is_granted())
    }
}

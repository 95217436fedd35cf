//! Usage-versus-limits projection for user interfaces.

use std::collections::HashMap;
use std::sync::Arc;

use crate::context::RequestContext;
use crate::errors::EntitlementError;
use crate::models::account::Account;
use crate::models::entitlement::EffectiveEntitlement;
use crate::models::feature::{FeatureId, FeatureType};
use crate::models::plan::PlanId;
use crate::services::resolver::EntitlementResolver;

/// Read-only projection of every metered feature the plan defines, so UIs
/// can render progress bars and warnings.
#[derive(Clone)]
pub struct UsageProjection {
    resolver: Arc<EntitlementResolver>,
}

impl UsageProjection {
    pub fn new(resolver: Arc<EntitlementResolver>) -> Self {
        Self { resolver }
    }

    /// Snapshot `{feature, type, enabled, limit, used, remaining}` for each
    /// quota feature in the account's plan row, in catalog order.
    ///
    /// Counters are loaded in one round-trip; a missing counter reads as 0.
    /// An account with no plan at all projects to an empty list.
    pub async fn project(
        &self,
        ctx: &RequestContext,
        account: &Account,
    ) -> Result<Vec<EffectiveEntitlement>, EntitlementError> {
        ctx.ensure_active()?;
        if account.plan_id == PlanId::Unknown {
            return Ok(Vec::new());
        }

        let counters = tokio::select! {
            biased;
            _ = ctx.cancellation().cancelled() => {
                return Err(EntitlementError::Cancelled);
            }
            result = self.resolver.store().get_all(account.user_id) => result?,
        };
        let used_by_feature: HashMap<FeatureId, i64> = counters
            .into_iter()
            .map(|counter| (counter.feature_id, counter.used))
            .collect();

        let mut projection = Vec::new();
        for feature in self.resolver.catalog().features() {
            if feature.feature_type != FeatureType::Quota {
                continue;
            }
            if self
                .resolver
                .plans()
                .lookup(account.plan_id, feature.id)
                .is_none()
            {
                continue;
            }
            let used = used_by_feature.get(&feature.id).copied().unwrap_or(0);
            projection.push(self.resolver.resolve_prefetched(account, feature.id, used)?);
        }
        Ok(projection)
    }
}

//! Domain error types surfaced to command handlers.

use thiserror::Error;

use crate::models::feature::FeatureId;
use crate::models::plan::PlanId;

/// Errors produced by the entitlement core.
///
/// The resolver surfaces every failure; nothing is swallowed or retried at
/// this layer. Translating these kinds into transport status codes is the
/// responsibility of the HTTP boundary.
#[derive(Debug, Error)]
pub enum EntitlementError {
    /// Unknown or unregistered feature id.
    #[error("feature not found: {0}")]
    FeatureNotFound(FeatureId),

    /// The account carries the unknown plan sentinel, or a gate feature is
    /// missing from the plan's entitlement row.
    #[error("plan not found: {0}")]
    PlanNotFound(PlanId),

    /// `check_boolean`/`check_quota` was called on a feature of the other
    /// kind.
    #[error("invalid feature type for {0}")]
    InvalidFeatureType(FeatureId),

    /// A metered action was denied because the plan limit is spent.
    ///
    /// Carries the entitlement snapshot so the caller can render
    /// "used X of Y" without a second resolution.
    #[error("quota exceeded for {feature}: {used} used")]
    QuotaExceeded {
        feature: FeatureId,
        /// `None` means the feature was disabled outright (gate closed or
        /// zero cap), so no numeric limit applies.
        limit: Option<i64>,
        used: i64,
    },

    /// Ownership check failed: the caller may not act on this resource.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The caller's cancellation token fired.
    #[error("operation cancelled")]
    Cancelled,

    /// A usage store read failed; propagated as-is.
    #[error("usage store error: {0}")]
    Store(#[from] sqlx::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_feature_id() {
        let err = EntitlementError::FeatureNotFound(FeatureId::CustomLabels);
        assert_eq!(err.to_string(), "feature not found: custom_labels");
    }

    #[test]
    fn test_quota_exceeded_display() {
        let err = EntitlementError::QuotaExceeded {
            feature: FeatureId::ActiveSubscriptionsCount,
            limit: Some(10),
            used: 10,
        };
        assert_eq!(
            err.to_string(),
            "quota exceeded for active_subscriptions_count: 10 used"
        );
    }

    #[test]
    fn test_store_errors_convert_via_from() {
        let err: EntitlementError = sqlx::Error::PoolClosed.into();
        assert!(matches!(err, EntitlementError::Store(_)));
    }
}

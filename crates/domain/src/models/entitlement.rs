//! The resolved, gate-applied, usage-aware entitlement snapshot.

use serde::{Deserialize, Serialize};

use super::feature::{FeatureId, FeatureType};
use super::plan::QuotaLimit;

/// Result of resolving `(account, feature)` at a moment in time.
///
/// Shape invariants, maintained by the constructors:
/// - boolean features carry no `limit`/`used`/`remaining`;
/// - unlimited quotas carry `used` but no `limit`/`remaining`;
/// - capped quotas carry all three, with `remaining = max(0, limit - used)`
///   and `enabled = remaining > 0`;
/// - a closed gate forces `enabled = false` with all numbers absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EffectiveEntitlement {
    pub feature_id: FeatureId,
    pub feature_type: FeatureType,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<i64>,
}

impl EffectiveEntitlement {
    /// Snapshot for a boolean feature.
    pub fn boolean(feature_id: FeatureId, enabled: bool) -> Self {
        Self {
            feature_id,
            feature_type: FeatureType::Boolean,
            enabled,
            limit: None,
            used: None,
            remaining: None,
        }
    }

    /// Snapshot for a quota feature whose gate resolved to disabled.
    pub fn gate_closed(feature_id: FeatureId) -> Self {
        Self {
            feature_id,
            feature_type: FeatureType::Quota,
            enabled: false,
            limit: None,
            used: None,
            remaining: None,
        }
    }

    /// Snapshot for a quota feature from its plan limit and observed usage.
    ///
    /// Consumption is surfaced even when the plan does not cap the feature;
    /// operators want to see `used` regardless.
    pub fn quota(feature_id: FeatureId, limit: QuotaLimit, used: i64) -> Self {
        match limit {
            QuotaLimit::Unlimited => Self {
                feature_id,
                feature_type: FeatureType::Quota,
                enabled: true,
                limit: None,
                used: Some(used),
                remaining: None,
            },
            QuotaLimit::Capped(limit) => {
                let remaining = (limit - used).max(0);
                Self {
                    feature_id,
                    feature_type: FeatureType::Quota,
                    enabled: remaining > 0,
                    limit: Some(limit),
                    used: Some(used),
                    remaining: Some(remaining),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolean_snapshot_carries_no_numbers() {
        let ent = EffectiveEntitlement::boolean(FeatureId::Subscriptions, true);
        assert!(ent.enabled);
        assert_eq!(ent.limit, None);
        assert_eq!(ent.used, None);
        assert_eq!(ent.remaining, None);
    }

    #[test]
    fn test_unlimited_quota_surfaces_used_only() {
        let ent = EffectiveEntitlement::quota(
            FeatureId::CustomLabelsCount,
            QuotaLimit::Unlimited,
            999,
        );
        assert!(ent.enabled);
        assert_eq!(ent.limit, None);
        assert_eq!(ent.used, Some(999));
        assert_eq!(ent.remaining, None);
    }

    #[test]
    fn test_capped_quota_arithmetic() {
        let ent = EffectiveEntitlement::quota(
            FeatureId::ActiveSubscriptionsCount,
            QuotaLimit::Capped(10),
            2,
        );
        assert!(ent.enabled);
        assert_eq!(ent.limit, Some(10));
        assert_eq!(ent.used, Some(2));
        assert_eq!(ent.remaining, Some(8));
    }

    #[test]
    fn test_overconsumed_quota_clamps_remaining_at_zero() {
        let ent = EffectiveEntitlement::quota(
            FeatureId::ActiveSubscriptionsCount,
            QuotaLimit::Capped(10),
            14,
        );
        assert!(!ent.enabled);
        assert_eq!(ent.remaining, Some(0));
    }

    #[test]
    fn test_zero_cap_disables() {
        let ent = EffectiveEntitlement::quota(
            FeatureId::CustomLabelsCount,
            QuotaLimit::Capped(0),
            0,
        );
        assert!(!ent.enabled);
        assert_eq!(ent.remaining, Some(0));
    }

    #[test]
    fn test_absent_numbers_skipped_in_json() {
        let ent = EffectiveEntitlement::boolean(FeatureId::Family, false);
        let json = serde_json::to_value(ent).unwrap();
        assert!(json.get("limit").is_none());
        assert!(json.get("used").is_none());
        assert!(json.get("remaining").is_none());
    }
}

//! Plan identifiers and the static plan entitlement table.

use std::collections::HashMap;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use super::feature::FeatureId;

/// Commercial tier an account is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanId {
    Free,
    Pro,
    Family,
    /// Error sentinel for accounts whose plan could not be resolved.
    Unknown,
}

impl PlanId {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanId::Free => "free",
            PlanId::Pro => "pro",
            PlanId::Family => "family",
            PlanId::Unknown => "unknown",
        }
    }

    /// Parse a stored plan id. Unrecognized ids map to the sentinel.
    pub fn parse(s: &str) -> PlanId {
        match s {
            "free" => PlanId::Free,
            "pro" => PlanId::Pro,
            "family" => PlanId::Family,
            _ => PlanId::Unknown,
        }
    }
}

impl std::fmt::Display for PlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tri-state boolean grant.
///
/// `Unspecified` collapses to "denied" at the resolver boundary; it exists so
/// a table entry can carry a quota limit without taking a stance on the
/// boolean question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grant {
    Granted,
    Denied,
    Unspecified,
}

/// Quota cap carried by a plan entitlement.
///
/// Modeled as a sum rather than a sentinel integer: `Unlimited` is "no cap",
/// `Capped(0)` is "disabled by zero cap".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaLimit {
    Unlimited,
    Capped(i64),
}

/// What a plan says about a single feature.
///
/// For boolean features only `allowed` is meaningful; for quota features only
/// `limit` is. The constructors keep the irrelevant half at its neutral
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanEntitlement {
    pub allowed: Grant,
    pub limit: QuotaLimit,
}

impl PlanEntitlement {
    /// Boolean feature granted.
    pub fn granted() -> Self {
        Self {
            allowed: Grant::Granted,
            limit: QuotaLimit::Unlimited,
        }
    }

    /// Boolean feature explicitly denied.
    pub fn denied() -> Self {
        Self {
            allowed: Grant::Denied,
            limit: QuotaLimit::Unlimited,
        }
    }

    /// Quota feature with no cap.
    pub fn unlimited() -> Self {
        Self {
            allowed: Grant::Unspecified,
            limit: QuotaLimit::Unlimited,
        }
    }

    /// Quota feature capped at `limit` units.
    pub fn capped(limit: i64) -> Self {
        debug_assert!(limit >= 0, "quota caps are non-negative");
        Self {
            allowed: Grant::Unspecified,
            limit: QuotaLimit::Capped(limit),
        }
    }

    /// The collapsed boolean reading of this entry.
    pub fn is_granted(&self) -> bool {
        self.allowed == Grant::Granted
    }
}

/// Process-wide mapping `plan -> feature -> entitlement`.
///
/// The table is sparse: a plan lists only the features it takes a stance on.
/// Absence of an entry means "not granted" for booleans and "zero cap" for
/// quotas, which the resolver applies.
#[derive(Debug, Clone, Default)]
pub struct PlanEntitlementTable {
    plans: HashMap<PlanId, HashMap<FeatureId, PlanEntitlement>>,
}

impl PlanEntitlementTable {
    /// An empty table; populate with [`Self::with`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one entry, consuming and returning the table for chaining.
    pub fn with(mut self, plan: PlanId, feature: FeatureId, entry: PlanEntitlement) -> Self {
        self.plans.entry(plan).or_default().insert(feature, entry);
        self
    }

    /// Look up a plan's entry for a feature. `None` is meaningful, not an
    /// error.
    pub fn lookup(&self, plan: PlanId, feature: FeatureId) -> Option<&PlanEntitlement> {
        self.plans.get(&plan).and_then(|row| row.get(&feature))
    }

    /// The feature ids a plan's row takes a stance on.
    pub fn row(&self, plan: PlanId) -> Option<&HashMap<FeatureId, PlanEntitlement>> {
        self.plans.get(&plan)
    }

    /// The table shipped in production.
    ///
    /// Every plan row mentions all four boolean gates explicitly; gate
    /// evaluation treats a missing gate entry as a misconfigured plan.
    pub fn standard() -> Self {
        Self::new()
            // Free: subscription tracking with a cap, nothing custom.
            .with(
                PlanId::Free,
                FeatureId::Subscriptions,
                PlanEntitlement::granted(),
            )
            .with(
                PlanId::Free,
                FeatureId::ActiveSubscriptionsCount,
                PlanEntitlement::capped(10),
            )
            .with(
                PlanId::Free,
                FeatureId::CustomLabels,
                PlanEntitlement::denied(),
            )
            .with(
                PlanId::Free,
                FeatureId::CustomProviders,
                PlanEntitlement::denied(),
            )
            .with(PlanId::Free, FeatureId::Family, PlanEntitlement::denied())
            // Pro: uncapped tracking, custom labels and providers.
            .with(
                PlanId::Pro,
                FeatureId::Subscriptions,
                PlanEntitlement::granted(),
            )
            .with(
                PlanId::Pro,
                FeatureId::ActiveSubscriptionsCount,
                PlanEntitlement::unlimited(),
            )
            .with(
                PlanId::Pro,
                FeatureId::CustomLabels,
                PlanEntitlement::granted(),
            )
            .with(
                PlanId::Pro,
                FeatureId::CustomLabelsCount,
                PlanEntitlement::unlimited(),
            )
            .with(
                PlanId::Pro,
                FeatureId::CustomProviders,
                PlanEntitlement::granted(),
            )
            .with(
                PlanId::Pro,
                FeatureId::CustomProvidersCount,
                PlanEntitlement::capped(25),
            )
            .with(PlanId::Pro, FeatureId::Family, PlanEntitlement::denied())
            // Family: everything Pro has, plus member invites.
            .with(
                PlanId::Family,
                FeatureId::Subscriptions,
                PlanEntitlement::granted(),
            )
            .with(
                PlanId::Family,
                FeatureId::ActiveSubscriptionsCount,
                PlanEntitlement::unlimited(),
            )
            .with(
                PlanId::Family,
                FeatureId::CustomLabels,
                PlanEntitlement::granted(),
            )
            .with(
                PlanId::Family,
                FeatureId::CustomLabelsCount,
                PlanEntitlement::unlimited(),
            )
            .with(
                PlanId::Family,
                FeatureId::CustomProviders,
                PlanEntitlement::granted(),
            )
            .with(
                PlanId::Family,
                FeatureId::CustomProvidersCount,
                PlanEntitlement::capped(25),
            )
            .with(PlanId::Family, FeatureId::Family, PlanEntitlement::granted())
            .with(
                PlanId::Family,
                FeatureId::FamilyMembersCount,
                PlanEntitlement::capped(5),
            )
    }
}

lazy_static! {
    /// The production table, built once per process.
    pub static ref STANDARD_PLANS: PlanEntitlementTable = PlanEntitlementTable::standard();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::feature::STANDARD_CATALOG;

    #[test]
    fn test_parse_round_trips_known_plans() {
        for plan in [PlanId::Free, PlanId::Pro, PlanId::Family] {
            assert_eq!(PlanId::parse(plan.as_str()), plan);
        }
        assert_eq!(PlanId::parse("enterprise"), PlanId::Unknown);
    }

    #[test]
    fn test_lookup_absent_entry_is_none() {
        // Free grants nothing for custom_labels_count; the resolver reads
        // this absence as a zero cap.
        assert!(STANDARD_PLANS
            .lookup(PlanId::Free, FeatureId::CustomLabelsCount)
            .is_none());
    }

    #[test]
    fn test_standard_table_ids_exist_in_catalog() {
        for plan in [PlanId::Free, PlanId::Pro, PlanId::Family] {
            let row = STANDARD_PLANS.row(plan).unwrap();
            for feature in row.keys() {
                assert!(
                    STANDARD_CATALOG.lookup(*feature).is_some(),
                    "{feature} missing from catalog"
                );
            }
        }
    }

    #[test]
    fn test_standard_rows_mention_every_gate() {
        for plan in [PlanId::Free, PlanId::Pro, PlanId::Family] {
            for gate in [
                FeatureId::Subscriptions,
                FeatureId::CustomLabels,
                FeatureId::CustomProviders,
                FeatureId::Family,
            ] {
                assert!(
                    STANDARD_PLANS.lookup(plan, gate).is_some(),
                    "plan {plan} is missing gate {gate}"
                );
            }
        }
    }

    #[test]
    fn test_entry_constructors_collapse_as_expected() {
        assert!(PlanEntitlement::granted().is_granted());
        assert!(!PlanEntitlement::denied().is_granted());
        assert!(!PlanEntitlement::unlimited().is_granted());
        assert_eq!(
            PlanEntitlement::capped(0).limit,
            QuotaLimit::Capped(0)
        );
    }
}

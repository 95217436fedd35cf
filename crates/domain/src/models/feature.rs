//! Feature identifiers and the static feature catalog.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

/// Stable symbolic id of a billable feature.
///
/// The set is closed; ids arriving from storage or clients that fall outside
/// it parse to the [`FeatureId::Unknown`] sentinel, which the resolver
/// rejects with `FeatureNotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureId {
    Subscriptions,
    ActiveSubscriptionsCount,
    CustomLabels,
    CustomLabelsCount,
    CustomProviders,
    CustomProvidersCount,
    Family,
    FamilyMembersCount,
    Unknown,
}

impl FeatureId {
    /// The wire/storage form of the id.
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureId::Subscriptions => "subscriptions",
            FeatureId::ActiveSubscriptionsCount => "active_subscriptions_count",
            FeatureId::CustomLabels => "custom_labels",
            FeatureId::CustomLabelsCount => "custom_labels_count",
            FeatureId::CustomProviders => "custom_providers",
            FeatureId::CustomProvidersCount => "custom_providers_count",
            FeatureId::Family => "family",
            FeatureId::FamilyMembersCount => "family_members_count",
            FeatureId::Unknown => "unknown",
        }
    }

    /// Parse a stored feature id. Unrecognized ids map to the sentinel.
    pub fn parse(s: &str) -> FeatureId {
        match s {
            "subscriptions" => FeatureId::Subscriptions,
            "active_subscriptions_count" => FeatureId::ActiveSubscriptionsCount,
            "custom_labels" => FeatureId::CustomLabels,
            "custom_labels_count" => FeatureId::CustomLabelsCount,
            "custom_providers" => FeatureId::CustomProviders,
            "custom_providers_count" => FeatureId::CustomProvidersCount,
            "family" => FeatureId::Family,
            "family_members_count" => FeatureId::FamilyMembersCount,
            _ => FeatureId::Unknown,
        }
    }
}

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether a feature is an on/off capability or a metered dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureType {
    Boolean,
    Quota,
}

/// Static descriptor of a single feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feature {
    pub id: FeatureId,
    pub feature_type: FeatureType,
    /// A boolean feature that must itself be enabled for this one to matter.
    pub gated_by: Option<FeatureId>,
}

impl Feature {
    /// An ungated boolean capability.
    pub fn boolean(id: FeatureId) -> Self {
        Self {
            id,
            feature_type: FeatureType::Boolean,
            gated_by: None,
        }
    }

    /// A metered dimension, optionally gated on a boolean feature.
    pub fn quota(id: FeatureId, gated_by: Option<FeatureId>) -> Self {
        Self {
            id,
            feature_type: FeatureType::Quota,
            gated_by,
        }
    }
}

/// Process-wide immutable registry of features.
///
/// Built once and injected into the resolver; tests construct tailored
/// catalogs per case instead of mutating a global.
#[derive(Debug, Clone)]
pub struct FeatureCatalog {
    // Small closed set; declaration order doubles as presentation order.
    features: Vec<Feature>,
}

impl FeatureCatalog {
    /// Build a catalog from descriptors.
    ///
    /// # Panics
    ///
    /// Panics if a `gated_by` reference names a feature that is missing from
    /// the catalog or is not boolean. Catalogs are static configuration, so
    /// a bad gate wiring is a programming error caught at startup.
    pub fn new(features: Vec<Feature>) -> Self {
        for feature in &features {
            if let Some(gate) = feature.gated_by {
                let gate_feature = features
                    .iter()
                    .find(|f| f.id == gate)
                    .unwrap_or_else(|| panic!("gate {gate} of {} not in catalog", feature.id));
                assert!(
                    gate_feature.feature_type == FeatureType::Boolean,
                    "gate {gate} of {} is not a boolean feature",
                    feature.id
                );
            }
        }
        Self { features }
    }

    /// Look up a feature descriptor.
    pub fn lookup(&self, id: FeatureId) -> Option<&Feature> {
        self.features.iter().find(|f| f.id == id)
    }

    /// All descriptors in declaration order.
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// The catalog shipped in production.
    pub fn standard() -> Self {
        Self::new(vec![
            Feature::boolean(FeatureId::Subscriptions),
            Feature::quota(
                FeatureId::ActiveSubscriptionsCount,
                Some(FeatureId::Subscriptions),
            ),
            Feature::boolean(FeatureId::CustomLabels),
            Feature::quota(FeatureId::CustomLabelsCount, Some(FeatureId::CustomLabels)),
            Feature::boolean(FeatureId::CustomProviders),
            Feature::quota(
                FeatureId::CustomProvidersCount,
                Some(FeatureId::CustomProviders),
            ),
            Feature::boolean(FeatureId::Family),
            Feature::quota(FeatureId::FamilyMembersCount, Some(FeatureId::Family)),
        ])
    }
}

lazy_static! {
    /// The production catalog, built once per process.
    pub static ref STANDARD_CATALOG: FeatureCatalog = FeatureCatalog::standard();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_known_ids() {
        for feature in STANDARD_CATALOG.features() {
            assert_eq!(FeatureId::parse(feature.id.as_str()), feature.id);
        }
    }

    #[test]
    fn test_parse_unrecognized_id_is_sentinel() {
        assert_eq!(FeatureId::parse("made_up_feature"), FeatureId::Unknown);
    }

    #[test]
    fn test_standard_catalog_gates_are_boolean() {
        for feature in STANDARD_CATALOG.features() {
            if let Some(gate) = feature.gated_by {
                let gate_feature = STANDARD_CATALOG.lookup(gate).unwrap();
                assert_eq!(gate_feature.feature_type, FeatureType::Boolean);
            }
        }
    }

    #[test]
    fn test_lookup_missing_feature_is_none() {
        assert!(STANDARD_CATALOG.lookup(FeatureId::Unknown).is_none());
    }

    #[test]
    #[should_panic(expected = "not in catalog")]
    fn test_catalog_rejects_dangling_gate() {
        FeatureCatalog::new(vec![Feature::quota(
            FeatureId::FamilyMembersCount,
            Some(FeatureId::Family),
        )]);
    }

    #[test]
    #[should_panic(expected = "not a boolean feature")]
    fn test_catalog_rejects_quota_gate() {
        FeatureCatalog::new(vec![
            Feature::quota(FeatureId::ActiveSubscriptionsCount, None),
            Feature::quota(
                FeatureId::CustomLabelsCount,
                Some(FeatureId::ActiveSubscriptionsCount),
            ),
        ]);
    }
}

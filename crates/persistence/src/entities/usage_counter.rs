//! Usage counter database entity.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::{FeatureId, UsageCounter};

/// Row of the `usage_counters` table, keyed on `(user_id, feature_id)`.
#[derive(Debug, Clone, FromRow)]
pub struct UsageCounterEntity {
    pub user_id: Uuid,
    pub feature_id: String,
    pub used: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UsageCounterEntity {
    /// Convert the row into the domain model.
    ///
    /// A feature id that is no longer in the closed set parses to the
    /// unknown sentinel; consumers that walk the catalog simply never ask
    /// for it.
    pub fn into_domain(self) -> UsageCounter {
        UsageCounter::new(self.user_id, FeatureId::parse(&self.feature_id), self.used)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use fake::uuid::UUIDv4;
    use fake::Fake;

    fn entity(feature_id: &str, used: i64) -> UsageCounterEntity {
        UsageCounterEntity {
            user_id: UUIDv4.fake(),
            feature_id: feature_id.to_string(),
            used,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_into_domain_parses_feature_id() {
        let counter = entity("custom_labels_count", 7).into_domain();
        assert_eq!(counter.feature_id, FeatureId::CustomLabelsCount);
        assert_eq!(counter.used, 7);
    }

    #[test]
    fn test_into_domain_maps_retired_ids_to_sentinel() {
        let counter = entity("retired_feature", 1).into_domain();
        assert_eq!(counter.feature_id, FeatureId::Unknown);
    }
}

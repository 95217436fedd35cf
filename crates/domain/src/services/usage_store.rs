//! Usage counter store seam.
//!
//! The core only reads counters; increments and decrements are the
//! persistence layer's job and happen inside the same transaction as the
//! entity write they account for.

use std::collections::HashMap;

use uuid::Uuid;

use crate::errors::EntitlementError;
use crate::models::feature::FeatureId;
use crate::models::usage::UsageCounter;

/// Read access to persisted usage counters.
///
/// `get` returning `None` is equivalent to `used = 0`. Implementations must
/// be safe under concurrent reads.
#[async_trait::async_trait]
pub trait UsageStore: Send + Sync {
    /// Current counter for one `(user, feature)` pair, if any.
    async fn get(
        &self,
        user_id: Uuid,
        feature_id: FeatureId,
    ) -> Result<Option<UsageCounter>, EntitlementError>;

    /// All counters for a user in one round-trip.
    async fn get_all(&self, user_id: Uuid) -> Result<Vec<UsageCounter>, EntitlementError>;
}

/// In-memory usage store for development and testing.
///
/// Built up front with [`MockUsageStore::with_usage`] and read-only
/// afterwards. `failing()` produces a store whose every read surfaces a
/// storage error, for propagation tests.
#[derive(Debug, Clone, Default)]
pub struct MockUsageStore {
    counters: HashMap<(Uuid, FeatureId), i64>,
    simulate_failure: bool,
}

impl MockUsageStore {
    /// An empty store: every counter reads as 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose reads all fail with a pool-closed storage error.
    pub fn failing() -> Self {
        Self {
            counters: HashMap::new(),
            simulate_failure: true,
        }
    }

    /// Seed one counter, consuming and returning the store for chaining.
    pub fn with_usage(mut self, user_id: Uuid, feature_id: FeatureId, used: i64) -> Self {
        self.counters.insert((user_id, feature_id), used);
        self
    }

    fn fail_if_requested(&self) -> Result<(), EntitlementError> {
        if self.simulate_failure {
            return Err(EntitlementError::Store(sqlx::Error::PoolClosed));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl UsageStore for MockUsageStore {
    async fn get(
        &self,
        user_id: Uuid,
        feature_id: FeatureId,
    ) -> Result<Option<UsageCounter>, EntitlementError> {
        self.fail_if_requested()?;
        Ok(self
            .counters
            .get(&(user_id, feature_id))
            .map(|used| UsageCounter::new(user_id, feature_id, *used)))
    }

    async fn get_all(&self, user_id: Uuid) -> Result<Vec<UsageCounter>, EntitlementError> {
        self.fail_if_requested()?;
        Ok(self
            .counters
            .iter()
            .filter(|((user, _), _)| *user == user_id)
            .map(|((user, feature), used)| UsageCounter::new(*user, *feature, *used))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_counter_reads_as_none() {
        let store = MockUsageStore::new();
        let got = store
            .get(Uuid::new_v4(), FeatureId::CustomLabelsCount)
            .await
            .unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn test_get_all_filters_by_user() {
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();
        let store = MockUsageStore::new()
            .with_usage(user, FeatureId::ActiveSubscriptionsCount, 3)
            .with_usage(other, FeatureId::ActiveSubscriptionsCount, 7);

        let counters = store.get_all(user).await.unwrap();
        assert_eq!(counters.len(), 1);
        assert_eq!(counters[0].used, 3);
    }

    #[tokio::test]
    async fn test_failing_store_surfaces_store_error() {
        let store = MockUsageStore::failing();
        let err = store
            .get(Uuid::new_v4(), FeatureId::CustomLabelsCount)
            .await
            .unwrap_err();
        assert!(matches!(err, EntitlementError::Store(_)));
    }
}

//! Repository for usage counter database operations.
//!
//! The entitlement core only reads counters (through the
//! [`domain::services::UsageStore`] seam). The write methods here are for
//! command handlers: they run inside the same transaction as the entity
//! insert or delete they account for, so the check-then-act gap of the
//! resolver's snapshot is closed by the database.
//!
//! Table layout:
//!
//! ```sql
//! usage_counters (
//!     user_id    UUID        NOT NULL,
//!     feature_id TEXT        NOT NULL,
//!     used       BIGINT      NOT NULL CHECK (used >= 0),
//!     created_at TIMESTAMPTZ NOT NULL,
//!     updated_at TIMESTAMPTZ NOT NULL,
//!     PRIMARY KEY (user_id, feature_id)
//! )
//! ```

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use domain::errors::EntitlementError;
use domain::models::{FeatureId, UsageCounter};
use domain::services::UsageStore;

use crate::entities::UsageCounterEntity;
use crate::metrics::QueryTimer;

/// Repository for the `usage_counters` table.
#[derive(Debug, Clone)]
pub struct UsageCounterRepository {
    pool: PgPool,
}

impl UsageCounterRepository {
    /// Create a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Finds the counter row for one `(user, feature)` pair.
    ///
    /// Returns `None` if the user has never consumed the feature.
    pub async fn find(
        &self,
        user_id: Uuid,
        feature_id: FeatureId,
    ) -> Result<Option<UsageCounterEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_usage_counter");

        let result = sqlx::query_as::<_, UsageCounterEntity>(
            r#"
            SELECT user_id, feature_id, used, created_at, updated_at
            FROM usage_counters
            WHERE user_id = $1 AND feature_id = $2
            "#,
        )
        .bind(user_id)
        .bind(feature_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        timer.record();
        Ok(result)
    }

    /// Finds all counter rows for a user in one round-trip.
    pub async fn find_all(&self, user_id: Uuid) -> Result<Vec<UsageCounterEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_all_usage_counters");

        let result = sqlx::query_as::<_, UsageCounterEntity>(
            r#"
            SELECT user_id, feature_id, used, created_at, updated_at
            FROM usage_counters
            WHERE user_id = $1
            ORDER BY feature_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        timer.record();
        Ok(result)
    }

    /// Consume one unit of a capped feature, guarded against the limit.
    ///
    /// A single atomic statement: the row is created at 1 (only when the
    /// limit admits at least one unit) or incremented only while still below
    /// `limit`. Returns `false` when the guard rejected the increment, in
    /// which case the caller rolls back its transaction.
    pub async fn increment_within_limit(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        feature_id: FeatureId,
        limit: i64,
    ) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("increment_usage_within_limit");

        let result = sqlx::query(
            r#"
            INSERT INTO usage_counters (user_id, feature_id, used)
            SELECT $1, $2, 1
            WHERE $3 >= 1
            ON CONFLICT (user_id, feature_id)
            DO UPDATE SET used = usage_counters.used + 1, updated_at = NOW()
            WHERE usage_counters.used < $3
            "#,
        )
        .bind(user_id)
        .bind(feature_id.as_str())
        .bind(limit)
        .execute(&mut **tx)
        .await?;

        timer.record();
        let consumed = result.rows_affected() == 1;
        if !consumed {
            tracing::debug!(
                user_id = %user_id,
                feature = %feature_id,
                limit,
                "guarded increment rejected at limit"
            );
        }
        Ok(consumed)
    }

    /// Consume one unit of an uncapped feature.
    pub async fn increment(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        feature_id: FeatureId,
    ) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("increment_usage");

        sqlx::query(
            r#"
            INSERT INTO usage_counters (user_id, feature_id, used)
            VALUES ($1, $2, 1)
            ON CONFLICT (user_id, feature_id)
            DO UPDATE SET used = usage_counters.used + 1, updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(feature_id.as_str())
        .execute(&mut **tx)
        .await?;

        timer.record();
        Ok(())
    }

    /// Release one unit on deletion of the owning entity.
    ///
    /// Clamped at zero: counters never go negative even if deletes and
    /// backfills race.
    pub async fn decrement(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        feature_id: FeatureId,
    ) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("decrement_usage");

        sqlx::query(
            r#"
            UPDATE usage_counters
            SET used = GREATEST(used - 1, 0), updated_at = NOW()
            WHERE user_id = $1 AND feature_id = $2
            "#,
        )
        .bind(user_id)
        .bind(feature_id.as_str())
        .execute(&mut **tx)
        .await?;

        timer.record();
        Ok(())
    }
}

#[async_trait::async_trait]
impl UsageStore for UsageCounterRepository {
    async fn get(
        &self,
        user_id: Uuid,
        feature_id: FeatureId,
    ) -> Result<Option<UsageCounter>, EntitlementError> {
        let row = self.find(user_id, feature_id).await?;
        Ok(row.map(UsageCounterEntity::into_domain))
    }

    async fn get_all(&self, user_id: Uuid) -> Result<Vec<UsageCounter>, EntitlementError> {
        let rows = self.find_all(user_id).await?;
        Ok(rows.into_iter().map(UsageCounterEntity::into_domain).collect())
    }
}

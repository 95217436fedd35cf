//! Usage counter model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::feature::FeatureId;

/// Per-user, per-feature consumption counter.
///
/// Created lazily by the persistence layer on first increment; a missing
/// counter reads as `used = 0`. Invariant: `used >= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UsageCounter {
    pub user_id: Uuid,
    pub feature_id: FeatureId,
    pub used: i64,
}

impl UsageCounter {
    pub fn new(user_id: Uuid, feature_id: FeatureId, used: i64) -> Self {
        debug_assert!(used >= 0, "usage counters are non-negative");
        Self {
            user_id,
            feature_id,
            used,
        }
    }
}

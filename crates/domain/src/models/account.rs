//! Account model consumed by the entitlement core.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::plan::PlanId;

/// A caller identity plus the plan they are currently on.
///
/// Owned by the account subsystem; the core treats it as a read-only value
/// and never mutates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Account {
    pub user_id: Uuid,
    pub plan_id: PlanId,
}

impl Account {
    pub fn new(user_id: Uuid, plan_id: PlanId) -> Self {
        Self { user_id, plan_id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_serializes_plan_as_snake_case() {
        let account = Account::new(Uuid::nil(), PlanId::Free);
        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["plan_id"], "free");
    }
}

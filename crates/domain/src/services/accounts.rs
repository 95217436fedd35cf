//! Account provider seam.

use crate::context::RequestContext;
use crate::errors::EntitlementError;
use crate::models::account::Account;

/// Resolves the authenticated account for the current request.
///
/// Owned by the account subsystem; the entitlement core asks it once per
/// request and treats the result as read-only.
#[async_trait::async_trait]
pub trait AccountProvider: Send + Sync {
    /// The connected account, or `Forbidden` when no identity is attached to
    /// the request.
    async fn must_get_connected_account(
        &self,
        ctx: &RequestContext,
    ) -> Result<Account, EntitlementError>;
}

/// Account provider for development and testing: always returns the account
/// it was constructed with.
#[derive(Debug, Clone)]
pub struct MockAccountProvider {
    account: Account,
}

impl MockAccountProvider {
    pub fn returning(account: Account) -> Self {
        Self { account }
    }
}

#[async_trait::async_trait]
impl AccountProvider for MockAccountProvider {
    async fn must_get_connected_account(
        &self,
        ctx: &RequestContext,
    ) -> Result<Account, EntitlementError> {
        ctx.ensure_active()?;
        Ok(self.account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::plan::PlanId;
    use fake::uuid::UUIDv4;
    use fake::Fake;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_mock_provider_returns_configured_account() {
        let user_id: Uuid = UUIDv4.fake();
        let account = Account::new(user_id, PlanId::Pro);
        let provider = MockAccountProvider::returning(account);

        let got = provider
            .must_get_connected_account(&RequestContext::new())
            .await
            .unwrap();
        assert_eq!(got, account);
    }
}

//! Per-request context carried through every core operation.

use tokio_util::sync::CancellationToken;

use crate::errors::EntitlementError;

/// Context passed by command handlers into the entitlement core.
///
/// Carries the caller-supplied cancellation token. A fired token causes any
/// core operation to return [`EntitlementError::Cancelled`] at its next
/// suspension point without touching storage.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancellation: CancellationToken,
}

impl RequestContext {
    /// Create a context with a fresh cancellation token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context driven by an externally owned token.
    pub fn with_token(cancellation: CancellationToken) -> Self {
        Self { cancellation }
    }

    /// The underlying cancellation token.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Whether the caller has cancelled the request.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Fail fast if the request was cancelled.
    pub fn ensure_active(&self) -> Result<(), EntitlementError> {
        if self.is_cancelled() {
            return Err(EntitlementError::Cancelled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_context_is_active() {
        let ctx = RequestContext::new();
        assert!(!ctx.is_cancelled());
        assert!(ctx.ensure_active().is_ok());
    }

    #[test]
    fn test_cancelled_token_surfaces_cancelled_error() {
        let token = CancellationToken::new();
        let ctx = RequestContext::with_token(token.clone());
        token.cancel();

        assert!(ctx.is_cancelled());
        assert!(matches!(
            ctx.ensure_active(),
            Err(EntitlementError::Cancelled)
        ));
    }
}

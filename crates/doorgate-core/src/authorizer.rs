//! The seam between the entry controller and whatever decides on credentials.
//!
//! The controller only ever sees [`Authorizer`]. The production
//! implementation performs one encrypted exchange with the remote server
//! (see `doorgate-network`); tests substitute scripted authorizers.

#![allow(async_fn_in_trait)]

use crate::types::Credential;

/// Outcome of one authorization exchange.
///
/// The decision is strictly boolean. On a grant the server's response body
/// may ride along as opaque feedback text (typically the card holder's name).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthorizationResult {
    pub granted: bool,
    pub message: Option<String>,
}

impl AuthorizationResult {
    #[must_use]
    pub fn granted() -> Self {
        Self {
            granted: true,
            message: None,
        }
    }

    #[must_use]
    pub fn denied() -> Self {
        Self::default()
    }

    /// Attach feedback text. Ignored on denials.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        if self.granted {
            self.message = Some(message.into());
        }
        self
    }
}

/// Decides whether a credential opens the door.
///
/// `check_authorization` completes (or times out) before returning; the
/// control loop awaits it inline, which is what guarantees that at most one
/// exchange is in flight. Implementations never fail: every error collapses
/// to a denial.
pub trait Authorizer {
    async fn check_authorization(&mut self, credential: &Credential) -> AuthorizationResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denied_is_default() {
        assert_eq!(AuthorizationResult::denied(), AuthorizationResult::default());
        assert!(!AuthorizationResult::denied().granted);
    }

    #[test]
    fn test_message_only_on_grant() {
        let granted = AuthorizationResult::granted().with_message("Alice");
        assert_eq!(granted.message.as_deref(), Some("Alice"));

        let denied = AuthorizationResult::denied().with_message("Alice");
        assert_eq!(denied.message, None);
    }
}

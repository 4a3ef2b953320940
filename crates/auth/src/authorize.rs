//! Building blocks for per-command authorization guards.
//!
//! A guard runs the override permissions first and returns early when one
//! grants access; otherwise it evaluates its own business permissions and
//! ends in [`deny`] when none of them grant access. Denial is terminal.

use quill_core::AuthorizationError;

use crate::claims::ClaimsIdentity;
use crate::permissions::{AlmightyLocalCliPermission, AlmightyTestsPermission};

/// Whether a trusted local agent is calling. Looks at the agent only.
pub fn overrides_apply(agent: &ClaimsIdentity) -> bool {
    AlmightyLocalCliPermission.evaluate(agent) || AlmightyTestsPermission.evaluate(agent)
}

/// Allow when `granted`, otherwise deny.
pub fn require(granted: bool, action: &'static str) -> Result<(), AuthorizationError> {
    if granted { Ok(()) } else { deny(action) }
}

pub fn deny(action: &'static str) -> Result<(), AuthorizationError> {
    tracing::warn!(action, "authorization denied");
    Err(AuthorizationError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{authenticate_cli, authenticate_tests};

    #[test]
    fn overrides_follow_the_agent() {
        assert!(overrides_apply(&authenticate_cli().agent));
        assert!(overrides_apply(&authenticate_tests().agent));
        assert!(!overrides_apply(&ClaimsIdentity::empty()));
    }

    #[test]
    fn require_maps_to_authorization_error() {
        assert_eq!(require(true, "test.action"), Ok(()));
        assert_eq!(require(false, "test.action"), Err(AuthorizationError));
    }
}

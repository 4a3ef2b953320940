//! Override ("almighty") permissions.
//!
//! These look at the agent only. A principal's roles never grant an override,
//! and the agent-name claim must be asserted by [`LOCAL_AUTHORITY`]: a token
//! whose `azp` happens to read "TESTS" carries the token issuer instead.

use crate::claims::{ClaimType, ClaimsIdentity, LOCAL_AUTHORITY};
use crate::identity::{AGENT_NAME_LOCAL_CLI, AGENT_NAME_TESTS};

fn first_local_agent_name(agent: &ClaimsIdentity) -> Option<&str> {
    let claim = agent.find_first(ClaimType::AgentName)?;
    if claim.issuer() != LOCAL_AUTHORITY {
        return None;
    }
    claim.as_agent_name()
}

/// Grants everything to the local command-line tool.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlmightyLocalCliPermission;

impl AlmightyLocalCliPermission {
    pub fn evaluate(&self, agent: &ClaimsIdentity) -> bool {
        first_local_agent_name(agent) == Some(AGENT_NAME_LOCAL_CLI)
    }
}

/// Grants everything to the automated test harness.
///
/// Compiled to a constant `false` unless the crate is built for its own tests
/// or with the `almighty-tests` feature.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlmightyTestsPermission;

impl AlmightyTestsPermission {
    pub fn evaluate(&self, agent: &ClaimsIdentity) -> bool {
        if !cfg!(any(test, feature = "almighty-tests")) {
            return false;
        }
        first_local_agent_name(agent) == Some(AGENT_NAME_TESTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::{Claim, ClaimValue};
    use crate::identity::{authenticate_cli, authenticate_tests};

    fn agent_named(issuer: &str, name: &str) -> ClaimsIdentity {
        ClaimsIdentity::new(vec![Claim::new(issuer, ClaimValue::AgentName(name.into()))])
    }

    #[test]
    fn tests_override_requires_local_issuer() {
        assert!(AlmightyTestsPermission.evaluate(&authenticate_tests().agent));
        assert!(AlmightyTestsPermission.evaluate(&agent_named(LOCAL_AUTHORITY, "TESTS")));
        assert!(!AlmightyTestsPermission.evaluate(&agent_named("https://idp.example.org", "TESTS")));
        assert!(!AlmightyTestsPermission.evaluate(&agent_named(LOCAL_AUTHORITY, "tests")));
    }

    #[test]
    fn cli_override_matches_cli_agent_only() {
        assert!(AlmightyLocalCliPermission.evaluate(&authenticate_cli().agent));
        assert!(!AlmightyLocalCliPermission.evaluate(&authenticate_tests().agent));
        assert!(!AlmightyLocalCliPermission.evaluate(&agent_named("https://idp.example.org", "LOCAL CLI")));
        assert!(!AlmightyLocalCliPermission.evaluate(&ClaimsIdentity::empty()));
    }

    #[test]
    fn only_the_first_agent_name_counts() {
        let agent = ClaimsIdentity::new(vec![
            Claim::new("https://idp.example.org", ClaimValue::AgentName("admin-panel".into())),
            Claim::local(ClaimValue::AgentName("TESTS".into())),
        ]);
        assert!(!AlmightyTestsPermission.evaluate(&agent));
    }
}

//! Building the (principal, agent) pair for a call.
//!
//! There is one entry point per boundary: [`HttpAuthenticator`] for bearer
//! tokens, [`authenticate_cli`] for the local tool and [`authenticate_tests`]
//! for the test harness. Each returns the same [`Authentication`] shape.

use tracing::debug;

use crate::claims::{Claim, ClaimValue, ClaimsIdentity};
use crate::token::{
    AuthenticationError, InvalidVerifierKey, JwtAuthenticationOptions, TokenPayload, TokenVerifier,
};
use crate::Role;

pub const AGENT_NAME_LOCAL_CLI: &str = "LOCAL CLI";
pub const AGENT_PLATFORM_LOCAL_CLI: &str = "LOCAL CLI";
pub const AGENT_NAME_TESTS: &str = "TESTS";
pub const AGENT_PLATFORM_TESTS: &str = "TESTS";

/// Who a call acts for and what is making it. Built once per call, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Authentication {
    pub principal: ClaimsIdentity,
    pub agent: ClaimsIdentity,
}

/// Maps a verified token payload onto claims.
#[derive(Debug, Clone)]
pub struct IdentityBuilder {
    roles_resource: String,
}

impl IdentityBuilder {
    /// `roles_resource` names the `resource_access` entry whose roles are trusted.
    pub fn new(roles_resource: impl Into<String>) -> Self {
        Self {
            roles_resource: roles_resource.into(),
        }
    }

    pub fn build(&self, payload: &TokenPayload, user_agent: Option<&str>) -> Authentication {
        let issuer = payload.iss.as_str();

        let mut principal = vec![Claim::new(issuer, ClaimValue::UserId(payload.sub))];
        let optional = [
            (&payload.username, ClaimValue::Username as fn(String) -> ClaimValue),
            (&payload.email, ClaimValue::Email),
            (&payload.given_name, ClaimValue::FirstName),
            (&payload.family_name, ClaimValue::LastName),
        ];
        for (field, make) in optional {
            if let Some(value) = non_empty(field) {
                principal.push(Claim::new(issuer, make(value.to_string())));
            }
        }
        if let Some(access) = payload.resource_access.get(&self.roles_resource) {
            principal.extend(
                access
                    .roles
                    .iter()
                    .map(|r| Claim::new(issuer, ClaimValue::Role(Role::new(r.clone())))),
            );
        }

        let mut agent = Vec::with_capacity(2);
        if let Some(platform) = user_agent.map(str::trim).filter(|s| !s.is_empty()) {
            agent.push(Claim::local(ClaimValue::AgentPlatform(platform.to_string())));
        }
        if let Some(azp) = non_empty(&payload.azp) {
            agent.push(Claim::new(issuer, ClaimValue::AgentName(azp.to_string())));
        }

        Authentication {
            principal: ClaimsIdentity::new(principal),
            agent: ClaimsIdentity::new(agent),
        }
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.trim().is_empty())
}

/// Entry point for HTTP callers presenting a bearer token.
#[derive(Debug, Clone)]
pub struct HttpAuthenticator {
    verifier: TokenVerifier,
    identities: IdentityBuilder,
}

impl HttpAuthenticator {
    pub fn new(options: &JwtAuthenticationOptions) -> Result<Self, InvalidVerifierKey> {
        Ok(Self {
            verifier: TokenVerifier::new(options)?,
            identities: IdentityBuilder::new(options.roles_resource()),
        })
    }

    pub fn authenticate(
        &self,
        token: &str,
        user_agent: Option<&str>,
    ) -> Result<Authentication, AuthenticationError> {
        let payload = self.verifier.verify(token).inspect_err(|e| {
            debug!(error = %e, "bearer token rejected");
        })?;
        Ok(self.identities.build(&payload, user_agent))
    }
}

fn local_agent(name: &str, platform: &str) -> ClaimsIdentity {
    ClaimsIdentity::new(vec![
        Claim::local(ClaimValue::AgentName(name.to_string())),
        Claim::local(ClaimValue::AgentPlatform(platform.to_string())),
    ])
}

/// Entry point for the local command-line tool. No token, no principal claims.
pub fn authenticate_cli() -> Authentication {
    Authentication {
        principal: ClaimsIdentity::empty(),
        agent: local_agent(AGENT_NAME_LOCAL_CLI, AGENT_PLATFORM_LOCAL_CLI),
    }
}

/// Entry point for the automated test harness.
#[cfg(any(test, feature = "almighty-tests"))]
pub fn authenticate_tests() -> Authentication {
    Authentication {
        principal: ClaimsIdentity::empty(),
        agent: local_agent(AGENT_NAME_TESTS, AGENT_PLATFORM_TESTS),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use quill_core::UserId;

    use super::*;
    use crate::claims::{ClaimType, LOCAL_AUTHORITY};
    use crate::token::ResourceAccess;

    const ISSUER: &str = "https://idp.example.org/realms/newsroom";

    fn payload() -> TokenPayload {
        TokenPayload {
            iss: ISSUER.to_string(),
            sub: UserId::new(),
            username: Some("ann".into()),
            email: Some("ann@example.org".into()),
            given_name: Some("".into()),
            family_name: None,
            azp: Some("quill-admin".into()),
            resource_access: HashMap::from([
                (
                    "quill-internal".to_string(),
                    ResourceAccess {
                        roles: vec!["editor".into(), "night-shift".into()],
                    },
                ),
                (
                    "account".to_string(),
                    ResourceAccess {
                        roles: vec!["chief".into()],
                    },
                ),
            ]),
        }
    }

    #[test]
    fn principal_claims_come_from_the_token() {
        let payload = payload();
        let auth = IdentityBuilder::new("quill-internal").build(&payload, None);

        let first = &auth.principal.claims()[0];
        assert_eq!(first.as_user_id(), Some(payload.sub));
        assert_eq!(first.issuer(), ISSUER);
        assert!(auth.principal.find_first(ClaimType::Username).is_some());
        assert!(auth.principal.find_first(ClaimType::Email).is_some());
        assert!(auth.principal.find_first(ClaimType::FirstName).is_none());
        assert!(auth.principal.find_first(ClaimType::LastName).is_none());
    }

    #[test]
    fn only_roles_of_the_configured_resource_are_trusted() {
        let auth = IdentityBuilder::new("quill-internal").build(&payload(), None);
        let roles: Vec<&str> = auth.principal.roles().map(Role::as_str).collect();
        assert_eq!(roles, ["editor", "night-shift"]);

        let auth = IdentityBuilder::new("quill-public").build(&payload(), None);
        assert!(auth.principal.find_all(ClaimType::Role).is_empty());
    }

    #[test]
    fn agent_claims_carry_their_own_issuers() {
        let auth = IdentityBuilder::new("quill-internal").build(&payload(), Some("Mozilla/5.0"));

        let platform = auth.agent.find_first(ClaimType::AgentPlatform).unwrap();
        assert_eq!(platform.as_agent_platform(), Some("Mozilla/5.0"));
        assert_eq!(platform.issuer(), LOCAL_AUTHORITY);

        let name = auth.agent.find_first(ClaimType::AgentName).unwrap();
        assert_eq!(name.as_agent_name(), Some("quill-admin"));
        assert_eq!(name.issuer(), ISSUER);
    }

    #[test]
    fn agent_is_empty_without_user_agent_or_azp() {
        let mut payload = payload();
        payload.azp = None;
        let auth = IdentityBuilder::new("quill-internal").build(&payload, Some("  "));
        assert!(auth.agent.is_empty());
    }

    #[test]
    fn local_entry_points_have_no_principal() {
        let cli = authenticate_cli();
        assert!(cli.principal.is_empty());
        assert_eq!(
            cli.agent.find_first(ClaimType::AgentName).and_then(|c| c.as_agent_name()),
            Some(AGENT_NAME_LOCAL_CLI)
        );
        assert_eq!(
            cli.agent.find_first(ClaimType::AgentPlatform).and_then(|c| c.as_agent_platform()),
            Some(AGENT_PLATFORM_LOCAL_CLI)
        );

        let tests = authenticate_tests();
        assert!(tests.principal.is_empty());
        assert!(tests.agent.claims().iter().all(|c| c.issuer() == LOCAL_AUTHORITY));
    }
}

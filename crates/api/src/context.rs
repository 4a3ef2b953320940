use quill_auth::{Authentication, ClaimType, ClaimsIdentity};

/// The authenticated caller of a request.
///
/// Inserted into request extensions by [`crate::middleware::auth_middleware`]
/// and immutable from then on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    authentication: Authentication,
}

impl Caller {
    pub fn new(authentication: Authentication) -> Self {
        Self { authentication }
    }

    pub fn principal(&self) -> &ClaimsIdentity {
        &self.authentication.principal
    }

    pub fn agent(&self) -> &ClaimsIdentity {
        &self.authentication.agent
    }

    pub fn agent_name(&self) -> Option<&str> {
        self.agent()
            .find_first(ClaimType::AgentName)
            .and_then(|claim| claim.as_agent_name())
    }
}

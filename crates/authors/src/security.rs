//! Author permissions.

use quill_auth::{ClaimType, ClaimsIdentity, EDITORIAL_ROLES, Role, has_any_role, has_role};

/// Managing bylines is the chief's job.
#[derive(Debug, Clone, Copy, Default)]
pub struct EditAuthorsPermission;

impl EditAuthorsPermission {
    pub fn evaluate(&self, principal: &ClaimsIdentity) -> bool {
        has_role(principal, &Role::CHIEF)
    }
}

/// Listing authors is open to editorial staff working through the admin panel.
#[derive(Debug, Clone)]
pub struct ListAuthorsPermission {
    admin_panel_agent_name: String,
}

impl ListAuthorsPermission {
    pub fn new(admin_panel_agent_name: impl Into<String>) -> Self {
        Self {
            admin_panel_agent_name: admin_panel_agent_name.into(),
        }
    }

    pub fn evaluate(&self, principal: &ClaimsIdentity, agent: &ClaimsIdentity) -> bool {
        let from_admin_panel = agent
            .find_first(ClaimType::AgentName)
            .and_then(|c| c.as_agent_name())
            == Some(self.admin_panel_agent_name.as_str());

        from_admin_panel && has_any_role(principal, &EDITORIAL_ROLES)
    }
}

#[cfg(test)]
mod tests {
    use quill_auth::{Claim, ClaimValue};

    use super::*;

    fn principal(role: Role) -> ClaimsIdentity {
        ClaimsIdentity::new(vec![Claim::new("idp", ClaimValue::Role(role))])
    }

    fn agent(name: &str) -> ClaimsIdentity {
        ClaimsIdentity::new(vec![Claim::new("idp", ClaimValue::AgentName(name.into()))])
    }

    #[test]
    fn only_chiefs_edit_authors() {
        assert!(EditAuthorsPermission.evaluate(&principal(Role::CHIEF)));
        assert!(!EditAuthorsPermission.evaluate(&principal(Role::EDITOR)));
        assert!(!EditAuthorsPermission.evaluate(&ClaimsIdentity::empty()));
    }

    #[test]
    fn listing_needs_admin_panel_and_editorial_role() {
        let perm = ListAuthorsPermission::new("quill-admin");
        assert!(perm.evaluate(&principal(Role::JOURNALIST), &agent("quill-admin")));
        assert!(!perm.evaluate(&principal(Role::JOURNALIST), &agent("mobile-app")));
        assert!(!perm.evaluate(&principal(Role::PHOTOGRAPHER), &agent("quill-admin")));
        assert!(!perm.evaluate(&principal(Role::CHIEF), &ClaimsIdentity::empty()));
    }
}

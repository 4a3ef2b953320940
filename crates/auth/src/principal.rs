//! Questions asked about a principal's claims.

use thiserror::Error;

use quill_core::UserId;

use crate::claims::{ClaimType, ClaimsIdentity};
use crate::Role;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("principal has no user id claim")]
pub struct MissingUserIdClaim;

pub fn has_role(principal: &ClaimsIdentity, role: &Role) -> bool {
    principal.roles().any(|r| r == role)
}

pub fn has_any_role(principal: &ClaimsIdentity, roles: &[Role]) -> bool {
    principal.roles().any(|r| roles.contains(r))
}

pub fn has_all_roles(principal: &ClaimsIdentity, roles: &[Role]) -> bool {
    roles.iter().all(|role| has_role(principal, role))
}

/// User id of the principal, taken from its first `UserId` claim.
pub fn user_id(principal: &ClaimsIdentity) -> Result<UserId, MissingUserIdClaim> {
    principal
        .find_first(ClaimType::UserId)
        .and_then(|c| c.as_user_id())
        .ok_or(MissingUserIdClaim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::{Claim, ClaimValue};

    fn principal(roles: &[Role]) -> ClaimsIdentity {
        roles
            .iter()
            .cloned()
            .map(|r| Claim::new("idp", ClaimValue::Role(r)))
            .collect()
    }

    #[test]
    fn role_helpers() {
        let p = principal(&[Role::JOURNALIST, Role::PHOTOGRAPHER]);
        assert!(has_role(&p, &Role::JOURNALIST));
        assert!(!has_role(&p, &Role::CHIEF));
        assert!(has_any_role(&p, &[Role::CHIEF, Role::PHOTOGRAPHER]));
        assert!(!has_any_role(&p, &[]));
        assert!(has_all_roles(&p, &[Role::PHOTOGRAPHER, Role::JOURNALIST]));
        assert!(!has_all_roles(&p, &[Role::JOURNALIST, Role::EDITOR]));
    }

    #[test]
    fn user_id_requires_a_claim() {
        assert_eq!(user_id(&ClaimsIdentity::empty()), Err(MissingUserIdClaim));

        let id = UserId::new();
        let p = ClaimsIdentity::new(vec![
            Claim::new("idp", ClaimValue::Email("x@example.org".into())),
            Claim::new("idp", ClaimValue::UserId(id)),
        ]);
        assert_eq!(user_id(&p), Ok(id));
    }
}

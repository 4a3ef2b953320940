//! Claims and claim sets.
//!
//! A [`Claim`] is one fact about an identity together with the authority that
//! asserted it. A [`ClaimsIdentity`] is an ordered, immutable bag of claims;
//! the principal and the agent of a call are both claims identities.

use std::borrow::Cow;
use std::sync::Arc;

use quill_core::{UserId, ValueObject};

use crate::Role;

/// Issuer of claims synthesized by this process rather than read from a token.
pub const LOCAL_AUTHORITY: &str = "LOCAL AUTHORITY";

/// Payload-free tag of a claim, used for lookups.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ClaimType {
    UserId,
    Username,
    Email,
    FirstName,
    LastName,
    Role,
    AgentName,
    AgentPlatform,
}

impl ClaimType {
    pub fn as_str(self) -> &'static str {
        match self {
            ClaimType::UserId => "user_id",
            ClaimType::Username => "username",
            ClaimType::Email => "email",
            ClaimType::FirstName => "first_name",
            ClaimType::LastName => "last_name",
            ClaimType::Role => "role",
            ClaimType::AgentName => "agent_name",
            ClaimType::AgentPlatform => "agent_platform",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClaimValue {
    UserId(UserId),
    Username(String),
    Email(String),
    FirstName(String),
    LastName(String),
    Role(Role),
    AgentName(String),
    AgentPlatform(String),
}

impl ClaimValue {
    pub fn claim_type(&self) -> ClaimType {
        match self {
            ClaimValue::UserId(_) => ClaimType::UserId,
            ClaimValue::Username(_) => ClaimType::Username,
            ClaimValue::Email(_) => ClaimType::Email,
            ClaimValue::FirstName(_) => ClaimType::FirstName,
            ClaimValue::LastName(_) => ClaimType::LastName,
            ClaimValue::Role(_) => ClaimType::Role,
            ClaimValue::AgentName(_) => ClaimType::AgentName,
            ClaimValue::AgentPlatform(_) => ClaimType::AgentPlatform,
        }
    }

    /// The payload rendered as text, whatever the variant.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            ClaimValue::UserId(id) => Cow::Owned(id.to_string()),
            ClaimValue::Role(role) => Cow::Borrowed(role.as_str()),
            ClaimValue::Username(s)
            | ClaimValue::Email(s)
            | ClaimValue::FirstName(s)
            | ClaimValue::LastName(s)
            | ClaimValue::AgentName(s)
            | ClaimValue::AgentPlatform(s) => Cow::Borrowed(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Claim {
    issuer: String,
    value: ClaimValue,
}

impl ValueObject for Claim {}

impl Claim {
    pub fn new(issuer: impl Into<String>, value: ClaimValue) -> Self {
        Self {
            issuer: issuer.into(),
            value,
        }
    }

    /// A claim asserted by this process.
    pub fn local(value: ClaimValue) -> Self {
        Self::new(LOCAL_AUTHORITY, value)
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn value(&self) -> &ClaimValue {
        &self.value
    }

    pub fn claim_type(&self) -> ClaimType {
        self.value.claim_type()
    }

    pub fn as_user_id(&self) -> Option<UserId> {
        match &self.value {
            ClaimValue::UserId(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_role(&self) -> Option<&Role> {
        match &self.value {
            ClaimValue::Role(role) => Some(role),
            _ => None,
        }
    }

    pub fn as_agent_name(&self) -> Option<&str> {
        match &self.value {
            ClaimValue::AgentName(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_agent_platform(&self) -> Option<&str> {
        match &self.value {
            ClaimValue::AgentPlatform(name) => Some(name),
            _ => None,
        }
    }
}

/// Ordered claim set describing one identity.
///
/// Insertion order is preserved and duplicates are allowed. There is no way
/// to add or remove a claim once the identity exists; clones share storage.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClaimsIdentity {
    claims: Arc<[Claim]>,
}

impl ClaimsIdentity {
    pub fn new(claims: Vec<Claim>) -> Self {
        Self {
            claims: claims.into(),
        }
    }

    /// The identity with no claims at all.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    pub fn find_first(&self, claim_type: ClaimType) -> Option<&Claim> {
        self.claims.iter().find(|c| c.claim_type() == claim_type)
    }

    pub fn find_all(&self, claim_type: ClaimType) -> Vec<&Claim> {
        self.claims
            .iter()
            .filter(|c| c.claim_type() == claim_type)
            .collect()
    }

    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.claims.iter().filter_map(Claim::as_role)
    }
}

impl FromIterator<Claim> for ClaimsIdentity {
    fn from_iter<I: IntoIterator<Item = Claim>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Newsroom role carried by a `Role` claim.
///
/// The known roles are associated constants. Anything else the identity
/// provider grants is kept as an opaque value; it simply never matches a
/// permission check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const JOURNALIST: Role = Role(Cow::Borrowed("journalist"));
    pub const EDITOR: Role = Role(Cow::Borrowed("editor"));
    pub const CHIEF: Role = Role(Cow::Borrowed("chief"));
    pub const PHOTOGRAPHER: Role = Role(Cow::Borrowed("photographer"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is one of the four roles the newsroom defines.
    pub fn is_known(&self) -> bool {
        [Self::JOURNALIST, Self::EDITOR, Self::CHIEF, Self::PHOTOGRAPHER].contains(self)
    }
}

/// Roles allowed to work on article drafts and browse the newsroom catalogue.
pub const EDITORIAL_ROLES: [Role; 3] = [Role::JOURNALIST, Role::EDITOR, Role::CHIEF];

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

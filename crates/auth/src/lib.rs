//! `quill-auth`: claims, bearer token verification and authorization primitives.
//!
//! This crate is decoupled from HTTP and storage. Resource-specific permissions
//! live next to their resources (`quill-authors`, `quill-articles`).

pub mod authorize;
pub mod claims;
pub mod identity;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod token;

pub use authorize::{deny, overrides_apply, require};
pub use claims::{Claim, ClaimType, ClaimValue, ClaimsIdentity, LOCAL_AUTHORITY};
#[cfg(any(test, feature = "almighty-tests"))]
pub use identity::authenticate_tests;
pub use identity::{
    AGENT_NAME_LOCAL_CLI, AGENT_NAME_TESTS, AGENT_PLATFORM_LOCAL_CLI, AGENT_PLATFORM_TESTS,
    Authentication, HttpAuthenticator, IdentityBuilder, authenticate_cli,
};
pub use permissions::{AlmightyLocalCliPermission, AlmightyTestsPermission};
pub use principal::{MissingUserIdClaim, has_all_roles, has_any_role, has_role, user_id};
pub use roles::{EDITORIAL_ROLES, Role};
pub use token::{
    AuthenticationError, InvalidVerifierKey, JwtAuthenticationOptions, ResourceAccess,
    TokenPayload, TokenVerifier,
};

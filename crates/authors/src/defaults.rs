//! Default author per user.
//!
//! When a user starts a new draft, the draft's byline is pre-set to that
//! user's default author, if one is configured.

use async_trait::async_trait;
use serde::Serialize;

use quill_core::{AuthorId, StoreError, UserId};

/// Default-author mapping access inside a transaction.
///
/// Reads lock the mapping row like [`quill_core::Repository::get`] does.
#[async_trait]
pub trait DefaultAuthors: Send {
    async fn default_author(&mut self, user_id: UserId) -> Result<Option<AuthorId>, StoreError>;

    /// Insert or replace the mapping for `user_id`.
    async fn set_default_author(&mut self, user_id: UserId, author_id: AuthorId) -> Result<(), StoreError>;

    /// Remove the mapping for `user_id`. Removing a missing mapping is not an error.
    async fn reset_default_author(&mut self, user_id: UserId) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct DefaultAuthorMapping {
    pub user_id: UserId,
    pub author_id: AuthorId,
}

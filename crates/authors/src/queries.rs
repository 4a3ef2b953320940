//! Read side for authors. No locks are taken.

use async_trait::async_trait;
use serde::Serialize;

use quill_auth::{ClaimsIdentity, overrides_apply, require};
use quill_core::{AuthorId, CommandError, NotFoundError, StoreError, UserId};

use crate::author::Author;
use crate::defaults::DefaultAuthorMapping;
use crate::security::{EditAuthorsPermission, ListAuthorsPermission};

/// An author with the figures the admin panel shows next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorListing {
    pub author: Author,
    pub default_for_users: Vec<UserId>,
    pub count_of_articles: u64,
    pub count_of_article_drafts_in_work: u64,
}

#[async_trait]
pub trait AuthorCatalog: Send + Sync {
    /// Every author, ordered by name.
    async fn list_authors(&self) -> Result<Vec<AuthorListing>, StoreError>;

    async fn find_author(&self, id: AuthorId) -> Result<Option<Author>, StoreError>;

    async fn list_default_authors(&self) -> Result<Vec<DefaultAuthorMapping>, StoreError>;
}

pub struct ListAuthorsQuery<C> {
    catalog: C,
    permission: ListAuthorsPermission,
}

impl<C: AuthorCatalog> ListAuthorsQuery<C> {
    pub fn new(catalog: C, permission: ListAuthorsPermission) -> Self {
        Self { catalog, permission }
    }

    pub async fn execute(
        &self,
        principal: &ClaimsIdentity,
        agent: &ClaimsIdentity,
    ) -> Result<Vec<AuthorListing>, CommandError> {
        if !overrides_apply(agent) {
            require(self.permission.evaluate(principal, agent), "authors.list")?;
        }
        Ok(self.catalog.list_authors().await?)
    }
}

pub struct GetAuthorQuery<C> {
    catalog: C,
}

impl<C: AuthorCatalog> GetAuthorQuery<C> {
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    pub async fn execute(
        &self,
        author_id: AuthorId,
        principal: &ClaimsIdentity,
        agent: &ClaimsIdentity,
    ) -> Result<Author, CommandError> {
        if !overrides_apply(agent) {
            require(EditAuthorsPermission.evaluate(principal), "authors.get")?;
        }
        self.catalog
            .find_author(author_id)
            .await?
            .ok_or_else(|| NotFoundError::new("Author", author_id).into())
    }
}

pub struct ListDefaultAuthorsQuery<C> {
    catalog: C,
}

impl<C: AuthorCatalog> ListDefaultAuthorsQuery<C> {
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    pub async fn execute(
        &self,
        principal: &ClaimsIdentity,
        agent: &ClaimsIdentity,
    ) -> Result<Vec<DefaultAuthorMapping>, CommandError> {
        if !overrides_apply(agent) {
            require(EditAuthorsPermission.evaluate(principal), "authors.list_defaults")?;
        }
        Ok(self.catalog.list_default_authors().await?)
    }
}

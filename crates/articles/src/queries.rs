//! Read side for drafts and articles. No locks are taken.

use async_trait::async_trait;
use serde::Serialize;

use quill_auth::{ClaimsIdentity, overrides_apply, require};
use quill_core::{ArticleDraftId, ArticleId, AuthorId, CommandError, NotFoundError, StoreError};

use crate::article::Article;
use crate::draft::ArticleDraft;
use crate::security::{EditArticleDraftPermission, ListArticleDraftsPermission};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorSummary {
    pub id: AuthorId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleDraftListing {
    pub draft: ArticleDraft,
    /// `None` when no author is set, or the author has since been deleted.
    pub author: Option<AuthorSummary>,
}

#[async_trait]
pub trait ArticleCatalog: Send + Sync {
    async fn list_article_drafts(&self) -> Result<Vec<ArticleDraftListing>, StoreError>;

    async fn find_article_draft(&self, id: ArticleDraftId) -> Result<Option<ArticleDraft>, StoreError>;

    async fn find_article(&self, id: ArticleId) -> Result<Option<Article>, StoreError>;
}

pub struct ListArticleDraftsQuery<C> {
    catalog: C,
}

impl<C: ArticleCatalog> ListArticleDraftsQuery<C> {
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    pub async fn execute(
        &self,
        principal: &ClaimsIdentity,
        agent: &ClaimsIdentity,
    ) -> Result<Vec<ArticleDraftListing>, CommandError> {
        if !overrides_apply(agent) {
            require(ListArticleDraftsPermission.evaluate(principal), "article_drafts.list")?;
        }
        Ok(self.catalog.list_article_drafts().await?)
    }
}

/// A single draft, visible to whoever may edit it.
pub struct GetArticleDraftQuery<C> {
    catalog: C,
}

impl<C: ArticleCatalog> GetArticleDraftQuery<C> {
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    pub async fn execute(
        &self,
        draft_id: ArticleDraftId,
        principal: &ClaimsIdentity,
        agent: &ClaimsIdentity,
    ) -> Result<ArticleDraft, CommandError> {
        let draft = self
            .catalog
            .find_article_draft(draft_id)
            .await?
            .ok_or_else(|| NotFoundError::new("ArticleDraft", draft_id))?;
        if !overrides_apply(agent) {
            require(EditArticleDraftPermission.evaluate(principal, &draft), "article_drafts.get")?;
        }
        Ok(draft)
    }
}

/// A published article. Open to any authenticated caller.
pub struct GetArticleQuery<C> {
    catalog: C,
}

impl<C: ArticleCatalog> GetArticleQuery<C> {
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    pub async fn execute(&self, article_id: ArticleId) -> Result<Article, CommandError> {
        self.catalog
            .find_article(article_id)
            .await?
            .ok_or_else(|| NotFoundError::new("Article", article_id).into())
    }
}

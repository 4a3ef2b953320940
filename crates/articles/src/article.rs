use serde::{Deserialize, Serialize};

use quill_core::{ArticleId, AuthorId, Entity};

use crate::draft::ValidDraft;

/// Published content. Only a disproof can be attached afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    id: ArticleId,
    author_id: AuthorId,
    headline: String,
    content: String,
    slug: String,
    disproof: Option<String>,
}

impl Entity for Article {
    const NAME: &'static str = "Article";
    type Id = ArticleId;

    fn id(&self) -> &ArticleId {
        &self.id
    }
}

impl Article {
    pub fn publish(id: ArticleId, draft: ValidDraft<'_>) -> Self {
        Self {
            id,
            author_id: draft.author_id(),
            headline: draft.headline().to_string(),
            content: draft.content().to_string(),
            slug: draft.slug().to_string(),
            disproof: None,
        }
    }

    /// Rebuild from storage. No validation.
    pub fn restore(
        id: ArticleId,
        author_id: AuthorId,
        headline: String,
        content: String,
        slug: String,
        disproof: Option<String>,
    ) -> Self {
        Self {
            id,
            author_id,
            headline,
            content,
            slug,
            disproof,
        }
    }

    pub fn author_id(&self) -> AuthorId {
        self.author_id
    }

    pub fn headline(&self) -> &str {
        &self.headline
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn disproof(&self) -> Option<&str> {
        self.disproof.as_deref()
    }

    pub fn disprove(&mut self, disproof: impl Into<String>) {
        self.disproof = Some(disproof.into());
    }
}

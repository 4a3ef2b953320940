//! Article drafts: work in progress, edited by a list of users.

use serde::{Deserialize, Serialize};

use quill_core::{ArticleDraftId, AuthorId, DomainError, Entity, UserId, ValidationFailure};

use crate::slug::{MAX_SLUG_LEN, is_valid_slug, slugify};

/// Longest headline the `articles.headline` column holds.
pub const MAX_HEADLINE_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleDraft {
    id: ArticleDraftId,
    is_published: bool,
    author_id: Option<AuthorId>,
    headline: String,
    content: String,
    slug: String,
    auto_slug: bool,
    editors: Vec<UserId>,
}

impl Entity for ArticleDraft {
    const NAME: &'static str = "ArticleDraft";
    type Id = ArticleDraftId;

    fn id(&self) -> &ArticleDraftId {
        &self.id
    }
}

/// Persisted state of a draft, for stores rebuilding one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleDraftRecord {
    pub id: ArticleDraftId,
    pub is_published: bool,
    pub author_id: Option<AuthorId>,
    pub headline: String,
    pub content: String,
    pub slug: String,
    pub auto_slug: bool,
    pub editors: Vec<UserId>,
}

impl From<ArticleDraftRecord> for ArticleDraft {
    fn from(r: ArticleDraftRecord) -> Self {
        Self {
            id: r.id,
            is_published: r.is_published,
            author_id: r.author_id,
            headline: r.headline,
            content: r.content,
            slug: r.slug,
            auto_slug: r.auto_slug,
            editors: r.editors,
        }
    }
}

impl ArticleDraft {
    /// An empty draft whose slug follows the headline, with `created_by` as its only editor.
    pub fn create_from_scratch(id: ArticleDraftId, author_id: Option<AuthorId>, created_by: UserId) -> Self {
        Self {
            id,
            is_published: false,
            author_id,
            headline: String::new(),
            content: String::new(),
            slug: String::new(),
            auto_slug: true,
            editors: vec![created_by],
        }
    }

    pub fn is_published(&self) -> bool {
        self.is_published
    }

    pub fn author_id(&self) -> Option<AuthorId> {
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

    pub fn auto_slug(&self) -> bool {
        self.auto_slug
    }

    pub fn editors(&self) -> &[UserId] {
        &self.editors
    }

    pub fn is_editor(&self, user_id: UserId) -> bool {
        self.editors.contains(&user_id)
    }

    pub fn add_editor(&mut self, user_id: UserId) {
        if !self.is_editor(user_id) {
            self.editors.push(user_id);
        }
    }

    pub fn set_author(&mut self, author_id: Option<AuthorId>) {
        self.author_id = author_id;
    }

    pub fn set_headline(&mut self, headline: impl Into<String>) {
        self.headline = headline.into();
        if self.auto_slug {
            self.slug = derive_slug(&self.headline);
        }
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    /// Set the slug by hand. Refused while the slug follows the headline.
    pub fn set_slug(&mut self, slug: impl Into<String>) -> Result<(), DomainError> {
        if self.auto_slug {
            return Err(DomainError::invariant("slug is derived from the headline; disable auto slug first"));
        }
        self.slug = slug.into();
        Ok(())
    }

    pub fn enable_auto_slug(&mut self) {
        self.auto_slug = true;
        self.slug = derive_slug(&self.headline);
    }

    pub fn disable_auto_slug(&mut self) {
        self.auto_slug = false;
    }

    /// Check the draft is complete enough to publish, reporting every problem.
    pub fn validate(&self) -> Result<ValidDraft<'_>, ValidationFailure> {
        let mut problems = Vec::new();
        if self.author_id.is_none() {
            problems.push("no author is set".to_string());
        }
        let headline = self.headline.trim();
        if headline.is_empty() {
            problems.push("no headline".to_string());
        } else if headline.chars().count() > MAX_HEADLINE_LEN {
            problems.push("headline is too long".to_string());
        }
        if self.content.trim().is_empty() {
            problems.push("no content".to_string());
        }
        let slug = self.slug.trim();
        if !is_valid_slug(slug) {
            problems.push("invalid slug".to_string());
        } else if slug.len() > MAX_SLUG_LEN {
            problems.push("slug is too long".to_string());
        }

        match self.author_id {
            Some(author_id) if problems.is_empty() => Ok(ValidDraft {
                draft: self,
                author_id,
            }),
            _ => Err(ValidationFailure::new(problems)),
        }
    }

    pub fn mark_published(&mut self) -> Result<(), DomainError> {
        if self.is_published {
            return Err(DomainError::invariant("draft is already published"));
        }
        self.is_published = true;
        Ok(())
    }
}

fn derive_slug(headline: &str) -> String {
    let mut slug = slugify(headline.trim());
    slug.truncate(MAX_SLUG_LEN);
    slug.trim_end_matches('-').to_string()
}

/// A draft that passed [`ArticleDraft::validate`].
#[derive(Debug, Clone, Copy)]
pub struct ValidDraft<'a> {
    draft: &'a ArticleDraft,
    author_id: AuthorId,
}

impl<'a> ValidDraft<'a> {
    pub fn author_id(&self) -> AuthorId {
        self.author_id
    }

    pub fn headline(&self) -> &'a str {
        self.draft.headline.trim()
    }

    pub fn content(&self) -> &'a str {
        self.draft.content.trim()
    }

    pub fn slug(&self) -> &'a str {
        self.draft.slug.trim()
    }
}

use serde::{Deserialize, Serialize};

use quill_articles::Article;
use quill_authors::Author;
use quill_core::{ArticleId, AuthorId, Entity};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateAuthorRequest {
    pub name: String,
    #[serde(default = "real_person")]
    pub is_real_person: bool,
}

fn real_person() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct UpdateAuthorRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SetDefaultAuthorRequest {
    pub author_id: AuthorId,
}

#[derive(Debug, Deserialize)]
pub struct UpdateHeadlineRequest {
    pub headline: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateContentRequest {
    pub content: String,
}

/// `{"slug": "..."}` pins the slug, `{"slug": null}` lets it follow the headline.
#[derive(Debug, Deserialize)]
pub struct UpdateSlugRequest {
    pub slug: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

/// What the public API shows of an author.
#[derive(Debug, Serialize)]
pub struct PublicAuthor {
    pub id: AuthorId,
    pub name: String,
}

impl From<&Author> for PublicAuthor {
    fn from(author: &Author) -> Self {
        Self {
            id: *author.id(),
            name: author.name().to_string(),
        }
    }
}

/// What the public API shows of an article.
#[derive(Debug, Serialize)]
pub struct PublicArticle<'a> {
    pub id: ArticleId,
    pub author_id: AuthorId,
    pub headline: &'a str,
    pub content: &'a str,
    pub slug: &'a str,
    pub disproof: Option<&'a str>,
}

impl<'a> From<&'a Article> for PublicArticle<'a> {
    fn from(article: &'a Article) -> Self {
        Self {
            id: *article.id(),
            author_id: article.author_id(),
            headline: article.headline(),
            content: article.content(),
            slug: article.slug(),
            disproof: article.disproof(),
        }
    }
}

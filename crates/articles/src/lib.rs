//! `quill-articles`: drafts, publishing, and published articles.

pub mod article;
pub mod commands;
pub mod draft;
pub mod queries;
pub mod security;
pub mod slug;

pub use article::Article;
pub use commands::{
    CreateArticleDraftCommand, PublishArticleCommand, UpdateArticleDraftContentCommand,
    UpdateArticleDraftHeadlineCommand, UpdateArticleDraftSlugCommand,
};
pub use draft::{ArticleDraft, ArticleDraftRecord, ValidDraft};
pub use queries::{
    ArticleCatalog, ArticleDraftListing, AuthorSummary, GetArticleDraftQuery, GetArticleQuery,
    ListArticleDraftsQuery,
};
pub use security::{
    CreateArticleDraftPermission, EditArticleDraftPermission, ListArticleDraftsPermission,
    PublishArticlePermission,
};
pub use slug::{is_valid_slug, slugify};

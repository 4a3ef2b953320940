//! `quill-authors`: bylines and the default byline of each user.

pub mod author;
pub mod commands;
pub mod defaults;
pub mod queries;
pub mod security;

pub use author::Author;
pub use commands::{
    CreateAuthorCommand, DeleteAuthorCommand, ResetDefaultAuthorCommand, SetDefaultAuthorCommand,
    UpdateAuthorCommand,
};
pub use defaults::{DefaultAuthorMapping, DefaultAuthors};
pub use queries::{
    AuthorCatalog, AuthorListing, GetAuthorQuery, ListAuthorsQuery, ListDefaultAuthorsQuery,
};
pub use security::{EditAuthorsPermission, ListAuthorsPermission};

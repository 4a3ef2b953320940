//! `quill-core`: newsroom domain foundation.
//!
//! Identifiers, the error taxonomy shared by every command, and the
//! store/transaction/repository contracts. No infrastructure concerns.

pub mod entity;
pub mod error;
pub mod id;
pub mod store;
pub mod value_object;

pub use entity::Entity;
pub use error::{
    AuthorizationError, CommandError, DomainError, DomainResult, NotFoundError, ValidationFailure,
};
pub use id::{ArticleDraftId, ArticleId, AuthorId, UserId};
pub use store::{Repository, Store, StoreError, Transaction, finish};
pub use value_object::ValueObject;

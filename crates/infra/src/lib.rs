//! Infrastructure layer: configuration and the store implementations.

pub mod config;
pub mod memory;
pub mod postgres;

pub use config::{ApiConfig, Config, ConfigError, DbConfig, InternalApiConfig};
pub use memory::{InMemoryStore, InMemoryTx};
pub use postgres::{PostgresStore, PostgresTx};

use quill_articles::{Article, ArticleCatalog, ArticleDraft};
use quill_authors::{Author, AuthorCatalog, DefaultAuthors};
use quill_core::{Repository, Store, Transaction};

/// Everything a command transaction needs to be able to do.
pub trait NewsroomTx:
    Transaction + Repository<Author> + Repository<ArticleDraft> + Repository<Article> + DefaultAuthors
{
}

impl<T> NewsroomTx for T where
    T: Transaction + Repository<Author> + Repository<ArticleDraft> + Repository<Article> + DefaultAuthors
{
}

/// A store that can back both APIs and the CLI.
pub trait NewsroomStore:
    Store<Tx: NewsroomTx> + AuthorCatalog + ArticleCatalog + Clone + 'static
{
}

impl<S> NewsroomStore for S
where
    S: Store + AuthorCatalog + ArticleCatalog + Clone + 'static,
    S::Tx: NewsroomTx,
{
}

//! In-memory store for tests and local development.
//!
//! Every row has its own async mutex. A transaction acquires the mutex the
//! first time it touches a row and keeps it until commit or drop, so it
//! behaves like `SELECT ... FOR UPDATE`. Writes are buffered per transaction
//! and applied atomically on commit.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex as RowLock, OwnedMutexGuard};
use tracing::{debug, warn};

use quill_articles::{Article, ArticleCatalog, ArticleDraft, ArticleDraftListing, AuthorSummary};
use quill_authors::{Author, AuthorCatalog, AuthorListing, DefaultAuthorMapping, DefaultAuthors};
use quill_core::{
    ArticleDraftId, ArticleId, AuthorId, Entity, Repository, Store, StoreError, Transaction,
    UserId,
};

mod sealed {
    use std::fmt;

    use quill_articles::{Article, ArticleDraft};
    use quill_authors::Author;
    use quill_core::{ArticleDraftId, ArticleId, AuthorId, UserId};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum RowKey {
        Author(AuthorId),
        ArticleDraft(ArticleDraftId),
        Article(ArticleId),
        DefaultAuthor(UserId),
    }

    impl fmt::Display for RowKey {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::Author(id) => write!(f, "Author({id})"),
                Self::ArticleDraft(id) => write!(f, "ArticleDraft({id})"),
                Self::Article(id) => write!(f, "Article({id})"),
                Self::DefaultAuthor(id) => write!(f, "DefaultAuthor({id})"),
            }
        }
    }

    #[derive(Debug, Clone)]
    pub enum Row {
        Author(Author),
        ArticleDraft(ArticleDraft),
        Article(Article),
        DefaultAuthor(AuthorId),
    }

    /// Entities the in-memory store can hold.
    pub trait Stored: quill_core::Entity {
        fn key(id: &Self::Id) -> RowKey;
        fn into_row(self) -> Row;
        fn from_row(row: Row) -> Option<Self>;
    }
}

use sealed::{Row, RowKey, Stored};

impl Stored for Author {
    fn key(id: &AuthorId) -> RowKey {
        RowKey::Author(*id)
    }

    fn into_row(self) -> Row {
        Row::Author(self)
    }

    fn from_row(row: Row) -> Option<Self> {
        match row {
            Row::Author(author) => Some(author),
            _ => None,
        }
    }
}

impl Stored for ArticleDraft {
    fn key(id: &ArticleDraftId) -> RowKey {
        RowKey::ArticleDraft(*id)
    }

    fn into_row(self) -> Row {
        Row::ArticleDraft(self)
    }

    fn from_row(row: Row) -> Option<Self> {
        match row {
            Row::ArticleDraft(draft) => Some(draft),
            _ => None,
        }
    }
}

impl Stored for Article {
    fn key(id: &ArticleId) -> RowKey {
        RowKey::Article(*id)
    }

    fn into_row(self) -> Row {
        Row::Article(self)
    }

    fn from_row(row: Row) -> Option<Self> {
        match row {
            Row::Article(article) => Some(article),
            _ => None,
        }
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::backend("in-memory store lock poisoned")
}

#[derive(Default)]
struct Shared {
    rows: RwLock<HashMap<RowKey, Row>>,
    row_locks: Mutex<HashMap<RowKey, Arc<RowLock<()>>>>,
}

impl Shared {
    fn row_lock(&self, key: RowKey) -> Result<Arc<RowLock<()>>, StoreError> {
        let mut locks = self.row_locks.lock().map_err(poisoned)?;
        Ok(locks.entry(key).or_default().clone())
    }

    fn read<T>(&self, f: impl FnOnce(&HashMap<RowKey, Row>) -> T) -> Result<T, StoreError> {
        let rows = self.rows.read().map_err(poisoned)?;
        Ok(f(&rows))
    }
}

/// Process-local store. Clones share the same data.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    shared: Arc<Shared>,
    lock_timeout: Option<Duration>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail row-lock waits that take longer than `timeout` with [`StoreError::LockTimeout`].
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl Store for InMemoryStore {
    type Tx = InMemoryTx;

    async fn begin(&self) -> Result<InMemoryTx, StoreError> {
        Ok(InMemoryTx {
            shared: self.shared.clone(),
            lock_timeout: self.lock_timeout,
            held: HashMap::new(),
            pending: HashMap::new(),
        })
    }
}

pub struct InMemoryTx {
    shared: Arc<Shared>,
    lock_timeout: Option<Duration>,
    held: HashMap<RowKey, OwnedMutexGuard<()>>,
    /// Buffered writes; `None` deletes the row.
    pending: HashMap<RowKey, Option<Row>>,
}

impl InMemoryTx {
    async fn lock(&mut self, key: RowKey) -> Result<(), StoreError> {
        if self.held.contains_key(&key) {
            return Ok(());
        }
        let lock = self.shared.row_lock(key)?;
        let guard = match self.lock_timeout {
            Some(timeout) => tokio::time::timeout(timeout, lock.lock_owned())
                .await
                .map_err(|_| StoreError::LockTimeout(key.to_string()))?,
            None => lock.lock_owned().await,
        };
        debug!(row = %key, "row locked");
        self.held.insert(key, guard);
        Ok(())
    }

    async fn load(&mut self, key: RowKey) -> Result<Option<Row>, StoreError> {
        self.lock(key).await?;
        if let Some(pending) = self.pending.get(&key) {
            return Ok(pending.clone());
        }
        self.shared.read(|rows| rows.get(&key).cloned())
    }

    async fn stage(&mut self, key: RowKey, row: Option<Row>) -> Result<(), StoreError> {
        self.lock(key).await?;
        self.pending.insert(key, row);
        Ok(())
    }

    /// Default-author mappings that point at `author_id`, committed or buffered.
    fn mappings_to(&self, author_id: AuthorId) -> Result<Vec<RowKey>, StoreError> {
        let mut keys = self.shared.read(|rows| {
            rows.iter()
                .filter(|(_, row)| matches!(row, Row::DefaultAuthor(a) if *a == author_id))
                .map(|(key, _)| *key)
                .collect::<Vec<_>>()
        })?;
        keys.extend(
            self.pending
                .iter()
                .filter(|(_, row)| matches!(row, Some(Row::DefaultAuthor(a)) if *a == author_id))
                .map(|(key, _)| *key),
        );
        Ok(keys)
    }
}

#[async_trait]
impl Transaction for InMemoryTx {
    async fn commit(self) -> Result<(), StoreError> {
        let mut rows = self.shared.rows.write().map_err(poisoned)?;
        for (key, row) in self.pending {
            match row {
                Some(row) => {
                    rows.insert(key, row);
                }
                None => {
                    rows.remove(&key);
                }
            }
        }
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        if !self.pending.is_empty() {
            debug!(writes = self.pending.len(), "discarding buffered writes");
        }
        Ok(())
    }
}

#[async_trait]
impl<E: Stored> Repository<E> for InMemoryTx {
    async fn get(&mut self, id: &E::Id) -> Result<E, StoreError> {
        self.load(E::key(id))
            .await?
            .and_then(E::from_row)
            .ok_or_else(|| StoreError::not_found::<E>(id))
    }

    async fn save(&mut self, entity: &E) -> Result<(), StoreError> {
        self.stage(E::key(entity.id()), Some(entity.clone().into_row())).await
    }

    async fn delete(&mut self, id: &E::Id) -> Result<(), StoreError> {
        let key = E::key(id);
        if let RowKey::Author(author_id) = key {
            for mapping in self.mappings_to(author_id)? {
                // The candidate list predates the row lock; only drop rows still pointing here.
                match self.load(mapping).await? {
                    Some(Row::DefaultAuthor(current)) if current == author_id => {
                        warn!(row = %mapping, "removing default author mapping of deleted author");
                        self.pending.insert(mapping, None);
                    }
                    _ => debug!(row = %mapping, "default author mapping moved on, kept"),
                }
            }
        }
        self.stage(key, None).await
    }
}

#[async_trait]
impl DefaultAuthors for InMemoryTx {
    async fn default_author(&mut self, user_id: UserId) -> Result<Option<AuthorId>, StoreError> {
        Ok(match self.load(RowKey::DefaultAuthor(user_id)).await? {
            Some(Row::DefaultAuthor(author_id)) => Some(author_id),
            _ => None,
        })
    }

    async fn set_default_author(&mut self, user_id: UserId, author_id: AuthorId) -> Result<(), StoreError> {
        self.stage(RowKey::DefaultAuthor(user_id), Some(Row::DefaultAuthor(author_id)))
            .await
    }

    async fn reset_default_author(&mut self, user_id: UserId) -> Result<(), StoreError> {
        self.stage(RowKey::DefaultAuthor(user_id), None).await
    }
}

#[async_trait]
impl AuthorCatalog for InMemoryStore {
    async fn list_authors(&self) -> Result<Vec<AuthorListing>, StoreError> {
        self.shared.read(|rows| {
            let mut listings: Vec<AuthorListing> = rows
                .values()
                .filter_map(|row| match row {
                    Row::Author(author) => Some(author.clone()),
                    _ => None,
                })
                .map(|author| listing(rows, author))
                .collect();
            listings.sort_by(|a, b| {
                a.author
                    .name()
                    .cmp(b.author.name())
                    .then_with(|| a.author.id().cmp(b.author.id()))
            });
            listings
        })
    }

    async fn find_author(&self, id: AuthorId) -> Result<Option<Author>, StoreError> {
        self.shared.read(|rows| match rows.get(&RowKey::Author(id)) {
            Some(Row::Author(author)) => Some(author.clone()),
            _ => None,
        })
    }

    async fn list_default_authors(&self) -> Result<Vec<DefaultAuthorMapping>, StoreError> {
        self.shared.read(|rows| {
            let mut mappings: Vec<DefaultAuthorMapping> = rows
                .iter()
                .filter_map(|(key, row)| match (key, row) {
                    (RowKey::DefaultAuthor(user_id), Row::DefaultAuthor(author_id)) => {
                        Some(DefaultAuthorMapping {
                            user_id: *user_id,
                            author_id: *author_id,
                        })
                    }
                    _ => None,
                })
                .collect();
            mappings.sort();
            mappings
        })
    }
}

fn listing(rows: &HashMap<RowKey, Row>, author: Author) -> AuthorListing {
    let id = *author.id();
    let mut default_for_users = Vec::new();
    let mut count_of_articles = 0;
    let mut count_of_article_drafts_in_work = 0;
    for (key, row) in rows {
        match (key, row) {
            (RowKey::DefaultAuthor(user_id), Row::DefaultAuthor(a)) if *a == id => {
                default_for_users.push(*user_id)
            }
            (_, Row::Article(article)) if article.author_id() == id => count_of_articles += 1,
            (_, Row::ArticleDraft(draft))
                if draft.author_id() == Some(id) && !draft.is_published() =>
            {
                count_of_article_drafts_in_work += 1
            }
            _ => {}
        }
    }
    default_for_users.sort();
    AuthorListing {
        author,
        default_for_users,
        count_of_articles,
        count_of_article_drafts_in_work,
    }
}

#[async_trait]
impl ArticleCatalog for InMemoryStore {
    async fn list_article_drafts(&self) -> Result<Vec<ArticleDraftListing>, StoreError> {
        self.shared.read(|rows| {
            let mut drafts: Vec<&ArticleDraft> = rows
                .values()
                .filter_map(|row| match row {
                    Row::ArticleDraft(draft) => Some(draft),
                    _ => None,
                })
                .collect();
            drafts.sort_by_key(|draft| *draft.id());
            drafts
                .into_iter()
                .map(|draft| ArticleDraftListing {
                    draft: draft.clone(),
                    author: draft.author_id().and_then(|author_id| {
                        match rows.get(&RowKey::Author(author_id)) {
                            Some(Row::Author(author)) => Some(AuthorSummary {
                                id: author_id,
                                name: author.name().to_string(),
                            }),
                            _ => None,
                        }
                    }),
                })
                .collect()
        })
    }

    async fn find_article_draft(&self, id: ArticleDraftId) -> Result<Option<ArticleDraft>, StoreError> {
        self.shared.read(|rows| match rows.get(&RowKey::ArticleDraft(id)) {
            Some(Row::ArticleDraft(draft)) => Some(draft.clone()),
            _ => None,
        })
    }

    async fn find_article(&self, id: ArticleId) -> Result<Option<Article>, StoreError> {
        self.shared.read(|rows| match rows.get(&RowKey::Article(id)) {
            Some(Row::Article(article)) => Some(article.clone()),
            _ => None,
        })
    }
}

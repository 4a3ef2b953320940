//! Postgres-backed store.
//!
//! Every command runs in one database transaction. `get` reads with
//! `SELECT ... FOR UPDATE`, so the row stays locked until the transaction
//! commits or rolls back. `db.lock_timeout_ms` maps to Postgres'
//! `lock_timeout` for the transaction.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row};
use tracing::{info, instrument};
use uuid::Uuid;

use quill_articles::{
    Article, ArticleCatalog, ArticleDraft, ArticleDraftListing, ArticleDraftRecord, AuthorSummary,
};
use quill_authors::{Author, AuthorCatalog, AuthorListing, DefaultAuthorMapping, DefaultAuthors};
use quill_core::{
    ArticleDraftId, ArticleId, AuthorId, Entity, Repository, Store, StoreError, Transaction,
    UserId,
};

use crate::config::DbConfig;

const SCHEMA: &str = include_str!("../migrations/0001_init.sql");

/// Postgres SQLSTATE for `lock_not_available`, raised when `lock_timeout` expires.
const LOCK_NOT_AVAILABLE: &str = "55P03";

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
    lock_timeout: Option<Duration>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            lock_timeout: None,
        }
    }

    pub async fn connect(config: &DbConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self {
            pool,
            lock_timeout: config.lock_timeout_ms.map(Duration::from_millis),
        })
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    /// Create the schema if it does not exist yet.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        info!("database schema is up to date");
        Ok(())
    }
}

#[async_trait]
impl Store for PostgresStore {
    type Tx = PostgresTx;

    async fn begin(&self) -> Result<PostgresTx, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", e))?;
        if let Some(timeout) = self.lock_timeout {
            let statement = format!("SET LOCAL lock_timeout = '{}ms'", timeout.as_millis());
            sqlx::query(&statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("set_lock_timeout", e))?;
        }
        Ok(PostgresTx { tx })
    }
}

pub struct PostgresTx {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl Transaction for PostgresTx {
    async fn commit(self) -> Result<(), StoreError> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| map_sqlx_error("rollback", e))
    }
}

fn author_from_row(row: &PgRow) -> Result<Author, StoreError> {
    let read = |e| map_sqlx_error("read_author", e);
    Ok(Author::restore(
        AuthorId::from_uuid(row.try_get::<Uuid, _>("id").map_err(read)?),
        row.try_get("name").map_err(read)?,
        row.try_get("is_real_person").map_err(read)?,
    ))
}

fn article_from_row(row: &PgRow) -> Result<Article, StoreError> {
    let read = |e| map_sqlx_error("read_article", e);
    Ok(Article::restore(
        ArticleId::from_uuid(row.try_get::<Uuid, _>("id").map_err(read)?),
        AuthorId::from_uuid(row.try_get::<Uuid, _>("author_id").map_err(read)?),
        row.try_get("headline").map_err(read)?,
        row.try_get("content").map_err(read)?,
        row.try_get("slug").map_err(read)?,
        row.try_get("disproof").map_err(read)?,
    ))
}

fn draft_from_row(row: &PgRow, editors: Vec<UserId>) -> Result<ArticleDraft, StoreError> {
    let read = |e| map_sqlx_error("read_article_draft", e);
    Ok(ArticleDraftRecord {
        id: ArticleDraftId::from_uuid(row.try_get::<Uuid, _>("id").map_err(read)?),
        is_published: row.try_get("is_published").map_err(read)?,
        author_id: row
            .try_get::<Option<Uuid>, _>("author_id")
            .map_err(read)?
            .map(AuthorId::from_uuid),
        headline: row.try_get("headline").map_err(read)?,
        content: row.try_get("content").map_err(read)?,
        slug: row.try_get("slug").map_err(read)?,
        auto_slug: row.try_get("auto_slug").map_err(read)?,
        editors,
    }
    .into())
}

#[async_trait]
impl Repository<Author> for PostgresTx {
    #[instrument(skip(self), fields(author_id = %id), err)]
    async fn get(&mut self, id: &AuthorId) -> Result<Author, StoreError> {
        let row = sqlx::query("SELECT id, name, is_real_person FROM authors WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("get_author", e))?
            .ok_or_else(|| StoreError::not_found::<Author>(id))?;
        author_from_row(&row)
    }

    #[instrument(skip(self, author), fields(author_id = %author.id()), err)]
    async fn save(&mut self, author: &Author) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO authors (id, name, is_real_person)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
               SET name = EXCLUDED.name,
                   is_real_person = EXCLUDED.is_real_person
            "#,
        )
        .bind(author.id().as_uuid())
        .bind(author.name())
        .bind(author.is_real_person())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("save_author", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(author_id = %id), err)]
    async fn delete(&mut self, id: &AuthorId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM default_author WHERE author_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_author_mappings", e))?;
        sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_author", e))?;
        Ok(())
    }
}

#[async_trait]
impl Repository<ArticleDraft> for PostgresTx {
    #[instrument(skip(self), fields(draft_id = %id), err)]
    async fn get(&mut self, id: &ArticleDraftId) -> Result<ArticleDraft, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, is_published, author_id, headline, content, slug, auto_slug
              FROM article_drafts
             WHERE id = $1
               FOR UPDATE
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("get_article_draft", e))?
        .ok_or_else(|| StoreError::not_found::<ArticleDraft>(id))?;

        let editors: Vec<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM article_draft_editors WHERE article_draft_id = $1 ORDER BY position",
        )
        .bind(id.as_uuid())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("get_article_draft_editors", e))?;

        draft_from_row(&row, editors.into_iter().map(UserId::from_uuid).collect())
    }

    #[instrument(skip(self, draft), fields(draft_id = %draft.id()), err)]
    async fn save(&mut self, draft: &ArticleDraft) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO article_drafts (id, is_published, author_id, headline, content, slug, auto_slug)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE
               SET is_published = EXCLUDED.is_published,
                   author_id = EXCLUDED.author_id,
                   headline = EXCLUDED.headline,
                   content = EXCLUDED.content,
                   slug = EXCLUDED.slug,
                   auto_slug = EXCLUDED.auto_slug
            "#,
        )
        .bind(draft.id().as_uuid())
        .bind(draft.is_published())
        .bind(draft.author_id().map(Uuid::from))
        .bind(draft.headline())
        .bind(draft.content())
        .bind(draft.slug())
        .bind(draft.auto_slug())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("save_article_draft", e))?;

        sqlx::query("DELETE FROM article_draft_editors WHERE article_draft_id = $1")
            .bind(draft.id().as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("save_article_draft_editors", e))?;

        for (position, editor) in draft.editors().iter().enumerate() {
            sqlx::query(
                "INSERT INTO article_draft_editors (article_draft_id, user_id, position) VALUES ($1, $2, $3)",
            )
            .bind(draft.id().as_uuid())
            .bind(editor.as_uuid())
            .bind(position as i32)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("save_article_draft_editors", e))?;
        }
        Ok(())
    }

    #[instrument(skip(self), fields(draft_id = %id), err)]
    async fn delete(&mut self, id: &ArticleDraftId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM article_drafts WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_article_draft", e))?;
        Ok(())
    }
}

#[async_trait]
impl Repository<Article> for PostgresTx {
    #[instrument(skip(self), fields(article_id = %id), err)]
    async fn get(&mut self, id: &ArticleId) -> Result<Article, StoreError> {
        let row = sqlx::query(
            "SELECT id, author_id, headline, content, slug, disproof FROM articles WHERE id = $1 FOR UPDATE",
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("get_article", e))?
        .ok_or_else(|| StoreError::not_found::<Article>(id))?;
        article_from_row(&row)
    }

    #[instrument(skip(self, article), fields(article_id = %article.id()), err)]
    async fn save(&mut self, article: &Article) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO articles (id, author_id, headline, content, slug, disproof)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
               SET author_id = EXCLUDED.author_id,
                   headline = EXCLUDED.headline,
                   content = EXCLUDED.content,
                   slug = EXCLUDED.slug,
                   disproof = EXCLUDED.disproof
            "#,
        )
        .bind(article.id().as_uuid())
        .bind(article.author_id().as_uuid())
        .bind(article.headline())
        .bind(article.content())
        .bind(article.slug())
        .bind(article.disproof())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("save_article", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(article_id = %id), err)]
    async fn delete(&mut self, id: &ArticleId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_article", e))?;
        Ok(())
    }
}

#[async_trait]
impl DefaultAuthors for PostgresTx {
    async fn default_author(&mut self, user_id: UserId) -> Result<Option<AuthorId>, StoreError> {
        let author_id: Option<Uuid> =
            sqlx::query_scalar("SELECT author_id FROM default_author WHERE user_id = $1 FOR UPDATE")
                .bind(user_id.as_uuid())
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(|e| map_sqlx_error("get_default_author", e))?;
        Ok(author_id.map(AuthorId::from_uuid))
    }

    async fn set_default_author(&mut self, user_id: UserId, author_id: AuthorId) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO default_author (user_id, author_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET author_id = EXCLUDED.author_id
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(author_id.as_uuid())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("set_default_author", e))?;
        Ok(())
    }

    async fn reset_default_author(&mut self, user_id: UserId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM default_author WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("reset_default_author", e))?;
        Ok(())
    }
}

#[async_trait]
impl AuthorCatalog for PostgresStore {
    #[instrument(skip(self), err)]
    async fn list_authors(&self) -> Result<Vec<AuthorListing>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT a.id, a.name, a.is_real_person,
                   COALESCE(
                       (SELECT array_agg(d.user_id ORDER BY d.user_id)
                          FROM default_author d WHERE d.author_id = a.id),
                       '{}'
                   ) AS default_for_users,
                   (SELECT count(*) FROM articles ar WHERE ar.author_id = a.id) AS count_of_articles,
                   (SELECT count(*) FROM article_drafts ad
                     WHERE ad.author_id = a.id AND NOT ad.is_published) AS count_of_article_drafts_in_work
              FROM authors a
             ORDER BY a.name, a.id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_authors", e))?;

        rows.iter()
            .map(|row| -> Result<AuthorListing, StoreError> {
                let read = |e| map_sqlx_error("read_author_listing", e);
                let users: Vec<Uuid> = row.try_get("default_for_users").map_err(read)?;
                let articles: i64 = row.try_get("count_of_articles").map_err(read)?;
                let drafts: i64 = row.try_get("count_of_article_drafts_in_work").map_err(read)?;
                Ok(AuthorListing {
                    author: author_from_row(row)?,
                    default_for_users: users.into_iter().map(UserId::from_uuid).collect(),
                    count_of_articles: articles.max(0) as u64,
                    count_of_article_drafts_in_work: drafts.max(0) as u64,
                })
            })
            .collect()
    }

    async fn find_author(&self, id: AuthorId) -> Result<Option<Author>, StoreError> {
        let row = sqlx::query("SELECT id, name, is_real_person FROM authors WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_author", e))?;
        row.as_ref().map(author_from_row).transpose()
    }

    async fn list_default_authors(&self) -> Result<Vec<DefaultAuthorMapping>, StoreError> {
        let rows: Vec<(Uuid, Uuid)> =
            sqlx::query_as("SELECT user_id, author_id FROM default_author ORDER BY user_id")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("list_default_authors", e))?;
        Ok(rows
            .into_iter()
            .map(|(user_id, author_id)| DefaultAuthorMapping {
                user_id: UserId::from_uuid(user_id),
                author_id: AuthorId::from_uuid(author_id),
            })
            .collect())
    }
}

impl PostgresStore {
    async fn draft_editors(&self, draft_id: Uuid) -> Result<Vec<UserId>, StoreError> {
        let editors: Vec<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM article_draft_editors WHERE article_draft_id = $1 ORDER BY position",
        )
        .bind(draft_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_article_draft_editors", e))?;
        Ok(editors.into_iter().map(UserId::from_uuid).collect())
    }
}

#[async_trait]
impl ArticleCatalog for PostgresStore {
    #[instrument(skip(self), err)]
    async fn list_article_drafts(&self) -> Result<Vec<ArticleDraftListing>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT d.id, d.is_published, d.author_id, d.headline, d.content, d.slug, d.auto_slug,
                   a.name AS author_name
              FROM article_drafts d
              LEFT JOIN authors a ON a.id = d.author_id
             ORDER BY d.id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_article_drafts", e))?;

        let mut listings = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: Uuid = row
                .try_get("id")
                .map_err(|e| map_sqlx_error("read_article_draft", e))?;
            let draft = draft_from_row(row, self.draft_editors(id).await?)?;
            let author_name: Option<String> = row
                .try_get("author_name")
                .map_err(|e| map_sqlx_error("read_article_draft", e))?;
            let author = draft
                .author_id()
                .zip(author_name)
                .map(|(id, name)| AuthorSummary { id, name });
            listings.push(ArticleDraftListing { draft, author });
        }
        Ok(listings)
    }

    async fn find_article_draft(&self, id: ArticleDraftId) -> Result<Option<ArticleDraft>, StoreError> {
        let row = sqlx::query(
            "SELECT id, is_published, author_id, headline, content, slug, auto_slug FROM article_drafts WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_article_draft", e))?;
        match row {
            Some(row) => Ok(Some(draft_from_row(&row, self.draft_editors(id.into()).await?)?)),
            None => Ok(None),
        }
    }

    async fn find_article(&self, id: ArticleId) -> Result<Option<Article>, StoreError> {
        let row = sqlx::query(
            "SELECT id, author_id, headline, content, slug, disproof FROM articles WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_article", e))?;
        row.as_ref().map(article_from_row).transpose()
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {operation}: {}", db_err.message());
            match db_err.code() {
                Some(code) if code.as_ref() == LOCK_NOT_AVAILABLE => {
                    StoreError::LockTimeout(operation.to_string())
                }
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => StoreError::Backend(format!("connection pool closed in {operation}")),
        sqlx::Error::PoolTimedOut => StoreError::Backend(format!("connection pool timed out in {operation}")),
        other => StoreError::Backend(format!("{operation}: {other}")),
    }
}

//! Article commands.
//!
//! Creation authorizes up front. Editing and publishing load the draft under
//! its row lock first and authorize against that locked state, since the
//! decision depends on who is listed as an editor.

use tracing::info;

use quill_auth::{ClaimsIdentity, overrides_apply, require, user_id};
use quill_authors::DefaultAuthors;
use quill_core::{
    ArticleDraftId, ArticleId, AuthorizationError, CommandError, DomainError, Entity, Repository,
    Store, finish,
};

use crate::article::Article;
use crate::draft::ArticleDraft;
use crate::security::{CreateArticleDraftPermission, EditArticleDraftPermission, PublishArticlePermission};

pub struct CreateArticleDraftCommand<S> {
    store: S,
}

impl<S> CreateArticleDraftCommand<S>
where
    S: Store,
    S::Tx: Repository<ArticleDraft> + DefaultAuthors,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Start an empty draft edited by the calling user, bylined with their default author.
    pub async fn execute(
        &self,
        principal: &ClaimsIdentity,
        agent: &ClaimsIdentity,
    ) -> Result<ArticleDraft, CommandError> {
        if !overrides_apply(agent) {
            require(CreateArticleDraftPermission.evaluate(principal), "article_drafts.create")?;
        }
        // A draft always starts with one editor, so an anonymous caller cannot create one.
        let created_by = user_id(principal).map_err(|_| AuthorizationError)?;

        let mut tx = self.store.begin().await?;
        let outcome = async {
            let author_id = tx.default_author(created_by).await?;
            let draft = ArticleDraft::create_from_scratch(ArticleDraftId::new(), author_id, created_by);
            tx.save(&draft).await?;
            Ok::<_, CommandError>(draft)
        }
        .await;
        let draft = finish(tx, outcome).await?;

        info!(draft_id = %draft.id(), user_id = %created_by, "article draft created");
        Ok(draft)
    }
}

async fn edit_draft<Tx, F>(
    tx: &mut Tx,
    draft_id: ArticleDraftId,
    principal: &ClaimsIdentity,
    agent: &ClaimsIdentity,
    action: &'static str,
    edit: F,
) -> Result<ArticleDraft, CommandError>
where
    Tx: Repository<ArticleDraft>,
    F: FnOnce(&mut ArticleDraft) -> Result<(), CommandError> + Send,
{
    let mut draft = Repository::<ArticleDraft>::get(tx, &draft_id).await?;
    if !overrides_apply(agent) {
        require(EditArticleDraftPermission.evaluate(principal, &draft), action)?;
    }
    edit(&mut draft)?;
    tx.save(&draft).await?;
    Ok(draft)
}

pub struct UpdateArticleDraftHeadlineCommand<S> {
    store: S,
}

impl<S> UpdateArticleDraftHeadlineCommand<S>
where
    S: Store,
    S::Tx: Repository<ArticleDraft>,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn execute(
        &self,
        draft_id: ArticleDraftId,
        headline: &str,
        principal: &ClaimsIdentity,
        agent: &ClaimsIdentity,
    ) -> Result<ArticleDraft, CommandError> {
        let mut tx = self.store.begin().await?;
        let outcome = edit_draft(&mut tx, draft_id, principal, agent, "article_drafts.update_headline", |d| {
            d.set_headline(headline);
            Ok(())
        })
        .await;
        let draft = finish(tx, outcome).await?;

        info!(%draft_id, slug = draft.slug(), "article draft headline updated");
        Ok(draft)
    }
}

pub struct UpdateArticleDraftContentCommand<S> {
    store: S,
}

impl<S> UpdateArticleDraftContentCommand<S>
where
    S: Store,
    S::Tx: Repository<ArticleDraft>,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn execute(
        &self,
        draft_id: ArticleDraftId,
        content: &str,
        principal: &ClaimsIdentity,
        agent: &ClaimsIdentity,
    ) -> Result<ArticleDraft, CommandError> {
        let mut tx = self.store.begin().await?;
        let outcome = edit_draft(&mut tx, draft_id, principal, agent, "article_drafts.update_content", |d| {
            d.set_content(content);
            Ok(())
        })
        .await;
        let draft = finish(tx, outcome).await?;

        info!(%draft_id, "article draft content updated");
        Ok(draft)
    }
}

pub struct UpdateArticleDraftSlugCommand<S> {
    store: S,
}

impl<S> UpdateArticleDraftSlugCommand<S>
where
    S: Store,
    S::Tx: Repository<ArticleDraft>,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// `Some(slug)` pins the slug; `None` makes it follow the headline again.
    pub async fn execute(
        &self,
        draft_id: ArticleDraftId,
        slug: Option<&str>,
        principal: &ClaimsIdentity,
        agent: &ClaimsIdentity,
    ) -> Result<ArticleDraft, CommandError> {
        let mut tx = self.store.begin().await?;
        let outcome = edit_draft(&mut tx, draft_id, principal, agent, "article_drafts.update_slug", |d| {
            match slug {
                Some(slug) => {
                    d.disable_auto_slug();
                    d.set_slug(slug)?;
                }
                None => d.enable_auto_slug(),
            }
            Ok(())
        })
        .await;
        let draft = finish(tx, outcome).await?;

        info!(%draft_id, slug = draft.slug(), auto_slug = draft.auto_slug(), "article draft slug updated");
        Ok(draft)
    }
}

pub struct PublishArticleCommand<S> {
    store: S,
}

impl<S> PublishArticleCommand<S>
where
    S: Store,
    S::Tx: Repository<ArticleDraft> + Repository<Article>,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Turn a complete draft into an article. Nothing is written unless every step succeeds.
    pub async fn execute(
        &self,
        draft_id: ArticleDraftId,
        principal: &ClaimsIdentity,
        agent: &ClaimsIdentity,
    ) -> Result<Article, CommandError> {
        let mut tx = self.store.begin().await?;
        let outcome = publish(&mut tx, draft_id, principal, agent).await;
        let article = finish(tx, outcome).await?;

        info!(%draft_id, article_id = %article.id(), "article published");
        Ok(article)
    }
}

async fn publish<Tx>(
    tx: &mut Tx,
    draft_id: ArticleDraftId,
    principal: &ClaimsIdentity,
    agent: &ClaimsIdentity,
) -> Result<Article, CommandError>
where
    Tx: Repository<ArticleDraft> + Repository<Article>,
{
    let mut draft = Repository::<ArticleDraft>::get(tx, &draft_id).await?;
    if !overrides_apply(agent) {
        require(PublishArticlePermission.evaluate(principal, &draft), "articles.publish")?;
    }
    if draft.is_published() {
        return Err(DomainError::invariant("draft is already published").into());
    }

    let article = Article::publish(ArticleId::new(), draft.validate()?);
    draft.mark_published()?;

    Repository::<Article>::save(tx, &article).await?;
    Repository::<ArticleDraft>::save(tx, &draft).await?;
    Ok(article)
}

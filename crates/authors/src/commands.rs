//! Author commands.
//!
//! Every command authorizes before opening its transaction: author management
//! is decided by role alone, so there is nothing to load first.

use tracing::info;

use quill_auth::{ClaimsIdentity, overrides_apply, require};
use quill_core::{
    AuthorId, AuthorizationError, CommandError, Entity, Repository, Store, UserId, finish,
};

use crate::author::Author;
use crate::defaults::DefaultAuthors;
use crate::security::EditAuthorsPermission;

fn authorize(
    principal: &ClaimsIdentity,
    agent: &ClaimsIdentity,
    action: &'static str,
) -> Result<(), AuthorizationError> {
    if overrides_apply(agent) {
        return Ok(());
    }
    require(EditAuthorsPermission.evaluate(principal), action)
}

pub struct CreateAuthorCommand<S> {
    store: S,
}

impl<S> CreateAuthorCommand<S>
where
    S: Store,
    S::Tx: Repository<Author>,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn execute(
        &self,
        name: &str,
        is_real_person: bool,
        principal: &ClaimsIdentity,
        agent: &ClaimsIdentity,
    ) -> Result<Author, CommandError> {
        authorize(principal, agent, "authors.create")?;
        let author = Author::create(AuthorId::new(), name, is_real_person)?;

        let mut tx = self.store.begin().await?;
        let outcome = tx.save(&author).await.map_err(CommandError::from);
        finish(tx, outcome).await?;

        info!(author_id = %author.id(), "author created");
        Ok(author)
    }
}

pub struct UpdateAuthorCommand<S> {
    store: S,
}

impl<S> UpdateAuthorCommand<S>
where
    S: Store,
    S::Tx: Repository<Author>,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn execute(
        &self,
        author_id: AuthorId,
        name: &str,
        principal: &ClaimsIdentity,
        agent: &ClaimsIdentity,
    ) -> Result<Author, CommandError> {
        authorize(principal, agent, "authors.update")?;

        let mut tx = self.store.begin().await?;
        let outcome = rename(&mut tx, author_id, name).await;
        let author = finish(tx, outcome).await?;

        info!(%author_id, "author renamed");
        Ok(author)
    }
}

async fn rename<Tx>(tx: &mut Tx, author_id: AuthorId, name: &str) -> Result<Author, CommandError>
where
    Tx: Repository<Author>,
{
    let mut author = Repository::<Author>::get(tx, &author_id).await?;
    author.set_name(name)?;
    tx.save(&author).await?;
    Ok(author)
}

pub struct DeleteAuthorCommand<S> {
    store: S,
}

impl<S> DeleteAuthorCommand<S>
where
    S: Store,
    S::Tx: Repository<Author>,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Deleting an author also drops every default-author mapping pointing at it.
    pub async fn execute(
        &self,
        author_id: AuthorId,
        principal: &ClaimsIdentity,
        agent: &ClaimsIdentity,
    ) -> Result<(), CommandError> {
        authorize(principal, agent, "authors.delete")?;

        let mut tx = self.store.begin().await?;
        let outcome = remove(&mut tx, author_id).await;
        finish(tx, outcome).await?;

        info!(%author_id, "author deleted");
        Ok(())
    }
}

async fn remove<Tx>(tx: &mut Tx, author_id: AuthorId) -> Result<(), CommandError>
where
    Tx: Repository<Author>,
{
    Repository::<Author>::get(tx, &author_id).await?;
    Repository::<Author>::delete(tx, &author_id).await?;
    Ok(())
}

pub struct SetDefaultAuthorCommand<S> {
    store: S,
}

impl<S> SetDefaultAuthorCommand<S>
where
    S: Store,
    S::Tx: Repository<Author> + DefaultAuthors,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn execute(
        &self,
        user_id: UserId,
        author_id: AuthorId,
        principal: &ClaimsIdentity,
        agent: &ClaimsIdentity,
    ) -> Result<(), CommandError> {
        authorize(principal, agent, "authors.set_default")?;

        let mut tx = self.store.begin().await?;
        let outcome = assign_default(&mut tx, user_id, author_id).await;
        finish(tx, outcome).await?;

        info!(%user_id, %author_id, "default author set");
        Ok(())
    }
}

async fn assign_default<Tx>(tx: &mut Tx, user_id: UserId, author_id: AuthorId) -> Result<(), CommandError>
where
    Tx: Repository<Author> + DefaultAuthors,
{
    // Holding the author row keeps a concurrent delete from orphaning the mapping.
    Repository::<Author>::get(tx, &author_id).await?;
    tx.set_default_author(user_id, author_id).await?;
    Ok(())
}

pub struct ResetDefaultAuthorCommand<S> {
    store: S,
}

impl<S> ResetDefaultAuthorCommand<S>
where
    S: Store,
    S::Tx: DefaultAuthors,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn execute(
        &self,
        user_id: UserId,
        principal: &ClaimsIdentity,
        agent: &ClaimsIdentity,
    ) -> Result<(), CommandError> {
        authorize(principal, agent, "authors.reset_default")?;

        let mut tx = self.store.begin().await?;
        let outcome = tx.reset_default_author(user_id).await.map_err(CommandError::from);
        finish(tx, outcome).await?;

        info!(%user_id, "default author reset");
        Ok(())
    }
}

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Subcommand;

use quill_auth::authenticate_cli;
use quill_authors::{Author, CreateAuthorCommand, DeleteAuthorCommand, UpdateAuthorCommand};
use quill_core::{AuthorId, Entity};
use quill_infra::{InMemoryStore, NewsroomStore, PostgresStore};

#[derive(Subcommand, Debug)]
pub enum AuthorsCommand {
    /// Create an author
    Create {
        /// Display name
        name: String,

        /// The author is a made-up persona rather than a real person
        #[arg(long)]
        fake: bool,
    },

    /// Rename an author
    Update {
        /// Author ID
        author_id: AuthorId,

        /// New display name
        #[arg(long)]
        name: String,
    },

    /// Delete an author and any default-author mappings pointing at it
    Delete {
        /// Author ID
        author_id: AuthorId,
    },
}

pub async fn run(command: AuthorsCommand) -> Result<()> {
    let config = super::load_config()?;
    if config.db.is_in_memory() {
        tracing::warn!("db.url is memory://; changes are discarded on exit");
        let mut store = InMemoryStore::new();
        if let Some(ms) = config.db.lock_timeout_ms {
            store = store.with_lock_timeout(Duration::from_millis(ms));
        }
        execute(store, command).await
    } else {
        let store = PostgresStore::connect(&config.db)
            .await
            .context("failed to connect to the database")?;
        execute(store, command).await
    }
}

async fn execute<S: NewsroomStore>(store: S, command: AuthorsCommand) -> Result<()> {
    let authentication = authenticate_cli();
    let (principal, agent) = (&authentication.principal, &authentication.agent);

    match command {
        AuthorsCommand::Create { name, fake } => {
            let author = CreateAuthorCommand::new(store)
                .execute(&name, !fake, principal, agent)
                .await?;
            print_author(&author, "Created author");
        }
        AuthorsCommand::Update { author_id, name } => {
            let author = UpdateAuthorCommand::new(store)
                .execute(author_id, &name, principal, agent)
                .await?;
            print_author(&author, "Updated author");
        }
        AuthorsCommand::Delete { author_id } => {
            DeleteAuthorCommand::new(store)
                .execute(author_id, principal, agent)
                .await?;
            println!("Deleted author {author_id}");
        }
    }
    Ok(())
}

fn print_author(author: &Author, title: &str) {
    println!("{title}");
    println!("  {:<16} {}", "ID", author.id());
    println!("  {:<16} {}", "Name", author.name());
    println!("  {:<16} {}", "Is real person?", author.is_real_person());
}

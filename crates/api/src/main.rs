use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;

use quill_infra::{Config, InMemoryStore, NewsroomStore, PostgresStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    quill_observability::init_with(&config.logging);
    config.validate()?;

    if config.db.is_in_memory() {
        tracing::warn!("db.url is memory://; nothing is persisted");
        let mut store = InMemoryStore::new();
        if let Some(ms) = config.db.lock_timeout_ms {
            store = store.with_lock_timeout(Duration::from_millis(ms));
        }
        serve(store, &config).await
    } else {
        let store = PostgresStore::connect(&config.db)
            .await
            .context("failed to connect to the database")?;
        serve(store, &config).await
    }
}

async fn serve<S: NewsroomStore>(store: S, config: &Config) -> anyhow::Result<()> {
    let public = quill_api::app::build_public_app(store.clone(), &config.api)?;
    let internal = quill_api::app::build_internal_app(store, &config.internal_api)?;

    let public_listener = TcpListener::bind(&config.api.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.api.bind))?;
    let internal_listener = TcpListener::bind(&config.internal_api.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.internal_api.bind))?;

    tracing::info!(
        public = %public_listener.local_addr()?,
        internal = %internal_listener.local_addr()?,
        "listening"
    );

    tokio::try_join!(
        async { axum::serve(public_listener, public).await },
        async { axum::serve(internal_listener, internal).await },
    )?;
    Ok(())
}

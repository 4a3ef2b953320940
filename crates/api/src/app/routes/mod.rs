use axum::{routing::get, Router};

use quill_infra::NewsroomStore;

pub mod article_drafts;
pub mod articles;
pub mod authors;
pub mod system;

/// Authenticated endpoints of the public API.
pub fn public_router<S: NewsroomStore>() -> Router {
    Router::new()
        .nest("/authors", authors::public_router::<S>())
        .nest("/articles", articles::router::<S>())
}

/// Authenticated endpoints of the internal API.
pub fn internal_router<S: NewsroomStore>() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/authors", authors::internal_router::<S>())
        .nest("/article-drafts", article_drafts::router::<S>())
}

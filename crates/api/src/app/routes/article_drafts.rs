use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};

use quill_articles::{
    CreateArticleDraftCommand, GetArticleDraftQuery, ListArticleDraftsQuery, PublishArticleCommand,
    UpdateArticleDraftContentCommand, UpdateArticleDraftHeadlineCommand,
    UpdateArticleDraftSlugCommand,
};
use quill_core::ArticleDraftId;
use quill_infra::NewsroomStore;

use crate::app::{dto, errors, services::Services};
use crate::context::Caller;

pub fn router<S: NewsroomStore>() -> Router {
    Router::new()
        .route("/", get(list_drafts::<S>).post(create_draft::<S>))
        .route("/:id", get(get_draft::<S>))
        .route("/:id/headline", put(update_headline::<S>))
        .route("/:id/content", put(update_content::<S>))
        .route("/:id/slug", put(update_slug::<S>))
        .route("/:id/publish", post(publish::<S>))
}

fn draft_id(raw: &str) -> Result<ArticleDraftId, axum::response::Response> {
    errors::parse_id(raw, "article draft")
}

pub async fn list_drafts<S: NewsroomStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Extension(caller): Extension<Caller>,
) -> axum::response::Response {
    let query = ListArticleDraftsQuery::new(services.store.clone());
    match query.execute(caller.principal(), caller.agent()).await {
        Ok(drafts) => Json(drafts).into_response(),
        Err(e) => errors::command_error_to_response(e),
    }
}

pub async fn create_draft<S: NewsroomStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Extension(caller): Extension<Caller>,
) -> axum::response::Response {
    let command = CreateArticleDraftCommand::new(services.store.clone());
    match command.execute(caller.principal(), caller.agent()).await {
        Ok(draft) => (StatusCode::CREATED, Json(draft)).into_response(),
        Err(e) => errors::command_error_to_response(e),
    }
}

pub async fn get_draft<S: NewsroomStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match draft_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let query = GetArticleDraftQuery::new(services.store.clone());
    match query.execute(id, caller.principal(), caller.agent()).await {
        Ok(draft) => Json(draft).into_response(),
        Err(e) => errors::command_error_to_response(e),
    }
}

pub async fn update_headline<S: NewsroomStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateHeadlineRequest>,
) -> axum::response::Response {
    let id = match draft_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let command = UpdateArticleDraftHeadlineCommand::new(services.store.clone());
    match command
        .execute(id, &body.headline, caller.principal(), caller.agent())
        .await
    {
        Ok(draft) => Json(draft).into_response(),
        Err(e) => errors::command_error_to_response(e),
    }
}

pub async fn update_content<S: NewsroomStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateContentRequest>,
) -> axum::response::Response {
    let id = match draft_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let command = UpdateArticleDraftContentCommand::new(services.store.clone());
    match command
        .execute(id, &body.content, caller.principal(), caller.agent())
        .await
    {
        Ok(draft) => Json(draft).into_response(),
        Err(e) => errors::command_error_to_response(e),
    }
}

pub async fn update_slug<S: NewsroomStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateSlugRequest>,
) -> axum::response::Response {
    let id = match draft_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let command = UpdateArticleDraftSlugCommand::new(services.store.clone());
    match command
        .execute(id, body.slug.as_deref(), caller.principal(), caller.agent())
        .await
    {
        Ok(draft) => Json(draft).into_response(),
        Err(e) => errors::command_error_to_response(e),
    }
}

pub async fn publish<S: NewsroomStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match draft_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let command = PublishArticleCommand::new(services.store.clone());
    match command.execute(id, caller.principal(), caller.agent()).await {
        Ok(article) => (StatusCode::CREATED, Json(article)).into_response(),
        Err(e) => errors::command_error_to_response(e),
    }
}

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};

use quill_authors::{
    CreateAuthorCommand, DeleteAuthorCommand, GetAuthorQuery, ListAuthorsQuery,
    ListDefaultAuthorsQuery, ResetDefaultAuthorCommand, SetDefaultAuthorCommand,
    UpdateAuthorCommand,
};
use quill_core::{AuthorId, UserId};
use quill_infra::NewsroomStore;

use crate::app::{dto, errors, services::Services};
use crate::context::Caller;

/// Catalogue reads for any authenticated caller.
pub fn public_router<S: NewsroomStore>() -> Router {
    Router::new()
        .route("/", get(list_public_authors::<S>))
        .route("/:id", get(get_public_author::<S>))
}

pub fn internal_router<S: NewsroomStore>() -> Router {
    Router::new()
        .route("/", get(list_authors::<S>).post(create_author::<S>))
        .route("/default", get(list_default_authors::<S>))
        .route(
            "/default/for-user/:user_id",
            put(set_default_author::<S>).delete(reset_default_author::<S>),
        )
        .route(
            "/:id",
            get(get_author::<S>)
                .put(update_author::<S>)
                .delete(delete_author::<S>),
        )
}

pub async fn list_public_authors<S: NewsroomStore>(
    Extension(store): Extension<S>,
) -> axum::response::Response {
    match store.list_authors().await {
        Ok(listings) => Json(
            listings
                .iter()
                .map(|l| dto::PublicAuthor::from(&l.author))
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(e) => errors::command_error_to_response(e.into()),
    }
}

pub async fn get_public_author<S: NewsroomStore>(
    Extension(store): Extension<S>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let author_id: AuthorId = match errors::parse_id(&id, "author") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match store.find_author(author_id).await {
        Ok(Some(author)) => Json(dto::PublicAuthor::from(&author)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", format!("Author({id}) is not found")),
        Err(e) => errors::command_error_to_response(e.into()),
    }
}

pub async fn list_authors<S: NewsroomStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Extension(caller): Extension<Caller>,
) -> axum::response::Response {
    let query = ListAuthorsQuery::new(services.store.clone(), services.list_authors.clone());
    match query.execute(caller.principal(), caller.agent()).await {
        Ok(listings) => Json(listings).into_response(),
        Err(e) => errors::command_error_to_response(e),
    }
}

pub async fn create_author<S: NewsroomStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Extension(caller): Extension<Caller>,
    Json(body): Json<dto::CreateAuthorRequest>,
) -> axum::response::Response {
    let command = CreateAuthorCommand::new(services.store.clone());
    match command
        .execute(&body.name, body.is_real_person, caller.principal(), caller.agent())
        .await
    {
        Ok(author) => (StatusCode::CREATED, Json(author)).into_response(),
        Err(e) => errors::command_error_to_response(e),
    }
}

pub async fn get_author<S: NewsroomStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let author_id: AuthorId = match errors::parse_id(&id, "author") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let query = GetAuthorQuery::new(services.store.clone());
    match query.execute(author_id, caller.principal(), caller.agent()).await {
        Ok(author) => Json(author).into_response(),
        Err(e) => errors::command_error_to_response(e),
    }
}

pub async fn update_author<S: NewsroomStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateAuthorRequest>,
) -> axum::response::Response {
    let author_id: AuthorId = match errors::parse_id(&id, "author") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let command = UpdateAuthorCommand::new(services.store.clone());
    match command
        .execute(author_id, &body.name, caller.principal(), caller.agent())
        .await
    {
        Ok(author) => Json(author).into_response(),
        Err(e) => errors::command_error_to_response(e),
    }
}

pub async fn delete_author<S: NewsroomStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let author_id: AuthorId = match errors::parse_id(&id, "author") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let command = DeleteAuthorCommand::new(services.store.clone());
    match command.execute(author_id, caller.principal(), caller.agent()).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::command_error_to_response(e),
    }
}

pub async fn list_default_authors<S: NewsroomStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Extension(caller): Extension<Caller>,
) -> axum::response::Response {
    let query = ListDefaultAuthorsQuery::new(services.store.clone());
    match query.execute(caller.principal(), caller.agent()).await {
        Ok(mappings) => Json(mappings).into_response(),
        Err(e) => errors::command_error_to_response(e),
    }
}

pub async fn set_default_author<S: NewsroomStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Extension(caller): Extension<Caller>,
    Path(user_id): Path<String>,
    Json(body): Json<dto::SetDefaultAuthorRequest>,
) -> axum::response::Response {
    let user_id: UserId = match errors::parse_id(&user_id, "user") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let command = SetDefaultAuthorCommand::new(services.store.clone());
    match command
        .execute(user_id, body.author_id, caller.principal(), caller.agent())
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::command_error_to_response(e),
    }
}

pub async fn reset_default_author<S: NewsroomStore>(
    Extension(services): Extension<Arc<Services<S>>>,
    Extension(caller): Extension<Caller>,
    Path(user_id): Path<String>,
) -> axum::response::Response {
    let user_id: UserId = match errors::parse_id(&user_id, "user") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let command = ResetDefaultAuthorCommand::new(services.store.clone());
    match command.execute(user_id, caller.principal(), caller.agent()).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::command_error_to_response(e),
    }
}

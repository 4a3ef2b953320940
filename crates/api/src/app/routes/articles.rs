use axum::{
    extract::{Extension, Path},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use quill_articles::GetArticleQuery;
use quill_core::ArticleId;
use quill_infra::NewsroomStore;

use crate::app::{dto, errors};

pub fn router<S: NewsroomStore>() -> Router {
    Router::new().route("/:id", get(get_article::<S>))
}

pub async fn get_article<S: NewsroomStore>(
    Extension(store): Extension<S>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let article_id: ArticleId = match errors::parse_id(&id, "article") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match GetArticleQuery::new(store).execute(article_id).await {
        Ok(article) => Json(dto::PublicArticle::from(&article)).into_response(),
        Err(e) => errors::command_error_to_response(e),
    }
}

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde_json::{Value, json};

use quill_auth::ClaimsIdentity;

use crate::context::Caller;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

fn claims_json(identity: &ClaimsIdentity) -> Vec<Value> {
    identity
        .claims()
        .iter()
        .map(|claim| {
            json!({
                "type": claim.claim_type().as_str(),
                "issuer": claim.issuer(),
                "value": claim.value().as_text(),
            })
        })
        .collect()
}

pub async fn whoami(Extension(caller): Extension<Caller>) -> impl IntoResponse {
    Json(json!({
        "principal": claims_json(caller.principal()),
        "agent": claims_json(caller.agent()),
    }))
}

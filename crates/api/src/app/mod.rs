//! HTTP application wiring (Axum routers + service wiring).
//!
//! - `services.rs`: state shared by the internal API handlers
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use quill_auth::{HttpAuthenticator, InvalidVerifierKey, JwtAuthenticationOptions};
use quill_infra::{ApiConfig, InternalApiConfig, NewsroomStore};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

fn auth_state(options: &JwtAuthenticationOptions) -> Result<middleware::AuthState, InvalidVerifierKey> {
    Ok(middleware::AuthState {
        authenticator: Arc::new(HttpAuthenticator::new(options)?),
    })
}

/// Router of the public catalogue API.
pub fn build_public_app<S: NewsroomStore>(store: S, config: &ApiConfig) -> Result<Router, InvalidVerifierKey> {
    let auth_state = auth_state(&config.jwt_authentication)?;

    let protected = routes::public_router::<S>().layer(
        ServiceBuilder::new()
            .layer(axum::middleware::from_fn_with_state(
                auth_state,
                middleware::auth_middleware,
            ))
            .layer(Extension(store)),
    );

    Ok(Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected))
}

/// Router of the internal newsroom API.
pub fn build_internal_app<S: NewsroomStore>(
    store: S,
    config: &InternalApiConfig,
) -> Result<Router, InvalidVerifierKey> {
    let auth_state = auth_state(&config.jwt_authentication)?;
    let services = Arc::new(services::Services::new(
        store,
        config.admin_panel_agent_name.clone(),
    ));

    let protected = routes::internal_router::<S>().layer(
        ServiceBuilder::new()
            .layer(axum::middleware::from_fn_with_state(
                auth_state,
                middleware::auth_middleware,
            ))
            .layer(Extension(services)),
    );

    Ok(Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected))
}

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};
use uuid::Uuid;

use quill_auth::JwtAuthenticationOptions;
use quill_infra::{ApiConfig, InMemoryStore, InternalApiConfig};

const SECRET: &str = "black-box-secret";
const ISSUER: &str = "https://idp.example.org/realms/newsroom";
const PUBLIC_AUDIENCE: &str = "quill-public";
const INTERNAL_AUDIENCE: &str = "quill-internal";
const ADMIN_PANEL: &str = "quill-admin";
const NEWSROOM_WEB: &str = "newsroom-web";

struct TestServer {
    public_url: String,
    internal_url: String,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

fn jwt_options(audience: &str) -> JwtAuthenticationOptions {
    JwtAuthenticationOptions {
        public_key: SECRET.to_string(),
        audience: audience.to_string(),
        issuer: ISSUER.to_string(),
        algorithm: Algorithm::HS256,
        ..Default::default()
    }
}

async fn serve(app: axum::Router) -> (String, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind ephemeral port");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), handle)
}

impl TestServer {
    async fn spawn() -> Self {
        // Same routers as prod, sharing one in-memory store, on ephemeral ports.
        let store = InMemoryStore::new();
        let public = quill_api::app::build_public_app(
            store.clone(),
            &ApiConfig {
                jwt_authentication: jwt_options(PUBLIC_AUDIENCE),
                ..Default::default()
            },
        )
        .unwrap();
        let internal = quill_api::app::build_internal_app(
            store,
            &InternalApiConfig {
                jwt_authentication: jwt_options(INTERNAL_AUDIENCE),
                admin_panel_agent_name: ADMIN_PANEL.to_string(),
                ..Default::default()
            },
        )
        .unwrap();

        let (public_url, public_handle) = serve(public).await;
        let (internal_url, internal_handle) = serve(internal).await;
        Self {
            public_url,
            internal_url,
            handles: vec![public_handle, internal_handle],
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

fn mint_jwt(secret: &str, audience: &str, sub: Uuid, roles: &[&str], azp: &str) -> String {
    let now = Utc::now();
    let claims = json!({
        "iss": ISSUER,
        "sub": sub.to_string(),
        "aud": audience,
        "iat": now.timestamp(),
        "exp": (now + ChronoDuration::minutes(10)).timestamp(),
        "azp": azp,
        "preferred_username": "jdoe",
        "resource_access": { audience: { "roles": roles } },
    });

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn internal_token(sub: Uuid, roles: &[&str], azp: &str) -> String {
    mint_jwt(SECRET, INTERNAL_AUDIENCE, sub, roles, azp)
}

async fn json_body(res: reqwest::Response) -> Value {
    res.json().await.unwrap()
}

#[tokio::test]
async fn health_is_open_and_everything_else_needs_a_token() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for base in [&srv.public_url, &srv.internal_url] {
        let res = client.get(format!("{base}/health")).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    let res = client
        .get(format!("{}/whoami", srv.internal_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let forged = mint_jwt("some-other-secret", INTERNAL_AUDIENCE, Uuid::new_v4(), &["chief"], ADMIN_PANEL);
    let res = client
        .get(format!("{}/whoami", srv.internal_url))
        .bearer_auth(forged)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // A token for the internal API does not open the public one.
    let res = client
        .get(format!("{}/authors", srv.public_url))
        .bearer_auth(internal_token(Uuid::new_v4(), &["chief"], ADMIN_PANEL))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn whoami_reports_principal_and_agent_claims() {
    let srv = TestServer::spawn().await;
    let sub = Uuid::new_v4();

    let res = reqwest::Client::new()
        .get(format!("{}/whoami", srv.internal_url))
        .header("User-Agent", "black-box/1.0")
        .bearer_auth(internal_token(sub, &["editor"], NEWSROOM_WEB))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;

    let principal = body["principal"].as_array().unwrap();
    assert!(principal.iter().any(|c| c["type"] == "user_id" && c["value"] == sub.to_string()));
    assert!(principal.iter().any(|c| c["type"] == "role" && c["value"] == "editor"));
    assert!(principal.iter().any(|c| c["type"] == "username" && c["value"] == "jdoe"));

    let agent = body["agent"].as_array().unwrap();
    assert!(agent.iter().any(|c| c["type"] == "agent_name" && c["value"] == NEWSROOM_WEB));
    assert!(agent.iter().any(|c| {
        c["type"] == "agent_platform" && c["value"] == "black-box/1.0" && c["issuer"] == "LOCAL AUTHORITY"
    }));
}

#[tokio::test]
async fn forbidden_responses_carry_no_detail() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/authors", srv.internal_url))
        .bearer_auth(internal_token(Uuid::new_v4(), &["journalist"], ADMIN_PANEL))
        .json(&json!({ "name": "Jane Roe" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(res).await, json!({ "reason": "Unauthorized" }));
}

#[tokio::test]
async fn listing_authors_is_reserved_to_the_admin_panel() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let journalist = Uuid::new_v4();

    let res = client
        .get(format!("{}/authors", srv.internal_url))
        .bearer_auth(internal_token(journalist, &["journalist"], ADMIN_PANEL))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/authors", srv.internal_url))
        .bearer_auth(internal_token(journalist, &["journalist"], NEWSROOM_WEB))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn draft_to_article_lifecycle() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let chief = internal_token(Uuid::new_v4(), &["chief"], ADMIN_PANEL);
    let journalist_id = Uuid::new_v4();
    let journalist = internal_token(journalist_id, &["journalist"], NEWSROOM_WEB);

    // Chief sets up a byline and makes it the journalist's default.
    let res = client
        .post(format!("{}/authors", srv.internal_url))
        .bearer_auth(&chief)
        .json(&json!({ "name": "Jane Roe" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let author_id = json_body(res).await["id"].as_str().unwrap().to_string();

    let res = client
        .put(format!("{}/authors/default/for-user/{journalist_id}", srv.internal_url))
        .bearer_auth(&chief)
        .json(&json!({ "author_id": author_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    // Journalist writes.
    let res = client
        .post(format!("{}/article-drafts", srv.internal_url))
        .bearer_auth(&journalist)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let draft = json_body(res).await;
    assert_eq!(draft["author_id"], author_id.as_str());
    let draft_id = draft["id"].as_str().unwrap().to_string();

    let res = client
        .put(format!("{}/article-drafts/{draft_id}/headline", srv.internal_url))
        .bearer_auth(&journalist)
        .json(&json!({ "headline": "Hello World" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await["slug"], "hello-world");

    let res = client
        .put(format!("{}/article-drafts/{draft_id}/content", srv.internal_url))
        .bearer_auth(&journalist)
        .json(&json!({ "content": "It works." }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Journalists cannot publish; chiefs can, once.
    let publish_url = format!("{}/article-drafts/{draft_id}/publish", srv.internal_url);
    let res = client.post(&publish_url).bearer_auth(&journalist).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client.post(&publish_url).bearer_auth(&chief).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let article_id = json_body(res).await["id"].as_str().unwrap().to_string();

    let res = client.post(&publish_url).bearer_auth(&chief).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // The public API serves the article.
    let reader = mint_jwt(SECRET, PUBLIC_AUDIENCE, Uuid::new_v4(), &[], "news-site");
    let res = client
        .get(format!("{}/articles/{article_id}", srv.public_url))
        .bearer_auth(&reader)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let article = json_body(res).await;
    assert_eq!(article["headline"], "Hello World");
    assert_eq!(article["slug"], "hello-world");
    assert_eq!(article["author_id"], author_id.as_str());

    let res = client
        .get(format!("{}/authors/{author_id}", srv.public_url))
        .bearer_auth(&reader)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await["name"], "Jane Roe");
}

#[tokio::test]
async fn incomplete_drafts_fail_validation() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let editor = internal_token(Uuid::new_v4(), &["editor"], NEWSROOM_WEB);

    let res = client
        .post(format!("{}/article-drafts", srv.internal_url))
        .bearer_auth(&editor)
        .send()
        .await
        .unwrap();
    let draft_id = json_body(res).await["id"].as_str().unwrap().to_string();

    let res = client
        .post(format!("{}/article-drafts/{draft_id}/publish", srv.internal_url))
        .bearer_auth(&editor)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(res).await;
    let problems = body["problems"].as_array().unwrap();
    assert!(problems.iter().any(|p| p == "no headline"));
    assert!(problems.iter().any(|p| p == "no author is set"));
}

#[tokio::test]
async fn unknown_and_malformed_ids() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let chief = internal_token(Uuid::new_v4(), &["chief"], ADMIN_PANEL);

    let res = client
        .put(format!("{}/article-drafts/{}/headline", srv.internal_url, Uuid::new_v4()))
        .bearer_auth(&chief)
        .json(&json!({ "headline": "Anything" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .get(format!("{}/authors/not-a-uuid", srv.internal_url))
        .bearer_auth(&chief)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{self, Request, StatusCode};
use iam_audit::{AuditPipeline, AuditPipelineConfig};
use iam_audit_memory::InMemorySink;
use iam_catalog_store::CatalogStore;
use iam_core::condition::ConditionSpec;
use iam_core::{CatalogSnapshot, Effect, Policy, PolicyName, Username};
use iam_policy::PolicyEvaluator;
use iam_server::AppState;
use tower::ServiceExt;

fn policy(name: &str, owner: &str, effect: Effect, resources: Vec<&str>, conditions: HashMap<String, ConditionSpec>) -> Policy {
    Policy {
        name: PolicyName::new(name),
        owner_username: Username::new(owner),
        subjects: vec!["users:alice".to_owned()],
        actions: vec!["read".to_owned()],
        resources: resources.into_iter().map(str::to_owned).collect(),
        effect,
        conditions,
        description: None,
    }
}

fn build_app(snapshot: CatalogSnapshot) -> Router {
    let store = CatalogStore::with_snapshot(snapshot);
    let sink = Arc::new(InMemorySink::new());
    let (pipeline, _workers) = AuditPipeline::start(AuditPipelineConfig::default(), sink);

    let state = AppState {
        store,
        evaluator: PolicyEvaluator::new(),
        audit: Arc::new(pipeline),
    };
    iam_server::api::router(state)
}

async fn post_authz(app: Router, bearer: Option<&str>, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder()
        .method(http::Method::POST)
        .uri("/v1/authz")
        .header(http::header::CONTENT_TYPE, "application/json");
    if let Some(token) = bearer {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn health_returns_200() {
    let app = build_app(CatalogSnapshot::empty());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn s1_allow_with_no_deny_present() {
    let snapshot = CatalogSnapshot::build(
        Vec::new(),
        vec![policy("p1", "alice", Effect::Allow, vec!["doc:1"], HashMap::new())],
    )
    .unwrap();
    let app = build_app(snapshot);

    let (status, body) = post_authz(
        app,
        Some("alice"),
        serde_json::json!({"subject": "users:alice", "action": "read", "resource": "doc:1"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allowed"], true);
}

#[tokio::test]
async fn s2_explicit_deny_wins_over_allow() {
    let mut allow_everything = policy("allow-all", "alice", Effect::Allow, vec!["doc:<.*>"], HashMap::new());
    allow_everything.resources = vec!["doc:<.*>".to_owned()];
    let deny_one = policy("deny-doc1", "alice", Effect::Deny, vec!["doc:1"], HashMap::new());

    let snapshot = CatalogSnapshot::build(Vec::new(), vec![allow_everything, deny_one]).unwrap();
    let app = build_app(snapshot);

    let (status, body) = post_authz(
        app,
        Some("alice"),
        serde_json::json!({"subject": "users:alice", "action": "read", "resource": "doc:1"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allowed"], false);
    assert_eq!(body["reason"], "explicit deny");
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let app = build_app(CatalogSnapshot::empty());

    let request = Request::builder()
        .method(http::Method::POST)
        .uri("/v1/authz")
        .header(http::header::CONTENT_TYPE, "application/json")
        .header(http::header::AUTHORIZATION, "Bearer alice")
        .body(Body::from("not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_bearer_token_is_unauthorized() {
    let app = build_app(CatalogSnapshot::empty());

    let (status, _) = post_authz(
        app,
        None,
        serde_json::json!({"subject": "users:alice", "action": "read", "resource": "doc:1"}),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn owner_isolation_denies_other_users_policies() {
    let snapshot = CatalogSnapshot::build(
        Vec::new(),
        vec![policy("p1", "bob", Effect::Allow, vec!["doc:1"], HashMap::new())],
    )
    .unwrap();
    let app = build_app(snapshot);

    let (status, body) = post_authz(
        app,
        Some("alice"),
        serde_json::json!({"subject": "users:alice", "action": "read", "resource": "doc:1"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allowed"], false);
}

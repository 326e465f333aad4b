//! Integration tests for authenticated dispatch, refresh and replay

use futures::future::join_all;
use serde_json::json;
use std::rc::Rc;
use std::time::Duration;
use unify_core::tests::{CountingCredentialStore, RecordingNavigator};
use unify_core::{AuthError, CredentialStore, RefreshState, SessionConfig, TokenPair};
use unify_http::client::{ApiRequest, SessionClient, error::ClientError};
use unify_http::types::RegisterRequest;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    client: SessionClient,
    store: Rc<CountingCredentialStore>,
    navigator: Rc<RecordingNavigator>,
}

fn harness(server: &MockServer, config: SessionConfig, pair: Option<TokenPair>) -> Harness {
    let store = Rc::new(match pair {
        Some(pair) => CountingCredentialStore::with_pair(pair),
        None => CountingCredentialStore::new(),
    });
    let navigator = Rc::new(RecordingNavigator::new());
    let config = SessionConfig {
        api_base_url: server.uri(),
        ..config
    };

    let client = unify_http::connect(&config, store.clone(), navigator.clone()).unwrap();
    Harness {
        client,
        store,
        navigator,
    }
}

fn signed_in(server: &MockServer) -> Harness {
    harness(
        server,
        SessionConfig::default(),
        Some(TokenPair::new("access-0", "refresh-0")),
    )
}

fn rotated_tokens() -> serde_json::Value {
    json!({
        "access_token": "access-1",
        "refresh_token": "refresh-1",
        "token_type": "bearer",
        "expires_in": 900
    })
}

async fn mount_documents(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/documents"))
        .and(header("authorization", "Bearer access-0"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/documents"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": ["q3.pdf"]})))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_passes_through_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("authorization", "Bearer access-0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "u1"})))
        .expect(1)
        .mount(&server)
        .await;

    let h = signed_in(&server);
    let body: serde_json::Value = h.client.execute(&ApiRequest::get("/me")).await.unwrap();

    assert_eq!(body, json!({"id": "u1"}));
    assert_eq!(h.client.session().coordinator().refresh_calls(), 0);
}

#[tokio::test]
async fn test_non_401_errors_are_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/sources/s1"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"detail": "Admins only"})))
        .expect(1)
        .mount(&server)
        .await;

    let h = signed_in(&server);
    let result = h
        .client
        .execute::<serde_json::Value>(&ApiRequest::delete("/sources/s1"))
        .await;

    assert!(matches!(result, Err(ClientError::Forbidden(_))));
    assert_eq!(h.client.session().coordinator().refresh_calls(), 0);
    assert_eq!(h.navigator.redirects(), 0);
}

#[tokio::test]
async fn test_concurrent_401s_share_one_refresh() {
    let server = MockServer::start().await;

    // Each request is sent exactly twice: once with the old token, once
    // replayed with the new one.
    Mock::given(method("GET"))
        .and(path("/documents"))
        .and(header("authorization", "Bearer access-0"))
        .respond_with(ResponseTemplate::new(401))
        .expect(5)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/documents"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": ["q3.pdf"]})))
        .expect(5)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(rotated_tokens())
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let h = signed_in(&server);
    let request = ApiRequest::get("/documents");

    let results = join_all(
        (0..5).map(|_| h.client.execute::<serde_json::Value>(&request)),
    )
    .await;

    for result in results {
        assert_eq!(result.unwrap(), json!({"items": ["q3.pdf"]}));
    }
    assert_eq!(
        h.store.read(),
        Some(TokenPair::new("access-1", "refresh-1"))
    );
    assert_eq!(h.store.writes(), 1);
    assert_eq!(h.store.clears(), 0);
    assert_eq!(h.client.session().coordinator().refresh_calls(), 1);
    assert_eq!(h.client.session().coordinator().state(), RefreshState::Idle);
    assert_eq!(h.navigator.redirects(), 0);
}

#[tokio::test]
async fn test_rejected_refresh_fails_every_caller_and_redirects_once() {
    let server = MockServer::start().await;
    mount_documents(&server).await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({
                    "detail": {"error": "invalid_token", "message": "Invalid or expired refresh token."}
                }))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let h = signed_in(&server);
    let request = ApiRequest::get("/documents");

    let results = join_all((0..5).map(|_| h.client.send(&request))).await;

    for result in results {
        match result {
            Err(err) => {
                assert!(err.is_auth_expired());
                assert!(matches!(
                    err,
                    ClientError::Auth(AuthError::RefreshRejected(_))
                ));
            }
            Ok(response) => panic!("unexpected status {}", response.status()),
        }
    }
    assert_eq!(h.store.read(), None);
    assert_eq!(h.store.clears(), 1);
    assert_eq!(h.store.writes(), 0);
    assert_eq!(h.navigator.routes(), vec!["/auth/login"]);
    assert_eq!(h.client.session().coordinator().state(), RefreshState::Failed);
    assert!(!h.client.is_authenticated());
}

#[tokio::test]
async fn test_replay_401_is_not_refreshed_again() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/documents"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rotated_tokens()))
        .expect(1)
        .mount(&server)
        .await;

    let h = signed_in(&server);
    let result = h.client.send(&ApiRequest::get("/documents")).await;

    assert!(matches!(
        result,
        Err(ClientError::Auth(AuthError::ReplayFailure))
    ));
    assert_eq!(h.client.session().coordinator().refresh_calls(), 1);
}

#[tokio::test]
async fn test_401_without_credentials_is_unauthenticated() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/documents"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rotated_tokens()))
        .expect(0)
        .mount(&server)
        .await;

    let h = harness(&server, SessionConfig::default(), None);
    let result = h.client.send(&ApiRequest::get("/documents")).await;

    assert!(matches!(
        result,
        Err(ClientError::Auth(AuthError::Unauthenticated))
    ));
    assert_eq!(h.navigator.redirects(), 0);
}

#[tokio::test]
async fn test_refresh_disabled_surfaces_expiry() {
    let server = MockServer::start().await;
    mount_documents(&server).await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rotated_tokens()))
        .expect(0)
        .mount(&server)
        .await;

    let config = SessionConfig {
        refresh_on_unauthorized: false,
        ..SessionConfig::default()
    };
    let h = harness(&server, config, Some(TokenPair::new("access-0", "refresh-0")));
    let result = h.client.send(&ApiRequest::get("/documents")).await;

    assert!(matches!(
        result,
        Err(ClientError::Auth(AuthError::CredentialExpired))
    ));
    assert_eq!(h.store.read(), Some(TokenPair::new("access-0", "refresh-0")));
}

#[tokio::test]
async fn test_late_401_replays_with_current_token() {
    let server = MockServer::start().await;

    // The first request is slow, so its 401 arrives after another request
    // has already rotated the credential.
    Mock::given(method("GET"))
        .and(path("/reports"))
        .and(header("authorization", "Bearer access-0"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/reports"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .mount(&server)
        .await;

    mount_documents(&server).await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rotated_tokens()))
        .expect(1)
        .mount(&server)
        .await;

    let h = signed_in(&server);
    let reports = ApiRequest::get("/reports");
    let documents = ApiRequest::get("/documents");

    let (slow, fast) = futures::join!(
        h.client.execute::<serde_json::Value>(&reports),
        h.client.execute::<serde_json::Value>(&documents),
    );

    assert_eq!(fast.unwrap(), json!({"items": ["q3.pdf"]}));
    assert_eq!(slow.unwrap(), json!({"items": []}));
    assert_eq!(h.client.session().coordinator().refresh_calls(), 1);
}

#[tokio::test]
async fn test_refresh_keeps_refresh_token_when_omitted() {
    let server = MockServer::start().await;
    mount_documents(&server).await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let h = signed_in(&server);
    h.client
        .execute::<serde_json::Value>(&ApiRequest::get("/documents"))
        .await
        .unwrap();

    assert_eq!(
        h.store.read(),
        Some(TokenPair::new("access-1", "refresh-0"))
    );
}

#[tokio::test]
async fn test_register_establishes_session_after_failure() {
    let server = MockServer::start().await;
    mount_documents(&server).await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "user": {"id": "u2", "email": "grace@example.com", "role": "admin", "org_id": "o2"},
            "organization": {"id": "o2", "name": "Navy", "slug": "navy"},
            "tokens": {"access_token": "access-1", "refresh_token": "refresh-1"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let h = signed_in(&server);
    let request = ApiRequest::get("/documents");

    assert!(h.client.send(&request).await.is_err());
    assert_eq!(h.client.session().coordinator().state(), RefreshState::Failed);
    assert_eq!(h.navigator.redirects(), 1);

    h.client
        .register(&RegisterRequest {
            email: "grace@example.com".to_string(),
            password: "cobol-1959".to_string(),
            full_name: "Grace Hopper".to_string(),
            company_name: "Navy".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(h.client.session().coordinator().state(), RefreshState::Idle);
    assert!(!h.client.session().guard().has_fired());
    let body: serde_json::Value = h.client.execute(&request).await.unwrap();
    assert_eq!(body, json!({"items": ["q3.pdf"]}));
}

#[tokio::test]
async fn test_sign_out_clears_and_redirects() {
    let server = MockServer::start().await;
    let h = signed_in(&server);

    assert!(h.client.is_authenticated());
    h.client.sign_out();

    assert!(!h.client.is_authenticated());
    assert_eq!(h.navigator.routes(), vec!["/auth/login"]);
}

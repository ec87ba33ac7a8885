//! End-to-end gateway tests over real HTTP.
//!
//! The reqwest adapters talk to an in-process axum backend that issues,
//! rotates and revokes tokens the way the production API does.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tempfile::{TempDir, tempdir};

use tollgate_application::{
    CredentialRefresher, GatewayError, GatewayOptions, HttpClientError, Login, RefreshCoordinator,
    RequestGateway, SessionEvents, TokenStore,
};
use tollgate_domain::{ApiRequest, AuthError, Credentials, TokenPool};
use tollgate_infrastructure::{
    FileSessionStorage, ReqwestHttpClient, RestTokenEndpoint, SystemClock, TokioFileSystem,
};

/// Token state of the fake backend.
struct Backend {
    access: Mutex<String>,
    refresh: Mutex<String>,
    issued: AtomicUsize,
    refresh_calls: AtomicUsize,
}

impl Backend {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            access: Mutex::new(String::new()),
            refresh: Mutex::new(String::new()),
            issued: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
        })
    }

    fn issue(&self) -> Value {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let access = format!("access-{n}");
        let refresh = format!("refresh-{n}");
        *self.access.lock().unwrap() = access.clone();
        *self.refresh.lock().unwrap() = refresh.clone();
        json!({ "accessToken": access, "refreshToken": refresh, "expiresIn": 3600 })
    }

    /// Invalidates the access token server-side; the refresh token stays valid.
    fn expire_access(&self) {
        *self.access.lock().unwrap() = "revoked".to_string();
    }

    fn revoke_refresh(&self) {
        *self.refresh.lock().unwrap() = "revoked".to_string();
        self.expire_access();
    }

    fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }
}

async fn token(
    State(backend): State<Arc<Backend>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if body["password"] == "secret" {
        (StatusCode::OK, Json(backend.issue()))
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "bad credentials" })),
        )
    }
}

async fn refresh(
    State(backend): State<Arc<Backend>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    backend.refresh_calls.fetch_add(1, Ordering::SeqCst);
    // Slow enough for concurrent callers to pile up behind one refresh.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let current = backend.refresh.lock().unwrap().clone();
    if body["refreshToken"] == current.as_str() {
        (StatusCode::OK, Json(backend.issue()))
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "refresh token revoked" })),
        )
    }
}

async fn firms(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let expected = format!("Bearer {}", backend.access.lock().unwrap());
    let presented = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if presented == expected {
        (StatusCode::OK, Json(json!({ "firms": ["Acme", "Globex"] })))
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "invalid token" })),
        )
    }
}

async fn maintenance() -> (StatusCode, Json<Value>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "message": "down for maintenance" })),
    )
}

async fn spawn_backend(backend: Arc<Backend>) -> SocketAddr {
    let app = Router::new()
        .route("/auth/token", post(token))
        .route("/auth/refresh", post(refresh))
        .route("/firms", get(firms))
        .route("/maintenance", get(maintenance))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

struct Client {
    _dir: TempDir,
    session_file: std::path::PathBuf,
    store: Arc<TokenStore>,
    login: Login,
    gateway: Arc<RequestGateway<ReqwestHttpClient>>,
}

async fn client_for(addr: SocketAddr) -> Client {
    let dir = tempdir().expect("Failed to create temp directory");
    let pool = TokenPool::General;

    let http = Arc::new(
        ReqwestHttpClient::new(format!("http://{addr}").parse().unwrap()).unwrap(),
    );
    let endpoint = Arc::new(RestTokenEndpoint::new(http.clone(), pool));
    let storage = Arc::new(FileSessionStorage::new(TokioFileSystem::new(), dir.path()));
    let session_file = storage.record_path(pool.storage_key()).unwrap();
    let clock = Arc::new(SystemClock);
    let events = SessionEvents::default();

    let store = Arc::new(TokenStore::new(pool, storage, clock.clone()));
    store.load().await.unwrap();

    let coordinator = Arc::new(
        RefreshCoordinator::new(
            store.clone(),
            CredentialRefresher::new(endpoint.clone(), clock),
            events.clone(),
        )
        .with_refresh_timeout(Duration::from_secs(5)),
    );
    let login = Login::new(endpoint, store.clone(), events.clone());
    let gateway = Arc::new(RequestGateway::new(
        http,
        coordinator,
        events,
        GatewayOptions::for_pool(pool),
    ));

    Client {
        _dir: dir,
        session_file,
        store,
        login,
        gateway,
    }
}

fn credentials() -> Credentials {
    Credentials::new("ada@example.com", "secret")
}

#[tokio::test]
async fn test_login_then_request() {
    let backend = Backend::new();
    let client = client_for(spawn_backend(backend.clone()).await).await;

    client.login.execute(Some(&credentials())).await.unwrap();
    assert!(client.session_file.exists());

    let response = client.gateway.send(&ApiRequest::get("/firms")).await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.data["firms"][0], "Acme");
    assert_eq!(backend.refresh_calls(), 0);
}

#[tokio::test]
async fn test_bad_credentials_rejected() {
    let backend = Backend::new();
    let client = client_for(spawn_backend(backend).await).await;

    let result = client
        .login
        .execute(Some(&Credentials::new("ada@example.com", "wrong")))
        .await;

    let error = result.unwrap_err();
    assert!(error.to_string().contains("bad credentials"));
    assert!(client.store.get().is_empty());
    assert!(!client.session_file.exists());
}

#[tokio::test]
async fn test_rejected_token_is_refreshed_and_retried() {
    let backend = Backend::new();
    let client = client_for(spawn_backend(backend.clone()).await).await;
    client.login.execute(Some(&credentials())).await.unwrap();

    backend.expire_access();
    let response = client.gateway.send(&ApiRequest::get("/firms")).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(backend.refresh_calls(), 1);
    assert_eq!(client.store.get().access_token.as_deref(), Some("access-2"));

    let persisted = std::fs::read_to_string(&client.session_file).unwrap();
    assert!(persisted.contains("access-2"));
    assert!(persisted.contains("refresh-2"));
}

#[tokio::test]
async fn test_concurrent_requests_refresh_once() {
    let backend = Backend::new();
    let client = client_for(spawn_backend(backend.clone()).await).await;
    client.login.execute(Some(&credentials())).await.unwrap();
    backend.expire_access();

    let requests: Vec<_> = (0..5)
        .map(|_| {
            let gateway = client.gateway.clone();
            tokio::spawn(async move { gateway.send(&ApiRequest::get("/firms")).await })
        })
        .collect();

    for request in requests {
        assert_eq!(request.await.unwrap().unwrap().status, 200);
    }
    assert_eq!(backend.refresh_calls(), 1);
}

#[tokio::test]
async fn test_revoked_refresh_token_ends_session() {
    let backend = Backend::new();
    let client = client_for(spawn_backend(backend.clone()).await).await;
    client.login.execute(Some(&credentials())).await.unwrap();

    backend.revoke_refresh();
    let error = client
        .gateway
        .send(&ApiRequest::get("/firms"))
        .await
        .unwrap_err();

    match error {
        GatewayError::SessionEnded {
            reason: AuthError::RefreshRejected { message },
            redirect_to,
        } => {
            assert!(message.contains("refresh token revoked"));
            assert_eq!(redirect_to, "/login?session=expired");
        }
        other => panic!("expected SessionEnded, got {other:?}"),
    }
    assert!(client.store.get().is_empty());
    assert!(!client.session_file.exists());
}

#[tokio::test]
async fn test_server_errors_pass_through() {
    let backend = Backend::new();
    let client = client_for(spawn_backend(backend.clone()).await).await;
    client.login.execute(Some(&credentials())).await.unwrap();

    let response = client
        .gateway
        .send(&ApiRequest::get("/maintenance"))
        .await
        .unwrap();

    assert_eq!(response.status, 503);
    assert_eq!(response.data["message"], "down for maintenance");
    assert_eq!(backend.refresh_calls(), 0);
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(addr).await;
    let error = client
        .gateway
        .send(&ApiRequest::get("/firms"))
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        GatewayError::Transport(
            HttpClientError::ConnectionRefused { .. } | HttpClientError::ConnectionFailed(_)
        )
    ));
}

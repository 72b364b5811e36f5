//! End-to-end flows against an in-process fake credential service.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header};
use serde_json::{Value, json};

use storefront_auth::Claims;
use storefront_client::{
    AccessDecision, AdminAware, ClientConfig, CredentialClient, CredentialError, DenialReason,
    Destination, FileStore, FormError, KeyValueStore, LoginForm, MemoryStore, NoticeQueue,
    RegistrationForm, SessionGate, SessionRecord, StayOnPage, prompt_channel, register_and_sign_in,
    sign_in,
};
use storefront_core::{Severity, SystemClock};

const PASSWORD: &str = "correct-horse";

#[derive(Clone, Default)]
struct FakeService {
    accounts: Arc<Mutex<HashMap<String, String>>>,
}

fn mint(email: &str, roles: &str, ttl_secs: i64) -> String {
    let claims = Claims {
        sub: Some(email.to_string()),
        roles: Some(roles.to_string()),
        exp: Some(Utc::now().timestamp() + ttl_secs),
    };
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"server-side-secret"),
    )
    .expect("failed to encode jwt")
}

async fn login(State(service): State<FakeService>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default();

    if email == "boom@example.com" {
        return (StatusCode::BAD_GATEWAY, "<html>upstream exploded</html>").into_response();
    }
    if email == "garbage@example.com" {
        return Json(json!({ "token": "not-a-jwt" })).into_response();
    }

    let registered = service.accounts.lock().unwrap().get(&email).cloned();
    let known = registered.as_deref() == Some(password)
        || (password == PASSWORD && email.ends_with("@example.com"));
    if !known {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Bad credentials" })),
        )
            .into_response();
    }

    let roles = if email.starts_with("admin") {
        "ROLE_USER, ROLE_ADMIN"
    } else {
        "ROLE_USER"
    };
    let token = mint(&email, roles, 600);
    Json(json!({ "token": token, "roles": roles, "exp": Utc::now().timestamp() + 600 })).into_response()
}

async fn register(State(service): State<FakeService>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default().to_string();

    if body["fullName"].as_str().unwrap_or_default().is_empty() {
        return (StatusCode::BAD_REQUEST, Json(json!({ "message": "fullName is required" })))
            .into_response();
    }

    let mut accounts = service.accounts.lock().unwrap();
    if email == "taken@example.com" || accounts.contains_key(&email) {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "message": "Email already registered" })),
        )
            .into_response();
    }
    accounts.insert(email, password);
    StatusCode::CREATED.into_response()
}

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let app = Router::new()
            .route("/auth/login", post(login))
            .route("/user/register", post(register))
            .with_state(FakeService::default());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn client(&self) -> CredentialClient {
        CredentialClient::new(&config(&self.base_url)).unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn config(api_url: &str) -> ClientConfig {
    ClientConfig {
        api_url: api_url.to_string(),
        session_file: std::env::temp_dir().join("storefront-unused.json"),
        request_timeout: Duration::from_secs(5),
    }
}

fn memory_gate() -> (SessionGate<Arc<MemoryStore>>, Arc<MemoryStore>, Arc<NoticeQueue>) {
    let store = Arc::new(MemoryStore::new());
    let notices = Arc::new(NoticeQueue::new());
    let (trigger, _listener) = prompt_channel();
    let gate = SessionGate::new(Arc::clone(&store), SystemClock, notices.clone(), trigger);
    (gate, store, notices)
}

fn login_form(email: &str, password: &str, remember_me: bool) -> LoginForm {
    LoginForm {
        email: email.to_string(),
        password: password.to_string(),
        remember_me,
    }
}

#[tokio::test]
async fn sign_in_opens_session_and_persists_record() {
    let server = TestServer::spawn().await;
    let client = server.client();
    let (mut gate, store, notices) = memory_gate();

    let outcome = sign_in(&client, &mut gate, &login_form("ivy@example.com", PASSWORD, true))
        .await
        .unwrap();

    assert_eq!(outcome.email(), Some("ivy@example.com"));
    assert_eq!(outcome.destination(&AdminAware), Destination::Stay);
    assert!(gate.state().is_authenticated);
    assert!(gate.can_access(false).is_allowed());
    assert_eq!(
        gate.can_access(true),
        AccessDecision::Deny(DenialReason::Forbidden)
    );

    let record = SessionRecord::load(&store).unwrap();
    assert_eq!(record.user.email.as_deref(), Some("ivy@example.com"));
    assert!(record.is_logged_in);
    assert_eq!(gate.remembered_email().as_deref(), Some("ivy@example.com"));

    let severities: Vec<Severity> = notices.drain().into_iter().map(|n| n.severity).collect();
    assert_eq!(severities, vec![Severity::Success, Severity::Error]);
}

#[tokio::test]
async fn admin_sign_in_routes_to_admin_area() {
    let server = TestServer::spawn().await;
    let (mut gate, _store, _notices) = memory_gate();

    let outcome = sign_in(
        &server.client(),
        &mut gate,
        &login_form("admin@example.com", PASSWORD, false),
    )
    .await
    .unwrap();

    assert_eq!(outcome.destination(&AdminAware), Destination::AdminArea);
    assert!(gate.can_access(true).is_allowed());
    assert_eq!(gate.remembered_email(), None);
}

#[tokio::test]
async fn rejected_login_surfaces_server_message_and_keeps_anonymous() {
    let server = TestServer::spawn().await;
    let (mut gate, store, _notices) = memory_gate();

    let err = sign_in(
        &server.client(),
        &mut gate,
        &login_form("ivy@example.com", "wrong", false),
    )
    .await
    .unwrap_err();

    assert_eq!(
        err,
        FormError::Service(CredentialError::Rejected {
            status: 401,
            message: Some("Bad credentials".to_string()),
        })
    );
    assert_eq!(err.inline_message(), "Bad credentials");
    assert!(!gate.state().is_authenticated);
    assert!(store.is_empty());
}

#[tokio::test]
async fn uninformative_error_body_falls_back_to_generic_message() {
    let server = TestServer::spawn().await;
    let (mut gate, _store, _notices) = memory_gate();

    let err = sign_in(
        &server.client(),
        &mut gate,
        &login_form("boom@example.com", PASSWORD, false),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        FormError::Service(CredentialError::Rejected { status: 502, message: None })
    ));
    assert_eq!(err.inline_message(), "Something went wrong. Please try again.");
}

#[tokio::test]
async fn unusable_token_from_server_is_refused() {
    let server = TestServer::spawn().await;
    let (mut gate, store, _notices) = memory_gate();

    let err = sign_in(
        &server.client(),
        &mut gate,
        &login_form("garbage@example.com", PASSWORD, false),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, FormError::Session(_)));
    assert!(!gate.state().is_authenticated);
    assert!(store.is_empty());
}

#[tokio::test]
async fn invalid_form_never_reaches_the_network() {
    // Nothing listens here; validation must fail first.
    let client = CredentialClient::new(&config("http://127.0.0.1:9")).unwrap();
    let (mut gate, _store, _notices) = memory_gate();

    let err = sign_in(&client, &mut gate, &login_form("not-an-email", PASSWORD, false))
        .await
        .unwrap_err();

    assert_eq!(err.inline_message(), "Please enter a valid email address.");
}

#[tokio::test]
async fn unreachable_service_is_a_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = CredentialClient::new(&config(&format!("http://{addr}"))).unwrap();
    let (mut gate, _store, _notices) = memory_gate();

    let err = sign_in(&client, &mut gate, &login_form("ivy@example.com", PASSWORD, false))
        .await
        .unwrap_err();

    assert!(matches!(err, FormError::Service(CredentialError::Network(_))));
    assert!(err.inline_message().contains("Unable to reach the server"));
}

#[tokio::test]
async fn registration_auto_logs_in() {
    let server = TestServer::spawn().await;
    let client = server.client();
    let (mut gate, _store, notices) = memory_gate();

    let form = RegistrationForm {
        full_name: "Jun Park".to_string(),
        email: "jun@shop.io".to_string(),
        password: "s3cret!".to_string(),
    };
    let outcome = register_and_sign_in(&client, &mut gate, &form).await.unwrap();

    assert_eq!(outcome.email(), Some("jun@shop.io"));
    assert_eq!(outcome.destination(&StayOnPage), Destination::Stay);
    assert!(gate.can_access(false).is_allowed());
    assert_eq!(notices.drain().len(), 2);

    let again = register_and_sign_in(&client, &mut gate, &form).await.unwrap_err();
    assert_eq!(again.inline_message(), "Email already registered");
}

#[tokio::test]
async fn registration_keeps_the_remembered_email() {
    let server = TestServer::spawn().await;
    let client = server.client();
    let (mut gate, _store, _notices) = memory_gate();

    sign_in(&client, &mut gate, &login_form("ivy@example.com", PASSWORD, true))
        .await
        .unwrap();

    let form = RegistrationForm {
        full_name: "Lea Moss".to_string(),
        email: "lea@shop.io".to_string(),
        password: "hunter22".to_string(),
    };
    register_and_sign_in(&client, &mut gate, &form).await.unwrap();

    assert_eq!(gate.state().user_email.as_deref(), Some("lea@shop.io"));
    assert_eq!(gate.remembered_email().as_deref(), Some("ivy@example.com"));
}

#[tokio::test]
async fn file_backed_session_survives_restart_until_logout() {
    let server = TestServer::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storefront").join("session.json");

    {
        let store = FileStore::open(&path).unwrap();
        let (trigger, _listener) = prompt_channel();
        let mut gate = SessionGate::new(store, SystemClock, Arc::new(NoticeQueue::new()), trigger);
        sign_in(
            &server.client(),
            &mut gate,
            &login_form("admin@example.com", PASSWORD, true),
        )
        .await
        .unwrap();
    }

    let store = FileStore::open(&path).unwrap();
    let (trigger, _listener) = prompt_channel();
    let mut gate = SessionGate::new(store, SystemClock, Arc::new(NoticeQueue::new()), trigger);

    assert!(gate.state().is_authenticated);
    assert_eq!(gate.state().user_email.as_deref(), Some("admin@example.com"));
    assert!(gate.can_access(true).is_allowed());

    gate.logout();
    assert_eq!(gate.store().get("storefront.session"), None);
    assert_eq!(gate.remembered_email(), None);

    let reopened = FileStore::open(&path).unwrap();
    assert_eq!(SessionRecord::load(&reopened), None);
}

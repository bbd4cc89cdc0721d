//! Tests for the HTTP data service client against a fake hosted service.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Map, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;
use uuid::Uuid;

use alumni_connect::auth::{SessionState, SessionStore, SignUpRequest};
use alumni_connect::db::Role;
use alumni_connect::events::EventService;
use alumni_connect::jobs::{JobKind, JobService};
use alumni_connect::remote::{StoredSession, TokenStore};
use alumni_connect::{
    AlumniError, DataService, Identity, RemoteError, RestDataService, SignUpOutcome, Table,
};

const USER_ID: &str = "5f2b6c1e-8a47-4b8e-9c3e-2a1d7e6f9b10";
const EMAIL: &str = "alice@alumni.test";
const PASSWORD: &str = "password123";

/// Sign-up with this email gets a session right away.
const NEW_USER_ID: &str = "0c1d2e3f-4a5b-4c6d-8e7f-9a0b1c2d3e4f";
const NEW_EMAIL: &str = "bob@alumni.test";

/// Sign-up with this email waits for confirmation.
const PENDING_USER_ID: &str = "7a8b9c0d-1e2f-4a3b-9c4d-5e6f7a8b9c0d";
const PENDING_EMAIL: &str = "carol@alumni.test";

#[derive(Clone, Default)]
struct FakeState {
    queries: Arc<Mutex<Vec<String>>>,
    /// Profile rows posted, with the bearer they were posted under.
    created_profiles: Arc<Mutex<Vec<(String, Value)>>>,
}

fn tokens(access: &str, refresh: &str) -> Value {
    json!({
        "access_token": access,
        "refresh_token": refresh,
        "user": { "id": USER_ID, "email": EMAIL },
    })
}

async fn token(Query(params): Query<HashMap<String, String>>, Json(body): Json<Value>) -> Response {
    match params.get("grant_type").map(String::as_str) {
        Some("password") if body["password"] == PASSWORD => {
            Json(tokens("access-1", "refresh-1")).into_response()
        }
        Some("refresh_token") if body["refresh_token"] == "refresh-1" => {
            Json(tokens("access-2", "refresh-2")).into_response()
        }
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials",
            })),
        )
            .into_response(),
    }
}

async fn user(headers: HeaderMap) -> Response {
    let bearer = bearer(&headers);
    if bearer == "Bearer access-1" || bearer == "Bearer access-2" {
        Json(json!({ "id": USER_ID, "email": EMAIL })).into_response()
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({ "msg": "invalid JWT" }))).into_response()
    }
}

async fn logout() -> StatusCode {
    StatusCode::NO_CONTENT
}

fn bearer(headers: &HeaderMap) -> String {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn signup(Json(body): Json<Value>) -> Response {
    match body["email"].as_str() {
        Some(EMAIL) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "code": 400, "msg": "User already registered" })),
        )
            .into_response(),
        Some(PENDING_EMAIL) => Json(json!({
            "id": PENDING_USER_ID,
            "email": PENDING_EMAIL,
            "confirmation_sent_at": "2024-01-01T00:00:00Z",
        }))
        .into_response(),
        Some(email) => Json(json!({
            "access_token": "access-new",
            "refresh_token": "refresh-new",
            "user": { "id": NEW_USER_ID, "email": email },
        }))
        .into_response(),
        None => StatusCode::UNPROCESSABLE_ENTITY.into_response(),
    }
}

async fn profiles(State(state): State<FakeState>, RawQuery(query): RawQuery) -> Json<Value> {
    state
        .queries
        .lock()
        .unwrap()
        .push(query.unwrap_or_default());
    Json(json!([{
        "id": Uuid::new_v4(),
        "user_id": USER_ID,
        "full_name": "Alice",
        "email": EMAIL,
        "role": "student",
        "is_approved": true,
        "created_at": "2024-01-01T00:00:00Z",
    }]))
}

async fn create_profile(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state
        .created_profiles
        .lock()
        .unwrap()
        .push((bearer(&headers), body.clone()));
    body["id"] = json!(Uuid::new_v4());
    body["created_at"] = json!("2024-01-01T00:00:00Z");
    (StatusCode::CREATED, Json(json!([body])))
}

/// Rows as the hosted service returns them when optional columns are unset.
async fn events() -> Json<Value> {
    Json(json!([
        {
            "id": Uuid::new_v4(),
            "title": "Open house",
            "description": null,
            "event_date": "2030-06-01T18:00:00Z",
            "location": null,
            "capacity": null,
            "registration_count": null,
            "image_url": null,
            "created_by": null,
            "created_at": "2024-01-01T00:00:00Z",
        },
        {
            "id": Uuid::new_v4(),
            "title": "Reunion",
            "description": "Annual meetup",
            "event_date": "2030-07-01T18:00:00Z",
            "location": "Main Hall",
            "capacity": 50,
            "registration_count": 3,
            "image_url": null,
            "created_by": USER_ID,
            "created_at": "2024-01-01T00:00:00Z",
        },
    ]))
}

async fn jobs() -> Json<Value> {
    Json(json!([{
        "id": Uuid::new_v4(),
        "title": "Backend Engineer",
        "company": "Acme",
        "description": null,
        "type": "internship",
        "location": null,
        "salary_range": null,
        "requirements": null,
        "posted_by": null,
        "is_active": true,
        "created_at": "2024-01-01T00:00:00Z",
    }]))
}

async fn duplicate_registration() -> Response {
    (
        StatusCode::CONFLICT,
        Json(json!({ "code": "23505", "message": "duplicate key value" })),
    )
        .into_response()
}

async fn start_server() -> (String, FakeState) {
    let state = FakeState::default();
    let app = Router::new()
        .route("/auth/v1/token", post(token))
        .route("/auth/v1/user", get(user))
        .route("/auth/v1/logout", post(logout))
        .route("/auth/v1/signup", post(signup))
        .route("/rest/v1/profiles", get(profiles).post(create_profile))
        .route("/rest/v1/events", get(events))
        .route("/rest/v1/jobs", get(jobs))
        .route("/rest/v1/event_registrations", post(duplicate_registration))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), state)
}

fn client(url: &str, token_store: TokenStore) -> RestDataService {
    RestDataService::new(url, "anon-key", Duration::from_secs(5), token_store).unwrap()
}

#[tokio::test]
async fn test_sign_in_persists_and_restores_session() {
    let (url, _state) = start_server().await;
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");

    let service = client(&url, TokenStore::new(&path));
    let identity = service.sign_in(EMAIL, PASSWORD).await.unwrap();
    assert_eq!(identity.id.to_string(), USER_ID);
    assert!(path.exists());

    // A fresh client picks the session up from disk.
    let restored = client(&url, TokenStore::new(&path));
    let current = restored.get_current_session().await.unwrap();
    assert_eq!(current.map(|i| i.id), Some(identity.id));

    restored.sign_out().await.unwrap();
    assert!(restored.current_identity().await.is_none());
    assert!(!path.exists());
}

#[tokio::test]
async fn test_invalid_credentials() {
    let (url, _state) = start_server().await;
    let service = client(&url, TokenStore::disabled());

    let result = service.sign_in(EMAIL, "wrong-password").await;
    assert_eq!(result, Err(RemoteError::InvalidCredentials));
    assert!(service.current_identity().await.is_none());
}

#[tokio::test]
async fn test_sign_up_email_taken() {
    let (url, _state) = start_server().await;
    let service = client(&url, TokenStore::disabled());

    let result = service.sign_up(EMAIL, PASSWORD).await;
    assert_eq!(result, Err(RemoteError::EmailTaken));
}

#[tokio::test]
async fn test_stale_access_token_is_refreshed() {
    let (url, _state) = start_server().await;
    let dir = TempDir::new().unwrap();
    let token_store = TokenStore::new(dir.path().join("session.json"));
    token_store
        .save(&StoredSession {
            access_token: "stale".to_string(),
            refresh_token: "refresh-1".to_string(),
            user: Identity {
                id: USER_ID.parse().unwrap(),
                email: EMAIL.to_string(),
            },
        })
        .await
        .unwrap();

    let service = client(&url, token_store.clone());
    let identity = service.get_current_session().await.unwrap().unwrap();
    assert_eq!(identity.id.to_string(), USER_ID);

    let saved = token_store.load().await.unwrap();
    assert_eq!(saved.access_token, "access-2");
    assert_eq!(saved.refresh_token, "refresh-2");
}

#[tokio::test]
async fn test_unique_violation_is_reported() {
    let (url, _state) = start_server().await;
    let service = client(&url, TokenStore::disabled());
    service.sign_in(EMAIL, PASSWORD).await.unwrap();

    let mut row = Map::new();
    row.insert("event_id".to_string(), json!(Uuid::new_v4()));
    row.insert("user_id".to_string(), json!(USER_ID));
    let result = service.insert(Table::EventRegistrations, row).await;
    assert_eq!(result, Err(RemoteError::UniqueViolation(Table::EventRegistrations)));
}

#[tokio::test]
async fn test_session_store_over_http() {
    let (url, state) = start_server().await;
    let store = SessionStore::new(client(&url, TokenStore::disabled()));
    store.restore_session().await.unwrap();
    assert_eq!(store.snapshot().state(), SessionState::Anonymous);

    let profile = store.sign_in(EMAIL, PASSWORD).await.unwrap();
    assert_eq!(profile.role(), Role::Student);
    assert!(store.snapshot().is_authenticated());

    let queries = state.queries.lock().unwrap().clone();
    assert_eq!(queries.len(), 1);
    assert!(queries[0].contains(&format!("user_id=eq.{USER_ID}")));
    assert!(queries[0].contains("limit=1"));
}

#[tokio::test]
async fn test_sign_up_starts_session() {
    let (url, _state) = start_server().await;
    let service = client(&url, TokenStore::disabled());

    let outcome = service.sign_up(NEW_EMAIL, PASSWORD).await.unwrap();
    assert!(outcome.has_session());
    assert_eq!(outcome.identity().id.to_string(), NEW_USER_ID);
    assert_eq!(
        service.current_identity().await.map(|i| i.email),
        Some(NEW_EMAIL.to_string())
    );
}

#[tokio::test]
async fn test_sign_up_confirmation_pending_has_no_session() {
    let (url, _state) = start_server().await;
    let service = client(&url, TokenStore::disabled());

    let outcome = service.sign_up(PENDING_EMAIL, PASSWORD).await.unwrap();
    assert!(matches!(outcome, SignUpOutcome::ConfirmationPending(ref i) if i.email == PENDING_EMAIL));
    assert!(service.current_identity().await.is_none());
}

#[tokio::test]
async fn test_session_store_sign_up_over_http() {
    let (url, state) = start_server().await;
    let store = SessionStore::new(client(&url, TokenStore::disabled()));

    let request = SignUpRequest::new(NEW_EMAIL, PASSWORD, "Bob", Role::Alumni).with_batch("2019");
    let profile = store.sign_up(request).await.unwrap();
    assert_eq!(profile.user_id.to_string(), NEW_USER_ID);
    assert_eq!(profile.role(), Role::Alumni);
    assert!(profile.is_pending());

    let snapshot = store.snapshot();
    assert_eq!(snapshot.state(), SessionState::Authenticated);
    assert_eq!(snapshot.profile(), Some(&profile));

    let created = state.created_profiles.lock().unwrap().clone();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].0, "Bearer access-new");
    assert_eq!(created[0].1["user_id"], json!(NEW_USER_ID));
    assert_eq!(created[0].1["batch"], json!("2019"));
}

#[tokio::test]
async fn test_session_store_sign_up_confirmation_pending() {
    let (url, state) = start_server().await;
    let store = SessionStore::new(client(&url, TokenStore::disabled()));
    store.restore_session().await.unwrap();

    let result = store
        .sign_up(SignUpRequest::new(PENDING_EMAIL, PASSWORD, "Carol", Role::Student))
        .await;
    let err = result.unwrap_err();
    assert!(matches!(err, AlumniError::ConfirmationPending(id) if id.to_string() == PENDING_USER_ID));
    assert_eq!(
        err.to_string(),
        format!("email confirmation pending for user {PENDING_USER_ID}")
    );

    let snapshot = store.snapshot();
    assert_eq!(snapshot.state(), SessionState::Anonymous);
    assert!(snapshot.identity().is_none());
    assert!(store.service().current_identity().await.is_none());

    // The profile row is still created, under the anonymous key.
    let created = state.created_profiles.lock().unwrap().clone();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].0, "Bearer anon-key");
    assert_eq!(created[0].1["user_id"], json!(PENDING_USER_ID));
}

#[tokio::test]
async fn test_session_store_sign_up_email_taken() {
    let (url, state) = start_server().await;
    let store = SessionStore::new(client(&url, TokenStore::disabled()));

    let result = store
        .sign_up(SignUpRequest::new(EMAIL, PASSWORD, "Alice", Role::Student))
        .await;
    assert!(matches!(result, Err(AlumniError::Auth(ref m)) if m == "email already registered"));
    assert!(state.created_profiles.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_events_and_jobs_with_null_columns() {
    let (url, _state) = start_server().await;
    let store = SessionStore::new(client(&url, TokenStore::disabled()));
    store.sign_in(EMAIL, PASSWORD).await.unwrap();

    let events = EventService::new(&store)
        .list_upcoming(chrono::Utc::now())
        .await
        .unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].description, None);
    assert_eq!(events[0].location, None);
    assert_eq!(events[0].spots_left(), None);
    assert_eq!(events[1].location.as_deref(), Some("Main Hall"));
    assert_eq!(events[1].spots_left(), Some(47));

    let jobs = JobService::new(&store).list_active().await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].kind, JobKind::Internship);
    assert_eq!(jobs[0].description, None);
    assert!(jobs[0].location.is_none());
}

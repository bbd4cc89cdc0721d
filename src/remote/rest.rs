//! HTTP client for the hosted data service.
//!
//! Authentication goes through the `/auth/v1` endpoints (sign-up, password
//! and refresh-token grants, user lookup, logout); tables are reached under
//! `/rest/v1/<table>` with filters encoded as `column=op.value`.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use super::{
    AuthChange, DataService, Identity, Query, RemoteError, Row, SignUpOutcome, StoredSession, Table,
    TokenStore,
};
use crate::config::RemoteConfig;
use crate::error::{AlumniError, Result};

/// Connect timeout in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// User agent sent with every request.
const USER_AGENT: &str = concat!("alumni-connect/", env!("CARGO_PKG_VERSION"));

/// Postgres error code for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

const EVENT_CAPACITY: usize = 16;

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

impl From<AuthUser> for Identity {
    fn from(user: AuthUser) -> Self {
        Identity {
            id: user.id,
            email: user.email.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    user: AuthUser,
}

/// Sign-up answers with a session, or with a bare user when the service
/// requires email confirmation first.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    User(AuthUser),
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<Value>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ErrorBody {
    fn describe(&self, status: StatusCode) -> String {
        self.message
            .as_ref()
            .or(self.msg.as_ref())
            .or(self.error_description.as_ref())
            .or(self.error.as_ref())
            .cloned()
            .unwrap_or_else(|| format!("HTTP {status}"))
    }

    fn is_unique_violation(&self) -> bool {
        matches!(&self.code, Some(Value::String(code)) if code == UNIQUE_VIOLATION)
    }

    fn is_email_taken(&self) -> bool {
        matches!(
            self.error_code.as_deref(),
            Some("user_already_exists" | "email_exists")
        ) || self
            .describe(StatusCode::BAD_REQUEST)
            .to_lowercase()
            .contains("already registered")
    }

    fn is_invalid_credentials(&self) -> bool {
        self.error.as_deref() == Some("invalid_grant")
            || self.error_code.as_deref() == Some("invalid_credentials")
    }
}

async fn send(request: RequestBuilder) -> std::result::Result<Response, RemoteError> {
    request
        .send()
        .await
        .map_err(|e| RemoteError::Service(format!("request failed: {e}")))
}

async fn read_error(response: Response) -> (StatusCode, ErrorBody) {
    let status = response.status();
    let body = response.json::<ErrorBody>().await.unwrap_or_default();
    (status, body)
}

async fn read_json<T: serde::de::DeserializeOwned>(
    response: Response,
) -> std::result::Result<T, RemoteError> {
    response
        .json::<T>()
        .await
        .map_err(|e| RemoteError::Service(format!("malformed response: {e}")))
}

/// [`DataService`] backed by the hosted service's HTTP API.
pub struct RestDataService {
    client: Client,
    base_url: Url,
    anon_key: String,
    session: Mutex<Option<StoredSession>>,
    token_store: TokenStore,
    events: broadcast::Sender<AuthChange>,
}

impl RestDataService {
    /// Create a client for the service at `base_url`.
    pub fn new(
        base_url: &str,
        anon_key: impl Into<String>,
        timeout: Duration,
        token_store: TokenStore,
    ) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| AlumniError::Config(format!("invalid remote url {base_url}: {e}")))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AlumniError::Config(format!("failed to create HTTP client: {e}")))?;

        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            client,
            base_url,
            anon_key: anon_key.into(),
            session: Mutex::new(None),
            token_store,
            events,
        })
    }

    /// Create a client from the `[remote]` configuration section.
    pub fn from_config(config: &RemoteConfig) -> Result<Self> {
        let token_store = match &config.session_file {
            Some(path) => TokenStore::new(path),
            None => TokenStore::disabled(),
        };
        Self::new(
            &config.url,
            config.anon_key.clone(),
            Duration::from_secs(config.timeout_secs),
            token_store,
        )
    }

    fn url(&self, path: &str) -> std::result::Result<Url, RemoteError> {
        self.base_url
            .join(path)
            .map_err(|e| RemoteError::Service(format!("invalid endpoint {path}: {e}")))
    }

    fn emit(&self, change: AuthChange) {
        let _ = self.events.send(change);
    }

    async fn access_token(&self) -> Option<String> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    /// Build a request carrying the api key and the session token, or the
    /// api key as bearer when signed out.
    async fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let bearer = self
            .access_token()
            .await
            .unwrap_or_else(|| self.anon_key.clone());
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    async fn set_session(&self, session: Option<StoredSession>) {
        let persisted = match &session {
            Some(s) => self.token_store.save(s).await,
            None => self.token_store.clear().await,
        };
        if let Err(e) = persisted {
            warn!(error = %e, "Failed to persist session token");
        }
        *self.session.lock().await = session;
    }

    async fn start_session(&self, tokens: TokenResponse) -> Identity {
        let identity: Identity = tokens.user.into();
        self.set_session(Some(StoredSession {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            user: identity.clone(),
        }))
        .await;
        identity
    }

    /// Drop a session the service no longer accepts.
    async fn expire(&self) {
        warn!("Session token rejected by data service");
        self.set_session(None).await;
        self.emit(AuthChange::SessionExpired);
    }

    async fn refresh(&self, refresh_token: &str) -> std::result::Result<Option<Identity>, RemoteError> {
        let mut url = self.url("auth/v1/token")?;
        url.query_pairs_mut()
            .append_pair("grant_type", "refresh_token");

        let response = send(
            self.client
                .post(url)
                .header("apikey", &self.anon_key)
                .json(&json!({ "refresh_token": refresh_token })),
        )
        .await?;

        if response.status().is_success() {
            let tokens: TokenResponse = read_json(response).await?;
            let identity = self.start_session(tokens).await;
            debug!(user_id = %identity.id, "Session refreshed");
            self.emit(AuthChange::TokenRefreshed);
            return Ok(Some(identity));
        }

        let (status, body) = read_error(response).await;
        if status.is_client_error() {
            self.expire().await;
            return Ok(None);
        }
        Err(RemoteError::Service(body.describe(status)))
    }

    async fn remote_logout(&self) -> std::result::Result<(), RemoteError> {
        let url = self.url("auth/v1/logout")?;
        let response = send(self.request(Method::POST, url).await).await?;
        let status = response.status();
        // An already-invalid token means the session is gone anyway.
        if status.is_success() || status == StatusCode::UNAUTHORIZED {
            return Ok(());
        }
        let (status, body) = read_error(response).await;
        Err(RemoteError::Service(body.describe(status)))
    }

    async fn table_request(
        &self,
        method: Method,
        table: Table,
        query: &Query,
    ) -> std::result::Result<RequestBuilder, RemoteError> {
        let mut url = self.url(&format!("rest/v1/{}", table.as_str()))?;
        let mut pairs = query.to_query_pairs();
        if method == Method::GET {
            pairs.insert(0, ("select".to_string(), "*".to_string()));
        }
        if !pairs.is_empty() {
            let mut query_pairs = url.query_pairs_mut();
            for (key, value) in &pairs {
                query_pairs.append_pair(key, value);
            }
        }

        let mut request = self.request(method.clone(), url).await;
        if method != Method::GET {
            request = request.header("Prefer", "return=representation");
        }
        Ok(request)
    }

    async fn table_rows(
        &self,
        table: Table,
        response: Response,
    ) -> std::result::Result<Vec<Row>, RemoteError> {
        if response.status().is_success() {
            return read_json(response).await;
        }

        let (status, body) = read_error(response).await;
        if body.is_unique_violation() {
            return Err(RemoteError::UniqueViolation(table));
        }
        if status == StatusCode::UNAUTHORIZED {
            self.expire().await;
            return Err(RemoteError::SessionExpired);
        }
        Err(RemoteError::Service(format!(
            "{table}: {}",
            body.describe(status)
        )))
    }
}

impl DataService for RestDataService {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> std::result::Result<SignUpOutcome, RemoteError> {
        let url = self.url("auth/v1/signup")?;
        let response = send(
            self.client
                .post(url)
                .header("apikey", &self.anon_key)
                .json(&json!({ "email": email, "password": password })),
        )
        .await?;

        if !response.status().is_success() {
            let (status, body) = read_error(response).await;
            if body.is_email_taken() {
                return Err(RemoteError::EmailTaken);
            }
            return Err(RemoteError::Service(body.describe(status)));
        }

        match read_json::<SignUpResponse>(response).await? {
            SignUpResponse::Session(tokens) => {
                let identity = self.start_session(tokens).await;
                self.emit(AuthChange::SignedIn);
                Ok(SignUpOutcome::SignedIn(identity))
            }
            SignUpResponse::User(user) => {
                info!(user_id = %user.id, "Identity created without session, confirmation pending");
                Ok(SignUpOutcome::ConfirmationPending(user.into()))
            }
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> std::result::Result<Identity, RemoteError> {
        let mut url = self.url("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let response = send(
            self.client
                .post(url)
                .header("apikey", &self.anon_key)
                .json(&json!({ "email": email, "password": password })),
        )
        .await?;

        if !response.status().is_success() {
            let (status, body) = read_error(response).await;
            if body.is_invalid_credentials() {
                return Err(RemoteError::InvalidCredentials);
            }
            return Err(RemoteError::Service(body.describe(status)));
        }

        let tokens: TokenResponse = read_json(response).await?;
        let identity = self.start_session(tokens).await;
        self.emit(AuthChange::SignedIn);
        Ok(identity)
    }

    async fn sign_out(&self) -> std::result::Result<(), RemoteError> {
        let result = if self.access_token().await.is_some() {
            self.remote_logout().await
        } else {
            Ok(())
        };

        self.set_session(None).await;
        self.emit(AuthChange::SignedOut);
        result
    }

    async fn get_current_session(&self) -> std::result::Result<Option<Identity>, RemoteError> {
        let cached = self.session.lock().await.clone();
        let stored = match cached {
            Some(session) => Some(session),
            None => self.token_store.load().await,
        };
        let Some(stored) = stored else {
            return Ok(None);
        };
        *self.session.lock().await = Some(stored.clone());

        let url = self.url("auth/v1/user")?;
        let response = send(self.request(Method::GET, url).await).await?;

        let status = response.status();
        if status.is_success() {
            let identity: Identity = read_json::<AuthUser>(response).await?.into();
            self.set_session(Some(StoredSession {
                user: identity.clone(),
                ..stored
            }))
            .await;
            return Ok(Some(identity));
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            debug!("Stored access token rejected, trying refresh");
            return self.refresh(&stored.refresh_token).await;
        }

        let (status, body) = read_error(response).await;
        Err(RemoteError::Service(body.describe(status)))
    }

    async fn current_identity(&self) -> Option<Identity> {
        self.session.lock().await.as_ref().map(|s| s.user.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.events.subscribe()
    }

    async fn select(&self, table: Table, query: &Query) -> std::result::Result<Vec<Row>, RemoteError> {
        let request = self.table_request(Method::GET, table, query).await?;
        let response = send(request).await?;
        self.table_rows(table, response).await
    }

    async fn insert(&self, table: Table, row: Row) -> std::result::Result<Row, RemoteError> {
        let request = self
            .table_request(Method::POST, table, &Query::new())
            .await?
            .json(&row);
        let response = send(request).await?;
        self.table_rows(table, response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RemoteError::Service(format!("{table}: insert returned no row")))
    }

    async fn update(
        &self,
        table: Table,
        query: &Query,
        patch: Row,
    ) -> std::result::Result<Vec<Row>, RemoteError> {
        let request = self
            .table_request(Method::PATCH, table, query)
            .await?
            .json(&patch);
        let response = send(request).await?;
        self.table_rows(table, response).await
    }

    async fn delete(&self, table: Table, query: &Query) -> std::result::Result<u64, RemoteError> {
        let request = self.table_request(Method::DELETE, table, query).await?;
        let response = send(request).await?;
        Ok(self.table_rows(table, response).await?.len() as u64)
    }
}

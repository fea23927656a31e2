//! The authenticated request pipeline.
//!
//! Every call goes through the same steps: stamp the access token, send,
//! and on failure let the response interceptor decide between rejecting,
//! redirecting, or refreshing the session and replaying once.

use std::sync::Arc;
use std::time::Duration;

use dreamlog_core::TokenPair;
use futures::future::BoxFuture;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::error::ApiError;
use crate::host::{CredentialStore, MemoryCredentialStore, Navigator, NoopNavigator};
use crate::interceptor::{self, Disposition};
use crate::refresh::{RefreshCoordinator, RefreshOutcome};
use crate::request::{AUTH_REFRESH_PATH, ApiRequest, Attempt};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// User agent sent with every request.
const USER_AGENT: &str = concat!("dreamlog/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`ApiClient`].
pub struct ApiClientBuilder {
    base_url: String,
    timeout: Duration,
    credentials: Option<Arc<dyn CredentialStore>>,
    navigator: Option<Arc<dyn Navigator>>,
}

impl ApiClientBuilder {
    /// Sets the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the credential store. Defaults to an empty in-memory store.
    #[must_use]
    pub fn credentials(mut self, credentials: Arc<dyn CredentialStore>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Sets the navigation sink. Defaults to [`NoopNavigator`].
    #[must_use]
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] if the base URL is not an absolute
    /// http(s) URL, or [`ApiError::ClientBuild`] if the HTTP client cannot be
    /// created.
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let base_url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {e}", self.base_url)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl(format!(
                "unsupported scheme: {}",
                base_url.scheme()
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;

        debug!(base_url = %base_url, timeout = ?self.timeout, "API client created");

        Ok(ApiClient {
            inner: Arc::new(ClientInner {
                http,
                base_url: base_url.as_str().trim_end_matches('/').to_string(),
                credentials: self
                    .credentials
                    .unwrap_or_else(|| Arc::new(MemoryCredentialStore::new())),
                navigator: self.navigator.unwrap_or_else(|| Arc::new(NoopNavigator)),
                refresh: RefreshCoordinator::new(),
            }),
        })
    }
}

// ============================================================================
// Api Client
// ============================================================================

struct ClientInner {
    http: Client,
    base_url: String,
    credentials: Arc<dyn CredentialStore>,
    navigator: Arc<dyn Navigator>,
    refresh: RefreshCoordinator,
}

/// Client for the Dreamlog backend.
///
/// Cheap to clone; clones share the credential store and the refresh state.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .field("refresh", &self.inner.refresh)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Starts building a client for `base_url` (e.g. `http://localhost:8080/api`).
    pub fn builder(base_url: impl Into<String>) -> ApiClientBuilder {
        ApiClientBuilder {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
            credentials: None,
            navigator: None,
        }
    }

    /// Base URL requests are resolved against.
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// The credential store this client reads and writes.
    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.inner.credentials
    }

    /// The navigation sink this client reports to.
    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.inner.navigator
    }

    /// Number of refresh exchanges this client has started.
    pub fn refresh_exchanges(&self) -> u64 {
        self.inner.refresh.exchanges_started()
    }

    // ------------------------------------------------------------------------
    // Public request surface
    // ------------------------------------------------------------------------

    /// Sends `request` and decodes the (unwrapped) body as `T`.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] of the final attempt.
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let value = self.execute(request, Attempt::Initial).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Sends `request` and discards the body.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] of the final attempt.
    pub async fn send_empty(&self, request: ApiRequest) -> Result<(), ApiError> {
        self.execute(request, Attempt::Initial).await.map(drop)
    }

    /// `GET path`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(ApiRequest::get(path)).await
    }

    /// `POST path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(ApiRequest::post(path).with_json(body)?).await
    }

    /// `PUT path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(ApiRequest::put(path).with_json(body)?).await
    }

    /// `DELETE path`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(ApiRequest::delete(path)).await
    }

    // ------------------------------------------------------------------------
    // Pipeline
    // ------------------------------------------------------------------------

    /// Runs one attempt of `request` through the pipeline.
    ///
    /// Boxed because a refresh re-enters the pipeline for the exchange and a
    /// replay re-enters it for the retried call.
    fn execute(&self, request: ApiRequest, attempt: Attempt) -> BoxFuture<'_, Result<Value, ApiError>> {
        Box::pin(async move {
            let token = self.inner.credentials.access_token();
            let outbound = interceptor::authorize(&request, token.as_deref());
            let response = self.transport(&outbound, attempt).await?;

            let status = response.status();
            if status.is_success() {
                return decode_success(response).await;
            }

            let message = read_error_message(response).await;
            let error = ApiError::from_status(status, message);

            match interceptor::disposition(status, &request, attempt) {
                Disposition::RefreshAndReplay => {
                    debug!(path = %request.path(), "Access token rejected, refreshing session");
                    match self.refresh_session().await {
                        RefreshOutcome::Refreshed(token) => {
                            let replay = request.with_bearer(&token);
                            self.execute(replay, Attempt::Replay).await
                        }
                        RefreshOutcome::Failed => Err(error),
                    }
                }
                Disposition::RedirectAndReject => {
                    warn!(path = %request.path(), message = %error.user_message(), "Access denied");
                    self.inner.navigator.redirect_to_default_authenticated();
                    Err(error)
                }
                Disposition::Reject => {
                    if status == StatusCode::UNAUTHORIZED {
                        debug!(path = %request.path(), ?attempt, "Authentication rejected");
                    } else {
                        warn!(
                            status = %status,
                            path = %request.path(),
                            message = %error.user_message(),
                            "Request failed"
                        );
                    }
                    Err(error)
                }
            }
        })
    }

    /// Sends one HTTP request.
    #[instrument(skip(self, request), fields(method = %request.method(), path = %request.path()))]
    async fn transport(&self, request: &ApiRequest, attempt: Attempt) -> Result<Response, ApiError> {
        let url = self.url_for(request.path())?;
        debug!(?attempt, "Sending request");

        let mut builder = self
            .inner
            .http
            .request(request.method().clone(), url)
            .headers(request.headers().clone());
        if !request.query().is_empty() {
            builder = builder.query(request.query());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }

    /// Resolves `path` against the base URL.
    fn url_for(&self, path: &str) -> Result<Url, ApiError> {
        let joined = if path.starts_with('/') {
            format!("{}{path}", self.inner.base_url)
        } else {
            format!("{}/{path}", self.inner.base_url)
        };
        Url::parse(&joined).map_err(|e| ApiError::InvalidUrl(format!("{joined}: {e}")))
    }

    // ------------------------------------------------------------------------
    // Session refresh
    // ------------------------------------------------------------------------

    /// Refreshes the session, joining a refresh already in flight.
    ///
    /// The leader stores the new tokens on success. On failure it clears the
    /// credential store and routes to login; waiters only see the outcome.
    async fn refresh_session(&self) -> RefreshOutcome {
        self.inner
            .refresh
            .request_refresh(|| async {
                match self.exchange_refresh_token().await {
                    Ok(tokens) => {
                        let access = tokens.access_token.clone();
                        self.inner.credentials.store_tokens(tokens).await;
                        info!("Session refreshed");
                        RefreshOutcome::Refreshed(access)
                    }
                    Err(e) => {
                        warn!(error = %e, "Session refresh failed, logging out");
                        self.inner.credentials.clear().await;
                        let location = self.inner.navigator.current_location();
                        self.inner.navigator.redirect_to_login(location.as_deref());
                        RefreshOutcome::Failed
                    }
                }
            })
            .await
    }

    /// Trades the stored refresh token for a new token pair.
    async fn exchange_refresh_token(&self) -> Result<TokenPair, ApiError> {
        let Some(refresh_token) = self.inner.credentials.refresh_token() else {
            return Err(ApiError::RefreshFailed("no refresh token".to_string()));
        };

        let request = ApiRequest::post(AUTH_REFRESH_PATH)
            .with_json(&serde_json::json!({ "refreshToken": refresh_token }))?;
        let value = self
            .execute(request, Attempt::Initial)
            .await
            .map_err(|e| ApiError::RefreshFailed(e.user_message()))?;

        serde_json::from_value(value).map_err(|e| ApiError::RefreshFailed(e.to_string()))
    }
}

// ============================================================================
// Body handling
// ============================================================================

/// Reads a 2xx body and unwraps the response envelope.
async fn decode_success(response: Response) -> Result<Value, ApiError> {
    let bytes = response.bytes().await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    let body: Value = serde_json::from_slice(&bytes)?;
    Ok(interceptor::unwrap_envelope(body))
}

/// Reads the server message out of a failed response.
async fn read_error_message(response: Response) -> Option<String> {
    match response.bytes().await {
        Ok(bytes) => interceptor::error_message(&bytes),
        Err(e) => {
            debug!(error = %e, "Failed to read error body");
            None
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

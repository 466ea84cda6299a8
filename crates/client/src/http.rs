//! HTTP adapter: the single chokepoint for requests to the backend.
//!
//! - Joins paths onto the configured base URL
//! - Sends `Content-Type: application/json` by default (multipart uploads
//!   override it per request)
//! - Attaches the session token as a bearer credential
//! - Tags every request with an `X-Request-Id`
//! - On `401 Unauthorized` clears the session and navigates to the login
//!   page. No other component tears the session down in reaction to a
//!   response. Callers see [`ApiError::SessionExpired`] when a token was
//!   sent, and the server's rejection otherwise.

use std::sync::Arc;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::multipart::Form;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::navigation::{Navigator, Route};
use crate::session::SessionStore;

/// Header carrying the per-request correlation ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Client for the marketplace REST API.
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<HttpClientInner>,
}

struct HttpClientInner {
    client: reqwest::Client,
    base_url: Url,
    session: SessionStore,
    navigator: Arc<dyn Navigator>,
}

impl HttpClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client fails to build.
    pub fn new(
        config: &ClientConfig,
        session: SessionStore,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            inner: Arc::new(HttpClientInner {
                client: builder.build()?,
                base_url: config.api_base_url.clone(),
                session,
                navigator,
            }),
        })
    }

    /// The session this client authenticates with.
    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    /// `GET path?query`.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::execute`].
    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        self.execute(Method::GET, path, |req| req.query(query)).await
    }

    /// `POST path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::execute`].
    pub async fn post<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<Value> {
        self.execute(Method::POST, path, |req| req.json(body)).await
    }

    /// `POST path` with no body.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::execute`].
    pub async fn post_empty(&self, path: &str) -> Result<Value> {
        self.execute(Method::POST, path, |req| req).await
    }

    /// `PUT path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::execute`].
    pub async fn put<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<Value> {
        self.execute(Method::PUT, path, |req| req.json(body)).await
    }

    /// `DELETE path`.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::execute`].
    pub async fn delete(&self, path: &str) -> Result<Value> {
        self.execute(Method::DELETE, path, |req| req).await
    }

    /// `POST path` with a multipart form. The form's own content type
    /// replaces the JSON default.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::execute`].
    pub async fn post_multipart(&self, path: &str, form: Form) -> Result<Value> {
        self.execute(Method::POST, path, |req| req.multipart(form))
            .await
    }

    /// Send a request and decode the response body as JSON.
    ///
    /// Empty or non-JSON success bodies decode to `Value::Null`; callers
    /// normalize from there.
    ///
    /// # Errors
    ///
    /// - [`ApiError::SessionExpired`] on `401`, after the session has been
    ///   cleared and the app sent to the login page
    /// - [`ApiError::Api`] with the server's payload on other non-success statuses
    /// - [`ApiError::Transport`] when no response arrives
    async fn execute(
        &self,
        method: Method,
        path: &str,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder + Send,
    ) -> Result<Value> {
        let url = self.url(path)?;
        let request_id = Uuid::new_v4();

        let mut request = self
            .inner
            .client
            .request(method.clone(), url)
            .header(REQUEST_ID_HEADER, request_id.to_string());
        let token = self.inner.session.bearer_token();
        if let Some(token) = &token {
            request = request.bearer_auth(token.expose_secret());
        }
        let request = build(request);

        let response = request.send().await.map_err(|e| {
            warn!(%method, path, %request_id, error = %e, "Request failed without a response");
            ApiError::from(e)
        })?;
        let status = response.status();
        debug!(%method, path, %request_id, status = status.as_u16(), "Response received");

        if status == StatusCode::UNAUTHORIZED {
            warn!(%method, path, %request_id, "Backend rejected the session, signing out");
            self.inner.session.logout();
            self.inner.navigator.navigate(Route::Login);
            if token.is_some() {
                return Err(ApiError::SessionExpired);
            }
            // Anonymous 401s are credential rejections (wrong password);
            // the login form needs the server's message.
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_response(status, &body));
        }

        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                %method,
                path,
                %request_id,
                status = status.as_u16(),
                body = %body.chars().take(500).collect::<String>(),
                "Backend returned non-success status"
            );
            return Err(ApiError::from_response(status, &body));
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body).unwrap_or_else(|e| {
            warn!(path, %request_id, error = %e, "Success response is not JSON");
            Value::Null
        }))
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.inner
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidRequest(format!("{path}: {e}")))
    }
}

/// Percent-encode a single path segment.
#[must_use]
pub fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

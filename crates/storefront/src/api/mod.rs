//! Remote API client.
//!
//! A thin wrapper over `reqwest` that knows the API base URL, attaches the
//! session's bearer token to every request, and turns error bodies of the
//! form `{"message": ...}` into [`ApiError`]s that keep the server's wording.
//!
//! Every call is attempted once; there is no retry or backoff.

mod error;

pub use error::ApiError;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::session::SessionStore;

/// Error body returned by the API. `message` is a string, or a list of
/// validation messages.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<ErrorMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorMessage {
    One(String),
    Many(Vec<String>),
}

impl ErrorMessage {
    fn into_text(self) -> String {
        match self {
            Self::One(message) => message,
            Self::Many(messages) => messages.join(", "),
        }
    }
}

/// HTTP client for the PokeStore API.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
    session: SessionStore,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for `base_url` that authenticates as `session`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Request` if the HTTP client cannot be built.
    pub fn new(base_url: Url, timeout: Duration, session: SessionStore) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url,
                session,
            }),
        })
    }

    /// The API base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// `GET path` and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(self.request(Method::GET, path)?).await?;
        decode(response).await
    }

    /// `POST path` with a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .send(self.request(Method::POST, path)?.json(body))
            .await?;
        decode(response).await
    }

    /// `POST path` with an optional JSON body, ignoring the response body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: Option<&B>) -> Result<(), ApiError> {
        let mut request = self.request(Method::POST, path)?;
        if let Some(body) = body {
            request = request.json(body);
        }
        self.send(request).await?;
        Ok(())
    }

    /// `PATCH path` with a JSON body, ignoring the response body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn patch<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        self.send(self.request(Method::PATCH, path)?.json(body))
            .await?;
        Ok(())
    }

    /// `DELETE path`, ignoring the response body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(self.request(Method::DELETE, path)?).await?;
        Ok(())
    }

    /// Run `request` unless `cancel` fires first.
    ///
    /// A cancelled request is dropped mid-flight and its response is never
    /// observed, so nothing downstream can apply it.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Cancelled` if `cancel` fires first, otherwise
    /// whatever `request` returns.
    pub async fn cancellable<T, E, F>(cancel: &CancellationToken, request: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<ApiError>,
    {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(ApiError::Cancelled.into()),
            result = request => result,
        }
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.url(path)?;
        let mut request = self.inner.http.request(method, url);
        if let Some(token) = self.inner.session.token() {
            request = request.bearer_auth(token.expose_secret());
        }
        Ok(request)
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        let base = self.inner.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    /// Send a request and map non-success statuses to errors.
    ///
    /// # Errors
    ///
    /// - `ApiError::Request` if the server cannot be reached
    /// - `ApiError::Unauthorized` on 401 (logged; the session is kept)
    /// - `ApiError::Status` on any other non-success status
    #[instrument(skip(self, request))]
    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "API response");

        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message)
            .map(ErrorMessage::into_text);

        if status == StatusCode::UNAUTHORIZED {
            warn!(message = ?message, "Unauthorized or expired session");
            return Err(ApiError::Unauthorized { message });
        }

        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}

//! Asynchronous request execution with single-shot completion.
//!
//! # Design
//! `Dispatcher` turns an `HttpRequest` into exactly one `Result<T, ApiError>`.
//! Every request gets its own spawned task: validation, the blocking
//! transport call, the cross-origin check, status classification and JSON
//! decoding all happen there. Callers either await a `Pending` (backed by a
//! one-shot channel) or hand over an `FnOnce` completion.
//!
//! Because the outcome is always produced on a spawned task, a completion
//! never runs before `request` returns, even when the request is rejected
//! before anything is sent. All methods must be called from within a Tokio
//! runtime.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use ::http::{HeaderName, HeaderValue, Uri};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::client::decode_response;
use crate::config::ClientConfig;
use crate::cors;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::Transport;

/// Runs requests through a `Transport` and reports each outcome once.
pub struct Dispatcher<T> {
    transport: Arc<T>,
    timeout: Option<Duration>,
    origin: Option<String>,
}

impl<T> Clone for Dispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            timeout: self.timeout,
            origin: self.origin.clone(),
        }
    }
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
            timeout: None,
            origin: None,
        }
    }

    pub fn from_config(transport: T, config: &ClientConfig) -> Self {
        Self::new(transport)
            .with_timeout(config.timeout())
            .with_origin(config.origin.clone())
    }

    /// Fail an exchange with `ApiError::Timeout` once `timeout` elapses.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Origin of the page issuing requests; enables cross-origin checks.
    pub fn with_origin(mut self, origin: Option<String>) -> Self {
        self.origin = origin;
        self
    }

    /// Start `request` and invoke `callback` with its outcome.
    ///
    /// Returns as soon as the exchange is spawned. The returned handle
    /// resolves after the callback has run; it carries no result. A panic
    /// inside the callback is confined to that handle.
    pub fn request<R, F>(&self, request: HttpRequest, callback: F) -> JoinHandle<()>
    where
        R: DeserializeOwned + Send + 'static,
        F: FnOnce(Result<R, ApiError>) + Send + 'static,
    {
        self.complete_with(Ok(request), callback)
    }

    /// Start `request` and return a future for its outcome.
    pub fn send<R>(&self, request: HttpRequest) -> Pending<R>
    where
        R: DeserializeOwned + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let exchange = self.exchange(Ok(request));
        tokio::spawn(async move {
            // receiver gone means nobody is waiting
            let _ = tx.send(exchange.await);
        });
        Pending { rx }
    }

    /// GET `url` with `headers`.
    pub fn get<R, F>(&self, url: &str, headers: &[(&str, &str)], callback: F) -> JoinHandle<()>
    where
        R: DeserializeOwned + Send + 'static,
        F: FnOnce(Result<R, ApiError>) + Send + 'static,
    {
        let request = HttpRequest::get(url).headers(headers.iter().copied());
        self.complete_with(Ok(request), callback)
    }

    /// POST `body` as JSON to `url` with `headers`.
    pub fn post<R, B, F>(
        &self,
        url: &str,
        body: &B,
        headers: &[(&str, &str)],
        callback: F,
    ) -> JoinHandle<()>
    where
        R: DeserializeOwned + Send + 'static,
        B: Serialize + ?Sized,
        F: FnOnce(Result<R, ApiError>) + Send + 'static,
    {
        let request = serde_json::to_string(body)
            .map(|json| HttpRequest::post(url, json).headers(headers.iter().copied()))
            .map_err(|e| ApiError::Serialization(e.to_string()));
        self.complete_with(request, callback)
    }

    fn complete_with<R, F>(&self, request: Result<HttpRequest, ApiError>, callback: F) -> JoinHandle<()>
    where
        R: DeserializeOwned + Send + 'static,
        F: FnOnce(Result<R, ApiError>) + Send + 'static,
    {
        let exchange = self.exchange(request);
        tokio::spawn(async move { callback(exchange.await) })
    }

    fn exchange<R>(
        &self,
        request: Result<HttpRequest, ApiError>,
    ) -> impl Future<Output = Result<R, ApiError>> + Send + 'static
    where
        R: DeserializeOwned + Send + 'static,
    {
        let transport = Arc::clone(&self.transport);
        let timeout = self.timeout;
        let origin = self.origin.clone();
        async move {
            let request = request.and_then(prepare)?;
            let method = request.method;
            let url = request.url.clone();
            tracing::debug!(%method, %url, "sending request");

            let result = roundtrip(transport, request, timeout, origin.as_deref())
                .await
                .and_then(|response| {
                    tracing::debug!(%method, %url, status = response.status, "response received");
                    decode_response(response)
                });
            if let Err(e) = &result {
                tracing::warn!(%method, %url, error = %e, "request failed");
            }
            result
        }
    }
}

async fn roundtrip<T: Transport>(
    transport: Arc<T>,
    request: HttpRequest,
    timeout: Option<Duration>,
    origin: Option<&str>,
) -> Result<HttpResponse, ApiError> {
    let url = request.url.clone();
    // The blocking call keeps running after a timeout; the transport's own
    // deadline is what finally stops it.
    let call = tokio::task::spawn_blocking(move || transport.execute(&request));
    let joined = match timeout {
        Some(after) => tokio::time::timeout(after, call)
            .await
            .map_err(|_| ApiError::Timeout { after })?,
        None => call.await,
    };
    let response = joined.map_err(|e| ApiError::Transport(format!("transport task failed: {e}")))??;
    if let Some(origin) = origin {
        cors::check_access(origin, &url, &response)?;
    }
    Ok(response)
}

/// Validate `request` and fill in the JSON content type for POST bodies.
fn prepare(mut request: HttpRequest) -> Result<HttpRequest, ApiError> {
    if request.url.is_empty() {
        return Err(ApiError::Construction("url is empty".to_string()));
    }
    let uri: Uri = request
        .url
        .parse()
        .map_err(|e| ApiError::Construction(format!("invalid url {:?}: {e}", request.url)))?;
    if !matches!(uri.scheme_str(), Some("http" | "https")) || uri.authority().is_none() {
        return Err(ApiError::Construction(format!(
            "url {:?} is not an absolute http(s) url",
            request.url
        )));
    }
    for (name, value) in &request.headers {
        HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ApiError::Construction(format!("invalid header name {name:?}")))?;
        HeaderValue::from_str(value)
            .map_err(|_| ApiError::Construction(format!("invalid value for header {name:?}")))?;
    }
    match (request.method, &request.body) {
        (HttpMethod::Post, None) => {
            return Err(ApiError::Construction("POST requires a body".to_string()));
        }
        (HttpMethod::Get, Some(_)) => {
            return Err(ApiError::Construction("GET cannot carry a body".to_string()));
        }
        _ => {}
    }
    if request.method == HttpMethod::Post && request.header_value("content-type").is_none() {
        request
            .headers
            .push(("content-type".to_string(), "application/json".to_string()));
    }
    Ok(request)
}

/// Outcome of `Dispatcher::send`. Resolves exactly once.
#[must_use = "a pending request does nothing useful unless awaited"]
pub struct Pending<R> {
    rx: oneshot::Receiver<Result<R, ApiError>>,
}

impl<R> Future for Pending<R> {
    type Output = Result<R, ApiError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|received| {
            received.unwrap_or_else(|_| {
                Err(ApiError::Transport("request task ended without a result".to_string()))
            })
        })
    }
}

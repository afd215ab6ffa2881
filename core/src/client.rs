//! Stateless HTTP request builder and response parser for the posts API.
//!
//! # Design
//! `PostsClient` holds only a `base_url` and the headers attached to every
//! request. Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! Who executes the round-trip in between is up to the caller: a
//! `Dispatcher` or any other HTTP stack.

use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::types::Post;

/// Synchronous, stateless client for the posts API.
#[derive(Debug, Clone)]
pub struct PostsClient {
    base_url: String,
    headers: Vec<(String, String)>,
}

impl PostsClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            headers: Vec::new(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(&config.base_url).with_headers(
            config
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        )
    }

    /// Headers added to every request this client builds, GET and POST alike.
    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn posts_url(&self) -> String {
        format!("{}/posts", self.base_url)
    }

    pub fn build_list_posts(&self) -> HttpRequest {
        HttpRequest::get(self.posts_url()).headers(self.headers.iter().cloned())
    }

    pub fn build_get_post(&self, id: u64) -> HttpRequest {
        HttpRequest::get(format!("{}/posts/{id}", self.base_url)).headers(self.headers.iter().cloned())
    }

    pub fn build_create_post(&self, post: &Post) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(post).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest::post(self.posts_url(), body)
            .header("content-type", "application/json; charset=UTF-8")
            .headers(self.headers.iter().cloned()))
    }

    pub fn parse_list_posts(&self, response: HttpResponse) -> Result<Vec<Post>, ApiError> {
        decode_response(response)
    }

    pub fn parse_get_post(&self, response: HttpResponse) -> Result<Post, ApiError> {
        decode_response(response)
    }

    pub fn parse_create_post(&self, response: HttpResponse) -> Result<Post, ApiError> {
        decode_response(response)
    }
}

/// Map a status outside `[200, 300)` to `ApiError::Status`, keeping the
/// response for inspection.
pub fn check_status(response: HttpResponse) -> Result<HttpResponse, ApiError> {
    if response.is_success() {
        return Ok(response);
    }
    Err(ApiError::Status {
        status: response.status,
        response,
    })
}

/// Classify `response` by status, then decode its JSON body as `T`.
///
/// An empty body decodes as JSON `null`, so `Option<_>` and
/// `serde_json::Value` targets accept bodiless successes such as 204.
pub fn decode_response<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    let response = check_status(response)?;
    let body = match response.body.trim() {
        "" => "null",
        body => body,
    };
    serde_json::from_str(body).map_err(|e| ApiError::MalformedResponse(e.to_string()))
}

//! Asynchronous client core for the posts service.
//!
//! # Overview
//! `PostsClient` builds `HttpRequest` values and parses `HttpResponse`
//! values without touching the network. A `Dispatcher` executes requests
//! through a `Transport` on a Tokio runtime and reports each outcome exactly
//! once, either through a completion callback or a `Pending` future.
//! `PostRenderer` projects the resulting posts into a shared `Container`.
//!
//! # Design
//! - Status codes in `[200, 300)` succeed; everything else is
//!   `ApiError::Status` with the raw response attached.
//! - Headers are an ordered list and apply to GET and POST alike.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod cors;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod render;
pub mod transport;
pub mod types;

pub use client::PostsClient;
pub use config::{ClientConfig, ConfigError};
pub use dispatch::{Dispatcher, Pending};
pub use error::ApiError;
pub use crate::http::{HttpMethod, HttpRequest, HttpResponse};
pub use render::{Container, Element, PostRenderer};
pub use transport::{Transport, UreqTransport};
pub use types::Post;

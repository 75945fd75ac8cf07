//! # Host Bridge Traits
//!
//! Abstraction seams between the enrichment core and the host process.
//!
//! ## Overview
//!
//! The core never talks to the network or the wall clock directly. Instead it
//! depends on the traits defined here, which the host (or the `bridge-desktop`
//! crate) implements. Tests substitute mocks for the same traits, which keeps
//! every remote provider exercisable without network access.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations, one attempt per call
//! - [`Clock`](time::Clock) - Time source for rate limiting and deterministic testing
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Host
//! implementations should convert transport-specific errors into it and keep
//! the message actionable (URL, timeout, connection state).
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so a single client can be shared by
//! every provider and by concurrent requests.
//!
//! ## Examples
//!
//! ### Implementing HttpClient
//!
//! ```ignore
//! use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
//! use bridge_traits::error::Result;
//! use async_trait::async_trait;
//!
//! pub struct MyHttpClient {
//!     client: reqwest::Client,
//! }
//!
//! #[async_trait]
//! impl HttpClient for MyHttpClient {
//!     async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
//!         // Implementation
//!         todo!()
//!     }
//! }
//! ```

pub mod error;
pub mod http;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use time::{Clock, LogLevel, SystemClock};

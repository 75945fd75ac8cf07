//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for server and desktop hosts
//! (Linux, macOS, Windows).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest` (async, so no provider call ever blocks a
//!   runtime worker thread)
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::ReqwestHttpClient;
//! use std::time::Duration;
//!
//! let http_client = ReqwestHttpClient::with_timeout(Duration::from_secs(15))?;
//! ```

mod http;

pub use http::ReqwestHttpClient;

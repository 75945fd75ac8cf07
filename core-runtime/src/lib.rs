//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the enrichment core:
//! - Logging and tracing infrastructure
//! - Configuration loading (environment, `.env` files, builder)
//!
//! ## Overview
//!
//! Configuration is read once at startup and is immutable afterwards. Every
//! other crate receives the slices of [`config::CoreConfig`] it needs at
//! construction time instead of reading globals.

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};

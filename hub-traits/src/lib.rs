//! # Hub Client Traits
//!
//! Shared seams between the connectivity core and its environment.
//!
//! ## Overview
//!
//! This crate defines the contract every higher layer builds on:
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP execution, implemented by
//!   `hub-reqwest` in production and by mocks in tests
//! - [`HttpRequest`](http::HttpRequest) / [`HttpResponse`](http::HttpResponse) -
//!   transport-agnostic request/response carriers
//! - [`RequestContext`](context::RequestContext) - cancellation and deadline
//!   propagation for every network call
//! - [`HubError`](error::HubError) - the error type implementations convert
//!   their failures into
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync` bounds; a single client instance is shared
//! by concurrent callers.
//!
//! ## No Built-In Retry
//!
//! Implementations execute a request exactly once. The bridge API has no
//! idempotency keys, so retry policy belongs to callers and is never applied
//! below them.

pub mod context;
pub mod error;
pub mod http;

pub use context::RequestContext;
pub use error::{HubError, Result};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};

//! # Reqwest HTTP Client
//!
//! Production [`HttpClient`](hub_traits::HttpClient) implementation on
//! `reqwest` with rustls.
//!
//! The one bridge-specific concern lives here: local bridges terminate TLS
//! with self-signed certificates, so certificate verification toward the
//! bridge is relaxed by default. This is a deliberate trust decision for
//! traffic that never leaves the local segment, and it stays configurable
//! via [`HttpConfig::accept_invalid_certs`] for deployments that provision
//! proper certificates.

mod http;

pub use http::{HttpConfig, ReqwestHttpClient};

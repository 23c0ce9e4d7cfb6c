//! HTTP transport implementations for http-flood
//!
//! This crate provides the reqwest-backed implementation of the
//! `HttpTransport` trait from `http-flood-core`:
//!
//! - [`ReqwestTransport`]: pooled client, no redirects, no decompression
//! - [`HttpConfig`]: pool and timeout settings
//!
//! Transport failures are reported with errno-style codes (`ECONNREFUSED`,
//! `ECONNRESET`, `ENOTFOUND`, ...) so reports stay comparable across platforms.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod client;
mod config;
mod errors;

pub use client::ReqwestTransport;
pub use config::HttpConfig;

//! HTTP client module
//!
//! Thin wrapper over reqwest used by the store adapter.
//!
//! # Features
//!
//! - **Authentication**: bearer tokens from the auth module
//! - **Rate Limiting**: optional token bucket using governor
//! - **Timeouts**: per-client default, per-request override

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};

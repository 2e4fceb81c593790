//! Air-quality API fetchers
//!
//! This crate provides the interface the sampler uses to poll the upstream
//! API, plus the WAQI HTTP client and two in-process fetchers for offline
//! runs and tests.

pub mod scripted;
pub mod simulator;
pub mod waqi;

pub use scripted::*;
pub use simulator::*;
pub use waqi::*;

use aqs_core::{BoundingBox, RawResponse};
use thiserror::Error;

/// Transport-level failures. Upstream errors reported inside a decoded
/// payload are not `IngestError`s; they come back as a `RawResponse`.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Undecodable response (HTTP {status}): {message}")]
    Decode { status: u16, message: String },

    #[error("Fetcher error: {0}")]
    Fetcher(String),
}

pub type IngestResult<T> = Result<T, IngestError>;

/// Trait for everything that can answer a bounding-box query
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetcher name/identifier
    fn name(&self) -> &str;

    /// Query the stations inside `bbox`
    async fn fetch(&self, bbox: &BoundingBox) -> IngestResult<RawResponse>;
}

//! Sampling scheduler
//!
//! Runs a [`SamplingPlan`](aqs_core::SamplingPlan) against a
//! [`Fetcher`](aqs_ingest::Fetcher): one window of concurrent sample tasks per
//! minute, paced on the wall clock, with run-wide cooperative cancellation.

pub mod cancel;
pub mod scheduler;
pub mod task;

pub use cancel::*;
pub use scheduler::*;
pub use task::*;

use thiserror::Error;

/// Fatal failure of one sample. Any of these ends the whole run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SampleError {
    #[error("API request quota exhausted: {0}")]
    Quota(String),

    #[error("API key rejected: {0}")]
    InvalidKey(String),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

#[derive(Debug, Error)]
pub enum SamplerError {
    #[error(transparent)]
    Sample(#[from] SampleError),

    #[error("Run interrupted")]
    Interrupted,

    #[error("Sample task failed to complete")]
    Task(#[from] tokio::task::JoinError),
}

pub type SamplerResult<T> = Result<T, SamplerError>;

//! Scripted fetcher that replays canned responses

use crate::{Fetcher, IngestError, IngestResult};
use aqs_core::{BoundingBox, RawResponse};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration};

/// One scripted reply
#[derive(Debug, Clone)]
pub enum Step {
    Respond(RawResponse),
    /// Transport failure with the given message
    Fail(String),
}

/// Fetcher that answers calls from a queue, in call order.
///
/// Once the queue is drained every further call gets the fallback reply.
pub struct ScriptedFetcher {
    steps: Mutex<VecDeque<Step>>,
    fallback: Step,
    latency: Duration,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            fallback: Step::Respond(RawResponse::ok(Vec::new())),
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Reply with `response` to every call
    pub fn always(response: RawResponse) -> Self {
        Self::new([]).with_fallback(Step::Respond(response))
    }

    pub fn with_fallback(mut self, fallback: Step) -> Self {
        self.fallback = fallback;
        self
    }

    /// Simulated network time per call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of calls that reached the fetcher
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Fetcher for ScriptedFetcher {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch(&self, _bbox: &BoundingBox) -> IngestResult<RawResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .steps
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        if !self.latency.is_zero() {
            sleep(self.latency).await;
        }

        match step {
            Step::Respond(response) => Ok(response),
            Step::Fail(message) => Err(IngestError::Fetcher(message)),
        }
    }
}

//! A single scheduled sample

use crate::{CancellationToken, SampleError};
use aqs_core::{
    normalize_stations, BoundingBox, Classified, RawResponse, SampleIndex, SampleOutcome,
    SampleResult,
};
use aqs_ingest::Fetcher;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, trace};

/// One unit of polling work: wait for the fire time, query the API once,
/// classify the answer
pub struct SampleTask {
    index: SampleIndex,
    fire_at: Instant,
    bbox: BoundingBox,
    fetcher: Arc<dyn Fetcher>,
    pool: Arc<Semaphore>,
    token: CancellationToken,
}

impl SampleTask {
    pub fn new(
        index: SampleIndex,
        fire_at: Instant,
        bbox: BoundingBox,
        fetcher: Arc<dyn Fetcher>,
        pool: Arc<Semaphore>,
        token: CancellationToken,
    ) -> Self {
        Self {
            index,
            fire_at,
            bbox,
            fetcher,
            pool,
            token,
        }
    }

    pub fn index(&self) -> SampleIndex {
        self.index
    }

    /// Run the sample.
    ///
    /// A signaled token yields `Cancelled` without touching the network; it is
    /// never reported as an error.
    pub async fn run(self) -> Result<SampleOutcome, SampleError> {
        if self.token.is_signaled() {
            return Ok(self.cancelled());
        }

        tokio::select! {
            biased;
            _ = self.token.signaled() => return Ok(self.cancelled()),
            _ = sleep_until(self.fire_at) => {}
        }

        let _permit = tokio::select! {
            biased;
            _ = self.token.signaled() => return Ok(self.cancelled()),
            permit = self.pool.acquire() => permit
                .map_err(|_| SampleError::Protocol("worker pool closed".into()))?,
        };

        if self.token.is_signaled() {
            return Ok(self.cancelled());
        }

        trace!(sample = self.index.global, fetcher = self.fetcher.name(), "firing");
        let response = self
            .fetcher
            .fetch(&self.bbox)
            .await
            .map_err(|e| SampleError::Protocol(e.to_string()))?;

        let result = classify_response(response)?;
        debug!(
            minute = self.index.minute,
            sample = self.index.sample,
            readings = result.readings().len(),
            "sample complete"
        );

        Ok(SampleOutcome {
            index: self.index,
            result,
        })
    }

    fn cancelled(&self) -> SampleOutcome {
        trace!(sample = self.index.global, "cancelled before firing");
        SampleOutcome {
            index: self.index,
            result: SampleResult::Cancelled,
        }
    }
}

/// Map a decoded response to a sample result or a fatal failure
pub fn classify_response(response: RawResponse) -> Result<SampleResult, SampleError> {
    match response.classify() {
        Classified::Stations(stations) => {
            Ok(SampleResult::from_readings(normalize_stations(&stations)))
        }
        Classified::OverQuota(msg) => Err(SampleError::Quota(msg)),
        Classified::InvalidKey(msg) => Err(SampleError::InvalidKey(msg)),
        Classified::Malformed(msg) => Err(SampleError::Protocol(msg)),
    }
}

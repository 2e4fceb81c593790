//! Simulated WAQI endpoint for offline runs

use crate::{Fetcher, IngestResult};
use aqs_core::{AqiValue, BoundingBox, RawResponse, RawStation};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::time::{sleep, Duration};

/// Fetcher that generates synthetic station readings
pub struct SimulatedFetcher {
    stations: Vec<String>,
    base_aqi: f64,
    latency: Duration,
    counter: AtomicU64,
}

impl SimulatedFetcher {
    pub fn new(stations: Vec<String>) -> Self {
        Self {
            stations,
            base_aqi: 30.0,
            latency: Duration::from_millis(150),
            counter: AtomicU64::new(0),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn generate_response(&self, seed: u64) -> RawResponse {
        let stations = self
            .stations
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let mix = seed.wrapping_mul(31).wrapping_add(i as u64 * 17);
                // every seventh reading is a placeholder, like an offline station
                if mix % 7 == 0 {
                    return RawStation::new(name.clone(), AqiValue::Text("-".into()));
                }
                let variation = (mix % 100) as f64 / 5.0 - 10.0;
                let aqi = (self.base_aqi + i as f64 * 4.0 + variation).max(0.0).round();
                RawStation::new(name.clone(), AqiValue::Text(format!("{}", aqi)))
            })
            .collect();

        RawResponse::ok(stations)
    }
}

impl Default for SimulatedFetcher {
    fn default() -> Self {
        Self::new(
            ["Riverside Park", "Harbour Centre", "North Ridge", "Airport East"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }
}

#[async_trait::async_trait]
impl Fetcher for SimulatedFetcher {
    fn name(&self) -> &str {
        "simulator"
    }

    async fn fetch(&self, _bbox: &BoundingBox) -> IngestResult<RawResponse> {
        sleep(self.latency).await;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let seed = now ^ self.counter.fetch_add(1, Ordering::Relaxed);

        Ok(self.generate_response(seed))
    }
}

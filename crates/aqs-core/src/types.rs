//! Core data types for a sampling run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Length of one reporting window
pub const WINDOW: Duration = Duration::from_secs(60);

/// A single station reading taken from one sample.
///
/// `aqi` is always finite and non-negative; anything else is dropped by the
/// normalizer before a `Reading` is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub station_name: String,
    pub aqi: f64,
}

impl Reading {
    pub fn new(station_name: impl Into<String>, aqi: f64) -> Self {
        Self {
            station_name: station_name.into(),
            aqi,
        }
    }
}

/// Rectangular latitude/longitude region queried on every sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lat1: f64,
    pub lng1: f64,
    pub lat2: f64,
    pub lng2: f64,
}

impl BoundingBox {
    pub fn new(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> Self {
        Self {
            lat1,
            lng1,
            lat2,
            lng2,
        }
    }
}

/// Renders as the `latlng` query value: `lat1,lng1,lat2,lng2`
impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.lat1, self.lng1, self.lat2, self.lng2)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("period must be a positive number of minutes")]
    ZeroPeriod,

    #[error("rate must be a positive number of samples per minute")]
    ZeroRate,

    #[error("{period} minute(s) at {rate} sample(s)/minute is more samples than a run can count")]
    TooManySamples { period: u32, rate: u32 },
}

/// What to sample, for how long, and how often
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingPlan {
    pub bbox: BoundingBox,
    /// Minutes
    pub period: u32,
    /// Samples per minute
    pub rate: u32,
}

impl SamplingPlan {
    pub fn new(bbox: BoundingBox, period: u32, rate: u32) -> Result<Self, PlanError> {
        if period == 0 {
            return Err(PlanError::ZeroPeriod);
        }
        if rate == 0 {
            return Err(PlanError::ZeroRate);
        }
        if period.checked_mul(rate).is_none() {
            return Err(PlanError::TooManySamples { period, rate });
        }
        Ok(Self { bbox, period, rate })
    }

    pub fn total_samples(&self) -> u32 {
        self.period * self.rate
    }

    /// Index of the `sample`-th sample in the `minute`-th window
    pub fn index(&self, minute: u32, sample: u32) -> SampleIndex {
        SampleIndex {
            minute,
            sample,
            global: minute * self.rate + sample,
            total: self.total_samples(),
        }
    }

    /// Delay of a sample from the start of its window.
    ///
    /// Samples are spread evenly: sample `s` of `rate` fires at
    /// `s * window / rate`.
    pub fn fire_offset(&self, sample: u32, window: Duration) -> Duration {
        window * sample / self.rate
    }
}

/// Position of one sample within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleIndex {
    /// Zero-based window (minute) number
    pub minute: u32,
    /// Zero-based position inside the window
    pub sample: u32,
    /// Zero-based position inside the whole run
    pub global: u32,
    /// Number of samples in the run
    pub total: u32,
}

/// Outcome of one sample task that did not fail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "readings", rename_all = "lowercase")]
pub enum SampleResult {
    /// Valid response with at least one usable reading
    Ok(Vec<Reading>),
    /// Valid response, zero usable stations
    Empty,
    /// The task saw the cancellation token and did no I/O
    Cancelled,
}

impl SampleResult {
    /// Wrap normalized readings, mapping an empty list to `Empty`
    pub fn from_readings(readings: Vec<Reading>) -> Self {
        if readings.is_empty() {
            SampleResult::Empty
        } else {
            SampleResult::Ok(readings)
        }
    }

    pub fn readings(&self) -> &[Reading] {
        match self {
            SampleResult::Ok(readings) => readings,
            SampleResult::Empty | SampleResult::Cancelled => &[],
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, SampleResult::Cancelled)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleOutcome {
    pub index: SampleIndex,
    pub result: SampleResult,
}

/// Every outcome of one minute's batch, in completion order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WindowResult {
    pub minute: u32,
    pub outcomes: Vec<SampleOutcome>,
}

impl WindowResult {
    pub fn new(minute: u32) -> Self {
        Self {
            minute,
            outcomes: Vec::new(),
        }
    }

    pub fn push(&mut self, outcome: SampleOutcome) {
        self.outcomes.push(outcome);
    }

    /// Number of readings collected in this window
    pub fn reading_count(&self) -> usize {
        self.outcomes.iter().map(|o| o.result.readings().len()).sum()
    }
}

/// Per-window results of a completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunHistory {
    pub plan: SamplingPlan,
    pub started_at: DateTime<Utc>,
    pub windows: Vec<WindowResult>,
}

impl RunHistory {
    pub fn new(plan: SamplingPlan, started_at: DateTime<Utc>) -> Self {
        Self {
            plan,
            started_at,
            windows: Vec::with_capacity(plan.period as usize),
        }
    }

    pub fn outcomes(&self) -> impl Iterator<Item = &SampleOutcome> {
        self.windows.iter().flat_map(|w| w.outcomes.iter())
    }
}

/// Mean reading of one station over a whole run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationAggregate {
    pub station_name: String,
    pub mean_aqi: f64,
    pub sample_count: usize,
}

/// Final ranked report of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "stations", rename_all = "snake_case")]
pub enum AggregateReport {
    /// No sample of the run produced a reading
    NoData,
    /// Stations sorted descending by mean
    Stations(Vec<StationAggregate>),
}

impl AggregateReport {
    pub fn stations(&self) -> &[StationAggregate] {
        match self {
            AggregateReport::NoData => &[],
            AggregateReport::Stations(stations) => stations,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, AggregateReport::NoData)
    }
}

//! Station record normalization
//!
//! Turns the station list of one successful response into clean readings.

use crate::payload::RawStation;
use crate::types::Reading;
use std::cmp::Ordering;
use tracing::trace;

/// Project raw station entries to readings, dropping unparseable values.
///
/// The result is sorted descending by AQI, ties broken by station name
/// descending. The order only matters for display.
pub fn normalize_stations(stations: &[RawStation]) -> Vec<Reading> {
    let mut readings: Vec<Reading> = stations
        .iter()
        .filter_map(|raw| match raw.aqi.as_f64() {
            Some(aqi) => Some(Reading::new(raw.station.name.clone(), aqi)),
            None => {
                trace!(station = %raw.station.name, aqi = ?raw.aqi, "skipping unparseable reading");
                None
            }
        })
        .collect();

    readings.sort_by(descending);
    readings
}

fn descending(a: &Reading, b: &Reading) -> Ordering {
    b.aqi
        .total_cmp(&a.aqi)
        .then_with(|| b.station_name.cmp(&a.station_name))
}

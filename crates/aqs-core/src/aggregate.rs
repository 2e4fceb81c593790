//! Station aggregation over a whole run

use crate::types::{AggregateReport, Reading, SampleOutcome, SampleResult, StationAggregate};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Accumulator for the readings of one station
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    observations: Vec<f64>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: f64) {
        self.observations.push(value);
    }

    /// Arithmetic mean over a correctly rounded sum.
    ///
    /// The sum does not depend on the order readings arrived in, and
    /// repeating every reading leaves the mean unchanged.
    pub fn mean(&self) -> Option<f64> {
        if self.observations.is_empty() {
            return None;
        }
        Some(exact_sum(&self.observations) / self.observations.len() as f64)
    }

    pub fn count(&self) -> usize {
        self.observations.len()
    }
}

/// Sum of `values` rounded once, half to even.
///
/// Keeps a list of non-overlapping partial sums that together hold the exact
/// total (Shewchuk), then rounds that total to the nearest `f64`.
fn exact_sum(values: &[f64]) -> f64 {
    let mut partials: Vec<f64> = Vec::new();
    for &value in values {
        let mut x = value;
        let mut kept = 0;
        for j in 0..partials.len() {
            let mut y = partials[j];
            if x.abs() < y.abs() {
                std::mem::swap(&mut x, &mut y);
            }
            let hi = x + y;
            let lo = y - (hi - x);
            if lo != 0.0 {
                partials[kept] = lo;
                kept += 1;
            }
            x = hi;
        }
        partials.truncate(kept);
        partials.push(x);
    }

    let Some(mut n) = partials.len().checked_sub(1) else {
        return 0.0;
    };
    let mut hi = partials[n];
    let mut lo = 0.0;
    while n > 0 {
        let x = hi;
        n -= 1;
        let y = partials[n];
        hi = x + y;
        lo = y - (hi - x);
        if lo != 0.0 {
            break;
        }
    }
    // halfway case: the remaining partials push the rounding away from `hi`
    if n > 0 && ((lo < 0.0 && partials[n - 1] < 0.0) || (lo > 0.0 && partials[n - 1] > 0.0)) {
        let y = lo * 2.0;
        let x = hi + y;
        if y == x - hi {
            hi = x;
        }
    }
    hi
}

/// Aggregate sample results into a ranked per-station report.
///
/// `Empty` and `Cancelled` results contribute nothing. Stations are grouped
/// by exact name and sorted descending by mean, ties by name descending.
pub fn aggregate_results<'a, I>(results: I) -> AggregateReport
where
    I: IntoIterator<Item = &'a SampleResult>,
{
    aggregate_readings(results.into_iter().flat_map(SampleResult::readings))
}

/// Aggregate the outcomes of a run
pub fn aggregate_outcomes<'a, I>(outcomes: I) -> AggregateReport
where
    I: IntoIterator<Item = &'a SampleOutcome>,
{
    aggregate_results(outcomes.into_iter().map(|o| &o.result))
}

pub fn aggregate_readings<'a, I>(readings: I) -> AggregateReport
where
    I: IntoIterator<Item = &'a Reading>,
{
    let mut accumulators: BTreeMap<&str, Accumulator> = BTreeMap::new();
    for reading in readings {
        accumulators
            .entry(reading.station_name.as_str())
            .or_default()
            .add(reading.aqi);
    }

    let mut stations: Vec<StationAggregate> = accumulators
        .into_iter()
        .filter_map(|(name, acc)| {
            acc.mean().map(|mean_aqi| StationAggregate {
                station_name: name.to_string(),
                mean_aqi,
                sample_count: acc.count(),
            })
        })
        .collect();

    if stations.is_empty() {
        return AggregateReport::NoData;
    }

    stations.sort_by(by_mean_descending);
    AggregateReport::Stations(stations)
}

fn by_mean_descending(a: &StationAggregate, b: &StationAggregate) -> Ordering {
    b.mean_aqi
        .total_cmp(&a.mean_aqi)
        .then_with(|| b.station_name.cmp(&a.station_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(readings: &[(&str, f64)]) -> SampleResult {
        SampleResult::from_readings(
            readings
                .iter()
                .map(|(name, aqi)| Reading::new(*name, *aqi))
                .collect(),
        )
    }

    #[test]
    fn test_accumulator() {
        let mut acc = Accumulator::new();
        assert_eq!(acc.mean(), None);
        acc.add(10.0);
        acc.add(20.0);
        acc.add(30.0);
        assert_eq!(acc.mean(), Some(20.0));
        assert_eq!(acc.count(), 3);
    }

    #[test]
    fn test_single_station_three_samples() {
        let results = vec![ok(&[("S1", 20.0)]), ok(&[("S1", 30.0)]), ok(&[("S1", 10.0)])];

        let report = aggregate_results(&results);
        assert_eq!(
            report.stations(),
            &[StationAggregate {
                station_name: "S1".into(),
                mean_aqi: 20.0,
                sample_count: 3,
            }]
        );
    }

    #[test]
    fn test_two_stations_ranked_by_mean() {
        // window 0
        let w0 = vec![ok(&[("A", 10.0), ("B", 30.0)])];
        // window 1
        let w1 = vec![ok(&[("A", 20.0)]), SampleResult::Empty];

        let report = aggregate_results(w0.iter().chain(w1.iter()));
        let stations = report.stations();
        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].station_name, "B");
        assert_eq!(stations[0].mean_aqi, 30.0);
        assert_eq!(stations[0].sample_count, 1);
        assert_eq!(stations[1].station_name, "A");
        assert_eq!(stations[1].mean_aqi, 15.0);
        assert_eq!(stations[1].sample_count, 2);
    }

    #[test]
    fn test_no_data_is_distinct() {
        let results = vec![SampleResult::Empty, SampleResult::Cancelled, ok(&[])];
        let report = aggregate_results(&results);
        assert!(report.is_no_data());
        assert_eq!(report, AggregateReport::NoData);
        assert_ne!(report, AggregateReport::Stations(Vec::new()));
    }

    #[test]
    fn test_order_independent() {
        let results = vec![
            ok(&[("A", 0.1), ("B", 7.0)]),
            ok(&[("A", 0.2), ("C", 7.0)]),
            SampleResult::Cancelled,
            ok(&[("A", 0.3)]),
            ok(&[("B", 3.0), ("a", 99.0)]),
        ];
        let expected = aggregate_results(&results);

        let mut reversed = results.clone();
        reversed.reverse();
        assert_eq!(aggregate_results(&reversed), expected);

        let mut rotated = results.clone();
        rotated.rotate_left(2);
        assert_eq!(aggregate_results(&rotated), expected);
    }

    #[test]
    fn test_doubling_keeps_means() {
        let results = vec![ok(&[("A", 10.0), ("B", 4.0)]), ok(&[("A", 20.0)])];
        let single = aggregate_results(&results);
        let doubled = aggregate_results(results.iter().chain(results.iter()));

        for (one, two) in single.stations().iter().zip(doubled.stations()) {
            assert_eq!(one.station_name, two.station_name);
            assert_eq!(one.mean_aqi, two.mean_aqi);
            assert_eq!(one.sample_count * 2, two.sample_count);
        }
    }

    #[test]
    fn test_exact_sum() {
        assert_eq!(exact_sum(&[]), 0.0);
        assert_eq!(exact_sum(&[0.1, 0.2, 0.3]), 0.6);
        assert_eq!(exact_sum(&[1e16, 1.0, -1e16]), 1.0);
        assert_eq!(exact_sum(&[1.0, 1e100, 1.0, -1e100]), 2.0);
    }

    #[test]
    fn test_doubling_keeps_fractional_means() {
        // small LCG so the sets are varied but reproducible
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = || {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            (state >> 33) % 10_000
        };

        for _ in 0..2000 {
            let readings: Vec<Reading> = (0..7)
                .map(|i| Reading::new(format!("S{}", i % 3), next() as f64 / 97.0))
                .collect();
            let doubled: Vec<Reading> = readings.iter().chain(readings.iter()).cloned().collect();

            let single = aggregate_readings(&readings);
            let twice = aggregate_readings(&doubled);
            assert_eq!(single.stations().len(), twice.stations().len());
            for (one, two) in single.stations().iter().zip(twice.stations()) {
                assert_eq!(one.station_name, two.station_name);
                assert_eq!(one.mean_aqi.to_bits(), two.mean_aqi.to_bits());
                assert_eq!(one.sample_count * 2, two.sample_count);
            }
        }
    }

    #[test]
    fn test_tie_broken_by_name_descending() {
        let results = vec![ok(&[("Alpha", 5.0), ("Zulu", 5.0), ("Mike", 5.0)])];
        let report = aggregate_results(&results);
        let names: Vec<&str> = report
            .stations()
            .iter()
            .map(|s| s.station_name.as_str())
            .collect();
        assert_eq!(names, vec!["Zulu", "Mike", "Alpha"]);
    }

    #[test]
    fn test_station_names_case_sensitive() {
        let results = vec![ok(&[("Park", 1.0)]), ok(&[("park", 3.0)])];
        assert_eq!(aggregate_results(&results).stations().len(), 2);
    }
}

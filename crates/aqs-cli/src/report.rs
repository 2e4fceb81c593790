//! Console rendering of run progress and results
//!
//! Every function here returns the text instead of printing it.

use std::fmt::Write;

use aqs_core::{AggregateReport, SampleOutcome, SampleResult, SamplingPlan, WindowResult};

fn area(plan: &SamplingPlan) -> String {
    let b = plan.bbox;
    format!(
        "in stations between latitudes {} and {} and longitudes {} and {}",
        b.lat1, b.lat2, b.lng1, b.lng2
    )
}

pub fn render_header(plan: &SamplingPlan) -> String {
    format!(
        "Calculating average of {} PM2.5 readings over {} minute(s) {}.\n\n",
        plan.total_samples(),
        plan.period,
        area(plan)
    )
}

/// One completed sample. Cancelled samples render as nothing.
pub fn render_sample(outcome: &SampleOutcome) -> String {
    let idx = outcome.index;
    let mut out = String::new();
    let readings = match &outcome.result {
        SampleResult::Cancelled => return out,
        SampleResult::Empty => None,
        SampleResult::Ok(readings) => Some(readings),
    };

    let _ = writeln!(
        out,
        "Minute: {}, Sample: {} - ({}/{})",
        idx.minute,
        idx.sample + 1,
        idx.global + 1,
        idx.total
    );
    match readings {
        Some(readings) => {
            for (i, r) in readings.iter().enumerate() {
                let _ = writeln!(out, "AQI: {:.1}, Station {}: {}", r.aqi, i + 1, r.station_name);
            }
        }
        None => {
            out.push_str("No data for given latitude and longitude arguments at this current time.\n");
        }
    }
    out.push('\n');
    out
}

pub fn render_window(window: &WindowResult) -> String {
    let cancelled = window
        .outcomes
        .iter()
        .filter(|o| o.result.is_cancelled())
        .count();
    let mut line = format!(
        "Minute {} complete: {} reading(s) from {} sample(s)",
        window.minute,
        window.reading_count(),
        window.outcomes.len() - cancelled
    );
    if cancelled > 0 {
        let _ = write!(line, ", {} cancelled", cancelled);
    }
    line.push_str("\n\n");
    line
}

pub fn render_report(plan: &SamplingPlan, report: &AggregateReport) -> String {
    let samples = plan.total_samples();
    match report {
        AggregateReport::NoData => format!(
            "All {} samples had no data for given latitude and longitude arguments at this current time. Calculating average could not be performed.\n",
            samples
        ),
        AggregateReport::Stations(stations) => {
            let mut out = format!(
                "Average of {} PM2.5 readings over {} minute(s) {}:\n",
                samples,
                plan.period,
                area(plan)
            );
            for (i, s) in stations.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "Average AQI: {:.2} ({} samples), Station {}: {}",
                    s.mean_aqi,
                    s.sample_count,
                    i + 1,
                    s.station_name
                );
            }
            out
        }
    }
}

/// Final output of a completed run: the text ranking, or the report as a
/// single JSON document
pub fn render_final(
    plan: &SamplingPlan,
    report: &AggregateReport,
    json: bool,
) -> serde_json::Result<String> {
    if json {
        Ok(format!("{}\n", serde_json::to_string_pretty(report)?))
    } else {
        Ok(render_report(plan, report))
    }
}

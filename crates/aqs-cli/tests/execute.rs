use std::sync::Arc;
use std::time::Duration;

use aqs_cli::{execute, report};
use aqs_core::{AggregateReport, AqiValue, BoundingBox, RawResponse, RawStation, SamplingPlan};
use aqs_ingest::{ScriptedFetcher, Step};
use aqs_sampler::{SampleError, SamplerError, Scheduler};

fn plan(period: u32, rate: u32) -> SamplingPlan {
    SamplingPlan::new(BoundingBox::new(10.0, 20.0, 30.0, 40.0), period, rate).unwrap()
}

fn respond(readings: &[(&str, f64)]) -> Step {
    Step::Respond(RawResponse::ok(
        readings
            .iter()
            .map(|(name, aqi)| RawStation::new(*name, AqiValue::Number(*aqi)))
            .collect(),
    ))
}

#[tokio::test(start_paused = true)]
async fn streams_progress_and_aggregates() {
    let fetcher = Arc::new(ScriptedFetcher::new([
        respond(&[("Harbour", 12.0), ("Ridge", 40.0)]),
        respond(&[]),
    ]));
    let plan = plan(1, 2);

    let execution = execute(
        Scheduler::new(plan, fetcher),
        Vec::new(),
        std::future::pending(),
    )
    .await
    .unwrap();

    let completed = execution.result.unwrap();
    let text = String::from_utf8(execution.out).unwrap();
    assert_eq!(
        text,
        "Calculating average of 2 PM2.5 readings over 1 minute(s) in stations between latitudes 10 and 30 and longitudes 20 and 40.\n\n\
         Minute: 0, Sample: 1 - (1/2)\n\
         AQI: 40.0, Station 1: Ridge\n\
         AQI: 12.0, Station 2: Harbour\n\n\
         Minute: 0, Sample: 2 - (2/2)\n\
         No data for given latitude and longitude arguments at this current time.\n\n\
         Minute 0 complete: 2 reading(s) from 2 sample(s)\n\n"
    );

    insta::assert_snapshot!(report::render_report(&plan, &completed.report), @r"
    Average of 2 PM2.5 readings over 1 minute(s) in stations between latitudes 10 and 30 and longitudes 20 and 40:
    Average AQI: 40.00 (1 samples), Station 1: Ridge
    Average AQI: 12.00 (1 samples), Station 2: Harbour
    ");
}

#[tokio::test(start_paused = true)]
async fn quota_failure_produces_no_aggregate() {
    let fetcher = Arc::new(ScriptedFetcher::new([Step::Respond(RawResponse::error(
        "Over quota",
    ))]));

    let execution = execute(
        Scheduler::new(plan(2, 1), fetcher),
        Vec::new(),
        std::future::pending(),
    )
    .await
    .unwrap();

    assert!(matches!(
        execution.result,
        Err(SamplerError::Sample(SampleError::Quota(_)))
    ));
    let text = String::from_utf8(execution.out).unwrap();
    assert!(text.starts_with("Calculating average of 2 PM2.5 readings"));
    assert!(!text.contains("Minute: 0"));
    assert!(!text.contains("Average"));
}

#[tokio::test(start_paused = true)]
async fn interrupt_ends_the_run() {
    let fetcher = Arc::new(ScriptedFetcher::always(RawResponse::ok(vec![
        RawStation::new("S1", AqiValue::Number(5.0)),
    ])));

    let execution = execute(
        Scheduler::new(plan(3, 1), fetcher.clone()),
        Vec::new(),
        tokio::time::sleep(Duration::from_secs(70)),
    )
    .await
    .unwrap();

    assert!(matches!(execution.result, Err(SamplerError::Interrupted)));
    assert_eq!(fetcher.calls(), 2);

    let text = String::from_utf8(execution.out).unwrap();
    assert!(text.contains("Minute 1 complete"));
    assert!(!text.contains("Minute: 2"));
}

#[tokio::test(start_paused = true)]
async fn json_output_is_a_single_document() {
    let fetcher = Arc::new(ScriptedFetcher::new([
        respond(&[("Harbour", 12.0), ("Ridge", 40.0)]),
        respond(&[("Ridge", 20.0)]),
    ]));
    let plan = plan(1, 2);

    let execution = execute(
        Scheduler::new(plan, fetcher),
        Vec::new(),
        std::future::pending(),
    )
    .await
    .unwrap();
    let completed = execution.result.unwrap();

    let progress = String::from_utf8(execution.out).unwrap();
    assert!(progress.contains("Minute: 0, Sample: 2 - (2/2)"));

    let stdout = report::render_final(&plan, &completed.report, true).unwrap();
    assert!(!stdout.contains("Minute"));
    let parsed: AggregateReport = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed, completed.report);
    assert_eq!(parsed.stations()[0].station_name, "Ridge");
    assert_eq!(parsed.stations()[0].mean_aqi, 30.0);

    let text = report::render_final(&plan, &completed.report, false).unwrap();
    assert_eq!(text, report::render_report(&plan, &completed.report));
}

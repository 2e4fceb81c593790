//! Run driver
//!
//! Connects a [`Scheduler`] to the console reporter and to an external
//! interrupt source, then folds the finished history into the aggregate.

use std::future::Future;
use std::io::Write;

use aqs_core::{aggregate_outcomes, AggregateReport, RunHistory};
use aqs_sampler::{create_event_channel, EventReceiver, SamplerEvent, SamplerResult, Scheduler};
use tracing::{info, warn};

use crate::report;

const EVENT_BUFFER: usize = 64;

/// A run that reached its last window
#[derive(Debug)]
pub struct Completed {
    pub history: RunHistory,
    pub report: AggregateReport,
}

/// What a run leaves behind: the progress writer and the run's result
#[derive(Debug)]
pub struct Execution<W> {
    pub out: W,
    pub result: SamplerResult<Completed>,
}

/// Run `scheduler` to completion, streaming progress to `out`.
///
/// When `interrupt` resolves first the run's token is signaled and the run is
/// still awaited, so in-flight calls finish before this returns. The outer
/// error is reserved for the reporter task itself failing.
pub async fn execute<W, I>(scheduler: Scheduler, out: W, interrupt: I) -> SamplerResult<Execution<W>>
where
    W: Write + Send + 'static,
    I: Future<Output = ()> + Send,
{
    let (tx, rx) = create_event_channel(EVENT_BUFFER);
    let reporter = tokio::spawn(report_events(rx, out));

    let token = scheduler.token();
    let mut run = Box::pin(scheduler.with_events(tx).run());

    let finished = tokio::select! {
        result = &mut run => Some(result),
        _ = interrupt => None,
    };
    let result = match finished {
        Some(result) => result,
        None => {
            warn!("Interrupt received, waiting for in-flight samples");
            token.signal();
            (&mut run).await
        }
    };
    // closes the event channel so the reporter can drain and exit
    drop(run);

    let out = reporter.await?;

    let result = result.map(|history| {
        let report = aggregate_outcomes(history.outcomes());
        info!(stations = report.stations().len(), "Aggregate computed");
        Completed { history, report }
    });
    Ok(Execution { out, result })
}

async fn report_events<W: Write>(mut rx: EventReceiver, mut out: W) -> W {
    while let Some(event) = rx.recv().await {
        let text = match &event {
            SamplerEvent::RunStarted { plan, .. } => report::render_header(plan),
            SamplerEvent::SampleCompleted(outcome) => report::render_sample(outcome),
            SamplerEvent::WindowClosed(window) => report::render_window(window),
        };
        if let Err(e) = out.write_all(text.as_bytes()).and_then(|_| out.flush()) {
            warn!("Failed to write progress: {}", e);
        }
    }
    out
}

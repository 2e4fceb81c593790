//! Rate/period scheduler
//!
//! Runs one window per minute. Each window launches `rate` sample tasks spread
//! evenly across the window, waits for all of them in completion order, then
//! idles out the rest of the window before the next one starts. The first
//! fatal sample failure signals the run's cancellation token; the scheduler
//! still joins every task of the window before returning that failure.

use crate::{CancellationToken, SampleError, SampleTask, SamplerError, SamplerResult};
use aqs_core::{RunHistory, SampleOutcome, SamplingPlan, WindowResult, WINDOW};
use aqs_ingest::Fetcher;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, instrument, warn};

/// Upper bound on the default pool size
pub const MAX_POOL_SIZE: usize = 32;

/// Default number of concurrent sample calls: `min(32, cpus + 4)`
pub fn default_pool_size() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .saturating_add(4)
        .min(MAX_POOL_SIZE)
}

/// Progress published while a run is in flight
#[derive(Debug, Clone, PartialEq)]
pub enum SamplerEvent {
    RunStarted {
        plan: SamplingPlan,
        started_at: DateTime<Utc>,
    },
    SampleCompleted(SampleOutcome),
    WindowClosed(WindowResult),
}

pub type EventSender = mpsc::Sender<SamplerEvent>;
pub type EventReceiver = mpsc::Receiver<SamplerEvent>;

/// Create a new event channel with specified buffer size
pub fn create_event_channel(buffer_size: usize) -> (EventSender, EventReceiver) {
    mpsc::channel(buffer_size)
}

/// Scheduler coordinates the sample tasks of one run
pub struct Scheduler {
    plan: SamplingPlan,
    fetcher: Arc<dyn Fetcher>,
    pool_size: usize,
    window: Duration,
    token: CancellationToken,
    events: Option<EventSender>,
}

impl Scheduler {
    pub fn new(plan: SamplingPlan, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            plan,
            fetcher,
            pool_size: default_pool_size(),
            window: WINDOW,
            token: CancellationToken::new(),
            events: None,
        }
    }

    /// Bound on concurrently running network calls
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size.max(1);
        self
    }

    /// Wall-clock budget of one window (60s unless overridden)
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Handle for the run driver to interrupt the run (e.g. on Ctrl-C)
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn plan(&self) -> &SamplingPlan {
        &self.plan
    }

    /// Run every window of the plan.
    ///
    /// Returns the per-window history, the first fatal sample failure, or
    /// `Interrupted` if the token was signaled from outside.
    #[instrument(skip(self), fields(period = self.plan.period, rate = self.plan.rate))]
    pub async fn run(self) -> SamplerResult<RunHistory> {
        let started_at = Utc::now();
        let mut history = RunHistory::new(self.plan, started_at);
        let pool = Arc::new(Semaphore::new(self.pool_size));

        info!(
            "Sampling {} over {} minute(s) at {} sample(s)/minute, pool size {}",
            self.plan.bbox, self.plan.period, self.plan.rate, self.pool_size
        );
        self.emit(SamplerEvent::RunStarted {
            plan: self.plan,
            started_at,
        })
        .await;

        for minute in 0..self.plan.period {
            if self.token.is_signaled() {
                break;
            }

            let window_start = Instant::now();
            let window = self.run_window(minute, window_start, &pool).await?;
            info!(
                minute,
                readings = window.reading_count(),
                "window closed"
            );
            self.emit(SamplerEvent::WindowClosed(window.clone())).await;
            history.windows.push(window);

            let last = minute + 1 == self.plan.period;
            if !last && !self.idle_until(window_start + self.window).await {
                break;
            }
        }

        if self.token.is_signaled() {
            warn!("Run interrupted after {} window(s)", history.windows.len());
            return Err(SamplerError::Interrupted);
        }

        info!("Sampling complete");
        Ok(history)
    }

    /// Launch one window's tasks and collect them in completion order
    async fn run_window(
        &self,
        minute: u32,
        window_start: Instant,
        pool: &Arc<Semaphore>,
    ) -> SamplerResult<WindowResult> {
        let mut tasks = JoinSet::new();
        for sample in 0..self.plan.rate {
            let task = SampleTask::new(
                self.plan.index(minute, sample),
                window_start + self.plan.fire_offset(sample, self.window),
                self.plan.bbox,
                Arc::clone(&self.fetcher),
                Arc::clone(pool),
                self.token.clone(),
            );
            tasks.spawn(task.run());
        }
        debug!(minute, tasks = tasks.len(), "window launched");

        let mut window = WindowResult::new(minute);
        let mut failure: Option<SamplerError> = None;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(outcome)) => {
                    self.emit(SamplerEvent::SampleCompleted(outcome.clone()))
                        .await;
                    window.push(outcome);
                }
                Ok(Err(e)) => {
                    self.abort_with(&e);
                    failure.get_or_insert(e.into());
                }
                Err(e) => {
                    error!("Sample task did not complete: {}", e);
                    self.token.signal();
                    failure.get_or_insert(e.into());
                }
            }
        }

        match failure {
            Some(e) => Err(e),
            None if self.token.is_signaled() => Err(SamplerError::Interrupted),
            None => Ok(window),
        }
    }

    fn abort_with(&self, e: &SampleError) {
        if self.token.signal() {
            error!("Fatal sample failure, cancelling run: {}", e);
        } else {
            debug!("Further sample failure after cancellation: {}", e);
        }
    }

    /// Wait out the window budget. Returns `false` if the token was signaled.
    async fn idle_until(&self, deadline: Instant) -> bool {
        tokio::select! {
            _ = self.token.signaled() => false,
            _ = sleep_until(deadline) => !self.token.is_signaled(),
        }
    }

    async fn emit(&self, event: SamplerEvent) {
        if let Some(tx) = &self.events {
            // a closed receiver only means nobody is reporting
            let _ = tx.send(event).await;
        }
    }
}

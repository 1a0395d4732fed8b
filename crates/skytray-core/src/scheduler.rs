//! Repeating weather-refresh timer.
//!
//! Each tick calls a handler that is expected to spawn its own work; the
//! timer never waits on it, so a slow fetch does not delay the next tick.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Called once per tick.
pub type TickHandler = Arc<dyn Fn() + Send + Sync>;

/// Observable scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerStatus {
    Stopped,
    Running { interval_seconds: u64 },
}

enum SchedulerState {
    Stopped,
    Running {
        interval: Duration,
        handler: TickHandler,
        cancel: CancellationToken,
        task: JoinHandle<()>,
    },
}

pub struct PollScheduler {
    state: Mutex<SchedulerState>,
}

impl std::fmt::Debug for PollScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollScheduler")
            .field("status", &self.status())
            .finish()
    }
}

impl Default for PollScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl PollScheduler {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SchedulerState::Stopped),
        }
    }

    pub fn status(&self) -> SchedulerStatus {
        match &*self.state.lock() {
            SchedulerState::Stopped => SchedulerStatus::Stopped,
            SchedulerState::Running { interval, .. } => SchedulerStatus::Running {
                interval_seconds: interval.as_secs(),
            },
        }
    }

    /// Start ticking: once immediately, then every `interval`.
    ///
    /// Must be called from within a tokio runtime. Starting an already
    /// running scheduler replaces its timer and handler.
    pub fn start(&self, interval: Duration, handler: TickHandler) {
        let mut state = self.state.lock();
        tracing::info!("Starting weather polling every {}s", interval.as_secs());

        let next = spawn_loop(interval, handler, Instant::now());
        if let SchedulerState::Running { cancel, .. } = std::mem::replace(&mut *state, next) {
            tracing::debug!("Scheduler was already running, old timer cancelled");
            cancel.cancel();
        }
    }

    /// Reschedule at `interval` without an extra immediate tick.
    ///
    /// Does nothing while stopped. The old timer keeps running until the
    /// new one is in place.
    pub fn rearm(&self, interval: Duration) {
        let mut state = self.state.lock();
        let handler = match &*state {
            SchedulerState::Stopped => {
                tracing::debug!("Ignoring rearm of stopped scheduler");
                return;
            }
            SchedulerState::Running { handler, .. } => handler.clone(),
        };

        tracing::info!("Rearming weather polling every {}s", interval.as_secs());
        let first_tick = first_tick_after(Instant::now(), timer_period(interval));
        let next = spawn_loop(interval, handler, first_tick);
        if let SchedulerState::Running { cancel, .. } = std::mem::replace(&mut *state, next) {
            cancel.cancel();
        }
    }

    /// Cancel future ticks. Work already handed to the handler keeps running.
    pub fn stop(&self) {
        let previous = std::mem::replace(&mut *self.state.lock(), SchedulerState::Stopped);
        if let SchedulerState::Running { cancel, task, .. } = previous {
            cancel.cancel();
            drop(task);
            tracing::info!("Weather polling stopped");
        }
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Shortest and longest period the timer runs with. Intervals outside this
/// range are still reported as requested.
const MIN_TIMER_PERIOD: Duration = Duration::from_secs(1);
const MAX_TIMER_PERIOD: Duration = Duration::from_secs(86_400 * 365 * 30);

fn timer_period(interval: Duration) -> Duration {
    interval.clamp(MIN_TIMER_PERIOD, MAX_TIMER_PERIOD)
}

fn first_tick_after(now: Instant, period: Duration) -> Instant {
    now.checked_add(period)
        .or_else(|| now.checked_add(MAX_TIMER_PERIOD))
        .unwrap_or(now)
}

fn spawn_loop(interval: Duration, handler: TickHandler, first_tick: Instant) -> SchedulerState {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let tick = handler.clone();
    let period = timer_period(interval);

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(first_tick, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    tracing::debug!("Scheduler tick");
                    tick();
                }
            }
        }
    });

    SchedulerState::Running {
        interval,
        handler,
        cancel,
        task,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_handler() -> (TickHandler, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let handler: TickHandler = Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (handler, count)
    }

    async fn advance(secs: f64) {
        tokio::time::sleep(Duration::from_secs_f64(secs)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn start_ticks_immediately_then_periodically() {
        let scheduler = PollScheduler::new();
        let (handler, count) = counting_handler();

        scheduler.start(Duration::from_secs(10), handler);
        advance(0.001).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        advance(25.0).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert_eq!(
            scheduler.status(),
            SchedulerStatus::Running {
                interval_seconds: 10
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stop_prevents_future_ticks_and_is_idempotent() {
        let scheduler = PollScheduler::new();
        let (handler, count) = counting_handler();

        scheduler.start(Duration::from_secs(10), handler);
        advance(0.001).await;
        scheduler.stop();
        scheduler.stop();

        advance(60.0).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.status(), SchedulerStatus::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_reschedules_without_immediate_tick() {
        let scheduler = PollScheduler::new();
        let (handler, count) = counting_handler();

        scheduler.start(Duration::from_secs(10), handler);
        advance(5.0).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        scheduler.rearm(Duration::from_secs(20));
        advance(19.0).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        advance(2.0).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(
            scheduler.status(),
            SchedulerStatus::Running {
                interval_seconds: 20
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn huge_interval_keeps_scheduler_alive() {
        let scheduler = PollScheduler::new();
        let (handler, count) = counting_handler();
        let huge = Duration::from_secs(i64::MAX as u64);

        scheduler.start(Duration::from_secs(10), handler);
        advance(5.0).await;
        scheduler.rearm(huge);
        assert_eq!(
            scheduler.status(),
            SchedulerStatus::Running {
                interval_seconds: i64::MAX as u64
            }
        );

        advance(3600.0).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        scheduler.rearm(Duration::from_secs(10));
        advance(10.5).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn start_with_huge_interval_ticks_once() {
        let scheduler = PollScheduler::new();
        let (handler, count) = counting_handler();

        scheduler.start(Duration::from_secs(u64::MAX), handler);
        advance(86_400.0).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(
            scheduler.status(),
            SchedulerStatus::Running {
                interval_seconds: u64::MAX
            }
        );
    }

    #[test]
    fn first_tick_never_overflows() {
        let now = Instant::now();
        let first = first_tick_after(now, timer_period(Duration::MAX));
        assert!(first > now);
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_while_stopped_does_nothing() {
        let scheduler = PollScheduler::new();
        scheduler.rearm(Duration::from_secs(5));
        advance(10.0).await;
        assert_eq!(scheduler.status(), SchedulerStatus::Stopped);
    }
}

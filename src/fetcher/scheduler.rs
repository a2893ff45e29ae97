//! Trigger scheduler.
//!
//! Runs one refresh at startup, then arms two independent trigger sources
//! that feed the same [`RefreshCycle`]:
//!
//! - a timer driven by a [`CronSchedule`]
//! - a change watch on the bearer-token file
//!
//! Every firing spawns its own refresh task, so a slow cycle never delays
//! the next tick or the next file event. Cycles may overlap; each one writes
//! the destination with an atomic replace, so the last to complete wins.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::schedule::CronSchedule;
use super::trigger::{Trigger, TriggerEvent};
use crate::errors::Result;

/// One end-to-end refresh attempt.
///
/// Implementations log their own failures and never panic.
#[async_trait]
pub trait RefreshCycle: Send + Sync + 'static {
    async fn refresh(&self, trigger: Trigger);
}

/// Owns the timer and watch trigger sources.
pub struct Scheduler<R: RefreshCycle> {
    cycle: Arc<R>,
    schedule: CronSchedule,
    debounce: Duration,
}

impl<R: RefreshCycle> Scheduler<R> {
    pub fn new(cycle: Arc<R>, schedule: CronSchedule) -> Self {
        Self { cycle, schedule, debounce: Duration::ZERO }
    }

    /// Coalesce token-file events arriving within `debounce` of the first
    /// one into a single refresh. Zero disables coalescing.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Run until `shutdown` is cancelled.
    ///
    /// The startup refresh completes before `arm_watch` is called. A watch
    /// setup failure is returned immediately and is fatal. The guard
    /// returned by `arm_watch` is held until both trigger loops stop.
    pub async fn run<W, G>(self, arm_watch: W, shutdown: CancellationToken) -> Result<()>
    where
        W: FnOnce(mpsc::UnboundedSender<TriggerEvent>) -> Result<G>,
        G: Send,
    {
        self.cycle.refresh(Trigger::Startup).await;

        let (tx, rx) = mpsc::unbounded_channel();
        let _watch_guard = arm_watch(tx)?;

        info!(
            schedule = %self.schedule,
            debounce_ms = self.debounce.as_millis() as u64,
            "Trigger sources armed"
        );

        let timer = tokio::spawn(timer_loop(
            Arc::clone(&self.cycle),
            self.schedule.clone(),
            shutdown.clone(),
        ));
        let watch = tokio::spawn(watch_loop(Arc::clone(&self.cycle), rx, self.debounce, shutdown));

        let (timer_result, watch_result) = tokio::join!(timer, watch);
        if let Err(e) = timer_result {
            error!(error = %e, "Timer trigger task failed");
        }
        if let Err(e) = watch_result {
            error!(error = %e, "Watch trigger task failed");
        }

        info!("Trigger sources stopped");
        Ok(())
    }
}

/// Start a refresh for `event` without waiting for it.
fn dispatch<R: RefreshCycle>(cycle: &Arc<R>, event: TriggerEvent) {
    match event.trigger() {
        Some(trigger) => {
            let cycle = Arc::clone(cycle);
            tokio::spawn(async move { cycle.refresh(trigger).await });
        }
        None => {
            if let TriggerEvent::WatchError(message) = event {
                error!(error = %message, "Token file watch reported an error");
            }
        }
    }
}

async fn timer_loop<R: RefreshCycle>(
    cycle: Arc<R>,
    schedule: CronSchedule,
    shutdown: CancellationToken,
) {
    loop {
        let Some(wait) = schedule.until_next(Utc::now()) else {
            warn!(schedule = %schedule, "Schedule has no upcoming occurrence, timer stopped");
            return;
        };
        debug!(wait_secs = wait.as_secs(), "Next scheduled refresh");

        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = tokio::time::sleep(wait) => {
                info!(schedule = %schedule, "Schedule fired");
                dispatch(&cycle, TriggerEvent::ScheduleFired);
            }
        }
    }
}

async fn watch_loop<R: RefreshCycle>(
    cycle: Arc<R>,
    mut events: mpsc::UnboundedReceiver<TriggerEvent>,
    debounce: Duration,
    shutdown: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = shutdown.cancelled() => return,
            event = events.recv() => match event {
                Some(event) => event,
                None => {
                    warn!("Token file watch closed");
                    return;
                }
            },
        };

        let kind = match event {
            TriggerEvent::TokenFileChanged(kind) => kind,
            other => {
                dispatch(&cycle, other);
                continue;
            }
        };
        info!(kind = ?kind, "Token file changed");

        if !debounce.is_zero() {
            let window = tokio::time::sleep(debounce);
            tokio::pin!(window);
            loop {
                tokio::select! {
                    _ = &mut window => break,
                    _ = shutdown.cancelled() => return,
                    next = events.recv() => match next {
                        Some(TriggerEvent::TokenFileChanged(kind)) => {
                            debug!(kind = ?kind, "Coalesced token file change");
                        }
                        Some(other) => dispatch(&cycle, other),
                        None => break,
                    },
                }
            }
        }

        dispatch(&cycle, TriggerEvent::TokenFileChanged(kind));
    }
}

//! Phase scheduler: the one-second heartbeat
//!
//! Calls `tick_all` at a fixed cadence until told to stop. Every elapsed
//! period yields exactly one logical second: after a slow tick the missed
//! ones run back to back, so no speaker gains time.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::core::service::DebateService;

/// Production cadence
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// Background tick loop with a shutdown switch
pub struct PhaseScheduler {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl PhaseScheduler {
    /// Start ticking `service` every `period`
    pub fn spawn(service: DebateService, period: Duration) -> Self {
        let (shutdown, mut stop) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
            // the first tick completes immediately
            ticker.tick().await;
            tracing::info!(period_ms = period.as_millis() as u64, "phase scheduler running");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let ticked = service.tick_all().await;
                        tracing::trace!(ticked, "tick");
                    }
                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::info!("phase scheduler stopped");
        });
        Self { shutdown, handle }
    }

    /// Stop the loop and wait for it to exit
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "phase scheduler task failed");
        }
    }
}

//! Periodic expiry sweep.
//!
//! Evicts live streams whose keep-alive lapsed and ends recordings whose stop
//! time has passed. Runs on its own timer, independent of request tasks.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use log::{debug, info};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::gateway::RecorderGateway;

/// Counts from one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub evicted_streams: usize,
    pub ended_recordings: usize,
}

pub struct Sweeper {
    gateway: Arc<RecorderGateway>,
    interval: Duration,
}

impl Sweeper {
    pub fn new(gateway: Arc<RecorderGateway>, interval: Duration) -> Self {
        Self { gateway, interval }
    }

    /// Run one pass at the given instants.
    pub async fn sweep_once(&self, now: Instant, now_utc: chrono::DateTime<Utc>) -> SweepReport {
        let report = SweepReport {
            evicted_streams: self.gateway.evict_expired_streams(now).await,
            ended_recordings: self.gateway.end_due_recordings(now_utc).await,
        };
        if report != SweepReport::default() {
            info!(
                "[Sweeper] evicted {} stream(s), ended {} recording(s)",
                report.evicted_streams, report.ended_recordings
            );
        }
        report
    }

    /// Sweep on every tick until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        info!("[Sweeper] Starting with interval {:?}", self.interval);
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    debug!("[Sweeper] tick");
                    self.sweep_once(Instant::now(), Utc::now()).await;
                }
            }
        }
        info!("[Sweeper] Stopped");
    }

    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}

//! Scheduled eviction of unreachable applications.
//!
//! # Responsibilities
//! - Periodically probe every deployed application
//! - Undeploy those whose host fails the liveness probe

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::registry::Registry;

pub struct EvictionMonitor {
    registry: Arc<Registry>,
    interval: Duration,
}

impl EvictionMonitor {
    pub fn new(registry: Arc<Registry>, interval: Duration) -> Self {
        Self { registry, interval }
    }

    /// Sweep on every tick until `shutdown` fires. The first sweep runs one
    /// full interval after start.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Eviction monitor starting"
        );

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let evicted = self.registry.evict_unreachable().await;
                    if !evicted.is_empty() {
                        tracing::info!(count = evicted.len(), applications = ?evicted, "Eviction sweep finished");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Eviction monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

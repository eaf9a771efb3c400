use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::ui::{DashboardController, DashboardHub};

/// Refreshes the dashboard snapshot on a fixed period.
///
/// The first tick fires immediately. A poll still outstanding when the next
/// tick fires is aborted, and the hub's generation check drops any response
/// that lost the race anyway.
pub struct DashboardPoller {
    controller: Arc<DashboardController>,
    hub: Arc<DashboardHub>,
    interval: Duration,
}

impl DashboardPoller {
    pub fn new(controller: Arc<DashboardController>, hub: Arc<DashboardHub>, interval: Duration) -> Self {
        Self {
            controller,
            hub,
            interval,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(self) {
        info!("Dashboard poller started (every {:?})", self.interval);

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut in_flight: Option<JoinHandle<()>> = None;

        loop {
            ticker.tick().await;

            if let Some(previous) = in_flight.take() {
                if !previous.is_finished() {
                    debug!("Previous dashboard poll still pending, cancelling it");
                    previous.abort();
                }
            }

            let controller = Arc::clone(&self.controller);
            let hub = Arc::clone(&self.hub);
            in_flight = Some(tokio::spawn(async move {
                controller.refresh(&hub).await;
            }));
        }
    }
}

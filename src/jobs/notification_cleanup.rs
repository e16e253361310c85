//! Periodic removal of expired notifications

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};

use crate::services::{BestEffort, NotificationService};

/// Sweeps expired notifications on a fixed interval
pub struct NotificationCleanupJob {
    notifications: Arc<NotificationService>,
    interval: Duration,
}

/// Running sweep. Dropping it leaves the task running; call [`CleanupHandle::stop`].
pub struct CleanupHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl NotificationCleanupJob {
    pub fn new(notifications: Arc<NotificationService>, interval: Duration) -> Self {
        Self {
            notifications,
            interval,
        }
    }

    /// One sweep. Failures are logged and reported as zero removals.
    pub async fn run_once(&self) -> u64 {
        let removed = self
            .notifications
            .purge_expired(Utc::now())
            .await
            .best_effort("purge_expired_notifications")
            .unwrap_or(0);

        if removed > 0 {
            tracing::info!(removed, "Expired notifications removed");
        }
        removed
    }

    /// Spawn the sweep loop. The first sweep runs immediately.
    pub fn start(self) -> CleanupHandle {
        let (shutdown, mut stopped) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::info!(interval_secs = self.interval.as_secs(), "Notification cleanup started");
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.run_once().await;
                    }
                    _ = stopped.changed() => break,
                }
            }
            tracing::info!("Notification cleanup stopped");
        });

        CleanupHandle { shutdown, task }
    }
}

impl CleanupHandle {
    /// Signal the loop and wait for it to finish its current sweep
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Notification cleanup task panicked");
        }
    }
}

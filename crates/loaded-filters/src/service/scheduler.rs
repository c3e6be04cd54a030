//! Periodic filter refresh
//!
//! Runs `refresh()` with fixed-delay semantics: wait the initial delay,
//! then refresh and sleep the interval, forever. The next refresh never
//! starts before the previous one has finished.
//!
//! ```ignore
//! let manager = Arc::new(LoadedFilterManager::new(store));
//! manager.init().await;
//! let handle = spawn_refresh_task(manager.clone(), &FilterManagerConfig::from_env());
//! // ... serve requests ...
//! handle.shutdown().await?;
//! ```

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::filter_manager::LoadedFilterManager;
use crate::config::FilterManagerConfig;
use crate::error::FilterError;
use crate::ports::LoadedBatchStore;

/// Handle to a running refresh task
///
/// Dropping the handle also stops the task at its next sleep.
pub struct RefreshHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Signal the task and wait for it to exit
    ///
    /// An in-flight refresh runs to completion first.
    pub async fn shutdown(self) -> Result<(), FilterError> {
        if self.shutdown_tx.send(true).is_err() {
            debug!("Filter refresh task already stopped");
        }
        self.task
            .await
            .map_err(|e| FilterError::TaskFailed(e.to_string()))
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawn the refresh loop on the current tokio runtime
pub fn spawn_refresh_task<S>(
    manager: Arc<LoadedFilterManager<S>>,
    config: &FilterManagerConfig,
) -> RefreshHandle
where
    S: LoadedBatchStore + 'static,
{
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let initial_delay = config.initial_delay();
    let interval = config.refresh_interval();

    let task = tokio::spawn(async move {
        debug!(
            initial_delay_ms = initial_delay.as_millis() as u64,
            interval_ms = interval.as_millis() as u64,
            "Filter refresh task started"
        );

        tokio::select! {
            _ = tokio::time::sleep(initial_delay) => {}
            _ = shutdown_rx.changed() => {
                info!("Filter refresh task stopped before first refresh");
                return;
            }
        }

        loop {
            manager.refresh().await;

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown_rx.changed() => {
                    info!("Filter refresh task shutdown signal received");
                    break;
                }
            }
        }
    });

    RefreshHandle { shutdown_tx, task }
}

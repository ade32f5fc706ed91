use super::MirrorService;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Start the sync loop: one pass right away, then one per `interval`
pub fn start_scheduler(
    service: MirrorService,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    info!(
        sync_interval_minutes = interval.as_secs() / 60,
        "starting_sync_loop"
    );

    tokio::spawn(async move {
        loop {
            // A pass in progress finishes before cancellation is observed
            if let Err(e) = service.run_pass().await {
                error!(error = %e, "sync_iteration_failed");
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(interval) => {}
            }
        }

        info!("sync_loop_stopped");
    })
}

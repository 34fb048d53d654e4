//! Waiting for the cluster to accept configuration.
//!
//! The cluster counts as ready once `pcs property show dc-version` succeeds,
//! i.e. a designated controller has been elected. The wait is bounded by
//! [`PcsCliConfig::ready_timeout`] and can be aborted through a watch channel.

use tokio::sync::watch;
use tracing::{debug, info};

use crate::pcs_cli::{CommandRunner, PcsCliConfig, PcsCliError, PcsCommand};

/// Resolves once the cancel flag turns true. Never resolves without a channel
/// or after the sender is gone.
async fn cancelled(cancel: Option<watch::Receiver<bool>>) {
    let Some(mut rx) = cancel else {
        return std::future::pending().await;
    };
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return std::future::pending().await;
        }
    }
}

async fn poll_until_ready(
    runner: &dyn CommandRunner,
    config: &PcsCliConfig,
) -> Result<(), PcsCliError> {
    let dc_version = PcsCommand::dc_version();
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        let output = runner.run(&dc_version).await?;
        if output.success() {
            break;
        }
        debug!("Cluster not ready (attempt {}), retrying", attempts);
        tokio::time::sleep(config.ready_poll_interval).await;
    }
    // dc-version shows up slightly before the cluster takes changes
    tokio::time::sleep(config.ready_settle).await;
    info!("Cluster ready after {} attempt(s)", attempts);
    Ok(())
}

/// Block until the cluster is ready, the timeout elapses or `cancel` fires.
pub async fn wait_until_ready(
    runner: &dyn CommandRunner,
    config: &PcsCliConfig,
    cancel: Option<watch::Receiver<bool>>,
) -> Result<(), PcsCliError> {
    tokio::select! {
        result = tokio::time::timeout(config.ready_timeout, poll_until_ready(runner, config)) => {
            result.map_err(|_| PcsCliError::NotReady(config.ready_timeout))?
        }
        _ = cancelled(cancel) => Err(PcsCliError::Cancelled),
    }
}

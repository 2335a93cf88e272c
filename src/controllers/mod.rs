//! Lifecycle participants and watch controllers for registry resources

pub mod resource_controller;

pub use resource_controller::ResourceController;

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::Result;

/// A lifecycle participant driven by the registry.
///
/// Participants are registered in order and driven collectively through
/// [`Registry::sync`](crate::Registry::sync) and
/// [`Registry::start`](crate::Registry::start). The shutdown token is
/// forwarded verbatim; each participant decides what cancellation means
/// for it.
#[async_trait]
pub trait Starter: Send + Sync {
    /// Participant name used in logs and error messages
    fn name(&self) -> &str;

    /// Load initial state, blocking until it is visible to readers
    async fn sync(&self, shutdown: &CancellationToken) -> Result<()>;

    /// Launch the processing loop with `workers` concurrent workers
    /// (0 = unbounded) and return without blocking on it
    async fn start(&self, workers: usize, shutdown: &CancellationToken) -> Result<()>;
}

/// Sync every participant in registration order, failing fast with the
/// first error. Participants after the failing one are not invoked.
pub async fn sync_all(shutdown: &CancellationToken, starters: &[Arc<dyn Starter>]) -> Result<()> {
    for starter in starters {
        debug!("Syncing {}", starter.name());
        starter.sync(shutdown).await?;
    }
    Ok(())
}

/// Start every participant in registration order, failing fast with the
/// first error. Participants after the failing one are not invoked.
pub async fn start_all(
    workers: usize,
    shutdown: &CancellationToken,
    starters: &[Arc<dyn Starter>],
) -> Result<()> {
    for starter in starters {
        debug!("Starting {} with {} workers", starter.name(), workers);
        starter.start(workers, shutdown).await?;
    }
    Ok(())
}

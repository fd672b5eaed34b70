//! Expiry sweeper: a periodic task that lets self-healing expiry do the
//! work, then clears orphaned session directories.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;

use shredbox_store::SessionRepository;

#[derive(Clone)]
pub struct CleanupService {
    repository: Arc<SessionRepository>,
    sweep_interval: Duration,
}

impl CleanupService {
    pub fn new(repository: Arc<SessionRepository>, sweep_interval: Duration) -> Self {
        CleanupService {
            repository,
            sweep_interval,
        }
    }

    /// Start the background sweep task.
    /// Returns a JoinHandle for graceful shutdown.
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut sweep_interval = interval(self.sweep_interval);

            loop {
                sweep_interval.tick().await;

                tracing::info!("starting scheduled sweep of expired sessions");

                if let Err(e) = self.sweep().await {
                    tracing::error!(error = %e, "sweep failed");
                }
            }
        })
    }

    /// One full sweep: reading every session through the repository is
    /// enough to expire and erase the stale ones; the orphan pass then
    /// removes directories no record points at.
    #[tracing::instrument(skip(self))]
    pub async fn sweep(&self) -> Result<(), anyhow::Error> {
        let codes = self.repository.list_codes().await?;
        let total = codes.len();
        let mut expired = 0usize;

        for code in &codes {
            match self.repository.get(code).await {
                Ok(None) => expired += 1,
                Ok(Some(_)) => {}
                Err(e) => {
                    tracing::error!(code, error = %e, "failed to check session, continuing");
                }
            }
        }

        let orphans = match self.repository.remove_orphan_dirs().await {
            Ok(count) => count,
            Err(e) => {
                tracing::error!(error = %e, "orphan directory pass failed");
                0
            }
        };

        tracing::info!(sessions = total, expired, orphans, "sweep completed");
        Ok(())
    }
}

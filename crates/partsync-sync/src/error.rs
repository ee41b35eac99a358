use thiserror::Error;

use crate::orchestrator::SyncPhase;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("a sync is already in progress")]
    AlreadyRunning,

    #[error("sync cancelled before the {phase} phase")]
    Cancelled { phase: SyncPhase },

    #[error(transparent)]
    Store(#[from] partsync_core::StoreError),
}

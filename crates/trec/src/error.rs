use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrecError {
    #[error("Tried to acquire existing lock at {}", .0.display())]
    AlreadyLocked(PathBuf),

    #[error("Tried to lock already acquired lock at {}", .0.display())]
    AlreadyHeld(PathBuf),

    #[error("Tried to unlock unacquired lock")]
    NotHeld,

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Download task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),

    #[error(transparent)]
    MissingExecutable(#[from] which::Error),

    #[error(transparent)]
    IOError(#[from] std::io::Error),

    #[error("Event feed error: {0:#}")]
    Feed(#[from] anyhow::Error),
}

pub type TrecResult<T> = Result<T, TrecError>;

mod output;
pub mod ytdlp;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

pub use output::classify_line;
pub use ytdlp::YtDlp;

use crate::{
    error::{TrecError, TrecResult},
    lock::LockFile,
};

pub const DEFAULT_OUTPUT_TEMPLATE: &str =
    "[%(timestamp>%Y-%m-%d %H:%M:%S)s] %(description)s.%(ext)s";
pub const DEFAULT_OUTPUT_PATH: &str = "recordings";

/// How jobs are laid out on disk. Every user gets its own directory below
/// `output_path`.
#[derive(Debug, Clone)]
pub struct DownloadSettings {
    pub output_path: PathBuf,
    pub output_template: String,
    /// Passed to the download operation untouched.
    pub options: Vec<String>,
}

impl DownloadSettings {
    pub fn job(&self, user: &str) -> DownloadJob {
        DownloadJob {
            user: user.to_string(),
            output_dir: self.output_path.join(user),
            output_template: self.output_template.clone(),
            options: self.options.clone(),
        }
    }
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            output_template: DEFAULT_OUTPUT_TEMPLATE.to_string(),
            options: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    pub user: String,
    pub output_dir: PathBuf,
    pub output_template: String,
    pub options: Vec<String>,
}

/// Fired by a [`StreamDownload`] once the final output file name is known and
/// nothing has been written yet. Firing consumes the hook.
///
/// An error means the file is claimed by someone else (or the lock could not
/// be created) and the operation must return it without writing.
pub struct PreWriteHook<'a> {
    lock: &'a mut LockFile,
}

impl<'a> PreWriteHook<'a> {
    pub fn new(lock: &'a mut LockFile) -> Self {
        Self { lock }
    }

    pub fn fire(self, filename: &Path) -> TrecResult<()> {
        self.lock.acquire(filename)
    }
}

/// A blocking download of one live stream. Runs on the blocking pool and may
/// take as long as the stream lasts.
pub trait StreamDownload: Send + Sync + 'static {
    fn download(&self, job: &DownloadJob, hook: PreWriteHook<'_>) -> TrecResult<()>;
}

/// Runs `job` on the blocking pool. The output lock taken by the hook is
/// released on every exit path, including a panicking operation.
pub async fn execute<D>(downloader: Arc<D>, job: DownloadJob) -> TrecResult<()>
where
    D: StreamDownload,
{
    tokio::task::spawn_blocking(move || {
        let mut lock = LockFile::new();
        let result = downloader.download(&job, PreWriteHook::new(&mut lock));

        if lock.is_held() {
            if let Err(e) = lock.release() {
                tracing::error!("Failed to release lock for stream {}: {e}", job.user);
            }
        }

        result
    })
    .await?
}

/// [`execute`] with the job's outcome reported through the log. Failures end
/// the job and are never retried.
pub async fn run_job<D>(downloader: Arc<D>, job: DownloadJob)
where
    D: StreamDownload,
{
    let user = job.user.clone();
    tracing::info!("Download started for stream {user}");

    match execute(downloader, job).await {
        Ok(()) => tracing::info!("Download finished for stream {user}"),
        Err(TrecError::AlreadyLocked(path)) => {
            tracing::error!(
                "Failed to acquire lock file for stream {user} at {}",
                path.display()
            );
            tracing::error!("Consider changing output template to avoid filename collisions");
        }
        Err(e) => tracing::error!("Download failed for stream {user}: {e}"),
    }
}

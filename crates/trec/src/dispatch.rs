use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

use crate::{
    download::{self, DownloadSettings, StreamDownload},
    LiveEvent,
};

/// Receiver of "went live" notifications.
pub trait Dispatch {
    fn dispatch(&self, event: LiveEvent);
}

/// Starts one independent download task per [`LiveEvent`].
///
/// There is no limit and no de-duplication: a user going live twice gets two
/// overlapping jobs, and the output lock decides which one writes.
pub struct Dispatcher<D> {
    downloader: Arc<D>,
    settings: DownloadSettings,
    tracker: TaskTracker,
}

impl<D> Dispatcher<D>
where
    D: StreamDownload,
{
    pub fn new(downloader: D, settings: DownloadSettings) -> Self {
        Self {
            downloader: Arc::new(downloader),
            settings,
            tracker: TaskTracker::new(),
        }
    }

    pub fn spawn(&self, event: LiveEvent) -> JoinHandle<()> {
        let job = self.settings.job(&event.user_name);
        tracing::debug!(
            "Spawning download task for {} with options {:?}",
            job.user,
            job.options
        );

        self.tracker
            .spawn(download::run_job(self.downloader.clone(), job))
    }

    /// Number of jobs still running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Stops accepting work and waits for running jobs to finish.
    pub async fn drain(&self) {
        self.tracker.close();
        if !self.tracker.is_empty() {
            tracing::info!("Waiting for {} downloads to finish", self.tracker.len());
        }
        self.tracker.wait().await;
    }
}

impl<D> Dispatch for Dispatcher<D>
where
    D: StreamDownload,
{
    fn dispatch(&self, event: LiveEvent) {
        self.spawn(event);
    }
}

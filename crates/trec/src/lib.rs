#![allow(async_fn_in_trait)]
pub mod dispatch;
pub mod download;
pub mod error;
pub mod lock;
pub mod reconcile;

mod event;

pub use dispatch::{Dispatch, Dispatcher};
pub use download::{DownloadJob, PreWriteHook, StreamDownload};
pub use error::{TrecError, TrecResult};
pub use event::*;
pub use lock::LockFile;
pub use reconcile::Reconciler;

/// ┌──────────────┐  snapshot  ┌────────────┐  LiveEvent  ┌────────────┐
/// │              ├────────────►            ├─────────────►            │   spawn_blocking
/// │   LiveFeed   │            │ Reconciler │             │ Dispatcher ├──────────────────► StreamDownload
/// │              ├────────────►            ├─────────────►            │   (LockFile held
/// └──────────────┘  events    └────────────┘             └────────────┘    while writing)
///
/// The feed is driven by a single task. Snapshot fetch happens before
/// `subscribe` is called for any user, and snapshot results are dispatched
/// only after every subscription is active.
pub trait LiveFeed {
    /// Establishes the connection. Returns once the feed is ready to accept
    /// subscriptions.
    async fn connect(&mut self) -> TrecResult<()>;

    /// Fetches the current stream status of the given logins.
    async fn fetch_live(&self, logins: &[String]) -> TrecResult<Vec<StreamStatus>>;

    /// Resolves logins to platform user ids. Unknown logins are omitted.
    async fn fetch_user_ids(&self, logins: &[String]) -> TrecResult<Vec<String>>;

    async fn subscribe(&mut self, user_id: &str) -> TrecResult<()>;

    /// Waits for the next "went live" notification. `None` means the feed
    /// was closed by the remote end.
    async fn next_event(&mut self) -> TrecResult<Option<LiveUser>>;
}

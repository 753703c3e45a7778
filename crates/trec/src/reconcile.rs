use crate::{
    dispatch::Dispatch, error::TrecResult, LiveEvent, LiveFeed, LiveUser, WatchTargets,
};

/// Merges the "who is live now" snapshot and the live event feed into a
/// single stream of [`LiveEvent`]s.
///
/// The snapshot is taken before any subscription is opened, and its results
/// are dispatched only once every subscription is active.
pub struct Reconciler<F> {
    feed: F,
    targets: WatchTargets,
}

impl<F> Reconciler<F>
where
    F: LiveFeed,
{
    pub fn new(feed: F, targets: WatchTargets) -> Self {
        Self { feed, targets }
    }

    /// Runs until the feed is closed. Setup and feed errors are returned and
    /// are not retried.
    pub async fn run<D>(mut self, dispatcher: &D) -> TrecResult<()>
    where
        D: Dispatch,
    {
        self.feed.connect().await?;
        tracing::info!("Connected to event feed");

        let live = self.currently_live().await?;
        self.subscribe().await?;

        for user in live {
            dispatch_user(dispatcher, user);
        }

        while let Some(user) = self.feed.next_event().await? {
            dispatch_user(dispatcher, user);
        }

        tracing::info!("Event feed closed");
        Ok(())
    }

    async fn currently_live(&self) -> TrecResult<Vec<LiveUser>> {
        let statuses = self.feed.fetch_live(&self.targets.logins()).await?;
        let live: Vec<_> = statuses
            .into_iter()
            .filter(|status| status.live)
            .map(|status| status.user)
            .collect();

        tracing::debug!("{} of {} users are live", live.len(), self.targets.len());
        Ok(live)
    }

    async fn subscribe(&mut self) -> TrecResult<()> {
        let logins = self.targets.logins();
        tracing::debug!("Subscribing to users: {logins:?}");

        let ids = self.feed.fetch_user_ids(&logins).await?;
        if ids.len() < logins.len() {
            tracing::warn!(
                "Only {} of {} users exist, the rest will not be watched",
                ids.len(),
                logins.len()
            );
        }

        for id in &ids {
            self.feed.subscribe(id).await?;
        }

        tracing::info!("Watching {} users", ids.len());
        Ok(())
    }
}

fn dispatch_user<D>(dispatcher: &D, user: LiveUser)
where
    D: Dispatch,
{
    match LiveEvent::try_from(user) {
        Ok(event) => {
            tracing::info!("User {} is online", event.user_name);
            dispatcher.dispatch(event);
        }
        Err(user) => tracing::error!("User ID {} is online, but missing username", user.id),
    }
}

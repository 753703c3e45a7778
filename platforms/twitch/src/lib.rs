pub mod eventsub;
pub mod helix;
pub mod model;

use anyhow::{anyhow, Context};
use trec::{LiveFeed, LiveUser, StreamStatus, TrecResult};

pub use eventsub::EventSubClient;
pub use helix::HelixClient;

/// Live status of Twitch channels: snapshots come from Helix, transitions
/// from an EventSub WebSocket session.
pub struct TwitchFeed {
    helix: HelixClient,
    eventsub_url: String,
    eventsub: Option<EventSubClient>,
}

impl TwitchFeed {
    pub fn new(helix: HelixClient) -> Self {
        Self {
            helix,
            eventsub_url: EventSubClient::URL.to_string(),
            eventsub: None,
        }
    }

    pub fn with_eventsub_url<S: Into<String>>(mut self, url: S) -> Self {
        self.eventsub_url = url.into();
        self
    }

    fn eventsub(&mut self) -> anyhow::Result<&mut EventSubClient> {
        self.eventsub
            .as_mut()
            .ok_or_else(|| anyhow!("EventSub is not connected"))
    }
}

impl LiveFeed for TwitchFeed {
    async fn connect(&mut self) -> TrecResult<()> {
        let token = self
            .helix
            .validate()
            .await
            .with_context(|| "Failed to authenticate with Twitch")?;
        log::info!(
            "Authenticated as {}, token expires in {}s",
            token.login.as_deref().unwrap_or("application"),
            token.expires_in
        );

        let eventsub = EventSubClient::connect(&self.eventsub_url)
            .await
            .with_context(|| "Failed to connect to EventSub")?;
        self.eventsub = Some(eventsub);

        log::info!("Started Twitch client");
        Ok(())
    }

    async fn fetch_live(&self, logins: &[String]) -> TrecResult<Vec<StreamStatus>> {
        let streams = self.helix.streams(logins).await?;
        Ok(streams.into_iter().map(Into::into).collect())
    }

    async fn fetch_user_ids(&self, logins: &[String]) -> TrecResult<Vec<String>> {
        let users = self.helix.users(logins).await?;
        for login in logins {
            if !users.iter().any(|user| user.login.eq_ignore_ascii_case(login)) {
                log::warn!("Twitch user {login} does not exist");
            }
        }

        Ok(users.into_iter().map(|user| user.id).collect())
    }

    async fn subscribe(&mut self, user_id: &str) -> TrecResult<()> {
        let session_id = self.eventsub()?.session_id().to_string();
        let subscription = self
            .helix
            .subscribe_stream_online(&session_id, user_id)
            .await?;
        log::debug!(
            "Subscribed to stream.online of {user_id}: {} ({})",
            subscription.id,
            subscription.status
        );

        Ok(())
    }

    async fn next_event(&mut self) -> TrecResult<Option<LiveUser>> {
        let event = self.eventsub()?.next_stream_online().await?;
        Ok(event.map(Into::into))
    }
}

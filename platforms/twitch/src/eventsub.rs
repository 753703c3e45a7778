use std::time::Duration;

use anyhow::{anyhow, bail};
use futures_util::StreamExt;
use reqwest::Client;
use reqwest_websocket::{Message, RequestBuilderExt, WebSocket};

use crate::model::*;

/// EventSub WebSocket session. Subscriptions are created through Helix with
/// [`EventSubClient::session_id`] and delivered here.
pub struct EventSubClient {
    socket: WebSocket,
    /// Connection replaced by a `session_reconnect`. Read until the server
    /// closes it, so nothing sent on it before the switch is lost.
    previous: Option<WebSocket>,
    session: Session,
    keepalive: Duration,
}

impl EventSubClient {
    pub const URL: &str = "wss://eventsub.wss.twitch.tv/ws";

    /// Used when the welcome message carries no keepalive timeout.
    const DEFAULT_KEEPALIVE_SECS: u64 = 10;
    const KEEPALIVE_GRACE: Duration = Duration::from_secs(5);

    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let mut socket = open(url).await?;
        let session = wait_welcome(&mut socket).await?;
        log::info!("EventSub session {} established", session.id);

        Ok(Self {
            keepalive: keepalive_of(&session),
            socket,
            previous: None,
            session,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session.id
    }

    /// Waits for the next `stream.online` notification, answering keepalives
    /// and server-initiated reconnects on the way. `None` once the server
    /// closes the session.
    pub async fn next_stream_online(&mut self) -> anyhow::Result<Option<StreamOnlineEvent>> {
        loop {
            let message = tokio::time::timeout(self.keepalive, self.receive())
                .await
                .map_err(|_| {
                    anyhow!(
                        "No EventSub message within {:?}, connection lost",
                        self.keepalive
                    )
                })??;

            let Some(message) = message else {
                return Ok(None);
            };

            match message {
                EventSubMessage::Keepalive => (),
                EventSubMessage::Notification(Notification::StreamOnline(event)) => {
                    return Ok(Some(event))
                }
                EventSubMessage::Notification(Notification::Other(kind)) => {
                    log::debug!("Ignoring {kind} notification")
                }
                EventSubMessage::Reconnect(session) => self.reconnect(session).await?,
                EventSubMessage::Welcome(session) => self.resume(session),
                EventSubMessage::Revocation(subscription) => log::warn!(
                    "Subscription {} ({}) was revoked: {}",
                    subscription.id,
                    subscription.r#type,
                    subscription.status
                ),
                EventSubMessage::Unknown(kind) => log::debug!("Ignoring {kind} message"),
            }
        }
    }

    /// Next message from either connection. Messages still queued on the
    /// replaced connection go first.
    async fn receive(&mut self) -> anyhow::Result<Option<EventSubMessage>> {
        loop {
            let Some(previous) = self.previous.as_mut() else {
                return read(&mut self.socket).await;
            };

            let (message, from_previous) = tokio::select! {
                biased;
                message = read(previous) => (message, true),
                message = read(&mut self.socket) => (message, false),
            };

            match (message, from_previous) {
                (Ok(Some(message)), _) => return Ok(Some(message)),
                (Ok(None), true) => {
                    log::debug!("Previous EventSub connection closed");
                    self.previous = None;
                }
                (Err(e), true) => {
                    log::warn!("Previous EventSub connection failed: {e:#}");
                    self.previous = None;
                }
                (Ok(None), false) => {
                    if let Some(previous) = self.previous.take() {
                        self.socket = previous;
                    }
                }
                (Err(e), false) => return Err(e),
            }
        }
    }

    async fn reconnect(&mut self, session: Session) -> anyhow::Result<()> {
        let url = session
            .reconnect_url
            .ok_or_else(|| anyhow!("session_reconnect without reconnect_url"))?;
        log::info!("Reconnecting...");

        // subscriptions move over with the session once the new connection
        // is welcomed
        let socket = open(&url).await?;
        let previous = std::mem::replace(&mut self.socket, socket);
        if self.previous.replace(previous).is_some() {
            log::warn!("Dropped an EventSub connection that was still draining");
        }

        Ok(())
    }

    fn resume(&mut self, session: Session) {
        self.keepalive = keepalive_of(&session);
        self.session = session;
        log::info!("EventSub session {} resumed", self.session.id);
    }
}

async fn open(url: &str) -> anyhow::Result<WebSocket> {
    let client = Client::builder()
        // https://github.com/jgraef/reqwest-websocket/issues/2
        .http1_only()
        .build()?;
    let response = client.get(url).upgrade().send().await?;
    Ok(response.into_websocket().await?)
}

async fn wait_welcome(socket: &mut WebSocket) -> anyhow::Result<Session> {
    loop {
        match read(socket).await? {
            Some(EventSubMessage::Welcome(session)) => return Ok(session),
            Some(message) => log::debug!("Ignoring message before welcome: {message:?}"),
            None => bail!("EventSub closed the connection before welcome"),
        }
    }
}

async fn read(socket: &mut WebSocket) -> anyhow::Result<Option<EventSubMessage>> {
    while let Some(message) = socket.next().await {
        match message? {
            Message::Text(text) => {
                log::debug!("recv: {text}");
                match EventSubMessage::parse(&text) {
                    Ok(message) => return Ok(Some(message)),
                    Err(e) => log::error!("Dropping malformed EventSub message: {e:#}"),
                }
            }
            Message::Close { .. } => {
                log::info!("EventSub closed the connection");
                return Ok(None);
            }
            _ => (),
        }
    }

    Ok(None)
}

fn keepalive_of(session: &Session) -> Duration {
    Duration::from_secs(
        session
            .keepalive_timeout_seconds
            .unwrap_or(EventSubClient::DEFAULT_KEEPALIVE_SECS),
    ) + EventSubClient::KEEPALIVE_GRACE
}

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use trec::{LiveUser, StreamStatus};

#[derive(Debug, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
}

/// https://dev.twitch.tv/docs/api/reference/#get-streams
#[derive(Debug, Clone, Deserialize)]
pub struct Stream {
    pub user_id: String,
    #[serde(default)]
    pub user_login: String,
    #[serde(default)]
    pub user_name: String,

    /// "live", or empty on error
    #[serde(rename = "type", default)]
    pub r#type: String,
}

impl Stream {
    pub fn is_live(&self) -> bool {
        self.r#type == "live"
    }
}

impl From<Stream> for StreamStatus {
    fn from(stream: Stream) -> Self {
        let live = stream.is_live();
        StreamStatus {
            user: LiveUser {
                id: stream.user_id,
                name: non_empty(stream.user_login),
            },
            live,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
    pub login: String,
    #[serde(default)]
    pub display_name: String,
}

/// Response of `GET /oauth2/validate`.
#[derive(Debug, Deserialize)]
pub struct TokenInfo {
    pub client_id: String,
    /// Absent for app access tokens.
    pub login: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    pub expires_in: u64,
}

#[derive(Debug, Serialize)]
pub struct CreateSubscription<'a> {
    #[serde(rename = "type")]
    pub r#type: &'a str,
    pub version: &'a str,
    pub condition: BroadcasterCondition<'a>,
    pub transport: WebSocketTransport<'a>,
}

#[derive(Debug, Serialize)]
pub struct BroadcasterCondition<'a> {
    pub broadcaster_user_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct WebSocketTransport<'a> {
    pub method: &'a str,
    pub session_id: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub status: String,
    #[serde(rename = "type")]
    pub r#type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub id: String,
    #[serde(default)]
    pub status: String,
    pub keepalive_timeout_seconds: Option<u64>,
    pub reconnect_url: Option<String>,
}

/// https://dev.twitch.tv/docs/eventsub/eventsub-subscription-types/#streamonline
#[derive(Debug, Clone, Deserialize)]
pub struct StreamOnlineEvent {
    pub broadcaster_user_id: String,
    #[serde(default)]
    pub broadcaster_user_login: String,
    #[serde(default)]
    pub broadcaster_user_name: String,
    /// live, playlist, watch_party, premiere, rerun
    #[serde(rename = "type", default)]
    pub r#type: String,
}

impl From<StreamOnlineEvent> for LiveUser {
    fn from(event: StreamOnlineEvent) -> Self {
        LiveUser {
            id: event.broadcaster_user_id,
            name: non_empty(event.broadcaster_user_login),
        }
    }
}

#[derive(Debug)]
pub enum EventSubMessage {
    Welcome(Session),
    Keepalive,
    Notification(Notification),
    Reconnect(Session),
    Revocation(Subscription),
    Unknown(String),
}

#[derive(Debug)]
pub enum Notification {
    StreamOnline(StreamOnlineEvent),
    Other(String),
}

#[derive(Deserialize)]
struct RawMessage {
    metadata: Metadata,
    #[serde(default)]
    payload: serde_json::Value,
}

#[derive(Deserialize)]
struct Metadata {
    message_type: String,
    subscription_type: Option<String>,
}

#[derive(Deserialize)]
struct SessionPayload {
    session: Session,
}

#[derive(Deserialize)]
struct SubscriptionPayload {
    subscription: Subscription,
}

#[derive(Deserialize)]
struct NotificationPayload<T> {
    event: T,
}

impl EventSubMessage {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let RawMessage { metadata, payload } =
            serde_json::from_str(text).with_context(|| "eventsub message deserialize")?;

        let message = match metadata.message_type.as_str() {
            "session_welcome" => {
                EventSubMessage::Welcome(serde_json::from_value::<SessionPayload>(payload)?.session)
            }
            "session_keepalive" => EventSubMessage::Keepalive,
            "session_reconnect" => EventSubMessage::Reconnect(
                serde_json::from_value::<SessionPayload>(payload)?.session,
            ),
            "revocation" => EventSubMessage::Revocation(
                serde_json::from_value::<SubscriptionPayload>(payload)?.subscription,
            ),
            "notification" => {
                let kind = metadata
                    .subscription_type
                    .ok_or_else(|| anyhow!("notification without subscription type"))?;
                if kind == "stream.online" {
                    let payload: NotificationPayload<StreamOnlineEvent> =
                        serde_json::from_value(payload)
                            .with_context(|| "stream.online event deserialize")?;
                    EventSubMessage::Notification(Notification::StreamOnline(payload.event))
                } else {
                    EventSubMessage::Notification(Notification::Other(kind))
                }
            }
            other => EventSubMessage::Unknown(other.to_string()),
        };

        Ok(message)
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

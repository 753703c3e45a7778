use anyhow::{bail, Context};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client, Response, StatusCode,
};
use serde::de::DeserializeOwned;

use crate::model::*;

/// Client for the parts of the Helix API the recorder needs. Every request is
/// made with the configured user access token.
#[derive(Clone)]
pub struct HelixClient {
    client: Client,
    api_base: String,
    auth_base: String,
    token: String,
}

impl HelixClient {
    pub const API_BASE: &str = "https://api.twitch.tv/helix";
    pub const AUTH_BASE: &str = "https://id.twitch.tv/oauth2";

    /// Maximum number of logins per request.
    const PAGE_SIZE: usize = 100;

    pub fn new(client_id: &str, token: &str) -> anyhow::Result<Self> {
        Self::with_base_urls(client_id, token, Self::API_BASE, Self::AUTH_BASE)
    }

    pub fn with_base_urls(
        client_id: &str,
        token: &str,
        api_base: &str,
        auth_base: &str,
    ) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Client-Id",
            HeaderValue::from_str(client_id).context("client id is not a valid header value")?,
        );

        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            auth_base: auth_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// Checks the access token. Fails if Twitch rejects it.
    pub async fn validate(&self) -> anyhow::Result<TokenInfo> {
        let response = self
            .client
            .get(format!("{}/validate", self.auth_base))
            .header(AUTHORIZATION, format!("OAuth {}", self.token))
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            bail!("Twitch rejected the access token, it is invalid or expired");
        }

        parse(response).await.with_context(|| "token validation")
    }

    pub async fn streams(&self, logins: &[String]) -> anyhow::Result<Vec<Stream>> {
        let mut streams = Vec::new();
        for chunk in logins.chunks(Self::PAGE_SIZE) {
            let mut query: Vec<_> = chunk
                .iter()
                .map(|login| ("user_login", login.as_str()))
                .collect();
            query.push(("first", "100"));

            let page: Page<Stream> = self
                .get("streams", &query)
                .await
                .with_context(|| "get streams")?;
            streams.extend(page.data);
        }

        Ok(streams)
    }

    pub async fn users(&self, logins: &[String]) -> anyhow::Result<Vec<User>> {
        let mut users = Vec::new();
        for chunk in logins.chunks(Self::PAGE_SIZE) {
            let query: Vec<_> = chunk.iter().map(|login| ("login", login.as_str())).collect();

            let page: Page<User> = self
                .get("users", &query)
                .await
                .with_context(|| "get users")?;
            users.extend(page.data);
        }

        Ok(users)
    }

    /// Subscribes the WebSocket session `session_id` to `stream.online` of
    /// `broadcaster_id`.
    pub async fn subscribe_stream_online(
        &self,
        session_id: &str,
        broadcaster_id: &str,
    ) -> anyhow::Result<Subscription> {
        let body = CreateSubscription {
            r#type: "stream.online",
            version: "1",
            condition: BroadcasterCondition {
                broadcaster_user_id: broadcaster_id,
            },
            transport: WebSocketTransport {
                method: "websocket",
                session_id,
            },
        };

        let response = self
            .client
            .post(format!("{}/eventsub/subscriptions", self.api_base))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let mut page: Page<Subscription> = parse(response)
            .await
            .with_context(|| format!("subscribe to stream.online of {broadcaster_id}"))?;
        page.data
            .pop()
            .with_context(|| "subscription response without data")
    }

    async fn get<T>(&self, path: &str, query: &[(&str, &str)]) -> anyhow::Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self
            .client
            .get(format!("{}/{path}", self.api_base))
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await?;

        parse(response).await
    }
}

async fn parse<T>(response: Response) -> anyhow::Result<T>
where
    T: DeserializeOwned,
{
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!("Twitch responded with {status}: {body}");
    }

    Ok(response.json().await?)
}

use serde_json::json;
use trec::{LiveFeed, TrecError};
use trec_twitch::{HelixClient, TwitchFeed};
use wiremock::{
    matchers::{body_json, header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn client(server: &MockServer) -> HelixClient {
    HelixClient::with_base_urls(
        "client-id",
        "access-token",
        &format!("{}/helix", server.uri()),
        &format!("{}/oauth2", server.uri()),
    )
    .unwrap()
}

#[tokio::test]
async fn test_streams_headers_and_query() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/helix/streams"))
        .and(header("Client-Id", "client-id"))
        .and(header("Authorization", "Bearer access-token"))
        .and(query_param("user_login", "alice"))
        .and(query_param("user_login", "bob"))
        .and(query_param("first", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": "1", "user_id": "11", "user_login": "alice", "user_name": "Alice", "type": "live"}
            ],
            "pagination": {}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let streams = client(&server)
        .streams(&["alice".to_string(), "bob".to_string()])
        .await?;
    assert_eq!(streams.len(), 1);
    assert_eq!(streams[0].user_login, "alice");
    assert!(streams[0].is_live());

    Ok(())
}

#[tokio::test]
async fn test_users_are_chunked() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let logins: Vec<String> = (0..150).map(|i| format!("user{i}")).collect();

    Mock::given(method("GET"))
        .and(path("/helix/users"))
        .and(query_param("login", "user0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "100", "login": "user0", "display_name": "User0"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/helix/users"))
        .and(query_param("login", "user100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "200", "login": "user100", "display_name": "User100"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let users = client(&server).users(&logins).await?;
    let ids: Vec<_> = users.iter().map(|user| user.id.as_str()).collect();
    assert_eq!(ids, vec!["100", "200"]);

    Ok(())
}

#[tokio::test]
async fn test_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/helix/streams"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let error = client(&server)
        .streams(&["alice".to_string()])
        .await
        .unwrap_err();
    let message = format!("{error:#}");
    assert!(message.contains("500"), "{message}");
    assert!(message.contains("upstream unavailable"), "{message}");
}

#[tokio::test]
async fn test_subscribe_stream_online() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/helix/eventsub/subscriptions"))
        .and(header("Authorization", "Bearer access-token"))
        .and(body_json(json!({
            "type": "stream.online",
            "version": "1",
            "condition": {"broadcaster_user_id": "1337"},
            "transport": {"method": "websocket", "session_id": "session-1"}
        })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "data": [{
                "id": "sub-1",
                "status": "enabled",
                "type": "stream.online",
                "version": "1",
                "condition": {"broadcaster_user_id": "1337"},
                "transport": {"method": "websocket", "session_id": "session-1"}
            }],
            "total": 1,
            "total_cost": 0,
            "max_total_cost": 10
        })))
        .expect(1)
        .mount(&server)
        .await;

    let subscription = client(&server)
        .subscribe_stream_online("session-1", "1337")
        .await?;
    assert_eq!(subscription.id, "sub-1");
    assert_eq!(subscription.status, "enabled");

    Ok(())
}

#[tokio::test]
async fn test_validate() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/oauth2/validate"))
        .and(header("Authorization", "OAuth access-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "client_id": "client-id",
            "login": "recorder",
            "scopes": [],
            "user_id": "42",
            "expires_in": 5520838
        })))
        .mount(&server)
        .await;

    let token = client(&server).validate().await?;
    assert_eq!(token.login.as_deref(), Some("recorder"));
    assert_eq!(token.expires_in, 5520838);

    Ok(())
}

#[tokio::test]
async fn test_feed_snapshot() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/helix/streams"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": "1", "user_id": "11", "user_login": "alice", "user_name": "Alice", "type": "live"},
                {"id": "2", "user_id": "12", "user_login": "", "user_name": "", "type": "live"}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/helix/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "11", "login": "alice", "display_name": "Alice"}]
        })))
        .mount(&server)
        .await;

    let feed = TwitchFeed::new(client(&server));
    let logins = vec!["alice".to_string(), "ghost".to_string()];

    let statuses = feed.fetch_live(&logins).await?;
    assert_eq!(statuses.len(), 2);
    assert_eq!(statuses[0].user.name.as_deref(), Some("alice"));
    assert_eq!(statuses[1].user.name, None);

    let ids = feed.fetch_user_ids(&logins).await?;
    assert_eq!(ids, vec!["11"]);

    Ok(())
}

#[tokio::test]
async fn test_connect_rejected_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/oauth2/validate"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "status": 401,
            "message": "invalid access token"
        })))
        .mount(&server)
        .await;

    let mut feed = TwitchFeed::new(client(&server)).with_eventsub_url("ws://127.0.0.1:9/ws");
    let result = feed.connect().await;
    assert!(matches!(result, Err(TrecError::Feed(_))));
}

use serde_json::json;
use sherpath::config::TeamsConfig;
use sherpath::teams::{TeamsClient, TeamsError, TeamsSendRequest, GRAPH_SCOPE};
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> TeamsConfig {
    TeamsConfig {
        tenant_id: Some("tenant-1".into()),
        client_id: Some("client-1".into()),
        client_secret: Some("secret-1".into()),
        refresh_token: Some("refresh-1".into()),
        team_id: Some("team-1".into()),
        channel_id: Some("19:configured@thread.tacv2".into()),
        login_base_url: server.uri(),
        graph_base_url: server.uri(),
        ..Default::default()
    }
}

fn request() -> TeamsSendRequest {
    TeamsSendRequest {
        message: "ビールのモニター会について\n相談させてください".into(),
        consultant_name: "佐々木 昌平".into(),
        consultant_department: "品質保証部".into(),
        channel_id: None,
        mention_user_id: Some("advisor@example.com".into()),
    }
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/tenant-1/oauth2/v2.0/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "graph-token",
            "expires_in": 3599
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn refresh_token_exchanges_refresh_grant() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    let client = TeamsClient::new(config(&server), Duration::from_secs(5)).unwrap();
    let token = client.refresh_token().await.unwrap();
    assert_eq!(token.access_token, "graph-token");
    assert_eq!(token.expires_in, Some(3599));

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8(requests[0].body.clone()).unwrap();
    let scope: String = url_decode(&body, "scope");
    assert_eq!(scope, GRAPH_SCOPE);
}

fn url_decode(body: &str, key: &str) -> String {
    let url = format!("http://x/?{body}");
    let url = reqwest::Url::parse(&url).unwrap();
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
        .unwrap_or_default()
}

#[tokio::test]
async fn refresh_failure_reports_description() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tenant-1/oauth2/v2.0/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "AADSTS70000: refresh token expired"
        })))
        .mount(&server)
        .await;

    let client = TeamsClient::new(config(&server), Duration::from_secs(5)).unwrap();
    let err = client.refresh_token().await.unwrap_err();
    assert_eq!(err.kind(), "authentication_failed");
    assert!(err.to_string().contains("refresh token expired"));
}

#[tokio::test]
async fn send_posts_mention_message_to_channel() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path("/v1.0/teams/team-1/channels/19:configured@thread.tacv2/messages"))
        .and(header("authorization", "Bearer graph-token"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "msg-1",
            "webUrl": "https://teams.example/msg-1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = TeamsClient::new(config(&server), Duration::from_secs(5)).unwrap();
    let receipt = client.send(&request()).await.unwrap();

    assert_eq!(receipt.message_id.as_deref(), Some("msg-1"));
    assert_eq!(receipt.channel_id, "19:configured@thread.tacv2");
    assert_eq!(receipt.team_id, "team-1");
    assert_eq!(receipt.consultant_department, "品質保証部");

    let requests = server.received_requests().await.unwrap();
    let send = requests
        .iter()
        .find(|r| r.url.path().ends_with("/messages"))
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&send.body).unwrap();
    assert_eq!(
        body["body"]["content"],
        "<at id=\"0\">omusubikororin</at><br/><br/>ビールのモニター会について<br/>相談させてください"
    );
    assert_eq!(body["mentions"][0]["mentioned"]["user"]["id"], "advisor@example.com");
}

#[tokio::test]
async fn send_validates_before_any_request() {
    let server = MockServer::start().await;
    let client = TeamsClient::new(config(&server), Duration::from_secs(5)).unwrap();

    let mut blank = request();
    blank.message = "\n".into();
    let err = client.send(&blank).await.unwrap_err();
    assert!(matches!(err, TeamsError::Validation(_)));
    assert_eq!(err.status(), 400);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn send_without_team_is_configuration_error() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    let mut config = config(&server);
    config.team_id = None;

    let client = TeamsClient::new(config, Duration::from_secs(5)).unwrap();
    let err = client.send(&request()).await.unwrap_err();
    assert_eq!(err.kind(), "configuration_error");
}

#[tokio::test]
async fn send_without_credentials_is_auth_failure() {
    let server = MockServer::start().await;
    let mut config = config(&server);
    config.refresh_token = None;

    let client = TeamsClient::new(config, Duration::from_secs(5)).unwrap();
    let err = client.send(&request()).await.unwrap_err();
    assert_eq!(err.status(), 401);
}

#[tokio::test]
async fn graph_error_is_relayed() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path("/v1.0/teams/team-1/channels/19:configured@thread.tacv2/messages"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": "Forbidden", "message": "Missing scope" }
        })))
        .mount(&server)
        .await;

    let client = TeamsClient::new(config(&server), Duration::from_secs(5)).unwrap();
    match client.send(&request()).await.unwrap_err() {
        TeamsError::SendFailed {
            status,
            code,
            message,
        } => {
            assert_eq!(status, 403);
            assert_eq!(code, "Forbidden");
            assert_eq!(message, "Missing scope");
        }
        other => panic!("unexpected error: {other}"),
    }
}

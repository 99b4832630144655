use super::auth::{refresh_access_token, AccessToken, GraphCredentials};
use super::TeamsError;
use crate::config::TeamsConfig;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_CHANNEL_ID: &str = "19:example-channel-id@thread.tacv2";
pub const DEFAULT_MENTION_USER_ID: &str = "user@example.com";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamsSendRequest {
    pub message: String,
    pub consultant_name: String,
    pub consultant_department: String,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub mention_user_id: Option<String>,
}

impl TeamsSendRequest {
    pub fn validate(&self) -> Result<(), TeamsError> {
        if self.message.trim().is_empty() {
            return Err(TeamsError::Validation("メッセージが入力されていません".into()));
        }
        if self.consultant_name.trim().is_empty() || self.consultant_department.trim().is_empty() {
            return Err(TeamsError::Validation("相談先の情報が不足しています".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamsSendReceipt {
    pub message_id: Option<String>,
    pub channel_id: String,
    pub team_id: String,
    pub consultant_name: String,
    pub consultant_department: String,
    pub sent_at: String,
    pub web_url: Option<String>,
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Graph chat message body: an @mention header followed by the message,
/// with line breaks rendered as `<br/>`.
pub fn render_message(message: &str, mention_name: &str, mention_user_id: &str) -> Value {
    let body = escape_html(message).replace('\n', "<br/>");
    json!({
        "body": {
            "contentType": "html",
            "content": format!("<at id=\"0\">{}</at><br/><br/>{}", escape_html(mention_name), body),
        },
        "mentions": [{
            "id": 0,
            "mentionText": mention_name,
            "mentioned": {
                "user": {
                    "displayName": mention_name,
                    "id": mention_user_id,
                    "userIdentityType": "aadUser",
                }
            }
        }]
    })
}

/// Posts consultation summaries to a Teams channel through Microsoft Graph.
pub struct TeamsClient {
    http: reqwest::Client,
    config: TeamsConfig,
}

impl TeamsClient {
    pub fn new(config: TeamsConfig, timeout: Duration) -> Result<Self, TeamsError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, config })
    }

    pub async fn refresh_token(&self) -> Result<AccessToken, TeamsError> {
        let credentials = GraphCredentials::from_config(&self.config)?;
        refresh_access_token(&self.http, &self.config.login_base_url, &credentials).await
    }

    pub async fn send(&self, request: &TeamsSendRequest) -> Result<TeamsSendReceipt, TeamsError> {
        request.validate()?;
        let token = self.refresh_token().await?;

        let team_id = self
            .config
            .team_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| TeamsError::Configuration("TEAMS_TEAM_ID is not set".into()))?;
        let channel_id = request
            .channel_id
            .clone()
            .or_else(|| self.config.channel_id.clone())
            .unwrap_or_else(|| DEFAULT_CHANNEL_ID.to_string());
        let mention_user_id = request
            .mention_user_id
            .clone()
            .or_else(|| self.config.mention_user_id.clone())
            .unwrap_or_else(|| DEFAULT_MENTION_USER_ID.to_string());

        let url = format!(
            "{}/v1.0/teams/{}/channels/{}/messages",
            self.config.graph_base_url.trim_end_matches('/'),
            team_id,
            channel_id
        );
        let payload = render_message(&request.message, &self.config.mention_name, &mention_user_id);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&token.access_token)
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            let code = body
                .pointer("/error/code")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error")
                .to_string();
            let message = body
                .pointer("/error/message")
                .or_else(|| body.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("No error message")
                .to_string();
            tracing::error!(status = status.as_u16(), %code, %message, "graph message send failed");
            return Err(TeamsError::SendFailed {
                status: status.as_u16(),
                code,
                message,
            });
        }

        let receipt = TeamsSendReceipt {
            message_id: body.get("id").and_then(Value::as_str).map(str::to_string),
            channel_id,
            team_id,
            consultant_name: request.consultant_name.clone(),
            consultant_department: request.consultant_department.clone(),
            sent_at: Utc::now().to_rfc3339(),
            web_url: body.get("webUrl").and_then(Value::as_str).map(str::to_string),
        };
        tracing::info!(message_id = ?receipt.message_id, channel = %receipt.channel_id, "sent consultation to Teams");
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages() {
        let mut request = TeamsSendRequest {
            message: "  ".into(),
            consultant_name: "佐々木".into(),
            consultant_department: "品質保証部".into(),
            ..Default::default()
        };
        assert!(matches!(request.validate(), Err(TeamsError::Validation(_))));
        request.message = "相談です".into();
        assert!(request.validate().is_ok());
        request.consultant_department.clear();
        assert!(matches!(request.validate(), Err(TeamsError::Validation(_))));
    }

    #[test]
    fn message_renders_mention_and_breaks() {
        let payload = render_message("line1\nline2 <b>", "omusubikororin", "u-1");
        assert_eq!(
            payload["body"]["content"],
            "<at id=\"0\">omusubikororin</at><br/><br/>line1<br/>line2 &lt;b&gt;"
        );
        assert_eq!(payload["mentions"][0]["mentioned"]["user"]["id"], "u-1");
        assert_eq!(payload["mentions"][0]["mentioned"]["user"]["userIdentityType"], "aadUser");
    }

    #[test]
    fn request_uses_camel_case() {
        let request: TeamsSendRequest = serde_json::from_value(json!({
            "message": "m",
            "consultantName": "n",
            "consultantDepartment": "d",
            "channelId": "19:x"
        }))
        .unwrap();
        assert_eq!(request.channel_id.as_deref(), Some("19:x"));
        assert!(request.mention_user_id.is_none());
    }
}

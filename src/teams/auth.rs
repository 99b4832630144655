use super::TeamsError;
use crate::config::TeamsConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const GRAPH_SCOPE: &str =
    "openid offline_access https://graph.microsoft.com/ChannelMessage.Send";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Refresh-token grant material for the Microsoft identity platform.
#[derive(Clone)]
pub struct GraphCredentials {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for GraphCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphCredentials")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl GraphCredentials {
    pub fn from_config(config: &TeamsConfig) -> Result<Self, TeamsError> {
        match (
            &config.tenant_id,
            &config.client_id,
            &config.client_secret,
            &config.refresh_token,
        ) {
            (Some(tenant_id), Some(client_id), Some(client_secret), Some(refresh_token)) => {
                Ok(Self {
                    tenant_id: tenant_id.clone(),
                    client_id: client_id.clone(),
                    client_secret: client_secret.clone(),
                    refresh_token: refresh_token.clone(),
                })
            }
            _ => Err(TeamsError::AuthenticationFailed(
                "Missing required settings for Microsoft Graph API".into(),
            )),
        }
    }
}

/// Exchange the stored refresh token for a Graph access token.
pub async fn refresh_access_token(
    http: &reqwest::Client,
    login_base_url: &str,
    credentials: &GraphCredentials,
) -> Result<AccessToken, TeamsError> {
    let url = format!(
        "{}/{}/oauth2/v2.0/token",
        login_base_url.trim_end_matches('/'),
        credentials.tenant_id
    );
    let form = [
        ("client_id", credentials.client_id.as_str()),
        ("scope", GRAPH_SCOPE),
        ("refresh_token", credentials.refresh_token.as_str()),
        ("grant_type", "refresh_token"),
        ("client_secret", credentials.client_secret.as_str()),
    ];
    let response = http.post(&url).form(&form).send().await?;
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);

    if !status.is_success() {
        let reason = body
            .get("error_description")
            .or_else(|| body.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("status {}", status.as_u16()));
        tracing::warn!(status = status.as_u16(), "graph token refresh rejected");
        return Err(TeamsError::AuthenticationFailed(format!(
            "Token refresh failed: {reason}"
        )));
    }

    serde_json::from_value(body).map_err(|e| {
        TeamsError::AuthenticationFailed(format!("Token refresh returned no access token: {e}"))
    })
}

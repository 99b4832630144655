use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE_URL: &str = "https://aps-omu-02.azurewebsites.net";
pub const DEFAULT_LOGIN_BASE_URL: &str = "https://login.microsoftonline.com";
pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub analysis: AnalysisConfig,
    pub storage: StorageConfig,
    pub teams: TeamsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Per-request timeout; expiry counts as a request failure.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub debounce_ms: u64,
    pub cache_capacity: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 800,
            cache_capacity: 32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file holding the cross-view key/value hand-off.
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "~/.sherpath/state.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamsConfig {
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    pub team_id: Option<String>,
    pub channel_id: Option<String>,
    pub mention_user_id: Option<String>,
    pub mention_name: String,
    pub login_base_url: String,
    pub graph_base_url: String,
}

impl Default for TeamsConfig {
    fn default() -> Self {
        Self {
            tenant_id: None,
            client_id: None,
            client_secret: None,
            refresh_token: None,
            team_id: None,
            channel_id: None,
            mention_user_id: None,
            mention_name: "omusubikororin".to_string(),
            login_base_url: DEFAULT_LOGIN_BASE_URL.to_string(),
            graph_base_url: DEFAULT_GRAPH_BASE_URL.to_string(),
        }
    }
}

/// Presence report for the Teams settings. Secrets are never echoed.
#[derive(Debug, Clone, Serialize)]
pub struct TeamsConfigReport {
    pub team_id: Option<String>,
    pub channel_id: Option<String>,
    pub mention_user_id: Option<String>,
    pub client_id_exists: bool,
    pub client_secret_exists: bool,
    pub tenant_id_exists: bool,
    pub refresh_token_exists: bool,
}

impl TeamsConfig {
    pub fn report(&self) -> TeamsConfigReport {
        TeamsConfigReport {
            team_id: self.team_id.clone(),
            channel_id: self.channel_id.clone(),
            mention_user_id: self.mention_user_id.clone(),
            client_id_exists: self.client_id.is_some(),
            client_secret_exists: self.client_secret.is_some(),
            tenant_id_exists: self.tenant_id.is_some(),
            refresh_token_exists: self.refresh_token.is_some(),
        }
    }
}

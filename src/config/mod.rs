pub mod schema;

pub use schema::{
    AnalysisConfig, ApiConfig, Config, StorageConfig, TeamsConfig, TeamsConfigReport,
    DEFAULT_API_BASE_URL,
};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Default config file location (`<platform config dir>/sherpath/config.toml`).
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "sherpath").map(|dirs| dirs.config_dir().join("config.toml"))
}

impl Config {
    /// Load from `path` (or the default location), then apply environment overrides.
    ///
    /// A missing file is not an error; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).or_else(default_config_path);
        let mut config = match path {
            Some(p) if p.exists() => {
                let raw = std::fs::read_to_string(&p)
                    .with_context(|| format!("Failed to read config {}", p.display()))?;
                let parsed: Config = toml::from_str(&raw)
                    .with_context(|| format!("Failed to parse config {}", p.display()))?;
                tracing::debug!(path = %p.display(), "loaded config file");
                parsed
            }
            _ => Config::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Overlay values from an environment lookup. Blank values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("SHERPATH_API_BASE_URL").or_else(|| get("SHERPATH_API_ENDPOINT")) {
            self.api.base_url = url;
        }
        if let Some(secs) = get("SHERPATH_API_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.api.timeout_secs = secs;
        }
        if let Some(path) = get("SHERPATH_STORAGE_PATH") {
            self.storage.path = path;
        }

        let teams = &mut self.teams;
        let overrides: [(&str, &mut Option<String>); 7] = [
            ("AZURE_TENANT_ID", &mut teams.tenant_id),
            ("AZURE_CLIENT_ID", &mut teams.client_id),
            ("AZURE_CLIENT_SECRET", &mut teams.client_secret),
            ("GRAPH_REFRESH_TOKEN", &mut teams.refresh_token),
            ("TEAMS_TEAM_ID", &mut teams.team_id),
            ("TEAMS_CHANNEL_ID", &mut teams.channel_id),
            ("TEAMS_MENTION_USER_ID", &mut teams.mention_user_id),
        ];
        for (key, slot) in overrides {
            if let Some(value) = get(key) {
                *slot = Some(value);
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let base = self.api.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            anyhow::bail!("api.base_url must be an http(s) URL, got {:?}", self.api.base_url);
        }
        if self.api.timeout_secs == 0 {
            anyhow::bail!("api.timeout_secs must be greater than zero");
        }
        if self.analysis.cache_capacity == 0 {
            anyhow::bail!("analysis.cache_capacity must be greater than zero");
        }
        Ok(())
    }
}

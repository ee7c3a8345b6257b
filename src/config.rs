use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{env, CONFIG_FILE_NAME};
use crate::error::{AppError, Result};
use crate::models::AppConfig;

pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new(app_dir: PathBuf) -> Self {
        let config_path = app_dir.join(CONFIG_FILE_NAME);
        Self { config_path }
    }

    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Reads config.json, writing the defaults first when it does not exist
    pub fn load_config(&self) -> Result<AppConfig> {
        if self.config_path.exists() {
            let content = fs::read_to_string(&self.config_path)?;
            let config: AppConfig = serde_json::from_str(&content)
                .map_err(|e| AppError::Config(format!("Failed to parse {}: {}", CONFIG_FILE_NAME, e)))?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            self.save_config(&default_config)?;
            Ok(default_config)
        }
    }

    pub fn save_config(&self, config: &AppConfig) -> Result<()> {
        let config_json = serde_json::to_string_pretty(config)
            .map_err(|e| AppError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&self.config_path, config_json)
            .map_err(|e| AppError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Overlays process environment variables onto a loaded config
    pub fn apply_env_overrides(config: &mut AppConfig) -> Result<()> {
        Self::apply_overrides(config, |key| std::env::var(key).ok())
    }

    /// Overlays values from `lookup` onto `config`. Empty values count as unset,
    /// except for the API key and cookies where empty explicitly clears them.
    pub fn apply_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(port) = non_empty(env::PORT) {
            config.server.port = port
                .parse()
                .map_err(|_| AppError::Config(format!("{} is not a valid port: {}", env::PORT, port)))?;
        }
        if let Some(origins) = non_empty(env::CORS_ALLOW_ORIGINS) {
            config.server.cors_allow_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }
        if let Some(api_key) = lookup(env::API_KEY) {
            config.server.api_key = api_key;
        }
        if let Some(cookies) = lookup(env::COOKIES) {
            config.server.cookies = cookies;
        }
        if let Some(user_agent) = non_empty(env::USER_AGENT) {
            config.defaults.user_agent = user_agent;
        }
        if let Some(path) = non_empty(env::YTDLP_PATH) {
            config.ytdlp_location = path;
        }
        if let Some(secs) = non_empty(env::TIMEOUT_SECS) {
            config.server.timeout_secs = secs
                .parse()
                .map_err(|_| AppError::Config(format!("{} is not a number: {}", env::TIMEOUT_SECS, secs)))?;
        }
        if let Some(max) = non_empty(env::MAX_CONCURRENT) {
            config.server.max_concurrent_downloads = max
                .parse()
                .map_err(|_| AppError::Config(format!("{} is not a number: {}", env::MAX_CONCURRENT, max)))?;
        }

        if config.server.max_concurrent_downloads == 0 {
            return Err(AppError::Config("max_concurrent_downloads must be at least 1".to_string()));
        }

        Ok(())
    }

    /// Resolves the yt-dlp location. A bare name is left for PATH lookup,
    /// a relative path is taken from the app directory.
    pub fn get_ytdlp_path(config: &AppConfig, app_dir: &Path) -> PathBuf {
        let ytdlp_location = Path::new(&config.ytdlp_location);

        if ytdlp_location.is_absolute() || ytdlp_location.components().count() == 1 {
            ytdlp_location.to_path_buf()
        } else {
            let normalized_location = config.ytdlp_location.replace('/', std::path::MAIN_SEPARATOR_STR);
            app_dir.join(normalized_location)
        }
    }
}

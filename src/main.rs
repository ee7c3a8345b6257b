//! serve yt-dlp audio extraction over HTTP

use std::env;
use std::path::{Path, PathBuf};

use yt_audio_proxy::constants::{self, LOG_FILE_NAME};
use yt_audio_proxy::logger::LogConfig;
use yt_audio_proxy::{server, AudioService, ConfigManager, Logger, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let runtime_config = RuntimeConfig::from_env();

    let config_manager = match env::var(constants::env::CONFIG_PATH) {
        Ok(path) if !path.is_empty() => ConfigManager::with_path(PathBuf::from(path)),
        _ => ConfigManager::new(runtime_config.app_dir.clone()),
    };
    let mut app_config = config_manager.load_config()?;
    ConfigManager::apply_env_overrides(&mut app_config)?;

    let logger = Logger::with_config(runtime_config.log_path.clone(), LogConfig::from(&app_config.logging));

    logger.log_info(&format!("Config file: {}", config_manager.config_path().display()));
    logger.log_info(&format!("Current working directory: {:?}", runtime_config.app_dir));
    logger.log_debug(&format!("Log file: {}", logger.log_path().display()));
    logger.log_debug(&format!("Allowed args: {:?}", app_config.allowed_args.keys().collect::<Vec<_>>()));

    let ytdlp_path = ConfigManager::get_ytdlp_path(&app_config, &runtime_config.app_dir);
    logger.log_info(&format!("yt-dlp path: {}", ytdlp_path.display()));
    if !app_config.server.cookies.is_empty() {
        logger.log_info("Cookie file will be written for each request");
    }

    let service = AudioService::new(&app_config, ytdlp_path, logger.clone())?;
    let result = server::run(&app_config, service, logger.clone()).await;

    if let Err(e) = &result {
        logger.log_error(&format!("Failed: {}", e));
    }
    logger.flush().await;

    result
}

/// Runtime paths derived from the environment
struct RuntimeConfig {
    app_dir: PathBuf,
    log_path: PathBuf,
}

impl RuntimeConfig {
    fn from_env() -> Self {
        let app_dir = match env::current_exe() {
            Ok(exe_path) => exe_path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf(),
            Err(_) => env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        };

        let log_path = app_dir.join(LOG_FILE_NAME);

        Self { app_dir, log_path }
    }
}

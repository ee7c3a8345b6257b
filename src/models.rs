use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{defaults, flags};

/// Application configuration loaded from config.json
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub ytdlp_location: String,
    /// Flags a caller may pass, keyed by flag name
    pub allowed_args: BTreeMap<String, FlagSpec>,
    #[serde(default)]
    pub defaults: DefaultFlags,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Constraints for one allow-listed flag
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct FlagSpec {
    /// Number of values the flag consumes
    pub arity: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
    /// Regular expression a value must match in full. Ignored when `choices` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl FlagSpec {
    pub fn switch() -> Self {
        Self { arity: 0, choices: None, pattern: None }
    }

    pub fn choice(choices: &[&str]) -> Self {
        Self {
            arity: 1,
            choices: Some(choices.iter().map(|c| c.to_string()).collect()),
            pattern: None,
        }
    }

    pub fn pattern(pattern: &str) -> Self {
        Self { arity: 1, choices: None, pattern: Some(pattern.to_string()) }
    }
}

/// Correction flags appended when the caller did not supply them
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DefaultFlags {
    pub user_agent: String,
    pub extractor_args: String,
    pub geo_bypass: bool,
}

impl Default for DefaultFlags {
    fn default() -> Self {
        Self {
            user_agent: defaults::USER_AGENT.to_string(),
            extractor_args: defaults::EXTRACTOR_ARGS.to_string(),
            geo_bypass: true,
        }
    }
}

/// HTTP server settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Origins allowed for cross-origin requests, `*` allows any
    pub cors_allow_origins: Vec<String>,
    /// Shared secret expected in the x-api-key header. Empty disables the check.
    #[serde(default)]
    pub api_key: String,
    /// Netscape cookie file contents written into each working directory
    #[serde(default)]
    pub cookies: String,
    pub max_concurrent_downloads: usize,
    pub timeout_secs: u64,
    /// Leave working directories on disk after the response
    #[serde(default)]
    pub keep_workdirs: bool,
    /// Parent for per-request working directories, the system temp dir when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workdir_root: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: defaults::PORT,
            cors_allow_origins: vec!["*".to_string()],
            api_key: String::new(),
            cookies: String::new(),
            max_concurrent_downloads: defaults::MAX_CONCURRENT_DOWNLOADS,
            timeout_secs: defaults::TIMEOUT_SECS,
            keep_workdirs: false,
            workdir_root: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Maximum size of a log file in megabytes before rotation (default: 10)
    pub max_file_size_mb: u32,
    /// Maximum number of archived log files to keep (default: 5)
    pub max_archived_logs: u32,
    /// Enable debug logging (default: false)
    pub debug_enabled: bool,
    /// Echo log lines to stderr (default: true)
    #[serde(default = "default_console")]
    pub console: bool,
}

fn default_console() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: defaults::LOG_MAX_SIZE_MB,
            max_archived_logs: defaults::LOG_MAX_ARCHIVED,
            debug_enabled: false,
            console: true,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ytdlp_location: crate::constants::YT_DLP_EXECUTABLE.to_string(),
            allowed_args: default_allowed_args(),
            defaults: DefaultFlags::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// The five flags callers may use out of the box
pub fn default_allowed_args() -> BTreeMap<String, FlagSpec> {
    BTreeMap::from([
        (flags::AUDIO_FORMAT.to_string(), FlagSpec::choice(&["mp3", "m4a", "opus", "flac", "wav"])),
        (flags::AUDIO_QUALITY.to_string(), FlagSpec::pattern("[0-9]|10")),
        (flags::EMBED_THUMBNAIL.to_string(), FlagSpec::switch()),
        (flags::CONVERT_THUMBNAILS.to_string(), FlagSpec::choice(&["jpg", "png", "webp"])),
        (flags::EMBED_METADATA.to_string(), FlagSpec::switch()),
    ])
}

/// Body of `POST /cli`
#[derive(Debug, Deserialize, Default)]
pub struct CliRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Body of `POST /download`
#[derive(Debug, Deserialize, Default)]
pub struct DownloadRequest {
    #[serde(default)]
    pub url: String,
}

/// An audio file ready to be sent to the caller
#[derive(Debug)]
pub struct MediaFile {
    pub data: bytes::Bytes,
    /// Server generated name, never derived from the source title
    pub filename: String,
    pub content_type: &'static str,
}

/// Audio container selected through `--audio-format`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioKind {
    pub extension: &'static str,
    pub content_type: &'static str,
}

impl AudioKind {
    pub const MP3: AudioKind = AudioKind { extension: "mp3", content_type: "audio/mpeg" };

    /// Maps an `--audio-format` value to the file it produces
    pub fn from_format(format: Option<&str>) -> Self {
        match format.unwrap_or(defaults::AUDIO_FORMAT) {
            "m4a" => AudioKind { extension: "m4a", content_type: "audio/mp4" },
            "opus" => AudioKind { extension: "opus", content_type: "audio/opus" },
            "flac" => AudioKind { extension: "flac", content_type: "audio/flac" },
            "wav" => AudioKind { extension: "wav", content_type: "audio/wav" },
            _ => Self::MP3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_allow_list_has_exactly_five_entries() {
        let allowed = default_allowed_args();
        assert_eq!(allowed.len(), 5);
        assert_eq!(allowed["--embed-thumbnail"].arity, 0);
        assert_eq!(allowed["--audio-quality"].pattern.as_deref(), Some("[0-9]|10"));
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let json = r#"{"ytdlp_location": "/usr/bin/yt-dlp", "allowed_args": {"--embed-metadata": {"arity": 0}}}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.server.port, 8080);
        assert!(config.defaults.geo_bypass);
        assert!(config.logging.console);
        assert_eq!(config.allowed_args["--embed-metadata"], FlagSpec::switch());
    }

    #[test]
    fn audio_kind_follows_format() {
        assert_eq!(AudioKind::from_format(None), AudioKind::MP3);
        assert_eq!(AudioKind::from_format(Some("flac")).content_type, "audio/flac");
        assert_eq!(AudioKind::from_format(Some("m4a")).extension, "m4a");
    }
}

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const LOG_FILE_NAME: &str = "logs.log";
pub const YT_DLP_EXECUTABLE: &str = "yt-dlp";

/// Prefix of every per-request working directory
pub const WORKDIR_PREFIX: &str = "ytmp3_";
/// Output template handed to yt-dlp, expanded by the tool at runtime
pub const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";
pub const COOKIE_FILE_NAME: &str = "cookies.txt";

/// Header carrying the shared secret
pub const API_KEY_HEADER: &str = "x-api-key";
/// Paths reachable without the shared secret
pub const OPEN_PATHS: &[&str] = &["/", "/healthz"];

/// Flags that always lead the command vector
pub mod flags {
    pub const EXTRACT_AUDIO: &str = "-x";
    pub const OUTPUT: &str = "-o";
    pub const USER_AGENT: &str = "--user-agent";
    pub const EXTRACTOR_ARGS: &str = "--extractor-args";
    pub const GEO_BYPASS: &str = "--geo-bypass";
    pub const COOKIES: &str = "--cookies";
    pub const AUDIO_FORMAT: &str = "--audio-format";
    pub const AUDIO_QUALITY: &str = "--audio-quality";
    pub const EMBED_THUMBNAIL: &str = "--embed-thumbnail";
    pub const CONVERT_THUMBNAILS: &str = "--convert-thumbnails";
    pub const EMBED_METADATA: &str = "--embed-metadata";

    /// Long flags that move where yt-dlp writes files
    pub const OUTPUT_PATH_LONG: &[&str] = &["--output", "--paths"];
    /// Short flags that move where yt-dlp writes files
    pub const OUTPUT_PATH_SHORT: &[&str] = &["-o", "-P"];
}

/// Environment variable names read once at startup
pub mod env {
    pub const CONFIG_PATH: &str = "YTAP_CONFIG";
    pub const PORT: &str = "PORT";
    pub const CORS_ALLOW_ORIGINS: &str = "CORS_ALLOW_ORIGINS";
    pub const API_KEY: &str = "API_KEY";
    pub const USER_AGENT: &str = "YTDLP_USER_AGENT";
    pub const COOKIES: &str = "YTDLP_COOKIES";
    pub const YTDLP_PATH: &str = "YTDLP_PATH";
    pub const TIMEOUT_SECS: &str = "YTDLP_TIMEOUT_SECS";
    pub const MAX_CONCURRENT: &str = "MAX_CONCURRENT_DOWNLOADS";
}

/// Default configuration values
pub mod defaults {
    pub const LOG_MAX_SIZE_MB: u32 = 10;
    pub const LOG_MAX_ARCHIVED: u32 = 5;
    pub const PORT: u16 = 8080;
    pub const MAX_CONCURRENT_DOWNLOADS: usize = 2;
    pub const TIMEOUT_SECS: u64 = 600;
    pub const AUDIO_FORMAT: &str = "mp3";
    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
    pub const EXTRACTOR_ARGS: &str = "youtube:player_client=android,web";
}

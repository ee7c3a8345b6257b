use std::fmt;

use axum::http::StatusCode;

#[derive(Debug)]
pub enum AppError {
    Io(std::io::Error),
    Serde(serde_json::Error),
    Config(String),
    FileNotFound(String),
    PermissionDenied(String),

    InvalidUrl(String),
    InvalidRequest(String),
    InvalidFlag(String),
    MissingValue { flag: String, expected: usize, found: usize },
    InvalidChoice { flag: String, value: String, choices: Vec<String> },
    InvalidFormat { flag: String, value: String },
    ForbiddenFlag(String),

    ToolInvocationFailed(String),
    ToolTimeout(u64),
    NoOutputProduced(String),
    AmbiguousOutput(usize),

    Unauthorized,
}

impl AppError {
    /// HTTP status the error is reported with
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidUrl(_)
            | AppError::InvalidRequest(_)
            | AppError::InvalidFlag(_)
            | AppError::MissingValue { .. }
            | AppError::InvalidChoice { .. }
            | AppError::InvalidFormat { .. }
            | AppError::ForbiddenFlag(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Io(err) => write!(f, "IO error: {}", err),
            AppError::Serde(err) => write!(f, "JSON serialization error: {}", err),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::FileNotFound(msg) => write!(f, "File not found: {}", msg),
            AppError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),

            AppError::InvalidUrl(url) => write!(f, "Invalid URL: {:?} (must start with http:// or https://)", url),
            AppError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            AppError::InvalidFlag(flag) => write!(f, "Flag not allowed: {}", flag),
            AppError::MissingValue { flag, expected, found } => {
                write!(f, "Flag {} expects {} value(s), found {}", flag, expected, found)
            }
            AppError::InvalidChoice { flag, value, choices } => {
                write!(f, "Invalid value {:?} for {} (allowed: {})", value, flag, choices.join(", "))
            }
            AppError::InvalidFormat { flag, value } => write!(f, "Invalid format {:?} for {}", value, flag),
            AppError::ForbiddenFlag(flag) => write!(f, "Output path is server controlled, flag rejected: {}", flag),

            AppError::ToolInvocationFailed(stderr) => write!(f, "yt-dlp failed: {}", stderr),
            AppError::ToolTimeout(secs) => write!(f, "yt-dlp did not finish within {} seconds", secs),
            AppError::NoOutputProduced(ext) => write!(f, "yt-dlp produced no .{} file", ext),
            AppError::AmbiguousOutput(count) => write!(f, "yt-dlp produced {} candidate files", count),

            AppError::Unauthorized => write!(f, "unauthorized"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => AppError::FileNotFound(err.to_string()),
            std::io::ErrorKind::PermissionDenied => AppError::PermissionDenied(err.to_string()),
            _ => AppError::Io(err),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serde(err)
    }
}

impl From<regex::Error> for AppError {
    fn from(err: regex::Error) -> Self {
        AppError::Config(format!("invalid allow-list pattern: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

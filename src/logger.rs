use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use chrono::Local;
use tokio::sync::{mpsc, oneshot};

/// Configuration for log output and rotation
#[derive(Debug, Clone, Copy)]
pub struct LogConfig {
    /// Maximum size of a log file in bytes before rotation (default: 10MB)
    pub max_file_size: u64,
    /// Maximum number of archived log files to keep (default: 5)
    pub max_archived_logs: u32,
    pub debug_enabled: bool,
    /// Echo every line to stderr
    pub console: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024, // 10MB
            max_archived_logs: 5,
            debug_enabled: false,
            console: true,
        }
    }
}

impl From<&crate::models::LoggingConfig> for LogConfig {
    fn from(config: &crate::models::LoggingConfig) -> Self {
        Self {
            max_file_size: (config.max_file_size_mb as u64) * 1024 * 1024,
            max_archived_logs: config.max_archived_logs,
            debug_enabled: config.debug_enabled,
            console: config.console,
        }
    }
}

enum LogCommand {
    Line(String),
    Flush(oneshot::Sender<()>),
}

/// Logger shared by every request task.
///
/// Callers only format and enqueue a line. A dedicated writer thread owns the
/// file, so appends and rotation never block a runtime worker. The thread
/// exits once every clone has been dropped.
#[derive(Clone)]
pub struct Logger {
    log_path: Arc<PathBuf>,
    debug_enabled: bool,
    tx: mpsc::UnboundedSender<LogCommand>,
}

impl Logger {
    /// Creates a new logger instance with custom configuration
    pub fn with_config(log_path: PathBuf, config: LogConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let writer = LogWriter { log_path: log_path.clone(), config };
        let spawned = thread::Builder::new()
            .name("log-writer".to_string())
            .spawn(move || writer.run(rx));
        if let Err(e) = spawned {
            eprintln!("Could not start log writer, file logging disabled: {}", e);
        }

        Self { log_path: Arc::new(log_path), debug_enabled: config.debug_enabled, tx }
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Queues a message for the log file
    pub fn log(&self, message: &str) {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let _ = self.tx.send(LogCommand::Line(format!("[{}] {}\n", timestamp, message)));
    }

    /// Waits until every line queued so far has been written
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(LogCommand::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }

    pub fn log_error(&self, error: &str) {
        self.log(&format!("ERROR: {}", error));
    }

    pub fn log_info(&self, info: &str) {
        self.log(&format!("INFO: {}", info));
    }

    /// Logs debug information, dropped unless debug logging is enabled
    pub fn log_debug(&self, debug: &str) {
        if self.debug_enabled {
            self.log(&format!("DEBUG: {}", debug));
        }
    }

    pub fn log_warning(&self, warning: &str) {
        self.log(&format!("WARNING: {}", warning));
    }
}

/// Owns the log file on the writer thread
struct LogWriter {
    log_path: PathBuf,
    config: LogConfig,
}

impl LogWriter {
    fn run(self, mut rx: mpsc::UnboundedReceiver<LogCommand>) {
        while let Some(command) = rx.blocking_recv() {
            match command {
                LogCommand::Line(line) => {
                    self.rotate_if_needed();
                    self.append(&line);
                }
                LogCommand::Flush(ack) => {
                    let _ = ack.send(());
                }
            }
        }
    }

    fn append(&self, line: &str) {
        if self.config.console {
            eprint!("{}", line);
        }

        if let Ok(mut file) = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
        {
            let _ = file.write_all(line.as_bytes());
            let _ = file.flush();
        }
    }

    fn rotate_if_needed(&self) {
        if let Ok(metadata) = fs::metadata(&self.log_path) {
            if metadata.len() > self.config.max_file_size {
                self.rotate_logs();
            }
        }
    }

    /// Shifts `log.N` to `log.N+1`, dropping the oldest, then moves the live log to `.1`
    fn rotate_logs(&self) {
        let oldest_log = self.archived_log_path(self.config.max_archived_logs);
        if oldest_log.exists() {
            let _ = fs::remove_file(&oldest_log);
        }

        for i in (1..self.config.max_archived_logs).rev() {
            let current_log = self.archived_log_path(i);
            if current_log.exists() {
                let _ = fs::rename(&current_log, self.archived_log_path(i + 1));
            }
        }

        if self.config.max_archived_logs == 0 {
            let _ = fs::remove_file(&self.log_path);
        } else if self.log_path.exists() {
            let _ = fs::rename(&self.log_path, self.archived_log_path(1));
        }

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        self.append(&format!("[{}] Log rotated due to size limit\n", timestamp));
    }

    fn archived_log_path(&self, index: u32) -> PathBuf {
        let file_name = self.log_path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("logs.log");

        self.log_path.with_file_name(format!("{}.{}", file_name, index))
    }
}

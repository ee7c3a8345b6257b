use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::constants::YT_DLP_EXECUTABLE;
use crate::error::{AppError, Result};
use crate::logger::Logger;

/// Runs yt-dlp as a child process
#[derive(Clone)]
pub struct Executor {
    executable: PathBuf,
    timeout: Duration,
    logger: Logger,
}

impl Executor {
    pub fn new(executable: PathBuf, timeout: Duration, logger: Logger) -> Self {
        Self { executable, timeout, logger }
    }

    /// Runs the tool in `workdir` with exactly `args`.
    ///
    /// A non-zero exit returns the captured stderr verbatim. The child is killed
    /// if it outlives the timeout.
    pub async fn execute(&self, args: &[String], workdir: &Path) -> Result<()> {
        self.logger.log_info(&format!("Executing {} with {} arguments", YT_DLP_EXECUTABLE, args.len()));
        self.logger.log_debug(&format!("Arguments: {:?}", args));

        let mut cmd = Command::new(&self.executable);
        cmd.args(args)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(windows)]
        {
            const CREATE_NEW_PROCESS_GROUP: u32 = 0x00000200;
            cmd.creation_flags(CREATE_NEW_PROCESS_GROUP);
        }

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(result) => result.map_err(|e| {
                let msg = format!("Failed to execute {}: {}", self.executable.display(), e);
                self.logger.log_error(&msg);
                AppError::ToolInvocationFailed(msg)
            })?,
            Err(_) => {
                self.logger.log_error(&format!(
                    "{} timed out after {}s, killing it",
                    YT_DLP_EXECUTABLE,
                    self.timeout.as_secs()
                ));
                return Err(AppError::ToolTimeout(self.timeout.as_secs()));
            }
        };

        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            self.logger.log_error(&format!("{} exited with status: {}", YT_DLP_EXECUTABLE, output.status));
            if !stderr.is_empty() {
                self.logger.log_debug(&format!("Error output: {}", stderr));
            }
            return Err(AppError::ToolInvocationFailed(stderr.trim().to_string()));
        }

        if !output.stdout.is_empty() {
            self.logger.log_debug(&format!("{} output: {}", YT_DLP_EXECUTABLE, String::from_utf8_lossy(&output.stdout).trim_end()));
        }
        self.logger.log_debug("Process completed successfully");
        Ok(())
    }
}
